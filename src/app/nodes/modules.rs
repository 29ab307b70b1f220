use super::{require_server, settle, NodeServer};
use crate::core::status::StatusIndicator;
use crate::domain::model::{Message, NodeState};
use crate::domain::ports::FlowNode;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Lists attached hardware modules.
pub struct ModulesNode {
    id: String,
    server: Option<NodeServer>,
    status: StatusIndicator,
}

impl ModulesNode {
    pub fn new(id: &str, server: Option<NodeServer>) -> Self {
        Self {
            id: id.to_string(),
            server,
            status: StatusIndicator::new(id),
        }
    }
}

#[async_trait]
impl FlowNode for ModulesNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn node_type(&self) -> &'static str {
        "modules"
    }

    fn state(&self) -> NodeState {
        self.status.current()
    }

    async fn handle(&self, mut msg: Message) -> Result<Message> {
        let server = require_server(&self.id, self.server.as_ref())?;
        self.status.sending("requesting");
        let result = server.client.get(&["modules"]).await.map(|response| {
            msg.payload = response;
            msg
        });
        settle(&self.status, &self.id, result, |_| "success".to_string())
    }

    fn close(&self) {
        self.status.clear();
    }
}
