use super::{configured, require_server, settle, NodeServer};
use crate::config::toml_config::ProtocolNodeConfig;
use crate::core::status::StatusIndicator;
use crate::domain::model::{Message, NodeState};
use crate::domain::ports::FlowNode;
use crate::utils::error::{FlowError, Result};
use async_trait::async_trait;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolAction {
    List,
    Get,
    Delete,
    Analyze,
}

impl ProtocolAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "list" => Some(ProtocolAction::List),
            "get" => Some(ProtocolAction::Get),
            "delete" => Some(ProtocolAction::Delete),
            "analyze" => Some(ProtocolAction::Analyze),
            _ => None,
        }
    }
}

pub struct ProtocolNode {
    id: String,
    server: Option<NodeServer>,
    config: ProtocolNodeConfig,
    status: StatusIndicator,
}

impl ProtocolNode {
    pub fn new(id: &str, server: Option<NodeServer>, config: ProtocolNodeConfig) -> Self {
        Self {
            id: id.to_string(),
            server,
            config,
            status: StatusIndicator::new(id),
        }
    }

    fn protocol_id(&self, msg: &Message, action: &str) -> Result<String> {
        msg.lookup_id("protocolId")
            .or_else(|| configured(&self.config.protocol_id))
            .ok_or_else(|| {
                FlowError::missing_field(
                    "protocolId",
                    format!("Protocol ID is required for {} action", action),
                )
            })
    }

    async fn process(&self, server: &NodeServer, mut msg: Message) -> Result<Message> {
        let action = msg
            .text_field("action")
            .or_else(|| configured(&self.config.action))
            .ok_or_else(|| {
                FlowError::missing_field("action", "Configure an action on the node or pass msg.action")
            })?;
        let parsed = ProtocolAction::parse(&action).ok_or_else(|| FlowError::UnknownAction(action.clone()))?;
        let client = &server.client;

        let response = match parsed {
            ProtocolAction::List => client.get(&["protocols"]).await?,
            ProtocolAction::Get => {
                let protocol_id = self.protocol_id(&msg, &action)?;
                client.get(&["protocols", protocol_id.as_str()]).await?
            }
            ProtocolAction::Delete => {
                let protocol_id = self.protocol_id(&msg, &action)?;
                client.delete(&["protocols", protocol_id.as_str()]).await?
            }
            ProtocolAction::Analyze => {
                let protocol_id = self.protocol_id(&msg, &action)?;
                client
                    .post(&["protocols", protocol_id.as_str(), "analyses"], &json!({}))
                    .await?
            }
        };

        msg.payload = response;
        Ok(msg)
    }
}

#[async_trait]
impl FlowNode for ProtocolNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn node_type(&self) -> &'static str {
        "protocol"
    }

    fn state(&self) -> NodeState {
        self.status.current()
    }

    async fn handle(&self, msg: Message) -> Result<Message> {
        let server = require_server(&self.id, self.server.as_ref())?;
        self.status.sending("processing");
        let result = self.process(server, msg).await;
        settle(&self.status, &self.id, result, |_| "success".to_string())
    }

    fn close(&self) {
        self.status.clear();
    }
}
