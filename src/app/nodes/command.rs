use super::{configured, require_server, settle, NodeServer};
use crate::config::toml_config::CommandNodeConfig;
use crate::core::command::{CommandRequest, CommandType};
use crate::core::registry::{IdRegistry, NodeRole};
use crate::core::status::StatusIndicator;
use crate::domain::model::{Message, NodeState, RunKind};
use crate::domain::ports::FlowNode;
use crate::utils::error::{FlowError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Queues one command against a run or maintenance run.
pub struct CommandNode {
    id: String,
    kind: RunKind,
    server: Option<NodeServer>,
    config: CommandNodeConfig,
    registry: Arc<IdRegistry>,
    status: StatusIndicator,
}

impl CommandNode {
    pub fn new(
        id: &str,
        kind: RunKind,
        server: Option<NodeServer>,
        config: CommandNodeConfig,
        registry: Arc<IdRegistry>,
    ) -> Self {
        registry.register(
            id,
            NodeRole::Commander(kind),
            server.as_ref().map(|s| s.name.as_str()),
            config.auto_use_latest(),
        );
        Self {
            id: id.to_string(),
            kind,
            server,
            config,
            registry,
            status: StatusIndicator::new(id),
        }
    }

    /// 取得 run ID：事件優先，其次是最近建立的 ID 或節點設定
    fn resolve_run_id(&self, msg: &Message, server: &NodeServer) -> Result<String> {
        if let Some(run_id) = msg.lookup_id(self.kind.id_field()) {
            return Ok(run_id);
        }

        let fallback = if self.config.auto_use_latest() {
            self.registry
                .stored_id(&self.id)
                .or_else(|| configured(&self.config.run_id))
                .or_else(|| self.registry.latest_for(self.kind, &server.name))
        } else {
            configured(&self.config.run_id)
        };

        fallback.ok_or_else(|| FlowError::missing_field(self.kind.label(), self.missing_id_hint()))
    }

    fn missing_id_hint(&self) -> String {
        match self.kind {
            RunKind::Run => "Create a run with a run node using the 'create' action first, \
                             then pass the run ID as msg.runId"
                .to_string(),
            RunKind::Maintenance => "Enable auto_use_latest and create a maintenance run first, \
                                     configure run_id on the node, or pass msg.maintenanceRunId"
                .to_string(),
        }
    }

    fn resolve_command_type(&self, msg: &Message) -> Result<CommandType> {
        msg.text_field("commandType")
            .or_else(|| configured(&self.config.command_type))
            .map(|tag| CommandType::from_tag(&tag))
            .ok_or_else(|| {
                FlowError::missing_field(
                    "commandType",
                    "Configure command_type on the node or pass msg.commandType",
                )
            })
    }

    async fn process(&self, server: &NodeServer, mut msg: Message) -> Result<Message> {
        let run_id = self.resolve_run_id(&msg, server)?;
        let command_type = self.resolve_command_type(&msg)?;
        let request = CommandRequest::build(command_type, &self.config.params, &msg)?;
        let body = request.to_body()?;

        tracing::info!(
            "🧪 [{}] {} → {} {}",
            self.id,
            request.command_type,
            self.kind.label(),
            run_id
        );

        msg.payload = server
            .client
            .post(&[self.kind.collection(), run_id.as_str(), "commands"], &body)
            .await?;
        Ok(msg)
    }
}

#[async_trait]
impl FlowNode for CommandNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn node_type(&self) -> &'static str {
        match self.kind {
            RunKind::Run => "command",
            RunKind::Maintenance => "maintenance-command",
        }
    }

    fn state(&self) -> NodeState {
        self.status.current()
    }

    async fn handle(&self, msg: Message) -> Result<Message> {
        let server = require_server(&self.id, self.server.as_ref())?;
        self.status.sending("sending command");
        let result = self.process(server, msg).await;
        settle(&self.status, &self.id, result, |_| "command sent".to_string())
    }

    fn close(&self) {
        self.status.clear();
    }
}
