use super::{configured, require_server, settle, NodeServer};
use crate::config::toml_config::RunNodeConfig;
use crate::core::registry::{IdRegistry, NodeRole};
use crate::core::status::StatusIndicator;
use crate::domain::model::{Message, NodeState, RunKind};
use crate::domain::ports::FlowNode;
use crate::utils::error::{FlowError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunAction {
    Create,
    Get,
    List,
    Delete,
    Current,
}

impl RunAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "create" => Some(RunAction::Create),
            "get" => Some(RunAction::Get),
            "list" => Some(RunAction::List),
            "delete" => Some(RunAction::Delete),
            "current" => Some(RunAction::Current),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            RunAction::Create => "create",
            RunAction::Get => "get",
            RunAction::List => "list",
            RunAction::Delete => "delete",
            RunAction::Current => "current",
        }
    }
}

/// Run management: create, inspect, list and delete runs or maintenance runs.
pub struct RunNode {
    id: String,
    kind: RunKind,
    server: Option<NodeServer>,
    config: RunNodeConfig,
    registry: Arc<IdRegistry>,
    status: StatusIndicator,
}

impl RunNode {
    pub fn new(
        id: &str,
        kind: RunKind,
        server: Option<NodeServer>,
        config: RunNodeConfig,
        registry: Arc<IdRegistry>,
    ) -> Self {
        registry.register(
            id,
            NodeRole::Manager(kind),
            server.as_ref().map(|s| s.name.as_str()),
            false,
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

    fn resolve_action(&self, msg: &Message) -> Result<RunAction> {
        let action = msg
            .text_field("action")
            .or_else(|| configured(&self.config.action))
            .ok_or_else(|| {
                FlowError::missing_field(
                    "action",
                    "Configure an action on the node or pass msg.action",
                )
            })?;

        match RunAction::parse(&action) {
            // maintenance run 沒有列表端點
            Some(RunAction::List) if self.kind == RunKind::Maintenance => {
                Err(FlowError::UnknownAction(action))
            }
            Some(parsed) => Ok(parsed),
            None => Err(FlowError::UnknownAction(action)),
        }
    }

    fn resolve_id(&self, msg: &Message, action: RunAction) -> Result<String> {
        let field = self.kind.id_field();
        msg.lookup_id(field)
            .or_else(|| configured(&self.config.run_id))
            .ok_or_else(|| {
                FlowError::missing_field(
                    self.kind.label(),
                    format!(
                        "{} is required for {} action. Either configure it in the node or pass it via msg.{}",
                        self.kind.label(),
                        action.as_str(),
                        field
                    ),
                )
            })
    }

    fn create_body(&self, msg: &Message) -> Value {
        match self.kind {
            RunKind::Run if msg.payload.is_object() => msg.payload.clone(),
            RunKind::Run => json!({}),
            RunKind::Maintenance => json!({ "data": {} }),
        }
    }

    async fn process(&self, server: &NodeServer, mut msg: Message) -> Result<Message> {
        let action = self.resolve_action(&msg)?;
        let base = self.kind.collection();
        let client = &server.client;

        tracing::debug!("[{}] {} {}", self.id, action.as_str(), base);

        let response = match action {
            RunAction::Create => client.post(&[base], &self.create_body(&msg)).await?,
            RunAction::Get => {
                let run_id = self.resolve_id(&msg, action)?;
                client.get(&[base, run_id.as_str()]).await?
            }
            RunAction::List => client.get(&[base]).await?,
            RunAction::Delete => {
                let run_id = self.resolve_id(&msg, action)?;
                let response = client.delete(&[base, run_id.as_str()]).await?;
                if self.config.auto_store() {
                    self.registry
                        .clear_deleted(&self.id, self.kind, &server.name, &run_id);
                }
                response
            }
            RunAction::Current => client.get(&[base, "current_run"]).await?,
        };

        if action == RunAction::Create {
            if let Some(new_id) = response.pointer("/data/id").and_then(Value::as_str) {
                tracing::info!("🆕 [{}] Created {} {}", self.id, self.kind.label(), new_id);
                msg.set_field(self.kind.id_field(), new_id);
                if self.config.auto_store() {
                    self.registry
                        .store_created(&self.id, self.kind, &server.name, new_id);
                }
            }
        }

        msg.payload = response;
        Ok(msg)
    }
}

#[async_trait]
impl FlowNode for RunNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn node_type(&self) -> &'static str {
        match self.kind {
            RunKind::Run => "run",
            RunKind::Maintenance => "maintenance-run",
        }
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
