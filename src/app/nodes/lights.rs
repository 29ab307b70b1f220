use super::{require_server, settle, NodeServer};
use crate::config::toml_config::LightsNodeConfig;
use crate::core::status::StatusIndicator;
use crate::domain::model::{Message, NodeState};
use crate::domain::ports::FlowNode;
use crate::utils::error::{FlowError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Switches the rail lights.
pub struct LightsNode {
    id: String,
    server: Option<NodeServer>,
    config: LightsNodeConfig,
    status: StatusIndicator,
}

impl LightsNode {
    pub fn new(id: &str, server: Option<NodeServer>, config: LightsNodeConfig) -> Self {
        Self {
            id: id.to_string(),
            server,
            config,
            status: StatusIndicator::new(id),
        }
    }

    /// `true`/`false` payload or `{ "on": bool }` overrides the configured state.
    fn lights_on(&self, msg: &Message) -> Result<bool> {
        match &msg.payload {
            Value::Bool(on) => Ok(*on),
            Value::Object(map) => match map.get("on") {
                None | Some(Value::Null) => Ok(self.config.lights_on),
                Some(Value::Bool(on)) => Ok(*on),
                Some(other) => Err(FlowError::InvalidParameter {
                    param: "on".to_string(),
                    reason: format!("expected true or false, got {}", other),
                }),
            },
            _ => Ok(self.config.lights_on),
        }
    }
}

#[async_trait]
impl FlowNode for LightsNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn node_type(&self) -> &'static str {
        "lights"
    }

    fn state(&self) -> NodeState {
        self.status.current()
    }

    async fn handle(&self, mut msg: Message) -> Result<Message> {
        let server = require_server(&self.id, self.server.as_ref())?;
        self.status.sending("setting lights");

        let result = match self.lights_on(&msg) {
            Ok(on) => server
                .client
                .post(&["robot", "lights"], &json!({ "on": on }))
                .await
                .map(|response| (on, response)),
            Err(e) => Err(e),
        };

        let (on, response) = settle(&self.status, &self.id, result, |(on, _)| {
            (if *on { "on" } else { "off" }).to_string()
        })?;
        tracing::debug!("[{}] lights {}", self.id, if on { "on" } else { "off" });

        msg.payload = response;
        Ok(msg)
    }

    fn close(&self) {
        self.status.clear();
    }
}
