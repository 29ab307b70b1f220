//! Flow nodes, one per robot API area.
//!
//! Every node follows the same shape: check that a server is configured, flip the
//! status to "sending", resolve everything the request needs from the event and the
//! node's configuration, issue exactly one HTTP call, and hand the event back with
//! the decoded response as its payload. Anything that fails turns the status red and
//! returns the error instead of a message.

pub mod command;
pub mod lights;
pub mod modules;
pub mod protocol;
pub mod run;

pub use command::CommandNode;
pub use lights::LightsNode;
pub use modules::ModulesNode;
pub use protocol::ProtocolNode;
pub use run::RunNode;

use crate::adapters::http::RobotClient;
use crate::core::status::StatusIndicator;
use crate::utils::error::{FlowError, Result};
use std::sync::Arc;

/// Server a node talks to: the configured name plus its shared client.
#[derive(Debug, Clone)]
pub struct NodeServer {
    pub name: String,
    pub client: Arc<RobotClient>,
}

impl NodeServer {
    pub fn new(name: impl Into<String>, client: Arc<RobotClient>) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }
}

pub(crate) fn require_server<'a>(node_id: &str, server: Option<&'a NodeServer>) -> Result<&'a NodeServer> {
    server.ok_or_else(|| {
        tracing::error!("❌ [{}] No server configuration specified", node_id);
        FlowError::MissingServer
    })
}

/// 根據處理結果更新狀態
pub(crate) fn settle<T>(
    status: &StatusIndicator,
    node_id: &str,
    result: Result<T>,
    done_text: impl FnOnce(&T) -> String,
) -> Result<T> {
    match result {
        Ok(value) => {
            status.done(&done_text(&value));
            Ok(value)
        }
        Err(e) => {
            status.error();
            tracing::warn!("❌ [{}] {}", node_id, e);
            Err(e)
        }
    }
}

/// Configured string, blank treated as unset.
pub(crate) fn configured(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}
