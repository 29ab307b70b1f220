pub mod toml_config;

pub use toml_config::FlowConfig;

#[cfg(feature = "cli")]
use crate::domain::model::Message;
#[cfg(feature = "cli")]
use crate::utils::error::{FlowError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "ot-flow")]
#[command(about = "Drive an Opentrons robot through a chain of flow nodes")]
pub struct CliConfig {
    /// Path to the flow configuration file
    #[arg(short, long, default_value = "configs/flow-example.toml")]
    pub config: String,

    /// Node ids to run in order (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub nodes: Vec<String>,

    /// Event message as JSON, e.g. '{"action":"create"}'
    #[arg(long)]
    pub event: Option<String>,

    /// Read the event message from a JSON file
    #[arg(long)]
    pub event_file: Option<String>,

    /// Execution ID for this run
    #[arg(long)]
    pub execution_id: Option<String>,

    /// Show the node chain without sending anything
    #[arg(long)]
    pub dry_run: bool,

    /// Log as JSON lines instead of compact text
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 解析輸入事件，未提供時為空訊息
    pub fn load_event(&self) -> Result<Message> {
        let raw = match (&self.event, &self.event_file) {
            (Some(event), _) => event.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => return Ok(Message::default()),
        };
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        crate::utils::validation::validate_non_empty_string("config", &self.config)?;

        if self.nodes.is_empty() {
            return Err(FlowError::ConfigValidationError {
                field: "nodes".to_string(),
                message: "At least one node id is required".to_string(),
            });
        }

        if self.event.is_some() && self.event_file.is_some() {
            return Err(FlowError::ConfigValidationError {
                field: "event".to_string(),
                message: "Use either --event or --event-file, not both".to_string(),
            });
        }

        Ok(())
    }
}
