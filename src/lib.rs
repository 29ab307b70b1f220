pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::FlowConfig;
pub use core::flow::{ChainOutcome, Flow};
pub use domain::model::{Message, NodeState, RunKind, ServerEndpoint};
pub use domain::ports::FlowNode;
pub use utils::error::{FlowError, Result};
