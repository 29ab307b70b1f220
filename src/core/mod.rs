pub mod command;
pub mod flow;
pub mod registry;
pub mod status;

pub use crate::domain::model::{Message, NodeState, RunKind, ServerEndpoint};
pub use crate::domain::ports::FlowNode;
pub use crate::utils::error::Result;
