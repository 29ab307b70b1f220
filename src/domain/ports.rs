use crate::domain::model::{Message, NodeState};
use crate::utils::error::Result;
use async_trait::async_trait;

/// A flow node: takes one event, issues at most one robot request, and hands back
/// the outgoing message.
#[async_trait]
pub trait FlowNode: Send + Sync {
    fn id(&self) -> &str;

    fn node_type(&self) -> &'static str;

    fn state(&self) -> NodeState;

    async fn handle(&self, msg: Message) -> Result<Message>;

    /// 節點關閉時清除狀態
    fn close(&self);
}
