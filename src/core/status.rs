use crate::domain::model::NodeState;
use chrono::{DateTime, Utc};
use std::sync::RwLock;

/// 節點的可見狀態：處理中 / 成功 / 錯誤
#[derive(Debug)]
pub struct StatusIndicator {
    node_id: String,
    inner: RwLock<(NodeState, DateTime<Utc>)>,
}

impl StatusIndicator {
    pub fn new(node_id: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            inner: RwLock::new((NodeState::Idle, Utc::now())),
        }
    }

    pub fn sending(&self, text: &str) {
        self.set(NodeState::Sending(text.to_string()));
    }

    pub fn done(&self, text: &str) {
        self.set(NodeState::Done(text.to_string()));
    }

    pub fn error(&self) {
        self.set(NodeState::Error);
    }

    pub fn clear(&self) {
        self.set(NodeState::Idle);
    }

    pub fn current(&self) -> NodeState {
        self.read().0.clone()
    }

    pub fn changed_at(&self) -> DateTime<Utc> {
        self.read().1
    }

    fn set(&self, state: NodeState) {
        tracing::debug!("[{}] status → {:?}", self.node_id, state);
        let mut inner = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *inner = (state, Utc::now());
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, (NodeState, DateTime<Utc>)> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
