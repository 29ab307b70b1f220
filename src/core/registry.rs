use crate::domain::model::RunKind;
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Creates and deletes runs of this kind.
    Manager(RunKind),
    /// Sends commands to runs of this kind.
    Commander(RunKind),
}

#[derive(Debug, Clone)]
struct Slot {
    role: NodeRole,
    server: Option<String>,
    auto_use_latest: bool,
    stored_id: Option<String>,
}

/// 各節點最近一次建立的 run ID，依伺服器分享給同一伺服器上的指令節點。
///
/// Last write wins; concurrent events racing on the same server are not ordered.
#[derive(Debug, Default)]
pub struct IdRegistry {
    slots: RwLock<BTreeMap<String, Slot>>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, node_id: &str, role: NodeRole, server: Option<&str>, auto_use_latest: bool) {
        let mut slots = self.write();
        slots.insert(
            node_id.to_string(),
            Slot {
                role,
                server: server.map(str::to_string),
                auto_use_latest,
                stored_id: None,
            },
        );
    }

    /// Records a newly created id on the manager and every auto-following commander
    /// of the same kind on the same server.
    pub fn store_created(&self, manager_id: &str, kind: RunKind, server: &str, id: &str) {
        let mut slots = self.write();
        if let Some(slot) = slots.get_mut(manager_id) {
            slot.stored_id = Some(id.to_string());
        }

        let mut updated = 0usize;
        for slot in slots.values_mut() {
            if slot.role == NodeRole::Commander(kind)
                && slot.server.as_deref() == Some(server)
                && slot.auto_use_latest
            {
                slot.stored_id = Some(id.to_string());
                updated += 1;
            }
        }
        tracing::debug!(
            "🔗 Stored {} '{}' from {} on {} command node(s)",
            kind.label(),
            id,
            manager_id,
            updated
        );
    }

    /// Forgets a deleted id. Commanders only lose it when it is the id they hold.
    pub fn clear_deleted(&self, manager_id: &str, kind: RunKind, server: &str, id: &str) {
        let mut slots = self.write();
        if let Some(slot) = slots.get_mut(manager_id) {
            slot.stored_id = None;
        }

        for slot in slots.values_mut() {
            if slot.role == NodeRole::Commander(kind)
                && slot.server.as_deref() == Some(server)
                && slot.stored_id.as_deref() == Some(id)
            {
                slot.stored_id = None;
            }
        }
    }

    pub fn stored_id(&self, node_id: &str) -> Option<String> {
        self.read()
            .get(node_id)
            .and_then(|slot| slot.stored_id.clone())
    }

    /// First manager (by node id) of this kind on this server holding an id.
    pub fn latest_for(&self, kind: RunKind, server: &str) -> Option<String> {
        self.read()
            .values()
            .filter(|slot| slot.role == NodeRole::Manager(kind))
            .filter(|slot| slot.server.as_deref() == Some(server))
            .find_map(|slot| slot.stored_id.clone())
    }

    // 鎖中毒時沿用內部資料，ID 快取本來就是盡力而為
    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Slot>> {
        self.slots.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Slot>> {
        self.slots.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
