use crate::adapters::http::RobotClient;
use crate::app::nodes::{CommandNode, LightsNode, ModulesNode, NodeServer, ProtocolNode, RunNode};
use crate::config::toml_config::{FlowConfig, NodeDefinition, NodeKind};
use crate::core::registry::IdRegistry;
use crate::domain::model::{Message, RunKind};
use crate::domain::ports::FlowNode;
use crate::utils::error::{FlowError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// 單一節點的執行結果
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub node_id: String,
    pub node_type: String,
    pub duration_ms: u64,
}

/// 整條節點鏈的執行結果
#[derive(Debug, Clone, Serialize)]
pub struct ChainOutcome {
    pub execution_id: String,
    pub steps: Vec<StepResult>,
    pub message: Message,
}

/// The set of nodes declared in one flow configuration, sharing one id registry.
pub struct Flow {
    name: String,
    nodes: HashMap<String, Arc<dyn FlowNode>>,
    order: Vec<String>,
    registry: Arc<IdRegistry>,
}

impl Flow {
    pub fn from_config(config: &FlowConfig) -> Result<Self> {
        let clients: HashMap<&str, Arc<RobotClient>> = config
            .servers
            .iter()
            .map(|server| (server.name.as_str(), Arc::new(RobotClient::new(server))))
            .collect();

        let registry = Arc::new(IdRegistry::new());
        let mut nodes: HashMap<String, Arc<dyn FlowNode>> = HashMap::new();
        let mut order = Vec::new();

        for definition in &config.nodes {
            if nodes.contains_key(&definition.id) {
                return Err(FlowError::InvalidConfigValueError {
                    field: "nodes.id".to_string(),
                    value: definition.id.clone(),
                    reason: "Duplicate value".to_string(),
                });
            }

            let server = definition.server.as_deref().and_then(|name| {
                clients
                    .get(name)
                    .map(|client| NodeServer::new(name, Arc::clone(client)))
            });
            if server.is_none() {
                tracing::warn!("⚠️ Node '{}' has no usable server", definition.id);
            }

            let node = build_node(definition, server, &registry);
            tracing::debug!("📦 Registered {} node '{}'", node.node_type(), definition.id);
            order.push(definition.id.clone());
            nodes.insert(definition.id.clone(), node);
        }

        tracing::info!("✅ Flow '{}' ready with {} node(s)", config.flow.name, nodes.len());

        Ok(Self {
            name: config.flow.name.clone(),
            nodes,
            order,
            registry,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self, id: &str) -> Option<&Arc<dyn FlowNode>> {
        self.nodes.get(id)
    }

    /// Node ids in configuration order.
    pub fn node_ids(&self) -> &[String] {
        &self.order
    }

    pub fn registry(&self) -> &Arc<IdRegistry> {
        &self.registry
    }

    pub async fn dispatch(&self, node_id: &str, msg: Message) -> Result<Message> {
        let node = self
            .node(node_id)
            .ok_or_else(|| FlowError::UnknownNode(node_id.to_string()))?;
        node.handle(msg).await
    }

    /// Feeds the event through the given nodes in order; each node's output is the next
    /// node's input. Stops at the first failure.
    pub async fn run_chain(
        &self,
        execution_id: &str,
        node_ids: &[String],
        msg: Message,
    ) -> Result<ChainOutcome> {
        // 先確認所有節點都存在，避免送出一半才失敗
        for node_id in node_ids {
            if !self.nodes.contains_key(node_id) {
                return Err(FlowError::UnknownNode(node_id.clone()));
            }
        }

        let mut message = msg;
        let mut steps = Vec::with_capacity(node_ids.len());

        for (index, node_id) in node_ids.iter().enumerate() {
            let node = self
                .node(node_id)
                .ok_or_else(|| FlowError::UnknownNode(node_id.clone()))?;
            tracing::info!(
                "▶️ [{}/{}] {} ({})",
                index + 1,
                node_ids.len(),
                node_id,
                node.node_type()
            );

            let started = Instant::now();
            message = node.handle(message).await.map_err(|e| {
                tracing::error!("❌ {}: node '{}' failed: {}", execution_id, node_id, e);
                e
            })?;

            steps.push(StepResult {
                node_id: node_id.clone(),
                node_type: node.node_type().to_string(),
                duration_ms: started.elapsed().as_millis() as u64,
            });
        }

        Ok(ChainOutcome {
            execution_id: execution_id.to_string(),
            steps,
            message,
        })
    }

    pub fn close(&self) {
        for node in self.nodes.values() {
            node.close();
        }
    }
}

fn build_node(
    definition: &NodeDefinition,
    server: Option<NodeServer>,
    registry: &Arc<IdRegistry>,
) -> Arc<dyn FlowNode> {
    let id = definition.id.as_str();
    match &definition.kind {
        NodeKind::Run(config) => Arc::new(RunNode::new(
            id,
            RunKind::Run,
            server,
            config.clone(),
            Arc::clone(registry),
        )),
        NodeKind::MaintenanceRun(config) => Arc::new(RunNode::new(
            id,
            RunKind::Maintenance,
            server,
            config.clone(),
            Arc::clone(registry),
        )),
        NodeKind::Command(config) => Arc::new(CommandNode::new(
            id,
            RunKind::Run,
            server,
            config.clone(),
            Arc::clone(registry),
        )),
        NodeKind::MaintenanceCommand(config) => Arc::new(CommandNode::new(
            id,
            RunKind::Maintenance,
            server,
            config.clone(),
            Arc::clone(registry),
        )),
        NodeKind::Protocol(config) => Arc::new(ProtocolNode::new(id, server, config.clone())),
        NodeKind::Modules(_) => Arc::new(ModulesNode::new(id, server)),
        NodeKind::Lights(config) => Arc::new(LightsNode::new(id, server, config.clone())),
    }
}
