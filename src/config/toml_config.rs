use crate::domain::model::ServerEndpoint;
use crate::utils::error::{FlowError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    pub flow: FlowInfo,
    #[serde(default)]
    pub servers: Vec<ServerEndpoint>,
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowInfo {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>, // "compact" or "json"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub id: String,
    pub name: Option<String>,
    pub server: Option<String>, // [[servers]] 的 name
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeKind {
    Run(RunNodeConfig),
    MaintenanceRun(RunNodeConfig),
    Command(CommandNodeConfig),
    MaintenanceCommand(CommandNodeConfig),
    Protocol(ProtocolNodeConfig),
    Modules(ModulesNodeConfig),
    Lights(LightsNodeConfig),
}

const COMMON_NODE_KEYS: &[&str] = &["id", "name", "server", "type"];

impl NodeKind {
    /// 該節點類型接受的設定鍵（不含共用鍵）
    pub fn config_keys(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Run(_) | NodeKind::MaintenanceRun(_) => &["action", "run_id", "auto_store"],
            NodeKind::Command(_) | NodeKind::MaintenanceCommand(_) => {
                &["command_type", "run_id", "auto_use_latest", "params"]
            }
            NodeKind::Protocol(_) => &["action", "protocol_id"],
            NodeKind::Modules(_) => &[],
            NodeKind::Lights(_) => &["lights_on"],
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Run(_) => "run",
            NodeKind::MaintenanceRun(_) => "maintenance-run",
            NodeKind::Command(_) => "command",
            NodeKind::MaintenanceCommand(_) => "maintenance-command",
            NodeKind::Protocol(_) => "protocol",
            NodeKind::Modules(_) => "modules",
            NodeKind::Lights(_) => "lights",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunNodeConfig {
    pub action: Option<String>,
    pub run_id: Option<String>,
    pub auto_store: Option<bool>, // 建立後是否記住 run ID，預設 true
}

impl RunNodeConfig {
    pub fn auto_store(&self) -> bool {
        self.auto_store.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandNodeConfig {
    pub command_type: Option<String>,
    pub run_id: Option<String>,
    pub auto_use_latest: Option<bool>,
    #[serde(default)]
    pub params: Map<String, Value>, // 指令參數預設值，欄位名稱同 API
}

impl CommandNodeConfig {
    pub fn auto_use_latest(&self) -> bool {
        self.auto_use_latest.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtocolNodeConfig {
    pub action: Option<String>,
    pub protocol_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModulesNodeConfig {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LightsNodeConfig {
    #[serde(default)]
    pub lights_on: bool,
}

impl FlowConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FlowError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換（token 等機密值放在環境變數）
        let processed_content = Self::substitute_env_vars(content)?;

        let config: Self = toml::from_str(&processed_content).map_err(toml_error)?;
        let raw: toml::Table = toml::from_str(&processed_content).map_err(toml_error)?;

        // 節點表格攤平後 serde 不會回報多餘的鍵，拼錯的設定會被靜默忽略
        for key in config.unknown_node_keys(&raw) {
            tracing::warn!("⚠️ Ignoring unknown key '{}', check the spelling", key);
        }

        Ok(config)
    }

    /// 節點表格中不屬於該節點類型的鍵，格式為 `nodes.<id>.<key>`
    pub fn unknown_node_keys(&self, raw: &toml::Table) -> Vec<String> {
        let Some(toml::Value::Array(tables)) = raw.get("nodes") else {
            return Vec::new();
        };

        self.nodes
            .iter()
            .zip(tables)
            .flat_map(|(node, table)| {
                let allowed = node.kind.config_keys();
                table
                    .as_table()
                    .into_iter()
                    .flat_map(|t| t.keys())
                    .filter(move |key| {
                        !COMMON_NODE_KEYS.contains(&key.as_str()) && !allowed.contains(&key.as_str())
                    })
                    .map(move |key| format!("nodes.{}.{}", node.id, key))
            })
            .collect()
    }

    /// 替換環境變數 (例如 ${OT_TOKEN})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = placeholder_pattern()?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("flow.name", &self.flow.name)?;

        for server in &self.servers {
            validation::validate_non_empty_string("servers.name", &server.name)?;
            validation::validate_non_empty_string("servers.hostname", &server.hostname)?;
            validation::validate_port("servers.port", server.port)?;
            validation::validate_url("servers.hostname", &server.base_url())?;

            if let Some(token) = &server.token {
                if placeholder_pattern()?.is_match(token) {
                    tracing::warn!(
                        "⚠️ Token for server '{}' contains an unresolved placeholder: {}",
                        server.name,
                        token
                    );
                }
            }
        }
        validation::validate_unique("servers.name", self.servers.iter().map(|s| s.name.as_str()))?;

        for node in &self.nodes {
            validation::validate_non_empty_string("nodes.id", &node.id)?;
            match &node.server {
                Some(server) if self.server(server).is_none() => {
                    return Err(FlowError::InvalidConfigValueError {
                        field: format!("nodes.{}.server", node.id),
                        value: server.clone(),
                        reason: "No [[servers]] entry with this name".to_string(),
                    });
                }
                Some(_) => {}
                None => tracing::warn!(
                    "⚠️ Node '{}' has no server and will reject every event",
                    node.id
                ),
            }
        }
        validation::validate_unique("nodes.id", self.nodes.iter().map(|n| n.id.as_str()))?;

        Ok(())
    }

    pub fn server(&self, name: &str) -> Option<&ServerEndpoint> {
        self.servers.iter().find(|s| s.name == name)
    }

    pub fn node(&self, id: &str) -> Option<&NodeDefinition> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

impl Validate for FlowConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

fn toml_error(e: toml::de::Error) -> FlowError {
    FlowError::ConfigValidationError {
        field: "toml_parsing".to_string(),
        message: format!("TOML parsing error: {}", e),
    }
}

fn placeholder_pattern() -> Result<Regex> {
    Regex::new(r"\$\{([^}]+)\}").map_err(|e| FlowError::ConfigError {
        message: format!("placeholder pattern: {}", e),
    })
}
