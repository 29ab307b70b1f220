use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_PORT: u16 = 31950;

/// 機器人伺服器的連線設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub name: String,
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub token: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ServerEndpoint {
    pub fn new(name: impl Into<String>, hostname: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            port,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.hostname, self.port)
    }

    /// An empty token counts as no token.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Flow event. Mirrors the loose shape of a flow message: a `payload` plus any
/// number of top-level fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub payload: Value,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Message {
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Top-level field, `null` and `""` treated as absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| is_present(v))
    }

    /// Raw top-level field, only `null` treated as absent.
    pub fn raw_field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    pub fn text_field(&self, name: &str) -> Option<String> {
        self.field(name).and_then(value_as_text)
    }

    /// Identifier lookup: `msg.{name}` first, then `msg.payload.{name}`.
    pub fn lookup_id(&self, name: &str) -> Option<String> {
        self.text_field(name).or_else(|| {
            self.payload
                .get(name)
                .filter(|v| is_present(v))
                .and_then(value_as_text)
        })
    }
}

pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 兩種 run：一般 protocol run 與 maintenance run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RunKind {
    Run,
    Maintenance,
}

impl RunKind {
    /// Top-level API collection, e.g. `/runs`.
    pub fn collection(&self) -> &'static str {
        match self {
            RunKind::Run => "runs",
            RunKind::Maintenance => "maintenance_runs",
        }
    }

    /// Message field carrying this kind's identifier.
    pub fn id_field(&self) -> &'static str {
        match self {
            RunKind::Run => "runId",
            RunKind::Maintenance => "maintenanceRunId",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunKind::Run => "Run ID",
            RunKind::Maintenance => "Maintenance Run ID",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "lowercase")]
pub enum NodeState {
    Idle,
    Sending(String),
    Done(String),
    Error,
}

impl NodeState {
    pub fn text(&self) -> &str {
        match self {
            NodeState::Idle => "",
            NodeState::Sending(text) | NodeState::Done(text) => text,
            NodeState::Error => "error",
        }
    }
}
