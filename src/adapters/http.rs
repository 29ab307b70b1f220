use crate::domain::model::ServerEndpoint;
use crate::utils::error::{FlowError, Result};
use reqwest::{Client, Method};
use serde_json::Value;
use url::Url;

pub const API_VERSION_HEADER: &str = "Opentrons-Version";
pub const API_VERSION: &str = "3";
pub const TOKEN_HEADER: &str = "authenticationBearer";

/// 單一機器人伺服器的 HTTP 客戶端
#[derive(Debug, Clone)]
pub struct RobotClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl RobotClient {
    pub fn new(endpoint: &ServerEndpoint) -> Self {
        Self {
            base_url: endpoint.base_url(),
            token: endpoint.token().map(str::to_string),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, segments: &[&str]) -> Result<Value> {
        self.send(Method::GET, segments, None).await
    }

    pub async fn post(&self, segments: &[&str], body: &Value) -> Result<Value> {
        self.send(Method::POST, segments, Some(body)).await
    }

    pub async fn delete(&self, segments: &[&str]) -> Result<Value> {
        self.send(Method::DELETE, segments, None).await
    }

    /// 每個 segment 各自編碼，ID 內的 `/`、`?`、`#` 不會改變端點
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| FlowError::ConfigError {
            message: format!("Invalid server URL '{}': {}", self.base_url, e),
        })?;

        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(FlowError::InvalidParameter {
                param: "path".to_string(),
                reason: format!("'{}' is not a valid path segment", bad),
            });
        }

        url.path_segments_mut()
            .map_err(|_| FlowError::ConfigError {
                message: format!("Server URL '{}' cannot carry a path", self.base_url),
            })?
            .clear()
            .extend(segments);

        Ok(url)
    }

    async fn send(&self, method: Method, segments: &[&str], body: Option<&Value>) -> Result<Value> {
        let url = self.endpoint(segments)?;
        tracing::debug!("📡 {} {}", method, url);

        let mut request = self
            .client
            .request(method, url.clone())
            .header(API_VERSION_HEADER, API_VERSION);

        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let decoded = decode_body(text);

        tracing::debug!("📡 {} responded with {}", url, status);

        if !status.is_success() {
            return Err(FlowError::HttpStatus {
                status: status.as_u16(),
                body: decoded,
            });
        }

        Ok(decoded)
    }
}

/// 空 body 為 null，非 JSON 內容保留為字串
fn decode_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => Value::String(text),
    }
}
