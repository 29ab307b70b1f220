#![allow(dead_code)]

use httpmock::MockServer;
use opentrons_flow::{Flow, FlowConfig};

/// 產生指向 mock server 的流程配置
pub fn flow_toml(server: &MockServer, token: Option<&str>, nodes: &str) -> String {
    let token_line = token
        .map(|t| format!("token = \"{}\"", t))
        .unwrap_or_default();
    format!(
        r#"
[flow]
name = "test-flow"

[[servers]]
name = "ot2"
hostname = "{}"
port = {}
{}

{}
"#,
        server.host(),
        server.port(),
        token_line,
        nodes
    )
}

pub fn build_flow(server: &MockServer, nodes: &str) -> Flow {
    build_flow_with_token(server, None, nodes)
}

pub fn build_flow_with_token(server: &MockServer, token: Option<&str>, nodes: &str) -> Flow {
    let config = FlowConfig::from_toml_str(&flow_toml(server, token, nodes)).unwrap();
    Flow::from_config(&config).unwrap()
}
