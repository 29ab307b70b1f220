mod common;

use anyhow::Result;
use common::{build_flow, build_flow_with_token};
use httpmock::prelude::*;
use opentrons_flow::{FlowError, Message, NodeState};
use serde_json::json;

const ASPIRATE_NODES: &str = r#"
[[nodes]]
id = "aspirate"
type = "command"
server = "ot2"
command_type = "aspirate"

[nodes.params]
pipetteId = "pipette-left"
labwareId = "plate-1"
wellName = "A1"
volume = "50"
flowRate = 92.86
strategy = "not-for-aspirate"
"#;

/// 事件值優先於節點預設值，且只送出白名單欄位
#[tokio::test]
async fn test_aspirate_body_merges_event_over_defaults() -> Result<()> {
    let server = MockServer::start_async().await;
    let command_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/runs/run-1/commands")
                .header("Opentrons-Version", "3")
                .json_body(json!({
                    "data": {
                        "commandType": "aspirate",
                        "params": {
                            "pipetteId": "pipette-left",
                            "labwareId": "plate-1",
                            "wellName": "B3",
                            "volume": 20,
                            "flowRate": 92.86
                        }
                    }
                }));
            then.status(201)
                .json_body(json!({"data": {"id": "cmd-1", "status": "queued"}}));
        })
        .await;

    let flow = build_flow(&server, ASPIRATE_NODES);
    let msg = Message::default()
        .with_field("runId", "run-1")
        .with_field("wellName", "B3")
        .with_field("volume", 20)
        .with_field("mount", "right");

    let out = flow.dispatch("aspirate", msg).await?;

    command_mock.assert_async().await;
    assert_eq!(out.payload["data"]["id"], json!("cmd-1"));
    assert_eq!(
        flow.node("aspirate").unwrap().state(),
        NodeState::Done("command sent".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_event_command_type_overrides_configured_one() -> Result<()> {
    let server = MockServer::start_async().await;
    let command_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/runs/run-1/commands")
                .json_body(json!({
                    "data": {"commandType": "delay", "params": {"seconds": 1.5}}
                }));
            then.status(201).json_body(json!({"data": {"id": "cmd-2"}}));
        })
        .await;

    let flow = build_flow(&server, ASPIRATE_NODES);
    let msg = Message::new(json!({"runId": "run-1"}))
        .with_field("commandType", "delay")
        .with_field("seconds", "1.5");

    flow.dispatch("aspirate", msg).await?;
    command_mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_missing_run_id_fails_before_any_request() -> Result<()> {
    let server = MockServer::start_async().await;
    let any_mock = server
        .mock_async(|when, then| {
            when.path_contains("/");
            then.status(201).json_body(json!({}));
        })
        .await;

    let flow = build_flow(&server, ASPIRATE_NODES);
    let err = flow
        .dispatch("aspirate", Message::default())
        .await
        .unwrap_err();

    match err {
        FlowError::MissingField { field, hint } => {
            assert_eq!(field, "Run ID");
            assert!(hint.contains("msg.runId"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    any_mock.assert_hits_async(0).await;
    assert_eq!(flow.node("aspirate").unwrap().state(), NodeState::Error);
    Ok(())
}

#[tokio::test]
async fn test_missing_command_type_fails_before_any_request() -> Result<()> {
    let server = MockServer::start_async().await;
    let any_mock = server
        .mock_async(|when, then| {
            when.path_contains("/");
            then.status(201).json_body(json!({}));
        })
        .await;

    let flow = build_flow(
        &server,
        r#"
[[nodes]]
id = "bare"
type = "command"
server = "ot2"
"#,
    );
    let err = flow
        .dispatch("bare", Message::default().with_field("runId", "run-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::MissingField { ref field, .. } if field == "commandType"));
    any_mock.assert_hits_async(0).await;
    Ok(())
}

#[tokio::test]
async fn test_invalid_numeric_value_fails_before_any_request() -> Result<()> {
    let server = MockServer::start_async().await;
    let any_mock = server
        .mock_async(|when, then| {
            when.path_contains("/");
            then.status(201).json_body(json!({}));
        })
        .await;

    let flow = build_flow(&server, ASPIRATE_NODES);
    let msg = Message::default()
        .with_field("runId", "run-1")
        .with_field("volume", "a lot");
    let err = flow.dispatch("aspirate", msg).await.unwrap_err();

    assert!(matches!(err, FlowError::InvalidParameter { ref param, .. } if param == "volume"));
    any_mock.assert_hits_async(0).await;
    Ok(())
}

#[tokio::test]
async fn test_token_header_is_sent_when_configured() -> Result<()> {
    let server = MockServer::start_async().await;
    let command_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/runs/run-1/commands")
                .header("authenticationBearer", "bench-token");
            then.status(201).json_body(json!({"data": {"id": "cmd-3"}}));
        })
        .await;

    let flow = build_flow_with_token(&server, Some("bench-token"), ASPIRATE_NODES);
    flow.dispatch("aspirate", Message::default().with_field("runId", "run-1"))
        .await?;

    command_mock.assert_async().await;
    Ok(())
}

/// 建立 run 後，同一伺服器上的指令節點可直接沿用新的 run ID
#[tokio::test]
async fn test_created_run_id_is_reused_by_auto_following_command() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/runs");
            then.status(201).json_body(json!({"data": {"id": "run-42"}}));
        })
        .await;
    let home_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/runs/run-42/commands")
                .json_body(json!({"data": {"commandType": "home", "params": {}}}));
            then.status(201).json_body(json!({"data": {"id": "cmd-home"}}));
        })
        .await;

    let flow = build_flow(
        &server,
        r#"
[[nodes]]
id = "runs"
type = "run"
server = "ot2"
action = "create"

[[nodes]]
id = "home"
type = "command"
server = "ot2"
command_type = "home"
auto_use_latest = true
"#,
    );

    flow.dispatch("runs", Message::default()).await?;
    // 新事件不帶 runId
    flow.dispatch("home", Message::default()).await?;

    home_mock.assert_async().await;
    Ok(())
}

/// 同一節點上的並行事件各自送出請求
#[tokio::test]
async fn test_concurrent_events_are_independent() -> Result<()> {
    let server = MockServer::start_async().await;
    let command_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/runs/run-1/commands");
            then.status(201).json_body(json!({"data": {"id": "cmd"}}));
        })
        .await;

    let flow = build_flow(&server, ASPIRATE_NODES);
    let first = Message::default().with_field("runId", "run-1").with_field("wellName", "A1");
    let second = Message::default().with_field("runId", "run-1").with_field("wellName", "A2");

    let (a, b) = tokio::join!(flow.dispatch("aspirate", first), flow.dispatch("aspirate", second));
    tokio_test::assert_ok!(a);
    tokio_test::assert_ok!(b);

    command_mock.assert_hits_async(2).await;
    Ok(())
}

const DELAY_NODE: &str = r#"
[[nodes]]
id = "wait"
type = "command"
server = "ot2"
command_type = "delay"
"#;

/// run ID 只佔一個路徑區段，不能跳到其他端點
#[tokio::test]
async fn test_run_id_cannot_escape_the_runs_path() -> Result<()> {
    let server = MockServer::start_async().await;
    let maintenance_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/maintenance_runs/m1/commands");
            then.status(201).json_body(json!({"data": {"id": "wrong"}}));
        })
        .await;
    let runs_mock = server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/commands");
            then.status(404).json_body(json!({"errors": [{"id": "RunNotFound"}]}));
        })
        .await;

    let flow = build_flow(&server, DELAY_NODE);
    let msg = Message::default()
        .with_field("runId", "../maintenance_runs/m1")
        .with_field("seconds", 1);

    let err = flow.dispatch("wait", msg).await.unwrap_err();

    assert!(matches!(err, FlowError::HttpStatus { status: 404, .. }));
    maintenance_mock.assert_hits_async(0).await;
    runs_mock.assert_hits_async(1).await;
    Ok(())
}

#[tokio::test]
async fn test_dot_segment_run_id_is_rejected_before_any_request() -> Result<()> {
    let server = MockServer::start_async().await;
    let any_mock = server
        .mock_async(|when, then| {
            when.path_contains("/");
            then.status(201).json_body(json!({}));
        })
        .await;

    let flow = build_flow(&server, DELAY_NODE);
    let msg = Message::default().with_field("runId", "..").with_field("seconds", 1);

    let err = flow.dispatch("wait", msg).await.unwrap_err();

    assert!(matches!(err, FlowError::InvalidParameter { .. }));
    any_mock.assert_hits_async(0).await;
    assert_eq!(flow.node("wait").unwrap().state(), NodeState::Error);
    Ok(())
}

/// msg.params 與事件欄位同樣轉型，無法解析時不送出請求
#[tokio::test]
async fn test_params_override_is_coerced_before_sending() -> Result<()> {
    let server = MockServer::start_async().await;
    let command_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/runs/run-1/commands")
                .json_body(json!({
                    "data": {"commandType": "delay", "params": {"seconds": 20}}
                }));
            then.status(201).json_body(json!({"data": {"id": "cmd-7"}}));
        })
        .await;

    let flow = build_flow(&server, DELAY_NODE);

    let ok = Message::default()
        .with_field("runId", "run-1")
        .with_field("params", json!({"seconds": "20"}));
    flow.dispatch("wait", ok).await?;

    let bad = Message::default()
        .with_field("runId", "run-1")
        .with_field("params", json!({"seconds": "soon"}));
    let err = flow.dispatch("wait", bad).await.unwrap_err();

    assert!(matches!(err, FlowError::InvalidParameter { ref param, .. } if param == "seconds"));
    command_mock.assert_hits_async(1).await;
    Ok(())
}
