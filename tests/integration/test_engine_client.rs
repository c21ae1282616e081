//! Tests for the HTTP rule-engine client against a local stub server.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{delete, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use home_automation_api::services::rule_engine::{EngineTrigger, EngineTriggerConfig};
use home_automation_api::services::{
    EngineError, EnginePayload, HttpRuleEngineClient, RuleEngineClient,
};

fn payload(name: &str) -> EnginePayload {
    EnginePayload {
        name: name.to_string(),
        space_id: "h1".to_string(),
        hc_id: None,
        processed_at: 0,
        logo: String::new(),
        automation_type: "routine".to_string(),
        logic: "and".to_string(),
        active: true,
        trigger: EngineTrigger {
            trigger_type: "timer".to_string(),
            configuration: EngineTriggerConfig {
                start: "0 8 * * *".to_string(),
                end: "0 8 * * *".to_string(),
            },
        },
        input: vec![],
        output: vec![],
    }
}

async fn create_rule(Json(body): Json<Value>) -> Json<Value> {
    if body["name"] == json!("noid") {
        // Success status but no rule id in the body.
        Json(json!({}))
    } else {
        Json(json!({ "id": "rule-9" }))
    }
}

fn status_for(id: &str) -> StatusCode {
    match id {
        "gone" => StatusCode::NOT_FOUND,
        "boom" => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    }
}

async fn update_rule(Path(id): Path<String>) -> StatusCode {
    status_for(&id)
}

async fn delete_rule(Path(id): Path<String>) -> StatusCode {
    status_for(&id)
}

async fn delete_device(Path(id): Path<String>) -> StatusCode {
    status_for(&id)
}

/// Spawn the stub engine on an ephemeral port and return its base URL.
async fn spawn_stub_engine() -> String {
    let app = Router::new()
        .route("/rule", post(create_rule))
        .route("/rule/{id}", put(update_rule).delete(delete_rule))
        .route("/rule/device/{id}", delete(delete_device));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind stub engine");
    let addr = listener.local_addr().expect("no local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub engine died");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn create_returns_the_engine_assigned_id() {
    let client = HttpRuleEngineClient::new(spawn_stub_engine().await).unwrap();
    let id = client.create_rule(&payload("Wake up")).await.unwrap();
    assert_eq!(id, "rule-9");
}

#[tokio::test]
async fn create_without_rule_id_in_response_is_an_error() {
    let client = HttpRuleEngineClient::new(spawn_stub_engine().await).unwrap();
    assert!(matches!(
        client.create_rule(&payload("noid")).await,
        Err(EngineError::MissingId)
    ));
}

#[tokio::test]
async fn update_failure_carries_the_engine_status() {
    let client = HttpRuleEngineClient::new(spawn_stub_engine().await).unwrap();
    client.update_rule("ok", &payload("Wake up")).await.unwrap();
    assert!(matches!(
        client.update_rule("boom", &payload("Wake up")).await,
        Err(EngineError::Status(500))
    ));
}

#[tokio::test]
async fn delete_treats_engine_404_as_success() {
    let client = HttpRuleEngineClient::new(spawn_stub_engine().await).unwrap();
    client.delete_rule("gone").await.unwrap();
}

#[tokio::test]
async fn delete_failure_carries_the_engine_status() {
    let client = HttpRuleEngineClient::new(spawn_stub_engine().await).unwrap();
    assert!(matches!(
        client.delete_rule("boom").await,
        Err(EngineError::Status(500))
    ));
}

#[tokio::test]
async fn device_delete_shares_the_404_contract() {
    let client = HttpRuleEngineClient::new(spawn_stub_engine().await).unwrap();
    client.delete_device("gone").await.unwrap();
    assert!(matches!(
        client.delete_device("boom").await,
        Err(EngineError::Status(500))
    ));
}

#[tokio::test]
async fn unreachable_engine_is_a_transport_error() {
    // Nothing listens on this port; the connection itself fails.
    let client = HttpRuleEngineClient::new("http://127.0.0.1:1").unwrap();
    assert!(matches!(
        client.delete_rule("r1").await,
        Err(EngineError::Transport(_))
    ));
}
