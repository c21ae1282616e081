//! Remote rule-engine client.
//!
//! The external rule-execution service owns the authoritative automation
//! definition; the local store only caches a queryable projection. Any
//! failure here is surfaced as [`EngineError`] and the orchestrator rolls
//! the local transaction back, so cache and engine never diverge.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Automation, ResolvedInput, ResolvedOutput};

// A hung engine call would hold the per-resource advisory lock, so every
// request carries a bounded timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Rule-engine call failures. All of them mean "unresolved": the caller must
/// treat the remote state as unconfirmed and roll back local changes.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Rule engine transport error: {0}")]
    Transport(String),
    #[error("Rule engine returned status {0}")]
    Status(u16),
    #[error("Rule engine response missing rule id")]
    MissingId,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EngineTriggerConfig {
    pub start: String,
    pub end: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EngineTrigger {
    #[serde(rename = "type")]
    pub trigger_type: String,
    pub configuration: EngineTriggerConfig,
}

/// Engine-facing automation definition.
///
/// Normalization rules: the home id is renamed to the engine's `spaceId`,
/// `HCId` is omitted entirely when the automation is not hub-scoped, and a
/// missing trigger `end` defaults to `start`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EnginePayload {
    pub name: String,
    #[serde(rename = "spaceId")]
    pub space_id: String,
    #[serde(rename = "HCId", skip_serializing_if = "Option::is_none")]
    pub hc_id: Option<String>,
    #[serde(rename = "processedAt")]
    pub processed_at: i64,
    pub logo: String,
    #[serde(rename = "type")]
    pub automation_type: String,
    pub logic: String,
    pub active: bool,
    pub trigger: EngineTrigger,
    pub input: Vec<Value>,
    pub output: Vec<Value>,
}

impl EnginePayload {
    /// Build the engine payload from the cached row plus resolved
    /// input/output arrays.
    pub fn from_automation(
        automation: &Automation,
        input: &[ResolvedInput],
        output: &[ResolvedOutput],
    ) -> Self {
        let start = automation.trigger.start.clone();
        let end = automation
            .trigger
            .end
            .clone()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| start.clone());

        Self {
            name: automation.name.clone(),
            space_id: automation.home_id.clone(),
            hc_id: automation.hc_id.clone().filter(|id| !id.is_empty()),
            processed_at: Utc::now().timestamp_millis(),
            logo: automation.logo.clone(),
            automation_type: automation.automation_type.clone(),
            logic: automation.logic.clone(),
            active: automation.active,
            trigger: EngineTrigger {
                trigger_type: "timer".to_string(),
                configuration: EngineTriggerConfig { start, end },
            },
            input: input
                .iter()
                .map(|i| serde_json::to_value(i).unwrap_or(Value::Null))
                .collect(),
            output: output
                .iter()
                .map(|o| serde_json::to_value(o).unwrap_or(Value::Null))
                .collect(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct CreateRuleResponse {
    id: Option<String>,
}

/// Client for the remote rule-execution service.
#[async_trait]
pub trait RuleEngineClient: Send + Sync {
    /// Create the rule; returns the engine-assigned automation id.
    async fn create_rule(&self, payload: &EnginePayload) -> Result<String, EngineError>;

    /// Replace the rule definition by id.
    async fn update_rule(&self, id: &str, payload: &EnginePayload) -> Result<(), EngineError>;

    /// Delete the rule by id. An engine-side 404 counts as success.
    async fn delete_rule(&self, id: &str) -> Result<(), EngineError>;

    /// Delete a device sub-resource by id, with the same 404 contract.
    async fn delete_device(&self, id: &str) -> Result<(), EngineError>;
}

/// HTTP implementation against the engine's `/rule` surface.
///
/// TLS certificate validation stays enabled; the only non-default client
/// setting is the request timeout.
pub struct HttpRuleEngineClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRuleEngineClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn rule_url(&self, id: &str) -> String {
        format!("{}/rule/{}", self.base_url, id)
    }
}

#[async_trait]
impl RuleEngineClient for HttpRuleEngineClient {
    async fn create_rule(&self, payload: &EnginePayload) -> Result<String, EngineError> {
        debug!(body = ?payload, "POST /rule");
        let response = self
            .client
            .post(format!("{}/rule", self.base_url))
            .json(payload)
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "rule engine create failed");
            return Err(EngineError::Status(status.as_u16()));
        }

        let body: CreateRuleResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        debug!(?body, "rule engine create response");
        body.id.filter(|id| !id.is_empty()).ok_or(EngineError::MissingId)
    }

    async fn update_rule(&self, id: &str, payload: &EnginePayload) -> Result<(), EngineError> {
        debug!(%id, body = ?payload, "PUT /rule/{{id}}");
        let response = self
            .client
            .put(self.rule_url(id))
            .json(payload)
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%id, %status, %body, "rule engine update failed");
            return Err(EngineError::Status(status.as_u16()));
        }
        Ok(())
    }

    async fn delete_rule(&self, id: &str) -> Result<(), EngineError> {
        debug!(%id, "DELETE /rule/{{id}}");
        let response = self
            .client
            .delete(self.rule_url(id))
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        // The rule may already be gone on the engine side; deletes are
        // idempotent.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        warn!(%id, %status, %body, "rule engine delete failed");
        Err(EngineError::Status(status.as_u16()))
    }

    async fn delete_device(&self, id: &str) -> Result<(), EngineError> {
        debug!(%id, "DELETE /rule/device/{{id}}");
        let response = self
            .client
            .delete(format!("{}/rule/device/{}", self.base_url, id))
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        warn!(%id, %status, %body, "rule engine device delete failed");
        Err(EngineError::Status(status.as_u16()))
    }
}
