//! Automation model: the locally cached projection of a home-automation rule.
//!
//! The authoritative rule lives in the remote rule-execution engine; the row
//! kept here is a queryable cache plus the `raw` definition last accepted by
//! the engine, retained for diffing on update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schedule window during which the automation may fire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerWindow {
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// A device participating as a trigger/condition source, as submitted by the
/// client. Denormalized display metadata is attached during resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputRef {
    pub id: String,
    #[serde(default)]
    pub state: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
}

/// A target acted on when the automation fires, discriminated by `type`.
///
/// `Scene` points at another automation used as a macro target; `Notice` is a
/// free-form in-app notification payload with no existence check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputRef {
    Device {
        id: String,
        #[serde(default)]
        state: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay: Option<i64>,
    },
    Scene {
        id: String,
        #[serde(default)]
        state: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay: Option<i64>,
    },
    Notice {
        #[serde(flatten)]
        payload: serde_json::Map<String, Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay: Option<i64>,
    },
}

impl OutputRef {
    /// Reference id used for sorting and failure reporting. Notices carry no
    /// referenced entity and sort with an empty key.
    pub fn ref_id(&self) -> &str {
        match self {
            OutputRef::Device { id, .. } | OutputRef::Scene { id, .. } => id,
            OutputRef::Notice { .. } => "",
        }
    }
}

/// The definition last accepted by the remote rule engine, kept in the shape
/// the client submitted it so updates can be diffed against it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawDefinition {
    pub trigger: TriggerWindow,
    pub input: Vec<InputRef>,
    pub output: Vec<OutputRef>,
}

/// An input reference enriched with live device metadata for responses and
/// for the engine payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedInput {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
    pub vendor: String,
    pub family: String,
    pub connection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub state: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    /// Set on the read path when the referenced device no longer resolves for
    /// either the acting user or the home owner. Stale references stay
    /// visible to the client instead of being dropped.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

/// An output reference enriched for responses and the engine payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResolvedOutput {
    #[serde(rename_all = "camelCase")]
    Device {
        id: String,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        area_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        area_name: Option<String>,
        vendor: String,
        family: String,
        connection: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        parent_id: Option<String>,
        state: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        delay: Option<i64>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        deleted: bool,
    },
    Scene {
        id: String,
        name: String,
        state: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        delay: Option<i64>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        deleted: bool,
    },
    Notice {
        #[serde(flatten)]
        payload: serde_json::Map<String, Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        delay: Option<i64>,
    },
}

/// Cached automation row. `(home_id, user_id, app_code)` is the composite
/// ownership key; only `created_by` may update or delete the row.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Automation {
    pub id: String,
    pub home_id: String,
    pub user_id: String,
    pub app_code: String,
    pub name: String,
    pub logo: String,
    /// Display order, -1..=127.
    pub position: i16,
    #[serde(rename = "type")]
    pub automation_type: String,
    /// `and` | `or`. Kept as a plain string: the update path's historical
    /// name-to-logic mapping can write arbitrary values here.
    pub logic: String,
    pub active: bool,
    #[serde(rename = "GMT")]
    pub gmt: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hc_info: Option<Value>,
    pub trigger: TriggerWindow,
    pub input_ids: Vec<String>,
    pub output_ids: Vec<String>,
    #[serde(skip_serializing)]
    pub raw: RawDefinition,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl Automation {
    /// True iff the automation is scoped to a hub controller.
    pub fn is_in_hc(&self) -> bool {
        self.hc_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// Fully denormalized automation as returned to clients: the cached row plus
/// resolved input/output arrays.
#[derive(Clone, Debug, Serialize)]
pub struct AutomationView {
    #[serde(flatten)]
    pub automation: Automation,
    pub input: Vec<ResolvedInput>,
    pub output: Vec<ResolvedOutput>,
}
