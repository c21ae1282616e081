//! Request bodies for the automation surface.

use serde::Deserialize;

use super::automation::{InputRef, OutputRef, TriggerWindow};

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAutomationRequest {
    pub home_id: String,
    pub user_id: String,
    pub app_code: String,
    pub name: String,
    #[serde(default)]
    pub logo: String,
    /// Display order, -1..=127.
    #[serde(default)]
    pub pos: i16,
    #[serde(default, rename = "type")]
    pub automation_type: String,
    /// `and` | `or`.
    pub logic: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, rename = "GMT")]
    pub gmt: i32,
    #[serde(default)]
    pub hc_id: Option<String>,
    pub trigger: TriggerWindow,
    #[serde(default)]
    pub input: Vec<InputRef>,
    #[serde(default)]
    pub output: Vec<OutputRef>,
}

/// Update body: every field beyond the identity tuple is optional and only
/// applied when present, non-empty and different from the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAutomationRequest {
    pub id: String,
    pub home_id: String,
    pub user_id: String,
    pub app_code: String,
    #[serde(default, rename = "GMT")]
    pub gmt: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default, rename = "type")]
    pub automation_type: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub pos: Option<i16>,
    #[serde(default)]
    pub logic: Option<String>,
    #[serde(default)]
    pub trigger: Option<TriggerWindow>,
    #[serde(default)]
    pub input: Option<Vec<InputRef>>,
    #[serde(default)]
    pub output: Option<Vec<OutputRef>>,
}
