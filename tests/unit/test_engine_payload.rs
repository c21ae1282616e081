//! Unit tests for the rule-engine payload normalization.

use chrono::Utc;
use serde_json::json;

use home_automation_api::models::{Automation, RawDefinition, TriggerWindow};
use home_automation_api::services::EnginePayload;

fn automation(hc_id: Option<&str>, end: Option<&str>) -> Automation {
    let now = Utc::now();
    let trigger = TriggerWindow {
        start: "0 8 * * *".to_string(),
        end: end.map(str::to_string),
    };
    Automation {
        id: "a1".to_string(),
        home_id: "h1".to_string(),
        user_id: "u1".to_string(),
        app_code: "app".to_string(),
        name: "Wake up".to_string(),
        logo: "sun".to_string(),
        position: 0,
        automation_type: "routine".to_string(),
        logic: "or".to_string(),
        active: true,
        gmt: 1,
        hc_id: hc_id.map(str::to_string),
        hc_info: None,
        trigger: trigger.clone(),
        input_ids: vec![],
        output_ids: vec![],
        raw: RawDefinition {
            trigger,
            input: vec![],
            output: vec![],
        },
        created_at: now,
        created_by: "u1".to_string(),
        updated_at: now,
        updated_by: "u1".to_string(),
    }
}

#[test]
fn home_id_becomes_space_id() {
    let payload = EnginePayload::from_automation(&automation(None, Some("0 9 * * *")), &[], &[]);
    let value = serde_json::to_value(&payload).unwrap();
    assert_eq!(value["spaceId"], json!("h1"));
    assert!(value.get("homeId").is_none());
}

#[test]
fn hc_id_is_omitted_when_absent() {
    let payload = EnginePayload::from_automation(&automation(None, None), &[], &[]);
    let value = serde_json::to_value(&payload).unwrap();
    assert!(value.get("HCId").is_none());

    let payload = EnginePayload::from_automation(&automation(Some(""), None), &[], &[]);
    let value = serde_json::to_value(&payload).unwrap();
    assert!(value.get("HCId").is_none());
}

#[test]
fn hc_id_is_kept_when_set() {
    let payload = EnginePayload::from_automation(&automation(Some("hc1"), None), &[], &[]);
    let value = serde_json::to_value(&payload).unwrap();
    assert_eq!(value["HCId"], json!("hc1"));
}

#[test]
fn missing_trigger_end_defaults_to_start() {
    let payload = EnginePayload::from_automation(&automation(None, None), &[], &[]);
    assert_eq!(payload.trigger.configuration.end, "0 8 * * *");

    let payload = EnginePayload::from_automation(&automation(None, Some("")), &[], &[]);
    assert_eq!(payload.trigger.configuration.end, "0 8 * * *");

    let payload = EnginePayload::from_automation(&automation(None, Some("0 9 * * *")), &[], &[]);
    assert_eq!(payload.trigger.configuration.end, "0 9 * * *");
}
