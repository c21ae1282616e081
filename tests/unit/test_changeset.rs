//! Unit tests for the update change-set computation.

use chrono::Utc;
use serde_json::json;

use home_automation_api::models::requests::UpdateAutomationRequest;
use home_automation_api::models::{
    Automation, InputRef, OutputRef, RawDefinition, TriggerWindow,
};
use home_automation_api::services::compute_changes;

fn input(id: &str) -> InputRef {
    InputRef {
        id: id.to_string(),
        state: json!({"on": true}),
        operator: Some("eq".to_string()),
    }
}

fn output(id: &str) -> OutputRef {
    OutputRef::Device {
        id: id.to_string(),
        state: json!({"on": false}),
        delay: Some(5),
    }
}

fn stored() -> Automation {
    let now = Utc::now();
    Automation {
        id: "a1".to_string(),
        home_id: "h1".to_string(),
        user_id: "u1".to_string(),
        app_code: "app".to_string(),
        name: "Evening lights".to_string(),
        logo: "logo-1".to_string(),
        position: 3,
        automation_type: "scene".to_string(),
        logic: "and".to_string(),
        active: true,
        gmt: 0,
        hc_id: None,
        hc_info: None,
        trigger: TriggerWindow {
            start: "0 18 * * *".to_string(),
            end: Some("0 23 * * *".to_string()),
        },
        input_ids: vec!["d1".to_string(), "d2".to_string()],
        output_ids: vec!["d3".to_string()],
        raw: RawDefinition {
            trigger: TriggerWindow {
                start: "0 18 * * *".to_string(),
                end: Some("0 23 * * *".to_string()),
            },
            input: vec![input("d1"), input("d2")],
            output: vec![output("d3")],
        },
        created_at: now,
        created_by: "u1".to_string(),
        updated_at: now,
        updated_by: "u1".to_string(),
    }
}

fn req() -> UpdateAutomationRequest {
    UpdateAutomationRequest {
        id: "a1".to_string(),
        home_id: "h1".to_string(),
        user_id: "u1".to_string(),
        app_code: "app".to_string(),
        ..Default::default()
    }
}

#[test]
fn empty_request_changes_nothing() {
    let changes = compute_changes(&stored(), &req());
    assert!(!changes.changed);
    assert!(!changes.needs_engine_sync());
}

#[test]
fn identical_values_change_nothing() {
    let mut request = req();
    request.active = Some(true);
    request.logo = Some("logo-1".to_string());
    request.logic = Some("and".to_string());
    request.trigger = Some(TriggerWindow {
        start: "0 18 * * *".to_string(),
        end: Some("0 23 * * *".to_string()),
    });

    let changes = compute_changes(&stored(), &request);
    assert!(!changes.changed);
}

#[test]
fn empty_strings_are_skipped() {
    let mut request = req();
    request.name = Some(String::new());
    request.logo = Some(String::new());
    request.logic = Some(String::new());

    let changes = compute_changes(&stored(), &request);
    assert!(!changes.changed);
}

// Long-standing behavior of the update surface: a changed `name` is written
// to `logic`, and `name` itself stays untouched.
#[test]
fn changed_name_is_applied_to_logic_field() {
    let mut request = req();
    request.name = Some("Morning lights".to_string());

    let changes = compute_changes(&stored(), &request);
    assert!(changes.changed);
    assert_eq!(changes.automation.logic, "Morning lights");
    assert_eq!(changes.automation.name, "Evening lights");
    // Name-as-mapped is a local-only change.
    assert!(!changes.needs_engine_sync());
}

#[test]
fn active_change_requires_engine_sync() {
    let mut request = req();
    request.active = Some(false);

    let changes = compute_changes(&stored(), &request);
    assert!(changes.changed);
    assert!(changes.active_changed);
    assert!(changes.needs_engine_sync());
    assert!(!changes.automation.active);
}

#[test]
fn logic_change_requires_engine_sync() {
    let mut request = req();
    request.logic = Some("or".to_string());

    let changes = compute_changes(&stored(), &request);
    assert!(changes.logic_changed);
    assert!(changes.needs_engine_sync());
    assert_eq!(changes.automation.logic, "or");
}

#[test]
fn trigger_change_requires_engine_sync() {
    let mut request = req();
    request.trigger = Some(TriggerWindow {
        start: "0 19 * * *".to_string(),
        end: Some("0 23 * * *".to_string()),
    });

    let changes = compute_changes(&stored(), &request);
    assert!(changes.trigger_changed);
    assert!(changes.needs_engine_sync());
}

#[test]
fn cosmetic_changes_stay_local() {
    let mut request = req();
    request.gmt = Some(2);
    request.logo = Some("logo-2".to_string());
    request.pos = Some(7);
    request.automation_type = Some("routine".to_string());

    let changes = compute_changes(&stored(), &request);
    assert!(changes.changed);
    assert!(!changes.needs_engine_sync());
    assert_eq!(changes.automation.gmt, 2);
    assert_eq!(changes.automation.logo, "logo-2");
    assert_eq!(changes.automation.position, 7);
    assert_eq!(changes.automation.automation_type, "routine");
}

#[test]
fn reordered_input_set_is_not_a_change() {
    let mut request = req();
    request.input = Some(vec![input("d2"), input("d1")]);

    let changes = compute_changes(&stored(), &request);
    assert!(!changes.input_changed);
    assert!(!changes.changed);
}

#[test]
fn different_input_set_is_a_change() {
    let mut request = req();
    request.input = Some(vec![input("d1"), input("d9")]);

    let changes = compute_changes(&stored(), &request);
    assert!(changes.input_changed);
    assert!(changes.needs_engine_sync());
}

#[test]
fn same_ids_with_different_state_is_a_change() {
    let mut request = req();
    let mut changed_input = input("d1");
    changed_input.state = json!({"on": false});
    request.input = Some(vec![changed_input, input("d2")]);

    let changes = compute_changes(&stored(), &request);
    assert!(changes.input_changed);
}

#[test]
fn different_output_set_is_a_change() {
    let mut request = req();
    request.output = Some(vec![output("d4")]);

    let changes = compute_changes(&stored(), &request);
    assert!(changes.output_changed);
    assert!(changes.needs_engine_sync());
}
