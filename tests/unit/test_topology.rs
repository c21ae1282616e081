//! Unit tests for the hub-controller topology rule.

use home_automation_api::services::{device_fits_hub_scope, FailureBatch};

#[test]
fn standalone_automation_accepts_standalone_device() {
    assert!(device_fits_hub_scope(None, None));
}

#[test]
fn standalone_automation_rejects_hub_attached_device() {
    assert!(!device_fits_hub_scope(None, Some("hc1")));
}

#[test]
fn hub_automation_rejects_standalone_device() {
    assert!(!device_fits_hub_scope(Some("hc1"), None));
}

#[test]
fn hub_automation_rejects_device_from_other_hub() {
    assert!(!device_fits_hub_scope(Some("hc1"), Some("hc2")));
}

#[test]
fn hub_automation_accepts_device_from_same_hub() {
    assert!(device_fits_hub_scope(Some("hc1"), Some("hc1")));
}

#[test]
fn empty_strings_count_as_absent() {
    assert!(device_fits_hub_scope(Some(""), Some("")));
    assert!(device_fits_hub_scope(None, Some("")));
    assert!(!device_fits_hub_scope(Some("hc1"), Some("")));
    assert!(!device_fits_hub_scope(Some(""), Some("hc1")));
}

#[test]
fn failure_batch_collects_every_rejection() {
    let mut batch = FailureBatch::new();
    assert!(batch.is_empty());

    batch.not_found("d9");
    batch.not_suitable("d2");
    batch.not_found("d7");

    let failures = batch.into_failures();
    assert_eq!(failures.len(), 3);
    assert_eq!(failures[0].id, "d9");
    assert_eq!(failures[0].code.as_str(), "NSERR_ENTITYNOTFOUND");
    assert_eq!(failures[1].id, "d2");
    assert_eq!(failures[1].code.as_str(), "NSERR_ENTITYNOTSUITABLE");
    assert_eq!(failures[2].id, "d7");
}
