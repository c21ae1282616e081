//! Hub-controller topology validation.
//!
//! Decides whether a device may legally be wired as an input or output of an
//! automation, based on whether the automation is hub-scoped and whether the
//! device hangs off a hub controller. Pure decisions over fetched records.

use crate::models::codes::{ErrorCode, ReferenceFailure};

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// True iff a device with `parent_id` may be referenced by an automation
/// whose hub controller is `hc_id` (empty strings count as absent).
///
/// A reference is rejected when the automation is hub-scoped and the device
/// belongs to a different hub, when the automation is hub-scoped and the
/// device is standalone, or when the automation is standalone and the device
/// belongs to some hub.
pub fn device_fits_hub_scope(hc_id: Option<&str>, parent_id: Option<&str>) -> bool {
    let hc_id = non_empty(hc_id);
    let parent_id = non_empty(parent_id);

    match (hc_id, parent_id) {
        (Some(hc), Some(parent)) => hc == parent,
        (Some(_), None) => false,
        (None, Some(_)) => false,
        (None, None) => true,
    }
}

/// Accumulates rejected references across a whole request.
///
/// All provided references are checked even after one is known to fail, so
/// the client gets one complete correction list instead of the first error.
#[derive(Debug, Default)]
pub struct FailureBatch {
    failures: Vec<ReferenceFailure>,
}

impl FailureBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn not_found(&mut self, id: &str) {
        self.failures
            .push(ReferenceFailure::new(id, ErrorCode::EntityNotFound));
    }

    pub fn not_suitable(&mut self, id: &str) {
        self.failures
            .push(ReferenceFailure::new(id, ErrorCode::EntityNotSuitable));
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_failures(self) -> Vec<ReferenceFailure> {
        self.failures
    }
}
