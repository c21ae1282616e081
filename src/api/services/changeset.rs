//! Automation change-set computation.
//!
//! On update, the stored automation is the baseline. Each optional incoming
//! field is applied iff it is present, non-empty and different from the
//! baseline; the result records both whether anything changed at all and
//! whether the change requires re-synchronizing the remote rule engine.

use serde::Serialize;
use serde_json::Value;

use crate::models::requests::UpdateAutomationRequest;
use crate::models::Automation;

/// Outcome of diffing an update request against the stored automation.
///
/// `automation` is the baseline with all scalar field changes applied.
/// Input/output sets are only flagged here; the caller validates and applies
/// them after resolution succeeds.
#[derive(Debug)]
pub struct ChangeSet {
    pub automation: Automation,
    pub changed: bool,
    pub logic_changed: bool,
    pub active_changed: bool,
    pub trigger_changed: bool,
    pub input_changed: bool,
    pub output_changed: bool,
}

impl ChangeSet {
    /// Whether the remote rule engine must be re-synced. Cosmetic fields
    /// (name-as-mapped, logo, position, type, timezone) update only the
    /// local cache row.
    pub fn needs_engine_sync(&self) -> bool {
        self.logic_changed
            || self.active_changed
            || self.trigger_changed
            || self.input_changed
            || self.output_changed
    }
}

/// Serialize references and sort ascending by `id` (string comparison,
/// missing id ties at the front).
pub fn sorted_refs<T: Serialize>(items: &[T]) -> Vec<Value> {
    let mut values: Vec<Value> = items
        .iter()
        .map(|item| serde_json::to_value(item).unwrap_or(Value::Null))
        .collect();
    values.sort_by(|a, b| {
        let a = a.get("id").and_then(Value::as_str).unwrap_or("");
        let b = b.get("id").and_then(Value::as_str).unwrap_or("");
        a.cmp(b)
    });
    values
}

/// Deep inequality of two reference sets after sorting by id.
pub fn refs_differ<T: Serialize>(incoming: &[T], baseline: &[T]) -> bool {
    sorted_refs(incoming) != sorted_refs(baseline)
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Diff `req` against `stored`, applying scalar changes to a copy of the
/// stored automation.
pub fn compute_changes(stored: &Automation, req: &UpdateAutomationRequest) -> ChangeSet {
    let mut automation = stored.clone();
    let mut changed = false;
    let mut logic_changed = false;
    let mut active_changed = false;
    let mut trigger_changed = false;

    if let Some(gmt) = req.gmt {
        if gmt != automation.gmt {
            automation.gmt = gmt;
            changed = true;
        }
    }

    // Historical mapping kept on purpose: a changed `name` is written to the
    // stored `logic` field, and `name` itself stays as it was. Clients of
    // the original service depend on this.
    if let Some(name) = present(&req.name) {
        if name != automation.name {
            automation.logic = name.to_string();
            changed = true;
        }
    }

    if let Some(active) = req.active {
        if active != automation.active {
            automation.active = active;
            active_changed = true;
            changed = true;
        }
    }

    if let Some(automation_type) = present(&req.automation_type) {
        if automation_type != automation.automation_type {
            automation.automation_type = automation_type.to_string();
            changed = true;
        }
    }

    if let Some(logo) = present(&req.logo) {
        if logo != automation.logo {
            automation.logo = logo.to_string();
            changed = true;
        }
    }

    if let Some(pos) = req.pos {
        if pos != automation.position {
            automation.position = pos.clamp(-1, 127);
            changed = true;
        }
    }

    if let Some(logic) = present(&req.logic) {
        if logic != automation.logic {
            automation.logic = logic.to_string();
            logic_changed = true;
            changed = true;
        }
    }

    if let Some(trigger) = &req.trigger {
        if *trigger != automation.trigger {
            automation.trigger = trigger.clone();
            trigger_changed = true;
            changed = true;
        }
    }

    let input_changed = req
        .input
        .as_ref()
        .is_some_and(|input| refs_differ(input, &stored.raw.input));
    let output_changed = req
        .output
        .as_ref()
        .is_some_and(|output| refs_differ(output, &stored.raw.output));
    changed = changed || input_changed || output_changed;

    ChangeSet {
        automation,
        changed,
        logic_changed,
        active_changed,
        trigger_changed,
        input_changed,
        output_changed,
    }
}
