//! Domain models for the automation API.

pub mod automation;
pub mod codes;
pub mod records;
pub mod requests;

pub use automation::{
    Automation, AutomationView, InputRef, OutputRef, RawDefinition, ResolvedInput, ResolvedOutput,
    TriggerWindow,
};
pub use codes::{ErrorCode, ReferenceFailure};
pub use records::{AreaRecord, DeviceRecord, HomeRecord, UserRecord};
pub use requests::{CreateAutomationRequest, UpdateAutomationRequest};
