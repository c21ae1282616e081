//! Wire error codes returned in the `{code}` response envelope.

use serde::Serialize;

/// Error codes exposed to clients. The `NSERR_` prefix is part of the wire
/// contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    #[serde(rename = "NSERR_SUCCESS")]
    Success,
    #[serde(rename = "NSERR_USERNOTFOUND")]
    UserNotFound,
    #[serde(rename = "NSERR_HOMENOTFOUND")]
    HomeNotFound,
    #[serde(rename = "NSERR_AUTOMATIONNOTFOUND")]
    AutomationNotFound,
    #[serde(rename = "NSERR_ENTITYNOTFOUND")]
    EntityNotFound,
    #[serde(rename = "NSERR_ENTITYNOTSUITABLE")]
    EntityNotSuitable,
    #[serde(rename = "NSERR_NOTHINGCHANGED")]
    NothingChanged,
    #[serde(rename = "NSERR_NOTOWNER")]
    NotOwner,
    #[serde(rename = "NSERR_ENGINEFAILED")]
    EngineFailed,
    #[serde(rename = "NSERR_UNKNOWN")]
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Success => "NSERR_SUCCESS",
            ErrorCode::UserNotFound => "NSERR_USERNOTFOUND",
            ErrorCode::HomeNotFound => "NSERR_HOMENOTFOUND",
            ErrorCode::AutomationNotFound => "NSERR_AUTOMATIONNOTFOUND",
            ErrorCode::EntityNotFound => "NSERR_ENTITYNOTFOUND",
            ErrorCode::EntityNotSuitable => "NSERR_ENTITYNOTSUITABLE",
            ErrorCode::NothingChanged => "NSERR_NOTHINGCHANGED",
            ErrorCode::NotOwner => "NSERR_NOTOWNER",
            ErrorCode::EngineFailed => "NSERR_ENGINEFAILED",
            ErrorCode::Unknown => "NSERR_UNKNOWN",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rejected input/output reference in a validation batch.
///
/// Every bad reference in a request is collected before responding, so the
/// client receives the complete correction list in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceFailure {
    pub id: String,
    pub code: ErrorCode,
}

impl ReferenceFailure {
    pub fn new(id: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            id: id.into(),
            code,
        }
    }
}
