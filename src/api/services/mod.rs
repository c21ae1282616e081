//! Services module - business logic for the automation core.

pub mod automation_service;
pub mod changeset;
pub mod lock;
pub mod resolver;
pub mod rule_engine;
pub mod topology;

pub use automation_service::{AutomationService, ListParams, ServiceError};
pub use changeset::{compute_changes, ChangeSet};
pub use lock::{automation_key, LockGuard, LockRegistry};
pub use resolver::{RequestScope, ResolveError, Resolver};
pub use rule_engine::{EngineError, EnginePayload, HttpRuleEngineClient, RuleEngineClient};
pub use topology::{device_fits_hub_scope, FailureBatch};
