//! Automation reconciliation orchestrator.
//!
//! Sequences validation, resolution, the remote rule-engine call and the
//! local transaction for each automation operation. The local cache row is
//! committed only after the engine confirmed the change; on any engine
//! failure the transaction is rolled back so the two never diverge. Update
//! and delete serialize per resource through the advisory lock registry.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::codes::ReferenceFailure;
use crate::models::requests::{CreateAutomationRequest, UpdateAutomationRequest};
use crate::models::{
    Automation, AutomationView, RawDefinition, ResolvedInput, ResolvedOutput,
};
use crate::services::changeset::compute_changes;
use crate::services::lock::{automation_key, LockRegistry};
use crate::services::resolver::{RequestScope, ResolveError, Resolver};
use crate::services::rule_engine::{EngineError, EnginePayload, RuleEngineClient};
use crate::storage::{AutomationFilter, StorageBackend, StorageError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("user not found")]
    UserNotFound,
    #[error("home not found")]
    HomeNotFound,
    #[error("automation not found")]
    AutomationNotFound,
    #[error("caller is not the creator of the automation")]
    NotOwner,
    #[error("one or more references were rejected")]
    InvalidReferences(Vec<ReferenceFailure>),
    #[error("nothing to change")]
    NothingChanged,
    #[error("rule engine call unresolved: {0}")]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ResolveError> for ServiceError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Invalid(failures) => ServiceError::InvalidReferences(failures),
            ResolveError::Storage(e) => ServiceError::Storage(e),
        }
    }
}

/// Query parameters for listing automations.
#[derive(Clone, Debug, Default)]
pub struct ListParams {
    pub home_id: String,
    pub user_id: String,
    pub app_code: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub input_id: Option<String>,
    pub output_id: Option<String>,
}

pub struct AutomationService {
    storage: Arc<dyn StorageBackend>,
    engine: Arc<dyn RuleEngineClient>,
    locks: Arc<LockRegistry>,
    resolver: Resolver,
}

impl AutomationService {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        engine: Arc<dyn RuleEngineClient>,
        locks: Arc<LockRegistry>,
    ) -> Self {
        let resolver = Resolver::new(storage.clone());
        Self {
            storage,
            engine,
            locks,
            resolver,
        }
    }

    /// Create an automation: validate topology, resolve references, register
    /// the rule with the engine, then persist the cache row.
    pub async fn create(
        &self,
        req: CreateAutomationRequest,
    ) -> Result<AutomationView, ServiceError> {
        self.storage
            .get_user(&req.user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        let home = self
            .storage
            .get_home(&req.home_id, &req.app_code)
            .await?
            .ok_or(ServiceError::HomeNotFound)?;
        if home.owner_id != req.user_id {
            return Err(ServiceError::HomeNotFound);
        }

        let scope = RequestScope {
            home_id: req.home_id.clone(),
            user_id: req.user_id.clone(),
            app_code: req.app_code.clone(),
        };

        let hc_id = req.hc_id.clone().filter(|id| !id.is_empty());
        let hc_info = match hc_id.as_deref() {
            Some(hc) => {
                let hub = self
                    .storage
                    .get_device(&scope.home_id, &scope.user_id, &scope.app_code, hc)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::InvalidReferences(vec![ReferenceFailure::new(
                            hc,
                            crate::models::ErrorCode::EntityNotFound,
                        )])
                    })?;
                Some(json!({
                    "id": hub.id,
                    "name": hub.name,
                    "vendor": hub.vendor,
                    "family": hub.family,
                    "connection": hub.connection,
                }))
            }
            None => None,
        };

        let inputs = self
            .resolver
            .resolve_inputs(&scope, hc_id.as_deref(), &req.input)
            .await?;
        let outputs = self
            .resolver
            .resolve_outputs(&scope, hc_id.as_deref(), &req.output)
            .await?;

        let now = Utc::now();
        let raw_trigger = req.trigger.clone();
        let mut automation = Automation {
            id: String::new(),
            home_id: req.home_id,
            user_id: req.user_id.clone(),
            app_code: req.app_code,
            name: req.name,
            logo: req.logo,
            position: req.pos.clamp(-1, 127),
            automation_type: req.automation_type,
            logic: req.logic,
            active: req.active,
            gmt: req.gmt,
            hc_id,
            hc_info,
            trigger: req.trigger,
            input_ids: req.input.iter().map(|i| i.id.clone()).collect(),
            output_ids: req
                .output
                .iter()
                .map(|o| o.ref_id().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            raw: RawDefinition {
                trigger: raw_trigger,
                input: req.input,
                output: req.output,
            },
            created_at: now,
            created_by: req.user_id.clone(),
            updated_at: now,
            updated_by: req.user_id,
        };

        let payload = EnginePayload::from_automation(&automation, &inputs, &outputs);
        // The engine assigns the automation id; without one there is nothing
        // to cache.
        automation.id = self.engine.create_rule(&payload).await?;

        // Dropping the transaction without commit discards the staged row,
        // so any failure past this point leaves the store untouched.
        let mut tx = self.storage.begin().await?;
        tx.insert_automation(&automation).await?;
        tx.commit().await?;
        info!(id = %automation.id, home = %automation.home_id, "automation created");

        Ok(AutomationView {
            automation,
            input: inputs,
            output: outputs,
        })
    }

    /// List automations for a home, resolving each input/output array with
    /// the lenient read-path rules (stale references flagged `deleted`).
    pub async fn list(&self, params: ListParams) -> Result<Vec<AutomationView>, ServiceError> {
        let home = self
            .storage
            .get_home(&params.home_id, &params.app_code)
            .await?
            .ok_or(ServiceError::HomeNotFound)?;

        let scope = RequestScope {
            home_id: params.home_id.clone(),
            user_id: params.user_id.clone(),
            app_code: params.app_code.clone(),
        };
        let filter = AutomationFilter {
            id: params.id,
            name: params.name,
            input_id: params.input_id,
            output_id: params.output_id,
        };

        let automations = self
            .storage
            .list_automations(&params.home_id, &params.app_code, &filter)
            .await?;

        let mut views = Vec::with_capacity(automations.len());
        for automation in automations {
            let input = self
                .resolver
                .resolve_inputs_for_read(&scope, &home.owner_id, &automation.raw.input)
                .await?;
            let output = self
                .resolver
                .resolve_outputs_for_read(&scope, &home.owner_id, &automation.raw.output)
                .await?;
            views.push(AutomationView {
                automation,
                input,
                output,
            });
        }
        Ok(views)
    }

    /// Update an automation under the per-resource lock. Local fields are
    /// always updatable; the engine is re-synced only when a tracked field
    /// changed, and an unresolved engine call rolls the row back.
    pub async fn update(
        &self,
        req: UpdateAutomationRequest,
    ) -> Result<AutomationView, ServiceError> {
        let key = automation_key(&req.id, &req.user_id, &req.home_id, &req.app_code);
        let _guard = self.locks.acquire(&key).await;

        let home = self
            .storage
            .get_home(&req.home_id, &req.app_code)
            .await?
            .ok_or(ServiceError::HomeNotFound)?;
        let stored = self
            .storage
            .get_automation(&req.id, &req.home_id, &req.app_code)
            .await?
            .ok_or(ServiceError::AutomationNotFound)?;
        if stored.created_by != req.user_id {
            return Err(ServiceError::NotOwner);
        }

        let changes = compute_changes(&stored, &req);
        if !changes.changed {
            return Err(ServiceError::NothingChanged);
        }
        let needs_engine_sync = changes.needs_engine_sync();
        let mut automation = changes.automation;

        let scope = RequestScope {
            home_id: req.home_id.clone(),
            user_id: req.user_id.clone(),
            app_code: req.app_code.clone(),
        };
        let hc_id = automation.hc_id.clone();

        let inputs: Vec<ResolvedInput> = if changes.input_changed {
            // Safe: input_changed implies the request carried an input set.
            let incoming = req.input.clone().unwrap_or_default();
            let resolved = self
                .resolver
                .resolve_inputs(&scope, hc_id.as_deref(), &incoming)
                .await?;
            automation.input_ids = incoming.iter().map(|i| i.id.clone()).collect();
            automation.raw.input = incoming;
            resolved
        } else {
            self.resolver
                .resolve_inputs_for_read(&scope, &home.owner_id, &automation.raw.input)
                .await?
        };

        let outputs: Vec<ResolvedOutput> = if changes.output_changed {
            let incoming = req.output.clone().unwrap_or_default();
            let resolved = self
                .resolver
                .resolve_outputs(&scope, hc_id.as_deref(), &incoming)
                .await?;
            automation.output_ids = incoming
                .iter()
                .map(|o| o.ref_id().to_string())
                .filter(|id| !id.is_empty())
                .collect();
            automation.raw.output = incoming;
            resolved
        } else {
            self.resolver
                .resolve_outputs_for_read(&scope, &home.owner_id, &automation.raw.output)
                .await?
        };

        if changes.trigger_changed {
            automation.raw.trigger = automation.trigger.clone();
        }
        automation.updated_at = Utc::now();
        automation.updated_by = req.user_id.clone();

        let mut tx = self.storage.begin().await?;
        tx.update_automation(&automation).await?;

        if needs_engine_sync {
            let payload = EnginePayload::from_automation(&automation, &inputs, &outputs);
            if let Err(e) = self.engine.update_rule(&automation.id, &payload).await {
                warn!(id = %automation.id, error = %e, "engine update unresolved, rolling back");
                tx.rollback().await?;
                return Err(ServiceError::Engine(e));
            }
        }

        tx.commit().await?;
        info!(id = %automation.id, engine_synced = needs_engine_sync, "automation updated");

        Ok(AutomationView {
            automation,
            input: inputs,
            output: outputs,
        })
    }

    /// Delete an automation under the per-resource lock, removing the local
    /// row and the remote rule together. An engine-side 404 counts as a
    /// successful delete.
    pub async fn delete(
        &self,
        id: &str,
        user_id: &str,
        home_id: &str,
        app_code: &str,
    ) -> Result<(), ServiceError> {
        let key = automation_key(id, user_id, home_id, app_code);
        let _guard = self.locks.acquire(&key).await;

        let stored = self
            .storage
            .get_automation(id, home_id, app_code)
            .await?
            .ok_or(ServiceError::AutomationNotFound)?;
        if stored.created_by != user_id {
            return Err(ServiceError::NotOwner);
        }

        let mut tx = self.storage.begin().await?;
        tx.delete_automation(id).await?;

        if let Err(e) = self.engine.delete_rule(id).await {
            warn!(%id, error = %e, "engine delete unresolved, rolling back");
            tx.rollback().await?;
            return Err(ServiceError::Engine(e));
        }

        tx.commit().await?;
        info!(%id, "automation deleted");
        Ok(())
    }

    /// Delete a home the caller owns. Automations are the first dependent
    /// resource removed: every one of them must be deleted on the engine
    /// side before any local row is touched, and one unresolved engine
    /// delete aborts the whole cascade.
    pub async fn delete_home(
        &self,
        home_id: &str,
        user_id: &str,
        app_code: &str,
    ) -> Result<(), ServiceError> {
        let home = self
            .storage
            .get_home(home_id, app_code)
            .await?
            .ok_or(ServiceError::HomeNotFound)?;
        if home.owner_id != user_id {
            return Err(ServiceError::NotOwner);
        }

        let automations = self
            .storage
            .list_automations(home_id, app_code, &AutomationFilter::default())
            .await?;
        for automation in &automations {
            self.engine.delete_rule(&automation.id).await?;
        }

        let mut tx = self.storage.begin().await?;
        tx.delete_home(home_id, app_code).await?;
        tx.commit().await?;
        info!(%home_id, automations = automations.len(), "home deleted with cascade");
        Ok(())
    }
}
