//! Device/scene resolution.
//!
//! Turns raw input/output references into records enriched with area, vendor
//! and type metadata, suitable for the cached `raw` payload and for
//! responses. Write-path resolution is strict (unresolved or ill-wired
//! references abort the whole request with the complete failure batch); the
//! read path tolerates stale references and flags them `deleted` instead.

use std::sync::Arc;

use crate::models::codes::ReferenceFailure;
use crate::models::{DeviceRecord, InputRef, OutputRef, ResolvedInput, ResolvedOutput};
use crate::services::topology::{device_fits_hub_scope, FailureBatch};
use crate::storage::{StorageBackend, StorageError};

/// Ownership scope of the request being processed.
#[derive(Clone, Debug)]
pub struct RequestScope {
    pub home_id: String,
    pub user_id: String,
    pub app_code: String,
}

/// Resolution failure: either the storage layer failed, or one or more
/// references were rejected (the full batch is reported at once).
#[derive(Debug)]
pub enum ResolveError {
    Invalid(Vec<ReferenceFailure>),
    Storage(StorageError),
}

impl From<StorageError> for ResolveError {
    fn from(e: StorageError) -> Self {
        ResolveError::Storage(e)
    }
}

pub struct Resolver {
    storage: Arc<dyn StorageBackend>,
}

impl Resolver {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    async fn area_name(
        &self,
        home_id: &str,
        area_id: Option<&str>,
    ) -> Result<Option<String>, StorageError> {
        match area_id {
            Some(area_id) => Ok(self
                .storage
                .get_area(home_id, area_id)
                .await?
                .map(|a| a.name)),
            None => Ok(None),
        }
    }

    async fn hydrate_input(
        &self,
        device: &DeviceRecord,
        reference: &InputRef,
    ) -> Result<ResolvedInput, StorageError> {
        let area_name = self
            .area_name(&device.home_id, device.area_id.as_deref())
            .await?;
        Ok(ResolvedInput {
            id: device.id.clone(),
            name: device.name.clone(),
            area_id: device.area_id.clone(),
            area_name,
            vendor: device.vendor.clone(),
            family: device.family.clone(),
            connection: device.connection.clone(),
            parent_id: device.parent_id.clone(),
            state: reference.state.clone(),
            operator: reference.operator.clone(),
            deleted: false,
        })
    }

    async fn hydrate_output_device(
        &self,
        device: &DeviceRecord,
        state: &serde_json::Value,
        delay: Option<i64>,
    ) -> Result<ResolvedOutput, StorageError> {
        let area_name = self
            .area_name(&device.home_id, device.area_id.as_deref())
            .await?;
        Ok(ResolvedOutput::Device {
            id: device.id.clone(),
            name: device.name.clone(),
            area_id: device.area_id.clone(),
            area_name,
            vendor: device.vendor.clone(),
            family: device.family.clone(),
            connection: device.connection.clone(),
            parent_id: device.parent_id.clone(),
            state: state.clone(),
            delay,
            deleted: false,
        })
    }

    /// Strict input resolution for create/update. Every reference is checked
    /// even after one fails; any failure aborts with the complete batch.
    pub async fn resolve_inputs(
        &self,
        scope: &RequestScope,
        hc_id: Option<&str>,
        inputs: &[InputRef],
    ) -> Result<Vec<ResolvedInput>, ResolveError> {
        let mut batch = FailureBatch::new();
        let mut resolved = Vec::with_capacity(inputs.len());

        for reference in inputs {
            let device = self
                .storage
                .get_device(&scope.home_id, &scope.user_id, &scope.app_code, &reference.id)
                .await?;
            match device {
                None => batch.not_found(&reference.id),
                Some(device) => {
                    if device_fits_hub_scope(hc_id, device.parent_id.as_deref()) {
                        resolved.push(self.hydrate_input(&device, reference).await?);
                    } else {
                        batch.not_suitable(&reference.id);
                    }
                }
            }
        }

        if batch.is_empty() {
            Ok(resolved)
        } else {
            Err(ResolveError::Invalid(batch.into_failures()))
        }
    }

    /// Strict output resolution for create/update. Scenes must already exist
    /// under the same user/home/app; notices pass through unchecked.
    pub async fn resolve_outputs(
        &self,
        scope: &RequestScope,
        hc_id: Option<&str>,
        outputs: &[OutputRef],
    ) -> Result<Vec<ResolvedOutput>, ResolveError> {
        let mut batch = FailureBatch::new();
        let mut resolved = Vec::with_capacity(outputs.len());

        for reference in outputs {
            match reference {
                OutputRef::Device { id, state, delay } => {
                    let device = self
                        .storage
                        .get_device(&scope.home_id, &scope.user_id, &scope.app_code, id)
                        .await?;
                    match device {
                        None => batch.not_found(id),
                        Some(device) => {
                            if device_fits_hub_scope(hc_id, device.parent_id.as_deref()) {
                                resolved.push(
                                    self.hydrate_output_device(&device, state, *delay).await?,
                                );
                            } else {
                                batch.not_suitable(id);
                            }
                        }
                    }
                }
                OutputRef::Scene { id, state, delay } => {
                    let scene = self
                        .storage
                        .get_automation(id, &scope.home_id, &scope.app_code)
                        .await?
                        .filter(|a| a.user_id == scope.user_id);
                    match scene {
                        None => batch.not_found(id),
                        Some(scene) => resolved.push(ResolvedOutput::Scene {
                            id: scene.id,
                            name: scene.name,
                            state: state.clone(),
                            delay: *delay,
                            deleted: false,
                        }),
                    }
                }
                OutputRef::Notice { payload, delay } => resolved.push(ResolvedOutput::Notice {
                    payload: payload.clone(),
                    delay: *delay,
                }),
            }
        }

        if batch.is_empty() {
            Ok(resolved)
        } else {
            Err(ResolveError::Invalid(batch.into_failures()))
        }
    }

    async fn device_for_read(
        &self,
        scope: &RequestScope,
        owner_id: &str,
        device_id: &str,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        // Shared/member visibility: the acting user first, then the home
        // owner; first match wins.
        if let Some(device) = self
            .storage
            .get_device(&scope.home_id, &scope.user_id, &scope.app_code, device_id)
            .await?
        {
            return Ok(Some(device));
        }
        self.storage
            .get_device(&scope.home_id, owner_id, &scope.app_code, device_id)
            .await
    }

    /// Lenient input resolution for reads: unresolved references are flagged
    /// `deleted` rather than dropped, so stale entries stay visible.
    pub async fn resolve_inputs_for_read(
        &self,
        scope: &RequestScope,
        owner_id: &str,
        inputs: &[InputRef],
    ) -> Result<Vec<ResolvedInput>, StorageError> {
        let mut resolved = Vec::with_capacity(inputs.len());
        for reference in inputs {
            match self.device_for_read(scope, owner_id, &reference.id).await? {
                Some(device) => resolved.push(self.hydrate_input(&device, reference).await?),
                None => resolved.push(ResolvedInput {
                    id: reference.id.clone(),
                    name: String::new(),
                    area_id: None,
                    area_name: None,
                    vendor: String::new(),
                    family: String::new(),
                    connection: String::new(),
                    parent_id: None,
                    state: reference.state.clone(),
                    operator: reference.operator.clone(),
                    deleted: true,
                }),
            }
        }
        Ok(resolved)
    }

    /// Lenient output resolution for reads, same `deleted` flagging contract.
    pub async fn resolve_outputs_for_read(
        &self,
        scope: &RequestScope,
        owner_id: &str,
        outputs: &[OutputRef],
    ) -> Result<Vec<ResolvedOutput>, StorageError> {
        let mut resolved = Vec::with_capacity(outputs.len());
        for reference in outputs {
            match reference {
                OutputRef::Device { id, state, delay } => {
                    match self.device_for_read(scope, owner_id, id).await? {
                        Some(device) => resolved
                            .push(self.hydrate_output_device(&device, state, *delay).await?),
                        None => resolved.push(ResolvedOutput::Device {
                            id: id.clone(),
                            name: String::new(),
                            area_id: None,
                            area_name: None,
                            vendor: String::new(),
                            family: String::new(),
                            connection: String::new(),
                            parent_id: None,
                            state: state.clone(),
                            delay: *delay,
                            deleted: true,
                        }),
                    }
                }
                OutputRef::Scene { id, state, delay } => {
                    let scene = self
                        .storage
                        .get_automation(id, &scope.home_id, &scope.app_code)
                        .await?;
                    match scene {
                        Some(scene) => resolved.push(ResolvedOutput::Scene {
                            id: scene.id,
                            name: scene.name,
                            state: state.clone(),
                            delay: *delay,
                            deleted: false,
                        }),
                        None => resolved.push(ResolvedOutput::Scene {
                            id: id.clone(),
                            name: String::new(),
                            state: state.clone(),
                            delay: *delay,
                            deleted: true,
                        }),
                    }
                }
                OutputRef::Notice { payload, delay } => resolved.push(ResolvedOutput::Notice {
                    payload: payload.clone(),
                    delay: *delay,
                }),
            }
        }
        Ok(resolved)
    }
}
