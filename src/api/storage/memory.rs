//! In-memory storage backend.
//!
//! Backs the integration tests and database-free deployments. Transactions
//! buffer their writes and apply them atomically on commit, so rollback
//! semantics match the PostgreSQL backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::{AutomationFilter, StorageBackend, StorageTx};
use super::StorageError;
use crate::models::{AreaRecord, Automation, DeviceRecord, HomeRecord, UserRecord};

#[derive(Default)]
struct MemoryData {
    users: HashMap<String, UserRecord>,
    homes: HashMap<String, HomeRecord>,
    areas: HashMap<String, AreaRecord>,
    devices: HashMap<String, DeviceRecord>,
    // Vec keeps insertion order, which is the natural list order for reads.
    automations: Vec<Automation>,
}

/// In-memory storage backend implementation.
#[derive(Clone, Default)]
pub struct MemoryStorageBackend {
    data: Arc<RwLock<MemoryData>>,
}

impl MemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user record (test/bootstrap helper).
    pub async fn put_user(&self, user: UserRecord) {
        self.data.write().await.users.insert(user.id.clone(), user);
    }

    /// Seed a home record (test/bootstrap helper).
    pub async fn put_home(&self, home: HomeRecord) {
        self.data.write().await.homes.insert(home.id.clone(), home);
    }

    /// Seed an area record (test/bootstrap helper).
    pub async fn put_area(&self, area: AreaRecord) {
        self.data.write().await.areas.insert(area.id.clone(), area);
    }

    /// Seed a device record (test/bootstrap helper).
    pub async fn put_device(&self, device: DeviceRecord) {
        self.data
            .write()
            .await
            .devices
            .insert(device.id.clone(), device);
    }

    /// Remove a device record (test helper for stale-reference reads).
    pub async fn remove_device(&self, device_id: &str) {
        self.data.write().await.devices.remove(device_id);
    }
}

fn matches_filter(automation: &Automation, filter: &AutomationFilter) -> bool {
    if let Some(id) = &filter.id {
        if &automation.id != id {
            return false;
        }
    }
    if let Some(name) = &filter.name {
        if &automation.name != name {
            return false;
        }
    }
    if let Some(input_id) = &filter.input_id {
        if !automation.input_ids.contains(input_id) {
            return false;
        }
    }
    if let Some(output_id) = &filter.output_id {
        if !automation.output_ids.contains(output_id) {
            return false;
        }
    }
    true
}

#[async_trait]
impl StorageBackend for MemoryStorageBackend {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.data.read().await.users.get(user_id).cloned())
    }

    async fn get_home(
        &self,
        home_id: &str,
        app_code: &str,
    ) -> Result<Option<HomeRecord>, StorageError> {
        Ok(self
            .data
            .read()
            .await
            .homes
            .get(home_id)
            .filter(|h| h.app_code == app_code)
            .cloned())
    }

    async fn get_device(
        &self,
        home_id: &str,
        user_id: &str,
        app_code: &str,
        device_id: &str,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        Ok(self
            .data
            .read()
            .await
            .devices
            .get(device_id)
            .filter(|d| d.home_id == home_id && d.user_id == user_id && d.app_code == app_code)
            .cloned())
    }

    async fn get_area(
        &self,
        home_id: &str,
        area_id: &str,
    ) -> Result<Option<AreaRecord>, StorageError> {
        Ok(self
            .data
            .read()
            .await
            .areas
            .get(area_id)
            .filter(|a| a.home_id == home_id)
            .cloned())
    }

    async fn get_automation(
        &self,
        id: &str,
        home_id: &str,
        app_code: &str,
    ) -> Result<Option<Automation>, StorageError> {
        Ok(self
            .data
            .read()
            .await
            .automations
            .iter()
            .find(|a| a.id == id && a.home_id == home_id && a.app_code == app_code)
            .cloned())
    }

    async fn list_automations(
        &self,
        home_id: &str,
        app_code: &str,
        filter: &AutomationFilter,
    ) -> Result<Vec<Automation>, StorageError> {
        Ok(self
            .data
            .read()
            .await
            .automations
            .iter()
            .filter(|a| a.home_id == home_id && a.app_code == app_code)
            .filter(|a| matches_filter(a, filter))
            .cloned()
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn StorageTx>, StorageError> {
        Ok(Box::new(MemoryTx {
            data: self.data.clone(),
            ops: Vec::new(),
        }))
    }
}

enum MemoryOp {
    Insert(Automation),
    Update(Automation),
    Delete(String),
    DeleteHome { home_id: String, app_code: String },
}

/// Buffered transaction: writes become visible only on commit.
struct MemoryTx {
    data: Arc<RwLock<MemoryData>>,
    ops: Vec<MemoryOp>,
}

#[async_trait]
impl StorageTx for MemoryTx {
    async fn insert_automation(&mut self, automation: &Automation) -> Result<(), StorageError> {
        self.ops.push(MemoryOp::Insert(automation.clone()));
        Ok(())
    }

    async fn update_automation(&mut self, automation: &Automation) -> Result<(), StorageError> {
        self.ops.push(MemoryOp::Update(automation.clone()));
        Ok(())
    }

    async fn delete_automation(&mut self, id: &str) -> Result<(), StorageError> {
        self.ops.push(MemoryOp::Delete(id.to_string()));
        Ok(())
    }

    async fn delete_home(&mut self, home_id: &str, app_code: &str) -> Result<(), StorageError> {
        self.ops.push(MemoryOp::DeleteHome {
            home_id: home_id.to_string(),
            app_code: app_code.to_string(),
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        for op in self.ops {
            match op {
                MemoryOp::Insert(automation) => data.automations.push(automation),
                MemoryOp::Update(automation) => {
                    if let Some(existing) =
                        data.automations.iter_mut().find(|a| a.id == automation.id)
                    {
                        *existing = automation;
                    } else {
                        return Err(StorageError::NotFound {
                            entity_type: "automation".to_string(),
                            entity_id: automation.id,
                        });
                    }
                }
                MemoryOp::Delete(id) => data.automations.retain(|a| a.id != id),
                MemoryOp::DeleteHome { home_id, app_code } => {
                    data.automations
                        .retain(|a| !(a.home_id == home_id && a.app_code == app_code));
                    let remove = data
                        .homes
                        .get(&home_id)
                        .is_some_and(|h| h.app_code == app_code);
                    if remove {
                        data.homes.remove(&home_id);
                    }
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        // Nothing was applied; dropping the buffered ops is the rollback.
        Ok(())
    }
}
