//! Storage trait definitions for the API storage backends.

use crate::models::{AreaRecord, Automation, DeviceRecord, HomeRecord, UserRecord};

/// Optional filters applied when listing automations within a home.
#[derive(Clone, Debug, Default)]
pub struct AutomationFilter {
    pub id: Option<String>,
    pub name: Option<String>,
    pub input_id: Option<String>,
    pub output_id: Option<String>,
}

/// Storage backend trait for database operations.
///
/// Lookups are scoped by the composite ownership keys the callers hold;
/// mutations go through a [`StorageTx`] so the orchestrator can gate commit
/// on the remote rule-engine outcome.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Get a user by id
    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, super::StorageError>;

    /// Get a home by id and app code
    async fn get_home(
        &self,
        home_id: &str,
        app_code: &str,
    ) -> Result<Option<HomeRecord>, super::StorageError>;

    /// Get a device scoped by `(home, user, app)`
    async fn get_device(
        &self,
        home_id: &str,
        user_id: &str,
        app_code: &str,
        device_id: &str,
    ) -> Result<Option<DeviceRecord>, super::StorageError>;

    /// Get an area within a home
    async fn get_area(
        &self,
        home_id: &str,
        area_id: &str,
    ) -> Result<Option<AreaRecord>, super::StorageError>;

    /// Get an automation by id within a home/app scope. Creator checks are
    /// done by the caller against `created_by`.
    async fn get_automation(
        &self,
        id: &str,
        home_id: &str,
        app_code: &str,
    ) -> Result<Option<Automation>, super::StorageError>;

    /// List automations in a home, in the store's natural return order.
    async fn list_automations(
        &self,
        home_id: &str,
        app_code: &str,
        filter: &AutomationFilter,
    ) -> Result<Vec<Automation>, super::StorageError>;

    /// Begin a transaction for mutating operations.
    async fn begin(&self) -> Result<Box<dyn StorageTx>, super::StorageError>;
}

/// A transaction over automation rows. Nothing is visible to readers until
/// `commit`; dropping without commit discards the staged writes.
#[async_trait::async_trait]
pub trait StorageTx: Send {
    async fn insert_automation(&mut self, automation: &Automation)
    -> Result<(), super::StorageError>;

    async fn update_automation(&mut self, automation: &Automation)
    -> Result<(), super::StorageError>;

    async fn delete_automation(&mut self, id: &str) -> Result<(), super::StorageError>;

    /// Delete a home row together with its dependent automation rows.
    async fn delete_home(
        &mut self,
        home_id: &str,
        app_code: &str,
    ) -> Result<(), super::StorageError>;

    async fn commit(self: Box<Self>) -> Result<(), super::StorageError>;

    async fn rollback(self: Box<Self>) -> Result<(), super::StorageError>;
}
