//! Shared fixtures for integration tests: seeded in-memory storage and a
//! scriptable rule-engine mock.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use home_automation_api::models::{AreaRecord, DeviceRecord, HomeRecord, UserRecord};
use home_automation_api::services::{EngineError, EnginePayload, RuleEngineClient};
use home_automation_api::storage::MemoryStorageBackend;

pub const USER: &str = "u1";
pub const OTHER_USER: &str = "u2";
pub const HOME: &str = "h1";
pub const APP: &str = "app";
pub const HUB: &str = "hc1";

/// Rule-engine mock recording calls and failing on demand.
#[derive(Default)]
pub struct MockEngine {
    pub calls: Mutex<Vec<String>>,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_delete: AtomicBool,
    pub update_delay_ms: AtomicU64,
    next_id: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    pub fn update_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with("update:"))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("call log poisoned").push(call);
    }
}

#[async_trait]
impl RuleEngineClient for MockEngine {
    async fn create_rule(&self, _payload: &EnginePayload) -> Result<String, EngineError> {
        self.record("create".to_string());
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(EngineError::Status(500));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("rule-{n}"))
    }

    async fn update_rule(&self, id: &str, _payload: &EnginePayload) -> Result<(), EngineError> {
        self.record(format!("update:{id}"));
        let delay = self.update_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(EngineError::Status(500));
        }
        Ok(())
    }

    async fn delete_rule(&self, id: &str) -> Result<(), EngineError> {
        self.record(format!("delete:{id}"));
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(EngineError::Status(500));
        }
        // Unknown ids resolve successfully: the HTTP client treats an
        // engine-side 404 as a completed delete.
        Ok(())
    }

    async fn delete_device(&self, id: &str) -> Result<(), EngineError> {
        self.record(format!("delete_device:{id}"));
        Ok(())
    }
}

fn device(id: &str, parent_id: Option<&str>, area_id: Option<&str>) -> DeviceRecord {
    DeviceRecord {
        id: id.to_string(),
        home_id: HOME.to_string(),
        user_id: USER.to_string(),
        app_code: APP.to_string(),
        name: format!("Device {id}"),
        parent_id: parent_id.map(str::to_string),
        area_id: area_id.map(str::to_string),
        vendor: "acme".to_string(),
        family: "switch".to_string(),
        connection: "wifi".to_string(),
        device_type: "light".to_string(),
    }
}

/// Seed a user, a home, an area, a hub controller and a few devices:
/// `d1` standalone (in the area), `d2` attached to the hub, `hc1` the hub
/// itself.
pub async fn seed(storage: &MemoryStorageBackend) {
    storage
        .put_user(UserRecord {
            id: USER.to_string(),
            app_code: APP.to_string(),
        })
        .await;
    storage
        .put_user(UserRecord {
            id: OTHER_USER.to_string(),
            app_code: APP.to_string(),
        })
        .await;
    storage
        .put_home(HomeRecord {
            id: HOME.to_string(),
            owner_id: USER.to_string(),
            app_code: APP.to_string(),
            name: "Main home".to_string(),
        })
        .await;
    storage
        .put_area(AreaRecord {
            id: "area1".to_string(),
            home_id: HOME.to_string(),
            name: "Living Room".to_string(),
        })
        .await;
    storage.put_device(device("d1", None, Some("area1"))).await;
    storage.put_device(device("d2", Some(HUB), None)).await;
    storage.put_device(device(HUB, None, None)).await;
}
