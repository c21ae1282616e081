//! Collaborator records: thin lookup shapes for users, homes, areas and
//! devices. These aggregates have their own CRUD surfaces elsewhere; the
//! automation core only needs existence checks and denormalization metadata.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub app_code: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeRecord {
    pub id: String,
    pub owner_id: String,
    pub app_code: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRecord {
    pub id: String,
    pub home_id: String,
    pub name: String,
}

/// A registered smart-device entity.
///
/// `parent_id` is set iff the device is attached to a hub controller; the
/// topology validator keys off its presence.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: String,
    pub home_id: String,
    pub user_id: String,
    pub app_code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,
    pub vendor: String,
    pub family: String,
    pub connection: String,
    pub device_type: String,
}
