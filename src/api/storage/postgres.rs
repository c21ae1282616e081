//! PostgreSQL storage backend implementation.
//!
//! Uses sqlx for database operations and implements the StorageBackend trait.
//! Queries are runtime-checked (`sqlx::query` + `bind`) so the crate builds
//! without a live database.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::traits::{AutomationFilter, StorageBackend, StorageTx};
use super::StorageError;
use crate::models::{
    AreaRecord, Automation, DeviceRecord, HomeRecord, RawDefinition, TriggerWindow, UserRecord,
};

/// PostgreSQL storage backend implementation.
pub struct PostgresStorageBackend {
    pool: PgPool,
}

impl PostgresStorageBackend {
    /// Create a new PostgreSQL storage backend.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn conn_err(e: sqlx::Error) -> StorageError {
    StorageError::ConnectionError(e.to_string())
}

fn decode_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Failed to decode row: {e}"))
}

fn automation_from_row(row: &PgRow) -> Result<Automation, StorageError> {
    let trigger: serde_json::Value = row.try_get("trigger").map_err(decode_err)?;
    let trigger: TriggerWindow = serde_json::from_value(trigger).map_err(decode_err)?;
    let raw: serde_json::Value = row.try_get("raw").map_err(decode_err)?;
    let raw: RawDefinition = serde_json::from_value(raw).map_err(decode_err)?;

    Ok(Automation {
        id: row.try_get("id").map_err(decode_err)?,
        home_id: row.try_get("home_id").map_err(decode_err)?,
        user_id: row.try_get("user_id").map_err(decode_err)?,
        app_code: row.try_get("app_code").map_err(decode_err)?,
        name: row.try_get("name").map_err(decode_err)?,
        logo: row.try_get("logo").map_err(decode_err)?,
        position: row.try_get("position").map_err(decode_err)?,
        automation_type: row.try_get("automation_type").map_err(decode_err)?,
        logic: row.try_get("logic").map_err(decode_err)?,
        active: row.try_get("active").map_err(decode_err)?,
        gmt: row.try_get("gmt").map_err(decode_err)?,
        hc_id: row.try_get("hc_id").map_err(decode_err)?,
        hc_info: row.try_get("hc_info").map_err(decode_err)?,
        trigger,
        input_ids: row.try_get("input_ids").map_err(decode_err)?,
        output_ids: row.try_get("output_ids").map_err(decode_err)?,
        raw,
        created_at: row.try_get("created_at").map_err(decode_err)?,
        created_by: row.try_get("created_by").map_err(decode_err)?,
        updated_at: row.try_get("updated_at").map_err(decode_err)?,
        updated_by: row.try_get("updated_by").map_err(decode_err)?,
    })
}

fn device_from_row(row: &PgRow) -> Result<DeviceRecord, StorageError> {
    Ok(DeviceRecord {
        id: row.try_get("id").map_err(decode_err)?,
        home_id: row.try_get("home_id").map_err(decode_err)?,
        user_id: row.try_get("user_id").map_err(decode_err)?,
        app_code: row.try_get("app_code").map_err(decode_err)?,
        name: row.try_get("name").map_err(decode_err)?,
        parent_id: row.try_get("parent_id").map_err(decode_err)?,
        area_id: row.try_get("area_id").map_err(decode_err)?,
        vendor: row.try_get("vendor").map_err(decode_err)?,
        family: row.try_get("family").map_err(decode_err)?,
        connection: row.try_get("connection").map_err(decode_err)?,
        device_type: row.try_get("device_type").map_err(decode_err)?,
    })
}

const AUTOMATION_COLUMNS: &str = "id, home_id, user_id, app_code, name, logo, position, \
     automation_type, logic, active, gmt, hc_id, hc_info, trigger, input_ids, output_ids, raw, \
     created_at, created_by, updated_at, updated_by";

#[async_trait]
impl StorageBackend for PostgresStorageBackend {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query("SELECT id, app_code FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn_err)?;

        row.map(|row| {
            Ok(UserRecord {
                id: row.try_get("id").map_err(decode_err)?,
                app_code: row.try_get("app_code").map_err(decode_err)?,
            })
        })
        .transpose()
    }

    async fn get_home(
        &self,
        home_id: &str,
        app_code: &str,
    ) -> Result<Option<HomeRecord>, StorageError> {
        let row = sqlx::query(
            "SELECT id, owner_id, app_code, name FROM homes WHERE id = $1 AND app_code = $2",
        )
        .bind(home_id)
        .bind(app_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?;

        row.map(|row| {
            Ok(HomeRecord {
                id: row.try_get("id").map_err(decode_err)?,
                owner_id: row.try_get("owner_id").map_err(decode_err)?,
                app_code: row.try_get("app_code").map_err(decode_err)?,
                name: row.try_get("name").map_err(decode_err)?,
            })
        })
        .transpose()
    }

    async fn get_device(
        &self,
        home_id: &str,
        user_id: &str,
        app_code: &str,
        device_id: &str,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        let row = sqlx::query(
            "SELECT id, home_id, user_id, app_code, name, parent_id, area_id, vendor, family, \
             connection, device_type FROM devices \
             WHERE id = $1 AND home_id = $2 AND user_id = $3 AND app_code = $4",
        )
        .bind(device_id)
        .bind(home_id)
        .bind(user_id)
        .bind(app_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?;

        row.map(|row| device_from_row(&row)).transpose()
    }

    async fn get_area(
        &self,
        home_id: &str,
        area_id: &str,
    ) -> Result<Option<AreaRecord>, StorageError> {
        let row =
            sqlx::query("SELECT id, home_id, name FROM areas WHERE id = $1 AND home_id = $2")
                .bind(area_id)
                .bind(home_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(conn_err)?;

        row.map(|row| {
            Ok(AreaRecord {
                id: row.try_get("id").map_err(decode_err)?,
                home_id: row.try_get("home_id").map_err(decode_err)?,
                name: row.try_get("name").map_err(decode_err)?,
            })
        })
        .transpose()
    }

    async fn get_automation(
        &self,
        id: &str,
        home_id: &str,
        app_code: &str,
    ) -> Result<Option<Automation>, StorageError> {
        let sql = format!(
            "SELECT {AUTOMATION_COLUMNS} FROM automations \
             WHERE id = $1 AND home_id = $2 AND app_code = $3"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(home_id)
            .bind(app_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn_err)?;

        row.map(|row| automation_from_row(&row)).transpose()
    }

    async fn list_automations(
        &self,
        home_id: &str,
        app_code: &str,
        filter: &AutomationFilter,
    ) -> Result<Vec<Automation>, StorageError> {
        let sql = format!(
            "SELECT {AUTOMATION_COLUMNS} FROM automations \
             WHERE home_id = $1 AND app_code = $2 \
               AND ($3::text IS NULL OR id = $3) \
               AND ($4::text IS NULL OR name = $4) \
               AND ($5::text IS NULL OR $5 = ANY(input_ids)) \
               AND ($6::text IS NULL OR $6 = ANY(output_ids)) \
             ORDER BY created_at"
        );
        let rows = sqlx::query(&sql)
            .bind(home_id)
            .bind(app_code)
            .bind(filter.id.as_deref())
            .bind(filter.name.as_deref())
            .bind(filter.input_id.as_deref())
            .bind(filter.output_id.as_deref())
            .fetch_all(&self.pool)
            .await
            .map_err(conn_err)?;

        rows.iter().map(automation_from_row).collect()
    }

    async fn begin(&self) -> Result<Box<dyn StorageTx>, StorageError> {
        let tx = self.pool.begin().await.map_err(conn_err)?;
        Ok(Box::new(PostgresTx { tx }))
    }
}

/// Transaction wrapper over a sqlx postgres transaction.
struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StorageTx for PostgresTx {
    async fn insert_automation(&mut self, automation: &Automation) -> Result<(), StorageError> {
        let trigger = serde_json::to_value(&automation.trigger)
            .map_err(|e| StorageError::Other(format!("Failed to serialize trigger: {e}")))?;
        let raw = serde_json::to_value(&automation.raw)
            .map_err(|e| StorageError::Other(format!("Failed to serialize raw: {e}")))?;

        sqlx::query(
            "INSERT INTO automations (id, home_id, user_id, app_code, name, logo, position, \
             automation_type, logic, active, gmt, hc_id, hc_info, trigger, input_ids, \
             output_ids, raw, created_at, created_by, updated_at, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21)",
        )
        .bind(&automation.id)
        .bind(&automation.home_id)
        .bind(&automation.user_id)
        .bind(&automation.app_code)
        .bind(&automation.name)
        .bind(&automation.logo)
        .bind(automation.position)
        .bind(&automation.automation_type)
        .bind(&automation.logic)
        .bind(automation.active)
        .bind(automation.gmt)
        .bind(automation.hc_id.as_deref())
        .bind(automation.hc_info.as_ref())
        .bind(trigger)
        .bind(&automation.input_ids)
        .bind(&automation.output_ids)
        .bind(raw)
        .bind(automation.created_at)
        .bind(&automation.created_by)
        .bind(automation.updated_at)
        .bind(&automation.updated_by)
        .execute(&mut *self.tx)
        .await
        .map_err(conn_err)?;

        Ok(())
    }

    async fn update_automation(&mut self, automation: &Automation) -> Result<(), StorageError> {
        let trigger = serde_json::to_value(&automation.trigger)
            .map_err(|e| StorageError::Other(format!("Failed to serialize trigger: {e}")))?;
        let raw = serde_json::to_value(&automation.raw)
            .map_err(|e| StorageError::Other(format!("Failed to serialize raw: {e}")))?;

        let result = sqlx::query(
            "UPDATE automations SET name = $2, logo = $3, position = $4, automation_type = $5, \
             logic = $6, active = $7, gmt = $8, hc_id = $9, hc_info = $10, trigger = $11, \
             input_ids = $12, output_ids = $13, raw = $14, updated_at = $15, updated_by = $16 \
             WHERE id = $1",
        )
        .bind(&automation.id)
        .bind(&automation.name)
        .bind(&automation.logo)
        .bind(automation.position)
        .bind(&automation.automation_type)
        .bind(&automation.logic)
        .bind(automation.active)
        .bind(automation.gmt)
        .bind(automation.hc_id.as_deref())
        .bind(automation.hc_info.as_ref())
        .bind(trigger)
        .bind(&automation.input_ids)
        .bind(&automation.output_ids)
        .bind(raw)
        .bind(automation.updated_at)
        .bind(&automation.updated_by)
        .execute(&mut *self.tx)
        .await
        .map_err(conn_err)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound {
                entity_type: "automation".to_string(),
                entity_id: automation.id.clone(),
            });
        }
        Ok(())
    }

    async fn delete_automation(&mut self, id: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM automations WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(conn_err)?;
        Ok(())
    }

    async fn delete_home(&mut self, home_id: &str, app_code: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM automations WHERE home_id = $1 AND app_code = $2")
            .bind(home_id)
            .bind(app_code)
            .execute(&mut *self.tx)
            .await
            .map_err(conn_err)?;

        sqlx::query("DELETE FROM homes WHERE id = $1 AND app_code = $2")
            .bind(home_id)
            .bind(app_code)
            .execute(&mut *self.tx)
            .await
            .map_err(conn_err)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.tx.commit().await.map_err(conn_err)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        self.tx.rollback().await.map_err(conn_err)
    }
}
