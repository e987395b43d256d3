use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use common::digest::key_digest;
use common::error::StoreError;
use common::id;
use common::types::{epoch_ms, HubConfig, Meta};

use super::{classify_write, internal, Database};

/// A stored hub configuration with its server-side metadata.
#[derive(Debug, Clone)]
pub struct ConfigRecord {
    pub config: HubConfig,
    pub meta: Meta,
}

impl Database {
    /// Create a hub configuration. The sequence must start at 0; a clash
    /// on `id` or on `(controller, referenceId)` is a duplicate.
    pub async fn insert_config(&self, config: &HubConfig) -> Result<ConfigRecord, StoreError> {
        let id = required_id(config)?;
        if config.sequence != 0 {
            return Err(StoreError::Data(
                "hub configuration sequence must start at 0".to_string(),
            ));
        }
        let body = to_json(config)?;
        let now = epoch_ms();

        sqlx::query(
            r#"
            INSERT INTO hub_config (id, controller, reference_id, sequence, config, created, updated)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(key_digest(id))
        .bind(key_digest(&config.controller))
        .bind(config.reference_id.as_deref())
        .bind(config.sequence as i64)
        .bind(body)
        .bind(now)
        .bind(now)
        .execute(&**self)
        .await
        .map_err(|e| classify_write(e, "hub configuration"))?;

        Ok(ConfigRecord {
            config: config.clone(),
            meta: Meta {
                created: now,
                updated: now,
            },
        })
    }

    /// Replace a hub configuration iff the stored sequence is exactly one
    /// behind the supplied one.
    pub async fn update_config(&self, config: &HubConfig) -> Result<(), StoreError> {
        let id = required_id(config)?;
        super::check_sequence(config.sequence)?;
        if config.sequence == 0 {
            return Err(sequence_mismatch());
        }
        let body = to_json(config)?;
        let now = epoch_ms();

        let result = sqlx::query(
            r#"
            UPDATE hub_config
            SET controller = ?, reference_id = ?, sequence = ?, config = ?, updated = ?
            WHERE id = ? AND sequence = ?
            "#,
        )
        .bind(key_digest(&config.controller))
        .bind(config.reference_id.as_deref())
        .bind(config.sequence as i64)
        .bind(body)
        .bind(now)
        .bind(key_digest(id))
        .bind((config.sequence - 1) as i64)
        .execute(&**self)
        .await
        .map_err(|e| classify_write(e, "hub configuration"))?;

        if result.rows_affected() == 0 {
            return Err(sequence_mismatch());
        }
        Ok(())
    }

    /// Fetch a hub configuration by its caller-facing id.
    pub async fn get_config(&self, id: &str) -> Result<ConfigRecord, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT config, created, updated FROM hub_config WHERE id = ?
            "#,
        )
        .bind(key_digest(id))
        .fetch_optional(&**self)
        .await
        .map_err(internal)?
        .ok_or_else(|| StoreError::NotFound("hub configuration".to_string()))?;

        parse_config_row(row)
    }

    /// List hub configurations for a controller by reference id. The
    /// controller predicate is always enforced here, never by callers.
    pub async fn find_config(
        &self,
        controller: &str,
        reference_id: &str,
    ) -> Result<Vec<ConfigRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT config, created, updated FROM hub_config
            WHERE controller = ? AND reference_id = ?
            "#,
        )
        .bind(key_digest(controller))
        .bind(reference_id)
        .fetch_all(&**self)
        .await
        .map_err(internal)?;

        rows.into_iter().map(parse_config_row).collect()
    }
}

fn required_id(config: &HubConfig) -> Result<&str, StoreError> {
    let id = config
        .id
        .as_deref()
        .ok_or_else(|| StoreError::Data("hub configuration is missing an id".to_string()))?;
    id::validate(id)?;
    Ok(id)
}

fn sequence_mismatch() -> StoreError {
    StoreError::InvalidState("hub configuration sequence mismatch".to_string())
}

fn to_json(config: &HubConfig) -> Result<String, StoreError> {
    serde_json::to_string(config).map_err(|e| StoreError::Internal(e.to_string()))
}

fn parse_config_row(row: SqliteRow) -> Result<ConfigRecord, StoreError> {
    let body: String = row.get("config");
    let config = serde_json::from_str(&body).map_err(|e| StoreError::Internal(e.to_string()))?;
    Ok(ConfigRecord {
        config,
        meta: Meta {
            created: row.get("created"),
            updated: row.get("updated"),
        },
    })
}
