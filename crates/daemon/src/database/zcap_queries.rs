use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use common::digest::key_digest;
use common::error::StoreError;
use common::types::epoch_ms;
use common::zcap::Capability;

use super::{classify_write, internal, Database};

impl Database {
    /// Store a delegated capability verbatim, keyed for lookup by its id,
    /// its invocation target, and the holder who stored it.
    pub async fn insert_zcap(
        &self,
        controller: &str,
        capability: &Capability,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_string(capability)
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO delegated_zcap (id, controller, invocation_target, capability, created)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&capability.id)
        .bind(key_digest(controller))
        .bind(&capability.invocation_target)
        .bind(body)
        .bind(epoch_ms())
        .execute(&**self)
        .await
        .map_err(|e| classify_write(e, "authorization"))?;

        Ok(())
    }

    /// Fetch a delegated capability by `(id, invocationTarget)`.
    pub async fn get_zcap(
        &self,
        id: &str,
        invocation_target: &str,
    ) -> Result<Capability, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT capability FROM delegated_zcap
            WHERE id = ? AND invocation_target = ?
            "#,
        )
        .bind(id)
        .bind(invocation_target)
        .fetch_optional(&**self)
        .await
        .map_err(internal)?
        .ok_or_else(|| StoreError::NotFound("authorization".to_string()))?;

        parse_zcap_row(row)
    }

    /// Fetch a delegated capability by id alone.
    pub async fn get_zcap_by_id(&self, id: &str) -> Result<Capability, StoreError> {
        let row = sqlx::query("SELECT capability FROM delegated_zcap WHERE id = ?")
            .bind(id)
            .fetch_optional(&**self)
            .await
            .map_err(internal)?
            .ok_or_else(|| StoreError::NotFound("authorization".to_string()))?;

        parse_zcap_row(row)
    }

    /// List the delegated capabilities a holder has stored.
    pub async fn find_zcaps(&self, controller: &str) -> Result<Vec<Capability>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT capability FROM delegated_zcap
            WHERE controller = ? ORDER BY created
            "#,
        )
        .bind(key_digest(controller))
        .fetch_all(&**self)
        .await
        .map_err(internal)?;

        rows.into_iter().map(parse_zcap_row).collect()
    }

    /// Delete a delegated capability by id. Returns whether a record was
    /// removed.
    pub async fn remove_zcap(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM delegated_zcap WHERE id = ?")
            .bind(id)
            .execute(&**self)
            .await
            .map_err(internal)?;

        Ok(result.rows_affected() > 0)
    }
}

fn parse_zcap_row(row: SqliteRow) -> Result<Capability, StoreError> {
    let body: String = row.get("capability");
    serde_json::from_str(&body).map_err(|e| StoreError::Internal(e.to_string()))
}
