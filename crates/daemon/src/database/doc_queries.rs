use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use common::digest::key_digest;
use common::error::StoreError;
use common::id;
use common::types::{epoch_ms, Document, Meta};

use super::{classify_write, internal, Database};

/// A stored document with its server-side metadata.
#[derive(Debug, Clone)]
pub struct DocRecord {
    pub doc: Document,
    pub meta: Meta,
}

impl Database {
    /// Create a document. A clash on `(hub, doc)` or on any unique
    /// attribute token is a duplicate.
    pub async fn insert(&self, hub_id: &str, doc: &Document) -> Result<DocRecord, StoreError> {
        id::validate(&doc.id)?;
        super::check_sequence(doc.sequence)?;
        let hub = key_digest(hub_id);
        let doc_key = key_digest(&doc.id);
        let body = to_json(doc)?;
        let now = epoch_ms();

        let mut tx = self.begin().await.map_err(internal)?;

        sqlx::query(
            r#"
            INSERT INTO hub_doc (hub_id, doc_id, sequence, doc, created, updated)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&hub)
        .bind(&doc_key)
        .bind(doc.sequence as i64)
        .bind(body)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify_write(e, "document"))?;

        write_projections(&mut tx, &hub, &doc_key, doc).await?;
        tx.commit().await.map_err(internal)?;

        Ok(DocRecord {
            doc: doc.clone(),
            meta: Meta {
                created: now,
                updated: now,
            },
        })
    }

    /// Optimistic upsert. An existing record is replaced iff its stored
    /// sequence is exactly one behind; a missing record is created at
    /// whatever sequence the caller supplies (documents may be copied in
    /// mid-history).
    pub async fn update(&self, hub_id: &str, doc: &Document) -> Result<(), StoreError> {
        id::validate(&doc.id)?;
        super::check_sequence(doc.sequence)?;
        let hub = key_digest(hub_id);
        let doc_key = key_digest(&doc.id);
        let body = to_json(doc)?;
        let now = epoch_ms();

        let mut tx = self.begin().await.map_err(internal)?;

        let mut replaced = 0;
        if doc.sequence > 0 {
            replaced = sqlx::query(
                r#"
                UPDATE hub_doc SET sequence = ?, doc = ?, updated = ?
                WHERE hub_id = ? AND doc_id = ? AND sequence = ?
                "#,
            )
            .bind(doc.sequence as i64)
            .bind(&body)
            .bind(now)
            .bind(&hub)
            .bind(&doc_key)
            .bind((doc.sequence - 1) as i64)
            .execute(&mut *tx)
            .await
            .map_err(internal)?
            .rows_affected();
        }

        if replaced == 0 {
            let exists = sqlx::query("SELECT 1 FROM hub_doc WHERE hub_id = ? AND doc_id = ?")
                .bind(&hub)
                .bind(&doc_key)
                .fetch_optional(&mut *tx)
                .await
                .map_err(internal)?
                .is_some();
            if exists {
                return Err(StoreError::InvalidState(
                    "document sequence mismatch".to_string(),
                ));
            }

            sqlx::query(
                r#"
                INSERT INTO hub_doc (hub_id, doc_id, sequence, doc, created, updated)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&hub)
            .bind(&doc_key)
            .bind(doc.sequence as i64)
            .bind(&body)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| classify_write(e, "document"))?;
        }

        write_projections(&mut tx, &hub, &doc_key, doc).await?;
        tx.commit().await.map_err(internal)?;
        Ok(())
    }

    /// Fetch a document by id within a hub.
    pub async fn get(&self, hub_id: &str, id: &str) -> Result<DocRecord, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT doc, created, updated FROM hub_doc
            WHERE hub_id = ? AND doc_id = ?
            "#,
        )
        .bind(key_digest(hub_id))
        .bind(key_digest(id))
        .fetch_optional(&**self)
        .await
        .map_err(internal)?
        .ok_or_else(|| StoreError::NotFound("document".to_string()))?;

        parse_doc_row(row)
    }

    /// Delete a document and its index projections. Returns whether a
    /// record was removed. Chunks are left to the stale sweep.
    pub async fn remove(&self, hub_id: &str, id: &str) -> Result<bool, StoreError> {
        let hub = key_digest(hub_id);
        let doc_key = key_digest(id);

        let mut tx = self.begin().await.map_err(internal)?;
        clear_projections(&mut tx, &hub, &doc_key).await?;
        let result = sqlx::query("DELETE FROM hub_doc WHERE hub_id = ? AND doc_id = ?")
            .bind(&hub)
            .bind(&doc_key)
            .execute(&mut *tx)
            .await
            .map_err(internal)?;
        tx.commit().await.map_err(internal)?;

        Ok(result.rows_affected() > 0)
    }
}

/// Rebuild the attribute projections for a document: the non-unique
/// lookup rows behind queries, and one token row per unique attribute.
async fn write_projections(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    hub: &str,
    doc_key: &str,
    doc: &Document,
) -> Result<(), StoreError> {
    clear_projections(tx, hub, doc_key).await?;

    for (entry_ord, entry) in doc.indexed.iter().flatten().enumerate() {
        let hmac = key_digest(&entry.hmac.id);
        for attribute in &entry.attributes {
            sqlx::query(
                r#"
                INSERT INTO hub_doc_attr (hub_id, doc_id, entry_ord, hmac_id, name, value)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(hub)
            .bind(doc_key)
            .bind(entry_ord as i64)
            .bind(&hmac)
            .bind(&attribute.name)
            .bind(&attribute.value)
            .execute(&mut **tx)
            .await
            .map_err(internal)?;

            if attribute.unique {
                let token = format!("{}:{}:{}", hmac, attribute.name, attribute.value);
                sqlx::query(
                    r#"
                    INSERT INTO hub_doc_unique_attr (hub_id, doc_id, token)
                    VALUES (?, ?, ?)
                    "#,
                )
                .bind(hub)
                .bind(doc_key)
                .bind(token)
                .execute(&mut **tx)
                .await
                .map_err(|e| classify_write(e, "unique document attribute"))?;
            }
        }
    }
    Ok(())
}

async fn clear_projections(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    hub: &str,
    doc_key: &str,
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM hub_doc_attr WHERE hub_id = ? AND doc_id = ?")
        .bind(hub)
        .bind(doc_key)
        .execute(&mut **tx)
        .await
        .map_err(internal)?;
    sqlx::query("DELETE FROM hub_doc_unique_attr WHERE hub_id = ? AND doc_id = ?")
        .bind(hub)
        .bind(doc_key)
        .execute(&mut **tx)
        .await
        .map_err(internal)?;
    Ok(())
}

fn to_json(doc: &Document) -> Result<String, StoreError> {
    serde_json::to_string(doc).map_err(|e| StoreError::Internal(e.to_string()))
}

pub(crate) fn parse_doc_row(row: SqliteRow) -> Result<DocRecord, StoreError> {
    let body: String = row.get("doc");
    let doc = serde_json::from_str(&body).map_err(|e| StoreError::Internal(e.to_string()))?;
    Ok(DocRecord {
        doc,
        meta: Meta {
            created: row.get("created"),
            updated: row.get("updated"),
        },
    })
}
