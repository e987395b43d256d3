use sqlx::Row;

use common::digest::key_digest;
use common::error::StoreError;
use common::types::{epoch_ms, Chunk, Meta};

use super::{internal, Database};

/// A stored chunk with its server-side metadata.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub chunk: Chunk,
    pub meta: Meta,
}

impl Database {
    /// Upsert a chunk under its parent document. The chunk must carry the
    /// parent's current sequence; the parent gate is the only coherence
    /// check, chunk writes for the current sequence race last-write-wins.
    pub async fn update_chunk(
        &self,
        hub_id: &str,
        doc_id: &str,
        chunk: &Chunk,
    ) -> Result<(), StoreError> {
        let parent = self.get(hub_id, doc_id).await?;
        if chunk.sequence != parent.doc.sequence {
            return Err(StoreError::InvalidState(
                "chunk sequence does not match document sequence".to_string(),
            ));
        }

        let body = serde_json::to_string(chunk).map_err(|e| StoreError::Internal(e.to_string()))?;
        let now = epoch_ms();

        sqlx::query(
            r#"
            INSERT INTO hub_doc_chunk (hub_id, doc_id, chunk_index, sequence, chunk, created, updated)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (hub_id, doc_id, chunk_index) DO UPDATE SET
                sequence = excluded.sequence,
                chunk = excluded.chunk,
                updated = excluded.updated
            "#,
        )
        .bind(key_digest(hub_id))
        .bind(key_digest(doc_id))
        .bind(chunk.index as i64)
        .bind(chunk.sequence as i64)
        .bind(body)
        .bind(now)
        .bind(now)
        .execute(&**self)
        .await
        .map_err(internal)?;

        Ok(())
    }

    /// Fetch a chunk by index.
    pub async fn get_chunk(
        &self,
        hub_id: &str,
        doc_id: &str,
        chunk_index: u64,
    ) -> Result<ChunkRecord, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT chunk, created, updated FROM hub_doc_chunk
            WHERE hub_id = ? AND doc_id = ? AND chunk_index = ?
            "#,
        )
        .bind(key_digest(hub_id))
        .bind(key_digest(doc_id))
        .bind(chunk_index as i64)
        .fetch_optional(&**self)
        .await
        .map_err(internal)?
        .ok_or_else(|| StoreError::NotFound("chunk".to_string()))?;

        let body: String = row.get("chunk");
        let chunk = serde_json::from_str(&body).map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(ChunkRecord {
            chunk,
            meta: Meta {
                created: row.get("created"),
                updated: row.get("updated"),
            },
        })
    }

    /// Delete a chunk. Returns whether a record was removed; the parent
    /// document is not consulted.
    pub async fn remove_chunk(
        &self,
        hub_id: &str,
        doc_id: &str,
        chunk_index: u64,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM hub_doc_chunk
            WHERE hub_id = ? AND doc_id = ? AND chunk_index = ?
            "#,
        )
        .bind(key_digest(hub_id))
        .bind(key_digest(doc_id))
        .bind(chunk_index as i64)
        .execute(&**self)
        .await
        .map_err(internal)?;

        Ok(result.rows_affected() > 0)
    }

    /// Sweep chunks whose sequence trails the parent document's current
    /// sequence. Returns the number of chunks collected.
    pub async fn remove_stale_chunks(
        &self,
        hub_id: &str,
        doc_id: &str,
        sequence: u64,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM hub_doc_chunk
            WHERE hub_id = ? AND doc_id = ? AND sequence < ?
            "#,
        )
        .bind(key_digest(hub_id))
        .bind(key_digest(doc_id))
        .bind(sequence as i64)
        .execute(&**self)
        .await
        .map_err(internal)?;

        Ok(result.rows_affected())
    }
}
