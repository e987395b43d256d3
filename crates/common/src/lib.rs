/**
 * One-way digests applied to caller-supplied lookup keys
 *  and to request bodies for the `digest` header.
 */
pub mod digest;
/**
 * Classified error kinds shared by the store, the
 *  authorization engine, and the HTTP facade.
 */
pub mod error;
/**
 * Codec for the 128-bit multibase-base58 identifiers
 *  used for hubs and documents on the wire.
 */
pub mod id;
/**
 * HTTP-signature primitives: header parsing, canonical
 *  signing strings, and did:key resolution.
 */
pub mod sig;
/**
 * Wire types for hub configurations, documents, indexed
 *  entries, chunks, and blinded queries.
 */
pub mod types;
/**
 * Capability (zCap) model and on-demand root capability
 *  materialization.
 */
pub mod zcap;

pub mod prelude {
    pub use crate::digest::{body_digest, key_digest};
    pub use crate::error::StoreError;
    pub use crate::types::{Chunk, Document, HubConfig, IndexedEntry, Meta, OneOrMany, Query};
    pub use crate::zcap::{Action, Capability};
}
