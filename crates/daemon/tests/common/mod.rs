//! Shared test utilities for store and invocation tests
#![allow(dead_code)]

use ::common::id;
use ::common::types::{Attribute, Chunk, Document, HubConfig, IndexedEntry, KeyRef};
use daemon::database::Database;

/// Set up a fresh in-memory database.
pub async fn setup_database() -> Database {
    Database::in_memory().await.unwrap()
}

/// A minimal hub configuration owned by `controller`, with a fresh id.
pub fn hub_config(controller: &str) -> HubConfig {
    HubConfig {
        id: Some(id::generate()),
        sequence: 0,
        controller: controller.to_string(),
        invoker: None,
        delegator: None,
        reference_id: None,
        key_agreement_key: KeyRef {
            id: "urn:kak:primary".to_string(),
            key_type: "X25519KeyAgreementKey2019".to_string(),
        },
        hmac: KeyRef {
            id: "urn:hmac:primary".to_string(),
            key_type: "Sha256HmacKey2019".to_string(),
        },
    }
}

/// A document at `sequence` with no indexes and a fresh id.
pub fn doc(sequence: u64) -> Document {
    Document {
        id: id::generate(),
        sequence,
        jwe: serde_json::json!({"protected": "eyJhbGciOiJFQ0RILUVTIn0", "ciphertext": "3q2-7w"}),
        indexed: None,
    }
}

/// A document carrying one blinded index entry under `hmac_id`.
pub fn indexed_doc(sequence: u64, hmac_id: &str, attributes: Vec<Attribute>) -> Document {
    Document {
        indexed: Some(vec![IndexedEntry {
            hmac: KeyRef {
                id: hmac_id.to_string(),
                key_type: "Sha256HmacKey2019".to_string(),
            },
            sequence: 0,
            attributes,
        }]),
        ..doc(sequence)
    }
}

/// A document with several blinded index entries under one key.
pub fn multi_entry_doc(sequence: u64, hmac_id: &str, entries: Vec<Vec<Attribute>>) -> Document {
    Document {
        indexed: Some(
            entries
                .into_iter()
                .map(|attributes| IndexedEntry {
                    hmac: KeyRef {
                        id: hmac_id.to_string(),
                        key_type: "Sha256HmacKey2019".to_string(),
                    },
                    sequence: 0,
                    attributes,
                })
                .collect(),
        ),
        ..doc(sequence)
    }
}

pub fn attr(name: &str, value: &str, unique: bool) -> Attribute {
    Attribute {
        name: name.to_string(),
        value: value.to_string(),
        unique,
    }
}

/// A chunk at `sequence` for the given index.
pub fn chunk(index: u64, sequence: u64) -> Chunk {
    Chunk {
        index,
        offset: index * 1024,
        sequence,
        jwe: serde_json::json!({"ciphertext": "AAAA"}),
    }
}
