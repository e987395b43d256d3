//! Wire types stored and served by the hub.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One value or a list of values; serialized transparently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value).iter(),
            OneOrMany::Many(values) => values.iter(),
        }
    }
}

impl<T: PartialEq> OneOrMany<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.iter().any(|v| v == value)
    }
}

/// Reference to a client-held key: an opaque identifier plus its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRef {
    pub id: String,
    #[serde(rename = "type")]
    pub key_type: String,
}

/// A hub's configuration: who controls it and which client keys blind
/// its contents. The server never holds the referenced key material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub sequence: u64,
    pub controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoker: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegator: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    pub key_agreement_key: KeyRef,
    pub hmac: KeyRef,
}

impl HubConfig {
    /// True when `principal` may invoke the hub's root capabilities.
    /// The controller is the invoker unless the config names others.
    pub fn is_invoker(&self, principal: &str) -> bool {
        match &self.invoker {
            Some(invokers) => invokers.contains(&principal.to_string()),
            None => self.controller == principal,
        }
    }

    /// True when `principal` may delegate the hub's root capabilities.
    pub fn is_delegator(&self, principal: &str) -> bool {
        match &self.delegator {
            Some(delegators) => delegators.contains(&principal.to_string()),
            None => self.controller == principal,
        }
    }
}

/// An attribute token inside a blinded index entry. Both `name` and
/// `value` are HMAC outputs produced by the client; the server never
/// sees the plaintext they were derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
}

/// One blinded index over a document, keyed by the HMAC key that
/// produced its attribute tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedEntry {
    pub hmac: KeyRef,
    pub sequence: u64,
    pub attributes: Vec<Attribute>,
}

/// A stored document: an opaque JWE envelope plus optional blinded
/// indexes, versioned by a monotonically increasing sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub sequence: u64,
    pub jwe: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<Vec<IndexedEntry>>,
}

/// A byte-range chunk of a document's payload. `sequence` must match the
/// parent document's current sequence at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub index: u64,
    pub offset: u64,
    pub sequence: u64,
    pub jwe: serde_json::Value,
}

/// A blinded query over one index: `equals` elements OR-combine, the
/// pairs within an element AND-combine; `has` names must all be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub index: String,
    #[serde(default)]
    pub equals: Vec<std::collections::BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub has: Vec<String>,
}

/// Server-side record metadata, epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub created: i64,
    pub updated: i64,
}

/// Current time as epoch milliseconds.
pub fn epoch_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
