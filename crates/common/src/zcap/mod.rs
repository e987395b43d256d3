//! Capability (zCap) documents and root capability materialization.
//!
//! Root capabilities are never stored: they reflect the live hub
//! configuration and are rebuilt from `(url, config)` on every request.

use serde::{Deserialize, Serialize};

use crate::id;
use crate::types::{HubConfig, OneOrMany};

/// JSON-LD context for capability documents.
pub const SECURITY_CONTEXT_V2: &str = "https://w3id.org/security/v2";

/// Actions a capability can authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
}

impl Action {
    pub fn parse(value: &str) -> Option<Action> {
        match value {
            "read" => Some(Action::Read),
            "write" => Some(Action::Write),
            _ => None,
        }
    }
}

/// A signed authorization object naming an invocation target, the
/// principals that may invoke it, and the actions they may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    #[serde(rename = "@context")]
    pub context: String,
    pub id: String,
    pub invocation_target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoker: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegator: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_capability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_action: Option<OneOrMany<Action>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<serde_json::Value>,
}

impl Capability {
    /// True when the capability permits `action`. A capability without an
    /// `allowedAction` restriction permits any action.
    pub fn allows(&self, action: Action) -> bool {
        match &self.allowed_action {
            Some(allowed) => allowed.contains(&action),
            None => true,
        }
    }

    /// True when `principal` (a key id or its controller) may invoke this
    /// capability. Falls back to `controller` when no invoker is named.
    pub fn is_invoker(&self, principal: &str) -> bool {
        match &self.invoker {
            Some(invokers) => invokers.contains(&principal.to_string()),
            None => self.controller.as_deref() == Some(principal),
        }
    }

    /// The principal this capability is held by: its first named invoker,
    /// falling back to `controller`. Stored delegations are keyed by the
    /// holder so that delegates can look up what was delegated to them.
    pub fn holder(&self) -> Option<&str> {
        match &self.invoker {
            Some(invokers) => invokers.iter().next().map(String::as_str),
            None => self.controller.as_deref(),
        }
    }
}

/// Materialize the root capability a hub's configuration implies for
/// `url`, or `None` when the URL names no canonical invocation target.
///
/// Recognized shapes under `<base>/data-hubs/<hubId>/zcaps/`:
/// `documents`, `query`, `authorizations`, and `documents/<docId>` with a
/// structurally valid document id.
pub fn root_capability(base_url: &str, url: &str, config: &HubConfig) -> Option<Capability> {
    let hub_id = config.id.as_deref()?;
    let prefix = format!("{}/data-hubs/{}/zcaps/", base_url, hub_id);
    let suffix = url.strip_prefix(&prefix)?;

    match suffix {
        "documents" | "query" | "authorizations" => {}
        _ => {
            let doc_id = suffix.strip_prefix("documents/")?;
            id::validate(doc_id).ok()?;
        }
    }

    let controller = config.controller.clone();
    Some(Capability {
        context: SECURITY_CONTEXT_V2.to_string(),
        id: url.to_string(),
        invocation_target: format!("{}/data-hubs/{}/{}", base_url, hub_id, suffix),
        controller: Some(controller.clone()),
        invoker: Some(
            config
                .invoker
                .clone()
                .unwrap_or(OneOrMany::One(controller.clone())),
        ),
        delegator: Some(
            config
                .delegator
                .clone()
                .unwrap_or(OneOrMany::One(controller)),
        ),
        parent_capability: None,
        allowed_action: None,
        proof: None,
    })
}
