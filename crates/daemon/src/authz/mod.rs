//! Capability invocation verification.
//!
//! Every capability-protected route hands the raw request pieces to the
//! [`Verifier`] together with what the route expects: the invocation
//! target, the root capability URL, and the action. Failures collapse to
//! the opaque `NotAllowed` kind; the specific reason only reaches the
//! debug log. Capability ids are 128-bit random, so timing that reveals
//! whether one exists is not treated as a leak.

pub mod permits;
mod registry;

use std::sync::Arc;

use http::{HeaderMap, Method, Uri};

use common::digest::body_digest;
use common::error::StoreError;
use common::sig::{self, SigError, SignatureInput};
use common::types::epoch_ms;
use common::zcap::{Action, Capability};

use crate::database::Database;
use crate::state::Settings;

/// What a route expects an invocation to prove.
#[derive(Debug, Clone)]
pub struct ExpectedInvocation {
    pub target: String,
    pub root_capability: String,
    pub action: Action,
}

/// A verified invocation: the principal that proved possession of a
/// matching capability.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub invoker: String,
}

#[derive(Debug, thiserror::Error)]
enum VerifyFailure {
    #[error("missing authorization header")]
    MissingSignature,
    #[error(transparent)]
    Sig(#[from] SigError),
    #[error("host header does not match the configured server host")]
    HostMismatch,
    #[error("digest header does not cover the request body")]
    DigestMismatch,
    #[error("missing capability header")]
    MissingCapability,
    #[error("unknown capability action")]
    UnknownAction,
    #[error("declared action does not match the route")]
    ActionMismatch,
    #[error("capability not found")]
    CapabilityNotFound,
    #[error("capability does not match the invocation target")]
    WrongTarget,
    #[error("capability does not permit the action")]
    ActionNotAllowed,
    #[error("key is not an invoker of the capability")]
    NotInvoker,
    #[error(transparent)]
    Backend(StoreError),
}

/// Verifies HTTP-signature capability invocations against the hub
/// configuration store and the delegated-capability store.
#[derive(Clone)]
pub struct Verifier {
    database: Database,
    settings: Arc<Settings>,
}

impl Verifier {
    pub fn new(database: Database, settings: Arc<Settings>) -> Self {
        Self { database, settings }
    }

    pub(crate) fn database(&self) -> &Database {
        &self.database
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Verify a signed invocation. Returns the invoker on success; every
    /// failure mode surfaces as `StoreError::NotAllowed`.
    pub async fn verify(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Option<&[u8]>,
        expected: &ExpectedInvocation,
    ) -> Result<Invocation, StoreError> {
        match self.verify_inner(method, uri, headers, body, expected).await {
            Ok(invocation) => Ok(invocation),
            Err(VerifyFailure::Backend(err)) => Err(err),
            Err(reason) => {
                tracing::debug!(%reason, target = %expected.target, "invocation rejected");
                Err(StoreError::NotAllowed)
            }
        }
    }

    async fn verify_inner(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Option<&[u8]>,
        expected: &ExpectedInvocation,
    ) -> Result<Invocation, VerifyFailure> {
        let header = headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(VerifyFailure::MissingSignature)?;
        let input = SignatureInput::parse(header)?;
        input.check_coverage(body.is_some())?;
        input.check_window(epoch_ms() / 1000)?;

        let host = headers
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if host != self.settings.host() {
            return Err(VerifyFailure::HostMismatch);
        }

        if let Some(body) = body {
            let digest = headers
                .get("digest")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if digest != body_digest(body) {
                return Err(VerifyFailure::DigestMismatch);
            }
        }

        let key = sig::resolve_key(&input.key_id)?;
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        let message = input.signing_string(method.as_str(), path_and_query, headers)?;
        sig::verify(&key.key, &message, &input.signature)?;

        let capability_id = headers
            .get(sig::CAPABILITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(VerifyFailure::MissingCapability)?;
        let action = headers
            .get(sig::CAPABILITY_ACTION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Action::parse)
            .ok_or(VerifyFailure::UnknownAction)?;
        if action != expected.action {
            return Err(VerifyFailure::ActionMismatch);
        }

        let capability = if capability_id == expected.root_capability {
            self.materialize_root(&expected.root_capability).await?
        } else {
            match self.database.get_zcap(capability_id, &expected.target).await {
                Ok(capability) => capability,
                Err(StoreError::NotFound(_)) => return Err(VerifyFailure::CapabilityNotFound),
                Err(err) => return Err(VerifyFailure::Backend(err)),
            }
        };

        if capability.invocation_target != expected.target {
            return Err(VerifyFailure::WrongTarget);
        }
        if !capability.allows(expected.action) {
            return Err(VerifyFailure::ActionNotAllowed);
        }
        if !capability.is_invoker(&key.id) && !capability.is_invoker(&key.controller) {
            return Err(VerifyFailure::NotInvoker);
        }

        Ok(Invocation {
            invoker: key.controller,
        })
    }

    /// Ensure `principal` is a root delegator of `hub_id`. Used to gate
    /// storing and removing delegated capabilities.
    pub async fn ensure_root_delegator(
        &self,
        hub_id: &str,
        principal: &str,
    ) -> Result<(), StoreError> {
        let record = match self.database.get_config(hub_id).await {
            Ok(record) => record,
            Err(StoreError::Internal(detail)) => return Err(StoreError::Internal(detail)),
            Err(_) => return Err(StoreError::NotAllowed),
        };
        if record.config.is_delegator(principal) {
            Ok(())
        } else {
            tracing::debug!(principal, hub_id, "principal is not a root delegator");
            Err(StoreError::NotAllowed)
        }
    }

    /// Structural checks on a delegated capability before it is stored:
    /// it must target this hub, chain to a parent within this hub, and
    /// carry a delegation proof.
    pub fn check_delegation(
        &self,
        hub_id: &str,
        capability: &Capability,
    ) -> Result<(), StoreError> {
        let hub_prefix = format!("{}/data-hubs/{}/", self.settings.base_url(), hub_id);
        if !capability.invocation_target.starts_with(&hub_prefix) {
            return Err(StoreError::Data(
                "capability invocation target is outside this hub".to_string(),
            ));
        }
        let parent = capability.parent_capability.as_deref().ok_or_else(|| {
            StoreError::Data("capability is missing parentCapability".to_string())
        })?;
        if !parent.starts_with(&hub_prefix) {
            return Err(StoreError::Data(
                "parent capability is outside this hub".to_string(),
            ));
        }
        let proof = capability.proof.as_ref().ok_or_else(|| {
            StoreError::Data("capability is missing its delegation proof".to_string())
        })?;
        if proof.get("proofPurpose").and_then(|v| v.as_str()) != Some("capabilityDelegation") {
            return Err(StoreError::Data(
                "delegation proof must have the capabilityDelegation purpose".to_string(),
            ));
        }
        Ok(())
    }
}
