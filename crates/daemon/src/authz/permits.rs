//! Account-permission bridge for the session-authenticated hub
//! lifecycle routes. Hub creation cannot be protected by a capability
//! rooted in the hub being created, so these routes consult a
//! named-permission table instead.

use std::collections::HashSet;
use std::sync::Arc;

use common::error::StoreError;

/// Header the fronting session layer uses to convey the authenticated
/// account.
pub const ACCOUNT_HEADER: &str = "x-account";

/// Named permissions over hub configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    CreateHub,
    AccessHub,
    UpdateHub,
}

/// Immutable account table consulted for session-authenticated routes.
/// An empty table admits any authenticated account.
#[derive(Debug, Clone)]
pub struct Permits {
    accounts: Arc<HashSet<String>>,
}

impl Permits {
    pub fn new(accounts: impl IntoIterator<Item = String>) -> Self {
        Self {
            accounts: Arc::new(accounts.into_iter().collect()),
        }
    }

    /// Check that `actor` holds `permission` over every named resource.
    /// Resources are controller identifiers; an account only ever spans
    /// its own.
    pub fn check(
        &self,
        actor: Option<&str>,
        permission: Permission,
        resources: &[&str],
    ) -> Result<String, StoreError> {
        let actor = actor.ok_or(StoreError::PermissionDenied)?;
        if !self.accounts.is_empty() && !self.accounts.contains(actor) {
            tracing::debug!(actor, ?permission, "unknown account");
            return Err(StoreError::PermissionDenied);
        }
        if resources.iter().any(|resource| *resource != actor) {
            tracing::debug!(actor, ?permission, "resource outside account scope");
            return Err(StoreError::PermissionDenied);
        }
        Ok(actor.to_string())
    }
}
