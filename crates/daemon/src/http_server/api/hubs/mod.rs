//! Hub lifecycle endpoints (session-authenticated) and root capability
//! materialization.

pub mod create;
pub mod find;
pub mod get;
pub mod update;
pub mod zcaps;

use axum::http::HeaderMap;

use crate::authz::permits::ACCOUNT_HEADER;

/// The authenticated account the fronting session layer attached, if any.
pub(crate) fn account(headers: &HeaderMap) -> Option<&str> {
    headers.get(ACCOUNT_HEADER).and_then(|v| v.to_str().ok())
}
