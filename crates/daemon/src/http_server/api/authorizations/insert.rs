use axum::body::Bytes;
use axum::extract::{OriginalUri, Path, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};

use common::error::StoreError;
use common::zcap::{Action, Capability};

use crate::authz::ExpectedInvocation;
use crate::http_server::api::{authorizations_scope, store_response};
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    Path(hub_id): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, InsertError> {
    let (target, root_capability) = authorizations_scope(&state, &hub_id);
    let invocation = state
        .verifier()
        .verify(
            &method,
            &uri,
            &headers,
            Some(&body),
            &ExpectedInvocation {
                target,
                root_capability,
                action: Action::Write,
            },
        )
        .await?;

    let capability: Capability =
        serde_json::from_slice(&body).map_err(|e| InsertError::Malformed(e.to_string()))?;

    state.verifier().check_delegation(&hub_id, &capability)?;
    state
        .verifier()
        .ensure_root_delegator(&hub_id, &invocation.invoker)
        .await?;

    // key the record by the capability's holder, not the delegator
    // storing it, so the delegate can find what was delegated to them
    let holder = capability.holder().ok_or(InsertError::MissingHolder)?;
    state.database().insert_zcap(holder, &capability).await?;
    tracing::debug!(hub_id, zcap_id = %capability.id, "delegated capability stored");

    Ok(http::StatusCode::NO_CONTENT.into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum InsertError {
    #[error("invalid capability body: {0}")]
    Malformed(String),
    #[error("capability names neither an invoker nor a controller")]
    MissingHolder,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for InsertError {
    fn into_response(self) -> Response {
        match self {
            InsertError::Malformed(msg) => (
                http::StatusCode::BAD_REQUEST,
                format!("invalid capability body: {}", msg),
            )
                .into_response(),
            InsertError::MissingHolder => {
                (http::StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            InsertError::Store(err) => store_response(err),
        }
    }
}
