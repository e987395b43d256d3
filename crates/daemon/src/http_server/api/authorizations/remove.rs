use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use common::error::StoreError;
use common::zcap::Action;

use crate::authz::ExpectedInvocation;
use crate::http_server::api::{authorizations_scope, store_response};
use crate::ServiceState;

#[derive(Debug, Deserialize)]
pub struct RemoveParams {
    pub id: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Path(hub_id): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(params): Query<RemoveParams>,
) -> Result<impl IntoResponse, RemoveError> {
    let (target, root_capability) = authorizations_scope(&state, &hub_id);
    let invocation = state
        .verifier()
        .verify(
            &method,
            &uri,
            &headers,
            None,
            &ExpectedInvocation {
                target,
                root_capability,
                action: Action::Write,
            },
        )
        .await?;

    state
        .verifier()
        .ensure_root_delegator(&hub_id, &invocation.invoker)
        .await?;

    // a root delegator only reaches the capabilities of their own hub
    let hub_prefix = format!("{}/data-hubs/{}/", state.base_url(), hub_id);
    let capability = state.database().get_zcap_by_id(&params.id).await?;
    if !capability.invocation_target.starts_with(&hub_prefix) {
        return Err(RemoveError::Store(StoreError::NotFound(
            "authorization".to_string(),
        )));
    }

    if state.database().remove_zcap(&params.id).await? {
        Ok(http::StatusCode::NO_CONTENT.into_response())
    } else {
        Err(RemoveError::Store(StoreError::NotFound(
            "authorization".to_string(),
        )))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RemoveError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for RemoveError {
    fn into_response(self) -> Response {
        match self {
            RemoveError::Store(err) => store_response(err),
        }
    }
}
