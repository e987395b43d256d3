use axum::extract::{Json, OriginalUri, Path, Query, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use common::error::StoreError;
use common::zcap::Action;

use crate::authz::ExpectedInvocation;
use crate::http_server::api::{authorizations_scope, store_response};
use crate::ServiceState;

#[derive(Debug, Deserialize)]
pub struct GetParams {
    pub id: Option<String>,
}

/// Fetch one delegated capability by id, or list every delegation the
/// caller holds for this hub.
pub async fn handler(
    State(state): State<ServiceState>,
    Path(hub_id): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(params): Query<GetParams>,
) -> Result<impl IntoResponse, GetError> {
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
                action: Action::Read,
            },
        )
        .await?;

    let hub_prefix = format!("{}/data-hubs/{}/", state.base_url(), hub_id);
    match params.id {
        Some(id) => {
            let capability = state.database().get_zcap_by_id(&id).await?;
            if !capability.invocation_target.starts_with(&hub_prefix) {
                return Err(GetError::Store(StoreError::NotFound(
                    "authorization".to_string(),
                )));
            }
            Ok((http::StatusCode::OK, Json(capability)).into_response())
        }
        None => {
            let capabilities = state.database().find_zcaps(&invocation.invoker).await?;
            let capabilities: Vec<_> = capabilities
                .into_iter()
                .filter(|c| c.invocation_target.starts_with(&hub_prefix))
                .collect();
            Ok((http::StatusCode::OK, Json(capabilities)).into_response())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for GetError {
    fn into_response(self) -> Response {
        match self {
            GetError::Store(err) => store_response(err),
        }
    }
}
