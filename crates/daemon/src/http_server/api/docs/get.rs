use axum::extract::{Json, OriginalUri, Path, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};

use common::error::StoreError;
use common::zcap::Action;

use crate::authz::ExpectedInvocation;
use crate::http_server::api::{document_scope, store_response};
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    Path((hub_id, doc_id)): Path<(String, String)>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GetError> {
    let (target, root_capability) = document_scope(&state, &hub_id, &doc_id);
    state
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

    let record = state.database().get(&hub_id, &doc_id).await?;
    Ok((http::StatusCode::OK, Json(record.doc)).into_response())
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
