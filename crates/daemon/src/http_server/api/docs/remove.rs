use axum::extract::{OriginalUri, Path, State};
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
) -> Result<impl IntoResponse, RemoveError> {
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
                action: Action::Write,
            },
        )
        .await?;

    if state.database().remove(&hub_id, &doc_id).await? {
        Ok(http::StatusCode::NO_CONTENT.into_response())
    } else {
        Err(RemoveError::Store(StoreError::NotFound(
            "document".to_string(),
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
