use axum::body::Bytes;
use axum::extract::{OriginalUri, Path, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};

use common::error::StoreError;
use common::types::Chunk;
use common::zcap::Action;

use crate::authz::ExpectedInvocation;
use crate::http_server::api::{document_scope, store_response};
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    Path((hub_id, doc_id, chunk_index)): Path<(String, String, u64)>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, UpdateError> {
    let (target, root_capability) = document_scope(&state, &hub_id, &doc_id);
    state
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

    let chunk: Chunk =
        serde_json::from_slice(&body).map_err(|e| UpdateError::Malformed(e.to_string()))?;
    if chunk.index != chunk_index {
        return Err(UpdateError::IndexMismatch);
    }

    state.database().update_chunk(&hub_id, &doc_id, &chunk).await?;
    Ok(http::StatusCode::NO_CONTENT.into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("invalid chunk body: {0}")]
    Malformed(String),
    #[error("chunk index does not match the request path")]
    IndexMismatch,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for UpdateError {
    fn into_response(self) -> Response {
        match self {
            UpdateError::Malformed(_) | UpdateError::IndexMismatch => {
                (http::StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            UpdateError::Store(err) => store_response(err),
        }
    }
}
