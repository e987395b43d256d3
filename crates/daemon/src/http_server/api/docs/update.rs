use axum::body::Bytes;
use axum::extract::{OriginalUri, Path, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};

use common::error::StoreError;
use common::types::Document;
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

    let doc: Document =
        serde_json::from_slice(&body).map_err(|e| UpdateError::Malformed(e.to_string()))?;
    if doc.id != doc_id {
        return Err(UpdateError::IdMismatch);
    }

    state.database().update(&hub_id, &doc).await?;

    // Chunks written against earlier sequences are now stale; sweep them
    // off the request path.
    let database = state.database().clone();
    let sequence = doc.sequence;
    let (swept_hub, swept_doc) = (hub_id.clone(), doc_id.clone());
    tokio::spawn(async move {
        match database
            .remove_stale_chunks(&swept_hub, &swept_doc, sequence)
            .await
        {
            Ok(0) => {}
            Ok(count) => tracing::debug!(count, doc_id = %swept_doc, "stale chunks collected"),
            Err(err) => tracing::debug!("stale chunk sweep failed: {}", err),
        }
    });

    Ok(http::StatusCode::NO_CONTENT.into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("invalid document body: {0}")]
    Malformed(String),
    #[error("document id does not match the request path")]
    IdMismatch,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for UpdateError {
    fn into_response(self) -> Response {
        match self {
            UpdateError::Malformed(_) | UpdateError::IdMismatch => {
                (http::StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            UpdateError::Store(err) => store_response(err),
        }
    }
}
