use axum::body::Bytes;
use axum::extract::{Json, OriginalUri, Path, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};

use common::error::StoreError;
use common::types::{Document, Query};
use common::zcap::Action;

use crate::authz::ExpectedInvocation;
use crate::http_server::api::{query_scope, store_response};
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    Path(hub_id): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, QueryError> {
    let (target, root_capability) = query_scope(&state, &hub_id);
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
                action: Action::Read,
            },
        )
        .await?;

    let query: Query =
        serde_json::from_slice(&body).map_err(|e| QueryError::Malformed(e.to_string()))?;

    let records = state.database().find(&hub_id, &query).await?;
    let docs: Vec<Document> = records.into_iter().map(|r| r.doc).collect();

    Ok((http::StatusCode::OK, Json(docs)).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid query body: {0}")]
    Malformed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        match self {
            QueryError::Malformed(msg) => (
                http::StatusCode::BAD_REQUEST,
                format!("invalid query body: {}", msg),
            )
                .into_response(),
            QueryError::Store(err) => store_response(err),
        }
    }
}
