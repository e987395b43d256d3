use axum::body::Bytes;
use axum::extract::{Json, OriginalUri, Path, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};

use common::error::StoreError;
use common::types::Document;
use common::zcap::Action;

use crate::authz::ExpectedInvocation;
use crate::http_server::api::{documents_scope, store_response};
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    Path(hub_id): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, InsertError> {
    let (target, root_capability) = documents_scope(&state, &hub_id);
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
        serde_json::from_slice(&body).map_err(|e| InsertError::Malformed(e.to_string()))?;

    let record = state.database().insert(&hub_id, &doc).await?;
    tracing::debug!(hub_id, doc_id = %record.doc.id, "document inserted");

    let location = format!(
        "{}/data-hubs/{}/documents/{}",
        state.base_url(),
        hub_id,
        record.doc.id
    );
    Ok((
        http::StatusCode::CREATED,
        [(http::header::LOCATION, location)],
        Json(record.doc),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum InsertError {
    #[error("invalid document body: {0}")]
    Malformed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for InsertError {
    fn into_response(self) -> Response {
        match self {
            InsertError::Malformed(msg) => (
                http::StatusCode::BAD_REQUEST,
                format!("invalid document body: {}", msg),
            )
                .into_response(),
            InsertError::Store(err) => store_response(err),
        }
    }
}
