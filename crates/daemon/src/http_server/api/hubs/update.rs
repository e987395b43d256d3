use axum::extract::{Json, Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};

use common::error::StoreError;
use common::types::HubConfig;

use super::account;
use crate::authz::permits::Permission;
use crate::http_server::api::store_response;
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    Path(hub_id): Path<String>,
    headers: HeaderMap,
    Json(config): Json<HubConfig>,
) -> Result<impl IntoResponse, UpdateError> {
    if config.id.as_deref() != Some(hub_id.as_str()) {
        return Err(UpdateError::IdMismatch);
    }
    state.permits().check(
        account(&headers),
        Permission::UpdateHub,
        &[&config.controller],
    )?;

    state.database().update_config(&config).await?;
    Ok(http::StatusCode::NO_CONTENT.into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("configuration id does not match the request path")]
    IdMismatch,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for UpdateError {
    fn into_response(self) -> Response {
        match self {
            UpdateError::IdMismatch => {
                (http::StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            UpdateError::Store(err) => store_response(err),
        }
    }
}

// Client implementation - builds request for this operation. The update
// endpoint answers 204, so callers send it through
// `ApiClient::http_client` rather than the typed `call` path.
#[derive(Debug, Clone)]
pub struct UpdateHubRequest {
    pub config: HubConfig,
}

impl UpdateHubRequest {
    pub fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let hub_id = self.config.id.clone().unwrap_or_default();
        let full_url = base_url.join(&format!("/data-hubs/{}", hub_id)).unwrap();
        client.post(full_url).json(&self.config)
    }
}
