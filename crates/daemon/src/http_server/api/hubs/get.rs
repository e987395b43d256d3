use axum::extract::{Json, Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};

use common::error::StoreError;
use common::types::HubConfig;

use super::account;
use crate::authz::permits::Permission;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::store_response;
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    Path(hub_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GetError> {
    let record = state.database().get_config(&hub_id).await?;
    state.permits().check(
        account(&headers),
        Permission::AccessHub,
        &[&record.config.controller],
    )?;

    Ok((http::StatusCode::OK, Json(record.config)).into_response())
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

// Client implementation - builds request for this operation
#[derive(Debug, Clone)]
pub struct GetHubRequest {
    pub hub_id: String,
}

impl ApiRequest for GetHubRequest {
    type Response = HubConfig;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!("/data-hubs/{}", self.hub_id))
            .unwrap();
        client.get(full_url)
    }
}
