use axum::extract::{Json, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};

use common::error::StoreError;
use common::id;
use common::types::HubConfig;

use super::account;
use crate::authz::permits::Permission;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::store_response;
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(mut config): Json<HubConfig>,
) -> Result<impl IntoResponse, CreateError> {
    state.permits().check(
        account(&headers),
        Permission::CreateHub,
        &[&config.controller],
    )?;

    if config.id.is_some() {
        return Err(CreateError::IdProvided);
    }
    config.id = Some(id::generate());

    let record = state.database().insert_config(&config).await?;
    let hub_id = record.config.id.as_deref().unwrap_or_default();
    tracing::info!(hub_id, "hub created");

    let location = format!("{}/data-hubs/{}", state.base_url(), hub_id);
    Ok((
        http::StatusCode::CREATED,
        [(http::header::LOCATION, location)],
        Json(record.config),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("hub configurations are assigned their id by the server")]
    IdProvided,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for CreateError {
    fn into_response(self) -> Response {
        match self {
            CreateError::IdProvided => {
                (http::StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            CreateError::Store(err) => store_response(err),
        }
    }
}

// Client implementation - builds request for this operation
#[derive(Debug, Clone)]
pub struct CreateHubRequest {
    pub config: HubConfig,
}

impl ApiRequest for CreateHubRequest {
    type Response = HubConfig;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/data-hubs").unwrap();
        client.post(full_url).json(&self.config)
    }
}
