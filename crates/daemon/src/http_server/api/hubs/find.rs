use axum::extract::{Json, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::error::StoreError;
use common::types::HubConfig;

use super::account;
use crate::authz::permits::Permission;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::store_response;
use crate::ServiceState;

/// Both parameters are required; hubs are only ever listed for one
/// controller by reference id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindHubsRequest {
    pub controller: String,
    pub reference_id: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Query(params): Query<FindHubsRequest>,
) -> Result<impl IntoResponse, FindError> {
    state.permits().check(
        account(&headers),
        Permission::AccessHub,
        &[&params.controller],
    )?;

    let records = state
        .database()
        .find_config(&params.controller, &params.reference_id)
        .await?;
    let configs: Vec<HubConfig> = records.into_iter().map(|r| r.config).collect();

    Ok((http::StatusCode::OK, Json(configs)).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum FindError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for FindError {
    fn into_response(self) -> Response {
        match self {
            FindError::Store(err) => store_response(err),
        }
    }
}

impl ApiRequest for FindHubsRequest {
    type Response = Vec<HubConfig>;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/data-hubs").unwrap();
        client.get(full_url).query(&[
            ("controller", self.controller),
            ("referenceId", self.reference_id),
        ])
    }
}
