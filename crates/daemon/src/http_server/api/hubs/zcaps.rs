use axum::extract::{Json, Path, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};

use common::error::StoreError;
use common::zcap::{self, Capability};

use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::store_response;
use crate::ServiceState;

/// Materialize the root capability for `<hub>/zcaps/<path>`. Nothing is
/// read from storage but the hub configuration; unknown paths are 404s.
pub async fn handler(
    State(state): State<ServiceState>,
    Path((hub_id, path)): Path<(String, String)>,
) -> Result<impl IntoResponse, ZcapsError> {
    let record = state.database().get_config(&hub_id).await?;

    let url = format!("{}/data-hubs/{}/zcaps/{}", state.base_url(), hub_id, path);
    let capability = zcap::root_capability(state.base_url(), &url, &record.config)
        .ok_or(ZcapsError::UnknownTarget)?;

    Ok((http::StatusCode::OK, Json(capability)).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ZcapsError {
    #[error("no root capability exists for this path")]
    UnknownTarget,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ZcapsError {
    fn into_response(self) -> Response {
        match self {
            ZcapsError::UnknownTarget => {
                (http::StatusCode::NOT_FOUND, self.to_string()).into_response()
            }
            ZcapsError::Store(err) => store_response(err),
        }
    }
}

// Client implementation - builds request for this operation
#[derive(Debug, Clone)]
pub struct GetRootCapabilityRequest {
    pub hub_id: String,
    pub path: String,
}

impl ApiRequest for GetRootCapabilityRequest {
    type Response = Capability;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url
            .join(&format!("/data-hubs/{}/zcaps/{}", self.hub_id, self.path))
            .unwrap();
        client.get(full_url)
    }
}
