use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use http::Method;
use tower_http::cors::{Any, CorsLayer};

pub mod authorizations;
pub mod chunks;
pub mod client;
pub mod docs;
pub mod hubs;

use common::error::StoreError;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    // Capability-protected routes are invoked cross-origin by design;
    // authorization never rides on cookies.
    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    let protected = Router::new()
        .route("/data-hubs/:hub_id/documents", post(docs::insert::handler))
        .route(
            "/data-hubs/:hub_id/documents/:doc_id",
            post(docs::update::handler)
                .get(docs::get::handler)
                .delete(docs::remove::handler),
        )
        .route(
            "/data-hubs/:hub_id/documents/:doc_id/chunks/:chunk_index",
            post(chunks::update::handler)
                .get(chunks::get::handler)
                .delete(chunks::remove::handler),
        )
        .route("/data-hubs/:hub_id/query", post(docs::query::handler))
        .route(
            "/data-hubs/:hub_id/authorizations",
            post(authorizations::insert::handler)
                .get(authorizations::get::handler)
                .delete(authorizations::remove::handler),
        )
        .layer(cors_layer);

    Router::new()
        .route(
            "/data-hubs",
            post(hubs::create::handler).get(hubs::find::handler),
        )
        .route(
            "/data-hubs/:hub_id",
            post(hubs::update::handler).get(hubs::get::handler),
        )
        .route("/data-hubs/:hub_id/zcaps/*path", get(hubs::zcaps::handler))
        .merge(protected)
        .with_state(state)
}

/// Map a classified store error onto the wire. Internal faults are
/// logged here and never echoed.
pub(crate) fn store_response(err: StoreError) -> Response {
    if matches!(err, StoreError::Internal(_)) {
        tracing::error!("{}", err);
    }
    (err.status(), err.public_message()).into_response()
}

/// Invocation target and root capability URL for a hub's document
/// collection.
pub(crate) fn documents_scope(state: &ServiceState, hub_id: &str) -> (String, String) {
    let base = state.base_url();
    (
        format!("{}/data-hubs/{}/documents", base, hub_id),
        format!("{}/data-hubs/{}/zcaps/documents", base, hub_id),
    )
}

/// Invocation target and root capability URL for a single document.
/// Chunk routes share the parent document's scope.
pub(crate) fn document_scope(state: &ServiceState, hub_id: &str, doc_id: &str) -> (String, String) {
    let base = state.base_url();
    (
        format!("{}/data-hubs/{}/documents/{}", base, hub_id, doc_id),
        format!("{}/data-hubs/{}/zcaps/documents/{}", base, hub_id, doc_id),
    )
}

/// Invocation target and root capability URL for a hub's query endpoint.
pub(crate) fn query_scope(state: &ServiceState, hub_id: &str) -> (String, String) {
    let base = state.base_url();
    (
        format!("{}/data-hubs/{}/query", base, hub_id),
        format!("{}/data-hubs/{}/zcaps/query", base, hub_id),
    )
}

/// Invocation target and root capability URL for a hub's delegated
/// capability collection.
pub(crate) fn authorizations_scope(state: &ServiceState, hub_id: &str) -> (String, String) {
    let base = state.base_url();
    (
        format!("{}/data-hubs/{}/authorizations", base, hub_id),
        format!("{}/data-hubs/{}/zcaps/authorizations", base, hub_id),
    )
}
