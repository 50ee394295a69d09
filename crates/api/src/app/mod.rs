use std::sync::Arc;

use axum::{Json, Router, extract::Extension, http::StatusCode, response::IntoResponse, routing::get};
use tower::ServiceBuilder;

use orgchart_auth::CredentialStore;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the application router.
///
/// Everything except `/health` and the `/console` admin path sits behind the
/// Basic-auth middleware.
pub async fn build_app(credentials: Arc<dyn CredentialStore>) -> Router {
    let auth_state = crate::middleware::AuthState { credentials };

    let services = Arc::new(services::build_services().await);
    let storage = services.storage;

    let protected = Router::new()
        .route("/whoami", get(whoami))
        .nest("/companies", routes::companies::router())
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            crate::middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/console", get(move || console(storage)))
        .merge(protected)
        .layer(axum::middleware::from_fn(
            crate::middleware::request_id_middleware,
        ))
        .layer(ServiceBuilder::new())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Administrative console endpoint. Deliberately open: it carries no entity
/// data, only deployment facts.
async fn console(storage: &'static str) -> impl IntoResponse {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
    }))
}

async fn whoami(
    Extension(principal): Extension<crate::context::PrincipalContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "username": principal.username(),
        "authorities": principal
            .authorities()
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>(),
    }))
}
