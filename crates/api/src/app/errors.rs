use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use orgchart_core::DomainError;
use orgchart_infra::RepositoryError;

use crate::app::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Denied(e) => json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
        ServiceError::Domain(e) => match e {
            DomainError::Validation(_) | DomainError::InvalidId(_) => {
                json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
            }
            DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
            DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", e.to_string()),
            DomainError::Unauthorized => {
                json_error(StatusCode::FORBIDDEN, "unauthorized", "unauthorized")
            }
        },
        ServiceError::Repository(e) => match e {
            RepositoryError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            RepositoryError::Storage(msg) => {
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
            }
        },
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
