use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use orgchart_companies::{Company, NewCompany};
use orgchart_core::CompanyId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route(
            "/:id",
            get(get_company).put(update_company).delete(delete_company),
        )
        .route("/by-name/:name", get(get_company_by_name))
}

async fn list_companies(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.companies.get_all(principal.principal()).await {
        Ok(companies) => {
            let items = companies.iter().map(dto::company_summary).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

async fn create_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewCompany>,
) -> axum::response::Response {
    match services.companies.create(principal.principal(), body).await {
        Ok(company) => (StatusCode::CREATED, Json(company)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

async fn get_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CompanyId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid company id");
        }
    };

    match services.companies.get(principal.principal(), id).await {
        Ok(Some(company)) => (StatusCode::OK, Json(company)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "company not found"),
        Err(e) => errors::service_error_to_response(e),
    }
}

async fn get_company_by_name(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(name): Path<String>,
) -> axum::response::Response {
    match services
        .companies
        .get_by_name(principal.principal(), &name)
        .await
    {
        Ok(Some(company)) => (StatusCode::OK, Json(company)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "company not found"),
        Err(e) => errors::service_error_to_response(e),
    }
}

async fn update_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCompanyRequest>,
) -> axum::response::Response {
    let id: CompanyId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid company id");
        }
    };

    // A detached copy for the merge; the store keeps its own timestamps.
    let detached = Company {
        id,
        name: body.name,
        departments: body.departments,
        cars: body.cars,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    match services.companies.update(principal.principal(), detached).await {
        Ok(merged) => (StatusCode::OK, Json(merged)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

async fn delete_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CompanyId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid company id");
        }
    };

    match services
        .companies
        .delete_by_id(principal.principal(), id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
