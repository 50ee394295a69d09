use serde::Deserialize;

use orgchart_companies::{Car, Company, Department};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `PUT /companies/{id}`: a detached copy of the aggregate.
///
/// The identity comes from the path; child entities keep whatever ids the
/// caller fetched them with — the merge reconciles by the root identity.
#[derive(Debug, Deserialize)]
pub struct UpdateCompanyRequest {
    pub name: String,
    #[serde(default)]
    pub departments: Vec<Department>,
    #[serde(default)]
    pub cars: Vec<Car>,
}

// -------------------------
// Response shaping
// -------------------------

/// Root-only summary used by listings.
pub fn company_summary(company: &Company) -> serde_json::Value {
    serde_json::json!({
        "id": company.id,
        "name": company.name,
        "created_at": company.created_at,
        "updated_at": company.updated_at,
    })
}
