//! `orgchart-infra` — storage implementations behind the repository contract.

pub mod repository;

pub use repository::{
    CompanyRepository, Fetch, InMemoryCompanyRepository, PostgresCompanyRepository,
    RepositoryError,
};
