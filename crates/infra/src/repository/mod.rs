//! Company repository contract.
//!
//! One method per store operation. Lookups return `Ok(None)` for absent
//! entities; deletes are idempotent with respect to missing ids. `update`
//! carries merge semantics: the detached value is reconciled onto the stored
//! instance by identity and the merged, stored copy is returned — the input
//! reference is never guaranteed to be the return value.

use async_trait::async_trait;
use thiserror::Error;

use orgchart_companies::{Company, NewCompany};
use orgchart_core::CompanyId;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryCompanyRepository;
pub use postgres::PostgresCompanyRepository;

/// How much of the aggregate a lookup should load.
///
/// `Graph` loads departments→employees→addresses, departments→offices and
/// company→cars in the same query, deduplicated across the join fan-out.
/// `Shallow` loads the root only (owned collections come back empty).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Fetch {
    Shallow,
    Graph,
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A store constraint was violated (e.g. duplicate unique name).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store itself failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

/// Persistent store for the company aggregate.
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Look up a company by id. Absent ids are `Ok(None)`.
    async fn find(&self, id: CompanyId, fetch: Fetch) -> Result<Option<Company>, RepositoryError>;

    /// Look up a company by its unique name. Absent names are `Ok(None)`.
    async fn find_by_name(
        &self,
        name: &str,
        fetch: Fetch,
    ) -> Result<Option<Company>, RepositoryError>;

    /// All companies, roots only, distinct, ordered by id.
    async fn find_all(&self) -> Result<Vec<Company>, RepositoryError>;

    /// Persist a draft, assigning identifiers; returns the stored entity.
    async fn create(&self, draft: NewCompany) -> Result<Company, RepositoryError>;

    /// Merge a detached company onto the stored instance of the same identity
    /// and return the merged copy. An identity the store has never seen is
    /// persisted as-is.
    async fn update(&self, company: Company) -> Result<Company, RepositoryError>;

    /// Remove by id. A missing id is a no-op, not an error.
    async fn delete_by_id(&self, id: CompanyId) -> Result<(), RepositoryError>;

    /// Remove by instance: reconcile by identity first, so a detached value
    /// object deletes as reliably as a freshly loaded one.
    async fn delete(&self, company: Company) -> Result<(), RepositoryError>;
}
