use std::sync::Arc;

use thiserror::Error;

use orgchart_auth::{AuthzError, CompanyAction, Principal, authorize, required_authorities};
use orgchart_companies::{Company, NewCompany};
use orgchart_core::{CompanyId, DomainError};
use orgchart_infra::{
    CompanyRepository, Fetch, InMemoryCompanyRepository, PostgresCompanyRepository,
    RepositoryError,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Denied(#[from] AuthzError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Authorization-gated company service.
///
/// Exactly one method per repository operation. Each method checks the policy
/// table against the caller's authorities first; the repository is only
/// reached after the check passes. Queries run against the store read path,
/// mutations inside the store's write transaction.
pub struct CompanyService {
    repo: Arc<dyn CompanyRepository>,
}

impl CompanyService {
    pub fn new(repo: Arc<dyn CompanyRepository>) -> Self {
        Self { repo }
    }

    fn check(&self, principal: &Principal, action: CompanyAction) -> Result<(), AuthzError> {
        authorize(principal, required_authorities(action))
    }

    pub async fn get(
        &self,
        principal: &Principal,
        id: CompanyId,
    ) -> Result<Option<Company>, ServiceError> {
        self.check(principal, CompanyAction::GetById)?;
        Ok(self.repo.find(id, Fetch::Graph).await?)
    }

    pub async fn get_by_name(
        &self,
        principal: &Principal,
        name: &str,
    ) -> Result<Option<Company>, ServiceError> {
        self.check(principal, CompanyAction::GetByName)?;
        Ok(self.repo.find_by_name(name, Fetch::Graph).await?)
    }

    pub async fn get_all(&self, principal: &Principal) -> Result<Vec<Company>, ServiceError> {
        self.check(principal, CompanyAction::GetAll)?;
        Ok(self.repo.find_all().await?)
    }

    pub async fn create(
        &self,
        principal: &Principal,
        draft: NewCompany,
    ) -> Result<Company, ServiceError> {
        self.check(principal, CompanyAction::Create)?;
        draft.validate()?;
        Ok(self.repo.create(draft).await?)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        company: Company,
    ) -> Result<Company, ServiceError> {
        self.check(principal, CompanyAction::Update)?;
        company.validate()?;
        Ok(self.repo.update(company).await?)
    }

    pub async fn delete_by_id(
        &self,
        principal: &Principal,
        id: CompanyId,
    ) -> Result<(), ServiceError> {
        self.check(principal, CompanyAction::DeleteById)?;
        Ok(self.repo.delete_by_id(id).await?)
    }

    pub async fn delete(
        &self,
        principal: &Principal,
        company: Company,
    ) -> Result<(), ServiceError> {
        self.check(principal, CompanyAction::DeleteInstance)?;
        Ok(self.repo.delete(company).await?)
    }
}

/// Application services, wired from the environment.
pub struct AppServices {
    pub companies: CompanyService,
    pub storage: &'static str,
}

pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    let (repo, storage): (Arc<dyn CompanyRepository>, &'static str) = if use_persistent {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
        let pool = sqlx::PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to Postgres");
        (Arc::new(PostgresCompanyRepository::new(pool)), "postgres")
    } else {
        (Arc::new(InMemoryCompanyRepository::new()), "in-memory")
    };

    AppServices {
        companies: CompanyService::new(repo),
        storage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgchart_auth::{
        Authority, COMPANY_CREATE, COMPANY_DELETE, COMPANY_READ, COMPANY_UPDATE, DEPARTMENT_READ,
    };

    fn service() -> (CompanyService, Arc<InMemoryCompanyRepository>) {
        let repo = Arc::new(InMemoryCompanyRepository::new());
        (CompanyService::new(repo.clone()), repo)
    }

    fn principal(authorities: Vec<Authority>) -> Principal {
        Principal::new("test", authorities)
    }

    fn acme() -> NewCompany {
        NewCompany {
            name: "Acme".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn without_company_read_every_query_is_denied() {
        let (service, repo) = service();
        let p = principal(vec![DEPARTMENT_READ]);

        assert!(matches!(
            service.get(&p, CompanyId::new(1)).await,
            Err(ServiceError::Denied(_))
        ));
        assert!(matches!(
            service.get_by_name(&p, "Acme").await,
            Err(ServiceError::Denied(_))
        ));
        assert!(matches!(
            service.get_all(&p).await,
            Err(ServiceError::Denied(_))
        ));

        // The denied calls never reached the store.
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn company_read_alone_lists_but_cannot_read_the_graph() {
        let (service, _repo) = service();
        let p = principal(vec![COMPANY_READ]);

        assert!(matches!(
            service.get(&p, CompanyId::new(1)).await,
            Err(ServiceError::Denied(_))
        ));
        assert!(matches!(
            service.get_by_name(&p, "Acme").await,
            Err(ServiceError::Denied(_))
        ));
        assert!(service.get_all(&p).await.is_ok());
    }

    #[tokio::test]
    async fn denied_create_leaves_store_untouched() {
        let (service, repo) = service();
        let p = principal(vec![COMPANY_READ, DEPARTMENT_READ]);

        assert!(matches!(
            service.create(&p, acme()).await,
            Err(ServiceError::Denied(_))
        ));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn write_authorities_gate_their_operation_only() {
        let (service, _repo) = service();
        let creator = principal(vec![COMPANY_CREATE]);
        let editor = principal(vec![COMPANY_UPDATE]);
        let remover = principal(vec![COMPANY_DELETE]);
        let reader = principal(vec![COMPANY_READ, DEPARTMENT_READ]);

        let created = service.create(&creator, acme()).await.unwrap();

        // The creator cannot read back what it created.
        assert!(matches!(
            service.get(&creator, created.id).await,
            Err(ServiceError::Denied(_))
        ));

        let mut detached = created.clone();
        detached.name = "Acme Industries".to_string();
        assert!(matches!(
            service.update(&creator, detached.clone()).await,
            Err(ServiceError::Denied(_))
        ));
        let merged = service.update(&editor, detached).await.unwrap();
        assert_eq!(merged.name, "Acme Industries");

        assert!(matches!(
            service.delete_by_id(&editor, merged.id).await,
            Err(ServiceError::Denied(_))
        ));
        service.delete_by_id(&remover, merged.id).await.unwrap();

        assert!(service.get(&reader, merged.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_by_instance_requires_delete_authority() {
        let (service, repo) = service();
        let admin = principal(vec![Authority::from_static("*")]);

        let created = service.create(&admin, acme()).await.unwrap();

        let reader = principal(vec![COMPANY_READ, DEPARTMENT_READ]);
        assert!(matches!(
            service.delete(&reader, created.clone()).await,
            Err(ServiceError::Denied(_))
        ));
        assert_eq!(repo.len(), 1);

        service.delete(&admin, created).await.unwrap();
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn wildcard_passes_every_gate() {
        let (service, _repo) = service();
        let admin = principal(vec![Authority::from_static("*")]);

        let created = service.create(&admin, acme()).await.unwrap();
        assert!(service.get(&admin, created.id).await.unwrap().is_some());
        assert!(
            service
                .get_by_name(&admin, "Acme")
                .await
                .unwrap()
                .is_some()
        );
        assert_eq!(service.get_all(&admin).await.unwrap().len(), 1);
        service.delete_by_id(&admin, created.id).await.unwrap();
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_after_the_gate() {
        let (service, repo) = service();
        let creator = principal(vec![COMPANY_CREATE]);

        let err = service
            .create(
                &creator,
                NewCompany {
                    name: "  ".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
        assert!(repo.is_empty());
    }
}
