use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use orgchart_companies::{
    Address, Car, Company, Department, Employee, NewCompany, NewDepartment, NewEmployee, Office,
};
use orgchart_core::{AddressId, CarId, CompanyId, DepartmentId, EmployeeId, OfficeId};

use super::{CompanyRepository, Fetch, RepositoryError};

#[derive(Debug, Default)]
struct Inner {
    companies: BTreeMap<CompanyId, Company>,
    by_name: HashMap<String, CompanyId>,
}

/// In-memory company store.
///
/// Intended for tests/dev. Whole aggregates are stored under the root id;
/// a name index enforces the unique-name constraint. A single sequence feeds
/// every identifier, which keeps test fixtures deterministic.
#[derive(Debug, Default)]
pub struct InMemoryCompanyRepository {
    inner: RwLock<Inner>,
    sequence: AtomicI64,
}

impl InMemoryCompanyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored companies. Test hook for "the store was not touched".
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.companies.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_id(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, RepositoryError> {
        self.inner
            .read()
            .map_err(|_| RepositoryError::storage("lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, RepositoryError> {
        self.inner
            .write()
            .map_err(|_| RepositoryError::storage("lock poisoned"))
    }

    fn materialize(&self, draft: NewCompany) -> Company {
        let now = Utc::now();
        Company {
            id: CompanyId::new(self.next_id()),
            name: draft.name,
            departments: draft
                .departments
                .into_iter()
                .map(|d| self.materialize_department(d))
                .collect(),
            cars: draft
                .cars
                .into_iter()
                .map(|c| Car {
                    id: CarId::new(self.next_id()),
                    plate: c.plate,
                    model: c.model,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    fn materialize_department(&self, draft: NewDepartment) -> Department {
        Department {
            id: DepartmentId::new(self.next_id()),
            name: draft.name,
            employees: draft
                .employees
                .into_iter()
                .map(|e| self.materialize_employee(e))
                .collect(),
            offices: draft
                .offices
                .into_iter()
                .map(|o| Office {
                    id: OfficeId::new(self.next_id()),
                    location: o.location,
                })
                .collect(),
        }
    }

    fn materialize_employee(&self, draft: NewEmployee) -> Employee {
        Employee {
            id: EmployeeId::new(self.next_id()),
            name: draft.name,
            title: draft.title,
            address: draft.address.map(|a| Address {
                id: AddressId::new(self.next_id()),
                street: a.street,
                city: a.city,
                country: a.country,
            }),
        }
    }

    fn apply_fetch(company: &Company, fetch: Fetch) -> Company {
        match fetch {
            Fetch::Graph => company.clone(),
            Fetch::Shallow => company.shallow(),
        }
    }
}

#[async_trait]
impl CompanyRepository for InMemoryCompanyRepository {
    async fn find(&self, id: CompanyId, fetch: Fetch) -> Result<Option<Company>, RepositoryError> {
        let inner = self.read()?;
        Ok(inner.companies.get(&id).map(|c| Self::apply_fetch(c, fetch)))
    }

    async fn find_by_name(
        &self,
        name: &str,
        fetch: Fetch,
    ) -> Result<Option<Company>, RepositoryError> {
        let inner = self.read()?;
        let id = match inner.by_name.get(name) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(inner.companies.get(&id).map(|c| Self::apply_fetch(c, fetch)))
    }

    async fn find_all(&self) -> Result<Vec<Company>, RepositoryError> {
        let inner = self.read()?;
        Ok(inner.companies.values().map(Company::shallow).collect())
    }

    async fn create(&self, draft: NewCompany) -> Result<Company, RepositoryError> {
        let company = self.materialize(draft);
        let mut inner = self.write()?;

        if inner.by_name.contains_key(&company.name) {
            return Err(RepositoryError::conflict(format!(
                "company name '{}' already exists",
                company.name
            )));
        }

        inner.by_name.insert(company.name.clone(), company.id);
        inner.companies.insert(company.id, company.clone());
        Ok(company)
    }

    async fn update(&self, company: Company) -> Result<Company, RepositoryError> {
        let mut inner = self.write()?;

        if let Some(&holder) = inner.by_name.get(&company.name) {
            if holder != company.id {
                return Err(RepositoryError::conflict(format!(
                    "company name '{}' already exists",
                    company.name
                )));
            }
        }

        let now = Utc::now();
        let previous_name = inner.companies.get(&company.id).map(|c| c.name.clone());

        let merged = match inner.companies.get(&company.id).cloned() {
            Some(mut stored) => {
                stored.merge_from(&company);
                stored.updated_at = now;
                stored
            }
            // Merge of an identity the store has never seen persists it.
            None => {
                let mut stored = company;
                stored.updated_at = now;
                stored
            }
        };

        if let Some(previous) = previous_name {
            if previous != merged.name {
                inner.by_name.remove(&previous);
            }
        }
        inner.by_name.insert(merged.name.clone(), merged.id);
        inner.companies.insert(merged.id, merged.clone());
        Ok(merged)
    }

    async fn delete_by_id(&self, id: CompanyId) -> Result<(), RepositoryError> {
        let mut inner = self.write()?;
        if let Some(removed) = inner.companies.remove(&id) {
            inner.by_name.remove(&removed.name);
        }
        Ok(())
    }

    async fn delete(&self, company: Company) -> Result<(), RepositoryError> {
        // Reconcile by identity: whatever the detached copy looks like, the
        // stored instance under the same id is what gets removed.
        self.delete_by_id(company.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgchart_companies::{NewAddress, NewCar, NewOffice};

    fn acme_draft() -> NewCompany {
        NewCompany {
            name: "Acme".to_string(),
            departments: vec![NewDepartment {
                name: "Engineering".to_string(),
                employees: vec![NewEmployee {
                    name: "Alice Smith".to_string(),
                    title: Some("Engineer".to_string()),
                    address: Some(NewAddress {
                        street: "1 Main St".to_string(),
                        city: "Springfield".to_string(),
                        country: "US".to_string(),
                    }),
                }],
                offices: vec![NewOffice {
                    location: "HQ".to_string(),
                }],
            }],
            cars: vec![NewCar {
                plate: "ACME-1".to_string(),
                model: "Van".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn absent_id_finds_none_and_delete_is_noop() {
        let repo = InMemoryCompanyRepository::new();
        let ghost = CompanyId::new(12345);

        assert!(repo.find(ghost, Fetch::Graph).await.unwrap().is_none());
        repo.delete_by_id(ghost).await.unwrap();
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn create_then_find_returns_equal_entity() {
        let repo = InMemoryCompanyRepository::new();
        let created = repo.create(acme_draft()).await.unwrap();

        let found = repo.find(created.id, Fetch::Graph).await.unwrap().unwrap();
        assert_eq!(found, created);

        // Identifiers were assigned all the way down.
        assert_eq!(found.departments.len(), 1);
        assert_eq!(found.departments[0].employees.len(), 1);
        assert!(found.departments[0].employees[0].address.is_some());
    }

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let repo = InMemoryCompanyRepository::new();
        repo.create(acme_draft()).await.unwrap();

        let err = repo.create(acme_draft()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_merges_detached_copy() {
        let repo = InMemoryCompanyRepository::new();
        let created = repo.create(acme_draft()).await.unwrap();

        let mut detached = created.clone();
        detached.name = "Acme Industries".to_string();
        detached.cars.clear();

        let merged = repo.update(detached).await.unwrap();
        assert_eq!(merged.id, created.id);
        assert_eq!(merged.name, "Acme Industries");
        assert_eq!(merged.created_at, created.created_at);

        let found = repo.find(created.id, Fetch::Graph).await.unwrap().unwrap();
        assert_eq!(found.name, "Acme Industries");
        assert!(found.cars.is_empty());

        // The old name is free again, the new one is taken.
        assert!(repo.find_by_name("Acme", Fetch::Shallow).await.unwrap().is_none());
        assert!(
            repo.find_by_name("Acme Industries", Fetch::Shallow)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn update_rejects_name_held_by_other_company() {
        let repo = InMemoryCompanyRepository::new();
        let acme = repo.create(acme_draft()).await.unwrap();
        let other = repo
            .create(NewCompany {
                name: "Globex".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut detached = other.clone();
        detached.name = acme.name.clone();

        let err = repo.update(detached).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_accepts_detached_instance() {
        let repo = InMemoryCompanyRepository::new();
        let created = repo.create(acme_draft()).await.unwrap();

        let mut detached = created.clone();
        detached.name = "stale copy".to_string();

        repo.delete(detached).await.unwrap();
        assert!(repo.find(created.id, Fetch::Graph).await.unwrap().is_none());
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn shallow_fetch_and_listing_strip_collections() {
        let repo = InMemoryCompanyRepository::new();
        let created = repo.create(acme_draft()).await.unwrap();

        let shallow = repo.find(created.id, Fetch::Shallow).await.unwrap().unwrap();
        assert!(shallow.departments.is_empty());
        assert!(shallow.cars.is_empty());

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].departments.is_empty());
    }

    #[tokio::test]
    async fn create_get_by_name_delete_scenario() {
        let repo = InMemoryCompanyRepository::new();
        let created = repo.create(acme_draft()).await.unwrap();

        let by_name = repo
            .find_by_name("Acme", Fetch::Graph)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name, created);

        repo.delete_by_id(created.id).await.unwrap();
        assert!(repo.find(created.id, Fetch::Graph).await.unwrap().is_none());
    }
}
