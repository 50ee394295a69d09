use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orgchart_core::{CarId, CompanyId, DomainError, Entity};

use crate::department::{Department, NewDepartment};

// ─────────────────────────────────────────────────────────────────────────────
// Company
// ─────────────────────────────────────────────────────────────────────────────

/// Company aggregate root.
///
/// # Invariants
/// - `name` is unique across all companies (enforced by the store).
/// - Departments and cars are exclusively owned; removing the company removes
///   its whole graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub departments: Vec<Department>,
    pub cars: Vec<Car>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("company name cannot be empty"));
        }
        for department in &self.departments {
            department.validate()?;
        }
        Ok(())
    }

    /// Reconcile a detached copy onto this stored instance.
    ///
    /// Copies the caller-editable field values (`name`, `departments`, `cars`)
    /// onto `self`. Identity and `created_at` stay with the stored instance;
    /// `updated_at` is stamped by the store on write.
    pub fn merge_from(&mut self, detached: &Company) {
        self.name = detached.name.clone();
        self.departments = detached.departments.clone();
        self.cars = detached.cars.clone();
    }

    /// Copy of this company without its owned collections.
    ///
    /// Stand-in for a root-only load: listing queries return these so callers
    /// that need the graph have to ask for it.
    pub fn shallow(&self) -> Company {
        Company {
            id: self.id,
            name: self.name.clone(),
            departments: Vec::new(),
            cars: Vec::new(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Company car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub id: CarId,
    pub plate: String,
    pub model: String,
}

impl Entity for Car {
    type Id = CarId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Drafts
// ─────────────────────────────────────────────────────────────────────────────

/// Draft company: a fully-formed aggregate minus the store-assigned
/// identifiers and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub departments: Vec<NewDepartment>,
    #[serde(default)]
    pub cars: Vec<NewCar>,
}

impl NewCompany {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("company name cannot be empty"));
        }
        for department in &self.departments {
            department.validate()?;
        }
        Ok(())
    }
}

/// Draft car.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCar {
    pub plate: String,
    pub model: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::department::Office;
    use crate::employee::{Address, Employee};
    use orgchart_core::{AddressId, DepartmentId, EmployeeId, OfficeId};

    fn sample_company() -> Company {
        Company {
            id: CompanyId::new(1),
            name: "Acme".to_string(),
            departments: vec![Department {
                id: DepartmentId::new(10),
                name: "Engineering".to_string(),
                employees: vec![Employee {
                    id: EmployeeId::new(100),
                    name: "Alice Smith".to_string(),
                    title: Some("Engineer".to_string()),
                    address: Some(Address {
                        id: AddressId::new(1000),
                        street: "1 Main St".to_string(),
                        city: "Springfield".to_string(),
                        country: "US".to_string(),
                    }),
                }],
                offices: vec![Office {
                    id: OfficeId::new(200),
                    location: "HQ".to_string(),
                }],
            }],
            cars: vec![Car {
                id: CarId::new(300),
                plate: "ACME-1".to_string(),
                model: "Van".to_string(),
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_name_rejected() {
        let draft = NewCompany {
            name: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            draft.validate().unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[test]
    fn merge_copies_fields_keeps_identity() {
        let mut stored = sample_company();
        let created_at = stored.created_at;

        let mut detached = stored.clone();
        detached.id = CompanyId::new(999); // identity on the detached copy is ignored
        detached.name = "Acme Industries".to_string();
        detached.cars.clear();

        stored.merge_from(&detached);

        assert_eq!(stored.id, CompanyId::new(1));
        assert_eq!(stored.created_at, created_at);
        assert_eq!(stored.name, "Acme Industries");
        assert!(stored.cars.is_empty());
        assert_eq!(stored.departments, detached.departments);
    }

    #[test]
    fn shallow_strips_collections() {
        let company = sample_company();
        let shallow = company.shallow();

        assert_eq!(shallow.id, company.id);
        assert_eq!(shallow.name, company.name);
        assert!(shallow.departments.is_empty());
        assert!(shallow.cars.is_empty());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: merge always takes the detached field values and
            /// never moves identity or creation time.
            #[test]
            fn merge_is_field_faithful(
                name in "[A-Za-z][A-Za-z0-9 ]{0,63}",
                plate in "[A-Z]{1,4}-[0-9]{1,4}",
            ) {
                let mut stored = sample_company();
                let id = stored.id;
                let created_at = stored.created_at;

                let mut detached = stored.clone();
                detached.name = name.clone();
                detached.cars = vec![Car {
                    id: CarId::new(1),
                    plate: plate.clone(),
                    model: "Wagon".to_string(),
                }];

                stored.merge_from(&detached);

                prop_assert_eq!(stored.id, id);
                prop_assert_eq!(stored.created_at, created_at);
                prop_assert_eq!(stored.name, name);
                prop_assert_eq!(stored.cars.len(), 1);
                prop_assert_eq!(stored.cars[0].plate.clone(), plate);
            }

            /// Property: non-blank generated names always validate.
            #[test]
            fn nonblank_names_validate(name in "[A-Za-z][A-Za-z0-9 ]{0,63}") {
                let draft = NewCompany { name, ..Default::default() };
                prop_assert!(draft.validate().is_ok());
            }
        }
    }
}
