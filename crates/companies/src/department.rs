use serde::{Deserialize, Serialize};

use orgchart_core::{DepartmentId, DomainError, Entity, OfficeId};

use crate::employee::{Employee, NewEmployee};

/// Department of a company.
///
/// # Invariants
/// - A department belongs to exactly one company.
/// - Employees and offices are exclusively owned by their department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub employees: Vec<Employee>,
    pub offices: Vec<Office>,
}

impl Department {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("department name cannot be empty"));
        }
        for employee in &self.employees {
            employee.validate()?;
        }
        Ok(())
    }
}

impl Entity for Department {
    type Id = DepartmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Office location owned by a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Office {
    pub id: OfficeId,
    pub location: String,
}

impl Entity for Office {
    type Id = OfficeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Draft department: everything but the store-assigned identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    #[serde(default)]
    pub employees: Vec<NewEmployee>,
    #[serde(default)]
    pub offices: Vec<NewOffice>,
}

impl NewDepartment {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("department name cannot be empty"));
        }
        for employee in &self.employees {
            employee.validate()?;
        }
        Ok(())
    }
}

/// Draft office.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOffice {
    pub location: String,
}
