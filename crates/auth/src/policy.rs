//! Authorization policy table for company operations.
//!
//! One explicit table (operation → required-authority-set) evaluated by a
//! single check before dispatch, instead of per-handler literals. Reads that
//! traverse into department data require the department authority on top of
//! the company one; writes operate at the company root and need only the
//! company-level authority.

use crate::Authority;

pub const COMPANY_READ: Authority = Authority::from_static("COMPANY_READ");
pub const DEPARTMENT_READ: Authority = Authority::from_static("DEPARTMENT_READ");
pub const COMPANY_CREATE: Authority = Authority::from_static("COMPANY_CREATE");
pub const COMPANY_UPDATE: Authority = Authority::from_static("COMPANY_UPDATE");
pub const COMPANY_DELETE: Authority = Authority::from_static("COMPANY_DELETE");

/// Company service operations, one per repository call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CompanyAction {
    GetById,
    GetByName,
    GetAll,
    Create,
    Update,
    DeleteById,
    DeleteInstance,
}

static GRAPH_READ: [Authority; 2] = [COMPANY_READ, DEPARTMENT_READ];
static LIST_READ: [Authority; 1] = [COMPANY_READ];
static CREATE: [Authority; 1] = [COMPANY_CREATE];
static UPDATE: [Authority; 1] = [COMPANY_UPDATE];
static DELETE: [Authority; 1] = [COMPANY_DELETE];

/// Required authorities for an action (AND-combined).
pub fn required_authorities(action: CompanyAction) -> &'static [Authority] {
    match action {
        CompanyAction::GetById | CompanyAction::GetByName => &GRAPH_READ,
        CompanyAction::GetAll => &LIST_READ,
        CompanyAction::Create => &CREATE,
        CompanyAction::Update => &UPDATE,
        CompanyAction::DeleteById | CompanyAction::DeleteInstance => &DELETE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_lookups_require_both_read_authorities() {
        for action in [CompanyAction::GetById, CompanyAction::GetByName] {
            let required = required_authorities(action);
            assert!(required.contains(&COMPANY_READ));
            assert!(required.contains(&DEPARTMENT_READ));
        }
    }

    #[test]
    fn listing_requires_company_read_only() {
        assert_eq!(required_authorities(CompanyAction::GetAll), &[COMPANY_READ]);
    }

    #[test]
    fn writes_require_company_level_authority_only() {
        assert_eq!(required_authorities(CompanyAction::Create), &[COMPANY_CREATE]);
        assert_eq!(required_authorities(CompanyAction::Update), &[COMPANY_UPDATE]);
        assert_eq!(required_authorities(CompanyAction::DeleteById), &[COMPANY_DELETE]);
        assert_eq!(
            required_authorities(CompanyAction::DeleteInstance),
            &[COMPANY_DELETE]
        );
    }
}
