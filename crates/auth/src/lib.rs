//! `orgchart-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models
//! authority tokens, the per-operation policy table, the pure authorization
//! check, and credential verification for HTTP Basic principals.

pub mod authority;
pub mod authorize;
pub mod credentials;
pub mod policy;
pub mod principal;

pub use authority::Authority;
pub use authorize::{AuthzError, authorize};
pub use credentials::{
    CredentialError, CredentialStore, InMemoryCredentialStore, UserAccount, authenticate,
    hash_password, verify_password,
};
pub use policy::{
    COMPANY_CREATE, COMPANY_DELETE, COMPANY_READ, COMPANY_UPDATE, CompanyAction, DEPARTMENT_READ,
    required_authorities,
};
pub use principal::Principal;
