use std::collections::HashSet;

use thiserror::Error;

use crate::{Authority, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing authority '{0}'")]
    Forbidden(String),
}

/// Authorize a principal against a required authority set (AND-combined).
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
///
/// The wildcard authority `"*"` satisfies every requirement. On failure the
/// error names the first missing authority.
pub fn authorize(principal: &Principal, required: &[Authority]) -> Result<(), AuthzError> {
    let granted: HashSet<&str> = principal
        .authorities
        .iter()
        .map(|a| a.as_str())
        .collect();

    if granted.contains("*") {
        return Ok(());
    }

    for authority in required {
        if !granted.contains(authority.as_str()) {
            return Err(AuthzError::Forbidden(authority.as_str().to_string()));
        }
    }

    Ok(())
}
