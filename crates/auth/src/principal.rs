use serde::{Deserialize, Serialize};

use crate::Authority;

/// A fully resolved principal for authorization decisions.
///
/// Construction is decoupled from transport: the HTTP layer derives one from
/// verified Basic credentials, tests build them directly. Authorities are a
/// flat set of granted tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    pub authorities: Vec<Authority>,
}

impl Principal {
    pub fn new(username: impl Into<String>, authorities: Vec<Authority>) -> Self {
        Self {
            username: username.into(),
            authorities,
        }
    }

    pub fn has_authority(&self, authority: &Authority) -> bool {
        self.authorities
            .iter()
            .any(|a| a.is_wildcard() || a == authority)
    }
}
