//! Credential storage and verification for HTTP Basic principals.

use std::collections::HashMap;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use thiserror::Error;

use crate::{Authority, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// A stored account: username, password hash (PHC string), granted authorities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub username: String,
    pub password_hash: String,
    pub authorities: Vec<Authority>,
}

impl UserAccount {
    pub fn new(
        username: impl Into<String>,
        password: &str,
        authorities: Vec<Authority>,
    ) -> Result<Self, CredentialError> {
        Ok(Self {
            username: username.into(),
            password_hash: hash_password(password)?,
            authorities,
        })
    }
}

/// Source of accounts for authentication.
///
/// Implementations must be cheap to query per request.
pub trait CredentialStore: Send + Sync {
    fn find(&self, username: &str) -> Option<UserAccount>;
}

/// In-memory account directory, seeded at startup.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    accounts: HashMap<String, UserAccount>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = UserAccount>) -> Self {
        let mut store = Self::new();
        for account in accounts {
            store.insert(account);
        }
        store
    }

    pub fn insert(&mut self, account: UserAccount) {
        self.accounts.insert(account.username.clone(), account);
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn find(&self, username: &str) -> Option<UserAccount> {
        self.accounts.get(username).cloned()
    }
}

/// Hash a password into a PHC string (argon2, default parameters).
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| CredentialError::Hash(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| CredentialError::Hash(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CredentialError::Hash(e.to_string()))?
        .to_string();
    Ok(phc)
}

/// Verify a password against a stored PHC string. Malformed hashes never match.
pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

/// Resolve Basic credentials to a principal.
///
/// Returns `None` on unknown user or wrong password; the two cases are not
/// distinguished to the caller.
pub fn authenticate(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Option<Principal> {
    let account = store.find(username)?;
    if !verify_password(&account.password_hash, password) {
        tracing::debug!(username, "password verification failed");
        return None;
    }
    Some(Principal::new(account.username, account.authorities))
}
