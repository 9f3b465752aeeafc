//! The shared credential store: `users.json`, a map of username to the hex
//! SHA-256 digest of the password.

use crate::fs;
use deskmate_core::error::{AuthError, StoreError};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

const CREDENTIALS_FILE: &str = "users.json";
const MAX_USERNAME_LEN: usize = 64;

/// Hex-encoded SHA-256 digest of a password.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Usernames become file-name components, so only a conservative character
/// set is accepted.
pub fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::InvalidUsername("must not be empty".into()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AuthError::InvalidUsername(format!(
            "must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    if username.starts_with('.') {
        return Err(AuthError::InvalidUsername("must not start with '.'".into()));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(AuthError::InvalidUsername(
            "only letters, digits, '-', '_' and '.' are allowed".into(),
        ));
    }
    Ok(())
}

/// File-backed username → password digest map.
///
/// The whole file is read and rewritten on each signup. The mutex serializes
/// that read-modify-write within one process.
pub struct CredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CredentialStore {
    /// Open the store inside `data_dir`. Nothing is created until the first
    /// signup.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(CREDENTIALS_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        Ok(fs::read_json(&self.path)?.unwrap_or_default())
    }

    /// Create a new account.
    pub fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        validate_username(username)?;

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut users = self.load()?;
        if users.contains_key(username) {
            debug!(username, "Signup rejected: username taken");
            return Err(AuthError::UserExists);
        }

        users.insert(username.to_string(), hash_password(password));
        fs::write_json(&self.path, &users)?;
        info!(username, "User registered");
        Ok(())
    }

    /// Check a username/password pair.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let users = self.load()?;
        match users.get(username) {
            None => Err(AuthError::UnknownUser),
            Some(digest) if *digest == hash_password(password) => {
                info!(username, "User authenticated");
                Ok(())
            }
            Some(_) => {
                warn!(username, "Login failed: wrong password");
                Err(AuthError::WrongPassword)
            }
        }
    }

    /// Number of registered accounts.
    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.load()?.len())
    }
}
