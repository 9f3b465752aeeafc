//! Error types for the Deskmate domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all Deskmate operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    // --- Authentication errors ---
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    // --- Document extraction errors ---
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether a later attempt of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Corrupted artifact at {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },
}

/// Signup and login failures. The `Display` text is shown to the user as-is.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("This username is already taken.")]
    UserExists,

    #[error("No such user.")]
    UnknownUser,

    #[error("Incorrect password.")]
    WrongPassword,

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Could not parse PDF: {0}")]
    Parse(String),

    #[error("The document contains no extractable text")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn transient_provider_errors() {
        assert!(ProviderError::Timeout("60s".into()).is_transient());
        assert!(ProviderError::RateLimited { retry_after_secs: 5 }.is_transient());
        assert!(!ProviderError::AuthenticationFailed("bad key".into()).is_transient());
        assert!(
            !ProviderError::ApiError {
                status_code: 400,
                message: "bad request".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn auth_error_messages_are_user_facing() {
        assert_eq!(AuthError::UnknownUser.to_string(), "No such user.");
        assert_eq!(AuthError::WrongPassword.to_string(), "Incorrect password.");
    }
}
