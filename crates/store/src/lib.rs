//! Storage for Deskmate: the shared credential file and per-user JSON
//! artifacts (chat history, schedule, persona).
//!
//! Everything is plain JSON on disk, rewritten in full on every save via
//! write-to-temp-then-rename.

pub mod credentials;
pub mod documents;
mod fs;

pub use credentials::{CredentialStore, hash_password, validate_username};
pub use documents::{ArtifactKind, DocumentStore};
