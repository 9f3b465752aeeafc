//! # Deskmate Core
//!
//! Domain types, traits, and error definitions for the Deskmate personal
//! assistant. This crate has **no I/O and no framework dependencies**. The
//! store, assistant, session and gateway crates implement against it.
//!
//! ## Layout
//!
//! - [`chat`]: question/answer turns
//! - [`schedule`]: schedule entries and the single time/date parsing boundary
//! - [`persona`]: persona settings and system-instruction composition
//! - [`message`] / [`provider`]: the LLM request/response model
//! - [`error`]: one error enum per bounded context

pub mod chat;
pub mod error;
pub mod message;
pub mod persona;
pub mod provider;
pub mod schedule;

// Re-export key types at crate root for ergonomics
pub use chat::ChatTurn;
pub use error::{AuthError, DocumentError, Error, ProviderError, Result, StoreError};
pub use message::{Message, Role};
pub use persona::{PersonaSettings, SystemInstruction};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use schedule::{Reconciliation, ScheduleEntry, ScheduleRecord};
