//! The assistant: every LLM-backed feature of Deskmate.
//!
//! Each operation composes a system instruction from the user's persona
//! (and, for chat, the current document summary), then makes one
//! single-shot call through the configured [`Provider`].
//!
//! [`Provider`]: deskmate_core::Provider

pub mod assistant;
pub mod document;

pub use assistant::{Assistant, AssistantSettings};
pub use document::{extract_pdf_text, extract_pdf_text_blocking, truncate_chars};
