//! Session state and the action → render cycle.
//!
//! A [`Controller`] owns the stores and the assistant. Logging in yields a
//! [`Session`] holding one user's chat, schedule and persona. Every user
//! interaction is an [`Action`] dispatched against that session; the
//! handler mutates the session, persists the matching artifact, and returns
//! an [`Outcome`] telling the caller how to re-render.

pub mod action;
pub mod controller;
pub mod page;
pub mod session;

pub use action::{Action, Insight, InsightKind, Notice, NoticeLevel, Outcome, Render};
pub use controller::{Controller, Login, SignupForm};
pub use page::{PageView, ScheduleRow};
pub use session::{Session, View};
