//! Actions a user can take and what comes back from them.

use crate::session::View;
use deskmate_core::PersonaSettings;
use deskmate_core::schedule::ScheduleRecord;
use serde::{Deserialize, Serialize};

/// One user interaction in the authenticated state.
#[derive(Debug, Clone)]
pub enum Action {
    SwitchView(View),
    Ask { question: String },
    ClearChat,
    /// Raw PDF bytes to summarize
    UploadDocument { bytes: Vec<u8> },
    AddSchedule { date: String, time: String, event: String },
    /// The full edited table
    EditSchedule { rows: Vec<ScheduleRecord> },
    ReviewSchedule,
    SuggestSchedule,
    SavePersona(PersonaSettings),
    Logout,
}

/// How the caller should re-render after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Render {
    /// State changed; re-render the whole page
    Refresh,
    /// Nothing changed; show the notices in place
    Unchanged,
    /// The session is gone; show the login screen
    SignedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// An inline message shown next to the form that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Review,
    Suggestions,
}

/// Transient assistant output about the schedule. Shown once, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub text: String,
}

/// The result of dispatching an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub render: Render,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight: Option<Insight>,
}

impl Outcome {
    pub fn refresh() -> Self {
        Self {
            render: Render::Refresh,
            notices: Vec::new(),
            insight: None,
        }
    }

    pub fn unchanged() -> Self {
        Self {
            render: Render::Unchanged,
            notices: Vec::new(),
            insight: None,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            render: Render::SignedOut,
            notices: Vec::new(),
            insight: None,
        }
    }

    /// A validation or upstream failure: nothing changed.
    pub fn rejected(text: impl Into<String>) -> Self {
        Self::unchanged().with_notice(Notice::error(text))
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }

    pub fn with_notices(mut self, notices: impl IntoIterator<Item = Notice>) -> Self {
        self.notices.extend(notices);
        self
    }

    pub fn with_insight(mut self, kind: InsightKind, text: impl Into<String>) -> Self {
        self.insight = Some(Insight {
            kind,
            text: text.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.notices.iter().any(|n| n.level == NoticeLevel::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_is_unchanged_with_error() {
        let outcome = Outcome::rejected("Please enter a question.");
        assert_eq!(outcome.render, Render::Unchanged);
        assert!(outcome.is_error());
    }

    #[test]
    fn outcome_wire_shape() {
        let outcome = Outcome::refresh()
            .with_notice(Notice::success("Saved."))
            .with_insight(InsightKind::Review, "Looks busy.");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["render"], "refresh");
        assert_eq!(json["notices"][0]["level"], "success");
        assert_eq!(json["insight"]["kind"], "review");

        let bare = serde_json::to_value(Outcome::unchanged()).unwrap();
        assert!(bare.get("notices").is_none());
        assert!(bare.get("insight").is_none());
    }
}
