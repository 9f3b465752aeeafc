//! Action dispatch.
//!
//! Handlers validate first, persist second, and only then mutate the
//! session, so a failed write never leaves the session ahead of disk.

use crate::action::{Action, InsightKind, Notice, Outcome};
use crate::page::PageView;
use crate::session::{Session, View};
use chrono::Local;
use deskmate_assistant::{Assistant, extract_pdf_text_blocking};
use deskmate_core::error::{AuthError, StoreError};
use deskmate_core::schedule::{self, Reconciliation, ScheduleEntry, ScheduleRecord};
use deskmate_core::{ChatTurn, PersonaSettings};
use deskmate_store::{CredentialStore, DocumentStore};
use std::sync::Arc;
use tracing::{error, info, warn};

/// The signup form as submitted.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
}

/// Result of a login attempt.
#[derive(Debug)]
pub enum Login {
    Accepted {
        session: Session,
        notices: Vec<Notice>,
    },
    Rejected(Notice),
}

/// Owns the stores and the assistant; stateless between calls.
pub struct Controller {
    credentials: Arc<CredentialStore>,
    documents: DocumentStore,
    assistant: Arc<Assistant>,
}

impl Controller {
    pub fn new(
        credentials: Arc<CredentialStore>,
        documents: DocumentStore,
        assistant: Arc<Assistant>,
    ) -> Self {
        Self {
            credentials,
            documents,
            assistant,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    /// Handle the signup form. Never creates a session.
    pub fn signup(&self, form: &SignupForm) -> Result<Outcome, StoreError> {
        if form.password != form.password_confirm {
            return Ok(Outcome::rejected("Passwords do not match."));
        }
        if form.username.is_empty() || form.password.is_empty() {
            return Ok(Outcome::rejected(
                "Please enter both a username and a password.",
            ));
        }

        match self.credentials.register(&form.username, &form.password) {
            Ok(()) => Ok(Outcome::unchanged()
                .with_notice(Notice::success("Sign-up complete. Please log in."))),
            Err(AuthError::Store(e)) => Err(e),
            Err(e) => Ok(Outcome::rejected(e.to_string())),
        }
    }

    /// Handle the login form. On success the user's artifacts are loaded
    /// into a fresh session.
    pub fn login(&self, username: &str, password: &str) -> Result<Login, StoreError> {
        if username.is_empty() || password.is_empty() {
            return Ok(Login::Rejected(Notice::error(
                "Please enter both a username and a password.",
            )));
        }

        match self.credentials.authenticate(username, password) {
            Ok(()) => {}
            Err(AuthError::Store(e)) => return Err(e),
            Err(e) => return Ok(Login::Rejected(Notice::error(e.to_string()))),
        }

        let (session, warnings) = Session::open(&self.documents, username)?;
        let mut notices = vec![Notice::success(format!("Welcome, {username}!"))];
        notices.extend(warnings.into_iter().map(Notice::warning));
        Ok(Login::Accepted { session, notices })
    }

    /// The full render of `session`.
    pub fn page(&self, session: &Session) -> PageView {
        PageView::render(session)
    }

    /// Run one action against a session.
    ///
    /// Storage failures are returned as `Err`. Everything else, including
    /// assistant and PDF failures, comes back as an `Outcome` with notices.
    /// A signed-out session only ever gets `Render::SignedOut` back.
    pub async fn dispatch(
        &self,
        session: &mut Session,
        action: Action,
    ) -> Result<Outcome, StoreError> {
        if session.is_signed_out() {
            warn!(username = %session.username(), "Action on a signed-out session ignored");
            return Ok(Outcome::signed_out());
        }

        match action {
            Action::SwitchView(view) => Ok(self.switch_view(session, view)),
            Action::Ask { question } => self.ask(session, &question).await,
            Action::ClearChat => self.clear_chat(session),
            Action::UploadDocument { bytes } => Ok(self.upload_document(session, bytes).await),
            Action::AddSchedule { date, time, event } => {
                self.add_schedule(session, &date, &time, &event)
            }
            Action::EditSchedule { rows } => self.edit_schedule(session, &rows),
            Action::ReviewSchedule => Ok(self.review_schedule(session).await),
            Action::SuggestSchedule => Ok(self.suggest_schedule(session).await),
            Action::SavePersona(persona) => self.save_persona(session, persona),
            Action::Logout => Ok(self.logout(session)),
        }
    }

    fn switch_view(&self, session: &mut Session, view: View) -> Outcome {
        if session.view == view {
            return Outcome::unchanged();
        }
        session.view = view;
        Outcome::refresh()
    }

    async fn ask(&self, session: &mut Session, question: &str) -> Result<Outcome, StoreError> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(Outcome::rejected("Please enter a question."));
        }

        let answer = match self
            .assistant
            .answer(question, session.persona(), session.doc_summary())
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                error!(username = %session.username(), error = %e, "Chat answer failed");
                return Ok(Outcome::rejected(format!(
                    "The assistant could not answer: {e}"
                )));
            }
        };

        let mut chat = session.chat.clone();
        chat.push(ChatTurn::new(question, answer));
        self.documents.save_chat(session.username(), &chat)?;
        session.chat = chat;

        info!(username = %session.username(), turns = session.chat.len(), "Question answered");
        Ok(Outcome::refresh())
    }

    fn clear_chat(&self, session: &mut Session) -> Result<Outcome, StoreError> {
        self.documents.clear_chat(session.username())?;
        session.chat.clear();
        info!(username = %session.username(), "Chat history cleared");
        Ok(Outcome::refresh().with_notice(Notice::success("Chat history cleared.")))
    }

    async fn upload_document(&self, session: &mut Session, bytes: Vec<u8>) -> Outcome {
        if bytes.is_empty() {
            return Outcome::rejected("The uploaded file is empty.");
        }

        let size = bytes.len();
        let text = match extract_pdf_text_blocking(bytes).await {
            Ok(text) => text,
            Err(e) => {
                error!(username = %session.username(), size, error = %e, "PDF extraction failed");
                return Outcome::rejected(e.to_string());
            }
        };

        match self
            .assistant
            .summarize_document(&text, session.persona())
            .await
        {
            Ok(summary) => {
                info!(username = %session.username(), size, "Document summarized");
                session.doc_summary = Some(summary);
                Outcome::refresh()
            }
            Err(e) => {
                error!(username = %session.username(), error = %e, "Document summary failed");
                Outcome::rejected(format!("The document could not be summarized: {e}"))
            }
        }
    }

    fn add_schedule(
        &self,
        session: &mut Session,
        date: &str,
        time: &str,
        event: &str,
    ) -> Result<Outcome, StoreError> {
        if event.trim().is_empty() {
            return Ok(Outcome::rejected("Please enter the event."));
        }

        let record = ScheduleRecord {
            date: date.to_string(),
            time: Some(time.to_string()),
            event: event.to_string(),
        };
        let mut warnings = Vec::new();
        let entry = match ScheduleEntry::from_record(&record, &mut warnings) {
            Ok(entry) => entry,
            Err(msg) => return Ok(Outcome::rejected(msg)),
        };

        let mut entries = session.schedule.clone();
        entries.push(entry);
        self.documents
            .save_schedule(session.username(), &Session::schedule_records(&entries))?;
        session.schedule = entries;

        info!(username = %session.username(), entries = session.schedule.len(), "Schedule entry added");
        Ok(Outcome::refresh()
            .with_notices(warnings.into_iter().map(Notice::warning))
            .with_notice(Notice::success("Schedule entry added.")))
    }

    fn edit_schedule(
        &self,
        session: &mut Session,
        rows: &[ScheduleRecord],
    ) -> Result<Outcome, StoreError> {
        let ingested = match schedule::ingest_edited(rows) {
            Ok(ingested) => ingested,
            Err(msg) => return Ok(Outcome::rejected(msg)),
        };
        let warnings = ingested.warnings.into_iter().map(Notice::warning);

        match schedule::reconcile(&session.schedule, ingested.entries) {
            Reconciliation::Unchanged => Ok(Outcome::unchanged().with_notices(warnings)),
            Reconciliation::Changed(entries) => {
                self.documents
                    .save_schedule(session.username(), &Session::schedule_records(&entries))?;
                session.schedule = entries;
                info!(username = %session.username(), entries = session.schedule.len(), "Schedule updated");
                Ok(Outcome::refresh()
                    .with_notices(warnings)
                    .with_notice(Notice::success("Schedule updated.")))
            }
        }
    }

    async fn review_schedule(&self, session: &Session) -> Outcome {
        if session.schedule.is_empty() {
            return Outcome::unchanged().with_notice(Notice::info(
                "There are no schedule entries yet. Add some and the assistant can help.",
            ));
        }

        match self
            .assistant
            .review_schedule(&session.schedule, session.persona())
            .await
        {
            Ok(text) => Outcome::unchanged().with_insight(InsightKind::Review, text),
            Err(e) => {
                error!(username = %session.username(), error = %e, "Schedule review failed");
                Outcome::rejected(format!("The assistant could not review the schedule: {e}"))
            }
        }
    }

    async fn suggest_schedule(&self, session: &Session) -> Outcome {
        if session.schedule.is_empty() {
            return Outcome::unchanged().with_notice(Notice::info(
                "There are no schedule entries yet. Add some and the assistant can help.",
            ));
        }

        let today = Local::now().date_naive();
        match self
            .assistant
            .suggest_schedule(&session.schedule, session.persona(), today)
            .await
        {
            Ok(text) => Outcome::unchanged().with_insight(InsightKind::Suggestions, text),
            Err(e) => {
                error!(username = %session.username(), error = %e, "Schedule suggestions failed");
                Outcome::rejected(format!("The assistant could not suggest anything: {e}"))
            }
        }
    }

    fn save_persona(
        &self,
        session: &mut Session,
        persona: PersonaSettings,
    ) -> Result<Outcome, StoreError> {
        if let Err(msg) = persona.validate() {
            warn!(username = %session.username(), reason = %msg, "Persona rejected");
            return Ok(Outcome::rejected(msg));
        }

        self.documents.save_persona(session.username(), &persona)?;
        session.persona = Some(persona);
        info!(username = %session.username(), "Persona saved");
        Ok(Outcome::refresh().with_notice(Notice::success(
            "Assistant settings saved. They apply from the next conversation.",
        )))
    }

    fn logout(&self, session: &mut Session) -> Outcome {
        info!(username = %session.username(), "Logged out");
        session.sign_out();
        Outcome::signed_out()
    }
}
