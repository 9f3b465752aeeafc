//! The v1 API: one endpoint per session action.
//!
//! Every action endpoint answers with the dispatch outcome (render
//! instruction, notices, optional insight) plus the re-rendered page,
//! unless the session was signed out.
//!
//! - `POST   /v1/logout`
//! - `GET    /v1/page`
//! - `POST   /v1/view`              `{"view": "schedule"}`
//! - `POST   /v1/chat`              `{"question": "..."}`
//! - `DELETE /v1/chat`
//! - `POST   /v1/document`          raw PDF bytes
//! - `POST   /v1/schedule`          `{"date", "time", "event"}`
//! - `PUT    /v1/schedule`          `{"rows": [{"date", "time", "event"}]}`
//! - `POST   /v1/schedule/review`
//! - `POST   /v1/schedule/suggest`
//! - `PUT    /v1/persona`           persona settings

use axum::{
    Extension, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use deskmate_core::PersonaSettings;
use deskmate_core::schedule::ScheduleRecord;
use deskmate_session::{Action, Outcome, PageView, Render, View};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ApiError, SessionHandle, SharedState, internal_error};

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/logout", post(logout_handler))
        .route("/page", get(page_handler))
        .route("/view", post(view_handler))
        .route("/chat", post(chat_handler).delete(clear_chat_handler))
        .route("/document", post(document_handler))
        .route(
            "/schedule",
            post(add_schedule_handler).put(edit_schedule_handler),
        )
        .route("/schedule/review", post(review_handler))
        .route("/schedule/suggest", post(suggest_handler))
        .route("/persona", axum::routing::put(persona_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct ActionResponse {
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageView>,
}

#[derive(Deserialize)]
struct ViewRequest {
    view: View,
}

#[derive(Deserialize)]
struct ChatRequest {
    question: String,
}

#[derive(Deserialize)]
struct AddScheduleRequest {
    date: String,
    #[serde(default)]
    time: String,
    event: String,
}

#[derive(Deserialize)]
struct EditScheduleRequest {
    rows: Vec<ScheduleRecord>,
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// Dispatch `action` on the caller's session. Holds the session lock for
/// the whole action, so a session never runs two actions at once.
async fn run(
    state: &SharedState,
    handle: &SessionHandle,
    action: Action,
) -> Result<Json<ActionResponse>, ApiError> {
    let mut session = handle.session.lock().await;
    let outcome = state
        .controller
        .dispatch(&mut session, action)
        .await
        .map_err(internal_error)?;

    let page = match outcome.render {
        Render::SignedOut => None,
        Render::Refresh | Render::Unchanged => Some(state.controller.page(&session)),
    };
    Ok(Json(ActionResponse { outcome, page }))
}

async fn logout_handler(
    State(state): State<SharedState>,
    Extension(handle): Extension<SessionHandle>,
) -> Result<Json<ActionResponse>, ApiError> {
    // Unlist the token first so no new request can pick the session up.
    state.remove_session(&handle.token).await;
    run(&state, &handle, Action::Logout).await
}

async fn page_handler(
    State(state): State<SharedState>,
    Extension(handle): Extension<SessionHandle>,
) -> Result<Json<PageView>, StatusCode> {
    let session = handle.session.lock().await;
    if session.is_signed_out() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(state.controller.page(&session)))
}

async fn view_handler(
    State(state): State<SharedState>,
    Extension(handle): Extension<SessionHandle>,
    Json(req): Json<ViewRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    run(&state, &handle, Action::SwitchView(req.view)).await
}

async fn chat_handler(
    State(state): State<SharedState>,
    Extension(handle): Extension<SessionHandle>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    info!(question_len = req.question.len(), "v1/chat request");
    run(
        &state,
        &handle,
        Action::Ask {
            question: req.question,
        },
    )
    .await
}

async fn clear_chat_handler(
    State(state): State<SharedState>,
    Extension(handle): Extension<SessionHandle>,
) -> Result<Json<ActionResponse>, ApiError> {
    run(&state, &handle, Action::ClearChat).await
}

async fn document_handler(
    State(state): State<SharedState>,
    Extension(handle): Extension<SessionHandle>,
    body: Bytes,
) -> Result<Json<ActionResponse>, ApiError> {
    info!(bytes = body.len(), "v1/document upload");
    run(
        &state,
        &handle,
        Action::UploadDocument {
            bytes: body.to_vec(),
        },
    )
    .await
}

async fn add_schedule_handler(
    State(state): State<SharedState>,
    Extension(handle): Extension<SessionHandle>,
    Json(req): Json<AddScheduleRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    run(
        &state,
        &handle,
        Action::AddSchedule {
            date: req.date,
            time: req.time,
            event: req.event,
        },
    )
    .await
}

async fn edit_schedule_handler(
    State(state): State<SharedState>,
    Extension(handle): Extension<SessionHandle>,
    Json(req): Json<EditScheduleRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    run(&state, &handle, Action::EditSchedule { rows: req.rows }).await
}

async fn review_handler(
    State(state): State<SharedState>,
    Extension(handle): Extension<SessionHandle>,
) -> Result<Json<ActionResponse>, ApiError> {
    run(&state, &handle, Action::ReviewSchedule).await
}

async fn suggest_handler(
    State(state): State<SharedState>,
    Extension(handle): Extension<SessionHandle>,
) -> Result<Json<ActionResponse>, ApiError> {
    run(&state, &handle, Action::SuggestSchedule).await
}

async fn persona_handler(
    State(state): State<SharedState>,
    Extension(handle): Extension<SessionHandle>,
    Json(persona): Json<PersonaSettings>,
) -> Result<Json<ActionResponse>, ApiError> {
    run(&state, &handle, Action::SavePersona(persona)).await
}
