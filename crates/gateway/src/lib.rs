//! HTTP gateway for Deskmate.
//!
//! Exposes the session controller over JSON endpoints and serves the
//! embedded single-page frontend.
//!
//! - `GET  /health`         liveness
//! - `POST /auth/signup`    create an account
//! - `POST /auth/login`     open a session, returns a bearer token
//! - `/v1/*`                session actions (bearer token required)
//!
//! Built on Axum.

pub mod api;
pub mod frontend;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::{self, Next},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use deskmate_assistant::{Assistant, AssistantSettings};
use deskmate_session::{Controller, Login, Notice, Outcome, PageView, Session, SignupForm};
use deskmate_store::{CredentialStore, DocumentStore};

/// Maximum number of live sessions before the oldest is evicted.
const MAX_SESSIONS: usize = 1_000;

/// A live session. The mutex makes one session's actions strictly
/// sequential.
#[derive(Clone)]
pub struct SessionHandle {
    pub token: String,
    pub session: Arc<Mutex<Session>>,
    created: Instant,
}

/// Shared application state for the gateway.
pub struct GatewayState {
    pub controller: Arc<Controller>,
    pub max_upload_bytes: usize,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(controller: Arc<Controller>, max_upload_bytes: usize) -> Self {
        Self {
            controller,
            max_upload_bytes,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a session and return its bearer token.
    async fn insert_session(&self, session: Session) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;

        if sessions.len() >= MAX_SESSIONS {
            if let Some(oldest) = sessions
                .values()
                .min_by_key(|h| h.created)
                .map(|h| h.token.clone())
            {
                sessions.remove(&oldest);
            }
        }

        sessions.insert(
            token.clone(),
            SessionHandle {
                token: token.clone(),
                session: Arc::new(Mutex::new(session)),
                created: Instant::now(),
            },
        );
        token
    }

    async fn session(&self, token: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(token).cloned()
    }

    async fn remove_session(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Build the full router.
///
/// - Bearer token authentication on all /v1 routes
/// - Request body size limit (`gateway.max_upload_bytes`)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let v1 = api::v1_router(state.clone())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .with_state(state.clone())
        .nest("/v1", v1)
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Wire the stores, provider and assistant from configuration.
pub fn build_state(
    config: &deskmate_config::AppConfig,
) -> Result<SharedState, Box<dyn std::error::Error>> {
    let router = deskmate_providers::build_from_config(config);
    let provider = router
        .default()
        .ok_or("No default provider configured")?;

    let data_dir = &config.storage.data_dir;
    std::fs::create_dir_all(data_dir)?;

    let assistant = Assistant::new(provider, AssistantSettings::from_config(config));
    let controller = Controller::new(
        Arc::new(CredentialStore::new(data_dir)),
        DocumentStore::new(data_dir),
        Arc::new(assistant),
    );

    Ok(Arc::new(GatewayState::new(
        Arc::new(controller),
        config.gateway.max_upload_bytes,
    )))
}

/// Start the gateway HTTP server.
pub async fn start(config: deskmate_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = build_state(&config)?;
    let app = build_router(state);

    info!(
        addr = %addr,
        provider = %config.default_provider,
        model = %config.default_model,
        data_dir = %config.storage.data_dir.display(),
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn internal_error(e: impl std::fmt::Display) -> ApiError {
    tracing::error!(error = %e, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct SignupRequest {
    username: String,
    password: String,
    password_confirm: String,
}

async fn signup_handler(
    State(state): State<SharedState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Outcome>), ApiError> {
    let form = SignupForm {
        username: req.username.trim().to_string(),
        password: req.password,
        password_confirm: req.password_confirm,
    };
    let outcome = state.controller.signup(&form).map_err(internal_error)?;
    let status = if outcome.is_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome)))
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    notices: Vec<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<PageView>,
}

async fn login_handler(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let username = req.username.trim();
    match state
        .controller
        .login(username, &req.password)
        .map_err(internal_error)?
    {
        Login::Accepted { session, notices } => {
            let page = state.controller.page(&session);
            let token = state.insert_session(session).await;
            info!(username, "Session opened");
            Ok((
                StatusCode::OK,
                Json(LoginResponse {
                    token: Some(token),
                    notices,
                    page: Some(page),
                }),
            ))
        }
        Login::Rejected(notice) => Ok((
            StatusCode::UNAUTHORIZED,
            Json(LoginResponse {
                token: None,
                notices: vec![notice],
                page: None,
            }),
        )),
    }
}

/// Authentication middleware for the /v1 API.
///
/// Requires `Authorization: Bearer <token>` naming a live session, which is
/// handed to the handler as a request extension.
async fn auth_middleware(
    State(state): State<SharedState>,
    mut req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let handle = match token {
        Some(token) => state.session(token).await,
        None => None,
    };

    match handle {
        Some(handle) => {
            req.extensions_mut().insert(handle);
            Ok(next.run(req).await)
        }
        None => {
            warn!("Unauthorized request to /v1 API: missing or unknown bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
