//! REST and WebSocket server built on axum.

use super::auth::{AuthSessions, bearer_token};
use super::connection::ReaderRegistry;
use super::error::ApiError;
use super::events::{ClientMessage, ServerMessage};
use super::session::ScrollSpySession;
use crate::attention::{
    AttentionWeightGenerator, HeadSummary, summarize_heads, validate_arguments,
};
use crate::config::PrimerConfig;
use crate::content::{
    AnswerOutcome, ContentBundle, ContentStore, MemoryStore, NewUser, ProgressUpdate,
    QuizQuestion, SearchHit, Section, User, UserProgress,
};
use crate::error::ContentError;
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

/// Thread-safe shared gateway reference for axum handlers.
pub type SharedGateway = Arc<Mutex<GatewayServer>>;

/// Server state: configuration, content, auth tokens, and open sockets.
pub struct GatewayServer {
    config: PrimerConfig,
    store: Box<dyn ContentStore>,
    auth: AuthSessions,
    readers: ReaderRegistry,
    started_at: chrono::DateTime<Utc>,
    attention_requests: u64,
}

impl std::fmt::Debug for GatewayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayServer")
            .field("config", &self.config)
            .field("readers", &self.readers.len())
            .field("auth_sessions", &self.auth.active_count())
            .finish()
    }
}

impl GatewayServer {
    /// Create a server backed by the built-in in-memory course.
    pub fn new(config: PrimerConfig) -> Self {
        Self::with_store(config, Box::new(MemoryStore::new()))
    }

    pub fn with_store(config: PrimerConfig, store: Box<dyn ContentStore>) -> Self {
        let readers = ReaderRegistry::with_capacity(config.server.max_connections);
        Self {
            config,
            store,
            auth: AuthSessions::new(),
            readers,
            started_at: Utc::now(),
            attention_requests: 0,
        }
    }

    /// Wrap in the shared handle the router expects.
    pub fn into_shared(self) -> SharedGateway {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &PrimerConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn ContentStore {
        self.store.as_mut()
    }

    pub fn auth(&self) -> &AuthSessions {
        &self.auth
    }

    pub fn readers(&self) -> &ReaderRegistry {
        &self.readers
    }

    pub fn readers_mut(&mut self) -> &mut ReaderRegistry {
        &mut self.readers
    }

    /// Uptime in seconds since the server was created.
    pub fn uptime_secs(&self) -> u64 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_seconds().max(0) as u64
    }

    pub fn attention_requests(&self) -> u64 {
        self.attention_requests
    }

    /// Create a user and log them in.
    pub fn register_user(&mut self, new_user: NewUser) -> Result<AuthResponse, ApiError> {
        if new_user.username.trim().is_empty() || new_user.password.is_empty() {
            return Err(ApiError::BadRequest(
                "username and password are required".to_string(),
            ));
        }
        let user = self.store.create_user(new_user)?;
        let token = self.auth.issue(user.id);
        info!(user_id = user.id, "Registered user");
        Ok(AuthResponse { user, token })
    }

    /// Check credentials and issue a token.
    pub fn login(&mut self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let user = self
            .store
            .user_by_username(username)
            .filter(|u| u.password == password)
            .ok_or_else(|| ContentError::InvalidCredentials {
                username: username.to_string(),
            })?;
        let token = self.auth.issue(user.id);
        debug!(user_id = user.id, "User logged in");
        Ok(AuthResponse { user, token })
    }

    /// The user a bearer token belongs to.
    pub fn authenticated_user(&self, token: Option<&str>) -> Result<User, ApiError> {
        token
            .and_then(|t| self.auth.resolve(t))
            .and_then(|id| self.store.user(id))
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
    }

    pub fn logout(&mut self, token: Option<&str>) -> Result<(), ApiError> {
        match token {
            Some(t) if self.auth.revoke(t) => Ok(()),
            _ => Err(ApiError::Unauthorized("Not authenticated".to_string())),
        }
    }
}

/// Body of `POST /api/quiz-questions/{id}/answer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub option_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Body of `POST /api/attention`. Omitted fields take the configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttentionRequest {
    pub sentence: String,
    #[serde(default)]
    pub heads: Option<usize>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub split_punctuation: Option<bool>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionResponse {
    pub tokens: Vec<String>,
    pub weights: Vec<Vec<Vec<f64>>>,
    pub heads: Vec<HeadSummary>,
}

/// Build the axum router with every REST route plus `/ws` and `/health`.
pub fn router(shared: SharedGateway) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .route("/api/content", get(content_handler))
        .route("/api/section/{slug}", get(section_handler))
        .route("/api/quiz-questions", get(quiz_handler))
        .route("/api/quiz", get(quiz_handler))
        .route("/api/quiz-questions/{id}/answer", post(answer_handler))
        .route("/api/search", get(search_handler))
        .route(
            "/api/user/{user_id}/progress",
            get(get_progress_handler).patch(update_progress_handler),
        )
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/me", get(me_handler))
        .route("/api/attention", post(attention_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared)
}

/// Health check endpoint.
async fn health_handler(State(gw): State<SharedGateway>) -> impl IntoResponse {
    let gw = gw.lock().await;
    let body = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": gw.readers().len(),
        "readers_by_section": gw.readers().readers_by_section(),
        "auth_sessions": gw.auth().active_count(),
        "attention_requests": gw.attention_requests(),
        "uptime_secs": gw.uptime_secs(),
    });
    Json(body)
}

async fn content_handler(State(gw): State<SharedGateway>) -> Json<ContentBundle> {
    Json(gw.lock().await.store().content())
}

async fn section_handler(
    State(gw): State<SharedGateway>,
    Path(slug): Path<String>,
) -> Result<Json<Section>, ApiError> {
    let gw = gw.lock().await;
    let section = gw
        .store()
        .section(&slug)
        .ok_or(ContentError::SectionNotFound { slug })?;
    Ok(Json(section))
}

async fn quiz_handler(State(gw): State<SharedGateway>) -> Json<Vec<QuizQuestion>> {
    Json(gw.lock().await.store().quiz_questions())
}

async fn answer_handler(
    State(gw): State<SharedGateway>,
    Path(id): Path<u32>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerOutcome>, ApiError> {
    let gw = gw.lock().await;
    Ok(Json(gw.store().check_answer(id, &req.option_id)?))
}

async fn search_handler(
    State(gw): State<SharedGateway>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<SearchHit>> {
    let query = params.q.unwrap_or_default();
    Json(gw.lock().await.store().search(&query))
}

async fn get_progress_handler(
    State(gw): State<SharedGateway>,
    Path(user_id): Path<u32>,
) -> Result<Json<UserProgress>, ApiError> {
    let gw = gw.lock().await;
    gw.store()
        .user_progress(user_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No progress for user {}", user_id)))
}

async fn update_progress_handler(
    State(gw): State<SharedGateway>,
    Path(user_id): Path<u32>,
    Json(update): Json<ProgressUpdate>,
) -> Result<Json<UserProgress>, ApiError> {
    let mut gw = gw.lock().await;
    Ok(Json(gw.store_mut().update_user_progress(user_id, update)?))
}

async fn register_handler(
    State(gw): State<SharedGateway>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let mut gw = gw.lock().await;
    let response = gw.register_user(new_user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login_handler(
    State(gw): State<SharedGateway>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mut gw = gw.lock().await;
    Ok(Json(gw.login(&req.username, &req.password)?))
}

async fn logout_handler(
    State(gw): State<SharedGateway>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let mut gw = gw.lock().await;
    gw.logout(bearer_token(&headers))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me_handler(
    State(gw): State<SharedGateway>,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let gw = gw.lock().await;
    Ok(Json(gw.authenticated_user(bearer_token(&headers))?))
}

async fn attention_handler(
    State(gw): State<SharedGateway>,
    Json(req): Json<AttentionRequest>,
) -> Result<Json<AttentionResponse>, ApiError> {
    let playground = {
        let mut gw = gw.lock().await;
        gw.attention_requests += 1;
        gw.config().playground.clone()
    };

    let heads = req.heads.unwrap_or(playground.default_heads);
    let temperature = req.temperature.unwrap_or(playground.default_temperature);
    validate_arguments(heads, temperature)?;
    playground.check_bounds(heads, temperature)?;

    let split = req
        .split_punctuation
        .unwrap_or(playground.split_punctuation);
    let seed = req.seed.or(playground.seed);
    let max_tokens = playground.max_tokens;

    let response = tokio::task::spawn_blocking(move || {
        let map = AttentionWeightGenerator::from_seed(seed)
            .split_punctuation(split)
            .max_tokens(Some(max_tokens))
            .generate(&req.sentence, heads, temperature)?;
        let summaries = summarize_heads(&map);
        Ok::<_, ApiError>(AttentionResponse {
            tokens: map.tokens,
            weights: map.weights,
            heads: summaries,
        })
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Attention task failed: {}", e)))??;

    Ok(Json(response))
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(gw): State<SharedGateway>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, gw))
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(WsMessage::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to encode server message");
            true
        }
    }
}

async fn close_socket(socket: &mut WebSocket) {
    if let Err(e) = socket.send(WsMessage::Close(None)).await {
        debug!(error = %e, "Client went away before close frame");
    }
}

/// Drive one client's scroll spy until the socket closes.
async fn handle_socket(mut socket: WebSocket, gw: SharedGateway) {
    let (conn_id, options) = {
        let mut gw = gw.lock().await;
        let options = gw.config().scroll_spy.clone();
        (gw.readers_mut().admit(), options)
    };
    let Some(conn_id) = conn_id else {
        let err = ServerMessage::error("CAPACITY_FULL", "Server at maximum connections");
        send_message(&mut socket, &err).await;
        close_socket(&mut socket).await;
        return;
    };

    match ScrollSpySession::new(conn_id, options) {
        Ok(session) => {
            debug!(connection_id = %conn_id, "Scroll spy client connected");
            message_loop(&mut socket, session, &gw).await;
        }
        Err(e) => {
            let err = ServerMessage::error("INVALID_OPTIONS", e.to_string());
            send_message(&mut socket, &err).await;
            close_socket(&mut socket).await;
        }
    }

    gw.lock().await.readers_mut().release(&conn_id);
    debug!(connection_id = %conn_id, "Scroll spy client disconnected");
}

async fn message_loop(socket: &mut WebSocket, mut session: ScrollSpySession, gw: &SharedGateway) {
    while let Some(Ok(ws_msg)) = socket.recv().await {
        let text = match ws_msg {
            WsMessage::Text(t) => t.to_string(),
            WsMessage::Close(_) => break,
            _ => continue,
        };

        let response = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(msg) => session.handle(msg),
            Err(e) => ServerMessage::error("PARSE_ERROR", format!("Invalid message: {}", e)),
        };

        {
            let mut gw = gw.lock().await;
            let readers = gw.readers_mut();
            let id = session.connection_id();
            readers.record_message(&id);
            match &response {
                ServerMessage::ActiveSection { id: section, .. } => {
                    readers.set_section(&id, section.as_deref());
                }
                ServerMessage::Detached { .. } => readers.set_section(&id, None),
                _ => {}
            }
        }

        if !send_message(socket, &response).await {
            break;
        }
    }
}

/// Serve on the configured address until `shutdown` is cancelled.
pub async fn run(gw: SharedGateway, shutdown: CancellationToken) -> Result<(), std::io::Error> {
    let addr = gw.lock().await.config().server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Transformer Primer server listening");
    let app = router(gw);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    info!("Server stopped");
    Ok(())
}
