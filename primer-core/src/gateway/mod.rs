//! # Gateway
//!
//! HTTP server for the course reader: content and quiz routes, mock learner
//! auth, progress tracking, the attention playground endpoint, and a
//! `/ws` WebSocket that runs a scroll spy per connected client.

mod auth;
mod connection;
mod error;
mod events;
mod server;
mod session;

pub use auth::{AuthSession, AuthSessions, bearer_token};
pub use connection::{Reader, ReaderRegistry};
pub use error::{ApiError, ErrorResponse};
pub use events::{ClientMessage, ServerMessage};
pub use server::{
    AnswerRequest, AttentionRequest, AttentionResponse, AuthResponse, GatewayServer,
    LoginRequest, SearchParams, SharedGateway, router as gateway_router, run as run_gateway,
};
pub use session::ScrollSpySession;
