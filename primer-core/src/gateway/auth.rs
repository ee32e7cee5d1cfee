//! Mock bearer-token sessions for the learner API.
//!
//! Tokens are opaque random strings held in memory. They do not survive a
//! restart and carry no expiry. Each user keeps at most
//! [`MAX_SESSIONS_PER_USER`] live tokens; logging in again past that evicts
//! the oldest.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

pub const MAX_SESSIONS_PER_USER: usize = 8;

/// One issued token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: u32,
    pub issued_at: DateTime<Utc>,
    seq: u64,
}

/// Issued tokens, keyed by token string.
#[derive(Debug, Default)]
pub struct AuthSessions {
    sessions: HashMap<String, AuthSession>,
    next_seq: u64,
}

impl AuthSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for `user_id`.
    pub fn issue(&mut self, user_id: u32) -> String {
        while self.count_for(user_id) >= MAX_SESSIONS_PER_USER {
            let Some(oldest) = self
                .sessions
                .iter()
                .filter(|(_, s)| s.user_id == user_id)
                .min_by_key(|(_, s)| s.seq)
                .map(|(token, _)| token.clone())
            else {
                break;
            };
            self.sessions.remove(&oldest);
            debug!(user_id, "Evicted oldest auth token");
        }

        let token = Uuid::new_v4().simple().to_string();
        self.next_seq += 1;
        self.sessions.insert(
            token.clone(),
            AuthSession {
                user_id,
                issued_at: Utc::now(),
                seq: self.next_seq,
            },
        );
        token
    }

    fn count_for(&self, user_id: u32) -> usize {
        self.sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .count()
    }

    /// User id the token was issued to, if it is still valid.
    pub fn resolve(&self, token: &str) -> Option<u32> {
        self.sessions.get(token).map(|s| s.user_id)
    }

    /// Revoke a token. Returns `false` if it was unknown.
    pub fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Number of live tokens.
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}
