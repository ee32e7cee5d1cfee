//! Error types for the Transformer Primer core.
//!
//! Uses `thiserror` for public API error types with structured error variants
//! covering the attention playground, scroll spy, content store, and configuration.

use std::path::PathBuf;

/// Top-level error type for the primer core library.
#[derive(Debug, thiserror::Error)]
pub enum PrimerError {
    #[error("Attention error: {0}")]
    Attention(#[from] AttentionError),

    #[error("Scroll spy error: {0}")]
    ScrollSpy(#[from] ScrollSpyError),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the attention weight generator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttentionError {
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Head {head} out of range (map has {heads} heads)")]
    HeadOutOfRange { head: usize, heads: usize },
}

impl AttentionError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while setting up a scroll spy observation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScrollSpyError {
    #[error("Invalid visibility threshold: {value}")]
    InvalidThreshold { value: f64 },

    #[error("Invalid margin '{input}': {reason}")]
    InvalidMargin { input: String, reason: String },
}

/// Errors from the content store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContentError {
    #[error("Section not found: {slug}")]
    SectionNotFound { slug: String },

    #[error("Quiz question not found: {id}")]
    QuestionNotFound { id: u32 },

    #[error("Option '{option}' is not an answer to question {question}")]
    UnknownOption { question: u32, option: String },

    #[error("User not found: {id}")]
    UserNotFound { id: u32 },

    #[error("Username already taken: {username}")]
    UsernameTaken { username: String },

    #[error("Invalid credentials for user '{username}'")]
    InvalidCredentials { username: String },

    #[error("Invalid progress value: {value} (expected 0-100)")]
    InvalidProgress { value: i64 },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `PrimerError`.
pub type Result<T> = std::result::Result<T, PrimerError>;
