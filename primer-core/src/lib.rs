//! # Transformer Primer Core
//!
//! Core library for the Transformer Primer learning app.
//! Provides the attention weight playground, the scroll spy that tracks the
//! active course section, the content and progress store, configuration,
//! and the HTTP/WebSocket gateway.

pub mod attention;
pub mod config;
pub mod content;
pub mod error;
pub mod gateway;
pub mod scroll_spy;
pub mod tokenizer;

// Re-export commonly used types at the crate root.
pub use attention::{AttentionMap, AttentionWeightGenerator, HeadPattern, HeadSummary};
pub use config::{PlaygroundConfig, PrimerConfig, ServerConfig, load_config};
pub use content::{ContentStore, MemoryStore};
pub use error::{
    AttentionError, ConfigError, ContentError, PrimerError, Result, ScrollSpyError,
};
pub use gateway::{GatewayServer, SharedGateway};
pub use scroll_spy::{
    ObserverHandle, ScrollSpy, ScrollSpyObserver, ScrollSpyOptions, SectionRef, VisibilityEntry,
};
pub use tokenizer::tokenize;
