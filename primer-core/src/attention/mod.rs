//! # Attention Playground
//!
//! Synthesizes illustrative multi-head attention maps for a sentence. No real
//! model is involved: each head applies a fixed scoring pattern to token
//! positions and normalizes every row into a probability distribution, which
//! is enough to drive heatmap displays.

mod generator;
mod map;
mod pattern;
mod summary;

pub use generator::{AttentionWeightGenerator, normalize_row, validate_arguments};
pub use map::AttentionMap;
pub use pattern::HeadPattern;
pub use summary::{HeadSummary, summarize_heads};
