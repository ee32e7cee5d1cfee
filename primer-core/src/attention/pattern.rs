//! Synthetic attention patterns, one per head index.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Decay length used by the structured-random pattern.
const STRUCTURED_DECAY: f64 = 3.0;

/// Off-diagonal weight numerator for the self-focus pattern.
const SELF_FOCUS_SPILL: f64 = 0.1;

/// The scoring strategy a head uses to build its unnormalized rows.
///
/// The head-index mapping is fixed: head 0 is [`HeadPattern::Local`], head 1 is
/// [`HeadPattern::SelfFocus`], head 2 is [`HeadPattern::StructuredRandom`], and
/// every later head is [`HeadPattern::Random`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadPattern {
    /// `exp(-|i-j| / temperature)`: attention concentrated on nearby tokens.
    Local,
    /// `1` on the diagonal, `0.1 / (|i-j| + 1)` elsewhere.
    SelfFocus,
    /// `U(0,1) * exp(-|i-j| / 3)`: noisy but distance-decayed.
    StructuredRandom,
    /// `U(0,1)`: no structure at all.
    Random,
}

impl HeadPattern {
    /// Pattern assigned to the given head index.
    pub fn for_head(head: usize) -> Self {
        match head {
            0 => Self::Local,
            1 => Self::SelfFocus,
            2 => Self::StructuredRandom,
            _ => Self::Random,
        }
    }

    /// Whether the pattern's scores depend only on positions and temperature.
    pub fn is_deterministic(self) -> bool {
        matches!(self, Self::Local | Self::SelfFocus)
    }

    /// Short human-readable description for display next to a heatmap.
    pub fn description(self) -> &'static str {
        match self {
            Self::Local => "local/adjacent focus",
            Self::SelfFocus => "self + decayed distance",
            Self::StructuredRandom => "structured randomness",
            Self::Random => "unstructured random",
        }
    }

    /// Unnormalized, non-negative score of query position `i` against key `j`.
    ///
    /// Deterministic patterns never touch `rng`.
    pub fn score<R: Rng + ?Sized>(self, i: usize, j: usize, temperature: f64, rng: &mut R) -> f64 {
        let distance = i.abs_diff(j) as f64;
        match self {
            Self::Local => (-distance / temperature).exp(),
            Self::SelfFocus => {
                if i == j {
                    1.0
                } else {
                    SELF_FOCUS_SPILL / (distance + 1.0)
                }
            }
            Self::StructuredRandom => {
                rng.gen_range(0.0..1.0) * (-distance / STRUCTURED_DECAY).exp()
            }
            Self::Random => rng.gen_range(0.0..1.0),
        }
    }
}

impl std::fmt::Display for HeadPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::SelfFocus => "self_focus",
            Self::StructuredRandom => "structured_random",
            Self::Random => "random",
        };
        write!(f, "{}", name)
    }
}
