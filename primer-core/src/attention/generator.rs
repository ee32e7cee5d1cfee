//! Per-head attention weight synthesis and row normalization.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::map::AttentionMap;
use super::pattern::HeadPattern;
use crate::error::AttentionError;
use crate::tokenizer::tokenize;

/// Check the generator's numeric arguments.
///
/// `head_count` must be at least 1 and `temperature` a finite positive number.
pub fn validate_arguments(head_count: usize, temperature: f64) -> Result<(), AttentionError> {
    if head_count < 1 {
        return Err(AttentionError::invalid(
            "head_count",
            "must be at least 1",
        ));
    }
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(AttentionError::invalid(
            "temperature",
            format!("must be a finite value > 0, got {}", temperature),
        ));
    }
    Ok(())
}

/// Scale `row` in place so it sums to 1.
///
/// A row whose sum is zero or not finite becomes the uniform distribution.
pub fn normalize_row(row: &mut [f64]) {
    if row.is_empty() {
        return;
    }
    let sum: f64 = row.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        for w in row.iter_mut() {
            *w /= sum;
        }
    } else {
        let uniform = 1.0 / row.len() as f64;
        row.fill(uniform);
    }
}

/// Generates synthetic attention maps for the playground.
///
/// The random source is injected so callers that need reproducible output
/// (tests, shareable playground links) can seed it.
#[derive(Debug, Clone)]
pub struct AttentionWeightGenerator<R = StdRng> {
    rng: R,
    split_punctuation: bool,
    max_tokens: Option<usize>,
}

impl AttentionWeightGenerator<StdRng> {
    /// Generator backed by an OS-seeded RNG.
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Generator whose random patterns are reproducible for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Seeded when `seed` is given, entropy-backed otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(value) => Self::seeded(value),
            None => Self::from_entropy(),
        }
    }
}

impl<R: Rng> AttentionWeightGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            split_punctuation: true,
            max_tokens: None,
        }
    }

    /// Whether punctuation is split into separate tokens (default: true).
    pub fn split_punctuation(mut self, enabled: bool) -> Self {
        self.split_punctuation = enabled;
        self
    }

    /// Reject sentences with more than `limit` tokens. Output grows as
    /// `heads * tokens^2`, so request-facing callers should always set this.
    pub fn max_tokens(mut self, limit: Option<usize>) -> Self {
        self.max_tokens = limit;
        self
    }

    /// Tokenize `sentence` and build `head_count` normalized matrices.
    ///
    /// Arguments are validated before tokenization, so invalid parameters are
    /// rejected even for an empty sentence. An empty sentence yields no tokens
    /// and one empty matrix per head.
    pub fn generate(
        &mut self,
        sentence: &str,
        head_count: usize,
        temperature: f64,
    ) -> Result<AttentionMap, AttentionError> {
        validate_arguments(head_count, temperature)?;

        let tokens = tokenize(sentence, self.split_punctuation);
        if tokens.is_empty() {
            debug!(head_count, "Empty sentence, returning empty attention map");
            return Ok(AttentionMap::empty(head_count));
        }

        let n = tokens.len();
        if let Some(limit) = self.max_tokens.filter(|limit| n > *limit) {
            return Err(AttentionError::invalid(
                "sentence",
                format!("has {} tokens, at most {} are allowed", n, limit),
            ));
        }
        let weights = (0..head_count)
            .map(|head| self.head_weights(n, head, temperature))
            .collect();

        debug!(tokens = n, head_count, temperature, "Generated attention map");
        Ok(AttentionMap { tokens, weights })
    }

    /// Build the normalized `n x n` matrix for one head.
    pub fn head_weights(&mut self, n: usize, head: usize, temperature: f64) -> Vec<Vec<f64>> {
        let pattern = HeadPattern::for_head(head);
        (0..n)
            .map(|i| {
                let mut row: Vec<f64> = (0..n)
                    .map(|j| pattern.score(i, j, temperature, &mut self.rng))
                    .collect();
                normalize_row(&mut row);
                row
            })
            .collect()
    }
}

impl Default for AttentionWeightGenerator<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}
