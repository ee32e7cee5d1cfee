//! Per-head summaries for the playground's explanation panel.

use serde::{Deserialize, Serialize};

use super::map::AttentionMap;
use super::pattern::HeadPattern;

/// How focused a head is, and where each token looks hardest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadSummary {
    pub head: usize,
    pub pattern: HeadPattern,
    /// Mean row entropy, normalized to `[0, 1]` by `ln(N)`.
    pub entropy: f64,
    /// `1 - entropy`: 1.0 means every row is one-hot.
    pub focus: f64,
    /// Column with the largest weight in each row (first wins on ties).
    pub strongest: Vec<usize>,
}

/// Summarize every head, most focused first.
pub fn summarize_heads(map: &AttentionMap) -> Vec<HeadSummary> {
    let mut summaries: Vec<HeadSummary> = map
        .weights
        .iter()
        .enumerate()
        .map(|(head, matrix)| summarize_head(head, matrix))
        .collect();
    summaries.sort_by(|a, b| {
        b.focus
            .partial_cmp(&a.focus)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.head.cmp(&b.head))
    });
    summaries
}

fn summarize_head(head: usize, matrix: &[Vec<f64>]) -> HeadSummary {
    let entropy = if matrix.is_empty() {
        0.0
    } else {
        matrix.iter().map(|row| normalized_entropy(row)).sum::<f64>() / matrix.len() as f64
    };
    HeadSummary {
        head,
        pattern: HeadPattern::for_head(head),
        entropy,
        focus: 1.0 - entropy,
        strongest: matrix.iter().map(|row| argmax(row)).collect(),
    }
}

fn normalized_entropy(row: &[f64]) -> f64 {
    if row.len() < 2 {
        return 0.0;
    }
    let h: f64 = row
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.ln())
        .sum();
    (h / (row.len() as f64).ln()).clamp(0.0, 1.0)
}

fn argmax(row: &[f64]) -> usize {
    let mut best = 0;
    for (j, &w) in row.iter().enumerate() {
        if w > row[best] {
            best = j;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attention::AttentionWeightGenerator;

    #[test]
    fn test_uniform_row_has_full_entropy() {
        assert!((normalized_entropy(&[0.25; 4]) - 1.0).abs() < 1e-12);
        assert_eq!(normalized_entropy(&[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(normalized_entropy(&[1.0]), 0.0);
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[0.5, 0.5]), 0);
    }

    #[test]
    fn test_summaries_sorted_by_focus() {
        let map = AttentionMap {
            tokens: vec!["a".into(), "b".into()],
            weights: vec![
                vec![vec![0.5, 0.5], vec![0.5, 0.5]],
                vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            ],
        };
        let summaries = summarize_heads(&map);
        assert_eq!(summaries[0].head, 1);
        assert_eq!(summaries[0].pattern, HeadPattern::SelfFocus);
        assert!((summaries[0].focus - 1.0).abs() < 1e-12);
        assert_eq!(summaries[0].strongest, vec![0, 1]);
        assert_eq!(summaries[1].head, 0);
        assert!(summaries[1].focus.abs() < 1e-12);
    }

    #[test]
    fn test_self_focus_head_points_at_itself() {
        let map = AttentionWeightGenerator::seeded(5)
            .generate("one two three four", 2, 1.0)
            .unwrap();
        let summaries = summarize_heads(&map);
        let self_focus = summaries.iter().find(|s| s.head == 1).unwrap();
        assert_eq!(self_focus.strongest, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_map_summaries() {
        let summaries = summarize_heads(&AttentionMap::empty(2));
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.strongest.is_empty()));
    }
}
