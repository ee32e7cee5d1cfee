//! The generated attention structure and its text heatmap rendering.

use serde::{Deserialize, Serialize};

use crate::error::AttentionError;

/// Shades from weakest to strongest attention, used by [`AttentionMap::render_heatmap`].
const SHADES: [char; 10] = [' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Tokens plus one `N x N` row-stochastic matrix per head.
///
/// `weights[h][i][j]` is how much token `i` attends to token `j` in head `h`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionMap {
    pub tokens: Vec<String>,
    pub weights: Vec<Vec<Vec<f64>>>,
}

impl AttentionMap {
    /// A map with no tokens: one empty matrix per head.
    pub fn empty(head_count: usize) -> Self {
        Self {
            tokens: Vec::new(),
            weights: vec![Vec::new(); head_count],
        }
    }

    pub fn head_count(&self) -> usize {
        self.weights.len()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// True when the sentence produced no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The matrix for a single head.
    pub fn head(&self, head: usize) -> Result<&[Vec<f64>], AttentionError> {
        self.weights
            .get(head)
            .map(Vec::as_slice)
            .ok_or(AttentionError::HeadOutOfRange {
                head,
                heads: self.weights.len(),
            })
    }

    /// Largest deviation of any row sum from 1.0, across all heads.
    pub fn max_row_sum_error(&self) -> f64 {
        self.weights
            .iter()
            .flatten()
            .map(|row| (row.iter().sum::<f64>() - 1.0).abs())
            .fold(0.0, f64::max)
    }

    /// Render one head as a shaded character grid, one line per query token.
    ///
    /// Each cell is two characters wide so the grid reads roughly square in a
    /// terminal. An empty map renders a hint instead of a grid.
    pub fn render_heatmap(&self, head: usize) -> Result<String, AttentionError> {
        let matrix = self.head(head)?;
        if self.tokens.is_empty() {
            return Ok("(enter text to visualize)\n".to_string());
        }

        let label_width = self
            .tokens
            .iter()
            .map(|t| t.chars().count())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for (token, row) in self.tokens.iter().zip(matrix) {
            out.push_str(&format!("{:>width$} |", token, width = label_width));
            for &w in row {
                let shade = shade_for(w);
                out.push(shade);
                out.push(shade);
            }
            out.push_str("|\n");
        }
        Ok(out)
    }
}

fn shade_for(weight: f64) -> char {
    let idx = (weight.clamp(0.0, 1.0) * (SHADES.len() - 1) as f64).round() as usize;
    SHADES[idx.min(SHADES.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_map() -> AttentionMap {
        AttentionMap {
            tokens: vec!["a".into(), "bb".into()],
            weights: vec![vec![vec![1.0, 0.0], vec![0.0, 1.0]]],
        }
    }

    #[test]
    fn test_empty_map_has_one_matrix_per_head() {
        let map = AttentionMap::empty(3);
        assert!(map.is_empty());
        assert_eq!(map.head_count(), 3);
        assert!(map.weights.iter().all(Vec::is_empty));
    }

    #[test]
    fn test_head_out_of_range() {
        let map = identity_map();
        assert!(map.head(0).is_ok());
        assert_eq!(
            map.head(4).unwrap_err(),
            AttentionError::HeadOutOfRange { head: 4, heads: 1 }
        );
    }

    #[test]
    fn test_row_sum_error() {
        let mut map = identity_map();
        assert_eq!(map.max_row_sum_error(), 0.0);
        map.weights[0][1][0] = 0.5;
        assert!((map.max_row_sum_error() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_render_heatmap() {
        let rendered = identity_map().render_heatmap(0).unwrap();
        assert_eq!(rendered, " a |@@  |\nbb |  @@|\n");
    }

    #[test]
    fn test_render_empty_heatmap() {
        let rendered = AttentionMap::empty(1).render_heatmap(0).unwrap();
        assert!(rendered.contains("enter text"));
    }

    #[test]
    fn test_shade_bounds() {
        assert_eq!(shade_for(0.0), ' ');
        assert_eq!(shade_for(1.0), '@');
        assert_eq!(shade_for(2.0), '@');
        assert_eq!(shade_for(-1.0), ' ');
    }
}
