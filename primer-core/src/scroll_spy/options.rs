//! Observation configuration for the scroll spy.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::geometry::Margin;
use crate::error::ScrollSpyError;

/// Default fraction of a section that must be visible to count.
pub const DEFAULT_THRESHOLD: f64 = 0.2;

/// The reference frame visibility is measured against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// The whole viewport.
    #[default]
    Viewport,
    /// A scrollable container, looked up by region key in each layout snapshot.
    Region(String),
}

/// Boundary, margin, and threshold for one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollSpyOptions {
    #[serde(default)]
    pub boundary: Boundary,
    #[serde(default)]
    pub margin: Margin,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for ScrollSpyOptions {
    fn default() -> Self {
        Self {
            boundary: Boundary::Viewport,
            margin: Margin::zero(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ScrollSpyOptions {
    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Check the options before an observation is created.
    ///
    /// A non-finite threshold is rejected; a finite one outside `[0, 1]` is
    /// clamped into range.
    pub fn validated(mut self) -> Result<Self, ScrollSpyError> {
        if !self.threshold.is_finite() {
            return Err(ScrollSpyError::InvalidThreshold {
                value: self.threshold,
            });
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            let clamped = self.threshold.clamp(0.0, 1.0);
            warn!(
                requested = self.threshold,
                clamped, "Scroll spy threshold outside [0, 1], clamping"
            );
            self.threshold = clamped;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ScrollSpyOptions::default();
        assert_eq!(options.boundary, Boundary::Viewport);
        assert_eq!(options.margin, Margin::zero());
        assert_eq!(options.threshold, 0.2);
    }

    #[test]
    fn test_threshold_clamped() {
        let options = ScrollSpyOptions::default()
            .with_threshold(1.5)
            .validated()
            .unwrap();
        assert_eq!(options.threshold, 1.0);

        let options = ScrollSpyOptions::default()
            .with_threshold(-0.3)
            .validated()
            .unwrap();
        assert_eq!(options.threshold, 0.0);
    }

    #[test]
    fn test_non_finite_threshold_rejected() {
        let err = ScrollSpyOptions::default()
            .with_threshold(f64::NAN)
            .validated()
            .unwrap_err();
        assert!(matches!(err, ScrollSpyError::InvalidThreshold { .. }));
    }

    #[test]
    fn test_deserialize_partial() {
        let options: ScrollSpyOptions =
            serde_json::from_str(r#"{"margin": "-64px 0px", "boundary": {"region": "main"}}"#)
                .unwrap();
        assert_eq!(options.threshold, 0.2);
        assert_eq!(options.boundary, Boundary::Region("main".into()));
        assert_eq!(options.margin, "-64px 0px".parse::<Margin>().unwrap());

        let options: ScrollSpyOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ScrollSpyOptions::default());
    }
}
