//! The synchronous scroll spy state machine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::geometry::Rect;
use super::options::{Boundary, ScrollSpyOptions};
use crate::error::ScrollSpyError;

/// A registered page section: an id plus the key of its screen region.
///
/// `region` is `None` while the section is not mounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRef {
    pub id: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl SectionRef {
    /// A section whose region key equals its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            region: Some(id.clone()),
            id,
        }
    }

    pub fn with_region(id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            region: Some(region.into()),
        }
    }

    pub fn unmounted(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            region: None,
        }
    }
}

/// Visible fraction of one section, as reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityEntry {
    pub id: String,
    pub ratio: f64,
}

impl VisibilityEntry {
    pub fn new(id: impl Into<String>, ratio: f64) -> Self {
        Self {
            id: id.into(),
            ratio,
        }
    }
}

/// Screen geometry at one moment: the viewport plus every mounted region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub viewport: Rect,
    #[serde(default)]
    pub regions: HashMap<String, Rect>,
}

impl LayoutSnapshot {
    pub fn new(viewport: Rect) -> Self {
        Self {
            viewport,
            regions: HashMap::new(),
        }
    }

    pub fn with_region(mut self, key: impl Into<String>, rect: Rect) -> Self {
        self.regions.insert(key.into(), rect);
        self
    }
}

/// Tracks which registered section is active.
///
/// Each notification is evaluated against the current registration: the
/// earliest registered section at or above the threshold wins, and when none
/// qualifies the previous answer stands.
#[derive(Debug, Clone)]
pub struct ScrollSpy {
    options: ScrollSpyOptions,
    sections: Vec<SectionRef>,
    active: Option<String>,
    generation: u64,
    attached: bool,
}

impl ScrollSpy {
    /// Create an attached spy with no sections.
    pub fn new(options: ScrollSpyOptions) -> Result<Self, ScrollSpyError> {
        Ok(Self {
            options: options.validated()?,
            sections: Vec::new(),
            active: None,
            generation: 1,
            attached: true,
        })
    }

    pub fn options(&self) -> &ScrollSpyOptions {
        &self.options
    }

    pub fn sections(&self) -> &[SectionRef] {
        &self.sections
    }

    /// Currently active section id, if any notification has selected one.
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Bumped every time the observation is recreated.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Replace the registered sections, keeping the active id until the next
    /// notification. Re-attaches a detached spy. Returns the section count.
    pub fn register(&mut self, sections: Vec<SectionRef>) -> usize {
        self.sections = sections;
        self.attached = true;
        debug!(
            sections = self.sections.len(),
            generation = self.generation,
            "Registered scroll spy sections"
        );
        self.sections.len()
    }

    /// Discard the current observation and start a new one with `options`.
    ///
    /// Sections and the active id carry over; nothing from the old
    /// configuration does. A detached spy stays detached until `register`.
    pub fn configure(&mut self, options: ScrollSpyOptions) -> Result<(), ScrollSpyError> {
        let options = options.validated()?;
        self.options = options;
        self.generation += 1;
        debug!(generation = self.generation, "Recreated scroll spy observation");
        Ok(())
    }

    /// Stop observing. Returns `false` if already detached.
    pub fn detach(&mut self) -> bool {
        let was_attached = self.attached;
        self.attached = false;
        was_attached
    }

    /// Visible fraction of `section` in `snapshot`, or `None` when the section
    /// or the boundary region is not mounted.
    pub fn visible_fraction(&self, section: &SectionRef, snapshot: &LayoutSnapshot) -> Option<f64> {
        let region = snapshot.regions.get(section.region.as_ref()?)?;
        let boundary = match &self.options.boundary {
            Boundary::Viewport => snapshot.viewport,
            Boundary::Region(key) => *snapshot.regions.get(key)?,
        };
        let frame = self.options.margin.apply(&boundary);
        Some(region.visible_fraction(&frame))
    }

    /// Measure every mounted section in `snapshot`.
    pub fn measure(&self, snapshot: &LayoutSnapshot) -> Vec<VisibilityEntry> {
        self.sections
            .iter()
            .filter_map(|section| {
                self.visible_fraction(section, snapshot)
                    .map(|ratio| VisibilityEntry::new(section.id.clone(), ratio))
            })
            .collect()
    }

    /// Earliest registered, mounted section whose entry clears the threshold.
    pub fn select<'a>(&'a self, entries: &[VisibilityEntry]) -> Option<&'a SectionRef> {
        self.sections.iter().find(|section| {
            section.region.is_some()
                && entries
                    .iter()
                    .any(|e| e.id == section.id && self.clears_threshold(e.ratio))
        })
    }

    /// Handle a visibility notification of precomputed ratios.
    ///
    /// Ignored while detached. Returns the active id after the notification.
    pub fn on_visibility(&mut self, entries: &[VisibilityEntry]) -> Option<&str> {
        if !self.attached {
            return self.active();
        }
        if let Some(id) = self.select(entries).map(|s| s.id.clone()) {
            if self.active.as_deref() != Some(id.as_str()) {
                debug!(active = %id, "Active section changed");
            }
            self.active = Some(id);
        }
        self.active()
    }

    /// Handle a visibility notification carrying raw layout geometry.
    pub fn on_layout(&mut self, snapshot: &LayoutSnapshot) -> Option<&str> {
        if !self.attached {
            return self.active();
        }
        let entries = self.measure(snapshot);
        self.on_visibility(&entries)
    }

    fn clears_threshold(&self, ratio: f64) -> bool {
        ratio > 0.0 && ratio >= self.options.threshold
    }
}
