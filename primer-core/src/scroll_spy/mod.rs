//! # Scroll Spy
//!
//! Decides which page section is "active" from visibility notifications, so
//! the navigation can highlight it and the URL fragment can follow along.
//!
//! The rule is deliberately simple: among the registered sections whose
//! visible fraction reaches the threshold, the one registered first wins.
//! When nothing qualifies, the previous answer is kept.

mod geometry;
mod observer;
mod options;
mod spy;

pub use geometry::{Length, Margin, Rect};
pub use observer::{ObservedState, ObserverHandle, ScrollSpyObserver, SpyEvent};
pub use options::{Boundary, DEFAULT_THRESHOLD, ScrollSpyOptions};
pub use spy::{LayoutSnapshot, ScrollSpy, SectionRef, VisibilityEntry};

/// URL fragment for a section id (`#<id>`).
pub fn fragment_for(id: &str) -> String {
    format!("#{}", id)
}
