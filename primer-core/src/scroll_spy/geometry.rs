//! Rectangles and root margins for visibility testing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScrollSpyError;

/// An axis-aligned screen region in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area, treating negative extents as empty.
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Overlapping region, or `None` when the rectangles do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Fraction of `self` that lies inside `boundary`, in `[0, 1]`.
    ///
    /// A zero-area region is never visible.
    pub fn visible_fraction(&self, boundary: &Rect) -> f64 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        self.intersection(boundary)
            .map(|overlap| (overlap.area() / area).clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }
}

/// A single margin component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f64),
    /// Percentage of the boundary's width (left/right) or height (top/bottom).
    Percent(f64),
}

impl Length {
    fn resolve(self, reference: f64) -> f64 {
        match self {
            Self::Px(v) => v,
            Self::Percent(p) => reference * p / 100.0,
        }
    }

    fn parse(token: &str, input: &str) -> Result<Self, ScrollSpyError> {
        let invalid = |reason: &str| ScrollSpyError::InvalidMargin {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let (number, unit) = if let Some(n) = token.strip_suffix("px") {
            (n, "px")
        } else if let Some(n) = token.strip_suffix('%') {
            (n, "%")
        } else {
            (token, "")
        };
        let value: f64 = number
            .parse()
            .map_err(|_| invalid(&format!("'{}' is not a length", token)))?;
        if !value.is_finite() {
            return Err(invalid("length must be finite"));
        }
        match unit {
            "px" => Ok(Self::Px(value)),
            "%" => Ok(Self::Percent(value)),
            // Unitless zero is allowed, as in CSS.
            _ if value == 0.0 => Ok(Self::Px(0.0)),
            _ => Err(invalid(&format!("'{}' needs a px or % unit", token))),
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{}px", v),
            Self::Percent(p) => write!(f, "{}%", p),
        }
    }
}

/// Grow (positive) or shrink (negative) adjustment applied to the boundary
/// before intersection testing. Parsed from CSS margin shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Margin {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Margin {
    pub fn zero() -> Self {
        Self::uniform(Length::Px(0.0))
    }

    pub fn uniform(length: Length) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }

    /// Expand `boundary` by this margin. Extents never go negative.
    pub fn apply(&self, boundary: &Rect) -> Rect {
        let top = self.top.resolve(boundary.height);
        let bottom = self.bottom.resolve(boundary.height);
        let left = self.left.resolve(boundary.width);
        let right = self.right.resolve(boundary.width);
        Rect::new(
            boundary.x - left,
            boundary.y - top,
            (boundary.width + left + right).max(0.0),
            (boundary.height + top + bottom).max(0.0),
        )
    }
}

impl Default for Margin {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for Margin {
    type Err = ScrollSpyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split_whitespace()
            .map(|token| Length::parse(token, s))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [all] => Ok(Self::uniform(*all)),
            [vertical, horizontal] => Ok(Self {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }),
            [top, horizontal, bottom] => Ok(Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left] => Ok(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            _ => Err(ScrollSpyError::InvalidMargin {
                input: s.to_string(),
                reason: format!("expected 1 to 4 lengths, got {}", parts.len()),
            }),
        }
    }
}

impl fmt::Display for Margin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

impl TryFrom<String> for Margin {
    type Error = ScrollSpyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Margin> for String {
    fn from(margin: Margin) -> Self {
        margin.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 80.0, 100.0, 100.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(50.0, 80.0, 50.0, 20.0)));

        let touching = Rect::new(100.0, 0.0, 10.0, 10.0);
        assert_eq!(a.intersection(&touching), None);
    }

    #[test]
    fn test_visible_fraction() {
        let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
        let half_visible = Rect::new(0.0, 500.0, 800.0, 200.0);
        assert!((half_visible.visible_fraction(&viewport) - 0.5).abs() < 1e-12);

        let below = Rect::new(0.0, 700.0, 800.0, 200.0);
        assert_eq!(below.visible_fraction(&viewport), 0.0);

        let inside = Rect::new(10.0, 10.0, 10.0, 10.0);
        assert_eq!(inside.visible_fraction(&viewport), 1.0);

        let degenerate = Rect::new(10.0, 10.0, 0.0, 50.0);
        assert_eq!(degenerate.visible_fraction(&viewport), 0.0);
    }

    #[test]
    fn test_parse_margin_shorthand() {
        let m: Margin = "10px".parse().unwrap();
        assert_eq!(m, Margin::uniform(Length::Px(10.0)));

        let m: Margin = "-10% 0px".parse().unwrap();
        assert_eq!(m.top, Length::Percent(-10.0));
        assert_eq!(m.bottom, Length::Percent(-10.0));
        assert_eq!(m.left, Length::Px(0.0));

        let m: Margin = "1px 2px 3px".parse().unwrap();
        assert_eq!(m.top, Length::Px(1.0));
        assert_eq!(m.right, Length::Px(2.0));
        assert_eq!(m.bottom, Length::Px(3.0));
        assert_eq!(m.left, Length::Px(2.0));

        let m: Margin = "1px 2px 3px 4px".parse().unwrap();
        assert_eq!(m.left, Length::Px(4.0));

        let m: Margin = "0".parse().unwrap();
        assert_eq!(m, Margin::zero());
    }

    #[test]
    fn test_parse_margin_rejects_garbage() {
        assert!("".parse::<Margin>().is_err());
        assert!("10em".parse::<Margin>().is_err());
        assert!("10".parse::<Margin>().is_err());
        assert!("1px 2px 3px 4px 5px".parse::<Margin>().is_err());
        assert!("NaNpx".parse::<Margin>().is_err());
    }

    #[test]
    fn test_apply_margin() {
        let boundary = Rect::new(0.0, 0.0, 200.0, 100.0);
        let grown = Margin::uniform(Length::Px(10.0)).apply(&boundary);
        assert_eq!(grown, Rect::new(-10.0, -10.0, 220.0, 120.0));

        let shrunk: Margin = "-25% 0px".parse().unwrap();
        assert_eq!(shrunk.apply(&boundary), Rect::new(0.0, 25.0, 200.0, 50.0));

        let collapsed = Margin::uniform(Length::Percent(-100.0)).apply(&boundary);
        assert_eq!(collapsed.area(), 0.0);
    }

    #[test]
    fn test_margin_serde_as_string() {
        let m: Margin = "-10px 5%".parse().unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"-10px 5% -10px 5%\"");
        let back: Margin = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
