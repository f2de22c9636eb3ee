//! Axis-aligned geometry primitives.
//!
//! Points and rectangles are serialized as bare JSON arrays (`[x, y]`
//! and `[x1, y1, x2, y2]`) to match the persisted entity format. All
//! functions here are pure; malformed (non-finite) input is rejected
//! with [`CoreError::InvalidGeometry`] instead of being coerced.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A 2D point, normally in `[0,1]²` image-relative units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 2]", from = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Build a point, rejecting non-finite components.
    pub fn validated(x: f64, y: f64) -> Result<Self, CoreError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(CoreError::InvalidGeometry(format!(
                "point components must be finite, got ({x}, {y})"
            )));
        }
        Ok(Self { x, y })
    }

    /// Whether both components lie within `[0, 1]`.
    ///
    /// Anchor positions slightly outside the unit square are legitimate
    /// (a landmark just off-canvas), so this is a query, not a guard.
    pub fn in_unit_square(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from(v: [f64; 2]) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle with the invariant `x1 <= x2 && y1 <= y2`.
///
/// The invariant is established by [`Rect::validated`]; deserialized
/// rectangles come from data this crate previously validated and wrote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 4]", from = "[f64; 4]")]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a rectangle from two corners in any order.
    ///
    /// Corner coordinates are normalized so that `(x1, y1)` is the
    /// min corner. Non-finite input is rejected.
    pub fn validated(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, CoreError> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(CoreError::InvalidGeometry(format!(
                "rectangle corners must be finite, got ({x1}, {y1}, {x2}, {y2})"
            )));
        }
        Ok(Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        })
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Whether all four corner components are finite.
    pub fn is_finite(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2].iter().all(|v| v.is_finite())
    }
}

impl From<[f64; 4]> for Rect {
    fn from(v: [f64; 4]) -> Self {
        Self { x1: v[0], y1: v[1], x2: v[2], y2: v[3] }
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        [r.x1, r.y1, r.x2, r.y2]
    }
}

// ---------------------------------------------------------------------------
// Interval remap
// ---------------------------------------------------------------------------

/// Linearly remap `value` from the interval `(from.0, from.1)` to the
/// interval `(to.0, to.1)`.
///
/// Fails on non-finite input or a zero-length source interval.
pub fn remap(value: f64, from: (f64, f64), to: (f64, f64)) -> Result<f64, CoreError> {
    if ![value, from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return Err(CoreError::InvalidGeometry(
            "remap arguments must be finite".to_string(),
        ));
    }
    let span = from.1 - from.0;
    if span == 0.0 {
        return Err(CoreError::InvalidGeometry(
            "remap source interval has zero length".to_string(),
        ));
    }
    Ok(to.0 + (value - from.0) / span * (to.1 - to.0))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
