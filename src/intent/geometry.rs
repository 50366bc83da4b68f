//! Pointer samples and target geometry
//!
//! Both types live in the same coordinate space (CSS/screen pixels) and the
//! same clock domain (milliseconds on a monotonic clock).

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pointer position sample with timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Horizontal position (pixels)
    pub x: f64,
    /// Vertical position (pixels)
    pub y: f64,
    /// Monotonic timestamp (milliseconds)
    pub t: f64,
}

impl PositionSample {
    /// Create a new sample
    pub const fn new(x: f64, y: f64, t: f64) -> Self {
        Self { x, y, t }
    }

    /// Straight-line distance to a point
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (x - self.x).hypot(y - self.y)
    }
}

/// Axis-aligned target bounds
///
/// `width` and `height` are carried alongside the edges so that callers
/// mirroring a layout engine's bounding box can pass it through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRect {
    /// Left edge
    pub left: f64,
    /// Top edge
    pub top: f64,
    /// Right edge (inclusive)
    pub right: f64,
    /// Bottom edge (inclusive)
    pub bottom: f64,
    /// `right - left`
    pub width: f64,
    /// `bottom - top`
    pub height: f64,
}

impl TargetRect {
    /// Build from edges
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Build from origin and size
    pub fn from_origin_size(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    /// Centre point
    pub fn center(&self) -> (f64, f64) {
        (
            self.left + self.width / 2.0,
            self.top + self.height / 2.0,
        )
    }

    /// Inclusive hit test
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    /// True if the edges are not inverted
    pub fn is_valid(&self) -> bool {
        self.right >= self.left && self.bottom >= self.top
    }
}

/// Source of a target's current bounds
///
/// Queried on every tick; implementations must be cheap and must not cache
/// stale geometry on behalf of the controller.
pub trait GeometryProvider: Send + Sync {
    /// Current bounds of the watched target
    fn bounds(&self) -> TargetRect;
}

impl GeometryProvider for TargetRect {
    fn bounds(&self) -> TargetRect {
        *self
    }
}

impl<F> GeometryProvider for F
where
    F: Fn() -> TargetRect + Send + Sync,
{
    fn bounds(&self) -> TargetRect {
        self()
    }
}

/// Target bounds that can be moved while being watched
///
/// Cloning yields another handle onto the same rectangle, so a layout
/// owner can keep one handle and give the other to a controller.
#[derive(Debug, Clone)]
pub struct SharedGeometry {
    rect: Arc<RwLock<TargetRect>>,
}

impl SharedGeometry {
    /// Create with initial bounds
    pub fn new(rect: TargetRect) -> Self {
        Self {
            rect: Arc::new(RwLock::new(rect)),
        }
    }

    /// Replace the bounds (e.g. after a relayout or scroll)
    pub fn set(&self, rect: TargetRect) {
        *self.rect.write() = rect;
    }
}

impl GeometryProvider for SharedGeometry {
    fn bounds(&self) -> TargetRect {
        *self.rect.read()
    }
}
