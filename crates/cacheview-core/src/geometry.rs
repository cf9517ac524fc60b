//! Layout math for the progress ring.
//!
//! Surfaces own all drawing; this only works out where the ring goes.

use std::f64::consts::{FRAC_PI_2, PI};

/// Axis-aligned rectangle in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shrink by `dx`/`dy` on each side. Negative values grow the rect.
    pub fn inset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: (self.width - 2.0 * dx).max(0.0),
            height: (self.height - 2.0 * dy).max(0.0),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Where and how big the progress ring is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingGeometry {
    pub center: (f64, f64),
    pub radius: f64,
    /// Twelve o'clock.
    pub start_angle: f64,
    /// One full clockwise turn after `start_angle`.
    pub end_angle: f64,
    /// Layer frame: the bounds grown by half the thickness.
    pub frame: Rect,
}

/// Default ring thickness used for layout.
pub const DEFAULT_RING_THICKNESS: f64 = 4.0;

impl RingGeometry {
    /// Fit a ring inside `bounds`, sized to two thirds of the shorter side.
    pub fn fit(bounds: Rect, thickness: f64) -> Self {
        let half = thickness / 2.0;
        let inner = bounds.inset(half, half);
        let w = inner.width / 1.5;
        let h = inner.height / 1.5;
        let radius = w.min(h) / 2.0;

        Self {
            center: bounds.center(),
            radius,
            start_angle: -FRAC_PI_2,
            end_angle: 2.0 * PI - FRAC_PI_2,
            frame: bounds.inset(-half, -half),
        }
    }

    /// Angle at which the stroke ends for a progress fraction.
    pub fn angle_at(&self, fraction: f64) -> f64 {
        self.start_angle + (self.end_angle - self.start_angle) * fraction.clamp(0.0, 1.0)
    }
}
