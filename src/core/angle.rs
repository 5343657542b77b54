//! Axis orientations.
//!
//! Polarizer axes, wave-plate fast axes, mirror and splitter orientations are
//! all undirected lines, so an orientation θ and θ + 180° are the same
//! physical setting. `Angle` stores degrees wrapped into `[0, 180)` so that
//! wrap-around is handled once, here, instead of at every call site.
//! Signed quantities (rotator amounts, retardance, phase shifts) stay plain
//! `f64` degrees: there the sign and the full period matter.

use super::error::{ensure_finite, OpticsError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An axis orientation in degrees, normalized to `[0, 180)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Angle(f64);

impl Angle {
    pub const HORIZONTAL: Angle = Angle(0.0);
    pub const DIAGONAL: Angle = Angle(45.0);
    pub const VERTICAL: Angle = Angle(90.0);
    pub const ANTI_DIAGONAL: Angle = Angle(135.0);

    /// Wraps `degrees` into `[0, 180)`. Callers pass finite values; use
    /// `Angle::try_from` at input boundaries.
    pub fn new(degrees: f64) -> Self {
        let wrapped = degrees.rem_euclid(180.0);
        // rem_euclid can round up to exactly 180 for tiny negative inputs
        if wrapped >= 180.0 { Angle(0.0) } else { Angle(wrapped) }
    }

    pub fn from_radians(radians: f64) -> Self {
        Self::new(radians.to_degrees())
    }

    pub fn degrees(self) -> f64 {
        self.0
    }

    pub fn radians(self) -> f64 {
        self.0.to_radians()
    }

    /// Smallest angle between the two axes, in `[0, 90]` degrees.
    pub fn difference(self, other: Angle) -> f64 {
        let d = (self.0 - other.0).abs();
        d.min(180.0 - d)
    }

    /// The axis rotated by `degrees` (positive is counter-clockwise in the x/y frame).
    pub fn offset(self, degrees: f64) -> Angle {
        Angle::new(self.0 + degrees)
    }

    pub fn perpendicular(self) -> Angle {
        self.offset(90.0)
    }

    /// Mirror image of this axis about `axis` (what a half-wave plate does).
    pub fn reflect_about(self, axis: Angle) -> Angle {
        Angle::new(2.0 * axis.0 - self.0)
    }

    pub fn is_within(self, other: Angle, tolerance_deg: f64) -> bool {
        self.difference(other) <= tolerance_deg
    }
}

impl Default for Angle {
    fn default() -> Self {
        Angle::HORIZONTAL
    }
}

impl TryFrom<f64> for Angle {
    type Error = OpticsError;

    fn try_from(degrees: f64) -> Result<Self, Self::Error> {
        Ok(Angle::new(ensure_finite("angle", degrees)?))
    }
}

impl From<Angle> for f64 {
    fn from(angle: Angle) -> f64 {
        angle.0
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°", self.0)
    }
}
