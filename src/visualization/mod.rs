// src/visualization/mod.rs

//! Renderer-facing descriptors: polarization ellipses and fidelity bars.
//! Nothing here draws; these are plain data for a front end.

use crate::core::{Angle, Handedness, JonesVector, PolarizationEllipse, StokesVector};
use serde::Serialize;
use std::f64::consts::TAU;
use std::fmt;

/// Default number of outline points per ellipse.
pub const DEFAULT_ELLIPSE_SAMPLES: usize = 64;

const MEDIUM_FIDELITY: f64 = 0.7;
const HIGH_FIDELITY: f64 = 0.95;

/// Shape of a polarization ellipse plus an outline to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EllipseDescriptor {
    pub semi_major: f64,
    pub semi_minor: f64,
    pub orientation: Angle,
    /// χ in degrees.
    pub ellipticity: f64,
    pub handedness: Option<Handedness>,
    pub degree_of_polarization: f64,
    /// Outline points `(x, y)` with y pointing up, scaled so the major axis
    /// has length 1. Right-handed light runs clockwise, left-handed counterclockwise.
    pub points: Vec<(f64, f64)>,
}

impl EllipseDescriptor {
    /// Describes the polarized part of `stokes`, sampled at `samples` points.
    pub fn from_stokes(stokes: &StokesVector, samples: usize) -> Self {
        let ellipse = PolarizationEllipse::from_stokes(stokes);
        let points = outline(&ellipse, samples);
        Self {
            semi_major: ellipse.semi_major,
            semi_minor: ellipse.semi_minor,
            orientation: ellipse.orientation,
            ellipticity: ellipse.ellipticity,
            handedness: ellipse.handedness,
            degree_of_polarization: ellipse.degree_of_polarization,
            points,
        }
    }

    pub fn from_jones(state: &JonesVector, samples: usize) -> Self {
        Self::from_stokes(&state.to_stokes(), samples)
    }

    /// Linear light degenerates to a line segment.
    pub fn is_line(&self) -> bool {
        self.handedness.is_none()
    }
}

fn outline(ellipse: &PolarizationEllipse, samples: usize) -> Vec<(f64, f64)> {
    if ellipse.semi_major <= 0.0 || samples == 0 {
        return Vec::new();
    }
    let b = ellipse.semi_minor / ellipse.semi_major;
    let sense = match ellipse.handedness {
        Some(Handedness::Right) => -1.0,
        _ => 1.0,
    };
    let (sin_psi, cos_psi) = ellipse.orientation.radians().sin_cos();
    (0..samples)
        .map(|k| {
            let t = sense * TAU * k as f64 / samples as f64;
            let (u, v) = (t.cos(), b * t.sin());
            (u * cos_psi - v * sin_psi, u * sin_psi + v * cos_psi)
        })
        .collect()
}

/// Coarse quality rating shown next to a fidelity bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FidelityBand {
    Low,
    Medium,
    High,
}

impl FidelityBand {
    /// Thresholds: medium from 0.7, high from 0.95.
    pub fn of(value: f64) -> Self {
        if value >= HIGH_FIDELITY {
            FidelityBand::High
        } else if value >= MEDIUM_FIDELITY {
            FidelityBand::Medium
        } else {
            FidelityBand::Low
        }
    }
}

impl fmt::Display for FidelityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FidelityBand::Low => write!(f, "low"),
            FidelityBand::Medium => write!(f, "medium"),
            FidelityBand::High => write!(f, "high"),
        }
    }
}

/// A fidelity value prepared for a progress bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FidelityBar {
    pub value: f64,
    /// `value` as a whole percentage.
    pub percent: u8,
    pub band: FidelityBand,
    pub label: String,
}

impl FidelityBar {
    /// Values are clamped to `[0, 1]`; NaN reads as 0.
    pub fn new(value: f64) -> Self {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        let percent = (value * 100.0).round() as u8;
        let band = FidelityBand::of(value);
        Self { value, percent, band, label: format!("{:.1}% ({})", value * 100.0, band) }
    }
}

impl From<f64> for FidelityBar {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}
