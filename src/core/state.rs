// src/core/state.rs

use super::angle::Angle;
use super::complex::{abs2, C64};
use super::constants::optics_constants::{DARK_EPSILON, UNPOLARIZED_DOP};
use super::error::{ensure_finite, ensure_non_negative, OpticsError, Result};
use num_complex::Complex;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;
use std::ops::{Add, Mul};

/// Sense of rotation of the field vector.
///
/// Sign convention used throughout the crate: right circular light is
/// `(1, −i)/√2` and has a positive `s3` Stokes parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    #[default]
    Right,
    Left,
}

impl Handedness {
    pub fn opposite(self) -> Handedness {
        match self {
            Handedness::Right => Handedness::Left,
            Handedness::Left => Handedness::Right,
        }
    }

    /// The normalized circular Jones vector of this handedness.
    pub fn jones(self) -> JonesVector {
        match self {
            Handedness::Right => JonesVector::right_circular(),
            Handedness::Left => JonesVector::left_circular(),
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Right => write!(f, "right"),
            Handedness::Left => write!(f, "left"),
        }
    }
}

/// A fully polarized light state `(Ex, Ey)`.
///
/// Amplitudes are not normalized: the intensity carried by the beam is
/// `|Ex|² + |Ey|²`. Components are finite by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[C64; 2]", into = "[C64; 2]")]
pub struct JonesVector {
    e: [C64; 2],
}

impl JonesVector {
    /// Validated constructor for externally supplied amplitudes.
    pub fn new(ex: C64, ey: C64) -> Result<Self> {
        ensure_finite("jones.ex.re", ex.re)?;
        ensure_finite("jones.ex.im", ex.im)?;
        ensure_finite("jones.ey.re", ey.re)?;
        ensure_finite("jones.ey.im", ey.im)?;
        Ok(Self { e: [ex, ey] })
    }

    /// Internal constructor for values derived from already-finite inputs.
    pub(crate) fn from_components(ex: C64, ey: C64) -> Self {
        Self { e: [ex, ey] }
    }

    pub(crate) fn real(ex: f64, ey: f64) -> Self {
        Self::from_components(Complex::new(ex, 0.0), Complex::new(ey, 0.0))
    }

    pub fn dark() -> Self {
        Self::from_components(C64::zero(), C64::zero())
    }

    pub fn horizontal() -> Self {
        Self::real(1.0, 0.0)
    }

    pub fn vertical() -> Self {
        Self::real(0.0, 1.0)
    }

    pub fn diagonal() -> Self {
        Self::real(FRAC_1_SQRT_2, FRAC_1_SQRT_2)
    }

    pub fn anti_diagonal() -> Self {
        Self::real(FRAC_1_SQRT_2, -FRAC_1_SQRT_2)
    }

    /// Unit-intensity linear state along `angle`.
    pub fn linear(angle: Angle) -> Self {
        let theta = angle.radians();
        Self::real(theta.cos(), theta.sin())
    }

    pub fn right_circular() -> Self {
        Self::from_components(Complex::new(FRAC_1_SQRT_2, 0.0), Complex::new(0.0, -FRAC_1_SQRT_2))
    }

    pub fn left_circular() -> Self {
        Self::from_components(Complex::new(FRAC_1_SQRT_2, 0.0), Complex::new(0.0, FRAC_1_SQRT_2))
    }

    pub fn circular(handedness: Handedness) -> Self {
        handedness.jones()
    }

    pub fn components(&self) -> [C64; 2] {
        self.e
    }

    pub fn ex(&self) -> C64 {
        self.e[0]
    }

    pub fn ey(&self) -> C64 {
        self.e[1]
    }

    /// `|Ex|² + |Ey|²`.
    pub fn intensity(&self) -> f64 {
        abs2(self.e[0]) + abs2(self.e[1])
    }

    pub fn is_dark(&self) -> bool {
        self.intensity() < DARK_EPSILON
    }

    /// Unit-intensity copy, or `None` for (numerically) dark light.
    pub fn normalized(&self) -> Option<JonesVector> {
        let intensity = self.intensity();
        if intensity < DARK_EPSILON {
            return None;
        }
        Some(self.scaled(1.0 / intensity.sqrt()))
    }

    /// Multiplies both amplitudes by `factor`; intensity scales by `factor²`.
    pub fn scaled(&self, factor: f64) -> JonesVector {
        Self::from_components(self.e[0] * factor, self.e[1] * factor)
    }

    /// Multiplies both amplitudes by a complex factor (e.g. a global phase).
    pub fn scaled_complex(&self, factor: C64) -> JonesVector {
        Self::from_components(self.e[0] * factor, self.e[1] * factor)
    }

    /// Same polarization carrying `intensity`. Dark input stays dark.
    pub fn with_intensity(&self, intensity: f64) -> JonesVector {
        match self.normalized() {
            Some(unit) => unit.scaled(intensity.max(0.0).sqrt()),
            None => JonesVector::dark(),
        }
    }

    /// Inner product `⟨self|other⟩ = conj(sx)·ox + conj(sy)·oy`.
    pub fn inner(&self, other: &JonesVector) -> C64 {
        self.e[0].conj() * other.e[0] + self.e[1].conj() * other.e[1]
    }

    /// Removes the global phase so that the first non-negligible component is real and positive.
    pub fn phase_aligned(&self) -> JonesVector {
        let reference = if abs2(self.e[0]) > DARK_EPSILON { self.e[0] } else { self.e[1] };
        if abs2(reference) < DARK_EPSILON {
            return *self;
        }
        let phase = Complex::from_polar(1.0, -reference.arg());
        self.scaled_complex(phase)
    }

    /// Orientation of a linear state, or `None` for dark / non-linear light.
    pub fn linear_angle(&self) -> Option<Angle> {
        match PolarizationKind::of_jones(self) {
            PolarizationKind::Linear { angle } => Some(angle),
            _ => None,
        }
    }

    pub fn to_stokes(&self) -> StokesVector {
        StokesVector::from_jones(self)
    }

    /// Equality up to a global phase: same intensity and unit fidelity.
    pub fn approx_eq_up_to_phase(&self, other: &JonesVector, tolerance: f64) -> bool {
        let (a, b) = (self.intensity(), other.intensity());
        if (a - b).abs() > tolerance {
            return false;
        }
        if a < DARK_EPSILON {
            return true;
        }
        let overlap = abs2(self.inner(other)) / (a * b);
        (1.0 - overlap).abs() < tolerance
    }
}

impl Default for JonesVector {
    fn default() -> Self {
        JonesVector::horizontal()
    }
}

impl TryFrom<[C64; 2]> for JonesVector {
    type Error = OpticsError;

    fn try_from(e: [C64; 2]) -> Result<Self> {
        JonesVector::new(e[0], e[1])
    }
}

impl From<JonesVector> for [C64; 2] {
    fn from(v: JonesVector) -> [C64; 2] {
        v.e
    }
}

/// Coherent superposition (amplitudes add).
impl Add for JonesVector {
    type Output = JonesVector;

    fn add(self, rhs: JonesVector) -> JonesVector {
        JonesVector::from_components(self.e[0] + rhs.e[0], self.e[1] + rhs.e[1])
    }
}

impl fmt::Display for JonesVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Jones[{:.4}, {:.4}]", self.e[0], self.e[1])
    }
}

/// Stokes description `(s0, s1, s2, s3)` of a possibly partially polarized state.
///
/// - `s0`: total intensity
/// - `s1`: horizontal minus vertical
/// - `s2`: +45° minus −45°
/// - `s3`: right minus left circular
///
/// Invariant: `s1² + s2² + s3² ≤ s0²`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StokesVector {
    s0: f64,
    s1: f64,
    s2: f64,
    s3: f64,
}

/// Relative slack allowed on the realizability bound for rounding.
const STOKES_SLACK: f64 = 1e-9;

impl StokesVector {
    pub fn new(s0: f64, s1: f64, s2: f64, s3: f64) -> Result<Self> {
        ensure_non_negative("stokes.s0", s0)?;
        ensure_finite("stokes.s1", s1)?;
        ensure_finite("stokes.s2", s2)?;
        ensure_finite("stokes.s3", s3)?;
        let polarized = (s1 * s1 + s2 * s2 + s3 * s3).sqrt();
        if polarized > s0 * (1.0 + STOKES_SLACK) + STOKES_SLACK {
            return Err(OpticsError::UnphysicalStokes { polarized, total: s0 });
        }
        Ok(Self { s0, s1, s2, s3 })
    }

    /// Internal constructor for values produced by physical operations.
    pub(crate) fn from_parts(s0: f64, s1: f64, s2: f64, s3: f64) -> Self {
        Self { s0, s1, s2, s3 }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn unpolarized(intensity: f64) -> Self {
        Self::from_parts(intensity.max(0.0), 0.0, 0.0, 0.0)
    }

    /// Builds the Stokes vector from measured intensities through H, V, +45°,
    /// −45°, right and left analyzers. `s0` averages the three complementary pairs.
    pub fn from_intensities(h: f64, v: f64, d: f64, a: f64, r: f64, l: f64) -> Result<Self> {
        let s0 = (h + v + d + a + r + l) / 3.0;
        Self::new(s0, h - v, d - a, r - l)
    }

    pub fn from_jones(v: &JonesVector) -> Self {
        let [ex, ey] = v.components();
        let cross = ex * ey.conj();
        Self::from_parts(
            abs2(ex) + abs2(ey),
            abs2(ex) - abs2(ey),
            2.0 * cross.re,
            2.0 * cross.im,
        )
    }

    pub fn s0(&self) -> f64 {
        self.s0
    }

    pub fn s1(&self) -> f64 {
        self.s1
    }

    pub fn s2(&self) -> f64 {
        self.s2
    }

    pub fn s3(&self) -> f64 {
        self.s3
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.s0, self.s1, self.s2, self.s3]
    }

    pub fn intensity(&self) -> f64 {
        self.s0
    }

    pub fn is_dark(&self) -> bool {
        self.s0 < DARK_EPSILON
    }

    /// `sqrt(s1² + s2² + s3²)`: intensity of the polarized part.
    pub fn polarized_intensity(&self) -> f64 {
        (self.s1 * self.s1 + self.s2 * self.s2 + self.s3 * self.s3).sqrt()
    }

    /// Degree of polarization in `[0, 1]`; 0 for dark light.
    pub fn degree_of_polarization(&self) -> f64 {
        if self.is_dark() {
            return 0.0;
        }
        (self.polarized_intensity() / self.s0).clamp(0.0, 1.0)
    }

    /// Point on (or inside) the Poincaré sphere: `(s1, s2, s3) / s0`.
    pub fn poincare(&self) -> [f64; 3] {
        if self.is_dark() {
            return [0.0; 3];
        }
        [self.s1 / self.s0, self.s2 / self.s0, self.s3 / self.s0]
    }

    /// Orientation ψ = ½·atan2(s2, s1) of the polarization ellipse.
    pub fn orientation(&self) -> Angle {
        if self.s1.abs() < DARK_EPSILON && self.s2.abs() < DARK_EPSILON {
            return Angle::HORIZONTAL;
        }
        Angle::from_radians(0.5 * self.s2.atan2(self.s1))
    }

    /// Ellipticity angle χ in degrees, `[-45, 45]`, of the polarized part.
    /// Positive for right-handed light.
    pub fn ellipticity(&self) -> f64 {
        let p = self.polarized_intensity();
        if p < DARK_EPSILON {
            return 0.0;
        }
        (0.5 * (self.s3 / p).clamp(-1.0, 1.0).asin()).to_degrees()
    }

    /// Handedness of the polarized part, `None` for linear or unpolarized light.
    pub fn handedness(&self) -> Option<Handedness> {
        let p = self.polarized_intensity();
        if p < DARK_EPSILON || (self.s3 / p).abs() < 1e-6 {
            None
        } else if self.s3 > 0.0 {
            Some(Handedness::Right)
        } else {
            Some(Handedness::Left)
        }
    }

    pub fn ellipse(&self) -> PolarizationEllipse {
        PolarizationEllipse::from_stokes(self)
    }

    /// Splits into a fully polarized and a fully unpolarized part.
    pub fn decompose(&self) -> (StokesVector, StokesVector) {
        let p = self.polarized_intensity().min(self.s0);
        (
            StokesVector::from_parts(p, self.s1, self.s2, self.s3),
            StokesVector::unpolarized(self.s0 - p),
        )
    }

    /// Jones vector of the polarized part (global phase: `Ex` real, non-negative).
    pub fn to_jones(&self) -> Result<JonesVector> {
        let p = self.polarized_intensity();
        if p < DARK_EPSILON {
            return Err(OpticsError::NotPolarized {
                message: format!("polarized intensity {:.3e} is negligible", p),
            });
        }
        let ex_amp = ((p + self.s1) / 2.0).max(0.0).sqrt();
        let ey_amp = ((p - self.s1) / 2.0).max(0.0).sqrt();
        if ex_amp < DARK_EPSILON {
            return Ok(JonesVector::real(0.0, ey_amp));
        }
        // Ex·conj(Ey) = (s2 + i·s3)/2 with Ex real
        let phase = -self.s3.atan2(self.s2);
        Ok(JonesVector::from_components(
            Complex::new(ex_amp, 0.0),
            Complex::from_polar(ey_amp, phase),
        ))
    }

    pub fn classify(&self) -> PolarizationKind {
        PolarizationKind::of_stokes(self)
    }

    pub fn approx_eq(&self, other: &StokesVector, tolerance: f64) -> bool {
        self.as_array()
            .iter()
            .zip(other.as_array().iter())
            .all(|(a, b)| (a - b).abs() < tolerance)
    }
}

/// Incoherent superposition: Stokes parameters add.
impl Add for StokesVector {
    type Output = StokesVector;

    fn add(self, rhs: StokesVector) -> StokesVector {
        StokesVector::from_parts(self.s0 + rhs.s0, self.s1 + rhs.s1, self.s2 + rhs.s2, self.s3 + rhs.s3)
    }
}

impl Mul<f64> for StokesVector {
    type Output = StokesVector;

    fn mul(self, factor: f64) -> StokesVector {
        let k = factor.max(0.0);
        StokesVector::from_parts(self.s0 * k, self.s1 * k, self.s2 * k, self.s3 * k)
    }
}

impl fmt::Display for StokesVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stokes[{:.4}, {:.4}, {:.4}, {:.4}] (DOP {:.3})",
            self.s0,
            self.s1,
            self.s2,
            self.s3,
            self.degree_of_polarization()
        )
    }
}

/// Geometry of the polarization ellipse traced by the polarized part of a state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarizationEllipse {
    /// Field amplitude along the major axis.
    pub semi_major: f64,
    /// Field amplitude along the minor axis.
    pub semi_minor: f64,
    pub orientation: Angle,
    /// χ in degrees; 0 linear, ±45 circular.
    pub ellipticity: f64,
    pub handedness: Option<Handedness>,
    pub degree_of_polarization: f64,
}

impl PolarizationEllipse {
    pub fn from_stokes(stokes: &StokesVector) -> Self {
        let amplitude = stokes.polarized_intensity().sqrt();
        let chi = stokes.ellipticity().to_radians();
        Self {
            semi_major: amplitude * chi.cos(),
            semi_minor: amplitude * chi.sin().abs(),
            orientation: stokes.orientation(),
            ellipticity: chi.to_degrees(),
            handedness: stokes.handedness(),
            degree_of_polarization: stokes.degree_of_polarization(),
        }
    }

    pub fn from_jones(v: &JonesVector) -> Self {
        Self::from_stokes(&v.to_stokes())
    }

    /// Minor over major axis, 0 for linear and 1 for circular light.
    pub fn axial_ratio(&self) -> f64 {
        if self.semi_major < DARK_EPSILON { 0.0 } else { self.semi_minor / self.semi_major }
    }
}

/// Coarse naming of a state, as shown to players.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PolarizationKind {
    Dark,
    Unpolarized,
    Linear { angle: Angle },
    Circular { handedness: Handedness },
    Elliptical { orientation: Angle, handedness: Handedness },
}

/// Normalized |s3| below which a state counts as linear, and above `1 - x` as circular.
const CLASSIFY_TOLERANCE: f64 = 0.05;

impl PolarizationKind {
    pub fn of_jones(v: &JonesVector) -> Self {
        Self::of_stokes(&v.to_stokes())
    }

    pub fn of_stokes(stokes: &StokesVector) -> Self {
        if stokes.is_dark() {
            return PolarizationKind::Dark;
        }
        if stokes.degree_of_polarization() < UNPOLARIZED_DOP {
            return PolarizationKind::Unpolarized;
        }
        let s3n = stokes.s3() / stokes.polarized_intensity();
        let handedness = if s3n > 0.0 { Handedness::Right } else { Handedness::Left };
        if s3n.abs() < CLASSIFY_TOLERANCE {
            PolarizationKind::Linear { angle: stokes.orientation() }
        } else if s3n.abs() > 1.0 - CLASSIFY_TOLERANCE {
            PolarizationKind::Circular { handedness }
        } else {
            PolarizationKind::Elliptical { orientation: stokes.orientation(), handedness }
        }
    }
}

impl fmt::Display for PolarizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolarizationKind::Dark => write!(f, "dark"),
            PolarizationKind::Unpolarized => write!(f, "unpolarized"),
            PolarizationKind::Linear { angle } => write!(f, "linear {}", angle),
            PolarizationKind::Circular { handedness } => write!(f, "{} circular", handedness),
            PolarizationKind::Elliptical { orientation, handedness } => {
                write!(f, "{} elliptical at {}", handedness, orientation)
            }
        }
    }
}
