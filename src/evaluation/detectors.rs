// src/evaluation/detectors.rs

//! Per-detector evaluators.
//!
//! Every evaluator takes the Stokes vector accumulated at the detector, so it
//! works the same for a single coherent beam and for an incoherent mixture.

use super::stokes_fidelity;
use crate::circuits::ComponentKind;
use crate::core::constants::optics_constants::{
    DARK_EPSILON, DEFAULT_ANGLE_TOLERANCE_DEG, DEFAULT_LOCK_FIDELITY, DEFAULT_SAFE_TOLERANCE, UNPOLARIZED_DOP,
};
use crate::core::error::{ensure_finite, ensure_non_negative, ensure_unit_interval, OpticsError, Result};
use crate::core::{Angle, JonesVector, StokesVector};
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_angle_tolerance() -> f64 {
    DEFAULT_ANGLE_TOLERANCE_DEG
}

fn default_fidelity_threshold() -> f64 {
    DEFAULT_LOCK_FIDELITY
}

fn default_safe_tolerance() -> f64 {
    DEFAULT_SAFE_TOLERANCE
}

/// Rejects non-finite and all-zero Jones vectors as target states.
pub(crate) fn ensure_target(field: &str, target: &JonesVector) -> Result<()> {
    ensure_finite(field, target.intensity())?;
    if target.is_dark() {
        return Err(OpticsError::InvalidParameter {
            field: field.to_string(),
            message: "target state must carry non-zero amplitude".to_string(),
        });
    }
    Ok(())
}

/// How a plain sensor decides that the light has the right polarization.
///
/// Two strategies are kept apart on purpose: a coarse linear-angle window
/// for simple puzzles and a Jones-overlap threshold for elliptical targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PolarizationMatch {
    /// Linear light whose orientation lies within `tolerance` degrees of
    /// `angle`. The ellipticity must lie within the same window.
    AngleTolerance {
        angle: Angle,
        #[serde(default = "default_angle_tolerance")]
        tolerance: f64,
    },
    /// Fidelity against `target` at least `threshold`.
    Fidelity {
        target: JonesVector,
        #[serde(default = "default_fidelity_threshold")]
        threshold: f64,
    },
}

impl PolarizationMatch {
    pub fn validate(&self) -> Result<()> {
        match self {
            PolarizationMatch::AngleTolerance { angle, tolerance } => {
                ensure_finite("sensor.angle", angle.degrees())?;
                let tolerance = ensure_non_negative("sensor.tolerance", *tolerance)?;
                if tolerance > 90.0 {
                    return Err(OpticsError::InvalidParameter {
                        field: "sensor.tolerance".to_string(),
                        message: format!("angle window of {}° exceeds 90°", tolerance),
                    });
                }
                Ok(())
            }
            PolarizationMatch::Fidelity { target, threshold } => {
                ensure_target("sensor.target", target)?;
                ensure_unit_interval("sensor.threshold", *threshold).map(|_| ())
            }
        }
    }

    /// The pure state this requirement is centred on.
    pub fn target_state(&self) -> JonesVector {
        match self {
            PolarizationMatch::AngleTolerance { angle, .. } => JonesVector::linear(*angle),
            PolarizationMatch::Fidelity { target, .. } => *target,
        }
    }

    /// Fidelity of the received light against `target_state`.
    pub fn fidelity(&self, received: &StokesVector) -> f64 {
        stokes_fidelity(&self.target_state(), received)
    }

    pub fn is_satisfied_by(&self, received: &StokesVector) -> bool {
        match self {
            PolarizationMatch::AngleTolerance { angle, tolerance } => {
                received.degree_of_polarization() >= UNPOLARIZED_DOP
                    && received.orientation().is_within(*angle, *tolerance)
                    && received.ellipticity().abs() <= *tolerance
            }
            PolarizationMatch::Fidelity { threshold, .. } => self.fidelity(received) >= *threshold,
        }
    }
}

/// Result of evaluating a plain sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SensorOutcome {
    NoLight,
    LowIntensity { received: f64, required: f64 },
    WrongPolarization { received: f64, fidelity: f64 },
    Activated { received: f64, fidelity: Option<f64> },
}

impl SensorOutcome {
    pub fn is_activated(&self) -> bool {
        matches!(self, SensorOutcome::Activated { .. })
    }

    pub fn fidelity(&self) -> Option<f64> {
        match *self {
            SensorOutcome::WrongPolarization { fidelity, .. } => Some(fidelity),
            SensorOutcome::Activated { fidelity, .. } => fidelity,
            _ => None,
        }
    }
}

impl fmt::Display for SensorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorOutcome::NoLight => write!(f, "no light"),
            SensorOutcome::LowIntensity { received, required } => {
                write!(f, "intensity {:.2} below required {:.2}", received, required)
            }
            SensorOutcome::WrongPolarization { fidelity, .. } => {
                write!(f, "wrong polarization (fidelity {:.4})", fidelity)
            }
            SensorOutcome::Activated { received, .. } => write!(f, "activated at intensity {:.2}", received),
        }
    }
}

/// Plain sensor: enough intensity and, if a requirement is given, the right polarization.
pub fn evaluate_sensor(
    required_intensity: f64,
    requirement: Option<&PolarizationMatch>,
    received: &StokesVector,
) -> SensorOutcome {
    let intensity = received.intensity();
    if intensity < DARK_EPSILON {
        return SensorOutcome::NoLight;
    }
    if intensity < required_intensity {
        return SensorOutcome::LowIntensity { received: intensity, required: required_intensity };
    }
    match requirement {
        None => SensorOutcome::Activated { received: intensity, fidelity: None },
        Some(req) => {
            let fidelity = req.fidelity(received);
            if req.is_satisfied_by(received) {
                SensorOutcome::Activated { received: intensity, fidelity: Some(fidelity) }
            } else {
                SensorOutcome::WrongPolarization { received: intensity, fidelity }
            }
        }
    }
}

/// Result of evaluating a quantum lock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LockOutcome {
    NoLight,
    LowIntensity { received: f64, required: f64 },
    LowFidelity { fidelity: f64, required: f64 },
    Unlocked { fidelity: f64 },
}

impl LockOutcome {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, LockOutcome::Unlocked { .. })
    }

    pub fn fidelity(&self) -> Option<f64> {
        match *self {
            LockOutcome::LowFidelity { fidelity, .. } | LockOutcome::Unlocked { fidelity } => Some(fidelity),
            _ => None,
        }
    }
}

impl fmt::Display for LockOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockOutcome::NoLight => write!(f, "no light reaches the lock"),
            LockOutcome::LowIntensity { received, required } => {
                write!(f, "intensity {:.2} below required {:.2}", received, required)
            }
            LockOutcome::LowFidelity { fidelity, required } => {
                write!(f, "fidelity {:.4} below required {:.4}", fidelity, required)
            }
            LockOutcome::Unlocked { fidelity } => write!(f, "unlocked at fidelity {:.4}", fidelity),
        }
    }
}

/// Quantum lock: the checks run in order and the first failing one is reported.
pub fn evaluate_lock(
    target: &JonesVector,
    required_intensity: f64,
    fidelity_threshold: f64,
    received: &StokesVector,
) -> LockOutcome {
    let intensity = received.intensity();
    if intensity < DARK_EPSILON {
        return LockOutcome::NoLight;
    }
    if intensity < required_intensity {
        return LockOutcome::LowIntensity { received: intensity, required: required_intensity };
    }
    let fidelity = stokes_fidelity(target, received);
    if fidelity >= fidelity_threshold {
        LockOutcome::Unlocked { fidelity }
    } else {
        LockOutcome::LowFidelity { fidelity, required: fidelity_threshold }
    }
}

/// Which output of an interferometer a target watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortRole {
    #[default]
    Bright,
    Dark,
}

impl PortRole {
    /// Acceptance band used when the level gives none.
    pub fn default_band(self) -> IntensityBand {
        match self {
            PortRole::Bright => IntensityBand { min: 90.0, max: 100.0 },
            PortRole::Dark => IntensityBand { min: 0.0, max: 10.0 },
        }
    }
}

/// Closed acceptance interval `[min, max]` on a port intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityBand {
    pub min: f64,
    pub max: f64,
}

impl IntensityBand {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        let band = Self { min, max };
        band.validate()?;
        Ok(band)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("band.min", self.min)?;
        ensure_finite("band.max", self.max)?;
        if self.min > self.max {
            return Err(OpticsError::InvalidParameter {
                field: "band".to_string(),
                message: format!("min {} exceeds max {}", self.min, self.max),
            });
        }
        Ok(())
    }

    pub fn contains(&self, intensity: f64) -> bool {
        (self.min..=self.max).contains(&intensity)
    }
}

/// Joint reading of a bright and a dark port.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterferometerReading {
    pub bright_intensity: f64,
    pub dark_intensity: f64,
    pub bright_ok: bool,
    pub dark_ok: bool,
    /// `bright / dark`; infinite when the dark port is dark and the bright one is lit.
    pub contrast_ratio: f64,
    /// `(Imax − Imin) / (Imax + Imin)`; 0 when both ports are dark.
    pub visibility: f64,
}

impl InterferometerReading {
    /// Both bands hold. Contrast and visibility are diagnostics only.
    pub fn is_satisfied(&self) -> bool {
        self.bright_ok && self.dark_ok
    }
}

pub fn evaluate_interferometer(
    bright_intensity: f64,
    bright_band: &IntensityBand,
    dark_intensity: f64,
    dark_band: &IntensityBand,
) -> InterferometerReading {
    let contrast_ratio = if dark_intensity < DARK_EPSILON {
        if bright_intensity < DARK_EPSILON { 0.0 } else { f64::INFINITY }
    } else {
        bright_intensity / dark_intensity
    };
    let (hi, lo) = (bright_intensity.max(dark_intensity), bright_intensity.min(dark_intensity));
    let visibility = if hi + lo < DARK_EPSILON { 0.0 } else { (hi - lo) / (hi + lo) };
    InterferometerReading {
        bright_intensity,
        dark_intensity,
        bright_ok: bright_band.contains(bright_intensity),
        dark_ok: dark_band.contains(dark_intensity),
        contrast_ratio,
        visibility,
    }
}

/// Polarization that keeps a mine quiet even when light reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeState {
    pub target: JonesVector,
    /// Minimum fidelity to `target` for the light to count as safe.
    #[serde(default = "default_safe_tolerance")]
    pub tolerance: f64,
}

impl SafeState {
    pub fn new(target: JonesVector, tolerance: f64) -> Result<Self> {
        let state = Self { target, tolerance };
        state.validate()?;
        Ok(state)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_target("mine.safeState.target", &self.target)?;
        ensure_unit_interval("mine.safeState.tolerance", self.tolerance).map(|_| ())
    }
}

/// Result of evaluating an optical mine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MineOutcome {
    /// No light at all.
    Dormant,
    /// Light present but under the threshold or in the safe state.
    Quiet { intensity: f64, fidelity: Option<f64> },
    Triggered { intensity: f64, fidelity: Option<f64> },
}

impl MineOutcome {
    pub fn is_triggered(&self) -> bool {
        matches!(self, MineOutcome::Triggered { .. })
    }

    pub fn fidelity(&self) -> Option<f64> {
        match *self {
            MineOutcome::Quiet { fidelity, .. } | MineOutcome::Triggered { fidelity, .. } => fidelity,
            MineOutcome::Dormant => None,
        }
    }
}

impl fmt::Display for MineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MineOutcome::Dormant => write!(f, "dormant"),
            MineOutcome::Quiet { intensity, .. } => write!(f, "quiet at intensity {:.2}", intensity),
            MineOutcome::Triggered { intensity, .. } => write!(f, "TRIGGERED at intensity {:.2}", intensity),
        }
    }
}

/// Triggered only when `intensity ≥ threshold` and the light is not in the safe state.
pub fn evaluate_mine(trigger_threshold: f64, safe_state: Option<&SafeState>, received: &StokesVector) -> MineOutcome {
    let intensity = received.intensity();
    if intensity < DARK_EPSILON {
        return MineOutcome::Dormant;
    }
    let fidelity = safe_state.map(|safe| stokes_fidelity(&safe.target, received));
    let unsafe_light = match (safe_state, fidelity) {
        (Some(safe), Some(f)) => f < safe.tolerance,
        _ => true,
    };
    if intensity >= trigger_threshold && unsafe_light {
        MineOutcome::Triggered { intensity, fidelity }
    } else {
        MineOutcome::Quiet { intensity, fidelity }
    }
}

/// What a detector component made of the light it received.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "detector", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DetectorReading {
    Sensor(SensorOutcome),
    QuantumLock(LockOutcome),
    Port { role: PortRole, intensity: f64, within_band: bool },
    Mine(MineOutcome),
}

impl DetectorReading {
    /// Sensor activated, lock open, port within its band, or mine triggered.
    pub fn is_activated(&self) -> bool {
        match self {
            DetectorReading::Sensor(outcome) => outcome.is_activated(),
            DetectorReading::QuantumLock(outcome) => outcome.is_unlocked(),
            DetectorReading::Port { within_band, .. } => *within_band,
            DetectorReading::Mine(outcome) => outcome.is_triggered(),
        }
    }

    pub fn fidelity(&self) -> Option<f64> {
        match self {
            DetectorReading::Sensor(outcome) => outcome.fidelity(),
            DetectorReading::QuantumLock(outcome) => outcome.fidelity(),
            DetectorReading::Port { .. } => None,
            DetectorReading::Mine(outcome) => outcome.fidelity(),
        }
    }
}

/// Runs the matching evaluator for a detector kind; `None` for non-detectors.
pub fn read_detector(kind: &ComponentKind, received: &StokesVector) -> Option<DetectorReading> {
    match kind {
        ComponentKind::Sensor { required_intensity, polarization } => Some(DetectorReading::Sensor(
            evaluate_sensor(*required_intensity, polarization.as_ref(), received),
        )),
        ComponentKind::QuantumLock { target, required_intensity, fidelity_threshold } => Some(
            DetectorReading::QuantumLock(evaluate_lock(target, *required_intensity, *fidelity_threshold, received)),
        ),
        ComponentKind::InterferometerTarget { role, band } => Some(DetectorReading::Port {
            role: *role,
            intensity: received.intensity(),
            within_band: band.contains(received.intensity()),
        }),
        ComponentKind::OpticalMine { trigger_threshold, safe_state } => Some(DetectorReading::Mine(evaluate_mine(
            *trigger_threshold,
            safe_state.as_ref(),
            received,
        ))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light(v: JonesVector, intensity: f64) -> StokesVector {
        v.with_intensity(intensity).to_stokes()
    }

    #[test]
    fn test_sensor_outcomes_in_order() {
        let req = PolarizationMatch::AngleTolerance { angle: Angle::new(45.0), tolerance: 10.0 };
        assert_eq!(evaluate_sensor(50.0, Some(&req), &StokesVector::zero()), SensorOutcome::NoLight);
        assert!(matches!(
            evaluate_sensor(50.0, Some(&req), &light(JonesVector::diagonal(), 20.0)),
            SensorOutcome::LowIntensity { .. }
        ));
        assert!(matches!(
            evaluate_sensor(50.0, Some(&req), &light(JonesVector::horizontal(), 80.0)),
            SensorOutcome::WrongPolarization { .. }
        ));
        let ok = evaluate_sensor(50.0, Some(&req), &light(JonesVector::linear(Angle::new(52.0)), 80.0));
        assert!(ok.is_activated());
        assert!(evaluate_sensor(50.0, None, &light(JonesVector::vertical(), 60.0)).is_activated());
    }

    #[test]
    fn test_angle_window_rejects_circular_light() {
        let req = PolarizationMatch::AngleTolerance { angle: Angle::HORIZONTAL, tolerance: 10.0 };
        assert!(!req.is_satisfied_by(&JonesVector::right_circular().to_stokes()));
        assert!(!req.is_satisfied_by(&StokesVector::unpolarized(1.0)));
    }

    #[test]
    fn test_angle_window_ignores_nearly_unpolarized_light() {
        let req = PolarizationMatch::AngleTolerance { angle: Angle::HORIZONTAL, tolerance: 10.0 };
        // a trace of horizontal light on a large unpolarized background
        let faint = StokesVector::unpolarized(100.0) + light(JonesVector::horizontal(), 1e-6);
        assert!(faint.degree_of_polarization() > 0.0);
        assert!(!req.is_satisfied_by(&faint));
        let strong = StokesVector::unpolarized(100.0) + light(JonesVector::horizontal(), 50.0);
        assert!(req.is_satisfied_by(&strong));
    }

    #[test]
    fn test_non_finite_requirements_are_rejected() {
        let req = PolarizationMatch::AngleTolerance { angle: Angle::new(f64::NAN), tolerance: 10.0 };
        assert!(matches!(req.validate(), Err(OpticsError::NonFinite { .. })));
        let target = JonesVector::horizontal().scaled(f64::INFINITY);
        assert!(matches!(ensure_target("target", &target), Err(OpticsError::NonFinite { .. })));
    }

    #[test]
    fn test_fidelity_match_strategy() {
        let req = PolarizationMatch::Fidelity { target: JonesVector::right_circular(), threshold: 0.95 };
        assert!(req.is_satisfied_by(&JonesVector::right_circular().to_stokes()));
        assert!(!req.is_satisfied_by(&JonesVector::horizontal().to_stokes()));
        let bad = PolarizationMatch::Fidelity { target: JonesVector::dark(), threshold: 0.9 };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_lock_outcomes() {
        let target = JonesVector::right_circular();
        assert_eq!(evaluate_lock(&target, 10.0, 0.99, &StokesVector::zero()), LockOutcome::NoLight);
        assert!(matches!(
            evaluate_lock(&target, 10.0, 0.99, &light(target, 5.0)),
            LockOutcome::LowIntensity { .. }
        ));
        let low = evaluate_lock(&target, 10.0, 0.99, &light(JonesVector::horizontal(), 50.0));
        assert!(matches!(low, LockOutcome::LowFidelity { .. }));
        assert!((low.fidelity().unwrap() - 0.5).abs() < 1e-9);
        assert!(evaluate_lock(&target, 10.0, 0.99, &light(target, 50.0)).is_unlocked());
    }

    #[test]
    fn test_interferometer_diagnostics() {
        let bright = PortRole::Bright.default_band();
        let dark = PortRole::Dark.default_band();
        let reading = evaluate_interferometer(100.0, &bright, 0.0, &dark);
        assert!(reading.is_satisfied());
        assert!(reading.contrast_ratio.is_infinite());
        assert!((reading.visibility - 1.0).abs() < 1e-12);

        let washed = evaluate_interferometer(50.0, &bright, 50.0, &dark);
        assert!(!washed.is_satisfied());
        assert!((washed.contrast_ratio - 1.0).abs() < 1e-12);
        assert!(washed.visibility.abs() < 1e-12);

        assert!(IntensityBand::new(5.0, 1.0).is_err());
    }

    #[test]
    fn test_read_detector_dispatches_on_kind() {
        let lock = ComponentKind::QuantumLock {
            target: JonesVector::vertical(),
            required_intensity: 1.0,
            fidelity_threshold: 0.99,
        };
        let reading = read_detector(&lock, &light(JonesVector::vertical(), 10.0)).unwrap();
        assert!(reading.is_activated());
        assert!((reading.fidelity().unwrap() - 1.0).abs() < 1e-9);

        let port = ComponentKind::port(PortRole::Dark);
        let reading = read_detector(&port, &StokesVector::zero()).unwrap();
        assert!(reading.is_activated());
        assert_eq!(reading.fidelity(), None);

        assert!(read_detector(&ComponentKind::Rotator { amount: 10.0 }, &StokesVector::zero()).is_none());
    }

    #[test]
    fn test_mine_needs_threshold_and_unsafe_light() {
        let safe = SafeState::new(JonesVector::vertical(), 0.9).unwrap();
        assert_eq!(evaluate_mine(10.0, Some(&safe), &StokesVector::zero()), MineOutcome::Dormant);
        assert!(!evaluate_mine(10.0, Some(&safe), &light(JonesVector::vertical(), 50.0)).is_triggered());
        assert!(!evaluate_mine(10.0, Some(&safe), &light(JonesVector::horizontal(), 5.0)).is_triggered());
        assert!(evaluate_mine(10.0, Some(&safe), &light(JonesVector::horizontal(), 50.0)).is_triggered());
        assert!(evaluate_mine(10.0, None, &light(JonesVector::vertical(), 50.0)).is_triggered());
    }
}
