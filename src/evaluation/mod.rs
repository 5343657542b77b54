// src/evaluation/mod.rs

//! Fidelity measures and the evaluators that turn received light into
//! sensor, lock, interferometer and mine outcomes, plus the aggregate
//! victory check over a whole level.
//!
//! Evaluation never fails for lack of light or a wrong polarization: those
//! are typed outcomes (`SensorOutcome`, `LockOutcome`, ...) the UI can turn
//! into guidance. Errors are reserved for conditions that reference
//! components the layout does not contain.

pub mod detectors;
pub mod victory;

pub use detectors::{
    evaluate_interferometer, evaluate_lock, evaluate_mine, evaluate_sensor, read_detector, DetectorReading,
    IntensityBand, InterferometerReading, LockOutcome, MineOutcome, PolarizationMatch, PortRole, SafeState,
    SensorOutcome,
};
pub use victory::{evaluate_victory, ConditionReport, LogicGate, VictoryCondition, VictoryConditions, VictoryResult};

use crate::core::{abs2, JonesVector, StokesVector};

/// Overlap `|⟨t|i⟩|²` of the normalized states, in `[0, 1]`.
///
/// Global phase and intensity do not matter. Returns 0 if either state is dark.
///
/// # Examples
/// ```
/// use polarcraft::core::JonesVector;
/// use polarcraft::evaluation::fidelity;
///
/// let h = JonesVector::horizontal();
/// assert!((fidelity(&h, &h) - 1.0).abs() < 1e-12);
/// assert!(fidelity(&JonesVector::right_circular(), &JonesVector::left_circular()) < 1e-12);
/// ```
pub fn fidelity(target: &JonesVector, input: &JonesVector) -> f64 {
    match (target.normalized(), input.normalized()) {
        (Some(t), Some(i)) => abs2(t.inner(&i)).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Fidelity of possibly partially polarized light against a pure target:
/// `(1 + t̂ · s / s0) / 2` on the Poincaré sphere.
///
/// Agrees with `fidelity` when `stokes` comes from a Jones vector; fully
/// unpolarized light scores 0.5 against any target.
pub fn stokes_fidelity(target: &JonesVector, stokes: &StokesVector) -> f64 {
    if target.is_dark() || stokes.is_dark() {
        return 0.0;
    }
    let t = target.to_stokes().poincare();
    let s = stokes.poincare();
    let dot: f64 = t.iter().zip(s.iter()).map(|(a, b)| a * b).sum();
    ((1.0 + dot) / 2.0).clamp(0.0, 1.0)
}
