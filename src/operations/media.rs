// src/operations/media.rs

//! Parameters of wave plates and rotators derived from physical media.

use super::{rotator, wave_plate};
use crate::core::constants::material_constants::{
    FRUCTOSE_SPECIFIC_ROTATION, GLUCOSE_SPECIFIC_ROTATION, LACTOSE_SPECIFIC_ROTATION, SUCROSE_SPECIFIC_ROTATION,
};
use crate::core::error::{ensure_finite, ensure_non_negative, OpticsError, Result};
use crate::core::{Angle, JonesMatrix};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Phase retardation in degrees, in `[0, 360)`, between the o- and e-rays after
/// `thickness_mm` of a crystal with birefringence `delta_n`:
/// `Δφ = (2π / λ)·Δn·d`.
///
/// The result feeds `ComponentKind::WavePlate::retardance` directly.
pub fn crystal_retardance(delta_n: f64, thickness_mm: f64, wavelength_nm: f64) -> Result<f64> {
    ensure_finite("crystal.birefringence", delta_n)?;
    ensure_non_negative("crystal.thickness", thickness_mm)?;
    ensure_finite("crystal.wavelength", wavelength_nm)?;
    if wavelength_nm <= 0.0 {
        return Err(OpticsError::InvalidParameter {
            field: "crystal.wavelength".to_string(),
            message: format!("wavelength must be positive, got {} nm", wavelength_nm),
        });
    }
    let phase = 2.0 * PI / (wavelength_nm * 1e-9) * delta_n * (thickness_mm * 1e-3);
    Ok(phase.to_degrees().rem_euclid(360.0))
}

/// Wave plate cut from a crystal of the given thickness.
pub fn crystal_plate(fast_axis: Angle, delta_n: f64, thickness_mm: f64, wavelength_nm: f64) -> Result<JonesMatrix> {
    let retardance = crystal_retardance(delta_n, thickness_mm, wavelength_nm)?;
    Ok(wave_plate(fast_axis, retardance.to_radians()))
}

/// Optically active solutes with tabulated specific rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solute {
    Sucrose,
    Fructose,
    Glucose,
    Lactose,
}

impl Solute {
    pub const ALL: [Solute; 4] = [Solute::Sucrose, Solute::Fructose, Solute::Glucose, Solute::Lactose];

    /// Specific rotation in deg·mL/(g·dm); negative is levorotatory.
    pub fn specific_rotation(self) -> f64 {
        match self {
            Solute::Sucrose => SUCROSE_SPECIFIC_ROTATION,
            Solute::Fructose => FRUCTOSE_SPECIFIC_ROTATION,
            Solute::Glucose => GLUCOSE_SPECIFIC_ROTATION,
            Solute::Lactose => LACTOSE_SPECIFIC_ROTATION,
        }
    }

    /// Rotation through `path_length_dm` of solution at `concentration` g/mL.
    pub fn rotation(self, path_length_dm: f64, concentration: f64) -> Result<f64> {
        optical_rotation(self.specific_rotation(), path_length_dm, concentration)
    }
}

impl fmt::Display for Solute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Solute::Sucrose => "sucrose",
            Solute::Fructose => "fructose",
            Solute::Glucose => "glucose",
            Solute::Lactose => "lactose",
        };
        write!(f, "{}", name)
    }
}

/// Biot's law `α = [α]·l·c`, in degrees; the value feeds `ComponentKind::Rotator::amount`.
pub fn optical_rotation(specific_rotation: f64, path_length_dm: f64, concentration: f64) -> Result<f64> {
    ensure_finite("solution.specificRotation", specific_rotation)?;
    let length = ensure_non_negative("solution.pathLength", path_length_dm)?;
    let concentration = ensure_non_negative("solution.concentration", concentration)?;
    Ok(specific_rotation * length * concentration)
}

/// Rotator equivalent to a sample cell of `solute`.
pub fn solution_rotator(solute: Solute, path_length_dm: f64, concentration: f64) -> Result<JonesMatrix> {
    Ok(rotator(solute.rotation(path_length_dm, concentration)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::material_constants::{CALCITE_N_E, CALCITE_N_O, DEFAULT_WAVELENGTH_NM};
    use crate::core::JonesVector;
    use crate::operations::quarter_wave_plate;

    #[test]
    fn test_calcite_retardance_wraps_into_one_turn() {
        let delta_n = CALCITE_N_O - CALCITE_N_E;
        // one wavelength of path difference is a full turn
        let full_turn_mm = DEFAULT_WAVELENGTH_NM * 1e-6 / delta_n;
        let full = crystal_retardance(delta_n, full_turn_mm, DEFAULT_WAVELENGTH_NM).unwrap();
        assert!(full < 1e-6 || full > 360.0 - 1e-6);
        let quarter = crystal_retardance(delta_n, full_turn_mm / 4.0, DEFAULT_WAVELENGTH_NM).unwrap();
        assert!((quarter - 90.0).abs() < 1e-6);
        let thick = crystal_retardance(delta_n, full_turn_mm * 2.25, DEFAULT_WAVELENGTH_NM).unwrap();
        assert!((thick - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_quarter_wave_crystal_matches_ideal_plate() {
        let delta_n = CALCITE_N_O - CALCITE_N_E;
        let thickness = DEFAULT_WAVELENGTH_NM * 1e-6 / delta_n / 4.0;
        let plate = crystal_plate(Angle::DIAGONAL, delta_n, thickness, DEFAULT_WAVELENGTH_NM).unwrap();
        assert!(plate.approx_eq(&quarter_wave_plate(Angle::DIAGONAL), 1e-6));
    }

    #[test]
    fn test_sucrose_solution_rotates_linear_light() {
        let amount = Solute::Sucrose.rotation(2.0, 0.25).unwrap();
        assert!((amount - 33.25).abs() < 1e-9);
        let out = solution_rotator(Solute::Sucrose, 2.0, 0.25).unwrap().apply(&JonesVector::horizontal());
        assert!(out.approx_eq_up_to_phase(&JonesVector::linear(Angle::new(33.25)), 1e-9));
        assert!(Solute::Fructose.rotation(1.0, 0.1).unwrap() < 0.0);
    }

    #[test]
    fn test_rejects_unphysical_media() {
        assert!(crystal_retardance(0.172, -1.0, 550.0).is_err());
        assert!(crystal_retardance(0.172, 1.0, 0.0).is_err());
        assert!(matches!(optical_rotation(f64::NAN, 1.0, 0.1), Err(OpticsError::NonFinite { .. })));
        assert!(optical_rotation(66.5, 1.0, -0.1).is_err());
    }
}
