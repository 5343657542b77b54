// src/validation/mod.rs

//! Provides functions to check states, layouts and whole levels at the
//! construction boundary, before anything is traced.

use crate::circuits::Layout;
use crate::core::{JonesVector, OpticsError, Result, StokesVector};
use crate::evaluation::VictoryConditions;
use crate::simulation::TracerConfig;
use std::collections::BTreeSet;

// Default tolerance values (can be overridden by caller)
const DEFAULT_NORM_TOLERANCE: f64 = 1e-9;
const DEFAULT_STOKES_TOLERANCE: f64 = 1e-9;
const DEFAULT_ENERGY_TOLERANCE: f64 = 1e-9;

/// Checks that a Jones vector has unit intensity (`|Ex|² + |Ey|² ≈ 1`).
///
/// # Arguments
/// * `state` - The `JonesVector` to check.
/// * `tolerance` - Allowed deviation from 1.0. Defaults to 1e-9.
///
/// # Returns
/// * `Ok(())` if normalized within tolerance.
/// * `Err(OpticsError::InvalidParameter)` otherwise.
pub fn check_normalization(state: &JonesVector, tolerance: Option<f64>) -> Result<()> {
    let effective_tolerance = tolerance.unwrap_or(DEFAULT_NORM_TOLERANCE);
    let intensity = state.intensity();
    if (intensity - 1.0).abs() > effective_tolerance {
        Err(OpticsError::InvalidParameter {
            field: "jones".to_string(),
            message: format!("intensity {} deviates from 1 by more than {}", intensity, effective_tolerance),
        })
    } else {
        Ok(())
    }
}

/// Checks `s1² + s2² + s3² ≤ s0²` with a relative tolerance.
///
/// Stokes vectors produced by chained Mueller matrices can drift past the
/// bound by rounding; this is the check to run on them before display.
pub fn check_stokes_realizable(stokes: &StokesVector, tolerance: Option<f64>) -> Result<()> {
    let effective_tolerance = tolerance.unwrap_or(DEFAULT_STOKES_TOLERANCE);
    let polarized = stokes.polarized_intensity();
    let total = stokes.s0();
    if total < 0.0 || polarized > total * (1.0 + effective_tolerance) + effective_tolerance {
        Err(OpticsError::UnphysicalStokes { polarized, total })
    } else {
        Ok(())
    }
}

/// Checks that output intensities add up to the input intensity, as they must
/// for a lossless element such as a splitter.
///
/// # Arguments
/// * `input` - Intensity entering the element.
/// * `outputs` - Intensities of every output port.
/// * `tolerance` - Allowed relative deviation. Defaults to 1e-9.
pub fn check_energy_conservation(input: f64, outputs: &[f64], tolerance: Option<f64>) -> Result<()> {
    let effective_tolerance = tolerance.unwrap_or(DEFAULT_ENERGY_TOLERANCE);
    let total: f64 = outputs.iter().sum();
    let scale = input.abs().max(1.0);
    if (total - input).abs() > effective_tolerance * scale {
        Err(OpticsError::InvalidParameter {
            field: "intensity".to_string(),
            message: format!("outputs carry {} but input was {}", total, input),
        })
    } else {
        Ok(())
    }
}

/// Re-checks every component of a layout: grid bounds, parameter ranges and id uniqueness.
///
/// `Layout` values built through `Layout::new` or JSON already satisfy these;
/// this is for callers that want an explicit report before tracing.
/// A layout without emitters is valid but logged, since nothing will light up.
pub fn validate_layout(layout: &Layout) -> Result<()> {
    let mut seen = BTreeSet::new();
    for component in layout.components() {
        if !seen.insert(component.id()) {
            return Err(OpticsError::DuplicateComponent(component.id().clone()));
        }
        let position = component.position();
        if !position.is_finite() || !position.in_grid() {
            return Err(OpticsError::OutOfGrid { id: component.id().clone(), x: position.x, y: position.y });
        }
        component.kind().validate()?;
    }
    if layout.emitters().next().is_none() && !layout.is_empty() {
        log::warn!("layout has {} components but no emitter", layout.len());
    }
    Ok(())
}

/// Performs all checks for a playable level.
///
/// # Arguments
/// * `layout` - The components of the level.
/// * `conditions` - Its victory conditions, checked against `layout`.
/// * `config` - The tracer settings the level will run with.
///
/// # Returns
/// * `Ok(())` if all checks pass.
/// * The first `OpticsError` found otherwise.
pub fn validate_level(layout: &Layout, conditions: &VictoryConditions, config: &TracerConfig) -> Result<()> {
    config.validate()?;
    validate_layout(layout)?;
    conditions.validate(layout)?;
    if conditions.conditions.is_empty() {
        log::warn!("level has no victory conditions; it is won without any light");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::{ComponentKind, LayoutBuilder};
    use crate::core::Angle;
    use crate::evaluation::VictoryCondition;
    use crate::operations::{split_polarizing, SplitterMode};

    #[test]
    fn test_check_normalization() {
        assert!(check_normalization(&JonesVector::right_circular(), None).is_ok());
        assert!(check_normalization(&JonesVector::horizontal().scaled(2.0), None).is_err());
        assert!(check_normalization(&JonesVector::horizontal().with_intensity(1.05), Some(0.1)).is_ok());
    }

    #[test]
    fn test_stokes_realizability() -> Result<()> {
        let partial = StokesVector::new(2.0, 1.0, 0.5, 0.0)?;
        assert!(check_stokes_realizable(&partial, None).is_ok());
        assert!(check_stokes_realizable(&JonesVector::diagonal().to_stokes(), None).is_ok());
        Ok(())
    }

    #[test]
    fn test_splitter_conserves_energy() {
        let input = JonesVector::linear(Angle::new(33.0)).scaled(3.0);
        let (o, e) = split_polarizing(&input, Angle::new(10.0));
        assert!(check_energy_conservation(input.intensity(), &[o.intensity(), e.intensity()], None).is_ok());
        assert!(check_energy_conservation(1.0, &[0.4, 0.4], None).is_err());
    }

    #[test]
    fn test_validate_level_references() -> Result<()> {
        let layout = LayoutBuilder::new()
            .place("s", 50.0, 50.0, ComponentKind::Sensor { required_intensity: 0.0, polarization: None })
            .place("bs", 20.0, 50.0, ComponentKind::Splitter { mode: SplitterMode::default() })
            .build()?;
        let config = TracerConfig::default();
        let good = VictoryConditions::new(vec![VictoryCondition::SensorActive { sensor: "s".into() }]);
        assert!(validate_level(&layout, &good, &config).is_ok());
        let unknown = VictoryConditions::new(vec![VictoryCondition::SensorActive { sensor: "x".into() }]);
        assert_eq!(validate_level(&layout, &unknown, &config), Err(OpticsError::UnknownComponent("x".into())));
        let not_a_sensor = VictoryConditions::new(vec![VictoryCondition::SensorActive { sensor: "bs".into() }]);
        assert!(validate_level(&layout, &not_a_sensor, &config).is_err());
        Ok(())
    }
}
