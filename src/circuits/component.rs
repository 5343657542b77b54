// src/circuits/component.rs

//! Placed optical components.
//!
//! `ComponentKind` is a closed sum type: every variant carries exactly the
//! parameters its element needs, and the tracer dispatches on it with an
//! exhaustive `match`. Parameters missing from level JSON take the
//! documented defaults; values that are present but malformed are rejected
//! when the component is constructed.

use crate::core::constants::optics_constants::{
    DEFAULT_EMITTER_INTENSITY, DEFAULT_LOCK_FIDELITY, DEFAULT_PHASE_SHIFT_DEG, DEFAULT_RETARDANCE_DEG,
    DEFAULT_ROTATION_DEG, MIRROR_TOLERANCE_DEG,
};
use crate::core::error::{ensure_finite, ensure_non_negative, ensure_unit_interval, OpticsError, Result};
use crate::core::{Angle, ComponentId, Direction, Handedness, JonesVector, Position};
use crate::evaluation::detectors::ensure_target;
use crate::evaluation::{IntensityBand, PolarizationMatch, PortRole, SafeState};
use crate::operations::{OpticalElement, SplitterMode};
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_direction() -> Direction {
    Direction::Right
}

fn default_emitter_intensity() -> f64 {
    DEFAULT_EMITTER_INTENSITY
}

fn default_mirror_angle() -> Angle {
    Angle::DIAGONAL
}

fn default_retardance() -> f64 {
    DEFAULT_RETARDANCE_DEG
}

fn default_rotation() -> f64 {
    DEFAULT_ROTATION_DEG
}

fn default_phase() -> f64 {
    DEFAULT_PHASE_SHIFT_DEG
}

fn default_lock_fidelity() -> f64 {
    DEFAULT_LOCK_FIDELITY
}

/// Polarization emitted by a source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EmitterPolarization {
    Linear {
        #[serde(default)]
        angle: Angle,
    },
    Circular {
        #[serde(default)]
        handedness: Handedness,
    },
    /// Arbitrary pure state; only its shape is used, the emitter sets the intensity.
    Jones { state: JonesVector },
    /// Modelled as mutually incoherent H and V beams of half intensity each.
    Unpolarized,
}

impl Default for EmitterPolarization {
    fn default() -> Self {
        EmitterPolarization::Linear { angle: Angle::HORIZONTAL }
    }
}

impl EmitterPolarization {
    /// The mutually incoherent beams an emitter of `intensity` launches.
    pub fn beams(&self, intensity: f64) -> Vec<JonesVector> {
        match *self {
            EmitterPolarization::Linear { angle } => vec![JonesVector::linear(angle).with_intensity(intensity)],
            EmitterPolarization::Circular { handedness } => {
                vec![JonesVector::circular(handedness).with_intensity(intensity)]
            }
            EmitterPolarization::Jones { state } => vec![state.with_intensity(intensity)],
            EmitterPolarization::Unpolarized => vec![
                JonesVector::horizontal().with_intensity(intensity / 2.0),
                JonesVector::vertical().with_intensity(intensity / 2.0),
            ],
        }
    }
}

/// What a component is, with only the parameters that kind needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ComponentKind {
    Emitter {
        #[serde(default = "default_direction")]
        direction: Direction,
        #[serde(default = "default_emitter_intensity")]
        intensity: f64,
        #[serde(default)]
        polarization: EmitterPolarization,
    },
    Polarizer {
        #[serde(default)]
        angle: Angle,
    },
    /// Reflects only at 45° or 135° (±5°); any other angle absorbs.
    Mirror {
        #[serde(default = "default_mirror_angle")]
        angle: Angle,
    },
    Splitter {
        #[serde(default)]
        mode: SplitterMode,
    },
    Rotator {
        #[serde(default = "default_rotation")]
        amount: f64,
    },
    HalfWavePlate {
        #[serde(default)]
        fast_axis: Angle,
    },
    QuarterWavePlate {
        #[serde(default)]
        fast_axis: Angle,
    },
    WavePlate {
        #[serde(default)]
        fast_axis: Angle,
        #[serde(default = "default_retardance")]
        retardance: f64,
    },
    PhaseShifter {
        #[serde(default = "default_phase")]
        phase: f64,
    },
    CircularFilter {
        #[serde(default)]
        handedness: Handedness,
    },
    Sensor {
        #[serde(default)]
        required_intensity: f64,
        #[serde(default)]
        polarization: Option<PolarizationMatch>,
    },
    QuantumLock {
        target: JonesVector,
        #[serde(default)]
        required_intensity: f64,
        #[serde(default = "default_lock_fidelity")]
        fidelity_threshold: f64,
    },
    InterferometerTarget {
        #[serde(default)]
        role: PortRole,
        band: IntensityBand,
    },
    OpticalMine {
        #[serde(default)]
        trigger_threshold: f64,
        #[serde(default)]
        safe_state: Option<SafeState>,
    },
    /// A transmissive element whose identity is hidden from the player.
    MysteryBox { hidden: OpticalElement },
}

impl ComponentKind {
    /// Interferometer port with its role's default acceptance band.
    pub fn port(role: PortRole) -> Self {
        ComponentKind::InterferometerTarget { role, band: role.default_band() }
    }

    /// Mystery box hiding a deterministically drawn element.
    pub fn mystery_box(seed: u64) -> Self {
        ComponentKind::MysteryBox { hidden: OpticalElement::random(seed) }
    }

    pub fn is_emitter(&self) -> bool {
        matches!(self, ComponentKind::Emitter { .. })
    }

    /// Terminal components that accumulate light into a `SensorState`.
    pub fn is_detector(&self) -> bool {
        matches!(
            self,
            ComponentKind::Sensor { .. }
                | ComponentKind::QuantumLock { .. }
                | ComponentKind::InterferometerTarget { .. }
                | ComponentKind::OpticalMine { .. }
        )
    }

    /// The single-beam Jones operator of transmissive kinds.
    pub fn element(&self) -> Option<OpticalElement> {
        match *self {
            ComponentKind::Polarizer { angle } => Some(OpticalElement::Polarizer { angle }),
            ComponentKind::Rotator { amount } => Some(OpticalElement::Rotator { amount }),
            ComponentKind::HalfWavePlate { fast_axis } => Some(OpticalElement::HalfWavePlate { fast_axis }),
            ComponentKind::QuarterWavePlate { fast_axis } => Some(OpticalElement::QuarterWavePlate { fast_axis }),
            ComponentKind::WavePlate { fast_axis, retardance } => {
                Some(OpticalElement::WavePlate { fast_axis, retardance })
            }
            ComponentKind::PhaseShifter { phase } => Some(OpticalElement::PhaseShifter { phase }),
            ComponentKind::CircularFilter { handedness } => Some(OpticalElement::CircularFilter { handedness }),
            ComponentKind::MysteryBox { hidden } => Some(hidden),
            ComponentKind::Emitter { .. }
            | ComponentKind::Mirror { .. }
            | ComponentKind::Splitter { .. }
            | ComponentKind::Sensor { .. }
            | ComponentKind::QuantumLock { .. }
            | ComponentKind::InterferometerTarget { .. }
            | ComponentKind::OpticalMine { .. } => None,
        }
    }

    /// Lower-camel type tag, as used in level JSON.
    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Emitter { .. } => "emitter",
            ComponentKind::Polarizer { .. } => "polarizer",
            ComponentKind::Mirror { .. } => "mirror",
            ComponentKind::Splitter { .. } => "splitter",
            ComponentKind::Rotator { .. } => "rotator",
            ComponentKind::HalfWavePlate { .. } => "halfWavePlate",
            ComponentKind::QuarterWavePlate { .. } => "quarterWavePlate",
            ComponentKind::WavePlate { .. } => "wavePlate",
            ComponentKind::PhaseShifter { .. } => "phaseShifter",
            ComponentKind::CircularFilter { .. } => "circularFilter",
            ComponentKind::Sensor { .. } => "sensor",
            ComponentKind::QuantumLock { .. } => "quantumLock",
            ComponentKind::InterferometerTarget { .. } => "interferometerTarget",
            ComponentKind::OpticalMine { .. } => "opticalMine",
            ComponentKind::MysteryBox { .. } => "mysteryBox",
        }
    }

    /// Single-character symbol for the ASCII layout map.
    pub(crate) fn glyph(&self) -> char {
        match self {
            ComponentKind::Emitter { direction, .. } => match direction {
                Direction::Up => '^',
                Direction::Down => 'v',
                Direction::Left => '<',
                Direction::Right => '>',
            },
            ComponentKind::Polarizer { .. } => 'P',
            ComponentKind::Mirror { angle } => {
                if angle.is_within(Angle::DIAGONAL, MIRROR_TOLERANCE_DEG) {
                    '/'
                } else if angle.is_within(Angle::ANTI_DIAGONAL, MIRROR_TOLERANCE_DEG) {
                    '\\'
                } else {
                    'x'
                }
            }
            ComponentKind::Splitter { .. } => '#',
            ComponentKind::Rotator { .. } => 'R',
            ComponentKind::HalfWavePlate { .. } => 'H',
            ComponentKind::QuarterWavePlate { .. } => 'Q',
            ComponentKind::WavePlate { .. } => 'W',
            ComponentKind::PhaseShifter { .. } => 'F',
            ComponentKind::CircularFilter { .. } => 'C',
            ComponentKind::Sensor { .. } => 'S',
            ComponentKind::QuantumLock { .. } => 'L',
            ComponentKind::InterferometerTarget { .. } => 'I',
            ComponentKind::OpticalMine { .. } => '*',
            ComponentKind::MysteryBox { .. } => '?',
        }
    }

    /// Checks every numeric parameter of the variant.
    pub fn validate(&self) -> Result<()> {
        match self {
            ComponentKind::Emitter { intensity, polarization, .. } => {
                ensure_non_negative("emitter.intensity", *intensity)?;
                match polarization {
                    EmitterPolarization::Linear { angle } => ensure_finite("emitter.angle", angle.degrees()).map(|_| ()),
                    EmitterPolarization::Jones { state } => ensure_target("emitter.polarization", state),
                    EmitterPolarization::Circular { .. } | EmitterPolarization::Unpolarized => Ok(()),
                }
            }
            ComponentKind::Polarizer { angle } => ensure_finite("polarizer.angle", angle.degrees()).map(|_| ()),
            ComponentKind::Mirror { angle } => ensure_finite("mirror.angle", angle.degrees()).map(|_| ()),
            ComponentKind::HalfWavePlate { fast_axis } | ComponentKind::QuarterWavePlate { fast_axis } => {
                ensure_finite("wavePlate.fastAxis", fast_axis.degrees()).map(|_| ())
            }
            ComponentKind::CircularFilter { .. } => Ok(()),
            ComponentKind::Splitter { mode } => mode.validate(),
            ComponentKind::Rotator { amount } => ensure_finite("rotator.amount", *amount).map(|_| ()),
            ComponentKind::WavePlate { fast_axis, retardance } => {
                ensure_finite("wavePlate.fastAxis", fast_axis.degrees())?;
                ensure_finite("wavePlate.retardance", *retardance).map(|_| ())
            }
            ComponentKind::PhaseShifter { phase } => ensure_finite("phaseShifter.phase", *phase).map(|_| ()),
            ComponentKind::Sensor { required_intensity, polarization } => {
                ensure_non_negative("sensor.requiredIntensity", *required_intensity)?;
                match polarization {
                    Some(requirement) => requirement.validate(),
                    None => Ok(()),
                }
            }
            ComponentKind::QuantumLock { target, required_intensity, fidelity_threshold } => {
                ensure_target("quantumLock.target", target)?;
                ensure_non_negative("quantumLock.requiredIntensity", *required_intensity)?;
                ensure_unit_interval("quantumLock.fidelityThreshold", *fidelity_threshold).map(|_| ())
            }
            ComponentKind::InterferometerTarget { band, .. } => band.validate(),
            ComponentKind::OpticalMine { trigger_threshold, safe_state } => {
                ensure_non_negative("opticalMine.triggerThreshold", *trigger_threshold)?;
                match safe_state {
                    Some(safe) => safe.validate(),
                    None => Ok(()),
                }
            }
            ComponentKind::MysteryBox { hidden } => hidden.validate(),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Emitter { direction, intensity, polarization } => {
                let pol = match polarization {
                    EmitterPolarization::Linear { angle } => format!("linear {}", angle),
                    EmitterPolarization::Circular { handedness } => format!("{} circular", handedness),
                    EmitterPolarization::Jones { state } => format!("{}", state),
                    EmitterPolarization::Unpolarized => "unpolarized".to_string(),
                };
                write!(f, "Emitter({}, {:.1}, {})", direction, intensity, pol)
            }
            ComponentKind::Mirror { angle } => write!(f, "Mirror({})", angle),
            ComponentKind::Splitter { mode } => match mode {
                SplitterMode::Polarizing { crystal_axis, orientation } => {
                    write!(f, "Splitter(polarizing, axis {}, at {})", crystal_axis, orientation)
                }
                SplitterMode::NonPolarizing { reflectance, orientation } => {
                    write!(f, "Splitter(R = {:.2}, at {})", reflectance, orientation)
                }
            },
            ComponentKind::Sensor { required_intensity, polarization } => match polarization {
                Some(PolarizationMatch::AngleTolerance { angle, tolerance }) => {
                    write!(f, "Sensor(≥ {:.1}, {} ± {:.1}°)", required_intensity, angle, tolerance)
                }
                Some(PolarizationMatch::Fidelity { target, threshold }) => {
                    write!(f, "Sensor(≥ {:.1}, F ≥ {:.3} vs {})", required_intensity, threshold, target)
                }
                None => write!(f, "Sensor(≥ {:.1})", required_intensity),
            },
            ComponentKind::QuantumLock { target, required_intensity, fidelity_threshold } => write!(
                f,
                "QuantumLock({}, ≥ {:.1}, F ≥ {:.3})",
                target, required_intensity, fidelity_threshold
            ),
            ComponentKind::InterferometerTarget { role, band } => {
                write!(f, "InterferometerTarget({:?}, [{:.1}, {:.1}])", role, band.min, band.max)
            }
            ComponentKind::OpticalMine { trigger_threshold, safe_state } => match safe_state {
                Some(safe) => write!(f, "OpticalMine(≥ {:.1}, safe {})", trigger_threshold, safe.target),
                None => write!(f, "OpticalMine(≥ {:.1})", trigger_threshold),
            },
            // the hidden element is not revealed
            ComponentKind::MysteryBox { .. } => write!(f, "MysteryBox"),
            other => match other.element() {
                Some(element) => write!(f, "{}", element),
                None => write!(f, "{}", other.name()),
            },
        }
    }
}

/// Serialized shape of a component: `{"id", "position", "type", ...params}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ComponentRecord {
    id: ComponentId,
    position: Position,
    #[serde(flatten)]
    kind: ComponentKind,
}

/// A component placed on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ComponentRecord", into = "ComponentRecord")]
pub struct OpticalComponent {
    id: ComponentId,
    position: Position,
    kind: ComponentKind,
}

impl OpticalComponent {
    /// Validates the position (finite, inside `[0, 100]²`) and the kind's parameters.
    pub fn new(id: impl Into<ComponentId>, position: Position, kind: ComponentKind) -> Result<Self> {
        let id = id.into();
        ensure_finite("position.x", position.x)?;
        ensure_finite("position.y", position.y)?;
        if !position.in_grid() {
            return Err(OpticsError::OutOfGrid { id, x: position.x, y: position.y });
        }
        kind.validate()?;
        Ok(Self { id, position, kind })
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }
}

impl TryFrom<ComponentRecord> for OpticalComponent {
    type Error = OpticsError;

    fn try_from(record: ComponentRecord) -> Result<Self> {
        OpticalComponent::new(record.id, record.position, record.kind)
    }
}

impl From<OpticalComponent> for ComponentRecord {
    fn from(component: OpticalComponent) -> Self {
        ComponentRecord { id: component.id, position: component.position, kind: component.kind }
    }
}

impl fmt::Display for OpticalComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}: {}", self.id, self.position, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_grid_and_non_finite() {
        let kind = ComponentKind::Polarizer { angle: Angle::HORIZONTAL };
        let err = OpticalComponent::new("p", Position::new(101.0, 5.0), kind).unwrap_err();
        assert!(matches!(err, OpticsError::OutOfGrid { .. }));
        let err = OpticalComponent::new("p", Position::new(f64::NAN, 5.0), kind).unwrap_err();
        assert!(matches!(err, OpticsError::NonFinite { .. }));
    }

    #[test]
    fn test_rejects_non_finite_angles() {
        let nan = Angle::new(f64::NAN);
        let kinds = [
            ComponentKind::Polarizer { angle: nan },
            ComponentKind::Mirror { angle: nan },
            ComponentKind::HalfWavePlate { fast_axis: nan },
            ComponentKind::QuarterWavePlate { fast_axis: nan },
            ComponentKind::WavePlate { fast_axis: nan, retardance: 90.0 },
            ComponentKind::Emitter {
                direction: Direction::Right,
                intensity: 100.0,
                polarization: EmitterPolarization::Linear { angle: nan },
            },
        ];
        for kind in kinds {
            let err = OpticalComponent::new("c", Position::new(5.0, 5.0), kind).unwrap_err();
            assert!(matches!(err, OpticsError::NonFinite { .. }), "{} accepted a NaN angle", kind.name());
        }
    }

    #[test]
    fn test_rejects_negative_thresholds() {
        let sensor = ComponentKind::Sensor { required_intensity: -1.0, polarization: None };
        assert!(OpticalComponent::new("s", Position::new(5.0, 5.0), sensor).is_err());
        let lock = ComponentKind::QuantumLock {
            target: JonesVector::horizontal(),
            required_intensity: 10.0,
            fidelity_threshold: 1.2,
        };
        assert!(OpticalComponent::new("l", Position::new(5.0, 5.0), lock).is_err());
    }

    #[test]
    fn test_json_defaults_fill_missing_parameters() {
        let c: OpticalComponent =
            serde_json::from_str(r#"{"id":"e1","position":{"x":0,"y":50},"type":"emitter"}"#).unwrap();
        assert_eq!(
            *c.kind(),
            ComponentKind::Emitter {
                direction: Direction::Right,
                intensity: 100.0,
                polarization: EmitterPolarization::Linear { angle: Angle::HORIZONTAL },
            }
        );
        let q: OpticalComponent = serde_json::from_str(
            r#"{"id":"q","position":{"x":30,"y":50},"type":"quarterWavePlate","fastAxis":45}"#,
        )
        .unwrap();
        assert_eq!(*q.kind(), ComponentKind::QuarterWavePlate { fast_axis: Angle::DIAGONAL });
        let s: OpticalComponent = serde_json::from_str(
            r#"{"id":"bs","position":{"x":30,"y":50},"type":"splitter","mode":{"kind":"nonPolarizing"}}"#,
        )
        .unwrap();
        assert!(matches!(s.kind(), ComponentKind::Splitter { mode: SplitterMode::NonPolarizing { .. } }));
    }

    #[test]
    fn test_json_rejects_invalid_values() {
        let bad = r#"{"id":"p","position":{"x":130,"y":50},"type":"polarizer"}"#;
        assert!(serde_json::from_str::<OpticalComponent>(bad).is_err());
        let unknown = r#"{"id":"p","position":{"x":30,"y":50},"type":"laserCannon"}"#;
        assert!(serde_json::from_str::<OpticalComponent>(unknown).is_err());
    }

    #[test]
    fn test_unpolarized_emitter_launches_two_half_beams() {
        let beams = EmitterPolarization::Unpolarized.beams(100.0);
        assert_eq!(beams.len(), 2);
        assert!((beams[0].intensity() - 50.0).abs() < 1e-9);
        assert!(beams[0].inner(&beams[1]).norm() < 1e-12);
    }

    #[test]
    fn test_mystery_box_hides_its_element() {
        let kind = ComponentKind::mystery_box(3);
        assert_eq!(kind.to_string(), "MysteryBox");
        assert!(kind.element().is_some());
        assert!(!kind.is_detector());
    }
}
