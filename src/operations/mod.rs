// src/operations/mod.rs

//! Optical element operators.
//!
//! Every transmissive element is a pure function from its typed parameters
//! to a 2x2 Jones matrix. Elements that change the geometry of a beam
//! (mirrors, splitters) are expressed as explicit rules producing the
//! outgoing direction(s) and Jones vector(s). Nothing here holds state.

pub mod fresnel;
pub mod media;
pub mod mueller;

use crate::core::constants::optics_constants::{
    DEFAULT_PHASE_SHIFT_DEG, DEFAULT_REFLECTANCE, DEFAULT_RETARDANCE_DEG, DEFAULT_ROTATION_DEG,
    DEFAULT_SPLITTER_ORIENTATION, MIRROR_TOLERANCE_DEG,
};
use crate::core::error::{ensure_finite, ensure_unit_interval, Result};
use crate::core::{phasor, Angle, Direction, Handedness, JonesMatrix, JonesVector, C64};
use num_complex::Complex;
use num_traits::One;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

pub use fresnel::{FresnelCoefficients, Interface};
pub use media::{crystal_plate, crystal_retardance, optical_rotation, solution_rotator, Solute};
pub use mueller::MuellerMatrix;

/// Linear polarizer with transmission axis `angle`: `[[c², cs], [cs, s²]]`.
///
/// Intensity through it follows Malus's law `I = I₀·cos²(θ_in − θ)`.
pub fn polarizer(angle: Angle) -> JonesMatrix {
    let (s, c) = angle.radians().sin_cos();
    JonesMatrix::real(c * c, c * s, c * s, s * s)
}

/// General linear retarder: fast axis `fast_axis`, retardance `retardance` (radians)
/// applied to the slow axis.
///
/// `R(−α) · diag(1, e^{iδ}) · R(α)` which expands to
/// `a00 = c² + e^{iδ}s²`, `a01 = a10 = cs(1 − e^{iδ})`, `a11 = s² + e^{iδ}c²`.
pub fn wave_plate(fast_axis: Angle, retardance: f64) -> JonesMatrix {
    let (s, c) = fast_axis.radians().sin_cos();
    let e = phasor(retardance);
    let one = C64::one();
    JonesMatrix::new([
        [one * (c * c) + e * (s * s), (one - e) * (c * s)],
        [(one - e) * (c * s), one * (s * s) + e * (c * c)],
    ])
}

/// Quarter-wave plate (δ = π/2).
pub fn quarter_wave_plate(fast_axis: Angle) -> JonesMatrix {
    wave_plate(fast_axis, FRAC_PI_2)
}

/// Half-wave plate (δ = π): mirrors a linear angle θ to `2α − θ`.
pub fn half_wave_plate(fast_axis: Angle) -> JonesMatrix {
    wave_plate(fast_axis, PI)
}

/// Optical rotator by `amount_deg` (signed); lossless.
pub fn rotator(amount_deg: f64) -> JonesMatrix {
    let (s, c) = amount_deg.to_radians().sin_cos();
    JonesMatrix::real(c, -s, s, c)
}

/// Relative phase `phase_deg` on the y component: a wave plate with fast axis 0.
pub fn phase_shifter(phase_deg: f64) -> JonesMatrix {
    wave_plate(Angle::HORIZONTAL, phase_deg.to_radians())
}

/// Projector `|u⟩⟨u|` onto the normalized state `u`.
pub fn projector(onto: &JonesVector) -> JonesMatrix {
    let Some(u) = onto.normalized() else {
        return JonesMatrix::zero();
    };
    let [ux, uy] = u.components();
    JonesMatrix::new([[ux * ux.conj(), ux * uy.conj()], [uy * ux.conj(), uy * uy.conj()]])
}

/// Ideal circular analyzer: keeps only the `handedness` component.
pub fn circular_projector(handedness: Handedness) -> JonesMatrix {
    projector(&handedness.jones())
}

/// Projects `input` onto `onto`: `⟨u|v⟩·u`. Output intensity is the input
/// intensity times the fidelity of the two states.
pub fn project(onto: &JonesVector, input: &JonesVector) -> JonesVector {
    projector(onto).apply(input)
}

/// Transmitted intensity for linear light of intensity `i0` at `input`
/// through a polarizer at `axis`.
pub fn malus_intensity(i0: f64, input: Angle, axis: Angle) -> f64 {
    let delta = (input.degrees() - axis.degrees()).to_radians();
    i0 * delta.cos().powi(2)
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

/// A transmissive element acting on a single beam through a Jones matrix.
///
/// Parameters missing from level data fall back to the documented defaults:
/// polarizer 0°, retardance 90°, rotation 45°, phase 90°, right handedness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OpticalElement {
    Polarizer {
        #[serde(default)]
        angle: Angle,
    },
    /// Arbitrary retarder; `retardance` in degrees.
    WavePlate {
        #[serde(default)]
        fast_axis: Angle,
        #[serde(default = "default_retardance")]
        retardance: f64,
    },
    HalfWavePlate {
        #[serde(default)]
        fast_axis: Angle,
    },
    QuarterWavePlate {
        #[serde(default)]
        fast_axis: Angle,
    },
    /// Signed rotation in degrees.
    Rotator {
        #[serde(default = "default_rotation")]
        amount: f64,
    },
    /// Relative y-phase in degrees.
    PhaseShifter {
        #[serde(default = "default_phase")]
        phase: f64,
    },
    CircularFilter {
        #[serde(default)]
        handedness: Handedness,
    },
}

impl OpticalElement {
    /// The element's Jones matrix.
    pub fn jones_matrix(&self) -> JonesMatrix {
        match *self {
            OpticalElement::Polarizer { angle } => polarizer(angle),
            OpticalElement::WavePlate { fast_axis, retardance } => wave_plate(fast_axis, retardance.to_radians()),
            OpticalElement::HalfWavePlate { fast_axis } => half_wave_plate(fast_axis),
            OpticalElement::QuarterWavePlate { fast_axis } => quarter_wave_plate(fast_axis),
            OpticalElement::Rotator { amount } => rotator(amount),
            OpticalElement::PhaseShifter { phase } => phase_shifter(phase),
            OpticalElement::CircularFilter { handedness } => circular_projector(handedness),
        }
    }

    pub fn apply(&self, input: &JonesVector) -> JonesVector {
        self.jones_matrix().apply(input)
    }

    /// Elements that never remove light.
    pub fn is_lossless(&self) -> bool {
        !matches!(self, OpticalElement::Polarizer { .. } | OpticalElement::CircularFilter { .. })
    }

    /// Checks numeric parameters are finite.
    pub fn validate(&self) -> Result<()> {
        match *self {
            OpticalElement::Polarizer { angle } => ensure_finite("polarizer.angle", angle.degrees()).map(|_| ()),
            OpticalElement::WavePlate { fast_axis, retardance } => {
                ensure_finite("wavePlate.fastAxis", fast_axis.degrees())?;
                ensure_finite("wavePlate.retardance", retardance).map(|_| ())
            }
            OpticalElement::HalfWavePlate { fast_axis } | OpticalElement::QuarterWavePlate { fast_axis } => {
                ensure_finite("wavePlate.fastAxis", fast_axis.degrees()).map(|_| ())
            }
            OpticalElement::Rotator { amount } => ensure_finite("rotator.amount", amount).map(|_| ()),
            OpticalElement::PhaseShifter { phase } => ensure_finite("phaseShifter.phase", phase).map(|_| ()),
            OpticalElement::CircularFilter { .. } => Ok(()),
        }
    }

    /// Draws a hidden element for a mystery box, deterministically from `seed`.
    ///
    /// Angles are drawn on a 15° lattice so the puzzle stays solvable by hand.
    pub fn random(seed: u64) -> OpticalElement {
        let mut rng = StdRng::seed_from_u64(seed);
        let pick = |rng: &mut StdRng, n: usize| -> usize { ((rng.random::<f64>() * n as f64) as usize).min(n - 1) };
        let lattice_angle = |rng: &mut StdRng| Angle::new(15.0 * pick(rng, 12) as f64);

        match pick(&mut rng, 5) {
            0 => OpticalElement::Polarizer { angle: lattice_angle(&mut rng) },
            1 => OpticalElement::HalfWavePlate { fast_axis: lattice_angle(&mut rng) },
            2 => OpticalElement::QuarterWavePlate { fast_axis: lattice_angle(&mut rng) },
            3 => {
                let magnitude = 15.0 * (1 + pick(&mut rng, 6)) as f64;
                let amount = if rng.random::<f64>() < 0.5 { -magnitude } else { magnitude };
                OpticalElement::Rotator { amount }
            }
            _ => OpticalElement::PhaseShifter { phase: 45.0 * (1 + pick(&mut rng, 7)) as f64 },
        }
    }
}

impl fmt::Display for OpticalElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpticalElement::Polarizer { angle } => write!(f, "Polarizer({})", angle),
            OpticalElement::WavePlate { fast_axis, retardance } => {
                write!(f, "WavePlate(axis {}, δ {:.1}°)", fast_axis, retardance)
            }
            OpticalElement::HalfWavePlate { fast_axis } => write!(f, "HalfWavePlate({})", fast_axis),
            OpticalElement::QuarterWavePlate { fast_axis } => write!(f, "QuarterWavePlate({})", fast_axis),
            OpticalElement::Rotator { amount } => write!(f, "Rotator({:+.1}°)", amount),
            OpticalElement::PhaseShifter { phase } => write!(f, "PhaseShifter({:.1}°)", phase),
            OpticalElement::CircularFilter { handedness } => write!(f, "CircularFilter({})", handedness),
        }
    }
}

/// Outgoing direction for a beam meeting a mirror at `mirror_angle`.
///
/// Only the two diagonals reflect: 45° ("/") maps right↔up and left↔down,
/// 135° ("\") maps right↔down and left↔up, each within ±5°. Any other
/// orientation absorbs the beam (`None`).
pub fn mirror_reflect(incoming: Direction, mirror_angle: Angle) -> Option<Direction> {
    if mirror_angle.is_within(Angle::DIAGONAL, MIRROR_TOLERANCE_DEG) {
        Some(match incoming {
            Direction::Right => Direction::Up,
            Direction::Up => Direction::Right,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Left,
        })
    } else if mirror_angle.is_within(Angle::ANTI_DIAGONAL, MIRROR_TOLERANCE_DEG) {
        Some(match incoming {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Left,
        })
    } else {
        None
    }
}

fn default_orientation() -> Angle {
    Angle::new(DEFAULT_SPLITTER_ORIENTATION)
}

fn default_reflectance() -> f64 {
    DEFAULT_REFLECTANCE
}

/// How a splitter divides a beam.
///
/// The straight ray keeps the incident direction; the deflected ray turns the
/// way a mirror with the splitter's `orientation` would turn it. If the
/// orientation is off both diagonals the deflected ray is lost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SplitterMode {
    /// Birefringent crystal: ordinary ray polarized along `crystal_axis` goes
    /// straight, extraordinary ray polarized perpendicular to it is deflected.
    Polarizing {
        #[serde(default)]
        crystal_axis: Angle,
        #[serde(default = "default_orientation")]
        orientation: Angle,
    },
    /// Partially reflecting plate: amplitude `√(1−R)` straight, `i·√R` deflected.
    NonPolarizing {
        #[serde(default = "default_reflectance")]
        reflectance: f64,
        #[serde(default = "default_orientation")]
        orientation: Angle,
    },
}

impl Default for SplitterMode {
    fn default() -> Self {
        SplitterMode::Polarizing { crystal_axis: Angle::HORIZONTAL, orientation: default_orientation() }
    }
}

/// The two children of a split beam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitOutcome {
    pub straight: (Direction, JonesVector),
    pub deflected: Option<(Direction, JonesVector)>,
}

impl SplitterMode {
    pub fn orientation(&self) -> Angle {
        match *self {
            SplitterMode::Polarizing { orientation, .. } | SplitterMode::NonPolarizing { orientation, .. } => {
                orientation
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            SplitterMode::Polarizing { crystal_axis, orientation } => {
                ensure_finite("splitter.crystalAxis", crystal_axis.degrees())?;
                ensure_finite("splitter.orientation", orientation.degrees()).map(|_| ())
            }
            SplitterMode::NonPolarizing { reflectance, orientation } => {
                ensure_unit_interval("splitter.reflectance", reflectance)?;
                ensure_finite("splitter.orientation", orientation.degrees()).map(|_| ())
            }
        }
    }

    /// Divides `input` travelling `incoming` into its two children.
    /// Child intensities always sum to the input intensity.
    pub fn split(&self, incoming: Direction, input: &JonesVector) -> SplitOutcome {
        let (straight, deflected) = match *self {
            SplitterMode::Polarizing { crystal_axis, .. } => split_polarizing(input, crystal_axis),
            SplitterMode::NonPolarizing { reflectance, .. } => split_non_polarizing(input, reflectance),
        };
        SplitOutcome {
            straight: (incoming, straight),
            deflected: mirror_reflect(incoming, self.orientation()).map(|dir| (dir, deflected)),
        }
    }
}

/// Ordinary (along `crystal_axis`) and extraordinary (perpendicular) components.
///
/// For linear input at θ relative to the axis the intensities are `I·cos²θ`
/// and `I·sin²θ`.
pub fn split_polarizing(input: &JonesVector, crystal_axis: Angle) -> (JonesVector, JonesVector) {
    (
        polarizer(crystal_axis).apply(input),
        polarizer(crystal_axis.perpendicular()).apply(input),
    )
}

/// Transmitted and reflected amplitudes of a lossless partial reflector.
pub fn split_non_polarizing(input: &JonesVector, reflectance: f64) -> (JonesVector, JonesVector) {
    let r = reflectance.clamp(0.0, 1.0);
    let t_amp = Complex::new((1.0 - r).sqrt(), 0.0);
    let r_amp = Complex::new(0.0, r.sqrt());
    (input.scaled_complex(t_amp), input.scaled_complex(r_amp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::fidelity;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_polarizer_is_idempotent_projector() {
        let p = polarizer(Angle::new(30.0));
        assert!(p.matmul(&p).approx_eq(&p, TOL));
        assert!(!p.is_unitary(1e-6));
    }

    #[test]
    fn test_malus_law_endpoints() {
        let h = JonesVector::horizontal().scaled(10.0); // intensity 100
        let parallel = polarizer(Angle::HORIZONTAL).apply(&h);
        let crossed = polarizer(Angle::VERTICAL).apply(&h);
        assert!((parallel.intensity() - 100.0).abs() < TOL);
        assert!(crossed.intensity() < TOL);
        let at_60 = polarizer(Angle::new(60.0)).apply(&h);
        assert!((at_60.intensity() - malus_intensity(100.0, Angle::HORIZONTAL, Angle::new(60.0))).abs() < TOL);
        assert!((at_60.intensity() - 25.0).abs() < TOL);
    }

    #[test]
    fn test_wave_plates_are_unitary() {
        for axis in [0.0, 22.5, 45.0, 100.0] {
            assert!(quarter_wave_plate(Angle::new(axis)).is_unitary(TOL));
            assert!(half_wave_plate(Angle::new(axis)).is_unitary(TOL));
            assert!(wave_plate(Angle::new(axis), 1.234).is_unitary(TOL));
        }
        assert!(rotator(37.0).is_unitary(TOL));
        assert!(phase_shifter(120.0).is_unitary(TOL));
    }

    #[test]
    fn test_quarter_wave_plate_makes_right_circular() {
        let out = quarter_wave_plate(Angle::DIAGONAL).apply(&JonesVector::horizontal());
        assert!((fidelity(&JonesVector::right_circular(), &out) - 1.0).abs() < TOL);
        assert!(fidelity(&JonesVector::left_circular(), &out) < TOL);
    }

    #[test]
    fn test_rotator_turns_linear_angle() {
        let out = rotator(25.0).apply(&JonesVector::linear(Angle::new(10.0)));
        let angle = out.linear_angle().unwrap();
        assert!((angle.degrees() - 35.0).abs() < 1e-9);
        assert!((out.intensity() - 1.0).abs() < TOL);
    }

    #[test]
    fn test_phase_shifter_keeps_intensity_and_single_axis_states() {
        let h = JonesVector::horizontal();
        let out = phase_shifter(90.0).apply(&h);
        assert!(out.approx_eq_up_to_phase(&h, TOL));
        let d = phase_shifter(90.0).apply(&JonesVector::diagonal());
        assert!((d.intensity() - 1.0).abs() < TOL);
        // diagonal picks up a quarter-wave relative phase: left circular
        assert!((fidelity(&JonesVector::left_circular(), &d) - 1.0).abs() < TOL);
    }

    #[test]
    fn test_circular_filter_transmits_half_of_linear() {
        let out = OpticalElement::CircularFilter { handedness: Handedness::Right }
            .apply(&JonesVector::vertical().scaled(2.0));
        assert!((out.intensity() - 2.0).abs() < TOL);
        assert!((fidelity(&JonesVector::right_circular(), &out) - 1.0).abs() < TOL);
        let blocked = circular_projector(Handedness::Left).apply(&JonesVector::right_circular());
        assert!(blocked.intensity() < TOL);
    }

    #[test]
    fn test_mirror_table_and_absorption() {
        assert_eq!(mirror_reflect(Direction::Right, Angle::new(45.0)), Some(Direction::Up));
        assert_eq!(mirror_reflect(Direction::Down, Angle::new(47.0)), Some(Direction::Left));
        assert_eq!(mirror_reflect(Direction::Right, Angle::new(135.0)), Some(Direction::Down));
        assert_eq!(mirror_reflect(Direction::Up, Angle::new(-45.0)), Some(Direction::Left));
        assert_eq!(mirror_reflect(Direction::Right, Angle::new(60.0)), None);
        assert_eq!(mirror_reflect(Direction::Right, Angle::new(90.0)), None);
    }

    #[test]
    fn test_polarizing_split_conserves_energy() {
        let input = JonesVector::linear(Angle::new(30.0)).scaled(2.0);
        let outcome = SplitterMode::default().split(Direction::Right, &input);
        let (dir_o, o) = outcome.straight;
        let (dir_e, e) = outcome.deflected.unwrap();
        assert_eq!(dir_o, Direction::Right);
        assert_eq!(dir_e, Direction::Up);
        let expected_o = 4.0 * 30f64.to_radians().cos().powi(2);
        assert!((o.intensity() - expected_o).abs() < TOL);
        assert!((o.intensity() + e.intensity() - 4.0).abs() < TOL);
        assert_eq!(o.linear_angle().map(|a| a.degrees().round()), Some(0.0));
        assert_eq!(e.linear_angle().map(|a| a.degrees().round()), Some(90.0));
    }

    #[test]
    fn test_non_polarizing_split_phases() {
        let (t, r) = split_non_polarizing(&JonesVector::horizontal(), 0.5);
        assert!((t.intensity() - 0.5).abs() < TOL);
        assert!((r.intensity() - 0.5).abs() < TOL);
        assert!((r.ex() - Complex::new(0.0, 0.5f64.sqrt())).norm() < TOL);
    }

    #[test]
    fn test_off_diagonal_splitter_loses_deflected_ray() {
        let mode = SplitterMode::NonPolarizing { reflectance: 0.5, orientation: Angle::new(90.0) };
        let outcome = mode.split(Direction::Left, &JonesVector::horizontal());
        assert!(outcome.deflected.is_none());
        assert!(SplitterMode::NonPolarizing { reflectance: 1.5, orientation: Angle::DIAGONAL }.validate().is_err());
    }

    #[test]
    fn test_random_element_is_deterministic() {
        assert_eq!(OpticalElement::random(7), OpticalElement::random(7));
        for seed in 0..32 {
            assert!(OpticalElement::random(seed).validate().is_ok());
        }
    }

    #[test]
    fn test_element_json_defaults() {
        let p: OpticalElement = serde_json::from_str(r#"{"type":"polarizer"}"#).unwrap();
        assert_eq!(p, OpticalElement::Polarizer { angle: Angle::HORIZONTAL });
        let w: OpticalElement = serde_json::from_str(r#"{"type":"wavePlate","fastAxis":30}"#).unwrap();
        assert_eq!(w, OpticalElement::WavePlate { fast_axis: Angle::new(30.0), retardance: 90.0 });
        let r: OpticalElement = serde_json::from_str(r#"{"type":"rotator"}"#).unwrap();
        assert_eq!(r, OpticalElement::Rotator { amount: 45.0 });
        let f: OpticalElement = serde_json::from_str(r#"{"type":"circularFilter"}"#).unwrap();
        assert_eq!(f, OpticalElement::CircularFilter { handedness: Handedness::Right });
    }
}
