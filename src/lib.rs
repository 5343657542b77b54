// src/lib.rs

//! `polarcraft` - A library for simulating polarized light in puzzle layouts
//!
//! Light is modelled with Jones vectors (pure states) and Stokes vectors
//! (partially polarized mixtures). Optical elements act as Jones or Mueller
//! matrices, a tracer walks beams across a 2-D grid of placed components,
//! and evaluators decide whether sensors, quantum locks, interferometer
//! ports and mines are satisfied.

pub mod core;
pub mod operations;
pub mod circuits;
pub mod simulation;
pub mod validation;
pub mod evaluation;
pub mod visualization;
pub mod level;

// Re-export the most common types for easier top-level use
pub use crate::core::{Angle, ComponentId, Direction, Handedness, JonesVector, OpticsError, Position, StokesVector};
pub use crate::operations::{MuellerMatrix, OpticalElement, SplitterMode};
pub use crate::circuits::{ComponentKind, EmitterPolarization, Layout, LayoutBuilder, OpticalComponent};
pub use crate::simulation::{AccumulationPolicy, BeamSegment, SensorState, TraceResult, Tracer, TracerConfig};
pub use crate::evaluation::{evaluate_victory, fidelity, VictoryCondition, VictoryConditions, VictoryResult};
pub use crate::level::Level;
pub use crate::validation::{check_normalization, check_stokes_realizable, validate_layout, validate_level};

// Example 1: Malus's law at a sensor
// A 45° beam through a vertical polarizer keeps half its intensity.
/// ```
/// use polarcraft::{Angle, ComponentKind, Direction, EmitterPolarization, LayoutBuilder, Tracer, OpticsError};
///
/// let layout = LayoutBuilder::new()
///     .place("laser", 5.0, 50.0, ComponentKind::Emitter {
///         direction: Direction::Right,
///         intensity: 100.0,
///         polarization: EmitterPolarization::Linear { angle: Angle::new(45.0) },
///     })
///     .place("pol", 40.0, 50.0, ComponentKind::Polarizer { angle: Angle::new(90.0) })
///     .place("sensor", 80.0, 50.0, ComponentKind::Sensor { required_intensity: 40.0, polarization: None })
///     .build()?;
///
/// let result = Tracer::new().trace(&layout);
/// println!("{}\n{}", layout, result);
///
/// let sensor = result.sensor("sensor").expect("sensor is in the layout");
/// assert!((sensor.received_intensity - 50.0).abs() < 1e-9);
/// assert!(sensor.activated);
/// # Ok::<(), OpticsError>(())
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

// Example 2: Opening a quantum lock
// A quarter-wave plate at 45° turns horizontal light right circular,
// which is what the lock expects.
/// ```
/// use polarcraft::{Angle, ComponentKind, Direction, EmitterPolarization, JonesVector, LayoutBuilder, Tracer, OpticsError};
/// use polarcraft::{VictoryCondition, VictoryConditions, evaluate_victory};
///
/// let layout = LayoutBuilder::new()
///     .place("laser", 5.0, 50.0, ComponentKind::Emitter {
///         direction: Direction::Right,
///         intensity: 100.0,
///         polarization: EmitterPolarization::Linear { angle: Angle::HORIZONTAL },
///     })
///     .place("qwp", 40.0, 50.0, ComponentKind::QuarterWavePlate { fast_axis: Angle::new(45.0) })
///     .place("lock", 80.0, 50.0, ComponentKind::QuantumLock {
///         target: JonesVector::right_circular(),
///         required_intensity: 50.0,
///         fidelity_threshold: 0.99,
///     })
///     .build()?;
///
/// let result = Tracer::new().trace(&layout);
/// let conditions = VictoryConditions::new(vec![VictoryCondition::QuantumLock { lock: "lock".into() }]);
/// let victory = evaluate_victory(&conditions, &layout, result.sensor_states())?;
/// println!("{}", victory.message);
/// assert!(victory.won);
/// assert!(victory.score > 99.0);
/// # Ok::<(), OpticsError>(())
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item
