// src/core/mod.rs

//! Core data structures and types

// Declare modules within core
pub mod angle;
pub mod complex;
pub mod error;
pub mod geometry;
pub mod state;

// Re-export public types for convenient access via `polarcraft::core::TypeName`
pub use angle::Angle;
pub use complex::{abs2, phasor, JonesMatrix, C64};
pub use error::{ComponentId, OpticsError, Result};
pub use geometry::{Direction, Position};
pub use state::{Handedness, JonesVector, PolarizationEllipse, PolarizationKind, StokesVector};

pub mod constants;
pub use constants::optics_constants::{GRID_MAX, GRID_MIN}; // Re-export
