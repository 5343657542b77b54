// src/simulation/mod.rs

//! Traces light through a `polarcraft::circuits::Layout`.
//! This module contains the `Tracer` entry point, its `TracerConfig`, and the
//! internal `TraceEngine` that runs the work-list of pending beams.

mod results;
pub(crate) mod engine;

pub use results::{BeamSegment, SensorState, TraceResult, TraceStats};

use crate::circuits::Layout;
use crate::core::error::{ensure_finite, ensure_non_negative};
use crate::core::{OpticsError, Result};
use engine::TraceEngine;
use serde::{Deserialize, Serialize};

/// How light arriving at one detector along several paths is combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccumulationPolicy {
    /// Stokes vectors add; paths never interfere.
    #[default]
    Incoherent,
    /// Jones amplitudes of beams from the same launch add, so split paths
    /// interfere when they recombine. Different emitters (and the two halves
    /// of an unpolarized emitter) still add incoherently.
    Coherent,
}

/// Tracer settings. Every field has a default, so `{}` is a valid JSON config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TracerConfig {
    /// Distance a beam advances per step, in grid units.
    pub step_size: f64,
    /// Half-width of the square hit box around each component.
    pub hit_tolerance: f64,
    /// Maximum number of interactions along one beam path.
    pub max_depth: usize,
    /// Beams weaker than this are dropped as negligible.
    pub intensity_floor: f64,
    /// Maximum steps in one straight run.
    pub max_steps: usize,
    /// Maximum number of beams admitted over the whole trace.
    pub max_beams: usize,
    pub accumulation: AccumulationPolicy,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            step_size: 0.5,
            hit_tolerance: 2.0,
            max_depth: 32,
            intensity_floor: 1e-3,
            max_steps: 400,
            max_beams: 4096,
            accumulation: AccumulationPolicy::Incoherent,
        }
    }
}

impl TracerConfig {
    pub fn coherent() -> Self {
        Self { accumulation: AccumulationPolicy::Coherent, ..Self::default() }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: TracerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings can produce a sensible, terminating trace.
    ///
    /// A step longer than the hit box is wide would let beams skip over
    /// components, so that combination is rejected.
    pub fn validate(&self) -> Result<()> {
        let step = ensure_finite("config.stepSize", self.step_size)?;
        let tolerance = ensure_finite("config.hitTolerance", self.hit_tolerance)?;
        if step <= 0.0 || tolerance <= 0.0 {
            return Err(OpticsError::InvalidParameter {
                field: "config.stepSize".to_string(),
                message: "step size and hit tolerance must be positive".to_string(),
            });
        }
        if step > 2.0 * tolerance {
            return Err(OpticsError::InvalidParameter {
                field: "config.stepSize".to_string(),
                message: format!("step {} would skip over hit boxes of half-width {}", step, tolerance),
            });
        }
        ensure_non_negative("config.intensityFloor", self.intensity_floor)?;
        if self.max_steps == 0 || self.max_beams == 0 {
            return Err(OpticsError::InvalidParameter {
                field: "config.maxSteps".to_string(),
                message: "step and beam limits must be at least 1".to_string(),
            });
        }
        if self.intensity_floor == 0.0 {
            log::warn!("intensity floor is 0: beams are bounded only by depth and the beam budget");
        }
        Ok(())
    }
}

/// The light-path tracer.
///
/// Tracing is a pure function of the layout and the configuration: the
/// layout is only read, and every call returns freshly built results.
#[derive(Debug, Clone, Default)]
pub struct Tracer {
    config: TracerConfig,
}

impl Tracer {
    /// Creates a tracer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracer with custom settings, validating them first.
    pub fn with_config(config: TracerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Traces every emitter in `layout` to completion.
    ///
    /// # Arguments
    /// * `layout` - The validated `Layout` to trace.
    ///
    /// # Returns
    /// * A `TraceResult` with the beam segments and one `SensorState` per
    ///   detector. Mirror loops, fan-out and dim beams are cut off by the
    ///   configured limits and counted in `TraceResult::stats`; they are never errors.
    pub fn trace(&self, layout: &Layout) -> TraceResult {
        if layout.emitters().next().is_none() {
            log::debug!("layout has no emitters, nothing to trace");
        }
        TraceEngine::new(layout, &self.config).run()
    }
}
