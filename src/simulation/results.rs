// src/simulation/results.rs
use crate::core::{ComponentId, Direction, JonesVector, Position, StokesVector};
use crate::evaluation::DetectorReading;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One straight run of a beam, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamSegment {
    pub start: Position,
    pub end: Position,
    pub direction: Direction,
    pub intensity: f64,
    pub jones: JonesVector,
    /// Number of interactions the beam went through before this run.
    pub depth: usize,
}

/// Light collected by one detector component, and what it made of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorState {
    pub id: ComponentId,
    pub activated: bool,
    pub received_intensity: f64,
    /// Polarized part of the received light as a pure state, if any.
    pub received_jones: Option<JonesVector>,
    pub received_stokes: StokesVector,
    /// Fidelity against the component's target state, when it has one and light arrived.
    pub fidelity: Option<f64>,
    /// Number of beams that reached the component.
    pub contributions: usize,
    pub reading: DetectorReading,
}

/// Counters describing how beams ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStats {
    pub beams_launched: usize,
    pub beams_detected: usize,
    pub beams_absorbed: usize,
    pub beams_exited: usize,
    pub dropped_dim: usize,
    pub truncated_depth: usize,
    pub truncated_steps: usize,
    pub truncated_budget: usize,
}

impl TraceStats {
    /// Beams cut off by a structural guard rather than by the optics.
    pub fn truncated(&self) -> usize {
        self.truncated_depth + self.truncated_steps + self.truncated_budget
    }
}

/// Holds the results of tracing a layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceResult {
    segments: Vec<BeamSegment>,
    sensor_states: BTreeMap<ComponentId, SensorState>,
    stats: TraceStats,
}

impl TraceResult {
    pub(crate) fn new(
        segments: Vec<BeamSegment>,
        sensor_states: BTreeMap<ComponentId, SensorState>,
        stats: TraceStats,
    ) -> Self {
        Self { segments, sensor_states, stats }
    }

    /// Beam segments in the order they were traced.
    pub fn segments(&self) -> &[BeamSegment] {
        &self.segments
    }

    /// One state per detector component in the layout, lit or not.
    pub fn sensor_states(&self) -> &BTreeMap<ComponentId, SensorState> {
        &self.sensor_states
    }

    /// Gets the state of a specific detector, if the layout contains it.
    pub fn sensor(&self, id: &str) -> Option<&SensorState> {
        self.sensor_states.get(&ComponentId::from(id))
    }

    pub fn stats(&self) -> &TraceStats {
        &self.stats
    }

    pub fn into_parts(self) -> (Vec<BeamSegment>, BTreeMap<ComponentId, SensorState>) {
        (self.segments, self.sensor_states)
    }
}

impl fmt::Display for TraceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trace Results:")?;
        writeln!(
            f,
            "  {} segments from {} beams ({} detected, {} absorbed, {} exited, {} truncated)",
            self.segments.len(),
            self.stats.beams_launched,
            self.stats.beams_detected,
            self.stats.beams_absorbed,
            self.stats.beams_exited,
            self.stats.truncated()
        )?;
        if self.sensor_states.is_empty() {
            writeln!(f, "  No detectors in the layout.")?;
        } else {
            writeln!(f, "  Detectors:")?;
            for (id, state) in &self.sensor_states {
                let mark = if state.activated { "ON " } else { "off" };
                write!(f, "    [{}] {}: I = {:.3}", mark, id, state.received_intensity)?;
                if let Some(fidelity) = state.fidelity {
                    write!(f, ", F = {:.4}", fidelity)?;
                }
                writeln!(f, " ({})", state.received_stokes.classify())?;
            }
        }
        Ok(())
    }
}
