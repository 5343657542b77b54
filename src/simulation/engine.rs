// src/simulation/engine.rs
use super::results::{BeamSegment, SensorState, TraceResult, TraceStats};
use super::{AccumulationPolicy, TracerConfig};
use crate::circuits::{ComponentKind, Layout};
use crate::core::{Direction, JonesVector, Position, StokesVector};
use crate::evaluation::read_detector;
use crate::operations::mirror_reflect;
use std::collections::BTreeMap;

/// A beam waiting to be propagated.
#[derive(Debug, Clone, Copy)]
struct PendingBeam {
    origin: Position,
    direction: Direction,
    jones: JonesVector,
    depth: usize,
    /// Index of the component the beam leaves; ignored for this straight run.
    source: usize,
    /// Beams sharing a group are mutually coherent (same emitter, same launch).
    coherence: usize,
}

impl PendingBeam {
    fn child(&self, at: Position, source: usize, direction: Direction, jones: JonesVector) -> PendingBeam {
        PendingBeam { origin: at, direction, jones, depth: self.depth + 1, source, coherence: self.coherence }
    }
}

/// Light collected at one detector.
#[derive(Debug, Default)]
struct Accumulator {
    incoherent: StokesVector,
    coherent: BTreeMap<usize, JonesVector>,
    contributions: usize,
}

impl Accumulator {
    fn add(&mut self, beam: &PendingBeam) {
        self.incoherent = self.incoherent + beam.jones.to_stokes();
        let sum = self.coherent.entry(beam.coherence).or_insert_with(JonesVector::dark);
        *sum = *sum + beam.jones;
        self.contributions += 1;
    }

    /// Received Stokes vector and, where it is well defined, the pure received state.
    fn resolve(&self, policy: AccumulationPolicy) -> (StokesVector, Option<JonesVector>) {
        let stokes = match policy {
            AccumulationPolicy::Incoherent => self.incoherent,
            AccumulationPolicy::Coherent => self
                .coherent
                .values()
                .fold(StokesVector::zero(), |acc, field| acc + field.to_stokes()),
        };
        let jones = match (policy, self.coherent.len()) {
            (AccumulationPolicy::Coherent, 1) => self.coherent.values().next().copied().filter(|v| !v.is_dark()),
            _ => stokes.to_jones().ok(),
        };
        (stokes, jones)
    }
}

/// The iterative tracer: one work-list of pending beams, one accumulator per detector.
/// (Internal visibility)
pub(crate) struct TraceEngine<'a> {
    layout: &'a Layout,
    config: &'a TracerConfig,
    pending: Vec<PendingBeam>,
    segments: Vec<BeamSegment>,
    accumulators: BTreeMap<usize, Accumulator>,
    stats: TraceStats,
}

impl<'a> TraceEngine<'a> {
    pub(crate) fn new(layout: &'a Layout, config: &'a TracerConfig) -> Self {
        Self {
            layout,
            config,
            pending: Vec::new(),
            segments: Vec::new(),
            accumulators: BTreeMap::new(),
            stats: TraceStats::default(),
        }
    }

    /// Traces every emitter to completion and finalizes the detector states.
    pub(crate) fn run(mut self) -> TraceResult {
        self.launch_emitters();
        while let Some(beam) = self.pending.pop() {
            self.propagate(beam);
        }
        self.finish()
    }

    fn launch_emitters(&mut self) {
        let mut launches = Vec::new();
        for (index, component) in self.layout.components().iter().enumerate() {
            if let ComponentKind::Emitter { direction, intensity, polarization } = *component.kind() {
                for jones in polarization.beams(intensity) {
                    let coherence = launches.len();
                    launches.push(PendingBeam {
                        origin: component.position(),
                        direction,
                        jones,
                        depth: 0,
                        source: index,
                        coherence,
                    });
                }
            }
        }
        // the stack pops in reverse, so emitters are traced in layout order
        for beam in launches.into_iter().rev() {
            self.enqueue(beam);
        }
    }

    /// Admits a beam to the work-list unless a cutoff applies.
    fn enqueue(&mut self, beam: PendingBeam) {
        if beam.jones.intensity() < self.config.intensity_floor {
            self.stats.dropped_dim += 1;
            log::trace!("dropping beam at {} below intensity floor", beam.origin);
            return;
        }
        if beam.depth > self.config.max_depth {
            self.stats.truncated_depth += 1;
            log::debug!("beam at {} heading {} exceeded max depth {}", beam.origin, beam.direction, self.config.max_depth);
            return;
        }
        if self.stats.beams_launched >= self.config.max_beams {
            self.stats.truncated_budget += 1;
            log::debug!("beam budget of {} exhausted, beam at {} discarded", self.config.max_beams, beam.origin);
            return;
        }
        self.stats.beams_launched += 1;
        self.pending.push(beam);
    }

    /// Steps one beam along its direction until it hits something, leaves the grid, or runs out of steps.
    fn propagate(&mut self, beam: PendingBeam) {
        let step = self.config.step_size;
        for n in 1..=self.config.max_steps {
            let point = beam.origin.step(beam.direction, step * n as f64);
            if !point.in_grid() {
                self.record(&beam, point.clamped());
                self.stats.beams_exited += 1;
                return;
            }
            if let Some(index) = self.component_at(point, &beam) {
                let centre = self.layout.components()[index].position();
                self.record(&beam, centre);
                self.interact(beam, index);
                return;
            }
        }
        let end = beam.origin.step(beam.direction, step * self.config.max_steps as f64);
        self.record(&beam, end);
        self.stats.truncated_steps += 1;
        log::debug!("beam from {} stopped after {} steps", beam.origin, self.config.max_steps);
    }

    /// Nearest non-emitter component whose hit box contains `point`; layout order breaks ties.
    /// Only components strictly ahead of the beam's origin can be hit.
    fn component_at(&self, point: Position, beam: &PendingBeam) -> Option<usize> {
        let (dx, dy) = beam.direction.delta();
        let ahead = |at: Position| (at.x - beam.origin.x) * dx + (at.y - beam.origin.y) * dy > 0.0;
        self.layout
            .components()
            .iter()
            .enumerate()
            .filter(|(index, c)| *index != beam.source && !c.kind().is_emitter() && ahead(c.position()))
            .map(|(index, c)| (index, c.position().chebyshev(&point)))
            .filter(|(_, distance)| *distance <= self.config.hit_tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    fn record(&mut self, beam: &PendingBeam, end: Position) {
        self.segments.push(BeamSegment {
            start: beam.origin,
            end,
            direction: beam.direction,
            intensity: beam.jones.intensity(),
            jones: beam.jones,
            depth: beam.depth,
        });
    }

    /// Dispatches a hit on the component kind: zero, one or two continuations.
    fn interact(&mut self, beam: PendingBeam, index: usize) {
        let layout = self.layout;
        let component = &layout.components()[index];
        let at = component.position();
        log::trace!("beam (I = {:.4}) hit {} ({})", beam.jones.intensity(), component.id(), component.kind().name());

        match *component.kind() {
            ComponentKind::Polarizer { .. }
            | ComponentKind::Rotator { .. }
            | ComponentKind::HalfWavePlate { .. }
            | ComponentKind::QuarterWavePlate { .. }
            | ComponentKind::WavePlate { .. }
            | ComponentKind::PhaseShifter { .. }
            | ComponentKind::CircularFilter { .. }
            | ComponentKind::MysteryBox { .. } => {
                if let Some(element) = component.kind().element() {
                    let out = element.apply(&beam.jones);
                    self.enqueue(beam.child(at, index, beam.direction, out));
                }
            }
            ComponentKind::Mirror { angle } => match mirror_reflect(beam.direction, angle) {
                Some(direction) => self.enqueue(beam.child(at, index, direction, beam.jones)),
                None => {
                    self.stats.beams_absorbed += 1;
                    log::debug!("mirror {} at {} absorbs beam heading {}", component.id(), angle, beam.direction);
                }
            },
            ComponentKind::Splitter { mode } => {
                let outcome = mode.split(beam.direction, &beam.jones);
                match outcome.deflected {
                    Some((direction, jones)) => self.enqueue(beam.child(at, index, direction, jones)),
                    None => log::debug!("splitter {} is off-diagonal, deflected ray lost", component.id()),
                }
                let (direction, jones) = outcome.straight;
                self.enqueue(beam.child(at, index, direction, jones));
            }
            ComponentKind::Sensor { .. }
            | ComponentKind::QuantumLock { .. }
            | ComponentKind::InterferometerTarget { .. }
            | ComponentKind::OpticalMine { .. } => {
                self.stats.beams_detected += 1;
                self.accumulators.entry(index).or_default().add(&beam);
            }
            // never a hit target; treated as a blocker for completeness
            ComponentKind::Emitter { .. } => {
                self.stats.beams_absorbed += 1;
            }
        }
    }

    /// Evaluates every detector against the light it collected.
    fn finish(self) -> TraceResult {
        let mut sensor_states = BTreeMap::new();
        for (index, component) in self.layout.components().iter().enumerate() {
            let accumulator = self.accumulators.get(&index);
            let (stokes, jones) = match accumulator {
                Some(acc) => acc.resolve(self.config.accumulation),
                None => (StokesVector::zero(), None),
            };
            let Some(reading) = read_detector(component.kind(), &stokes) else {
                continue;
            };
            sensor_states.insert(
                component.id().clone(),
                SensorState {
                    id: component.id().clone(),
                    activated: reading.is_activated(),
                    received_intensity: stokes.intensity(),
                    received_jones: jones,
                    received_stokes: stokes,
                    fidelity: reading.fidelity(),
                    contributions: accumulator.map_or(0, |acc| acc.contributions),
                    reading,
                },
            );
        }

        log::info!(
            "trace finished: {} beams, {} segments, {}/{} detectors active",
            self.stats.beams_launched,
            self.segments.len(),
            sensor_states.values().filter(|s| s.activated).count(),
            sensor_states.len()
        );
        TraceResult::new(self.segments, sensor_states, self.stats)
    }
}
