// src/evaluation/victory.rs

//! Aggregate victory check over a traced level.

use super::detectors::{evaluate_interferometer, DetectorReading, LockOutcome, SensorOutcome};
use crate::circuits::{ComponentKind, Layout};
use crate::core::{ComponentId, OpticsError, Result};
use crate::simulation::SensorState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Weight of the average fidelity in the score; the signal average takes the rest.
const FIDELITY_WEIGHT: f64 = 0.6;

/// Boolean combination of detector activations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicGate {
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Not,
}

impl LogicGate {
    /// `Xor` is true for an odd number of true inputs.
    pub fn apply(self, inputs: &[bool]) -> bool {
        let trues = inputs.iter().filter(|b| **b).count();
        match self {
            LogicGate::And => trues == inputs.len(),
            LogicGate::Or => trues > 0,
            LogicGate::Xor => trues % 2 == 1,
            LogicGate::Nand => trues != inputs.len(),
            LogicGate::Nor => trues == 0,
            LogicGate::Not => trues == 0,
        }
    }

    fn accepts_arity(self, n: usize) -> bool {
        match self {
            LogicGate::Not => n == 1,
            _ => n >= 1,
        }
    }
}

fn expect_true() -> bool {
    true
}

/// One requirement a level places on its detectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum VictoryCondition {
    /// A plain sensor must be activated.
    SensorActive { sensor: ComponentId },
    /// A quantum lock must be unlocked.
    QuantumLock { lock: ComponentId },
    /// Both interferometer ports must sit inside their bands.
    Interferometer { bright: ComponentId, dark: ComponentId },
    /// A mine must not be triggered.
    MineSafe { mine: ComponentId },
    /// The gate over the inputs' activation flags must equal `expected`.
    LogicGate {
        gate: LogicGate,
        inputs: Vec<ComponentId>,
        #[serde(default = "expect_true")]
        expected: bool,
    },
}

impl VictoryCondition {
    fn referenced(&self) -> Vec<&ComponentId> {
        match self {
            VictoryCondition::SensorActive { sensor } => vec![sensor],
            VictoryCondition::QuantumLock { lock } => vec![lock],
            VictoryCondition::Interferometer { bright, dark } => vec![bright, dark],
            VictoryCondition::MineSafe { mine } => vec![mine],
            VictoryCondition::LogicGate { inputs, .. } => inputs.iter().collect(),
        }
    }

    /// Checks the referenced components exist and have the right kind.
    pub fn validate(&self, layout: &Layout) -> Result<()> {
        for id in self.referenced() {
            let component = layout.get(id).ok_or_else(|| OpticsError::UnknownComponent(id.clone()))?;
            let kind = component.kind();
            let fits = match self {
                VictoryCondition::SensorActive { .. } => matches!(kind, ComponentKind::Sensor { .. }),
                VictoryCondition::QuantumLock { .. } => matches!(kind, ComponentKind::QuantumLock { .. }),
                VictoryCondition::Interferometer { .. } => matches!(kind, ComponentKind::InterferometerTarget { .. }),
                VictoryCondition::MineSafe { .. } => matches!(kind, ComponentKind::OpticalMine { .. }),
                VictoryCondition::LogicGate { .. } => kind.is_detector(),
            };
            if !fits {
                return Err(OpticsError::InvalidParameter {
                    field: format!("victory.{}", id),
                    message: format!("component is a {}, which this condition cannot use", kind.name()),
                });
            }
        }
        if let VictoryCondition::LogicGate { gate, inputs, .. } = self {
            if !gate.accepts_arity(inputs.len()) {
                return Err(OpticsError::InvalidParameter {
                    field: "victory.inputs".to_string(),
                    message: format!("{:?} gate cannot take {} inputs", gate, inputs.len()),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for VictoryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VictoryCondition::SensorActive { sensor } => write!(f, "sensor {} active", sensor),
            VictoryCondition::QuantumLock { lock } => write!(f, "lock {} open", lock),
            VictoryCondition::Interferometer { bright, dark } => {
                write!(f, "interferometer bright {} / dark {}", bright, dark)
            }
            VictoryCondition::MineSafe { mine } => write!(f, "mine {} safe", mine),
            VictoryCondition::LogicGate { gate, inputs, expected } => {
                let names: Vec<&str> = inputs.iter().map(|id| id.as_str()).collect();
                write!(f, "{:?}({}) == {}", gate, names.join(", "), expected)
            }
        }
    }
}

/// The full set of conditions a level must meet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VictoryConditions {
    pub conditions: Vec<VictoryCondition>,
}

impl VictoryConditions {
    pub fn new(conditions: Vec<VictoryCondition>) -> Self {
        Self { conditions }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self, layout: &Layout) -> Result<()> {
        self.conditions.iter().try_for_each(|c| c.validate(layout))
    }
}

/// How one condition fared.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionReport {
    pub condition: String,
    pub passed: bool,
    /// Normalized signal strength in `[0, 1]`.
    pub signal: f64,
    pub fidelity: Option<f64>,
    pub detail: String,
}

/// Outcome of a whole level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VictoryResult {
    pub won: bool,
    /// Partial-credit score in `[0, 100]`.
    pub score: f64,
    pub breakdown: Vec<ConditionReport>,
    pub message: String,
}

fn state_of<'s>(states: &'s BTreeMap<ComponentId, SensorState>, id: &ComponentId) -> Result<&'s SensorState> {
    states.get(id).ok_or_else(|| OpticsError::UnknownComponent(id.clone()))
}

fn intensity_signal(received: f64, required: f64) -> f64 {
    if required <= 0.0 { 1.0 } else { (received / required).clamp(0.0, 1.0) }
}

fn report(condition: &VictoryCondition, layout: &Layout, states: &BTreeMap<ComponentId, SensorState>) -> Result<ConditionReport> {
    let (passed, signal, fidelity, detail) = match condition {
        VictoryCondition::SensorActive { sensor } => {
            let state = state_of(states, sensor)?;
            let outcome = match state.reading {
                DetectorReading::Sensor(outcome) => outcome,
                _ => SensorOutcome::NoLight,
            };
            let signal = match outcome {
                SensorOutcome::NoLight => 0.0,
                SensorOutcome::LowIntensity { received, required } => intensity_signal(received, required),
                SensorOutcome::WrongPolarization { .. } | SensorOutcome::Activated { .. } => 1.0,
            };
            (outcome.is_activated(), signal, outcome.fidelity(), outcome.to_string())
        }
        VictoryCondition::QuantumLock { lock } => {
            let state = state_of(states, lock)?;
            let outcome = match state.reading {
                DetectorReading::QuantumLock(outcome) => outcome,
                _ => LockOutcome::NoLight,
            };
            let signal = match outcome {
                LockOutcome::NoLight => 0.0,
                LockOutcome::LowIntensity { received, required } => intensity_signal(received, required),
                LockOutcome::LowFidelity { .. } | LockOutcome::Unlocked { .. } => 1.0,
            };
            (outcome.is_unlocked(), signal, outcome.fidelity(), outcome.to_string())
        }
        VictoryCondition::Interferometer { bright, dark } => {
            let band_of = |id: &ComponentId| match layout.get(id).map(|c| *c.kind()) {
                Some(ComponentKind::InterferometerTarget { band, .. }) => Ok(band),
                _ => Err(OpticsError::UnknownComponent(id.clone())),
            };
            let reading = evaluate_interferometer(
                state_of(states, bright)?.received_intensity,
                &band_of(bright)?,
                state_of(states, dark)?.received_intensity,
                &band_of(dark)?,
            );
            let signal = if reading.bright_intensity >= reading.dark_intensity { reading.visibility } else { 0.0 };
            let detail = format!(
                "bright {:.2}{}, dark {:.2}{}, visibility {:.3}",
                reading.bright_intensity,
                if reading.bright_ok { "" } else { " (out of band)" },
                reading.dark_intensity,
                if reading.dark_ok { "" } else { " (out of band)" },
                reading.visibility
            );
            (reading.is_satisfied(), signal, None, detail)
        }
        VictoryCondition::MineSafe { mine } => {
            let state = state_of(states, mine)?;
            let detail = match state.reading {
                DetectorReading::Mine(outcome) => outcome.to_string(),
                _ => "not a mine".to_string(),
            };
            let safe = !state.activated;
            (safe, if safe { 1.0 } else { 0.0 }, None, detail)
        }
        VictoryCondition::LogicGate { gate, inputs, expected } => {
            let values = inputs
                .iter()
                .map(|id| state_of(states, id).map(|s| s.activated))
                .collect::<Result<Vec<bool>>>()?;
            let output = gate.apply(&values);
            let passed = output == *expected;
            (passed, if passed { 1.0 } else { 0.0 }, None, format!("inputs {:?} give {}", values, output))
        }
    };
    Ok(ConditionReport { condition: condition.to_string(), passed, signal, fidelity, detail })
}

/// Checks every condition against the detector states of a trace.
///
/// # Arguments
/// * `conditions` - The level's `VictoryConditions`.
/// * `layout` - The traced layout (for component parameters such as port bands).
/// * `states` - Detector states from `TraceResult::sensor_states`.
///
/// # Returns
/// * `Ok(VictoryResult)`: `won` iff every condition passes; the score is
///   `100·(0.6·avg_fidelity + 0.4·avg_signal)` where `avg_fidelity` averages
///   the conditions reporting a fidelity and falls back to `avg_signal`.
/// * `Err(OpticsError)` if a condition references a missing or mismatched component.
pub fn evaluate_victory(
    conditions: &VictoryConditions,
    layout: &Layout,
    states: &BTreeMap<ComponentId, SensorState>,
) -> Result<VictoryResult> {
    conditions.validate(layout)?;
    let breakdown = conditions
        .conditions
        .iter()
        .map(|c| report(c, layout, states))
        .collect::<Result<Vec<_>>>()?;

    let total = breakdown.len();
    let passed = breakdown.iter().filter(|r| r.passed).count();
    let won = passed == total;

    let avg_signal = if total == 0 { 1.0 } else { breakdown.iter().map(|r| r.signal).sum::<f64>() / total as f64 };
    let fidelities: Vec<f64> = breakdown.iter().filter_map(|r| r.fidelity).collect();
    let avg_fidelity = if fidelities.is_empty() {
        avg_signal
    } else {
        fidelities.iter().sum::<f64>() / fidelities.len() as f64
    };
    let score = (100.0 * (FIDELITY_WEIGHT * avg_fidelity + (1.0 - FIDELITY_WEIGHT) * avg_signal)).clamp(0.0, 100.0);

    let message = if won {
        format!("Level complete: all {} conditions met (score {:.0})", total, score)
    } else {
        let first_failure = breakdown.iter().find(|r| !r.passed).map(|r| format!("{}: {}", r.condition, r.detail));
        format!(
            "{} of {} conditions met (score {:.0}); {}",
            passed,
            total,
            score,
            first_failure.unwrap_or_default()
        )
    };
    log::info!("{}", message);

    Ok(VictoryResult { won, score, breakdown, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::{EmitterPolarization, LayoutBuilder};
    use crate::core::{Angle, Direction, JonesVector};
    use crate::simulation::Tracer;

    #[test]
    fn test_logic_gates() {
        assert!(LogicGate::And.apply(&[true, true]));
        assert!(!LogicGate::And.apply(&[true, false]));
        assert!(LogicGate::Or.apply(&[false, true]));
        assert!(LogicGate::Xor.apply(&[true, false, false]));
        assert!(!LogicGate::Xor.apply(&[true, true]));
        assert!(LogicGate::Nand.apply(&[true, false]));
        assert!(LogicGate::Nor.apply(&[false, false]));
        assert!(LogicGate::Not.apply(&[false]));
        assert!(!LogicGate::Not.accepts_arity(2));
    }

    fn lit_layout() -> Result<Layout> {
        LayoutBuilder::new()
            .place(
                "e",
                5.0,
                50.0,
                ComponentKind::Emitter {
                    direction: Direction::Right,
                    intensity: 100.0,
                    polarization: EmitterPolarization::Linear { angle: Angle::VERTICAL },
                },
            )
            .place(
                "lock",
                90.0,
                50.0,
                ComponentKind::QuantumLock {
                    target: JonesVector::vertical(),
                    required_intensity: 50.0,
                    fidelity_threshold: 0.99,
                },
            )
            .place("idle", 50.0, 90.0, ComponentKind::Sensor { required_intensity: 1.0, polarization: None })
            .place("mine", 50.0, 10.0, ComponentKind::OpticalMine { trigger_threshold: 1.0, safe_state: None })
            .build()
    }

    #[test]
    fn test_victory_with_lock_and_mine() -> Result<()> {
        let layout = lit_layout()?;
        let trace = Tracer::new().trace(&layout);
        let conditions = VictoryConditions::new(vec![
            VictoryCondition::QuantumLock { lock: "lock".into() },
            VictoryCondition::MineSafe { mine: "mine".into() },
            VictoryCondition::LogicGate { gate: LogicGate::Not, inputs: vec!["idle".into()], expected: true },
        ]);
        let result = evaluate_victory(&conditions, &layout, trace.sensor_states())?;
        assert!(result.won, "{}", result.message);
        assert!((result.score - 100.0).abs() < 1e-6);
        assert_eq!(result.breakdown.len(), 3);
        Ok(())
    }

    #[test]
    fn test_partial_credit_when_sensor_dark() -> Result<()> {
        let layout = lit_layout()?;
        let trace = Tracer::new().trace(&layout);
        let conditions = VictoryConditions::new(vec![
            VictoryCondition::QuantumLock { lock: "lock".into() },
            VictoryCondition::SensorActive { sensor: "idle".into() },
        ]);
        let result = evaluate_victory(&conditions, &layout, trace.sensor_states())?;
        assert!(!result.won);
        // fidelity average 1.0 (lock only), signal average 0.5
        assert!((result.score - 80.0).abs() < 1e-6);
        assert!(result.message.contains("1 of 2"));
        Ok(())
    }

    #[test]
    fn test_unknown_and_mismatched_references() -> Result<()> {
        let layout = lit_layout()?;
        let trace = Tracer::new().trace(&layout);
        let missing = VictoryConditions::new(vec![VictoryCondition::SensorActive { sensor: "ghost".into() }]);
        assert_eq!(
            evaluate_victory(&missing, &layout, trace.sensor_states()).unwrap_err(),
            OpticsError::UnknownComponent("ghost".into())
        );
        let wrong_kind = VictoryConditions::new(vec![VictoryCondition::QuantumLock { lock: "mine".into() }]);
        assert!(matches!(
            evaluate_victory(&wrong_kind, &layout, trace.sensor_states()),
            Err(OpticsError::InvalidParameter { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_conditions_from_json() -> Result<()> {
        let json = r#"{"conditions": [
            {"type": "quantumLock", "lock": "lock"},
            {"type": "interferometer", "bright": "b", "dark": "d"},
            {"type": "logicGate", "gate": "xor", "inputs": ["a", "b"]}
        ]}"#;
        let conditions = VictoryConditions::from_json(json)?;
        assert_eq!(conditions.conditions.len(), 3);
        assert_eq!(
            conditions.conditions[2],
            VictoryCondition::LogicGate { gate: LogicGate::Xor, inputs: vec!["a".into(), "b".into()], expected: true }
        );
        Ok(())
    }
}
