// src/level.rs

//! A playable bundle: components, victory conditions and tracer settings.

use crate::circuits::Layout;
use crate::core::Result;
use crate::evaluation::{evaluate_victory, VictoryConditions, VictoryResult};
use crate::simulation::{TraceResult, Tracer, TracerConfig};
use crate::validation::validate_level;
use serde::{Deserialize, Serialize};

/// A level as loaded from JSON.
///
/// ```json
/// {
///   "name": "First light",
///   "components": [ { "id": "e", "position": {"x": 5, "y": 50}, "type": "emitter" }, ... ],
///   "victory": { "conditions": [ { "type": "sensorActive", "sensor": "s" } ] },
///   "config": { "accumulation": "coherent" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub components: Layout,
    #[serde(default)]
    pub victory: VictoryConditions,
    #[serde(default)]
    pub config: TracerConfig,
}

impl Level {
    /// Bundles and validates a level built in code.
    pub fn new(components: Layout, victory: VictoryConditions, config: TracerConfig) -> Result<Self> {
        let level = Self { name: None, components, victory, config };
        level.validate()?;
        Ok(level)
    }

    /// Parses and validates a level.
    pub fn from_json(json: &str) -> Result<Self> {
        let level: Level = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_level(&self.components, &self.victory, &self.config)
    }

    /// Traces the level and evaluates its victory conditions.
    ///
    /// # Returns
    /// * `Ok((TraceResult, VictoryResult))` for a valid level.
    /// * `Err(OpticsError)` if the config or conditions are invalid.
    pub fn play(&self) -> Result<(TraceResult, VictoryResult)> {
        let tracer = Tracer::with_config(self.config.clone())?;
        let trace = tracer.trace(&self.components);
        let victory = evaluate_victory(&self.victory, &self.components, trace.sensor_states())?;
        log::debug!(
            "level {} played: won = {}, score = {:.1}",
            self.name.as_deref().unwrap_or("<unnamed>"),
            victory.won,
            victory.score
        );
        Ok((trace, victory))
    }
}
