//! Error handling logic

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of a placed optical component.
/// Unique within a single `Layout`; supplied by the level data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ComponentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised at the construction boundary of components, states and conditions.
///
/// Evaluation results (no light, low fidelity, ...) are typed outcomes in
/// `crate::evaluation`, not errors. The tracer itself never fails for a
/// validated layout.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpticsError {
    /// A numeric input was NaN or infinite.
    #[error("Non-finite value for {field}: {value}")]
    NonFinite { field: String, value: f64 },

    /// A component was placed outside the 0..=100 grid.
    #[error("Component {id} at ({x}, {y}) lies outside the grid")]
    OutOfGrid { id: ComponentId, x: f64, y: f64 },

    /// A parameter is finite but outside its admissible range.
    #[error("Invalid parameter {field}: {message}")]
    InvalidParameter { field: String, message: String },

    /// Stokes parameters violating s1² + s2² + s3² <= s0².
    #[error("Unphysical Stokes vector: polarized power {polarized:.6} exceeds total {total:.6}")]
    UnphysicalStokes { polarized: f64, total: f64 },

    /// Two components share an id within one layout.
    #[error("Duplicate component id: {0}")]
    DuplicateComponent(ComponentId),

    /// A victory condition references a component missing from the layout.
    #[error("Unknown component referenced: {0}")]
    UnknownComponent(ComponentId),

    /// Conversion that needs a polarized state was given dark or unpolarized light.
    #[error("State is not polarized: {message}")]
    NotPolarized { message: String },

    /// Level, layout or config JSON could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for OpticsError {
    fn from(err: serde_json::Error) -> Self {
        OpticsError::Parse(err.to_string())
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, OpticsError>;

/// Rejects NaN / infinite values, naming the offending field.
pub(crate) fn ensure_finite(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(OpticsError::NonFinite { field: field.to_string(), value })
    }
}

/// Rejects negative (or non-finite) values.
pub(crate) fn ensure_non_negative(field: &str, value: f64) -> Result<f64> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(OpticsError::InvalidParameter {
            field: field.to_string(),
            message: format!("must be non-negative, got {}", value),
        });
    }
    Ok(value)
}

/// Rejects values outside [0, 1].
pub(crate) fn ensure_unit_interval(field: &str, value: f64) -> Result<f64> {
    ensure_finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(OpticsError::InvalidParameter {
            field: field.to_string(),
            message: format!("must lie in [0, 1], got {}", value),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_field() {
        let err = ensure_finite("polarizer.angle", f64::NAN).unwrap_err();
        assert!(err.to_string().contains("polarizer.angle"));

        let err = ensure_unit_interval("reflectance", 1.5).unwrap_err();
        assert!(matches!(err, OpticsError::InvalidParameter { .. }));
        assert!(ensure_non_negative("intensity", 0.0).is_ok());
    }

    #[test]
    fn test_json_errors_convert() {
        let err: OpticsError = serde_json::from_str::<f64>("not json").unwrap_err().into();
        assert!(matches!(err, OpticsError::Parse(_)));
    }
}
