// src/circuits/mod.rs

//! Defines structures for representing and building a level's optical layout:
//! the ordered set of components placed on the `[0, 100]²` grid.
//!
//! A `Layout` is immutable once built. The tracer reads it by shared
//! reference, so editing a level means building a new layout and tracing again.

mod component;

pub use component::{ComponentKind, EmitterPolarization, OpticalComponent};

use crate::core::{ComponentId, OpticsError, Position, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// An ordered collection of uniquely identified components.
///
/// Order matters only for determinism: emitters are traced in layout order
/// and ties between simultaneous hits are broken by it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<OpticalComponent>", into = "Vec<OpticalComponent>")]
pub struct Layout {
    components: Vec<OpticalComponent>,
}

impl Layout {
    /// Creates a layout, rejecting duplicate ids.
    pub fn new(components: Vec<OpticalComponent>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(components.len());
        for component in &components {
            if !seen.insert(component.id().clone()) {
                return Err(OpticsError::DuplicateComponent(component.id().clone()));
            }
        }
        Ok(Self { components })
    }

    /// Parses a JSON array of components.
    ///
    /// Every component is validated on the way in; missing optional
    /// parameters take their documented defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the components in layout order.
    pub fn components(&self) -> &[OpticalComponent] {
        &self.components
    }

    pub fn get(&self, id: &ComponentId) -> Option<&OpticalComponent> {
        self.components.iter().find(|c| c.id() == id)
    }

    pub fn emitters(&self) -> impl Iterator<Item = &OpticalComponent> {
        self.components.iter().filter(|c| c.kind().is_emitter())
    }

    /// Sensors, locks, interferometer targets and mines.
    pub fn detectors(&self) -> impl Iterator<Item = &OpticalComponent> {
        self.components.iter().filter(|c| c.kind().is_detector())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl TryFrom<Vec<OpticalComponent>> for Layout {
    type Error = OpticsError;

    fn try_from(components: Vec<OpticalComponent>) -> Result<Self> {
        Layout::new(components)
    }
}

impl From<Layout> for Vec<OpticalComponent> {
    fn from(layout: Layout) -> Self {
        layout.components
    }
}

//-------------------------------------------------------------------------
// Layout Builder
//-------------------------------------------------------------------------

/// A helper for programmatically constructing `Layout` instances using method chaining.
///
/// The first construction error is kept and reported by `build`, so a chain
/// of `place` calls needs a single `?` at the end.
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    components: Vec<OpticalComponent>,
    error: Option<OpticsError>,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an already validated component.
    pub fn add(mut self, component: OpticalComponent) -> Self {
        self.components.push(component);
        self
    }

    /// Adds several components in order.
    pub fn add_all<I>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = OpticalComponent>,
    {
        self.components.extend(components);
        self
    }

    /// Places a new component at `(x, y)`.
    pub fn place(mut self, id: &str, x: f64, y: f64, kind: ComponentKind) -> Self {
        match OpticalComponent::new(id, Position::new(x, y), kind) {
            Ok(component) => self.components.push(component),
            Err(err) => {
                if self.error.is_none() {
                    self.error = Some(err);
                }
            }
        }
        self
    }

    /// Finalizes the layout, reporting the first invalid component or duplicate id.
    pub fn build(self) -> Result<Layout> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Layout::new(self.components)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return writeln!(f, "polarcraft::Layout[0 components]");
        }

        // --- Coarse map: 5% per column, 10% per row ---
        const COLS: usize = 21;
        const ROWS: usize = 11;
        let mut grid = vec![vec!['·'; COLS]; ROWS];
        for component in &self.components {
            let p = component.position();
            let col = ((p.x / 5.0).round() as usize).min(COLS - 1);
            let row = ((p.y / 10.0).round() as usize).min(ROWS - 1);
            grid[row][col] = component.kind().glyph();
        }

        writeln!(f, "polarcraft::Layout[{} components]", self.components.len())?;
        for row in &grid {
            writeln!(f, "  {}", row.iter().collect::<String>())?;
        }
        for component in &self.components {
            writeln!(f, "  {}", component)?;
        }
        Ok(())
    }
}
