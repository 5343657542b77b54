//! Positions and travel directions on the percentage grid.
//!
//! The grid uses screen coordinates: x grows to the right, y grows downwards,
//! so `Direction::Up` decreases y.

use super::constants::optics_constants::{GRID_MAX, GRID_MIN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the `[0, 100]²` grid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn in_grid(&self) -> bool {
        (GRID_MIN..=GRID_MAX).contains(&self.x) && (GRID_MIN..=GRID_MAX).contains(&self.y)
    }

    /// Moves `distance` along `direction`.
    pub fn step(&self, direction: Direction, distance: f64) -> Position {
        let (dx, dy) = direction.delta();
        Position::new(self.x + dx * distance, self.y + dy * distance)
    }

    /// Chebyshev distance, used for the square hit boxes.
    pub fn chebyshev(&self, other: &Position) -> f64 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    pub fn distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Clamps onto the grid boundary.
    pub fn clamped(&self) -> Position {
        Position::new(self.x.clamp(GRID_MIN, GRID_MAX), self.y.clamp(GRID_MIN, GRID_MAX))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Axis-aligned travel direction of a beam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Unit step `(dx, dy)` in screen coordinates.
    pub fn delta(self) -> (f64, f64) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        write!(f, "{}", name)
    }
}
