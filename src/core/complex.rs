// src/core/complex.rs

//! Complex scalar and 2x2 complex matrix primitives used by the Jones calculus.

use super::state::JonesVector;
use num_complex::Complex;
use num_traits::{One, Zero};
use std::fmt;
use std::ops::Mul;

/// Complex amplitude with `f64` components.
pub type C64 = Complex<f64>;

/// Unit-magnitude phasor `e^(iθ)` = `(cos θ, sin θ)`.
///
/// Builds the retardance factors of wave plates and phase shifters.
#[inline]
pub fn phasor(theta: f64) -> C64 {
    Complex::new(theta.cos(), theta.sin())
}

/// Squared magnitude `|z|²`.
#[inline]
pub fn abs2(z: C64) -> f64 {
    z.norm_sqr()
}

/// A 2x2 complex matrix acting on Jones vectors.
///
/// Row-major: `m[row][col]`. Composition follows the optical path, so for
/// light passing through `a` first and then `b` the system matrix is
/// `b.matmul(&a)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JonesMatrix {
    m: [[C64; 2]; 2],
}

impl JonesMatrix {
    pub const fn new(m: [[C64; 2]; 2]) -> Self {
        Self { m }
    }

    /// Builds a matrix with purely real entries.
    pub fn real(a00: f64, a01: f64, a10: f64, a11: f64) -> Self {
        Self::new([
            [Complex::new(a00, 0.0), Complex::new(a01, 0.0)],
            [Complex::new(a10, 0.0), Complex::new(a11, 0.0)],
        ])
    }

    pub fn identity() -> Self {
        Self::new([[C64::one(), C64::zero()], [C64::zero(), C64::one()]])
    }

    pub fn zero() -> Self {
        Self::new([[C64::zero(); 2]; 2])
    }

    /// Entry at (`row`, `col`), or `None` outside the 2x2 range.
    pub fn get(&self, row: usize, col: usize) -> Option<C64> {
        self.m.get(row)?.get(col).copied()
    }

    pub fn trace(&self) -> C64 {
        self.m[0][0] + self.m[1][1]
    }

    pub fn entries(&self) -> &[[C64; 2]; 2] {
        &self.m
    }

    /// `M · v`.
    pub fn apply(&self, v: &JonesVector) -> JonesVector {
        let [ex, ey] = v.components();
        JonesVector::from_components(
            self.m[0][0] * ex + self.m[0][1] * ey,
            self.m[1][0] * ex + self.m[1][1] * ey,
        )
    }

    /// `self · other`; `other` acts on the light first.
    pub fn matmul(&self, other: &JonesMatrix) -> JonesMatrix {
        let mut out = [[C64::zero(); 2]; 2];
        for (row, out_row) in out.iter_mut().enumerate() {
            for (col, cell) in out_row.iter_mut().enumerate() {
                *cell = self.m[row][0] * other.m[0][col] + self.m[row][1] * other.m[1][col];
            }
        }
        JonesMatrix::new(out)
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> JonesMatrix {
        JonesMatrix::new([
            [self.m[0][0].conj(), self.m[1][0].conj()],
            [self.m[0][1].conj(), self.m[1][1].conj()],
        ])
    }

    pub fn scale(&self, factor: C64) -> JonesMatrix {
        let mut out = self.m;
        for row in out.iter_mut() {
            for cell in row.iter_mut() {
                *cell *= factor;
            }
        }
        JonesMatrix::new(out)
    }

    pub fn determinant(&self) -> C64 {
        self.m[0][0] * self.m[1][1] - self.m[0][1] * self.m[1][0]
    }

    /// True when `M†M = I` within `tolerance` (lossless element).
    pub fn is_unitary(&self, tolerance: f64) -> bool {
        let product = self.adjoint().matmul(self);
        let identity = JonesMatrix::identity();
        (0..2).all(|r| (0..2).all(|c| abs2(product.m[r][c] - identity.m[r][c]) < tolerance * tolerance))
    }

    /// Entry-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &JonesMatrix, tolerance: f64) -> bool {
        (0..2).all(|r| (0..2).all(|c| abs2(self.m[r][c] - other.m[r][c]) < tolerance * tolerance))
    }
}

impl Default for JonesMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for JonesMatrix {
    type Output = JonesMatrix;

    fn mul(self, rhs: JonesMatrix) -> JonesMatrix {
        self.matmul(&rhs)
    }
}

impl Mul<JonesVector> for JonesMatrix {
    type Output = JonesVector;

    fn mul(self, rhs: JonesVector) -> JonesVector {
        self.apply(&rhs)
    }
}

impl fmt::Display for JonesMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[[{:.4}, {:.4}], [{:.4}, {:.4}]]",
            self.m[0][0], self.m[0][1], self.m[1][0], self.m[1][1]
        )
    }
}
