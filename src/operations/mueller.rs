//! Mueller matrices acting on Stokes vectors.
//!
//! Needed wherever light may be partially polarized (incoherent mixtures at a
//! detector, depolarizing elements). Every Jones element converts exactly via
//! `MuellerMatrix::from_jones`, so both calculi share one sign convention.

use super::{polarizer, rotator, wave_plate};
use crate::core::error::{ensure_finite, ensure_unit_interval, Result};
use crate::core::{Angle, JonesMatrix, StokesVector, C64};
use num_complex::Complex;
use num_traits::{One, Zero};
use std::fmt;

/// A real 4x4 Mueller matrix, row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuellerMatrix {
    m: [[f64; 4]; 4],
}

/// Basis matrices `σ_k` with `s_k = tr(σ_k · ρ)` for the coherency matrix `ρ = v·v†`.
fn stokes_basis() -> [JonesMatrix; 4] {
    let one = C64::one();
    let zero = C64::zero();
    let i = Complex::i();
    [
        JonesMatrix::new([[one, zero], [zero, one]]),
        JonesMatrix::new([[one, zero], [zero, -one]]),
        JonesMatrix::new([[zero, one], [one, zero]]),
        JonesMatrix::new([[zero, i], [-i, zero]]),
    ]
}

impl MuellerMatrix {
    pub fn new(m: [[f64; 4]; 4]) -> Result<Self> {
        for row in m.iter() {
            for value in row.iter() {
                ensure_finite("mueller.entry", *value)?;
            }
        }
        Ok(Self { m })
    }

    pub fn identity() -> Self {
        let mut m = [[0.0; 4]; 4];
        for (k, row) in m.iter_mut().enumerate() {
            row[k] = 1.0;
        }
        Self { m }
    }

    pub fn entries(&self) -> &[[f64; 4]; 4] {
        &self.m
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.m[row.min(3)][col.min(3)]
    }

    /// Exact Mueller matrix of a (possibly lossy) Jones element:
    /// `M_ij = ½·Re tr(σ_i · J · σ_j · J†)`.
    pub fn from_jones(j: &JonesMatrix) -> Self {
        let basis = stokes_basis();
        let j_adj = j.adjoint();
        let mut m = [[0.0; 4]; 4];
        for (row, sigma_i) in basis.iter().enumerate() {
            for (col, sigma_j) in basis.iter().enumerate() {
                let product = sigma_i.matmul(j).matmul(sigma_j).matmul(&j_adj);
                m[row][col] = 0.5 * product.trace().re;
            }
        }
        Self { m }
    }

    /// Ideal linear polarizer (transmits half of unpolarized light).
    pub fn linear_polarizer(angle: Angle) -> Self {
        Self::from_jones(&polarizer(angle))
    }

    /// Linear retarder; `retardance_deg` on the slow axis.
    pub fn retarder(retardance_deg: f64, fast_axis: Angle) -> Self {
        Self::from_jones(&wave_plate(fast_axis, retardance_deg.to_radians()))
    }

    pub fn quarter_wave_plate(fast_axis: Angle) -> Self {
        Self::retarder(90.0, fast_axis)
    }

    pub fn half_wave_plate(fast_axis: Angle) -> Self {
        Self::retarder(180.0, fast_axis)
    }

    pub fn rotator(amount_deg: f64) -> Self {
        Self::from_jones(&rotator(amount_deg))
    }

    /// Diattenuator passing everything along `axis` and `1 − D` of the
    /// intensity polarized perpendicular to it.
    pub fn partial_polarizer(diattenuation: f64, axis: Angle) -> Result<Self> {
        let d = ensure_unit_interval("partialPolarizer.diattenuation", diattenuation)?;
        let aligned = JonesMatrix::real(1.0, 0.0, 0.0, (1.0 - d).sqrt());
        let turn = rotator(axis.degrees());
        let back = rotator(-axis.degrees());
        Ok(Self::from_jones(&turn.matmul(&aligned).matmul(&back)))
    }

    /// Isotropic depolarizer shrinking the polarized part by `1 − depolarization`.
    pub fn depolarizer(depolarization: f64) -> Result<Self> {
        let keep = 1.0 - ensure_unit_interval("depolarizer.depolarization", depolarization)?;
        let mut m = [[0.0; 4]; 4];
        m[0][0] = 1.0;
        for (k, row) in m.iter_mut().enumerate().skip(1) {
            row[k] = keep;
        }
        Ok(Self { m })
    }

    /// `self · other`: `other` acts on the light first.
    pub fn matmul(&self, other: &MuellerMatrix) -> MuellerMatrix {
        let mut out = [[0.0; 4]; 4];
        for (row, out_row) in out.iter_mut().enumerate() {
            for (col, cell) in out_row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[row][k] * other.m[k][col]).sum();
            }
        }
        MuellerMatrix { m: out }
    }

    /// The same element physically turned by `angle`.
    pub fn rotated(&self, angle: Angle) -> MuellerMatrix {
        let turn = Self::rotator(angle.degrees());
        let back = Self::rotator(-angle.degrees());
        turn.matmul(self).matmul(&back)
    }

    pub fn apply(&self, stokes: &StokesVector) -> StokesVector {
        let s = stokes.as_array();
        let mut out = [0.0; 4];
        for (row, value) in out.iter_mut().enumerate() {
            *value = (0..4).map(|k| self.m[row][k] * s[k]).sum();
        }
        StokesVector::from_parts(out[0].max(0.0), out[1], out[2], out[3])
    }

    /// `D = √(M01² + M02² + M03²) / M00`, in `[0, 1]`.
    pub fn diattenuation(&self) -> f64 {
        if self.m[0][0].abs() < f64::EPSILON {
            return 0.0;
        }
        let d = (self.m[0][1].powi(2) + self.m[0][2].powi(2) + self.m[0][3].powi(2)).sqrt() / self.m[0][0];
        d.min(1.0)
    }

    /// `P = √(M10² + M20² + M30²) / M00`, in `[0, 1]`.
    pub fn polarizance(&self) -> f64 {
        if self.m[0][0].abs() < f64::EPSILON {
            return 0.0;
        }
        let p = (self.m[1][0].powi(2) + self.m[2][0].powi(2) + self.m[3][0].powi(2)).sqrt() / self.m[0][0];
        p.min(1.0)
    }

    /// `Δ = 1 − √(tr(MᵀM) − M00²) / (√3·M00)`; 0 for Jones-derived elements.
    pub fn depolarization_index(&self) -> f64 {
        let m00 = self.m[0][0];
        if m00.abs() < f64::EPSILON {
            return 1.0;
        }
        let frobenius_sq: f64 = self.m.iter().flat_map(|row| row.iter()).map(|v| v * v).sum();
        let numerator = (frobenius_sq - m00 * m00).max(0.0).sqrt();
        (1.0 - numerator / (3f64.sqrt() * m00)).clamp(0.0, 1.0)
    }

    pub fn approx_eq(&self, other: &MuellerMatrix, tolerance: f64) -> bool {
        self.m
            .iter()
            .flat_map(|row| row.iter())
            .zip(other.m.iter().flat_map(|row| row.iter()))
            .all(|(a, b)| (a - b).abs() < tolerance)
    }
}

impl Default for MuellerMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for MuellerMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mueller[")?;
        for row in self.m.iter() {
            writeln!(f, "  [{:>8.4}, {:>8.4}, {:>8.4}, {:>8.4}]", row[0], row[1], row[2], row[3])?;
        }
        write!(f, "]")
    }
}
