// src/operations/fresnel.rs

//! Reflection and refraction at a planar interface between two media.
//!
//! Jones matrices built here use the p direction (in the plane of incidence)
//! as x and the s direction (perpendicular to it) as y.

use crate::core::error::{ensure_finite, OpticsError, Result};
use crate::core::{JonesMatrix, C64};
use num_complex::Complex;
use serde::Serialize;
use std::fmt;

fn ensure_index(field: &str, n: f64) -> Result<f64> {
    ensure_finite(field, n)?;
    if n <= 0.0 {
        return Err(OpticsError::InvalidParameter {
            field: field.to_string(),
            message: format!("refractive index must be positive, got {}", n),
        });
    }
    Ok(n)
}

fn ensure_incidence(incidence_deg: f64) -> Result<f64> {
    ensure_finite("interface.incidence", incidence_deg)?;
    if !(0.0..90.0).contains(&incidence_deg) {
        return Err(OpticsError::InvalidParameter {
            field: "interface.incidence".to_string(),
            message: format!("angle of incidence must lie in [0, 90), got {}", incidence_deg),
        });
    }
    Ok(incidence_deg)
}

/// Amplitude and intensity coefficients for one angle of incidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FresnelCoefficients {
    pub rs: f64,
    pub rp: f64,
    pub ts: f64,
    pub tp: f64,
    pub reflectance_s: f64,
    pub reflectance_p: f64,
    pub transmittance_s: f64,
    pub transmittance_p: f64,
    /// Refraction angle in degrees; `None` under total internal reflection.
    pub refraction_angle: Option<f64>,
}

impl FresnelCoefficients {
    pub fn total_internal_reflection(&self) -> bool {
        self.refraction_angle.is_none()
    }

    /// Reflectance of unpolarized light, the mean of the s and p values.
    pub fn unpolarized_reflectance(&self) -> f64 {
        0.5 * (self.reflectance_s + self.reflectance_p)
    }
}

/// A planar boundary from a medium of index `n1` into one of index `n2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interface {
    n1: f64,
    n2: f64,
}

impl Interface {
    pub fn new(n1: f64, n2: f64) -> Result<Self> {
        Ok(Self { n1: ensure_index("interface.n1", n1)?, n2: ensure_index("interface.n2", n2)? })
    }

    pub fn n1(&self) -> f64 {
        self.n1
    }

    pub fn n2(&self) -> f64 {
        self.n2
    }

    /// The same boundary crossed the other way.
    pub fn reversed(&self) -> Interface {
        Interface { n1: self.n2, n2: self.n1 }
    }

    /// Snell's law `n1·sin θ1 = n2·sin θ2`, in degrees.
    /// `None` when the light is totally internally reflected.
    pub fn refraction_angle(&self, incidence_deg: f64) -> Option<f64> {
        let sin_t = self.n1 / self.n2 * incidence_deg.to_radians().sin();
        if sin_t.abs() > 1.0 {
            return None;
        }
        Some(sin_t.asin().to_degrees())
    }

    /// Angle at which p-polarized light is not reflected: `atan(n2 / n1)`.
    pub fn brewster_angle(&self) -> f64 {
        (self.n2 / self.n1).atan().to_degrees()
    }

    /// Onset of total internal reflection; only exists going into a rarer medium.
    pub fn critical_angle(&self) -> Option<f64> {
        if self.n1 <= self.n2 {
            return None;
        }
        Some((self.n2 / self.n1).asin().to_degrees())
    }

    /// Fresnel equations at `incidence_deg` in `[0, 90)`.
    pub fn coefficients(&self, incidence_deg: f64) -> Result<FresnelCoefficients> {
        let incidence = ensure_incidence(incidence_deg)?;
        let (n1, n2) = (self.n1, self.n2);
        let Some(refraction) = self.refraction_angle(incidence) else {
            return Ok(FresnelCoefficients {
                rs: 1.0,
                rp: 1.0,
                ts: 0.0,
                tp: 0.0,
                reflectance_s: 1.0,
                reflectance_p: 1.0,
                transmittance_s: 0.0,
                transmittance_p: 0.0,
                refraction_angle: None,
            });
        };
        let cos_i = incidence.to_radians().cos();
        let cos_t = refraction.to_radians().cos();

        let rs = (n1 * cos_i - n2 * cos_t) / (n1 * cos_i + n2 * cos_t);
        let ts = 2.0 * n1 * cos_i / (n1 * cos_i + n2 * cos_t);
        let rp = (n2 * cos_i - n1 * cos_t) / (n2 * cos_i + n1 * cos_t);
        let tp = 2.0 * n1 * cos_i / (n2 * cos_i + n1 * cos_t);

        // power crosses the boundary through a differently sized beam cross-section
        let beam_factor = (n2 * cos_t) / (n1 * cos_i);
        Ok(FresnelCoefficients {
            rs,
            rp,
            ts,
            tp,
            reflectance_s: rs * rs,
            reflectance_p: rp * rp,
            transmittance_s: beam_factor * ts * ts,
            transmittance_p: beam_factor * tp * tp,
            refraction_angle: Some(refraction),
        })
    }

    /// Jones matrix of the reflected light, `diag(rp, rs)`.
    pub fn reflection_matrix(&self, incidence_deg: f64) -> Result<JonesMatrix> {
        let c = self.coefficients(incidence_deg)?;
        Ok(diagonal(c.rp, c.rs))
    }

    /// Jones matrix of the transmitted light, scaled so that output
    /// intensities equal the transmittances.
    pub fn transmission_matrix(&self, incidence_deg: f64) -> Result<JonesMatrix> {
        let c = self.coefficients(incidence_deg)?;
        Ok(diagonal(c.transmittance_p.sqrt(), c.transmittance_s.sqrt()))
    }
}

fn diagonal(p: f64, s: f64) -> JonesMatrix {
    let zero = C64::new(0.0, 0.0);
    JonesMatrix::new([[Complex::new(p, 0.0), zero], [zero, Complex::new(s, 0.0)]])
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n {:.3} -> {:.3}", self.n1, self.n2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::material_constants::{N_AIR, N_GLASS, N_WATER};
    use crate::core::{JonesVector, StokesVector};
    use crate::operations::MuellerMatrix;

    const TOL: f64 = 1e-9;

    fn air_glass() -> Interface {
        Interface::new(N_AIR, N_GLASS).unwrap()
    }

    #[test]
    fn test_normal_incidence_reflects_four_percent() {
        let c = air_glass().coefficients(0.0).unwrap();
        assert!((c.reflectance_s - 0.04).abs() < TOL);
        assert!((c.reflectance_p - 0.04).abs() < TOL);
        assert!((c.rs + 0.2).abs() < TOL);
        assert_eq!(c.refraction_angle, Some(0.0));
    }

    #[test]
    fn test_energy_is_conserved_for_both_polarizations() {
        for interface in [air_glass(), air_glass().reversed(), Interface::new(N_AIR, N_WATER).unwrap()] {
            for k in 0..18 {
                let c = interface.coefficients(k as f64 * 5.0).unwrap();
                assert!((c.reflectance_s + c.transmittance_s - 1.0).abs() < 1e-9, "{} at {}", interface, k * 5);
                assert!((c.reflectance_p + c.transmittance_p - 1.0).abs() < 1e-9, "{} at {}", interface, k * 5);
            }
        }
    }

    #[test]
    fn test_brewster_angle_extinguishes_p_reflection() {
        let interface = air_glass();
        let brewster = interface.brewster_angle();
        assert!((brewster - 56.309932474).abs() < 1e-6);
        let c = interface.coefficients(brewster).unwrap();
        assert!(c.reflectance_p < 1e-20);
        assert!(c.reflectance_s > 0.1);

        // unpolarized light comes off the surface fully s-polarized
        let reflect = MuellerMatrix::from_jones(&interface.reflection_matrix(brewster).unwrap());
        let reflected = reflect.apply(&StokesVector::unpolarized(1.0));
        assert!((reflected.degree_of_polarization() - 1.0).abs() < 1e-9);
        assert!((reflected.intensity() - c.unpolarized_reflectance()).abs() < 1e-12);
        let shape = reflected.to_jones().unwrap();
        assert!((crate::evaluation::fidelity(&JonesVector::vertical(), &shape) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_internal_reflection_beyond_critical_angle() {
        let glass_air = air_glass().reversed();
        assert_eq!(air_glass().critical_angle(), None);
        let critical = glass_air.critical_angle().unwrap();
        assert!((critical - 41.810314896).abs() < 1e-6);
        assert!(glass_air.refraction_angle(critical - 1.0).is_some());
        let c = glass_air.coefficients(critical + 1.0).unwrap();
        assert!(c.total_internal_reflection());
        assert_eq!(c.reflectance_s, 1.0);
        assert_eq!(c.transmittance_p, 0.0);
    }

    #[test]
    fn test_transmission_matrix_carries_transmittance() {
        let interface = air_glass();
        let c = interface.coefficients(30.0).unwrap();
        let out = interface.transmission_matrix(30.0).unwrap().apply(&JonesVector::horizontal());
        assert!((out.intensity() - c.transmittance_p).abs() < TOL);
        let refracted = interface.refraction_angle(30.0).unwrap();
        assert!((N_GLASS * refracted.to_radians().sin() - 0.5).abs() < TOL);
    }

    #[test]
    fn test_rejects_bad_media_and_angles() {
        assert!(matches!(Interface::new(0.0, 1.5), Err(OpticsError::InvalidParameter { .. })));
        assert!(matches!(Interface::new(f64::NAN, 1.5), Err(OpticsError::NonFinite { .. })));
        assert!(air_glass().coefficients(90.0).is_err());
        assert!(air_glass().coefficients(-1.0).is_err());
    }
}
