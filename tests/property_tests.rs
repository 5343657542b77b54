// tests/property_tests.rs

use polarcraft::core::{Angle, JonesVector};
use polarcraft::evaluation::{fidelity, stokes_fidelity};
use polarcraft::operations::{
    half_wave_plate, polarizer, quarter_wave_plate, split_non_polarizing, split_polarizing, wave_plate,
    MuellerMatrix,
};
use proptest::prelude::*;

fn angle() -> impl Strategy<Value = f64> {
    0.0f64..180.0
}

// Arbitrary pure state with intensity in [0.1, 10]
fn jones() -> impl Strategy<Value = JonesVector> {
    (angle(), -45.0f64..45.0, 0.1f64..10.0, -3.2f64..3.2).prop_map(|(psi, chi, intensity, phase)| {
        let base = quarter_wave_plate(Angle::new(psi)).apply(&JonesVector::linear(Angle::new(psi + chi)));
        base.with_intensity(intensity)
            .scaled_complex(num_complex::Complex::from_polar(1.0, phase))
    })
}

proptest! {
    #[test]
    fn malus_law_holds(input in angle(), axis in angle(), intensity in 0.0f64..100.0) {
        let v = JonesVector::linear(Angle::new(input)).with_intensity(intensity);
        let out = polarizer(Angle::new(axis)).apply(&v).intensity();
        let expected = intensity * (input - axis).to_radians().cos().powi(2);
        prop_assert!((out - expected).abs() < 1e-9 * intensity.max(1.0));
    }

    #[test]
    fn half_wave_plate_mirrors_about_fast_axis(theta in angle(), alpha in angle()) {
        let out = half_wave_plate(Angle::new(alpha)).apply(&JonesVector::linear(Angle::new(theta)));
        prop_assert!((out.intensity() - 1.0).abs() < 1e-9);
        let expected = JonesVector::linear(Angle::new(2.0 * alpha - theta));
        prop_assert!(fidelity(&expected, &out) > 1.0 - 1e-9);
    }

    #[test]
    fn splitters_conserve_energy(v in jones(), axis in angle(), reflectance in 0.0f64..=1.0) {
        let (o, e) = split_polarizing(&v, Angle::new(axis));
        prop_assert!((o.intensity() + e.intensity() - v.intensity()).abs() < 1e-9 * v.intensity().max(1.0));
        let (t, r) = split_non_polarizing(&v, reflectance);
        prop_assert!((t.intensity() + r.intensity() - v.intensity()).abs() < 1e-9 * v.intensity().max(1.0));
    }

    #[test]
    fn fidelity_is_symmetric_and_bounded(a in jones(), b in jones()) {
        let f = fidelity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&f));
        prop_assert!((f - fidelity(&b, &a)).abs() < 1e-12);
        prop_assert!((fidelity(&a, &a) - 1.0).abs() < 1e-9);
        prop_assert!((stokes_fidelity(&a, &b.to_stokes()) - f).abs() < 1e-9);
    }

    #[test]
    fn stokes_round_trip_preserves_state(v in jones()) {
        let back = v.to_stokes().to_jones();
        prop_assert!(back.is_ok());
        if let Ok(back) = back {
            prop_assert!(back.approx_eq_up_to_phase(&v, 1e-7));
        }
    }

    #[test]
    fn mueller_agrees_with_jones(v in jones(), axis in angle(), retardance in 0.0f64..6.3) {
        let j = wave_plate(Angle::new(axis), retardance).matmul(&polarizer(Angle::new(axis + 10.0)));
        let via_jones = j.apply(&v).to_stokes();
        let via_mueller = MuellerMatrix::from_jones(&j).apply(&v.to_stokes());
        prop_assert!(via_jones.approx_eq(&via_mueller, 1e-8));
    }

    #[test]
    fn retarders_are_unitary(axis in angle(), retardance in 0.0f64..6.3) {
        prop_assert!(wave_plate(Angle::new(axis), retardance).is_unitary(1e-12));
    }
}
