// tests/optics_tests.rs

use polarcraft::core::{Angle, Handedness, JonesVector, StokesVector};
use polarcraft::evaluation::{fidelity, stokes_fidelity};
use polarcraft::operations::{
    circular_projector, half_wave_plate, malus_intensity, polarizer, quarter_wave_plate, rotator,
    split_non_polarizing, split_polarizing, MuellerMatrix, OpticalElement,
};
use polarcraft::validation::{check_energy_conservation, check_normalization, check_stokes_realizable};
use polarcraft::OpticsError;

const TOL: f64 = 1e-9;

#[test]
fn test_malus_law_exact_at_parallel_and_crossed() {
    let h = JonesVector::horizontal().scaled(10.0);
    assert_eq!(polarizer(Angle::HORIZONTAL).apply(&h).intensity(), h.intensity());
    assert!(polarizer(Angle::VERTICAL).apply(&h).intensity() < 1e-25);
    assert!((malus_intensity(100.0, Angle::new(0.0), Angle::new(60.0)) - 25.0).abs() < TOL);
}

#[test]
fn test_half_wave_plate_reflects_linear_angle() -> Result<(), OpticsError> {
    let input = JonesVector::linear(Angle::new(20.0));
    let out = half_wave_plate(Angle::new(35.0)).apply(&input);
    assert!((out.intensity() - 1.0).abs() < TOL);
    let angle = out.linear_angle().ok_or_else(|| OpticsError::NotPolarized { message: "not linear".into() })?;
    assert!(angle.difference(Angle::new(50.0)) < 1e-6);
    Ok(())
}

#[test]
fn test_quarter_wave_plates_undo_each_other() {
    let input = JonesVector::linear(Angle::new(17.0));
    let there = quarter_wave_plate(Angle::new(45.0)).apply(&input);
    assert!(there.linear_angle().is_none());
    let back = quarter_wave_plate(Angle::new(-45.0)).apply(&there);
    assert!(back.approx_eq_up_to_phase(&input, 1e-9));
}

#[test]
fn test_horizontal_through_quarter_wave_is_right_circular() {
    let out = quarter_wave_plate(Angle::DIAGONAL).apply(&JonesVector::horizontal());
    assert!((fidelity(&JonesVector::right_circular(), &out) - 1.0).abs() < TOL);
    assert_eq!(out.to_stokes().handedness(), Some(Handedness::Right));
}

#[test]
fn test_fidelity_identity_and_orthogonality() {
    let v = JonesVector::linear(Angle::new(72.0)).scaled(4.0);
    assert!((fidelity(&v, &v) - 1.0).abs() < TOL);
    assert!(fidelity(&JonesVector::right_circular(), &JonesVector::left_circular()) < TOL);
    assert!(fidelity(&JonesVector::diagonal(), &JonesVector::anti_diagonal()) < TOL);
}

#[test]
fn test_rotator_and_circular_filter() {
    let out = rotator(30.0).apply(&JonesVector::horizontal());
    assert!(out.approx_eq_up_to_phase(&JonesVector::linear(Angle::new(30.0)), 1e-9));
    // any linear state is half right circular
    let filtered = circular_projector(Handedness::Right).apply(&out.scaled(2.0));
    assert!((filtered.intensity() - 2.0).abs() < TOL);
}

#[test]
fn test_splitters_conserve_energy() -> Result<(), OpticsError> {
    let input = JonesVector::linear(Angle::new(63.0)).scaled(5.0);
    let (o, e) = split_polarizing(&input, Angle::new(20.0));
    check_energy_conservation(input.intensity(), &[o.intensity(), e.intensity()], None)?;
    let (t, r) = split_non_polarizing(&input, 0.3);
    check_energy_conservation(input.intensity(), &[t.intensity(), r.intensity()], None)?;
    assert!((r.intensity() - 0.3 * input.intensity()).abs() < TOL);
    Ok(())
}

#[test]
fn test_stokes_round_trip_and_mixtures() -> Result<(), OpticsError> {
    let v = quarter_wave_plate(Angle::new(20.0)).apply(&JonesVector::linear(Angle::new(70.0)));
    check_normalization(&v, None)?;
    let back = v.to_stokes().to_jones()?;
    assert!(back.approx_eq_up_to_phase(&v, 1e-9));

    let mixed = JonesVector::horizontal().to_stokes() + JonesVector::vertical().to_stokes();
    assert!(mixed.degree_of_polarization() < TOL);
    assert!(mixed.to_jones().is_err());

    let partial = JonesVector::horizontal().to_stokes() * 3.0 + StokesVector::unpolarized(1.0);
    check_stokes_realizable(&partial, None)?;
    assert!((partial.degree_of_polarization() - 0.75).abs() < TOL);
    assert!((stokes_fidelity(&JonesVector::horizontal(), &partial) - 0.875).abs() < TOL);
    Ok(())
}

#[test]
fn test_mueller_matches_jones_for_every_element() {
    let input = JonesVector::linear(Angle::new(12.0)).scaled(2.0);
    for seed in 0..20 {
        let element = OpticalElement::random(seed);
        let jones_out = element.apply(&input).to_stokes();
        let mueller_out = MuellerMatrix::from_jones(&element.jones_matrix()).apply(&input.to_stokes());
        assert!(jones_out.approx_eq(&mueller_out, 1e-9), "{} disagrees", element);
    }
}

#[test]
fn test_depolarizer_and_partial_polarizer() -> Result<(), OpticsError> {
    let light = JonesVector::diagonal().to_stokes();
    let out = MuellerMatrix::depolarizer(1.0)?.apply(&light);
    assert!(out.degree_of_polarization() < TOL);
    assert!((out.intensity() - 1.0).abs() < TOL);

    let weak = MuellerMatrix::partial_polarizer(0.5, Angle::HORIZONTAL)?;
    // transmittances 1 and 1 - D
    assert!((weak.diattenuation() - 0.5 / 1.5).abs() < 1e-9);
    assert!(MuellerMatrix::partial_polarizer(1.5, Angle::HORIZONTAL).is_err());
    Ok(())
}
