//! Grid geometry, numeric tolerances and documented parameter defaults.

/// Constants shared by the operators, the tracer and the evaluators
pub mod optics_constants {
    /// Lower bound of the percentage grid on both axes.
    pub const GRID_MIN: f64 = 0.0;
    /// Upper bound of the percentage grid on both axes.
    pub const GRID_MAX: f64 = 100.0;

    /// Intensity (in emitter units) below which light counts as absent.
    pub const DARK_EPSILON: f64 = 1e-9;
    /// Degree of polarization below which light counts as unpolarized.
    pub const UNPOLARIZED_DOP: f64 = 0.05;
    /// Half-width of the acceptance window around 45° / 135° for mirrors.
    pub const MIRROR_TOLERANCE_DEG: f64 = 5.0;

    /// Default emitter output.
    pub const DEFAULT_EMITTER_INTENSITY: f64 = 100.0;
    /// Default polarizer transmission axis.
    pub const DEFAULT_POLARIZER_ANGLE: f64 = 0.0;
    /// Default retardance of a generic wave plate (quarter wave).
    pub const DEFAULT_RETARDANCE_DEG: f64 = 90.0;
    /// Default rotator amount.
    pub const DEFAULT_ROTATION_DEG: f64 = 45.0;
    /// Default phase shifter setting.
    pub const DEFAULT_PHASE_SHIFT_DEG: f64 = 90.0;
    /// Default splitter orientation ("/" diagonal).
    pub const DEFAULT_SPLITTER_ORIENTATION: f64 = 45.0;
    /// Default non-polarizing splitter reflectance.
    pub const DEFAULT_REFLECTANCE: f64 = 0.5;
    /// Default quantum lock fidelity threshold.
    pub const DEFAULT_LOCK_FIDELITY: f64 = 0.99;
    /// Default angle window for scalar polarization matching.
    pub const DEFAULT_ANGLE_TOLERANCE_DEG: f64 = 10.0;
    /// Default fidelity a mine's safe state must reach to stay quiet.
    pub const DEFAULT_SAFE_TOLERANCE: f64 = 0.9;
}

/// Refractive indices, dispersion and specific rotations of common media.
pub mod material_constants {
    pub const N_AIR: f64 = 1.0;
    pub const N_WATER: f64 = 1.333;
    pub const N_GLASS: f64 = 1.5;
    pub const N_DIAMOND: f64 = 2.417;

    /// Calcite ordinary index.
    pub const CALCITE_N_O: f64 = 1.658;
    /// Calcite extraordinary index.
    pub const CALCITE_N_E: f64 = 1.486;

    /// Green light, in nanometres.
    pub const DEFAULT_WAVELENGTH_NM: f64 = 550.0;

    /// Specific rotations in deg·mL/(g·dm).
    pub const SUCROSE_SPECIFIC_ROTATION: f64 = 66.5;
    pub const FRUCTOSE_SPECIFIC_ROTATION: f64 = -92.4;
    pub const GLUCOSE_SPECIFIC_ROTATION: f64 = 52.7;
    pub const LACTOSE_SPECIFIC_ROTATION: f64 = 52.3;
}
