// Physical constants used by the photon collision physics
// Values follow CODATA as used by the ENDF/EPICS photoatomic libraries

/// Electron rest mass energy in MeV
pub const ELECTRON_REST_MASS_ENERGY: f64 = 0.51099891013;

/// Classical electron radius in sqrt(barn) units (r_e = 2.8179403262e-13 cm,
/// 1 barn = 1e-24 cm^2, so r_e^2 = 7.940787e-2 barn)
pub const CLASSICAL_ELECTRON_RADIUS_SQ_BARN: f64 = 7.940787682e-2;

/// Threshold energy for pair production (2 * electron rest mass energy) in MeV
pub const PAIR_PRODUCTION_THRESHOLD: f64 = 2.0 * ELECTRON_REST_MASS_ENERGY;

/// Planck constant times the speed of light in MeV*cm, used to convert
/// photon energy to inverse wavelength for form-factor arguments
pub const PLANCK_TIMES_C: f64 = 1.2398419843320026e-10;
