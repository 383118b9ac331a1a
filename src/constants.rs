//! # Constants
//!
//! Physical constants used by the contact equations. Everything is SI: energies in J,
//! potentials in V, densities in m^-3.

pub const BOLTZMANN: f64 = 1.380649e-23; // J / K
pub const ELECTRON_CHARGE: f64 = 1.602176634e-19; // C
pub const EPSILON_0: f64 = 8.8541878128e-12; // F / m

/// Thermal voltage per kelvin, `k / e`.
pub const THERMAL_VOLTAGE_PER_KELVIN: f64 = BOLTZMANN / ELECTRON_CHARGE;
