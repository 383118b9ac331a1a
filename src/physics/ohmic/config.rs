use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ContactError;

/// Carrier statistics used to pin the contact densities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistics {
    #[default]
    Boltzmann,
    Fermi,
}

/// Surface recombination treatment, fixed for the lifetime of a contact.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Recombination {
    /// Emission currents with finite surface recombination velocities (m/s).
    Finite {
        electron_velocity: f64,
        hole_velocity: f64,
    },
    /// Densities pinned to their equilibrium values.
    Infinite {
        #[serde(default)]
        statistics: Statistics,
    },
}

impl Recombination {
    pub fn is_infinite(&self) -> bool {
        matches!(self, Recombination::Infinite { .. })
    }
}

const DEFAULT_RECOMBINATION_VELOCITY: f64 = 2.573e4;

fn unit_width() -> f64 {
    1.0
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct OhmicConfig {
    pub recombination: Recombination,
    /// Out-of-plane device extent applied to terminal currents; 1 for 3D meshes.
    #[serde(default = "unit_width")]
    pub z_width: f64,
}

impl Default for OhmicConfig {
    fn default() -> Self {
        Self::finite(DEFAULT_RECOMBINATION_VELOCITY, DEFAULT_RECOMBINATION_VELOCITY)
    }
}

impl OhmicConfig {
    pub fn finite(electron_velocity: f64, hole_velocity: f64) -> Self {
        Self {
            recombination: Recombination::Finite {
                electron_velocity,
                hole_velocity,
            },
            z_width: 1.0,
        }
    }

    pub fn infinite(statistics: Statistics) -> Self {
        Self {
            recombination: Recombination::Infinite { statistics },
            z_width: 1.0,
        }
    }

    pub fn with_z_width(mut self, z_width: f64) -> Self {
        self.z_width = z_width;
        self
    }

    /// Resolve a configuration from named scalars.
    ///
    /// `pinned = Some(statistics)` selects the infinite regime, which needs no
    /// velocities; otherwise `elec.recomb.velocity` and `hole.recomb.velocity`
    /// are required. `z.width` defaults to 1.
    pub fn from_scalars<P: ScalarParameters>(
        params: &P,
        pinned: Option<Statistics>,
    ) -> Result<Self, ContactError> {
        let config = match pinned {
            Some(statistics) => Self::infinite(statistics),
            None => Self::finite(
                require(params, "elec.recomb.velocity")?,
                require(params, "hole.recomb.velocity")?,
            ),
        };
        Ok(config.with_z_width(params.scalar("z.width").unwrap_or(1.0)))
    }
}

fn require<P: ScalarParameters>(params: &P, name: &str) -> Result<f64, ContactError> {
    params
        .scalar(name)
        .ok_or_else(|| ContactError::MissingParameter(name.to_string()))
}

/// Named scalar lookup supplied by the host solver.
pub trait ScalarParameters {
    fn scalar(&self, name: &str) -> Option<f64>;
}

#[derive(Clone, Debug, Default)]
pub struct ParameterTable(HashMap<String, f64>);

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.0.insert(name.into(), value);
        self
    }
}

impl ScalarParameters for ParameterTable {
    fn scalar(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }
}
