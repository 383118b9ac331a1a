use num_dual::DualNum;
use serde::Deserialize;

use super::fermi;
use crate::constants::{BOLTZMANN, ELECTRON_CHARGE};

/// Band-structure quantities of a semiconductor material.
///
/// Every method is generic over [`DualNum`] so the same formula serves residual
/// evaluation (`f64`) and Jacobian evaluation (dual numbers).
pub trait BandModel {
    /// Effective intrinsic carrier density (m^-3).
    fn nie<T: DualNum<f64>>(&self, n: &T, p: &T, t: &T) -> T;
    /// Conduction band effective density of states (m^-3).
    fn nc<T: DualNum<f64>>(&self, t: &T) -> T;
    /// Valence band effective density of states (m^-3).
    fn nv<T: DualNum<f64>>(&self, t: &T) -> T;
    /// Band gap (J).
    fn eg<T: DualNum<f64>>(&self, t: &T) -> T;

    fn fermi_half<T: DualNum<f64>>(&self, eta: &T) -> T {
        fermi::fermi_half(eta)
    }
}

/// Parametric silicon: `Nc, Nv ~ T^1.5` and a Varshni band gap.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiliconBand {
    /// `Nc` at 300 K (m^-3).
    pub nc300: f64,
    /// `Nv` at 300 K (m^-3).
    pub nv300: f64,
    /// Band gap at 0 K (J).
    pub eg0: f64,
    /// Varshni alpha (J/K).
    pub alpha: f64,
    /// Varshni beta (K).
    pub beta: f64,
}

impl Default for SiliconBand {
    fn default() -> Self {
        Self {
            nc300: 2.86e25,
            nv300: 3.10e25,
            eg0: 1.1696 * ELECTRON_CHARGE,
            alpha: 4.73e-4 * ELECTRON_CHARGE,
            beta: 636.0,
        }
    }
}

impl BandModel for SiliconBand {
    fn nie<T: DualNum<f64>>(&self, _n: &T, _p: &T, t: &T) -> T {
        let kt = t.clone() * BOLTZMANN;
        let dos = (self.nc(t) * self.nv(t)).sqrt();
        dos * (-(self.eg(t) / (kt * 2.0))).exp()
    }

    fn nc<T: DualNum<f64>>(&self, t: &T) -> T {
        (t.clone() / 300.0).powf(1.5) * self.nc300
    }

    fn nv<T: DualNum<f64>>(&self, t: &T) -> T {
        (t.clone() / 300.0).powf(1.5) * self.nv300
    }

    fn eg<T: DualNum<f64>>(&self, t: &T) -> T {
        let narrowing = t.clone() * t.clone() * self.alpha / (t.clone() + self.beta);
        -narrowing + self.eg0
    }
}

/// Material functions evaluated once at a node's state.
#[derive(Clone, Debug)]
pub struct BandState<T> {
    pub nie: T,
    pub nc: T,
    pub nv: T,
    pub eg: T,
}

impl<T: DualNum<f64>> BandState<T> {
    pub fn evaluate<M: BandModel>(model: &M, n: &T, p: &T, t: &T) -> Self {
        Self {
            nie: model.nie(n, p, t),
            nc: model.nc(t),
            nv: model.nv(t),
            eg: model.eg(t),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CarrierPair<T> {
    pub electrons: T,
    pub holes: T,
}

/// Charge-neutral carrier densities for a net doping `d = Nd - Na`.
///
/// The majority carrier comes from the quadratic root and the minority carrier
/// from the mass-action law, which keeps the minority density accurate when
/// `|d| >> nie`.
pub fn equilibrium_densities<T: DualNum<f64>>(net_doping: f64, nie: &T) -> CarrierPair<T> {
    let ni2 = nie.clone() * nie.clone();
    let root = (ni2.clone() * 4.0 + net_doping * net_doping).sqrt();
    if net_doping < 0.0 {
        let holes = (root - net_doping) * 0.5;
        CarrierPair {
            electrons: ni2 / holes.clone(),
            holes,
        }
    } else {
        let electrons = (root + net_doping) * 0.5;
        CarrierPair {
            holes: ni2 / electrons.clone(),
            electrons,
        }
    }
}
