//! Contact equations, generic over the scalar type.
//!
//! The residual pass instantiates these with `f64`, the Jacobian pass with
//! `DualDVec64`, so both passes evaluate the same algebra.

use num_dual::DualNum;

use super::config::{Recombination, Statistics};
use crate::constants::{BOLTZMANN, ELECTRON_CHARGE, THERMAL_VOLTAGE_PER_KELVIN};
use crate::discretization::mesh::{FvmNode, Mesh, NodeData};
use crate::models::{equilibrium_densities, BandModel, BandState, CarrierPair};
use crate::numerics::transient::{TimeContext, TimeStep};

/// Unknowns a contact node's equations depend on.
#[derive(Clone, Debug)]
pub struct ContactState<T> {
    pub v_metal: T,
    pub t_metal: T,
    pub v_semi: T,
    pub n: T,
    pub p: T,
    pub t_semi: T,
    /// Potentials of the semiconductor node's neighbors, in neighbor order.
    pub v_neighbors: Vec<T>,
}

/// Equation values of one contact node.
#[derive(Clone, Debug)]
pub struct ContactEquations<T> {
    /// Semiconductor potential row.
    pub potential: T,
    /// Semiconductor electron row.
    pub electron: T,
    /// Semiconductor hole row.
    pub hole: T,
    /// Semiconductor temperature row.
    pub temperature: T,
    /// Current injected into the metal node. For pinned contacts this holds only
    /// the displacement correction; the harvested bulk current is added by the caller.
    pub injected: T,
}

/// Surface emission currents `In`, `Ip` through the contact face.
#[derive(Clone, Debug)]
pub struct Emission<T> {
    pub electron: T,
    pub hole: T,
}

/// Equilibrium contact potential drop: the potential row is
/// `v_semi - v_metal - built_in_potential`.
pub fn built_in_potential<T: DualNum<f64>>(
    t: &T,
    band: &BandState<T>,
    semi: &NodeData,
    metal: &NodeData,
) -> T {
    let vt = t.clone() * THERMAL_VOLTAGE_PER_KELVIN;
    let doping_term = (band.nie.recip() * (semi.net_doping * 0.5)).asinh();
    let dos_term = (band.nc.clone() / band.nv.clone()).ln() * 0.5;
    vt.clone() * doping_term
        - band.eg.clone() / (2.0 * ELECTRON_CHARGE)
        - vt * dos_term
        - (semi.affinity - metal.affinity) / ELECTRON_CHARGE
}

pub fn potential_continuity<T: DualNum<f64>>(
    v_semi: &T,
    v_metal: &T,
    t: &T,
    band: &BandState<T>,
    semi: &NodeData,
    metal: &NodeData,
) -> T {
    v_semi.clone() - v_metal.clone() - built_in_potential(t, band, semi, metal)
}

pub fn emission_currents<T: DualNum<f64>>(
    n: &T,
    p: &T,
    eq: &CarrierPair<T>,
    electron_velocity: f64,
    hole_velocity: f64,
    area: f64,
) -> Emission<T> {
    Emission {
        electron: -((n.clone() - eq.electrons.clone()) * (electron_velocity * area)),
        hole: (p.clone() - eq.holes.clone()) * (hole_velocity * area),
    }
}

/// Densities pinned by the metal Fermi level under Fermi-Dirac statistics.
pub fn fermi_densities<T: DualNum<f64>, M: BandModel>(
    material: &M,
    v_semi: &T,
    v_metal: &T,
    t: &T,
    band: &BandState<T>,
    semi: &NodeData,
    metal: &NodeData,
) -> CarrierPair<T> {
    let kt = t.clone() * BOLTZMANN;
    let ec = -(v_semi.clone() * ELECTRON_CHARGE + semi.affinity);
    let ev = ec.clone() - band.eg.clone();
    // Both quasi-Fermi levels sit at the metal Fermi level.
    let fermi_level = (v_metal.clone() + metal.affinity / ELECTRON_CHARGE) * ELECTRON_CHARGE;
    let eta_n = (-fermi_level.clone() - ec) / kt.clone();
    let eta_p = (ev + fermi_level) / kt;
    CarrierPair {
        electrons: band.nc.clone() * material.fermi_half(&eta_n),
        holes: band.nv.clone() * material.fermi_half(&eta_p),
    }
}

/// Bulk carrier storage term `-(dn/dt) * volume`.
pub fn carrier_storage<T: DualNum<f64>>(
    step: &TimeStep,
    density: &T,
    previous: f64,
    last: f64,
    volume: f64,
) -> T {
    -(step.weights().rate(density.clone(), previous, last) * volume)
}

/// Displacement current leaving the semiconductor node through its control-volume faces.
pub fn displacement_current<T: DualNum<f64>>(
    step: &TimeStep,
    mesh: &Mesh,
    semi: &FvmNode,
    state: &ContactState<T>,
) -> T {
    let w = step.weights();
    let d = &semi.data;
    semi.neighbors
        .iter()
        .zip(&state.v_neighbors)
        .fold(T::zero(), |acc, (link, v_nb)| {
            let nb = &mesh.nodes[link.node].data;
            let field_rate = w.rate(
                state.v_semi.clone() - v_nb.clone(),
                d.psi - nb.psi,
                d.psi_last - nb.psi_last,
            ) / link.distance;
            acc + field_rate * (link.cv_area * d.eps)
        })
}

/// Potential and temperature continuity of an insulator node against the metal node.
pub fn insulator_continuity<T: DualNum<f64>>(
    v_insulator: &T,
    t_insulator: &T,
    v_metal: &T,
    t_metal: &T,
) -> (T, T) {
    (
        v_insulator.clone() - v_metal.clone(),
        t_insulator.clone() - t_metal.clone(),
    )
}

pub fn contact_equations<T: DualNum<f64>, M: BandModel>(
    recombination: &Recombination,
    material: &M,
    time: &TimeContext,
    mesh: &Mesh,
    semi: &FvmNode,
    metal: &FvmNode,
    state: &ContactState<T>,
) -> ContactEquations<T> {
    let d = &semi.data;
    let band = BandState::evaluate(material, &state.n, &state.p, &state.t_semi);
    let potential = potential_continuity(
        &state.v_semi,
        &state.v_metal,
        &state.t_semi,
        &band,
        d,
        &metal.data,
    );
    let temperature = state.t_semi.clone() - state.t_metal.clone();
    let displacement = match time.step() {
        Some(step) => displacement_current(step, mesh, semi, state),
        None => T::zero(),
    };

    match *recombination {
        Recombination::Finite {
            electron_velocity,
            hole_velocity,
        } => {
            let eq = equilibrium_densities(d.net_doping, &band.nie);
            let emission = emission_currents(
                &state.n,
                &state.p,
                &eq,
                electron_velocity,
                hole_velocity,
                semi.boundary_area,
            );
            let mut injected = emission.electron.clone() + emission.hole.clone();
            if let Some(step) = time.step() {
                injected = injected
                    + carrier_storage(step, &state.n, d.n, d.n_last, semi.volume)
                    + carrier_storage(step, &state.p, d.p, d.p_last, semi.volume);
            }
            ContactEquations {
                potential,
                electron: emission.electron,
                hole: -emission.hole,
                temperature,
                injected: injected - displacement,
            }
        }
        Recombination::Infinite { statistics } => {
            // The potential row keeps band-alignment continuity for both
            // statistics; only the pinned densities change under Fermi-Dirac.
            let eq = match statistics {
                Statistics::Boltzmann => equilibrium_densities(d.net_doping, &band.nie),
                Statistics::Fermi => fermi_densities(
                    material,
                    &state.v_semi,
                    &state.v_metal,
                    &state.t_semi,
                    &band,
                    d,
                    &metal.data,
                ),
            };
            ContactEquations {
                potential,
                electron: state.n.clone() - eq.electrons,
                hole: state.p.clone() - eq.holes,
                temperature,
                injected: -displacement,
            }
        }
    }
}
