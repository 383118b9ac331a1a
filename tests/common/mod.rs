#![allow(dead_code)]

use nalgebra::DVector;

use vfvm_ohmic::discretization::generator::{Strip, StripBuilder};
use vfvm_ohmic::discretization::mesh::{
    Mesh, RegionKind, COND_PSI, COND_T, SEMI_N, SEMI_P, SEMI_PSI, SEMI_T,
};
use vfvm_ohmic::models::{MaterialLibrary, SiliconBand};
use vfvm_ohmic::numerics::assembly::{InsertMode, JacobianMatrix, SparseJacobian};
use vfvm_ohmic::numerics::transient::TimeContext;
use vfvm_ohmic::physics::ohmic::equations::carrier_storage;
use vfvm_ohmic::physics::ohmic::OhmicConfig;
use vfvm_ohmic::{BoundaryCondition, ContactError, OhmicContact};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn silicon() -> MaterialLibrary<SiliconBand> {
    MaterialLibrary::new().with("Si", SiliconBand::default())
}

pub fn strip(nx: usize, ny: usize, caps: bool) -> Strip {
    StripBuilder::default()
        .nx(nx)
        .ny(ny)
        .insulator_caps(caps)
        .build(&SiliconBand::default())
}

pub fn contact(strip: &Strip, config: OhmicConfig) -> OhmicContact<SiliconBand> {
    OhmicContact::new(&strip.mesh, &strip.binding("anode"), &silicon(), config, 0).unwrap()
}

/// Give every node a distinct two-step history so BDF terms do not vanish.
pub fn with_history(mesh: &mut Mesh) {
    for node in &mut mesh.nodes {
        let d = &mut node.data;
        d.psi_last = d.psi - 0.01;
        d.n_last = d.n * 0.97;
        d.p_last = d.p * 1.02;
    }
}

/// Equilibrium solution pushed off equilibrium by a deterministic, root-dependent amount.
pub fn perturbed_solution(mesh: &Mesh) -> DVector<f64> {
    let mut x = mesh.solution();
    for node in &mesh.nodes {
        let s = (node.root as f64 * 0.7 + 0.3).sin();
        let o = node.local_offset;
        match mesh.node_kind(node) {
            Some(RegionKind::Semiconductor) => {
                x[o + SEMI_PSI] += 0.012 * s;
                x[o + SEMI_N] *= 1.0 + 0.05 * s;
                x[o + SEMI_P] *= 1.3 + 0.2 * s;
                x[o + SEMI_T] += 2.0 * s + 1.0;
            }
            Some(RegionKind::Metal) => {
                x[o + COND_PSI] += 0.05 + 0.01 * s;
                x[o + COND_T] += 0.5 * s;
            }
            Some(RegionKind::Insulator) => {
                x[o + COND_PSI] += 0.02 * s - 0.01;
                x[o + COND_T] += 0.25;
            }
            None => {}
        }
    }
    x
}

/// Stand-in for the bulk region assemblers: a nonlinear but hand-differentiable
/// discretisation on every node, so the contact's row surgery has something to act on.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticBulk {
    pub diffusion: f64,
    pub drift: f64,
    pub conduction: f64,
    pub leak: f64,
}

impl Default for SyntheticBulk {
    fn default() -> Self {
        Self {
            diffusion: 1e-3,
            drift: 4e-2,
            conduction: 1.0,
            leak: 1e-3,
        }
    }
}

impl SyntheticBulk {
    pub fn residual(&self, mesh: &Mesh, time: &TimeContext, x: &DVector<f64>, f: &mut DVector<f64>) {
        for node in &mesh.nodes {
            let o = node.global_offset;
            match mesh.node_kind(node) {
                Some(RegionKind::Semiconductor) => {
                    let (psi, n, p, t) = (x[o], x[o + 1], x[o + 2], x[o + 3]);
                    for link in &node.neighbors {
                        let w = link.cv_area / link.distance;
                        let l = mesh.nodes[link.node].global_offset;
                        let (psi_l, n_l, p_l, t_l) = (x[l], x[l + 1], x[l + 2], x[l + 3]);
                        f[o + SEMI_PSI] += w * node.data.eps * (psi_l - psi);
                        f[o + SEMI_N] += w * self.diffusion * (n_l - n) + w * self.drift * (psi_l - psi) * n;
                        f[o + SEMI_P] += w * self.diffusion * (p_l - p) - w * self.drift * (psi_l - psi) * p;
                        f[o + SEMI_T] += w * self.conduction * (t_l - t);
                    }
                    if let Some(step) = time.step() {
                        let d = &node.data;
                        f[o + SEMI_N] += carrier_storage(step, &n, d.n, d.n_last, node.volume);
                        f[o + SEMI_P] += carrier_storage(step, &p, d.p, d.p_last, node.volume);
                    }
                }
                Some(RegionKind::Metal) => {
                    for link in &node.neighbors {
                        let w = link.cv_area / link.distance;
                        let l = mesh.nodes[link.node].global_offset;
                        f[o + COND_PSI] += w * self.conduction * (x[l] - x[o]);
                        f[o + COND_T] += w * self.conduction * (x[l + 1] - x[o + 1]);
                    }
                }
                Some(RegionKind::Insulator) => {
                    f[o + COND_PSI] += self.leak * x[o];
                    f[o + COND_T] += self.leak * (x[o + 1] - 300.0);
                }
                None => {}
            }
        }
    }

    pub fn jacobian(&self, mesh: &Mesh, time: &TimeContext, x: &DVector<f64>, jac: &mut SparseJacobian) {
        for node in &mesh.nodes {
            let o = node.global_offset;
            match mesh.node_kind(node) {
                Some(RegionKind::Semiconductor) => {
                    let (psi, n, p) = (x[o], x[o + 1], x[o + 2]);
                    for link in &node.neighbors {
                        let w = link.cv_area / link.distance;
                        let l = mesh.nodes[link.node].global_offset;
                        let dpsi = x[l] - psi;
                        let (dd, mu, k) = (w * self.diffusion, w * self.drift, w * self.conduction);

                        jac.add(o, o, -w * node.data.eps);
                        jac.add(o, l, w * node.data.eps);

                        jac.add(o + 1, l + 1, dd);
                        jac.add(o + 1, o + 1, -dd + mu * dpsi);
                        jac.add(o + 1, l, mu * n);
                        jac.add(o + 1, o, -mu * n);

                        jac.add(o + 2, l + 2, dd);
                        jac.add(o + 2, o + 2, -dd - mu * dpsi);
                        jac.add(o + 2, l, -mu * p);
                        jac.add(o + 2, o, mu * p);

                        jac.add(o + 3, l + 3, k);
                        jac.add(o + 3, o + 3, -k);
                    }
                    if let Some(step) = time.step() {
                        let slope = step.weights().slope() * node.volume;
                        jac.add(o + 1, o + 1, -slope);
                        jac.add(o + 2, o + 2, -slope);
                    }
                }
                Some(RegionKind::Metal) => {
                    for link in &node.neighbors {
                        let k = link.cv_area / link.distance * self.conduction;
                        let l = mesh.nodes[link.node].global_offset;
                        jac.add(o, l, k);
                        jac.add(o, o, -k);
                        jac.add(o + 1, l + 1, k);
                        jac.add(o + 1, o + 1, -k);
                    }
                }
                Some(RegionKind::Insulator) => {
                    jac.add(o, o, self.leak);
                    jac.add(o + 1, o + 1, self.leak);
                }
                None => {}
            }
        }
    }
}

/// One residual evaluation as a Newton driver performs it.
pub fn assemble_residual<B: BoundaryCondition>(
    bc: &mut B,
    bulk: Option<&SyntheticBulk>,
    mesh: &Mesh,
    time: &TimeContext,
    x: &DVector<f64>,
) -> Result<DVector<f64>, ContactError> {
    let mut f = DVector::zeros(mesh.num_dofs());
    if let Some(bulk) = bulk {
        bulk.residual(mesh, time, x, &mut f);
    }
    let edits = bc.preprocess_residual(mesh, time, x, &f)?;
    edits.apply_to_residual(&mut f);
    let mut mode = InsertMode::Add;
    bc.evaluate_residual(mesh, time, x, &mut f, &mut mode)?;
    Ok(f)
}

/// One Jacobian evaluation as a Newton driver performs it.
pub fn assemble_jacobian<B: BoundaryCondition>(
    bc: &mut B,
    bulk: Option<&SyntheticBulk>,
    mesh: &Mesh,
    time: &TimeContext,
    x: &DVector<f64>,
) -> Result<SparseJacobian, ContactError> {
    let mut jac = SparseJacobian::new(mesh.num_dofs());
    if let Some(bulk) = bulk {
        bulk.jacobian(mesh, time, x, &mut jac);
    }
    let edits = bc.preprocess_jacobian(mesh, time, x, &jac)?;
    edits.apply_to_jacobian(&mut jac);
    let mut mode = InsertMode::Add;
    bc.evaluate_jacobian(mesh, time, x, &mut jac, &mut mode)?;
    assert_eq!(jac.dim(), mesh.num_dofs());
    Ok(jac)
}
