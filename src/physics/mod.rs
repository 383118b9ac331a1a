pub mod ohmic;

use nalgebra::DVector;

use crate::discretization::mesh::Mesh;
use crate::error::ContactError;
use crate::numerics::assembly::{InsertMode, JacobianMatrix, ResidualVector, RowEdits};
use crate::numerics::transient::TimeContext;
use crate::parallel::Communicator;

/// Contract between a boundary condition and the outer Newton loop.
///
/// Per nonlinear iteration the driver assembles the bulk equations, calls the
/// matching `preprocess_*` method, applies the returned [`RowEdits`], then
/// calls `evaluate_*`. All insertions are additive; `mode` reports the last
/// insertion mode used on the target and is left as [`InsertMode::Add`].
pub trait BoundaryCondition {
    fn label(&self) -> &str;

    fn preprocess_residual<V: ResidualVector>(
        &mut self,
        mesh: &Mesh,
        time: &TimeContext,
        x: &DVector<f64>,
        f: &V,
    ) -> Result<RowEdits, ContactError>;

    fn preprocess_jacobian<J: JacobianMatrix>(
        &mut self,
        mesh: &Mesh,
        time: &TimeContext,
        x: &DVector<f64>,
        jac: &J,
    ) -> Result<RowEdits, ContactError>;

    fn evaluate_residual<V: ResidualVector>(
        &mut self,
        mesh: &Mesh,
        time: &TimeContext,
        x: &DVector<f64>,
        f: &mut V,
        mode: &mut InsertMode,
    ) -> Result<(), ContactError>;

    fn evaluate_jacobian<J: JacobianMatrix>(
        &mut self,
        mesh: &Mesh,
        time: &TimeContext,
        x: &DVector<f64>,
        jac: &mut J,
        mode: &mut InsertMode,
    ) -> Result<(), ContactError>;

    /// Publish terminal quantities for an accepted solution. Collective: every
    /// process must call it once per accepted solution.
    fn on_solution_accepted<C: Communicator>(&mut self, mesh: &Mesh, x: &DVector<f64>, comm: &C);
}
