//! Ohmic contact boundary condition for a vertex-centred finite-volume
//! drift-diffusion / lattice-temperature solver.
//!
//! The contact ties a semiconductor region to a metal (resistive) region and to any
//! insulator regions meeting at the same interface nodes. Each nonlinear iteration the
//! outer Newton loop
//!
//! 1. lets the bulk assemblers write their equations,
//! 2. calls [`physics::BoundaryCondition::preprocess_residual`] /
//!    [`physics::BoundaryCondition::preprocess_jacobian`] and applies the returned
//!    [`numerics::assembly::RowEdits`],
//! 3. calls the matching `evaluate_*` method,
//! 4. after acceptance, calls [`physics::BoundaryCondition::on_solution_accepted`] to
//!    publish the terminal current and potential.

pub mod constants;
pub mod discretization;
pub mod error;
pub mod models;
pub mod numerics;
pub mod parallel;
pub mod physics;

pub use error::ContactError;
pub use physics::ohmic::{ContactBinding, OhmicContact};
pub use physics::BoundaryCondition;
