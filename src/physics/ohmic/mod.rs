//! Ohmic contact between a semiconductor region and a resistive metal region.
//!
//! Every contact node couples one semiconductor node (potential, electron and
//! hole density, temperature), one metal node (potential, temperature) and any
//! insulator nodes meeting at the same location. The semiconductor potential
//! is tied to the metal by equilibrium band alignment; the carriers either
//! leave through finite surface recombination or are pinned to equilibrium.
//! Whatever current crosses the interface is injected into the metal node's
//! potential row.

mod config;
pub mod equations;
mod jacobian;
mod preprocess;
mod residual;
mod terminal;

use std::collections::HashMap;

use nalgebra::DVector;
use tracing::debug;

pub use config::{OhmicConfig, ParameterTable, Recombination, ScalarParameters, Statistics};
pub use preprocess::HarvestedRow;
pub use terminal::{mean_potential, Terminal};

use crate::discretization::mesh::{Mesh, Region, RegionKind};
use crate::error::ContactError;
use crate::models::{BandModel, MaterialLibrary};
use crate::numerics::assembly::{InsertMode, JacobianMatrix, ResidualVector, RowEdits};
use crate::numerics::timing::{record_jacobian, record_preprocess, record_residual};
use crate::numerics::transient::TimeContext;
use crate::parallel::Communicator;
use crate::physics::BoundaryCondition;
use preprocess::HarvestBuffers;

/// Where a contact sits: the two regions it joins and the boundary roots.
#[derive(Clone, Debug)]
pub struct ContactBinding {
    pub label: String,
    pub semiconductor_region: usize,
    pub metal_region: usize,
    pub roots: Vec<usize>,
}

/// The region copies of one boundary root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactNode {
    pub root: usize,
    pub semiconductor: usize,
    pub metal: usize,
    pub insulators: Vec<usize>,
}

pub struct OhmicContact<M> {
    label: String,
    config: OhmicConfig,
    material: M,
    rank: usize,
    /// Ascending root id. Every pass walks the owned nodes in this order.
    nodes: Vec<ContactNode>,
    buffers: HarvestBuffers,
    terminal: Terminal,
}

impl<M: BandModel + Clone> OhmicContact<M> {
    /// Bind a contact to `mesh` for the process `rank`.
    ///
    /// Fails if a node id is not its position in `mesh.nodes`, a region is
    /// missing or of the wrong kind, the semiconductor material is unknown, a
    /// root lacks its semiconductor or metal copy, or a contact node has a
    /// neighbor at zero distance.
    pub fn new(
        mesh: &Mesh,
        binding: &ContactBinding,
        materials: &MaterialLibrary<M>,
        config: OhmicConfig,
        rank: usize,
    ) -> Result<Self, ContactError> {
        if let Some((position, id)) = mesh.misnumbered_node() {
            return Err(ContactError::NodeIndex { position, id });
        }
        let semi_region = expect_region(mesh, binding.semiconductor_region, RegionKind::Semiconductor)?;
        expect_region(mesh, binding.metal_region, RegionKind::Metal)?;

        let material_name = semi_region
            .material
            .as_deref()
            .ok_or(ContactError::UnnamedMaterial(semi_region.id))?;
        let material = materials
            .get(material_name)
            .cloned()
            .ok_or_else(|| ContactError::MissingMaterial(material_name.to_string()))?;

        let index = mesh.root_index();
        let insulator_regions: Vec<usize> = mesh
            .regions
            .iter()
            .filter(|r| r.kind == RegionKind::Insulator)
            .map(|r| r.id)
            .collect();

        let mut roots = binding.roots.clone();
        roots.sort_unstable();
        roots.dedup();

        let nodes = roots
            .into_iter()
            .map(|root| {
                let semiconductor = *index
                    .get(&(root, binding.semiconductor_region))
                    .ok_or(ContactError::MissingSemiconductorNode {
                        root,
                        region: binding.semiconductor_region,
                    })?;
                let metal = *index
                    .get(&(root, binding.metal_region))
                    .ok_or(ContactError::MissingMetalNode {
                        root,
                        region: binding.metal_region,
                    })?;
                check_neighbors(mesh, semiconductor)?;
                Ok(ContactNode {
                    root,
                    semiconductor,
                    metal,
                    insulators: insulators_at(&index, &insulator_regions, root),
                })
            })
            .collect::<Result<Vec<_>, ContactError>>()?;

        debug!(
            contact = %binding.label,
            nodes = nodes.len(),
            recombination = ?config.recombination,
            z_width = config.z_width,
            rank,
            "bound ohmic contact"
        );

        Ok(Self {
            label: binding.label.clone(),
            config,
            material,
            rank,
            nodes,
            buffers: HarvestBuffers::default(),
            terminal: Terminal::default(),
        })
    }
}

impl<M> OhmicContact<M> {
    pub fn config(&self) -> &OhmicConfig {
        &self.config
    }

    pub fn material(&self) -> &M {
        &self.material
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn nodes(&self) -> &[ContactNode] {
        &self.nodes
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    /// Jacobian rows harvested by the last preprocessing pass and not yet replayed.
    pub fn pending_rows(&self) -> Option<&[HarvestedRow]> {
        self.buffers.rows.as_deref()
    }

    /// Nodes whose semiconductor copy this process owns, in ascending root order.
    pub fn owned<'a>(&'a self, mesh: &'a Mesh) -> impl Iterator<Item = &'a ContactNode> + 'a {
        self.nodes
            .iter()
            .filter(move |node| mesh.nodes[node.semiconductor].processor_id == self.rank)
    }
}

fn expect_region(
    mesh: &Mesh,
    id: usize,
    kind: RegionKind,
) -> Result<&Region, ContactError> {
    let region = mesh.region(id).ok_or(ContactError::UnknownRegion(id))?;
    if region.kind != kind {
        return Err(ContactError::RegionKind {
            region: id,
            expected: kind.name(),
        });
    }
    Ok(region)
}

fn check_neighbors(mesh: &Mesh, node: usize) -> Result<(), ContactError> {
    match mesh.nodes[node].neighbors.iter().find(|link| !(link.distance > 0.0)) {
        Some(link) => Err(ContactError::DegenerateNeighbor {
            node,
            neighbor: link.node,
        }),
        None => Ok(()),
    }
}

fn insulators_at(index: &HashMap<(usize, usize), usize>, regions: &[usize], root: usize) -> Vec<usize> {
    regions
        .iter()
        .filter_map(|&region| index.get(&(root, region)).copied())
        .collect()
}

impl<M: BandModel> BoundaryCondition for OhmicContact<M> {
    fn label(&self) -> &str {
        &self.label
    }

    fn preprocess_residual<V: ResidualVector>(
        &mut self,
        mesh: &Mesh,
        time: &TimeContext,
        x: &DVector<f64>,
        f: &V,
    ) -> Result<RowEdits, ContactError> {
        Ok(record_preprocess(|| self.harvest_currents(mesh, time, x, f)))
    }

    fn preprocess_jacobian<J: JacobianMatrix>(
        &mut self,
        mesh: &Mesh,
        time: &TimeContext,
        _x: &DVector<f64>,
        jac: &J,
    ) -> Result<RowEdits, ContactError> {
        Ok(record_preprocess(|| self.harvest_rows(mesh, time, jac)))
    }

    fn evaluate_residual<V: ResidualVector>(
        &mut self,
        mesh: &Mesh,
        time: &TimeContext,
        x: &DVector<f64>,
        f: &mut V,
        mode: &mut InsertMode,
    ) -> Result<(), ContactError> {
        record_residual(|| self.assemble_residual(mesh, time, x, f, mode))
    }

    fn evaluate_jacobian<J: JacobianMatrix>(
        &mut self,
        mesh: &Mesh,
        time: &TimeContext,
        x: &DVector<f64>,
        jac: &mut J,
        mode: &mut InsertMode,
    ) -> Result<(), ContactError> {
        record_jacobian(|| self.assemble_jacobian(mesh, time, x, jac, mode))
    }

    fn on_solution_accepted<C: Communicator>(&mut self, mesh: &Mesh, x: &DVector<f64>, comm: &C) {
        self.publish_terminal(mesh, x, comm);
    }
}
