use std::collections::HashMap;

use glam::DVec3;
use nalgebra::DVector;

/// Unknown slots of a semiconductor node, relative to its offset.
pub const SEMI_PSI: usize = 0;
pub const SEMI_N: usize = 1;
pub const SEMI_P: usize = 2;
pub const SEMI_T: usize = 3;

/// Unknown slots of a metal or insulator node.
pub const COND_PSI: usize = 0;
pub const COND_T: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionKind {
    Semiconductor,
    /// Resistive metal: potential and lattice temperature only.
    Metal,
    Insulator,
}

impl RegionKind {
    /// Number of unknowns carried by one node of this kind.
    pub fn dofs(&self) -> usize {
        match self {
            RegionKind::Semiconductor => 4,
            RegionKind::Metal | RegionKind::Insulator => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RegionKind::Semiconductor => "semiconductor",
            RegionKind::Metal => "metal",
            RegionKind::Insulator => "insulator",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Region {
    pub id: usize,
    pub label: String,
    pub kind: RegionKind,
    /// Material model key, required for semiconductor regions.
    pub material: Option<String>,
}

/// A control-volume link to another node of the same region.
#[derive(Clone, Copy, Debug)]
pub struct Neighbor {
    pub node: usize,
    pub distance: f64,
    /// Area of the shared control-volume face.
    pub cv_area: f64,
}

/// Per-node physical data: the committed solution of the two previous steps
/// plus material fields. The solution unknowns themselves live in the vector
/// handed to each assembly call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeData {
    pub psi: f64,
    pub n: f64,
    pub p: f64,
    pub t: f64,
    pub psi_last: f64,
    pub n_last: f64,
    pub p_last: f64,
    /// Permittivity (F/m).
    pub eps: f64,
    /// Donor minus acceptor concentration (m^-3).
    pub net_doping: f64,
    /// Electron affinity (J); work function for metal nodes.
    pub affinity: f64,
}

/// A finite-volume node: one region's copy of a geometric boundary node.
///
/// Interface points carry one node per adjoining region; all copies share the
/// same `root`.
#[derive(Clone, Debug)]
pub struct FvmNode {
    pub id: usize,
    pub root: usize,
    pub region: usize,
    pub processor_id: usize,
    /// First row / column of this node's unknowns in the global system.
    pub global_offset: usize,
    /// First entry of this node's unknowns in the local solution vector.
    pub local_offset: usize,
    pub position: DVec3,
    pub volume: f64,
    /// Area of the control-volume face lying on the region boundary.
    pub boundary_area: f64,
    pub neighbors: Vec<Neighbor>,
    pub data: NodeData,
}

impl FvmNode {
    #[inline]
    pub fn row(&self, var: usize) -> usize {
        self.global_offset + var
    }

    #[inline]
    pub fn value(&self, x: &DVector<f64>, var: usize) -> f64 {
        x[self.local_offset + var]
    }
}

/// The complete computational grid.
///
/// `nodes[i].id == i`: ids double as indices into `nodes` wherever a node
/// refers to another (neighbor links, root lookups).
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub regions: Vec<Region>,
    pub nodes: Vec<FvmNode>,
}

impl Mesh {
    pub fn region(&self, id: usize) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// First node whose id differs from its position, if any.
    pub fn misnumbered_node(&self) -> Option<(usize, usize)> {
        self.nodes
            .iter()
            .enumerate()
            .find(|(position, node)| node.id != *position)
            .map(|(position, node)| (position, node.id))
    }

    pub fn node_kind(&self, node: &FvmNode) -> Option<RegionKind> {
        self.region(node.region).map(|r| r.kind)
    }

    /// Index of every region copy keyed by `(root, region)`.
    pub fn root_index(&self) -> HashMap<(usize, usize), usize> {
        self.nodes
            .iter()
            .map(|node| ((node.root, node.region), node.id))
            .collect()
    }

    /// Total number of unknowns.
    pub fn num_dofs(&self) -> usize {
        self.nodes
            .iter()
            .filter_map(|node| self.node_kind(node))
            .map(|kind| kind.dofs())
            .sum()
    }

    /// Number the unknowns so each processor owns a contiguous block of rows,
    /// ranks in ascending order and nodes by id within a rank.
    ///
    /// Every process holds the whole solution vector, so local offsets equal
    /// global offsets.
    pub fn assign_offsets(&mut self) {
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by_key(|&i| (self.nodes[i].processor_id, self.nodes[i].id));

        let dofs: Vec<usize> = self
            .nodes
            .iter()
            .map(|node| self.node_kind(node).map_or(0, |k| k.dofs()))
            .collect();

        let mut offset = 0;
        for i in order {
            self.nodes[i].global_offset = offset;
            self.nodes[i].local_offset = offset;
            offset += dofs[i];
        }
    }

    /// Current node data gathered into a solution vector.
    pub fn solution(&self) -> DVector<f64> {
        let mut x = DVector::zeros(self.num_dofs());
        for node in &self.nodes {
            let d = &node.data;
            match self.node_kind(node) {
                Some(RegionKind::Semiconductor) => {
                    x[node.local_offset + SEMI_PSI] = d.psi;
                    x[node.local_offset + SEMI_N] = d.n;
                    x[node.local_offset + SEMI_P] = d.p;
                    x[node.local_offset + SEMI_T] = d.t;
                }
                Some(_) => {
                    x[node.local_offset + COND_PSI] = d.psi;
                    x[node.local_offset + COND_T] = d.t;
                }
                None => {}
            }
        }
        x
    }

    /// Commit an accepted solution: shift the stored step into the `*_last`
    /// history and load `x` as the new previous step.
    pub fn advance_history(&mut self, x: &DVector<f64>) {
        let kinds: Vec<Option<RegionKind>> =
            self.nodes.iter().map(|node| self.node_kind(node)).collect();
        for (node, kind) in self.nodes.iter_mut().zip(kinds) {
            let off = node.local_offset;
            let d = &mut node.data;
            d.psi_last = d.psi;
            d.n_last = d.n;
            d.p_last = d.p;
            match kind {
                Some(RegionKind::Semiconductor) => {
                    d.psi = x[off + SEMI_PSI];
                    d.n = x[off + SEMI_N];
                    d.p = x[off + SEMI_P];
                    d.t = x[off + SEMI_T];
                }
                Some(_) => {
                    d.psi = x[off + COND_PSI];
                    d.t = x[off + COND_T];
                }
                None => {}
            }
        }
    }
}
