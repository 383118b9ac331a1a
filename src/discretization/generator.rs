use glam::DVec3;

use super::mesh::{FvmNode, Mesh, Neighbor, NodeData, Region, RegionKind};
use crate::constants::{ELECTRON_CHARGE, EPSILON_0};
use crate::models::{equilibrium_densities, BandModel, BandState};
use crate::physics::ohmic::equations::built_in_potential;
use crate::physics::ohmic::ContactBinding;

pub const SEMICONDUCTOR_REGION: usize = 0;
pub const METAL_REGION: usize = 1;
pub const INSULATOR_REGION: usize = 2;

/// Builder for a rectangular semiconductor strip with an ohmic contact on its
/// `x = 0` edge.
///
/// Grid node `(i, j)` has root `j * nx + i`. The contact column `i = 0` gets a
/// metal copy of every node, and optionally insulator copies at its two ends.
/// Rows of the grid are split into contiguous blocks, one per process.
#[derive(Clone, Debug)]
pub struct StripBuilder {
    pub nx: usize,
    pub ny: usize,
    /// Grid spacing (m).
    pub spacing: f64,
    pub net_doping: f64,
    pub temperature: f64,
    pub material: String,
    pub relative_permittivity: f64,
    /// Semiconductor electron affinity (J).
    pub affinity: f64,
    /// Metal work function (J).
    pub work_function: f64,
    pub insulator_caps: bool,
    pub insulator_permittivity: f64,
    pub partitions: usize,
}

impl Default for StripBuilder {
    fn default() -> Self {
        Self {
            nx: 4,
            ny: 1,
            spacing: 1e-7,
            net_doping: 1e22,
            temperature: 300.0,
            material: "Si".to_string(),
            relative_permittivity: 11.7,
            affinity: 4.05 * ELECTRON_CHARGE,
            work_function: 4.10 * ELECTRON_CHARGE,
            insulator_caps: false,
            insulator_permittivity: 3.9,
            partitions: 1,
        }
    }
}

/// A generated strip and the ids needed to bind a contact to it.
#[derive(Clone, Debug)]
pub struct Strip {
    pub mesh: Mesh,
    pub nx: usize,
    pub ny: usize,
    pub contact_roots: Vec<usize>,
}

impl Strip {
    pub fn binding(&self, label: &str) -> ContactBinding {
        ContactBinding {
            label: label.to_string(),
            semiconductor_region: SEMICONDUCTOR_REGION,
            metal_region: METAL_REGION,
            roots: self.contact_roots.clone(),
        }
    }

    pub fn semiconductor_node(&self, i: usize, j: usize) -> &FvmNode {
        &self.mesh.nodes[j * self.nx + i]
    }

    /// Metal node of contact row `j`.
    pub fn metal_node(&self, j: usize) -> &FvmNode {
        &self.mesh.nodes[self.nx * self.ny + j]
    }
}

impl StripBuilder {
    pub fn nx(mut self, nx: usize) -> Self {
        self.nx = nx;
        self
    }

    pub fn ny(mut self, ny: usize) -> Self {
        self.ny = ny;
        self
    }

    pub fn net_doping(mut self, d: f64) -> Self {
        self.net_doping = d;
        self
    }

    pub fn temperature(mut self, t: f64) -> Self {
        self.temperature = t;
        self
    }

    pub fn insulator_caps(mut self, caps: bool) -> Self {
        self.insulator_caps = caps;
        self
    }

    pub fn partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions;
        self
    }

    /// Extent of the control volume of grid index `k` out of `count` along one axis.
    fn extent(&self, k: usize, count: usize) -> f64 {
        if count == 1 {
            self.spacing
        } else if k == 0 || k == count - 1 {
            0.5 * self.spacing
        } else {
            self.spacing
        }
    }

    /// Build the strip in thermal equilibrium with the metal held at 0 V.
    pub fn build<M: BandModel>(&self, material: &M) -> Strip {
        let nx = self.nx.max(2);
        let ny = self.ny.max(1);
        let parts = self.partitions.clamp(1, ny);
        let h = self.spacing;
        let t = self.temperature;
        let rank_of_row = |j: usize| j * parts / ny;
        let at = |i: usize, j: usize| DVec3::new(i as f64 * h, j as f64 * h, 0.0);

        let band = BandState::evaluate(material, &0.0, &0.0, &t);
        let eq = equilibrium_densities(self.net_doping, &band.nie);
        let semi_data = NodeData {
            n: eq.electrons,
            p: eq.holes,
            t,
            n_last: eq.electrons,
            p_last: eq.holes,
            eps: self.relative_permittivity * EPSILON_0,
            net_doping: self.net_doping,
            affinity: self.affinity,
            ..Default::default()
        };
        let metal_data = NodeData {
            t,
            affinity: self.work_function,
            ..Default::default()
        };
        let psi = built_in_potential(&t, &band, &semi_data, &metal_data);
        let semi_data = NodeData {
            psi,
            psi_last: psi,
            ..semi_data
        };

        let mut regions = vec![
            Region {
                id: SEMICONDUCTOR_REGION,
                label: "bulk".to_string(),
                kind: RegionKind::Semiconductor,
                material: Some(self.material.clone()),
            },
            Region {
                id: METAL_REGION,
                label: "anode".to_string(),
                kind: RegionKind::Metal,
                material: None,
            },
        ];
        if self.insulator_caps {
            regions.push(Region {
                id: INSULATOR_REGION,
                label: "oxide".to_string(),
                kind: RegionKind::Insulator,
                material: None,
            });
        }

        let mut nodes = Vec::with_capacity(nx * ny + ny + 2);
        for j in 0..ny {
            for i in 0..nx {
                let ex = self.extent(i, nx);
                let ey = self.extent(j, ny);
                let here = at(i, j);
                let mut neighbors = Vec::with_capacity(4);
                if i > 0 {
                    neighbors.push(link(j * nx + i - 1, here, at(i - 1, j), ey));
                }
                if i + 1 < nx {
                    neighbors.push(link(j * nx + i + 1, here, at(i + 1, j), ey));
                }
                if j > 0 {
                    neighbors.push(link((j - 1) * nx + i, here, at(i, j - 1), ex));
                }
                if j + 1 < ny {
                    neighbors.push(link((j + 1) * nx + i, here, at(i, j + 1), ex));
                }
                nodes.push(FvmNode {
                    id: nodes.len(),
                    root: j * nx + i,
                    region: SEMICONDUCTOR_REGION,
                    processor_id: rank_of_row(j),
                    global_offset: 0,
                    local_offset: 0,
                    position: here,
                    volume: ex * ey,
                    boundary_area: if i == 0 { ey } else { 0.0 },
                    neighbors,
                    data: semi_data.clone(),
                });
            }
        }

        let metal_base = nodes.len();
        for j in 0..ny {
            let ey = self.extent(j, ny);
            let here = at(0, j);
            let mut neighbors = Vec::with_capacity(2);
            if j > 0 {
                neighbors.push(link(metal_base + j - 1, here, at(0, j - 1), 0.5 * h));
            }
            if j + 1 < ny {
                neighbors.push(link(metal_base + j + 1, here, at(0, j + 1), 0.5 * h));
            }
            nodes.push(FvmNode {
                id: nodes.len(),
                root: j * nx,
                region: METAL_REGION,
                processor_id: rank_of_row(j),
                global_offset: 0,
                local_offset: 0,
                position: here,
                volume: 0.5 * h * ey,
                boundary_area: ey,
                neighbors,
                data: metal_data.clone(),
            });
        }

        if self.insulator_caps {
            let mut capped = vec![0];
            if ny > 1 {
                capped.push(ny - 1);
            }
            for j in capped {
                nodes.push(FvmNode {
                    id: nodes.len(),
                    root: j * nx,
                    region: INSULATOR_REGION,
                    processor_id: rank_of_row(j),
                    global_offset: 0,
                    local_offset: 0,
                    position: at(0, j),
                    volume: 0.25 * h * h,
                    boundary_area: 0.5 * h,
                    neighbors: Vec::new(),
                    data: NodeData {
                        t,
                        eps: self.insulator_permittivity * EPSILON_0,
                        ..Default::default()
                    },
                });
            }
        }

        let mut mesh = Mesh { regions, nodes };
        mesh.assign_offsets();

        Strip {
            mesh,
            nx,
            ny,
            contact_roots: (0..ny).map(|j| j * nx).collect(),
        }
    }
}

fn link(node: usize, from: DVec3, to: DVec3, cv_area: f64) -> Neighbor {
    Neighbor {
        node,
        distance: from.distance(to),
        cv_area,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::mesh::SEMI_PSI;
    use crate::models::SiliconBand;
    use std::collections::HashSet;

    #[test]
    fn strip_has_one_metal_copy_per_contact_row() {
        let strip = StripBuilder::default()
            .nx(3)
            .ny(4)
            .insulator_caps(true)
            .build(&SiliconBand::default());
        let mesh = &strip.mesh;

        assert_eq!(mesh.nodes.len(), 3 * 4 + 4 + 2);
        assert_eq!(mesh.num_dofs(), 12 * 4 + 4 * 2 + 2 * 2);
        assert_eq!(strip.contact_roots, vec![0, 3, 6, 9]);
        for j in 0..4 {
            assert_eq!(strip.metal_node(j).root, strip.semiconductor_node(0, j).root);
        }
    }

    #[test]
    fn partitions_number_rows_contiguously() {
        let strip = StripBuilder::default()
            .nx(2)
            .ny(4)
            .partitions(2)
            .build(&SiliconBand::default());
        let mesh = &strip.mesh;

        let mut seen = HashSet::new();
        for node in &mesh.nodes {
            let dofs = mesh.node_kind(node).unwrap().dofs();
            for k in 0..dofs {
                assert!(seen.insert(node.row(k)), "row {} assigned twice", node.row(k));
            }
        }
        assert_eq!(seen.len(), mesh.num_dofs());

        let last_rank0 = mesh
            .nodes
            .iter()
            .filter(|n| n.processor_id == 0)
            .map(|n| n.global_offset)
            .max()
            .unwrap();
        let first_rank1 = mesh
            .nodes
            .iter()
            .filter(|n| n.processor_id == 1)
            .map(|n| n.global_offset)
            .min()
            .unwrap();
        assert!(last_rank0 < first_rank1);
    }

    #[test]
    fn link_lengths_follow_node_positions() {
        let strip = StripBuilder::default().nx(3).ny(2).build(&SiliconBand::default());
        let mesh = &strip.mesh;
        for node in &mesh.nodes {
            for link in &node.neighbors {
                let other = &mesh.nodes[link.node];
                assert_eq!(link.distance, node.position.distance(other.position));
                assert!((link.distance - 1e-7).abs() < 1e-20);
            }
        }
        assert_eq!(strip.metal_node(1).position, strip.semiconductor_node(0, 1).position);
    }

    #[test]
    fn equilibrium_state_is_uniform() {
        let strip = StripBuilder::default().nx(3).build(&SiliconBand::default());
        let x = strip.mesh.solution();
        let psi0 = strip.semiconductor_node(0, 0).value(&x, SEMI_PSI);
        let psi2 = strip.semiconductor_node(2, 0).value(&x, SEMI_PSI);
        assert_eq!(psi0, psi2);
        assert!(psi0.is_finite());
    }
}
