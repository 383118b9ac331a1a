use nalgebra::DVector;
use tracing::trace;

use super::equations::carrier_storage;
use super::OhmicContact;
use crate::discretization::mesh::{FvmNode, Mesh, COND_PSI, COND_T, SEMI_N, SEMI_P, SEMI_PSI, SEMI_T};
use crate::models::BandModel;
use crate::numerics::assembly::{JacobianMatrix, ResidualVector, RowEdits, RowMove};
use crate::numerics::transient::TimeContext;

/// Current read off the bulk continuity rows of one contact node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct HarvestedCurrent {
    pub root: usize,
    pub value: f64,
}

/// Derivatives of a harvested current with respect to one node's four unknowns,
/// re-attributed to the metal potential row.
#[derive(Clone, Debug, PartialEq)]
pub struct HarvestedRow {
    pub row: usize,
    pub cols: [usize; 4],
    pub values: [f64; 4],
}

/// Data carried from a preprocessing pass to the assembly pass that follows it.
/// Each buffer is consumed exactly once.
#[derive(Debug, Default)]
pub(crate) struct HarvestBuffers {
    pub currents: Option<Vec<HarvestedCurrent>>,
    pub rows: Option<Vec<HarvestedRow>>,
}

fn block(node: &FvmNode) -> [usize; 4] {
    std::array::from_fn(|k| node.row(k))
}

/// `d(f_hole - f_electron)` restricted to `cols`.
fn row_difference<J: JacobianMatrix>(jac: &J, semi: &FvmNode, cols: &[usize; 4]) -> [f64; 4] {
    let electron = jac.get_row(semi.row(SEMI_N), cols);
    let hole = jac.get_row(semi.row(SEMI_P), cols);
    std::array::from_fn(|k| hole[k] - electron[k])
}

impl<M: BandModel> OhmicContact<M> {
    /// Rows cleared or relocated before the contact writes its own equations.
    pub(crate) fn row_edits(&self, mesh: &Mesh) -> RowEdits {
        let pinned = self.config.recombination.is_infinite();
        let mut edits = RowEdits::default();
        for node in self.owned(mesh) {
            let semi = &mesh.nodes[node.semiconductor];
            let metal_t = mesh.nodes[node.metal].row(COND_T);

            edits.clear.push(semi.row(SEMI_PSI));
            if pinned {
                edits.clear.push(semi.row(SEMI_N));
                edits.clear.push(semi.row(SEMI_P));
            }
            edits.moves.push(RowMove {
                src: semi.row(SEMI_T),
                dst: metal_t,
            });
            edits.clear.push(semi.row(SEMI_T));

            for &id in &node.insulators {
                let ins = &mesh.nodes[id];
                edits.clear.push(ins.row(COND_PSI));
                edits.moves.push(RowMove {
                    src: ins.row(COND_T),
                    dst: metal_t,
                });
                edits.clear.push(ins.row(COND_T));
            }
        }
        edits
    }

    /// Residual preprocessing. For pinned contacts the interface current is read
    /// from the bulk electron and hole rows before they are cleared:
    /// `I = (f_hole - storage_p) - (f_electron - storage_n)`.
    pub(crate) fn harvest_currents<V: ResidualVector>(
        &mut self,
        mesh: &Mesh,
        time: &TimeContext,
        x: &DVector<f64>,
        f: &V,
    ) -> RowEdits {
        let currents = if self.config.recombination.is_infinite() {
            let currents: Vec<HarvestedCurrent> = self
                .owned(mesh)
                .map(|node| {
                    let semi = &mesh.nodes[node.semiconductor];
                    let mut value = f.value(semi.row(SEMI_P)) - f.value(semi.row(SEMI_N));
                    if let Some(step) = time.step() {
                        let d = &semi.data;
                        let n = semi.value(x, SEMI_N);
                        let p = semi.value(x, SEMI_P);
                        value -= carrier_storage(step, &p, d.p, d.p_last, semi.volume)
                            - carrier_storage(step, &n, d.n, d.n_last, semi.volume);
                    }
                    HarvestedCurrent {
                        root: node.root,
                        value,
                    }
                })
                .collect();
            trace!(contact = %self.label, harvested = currents.len(), "harvested currents");
            Some(currents)
        } else {
            None
        };
        self.buffers.currents = currents;

        let edits = self.row_edits(mesh);
        trace!(
            contact = %self.label,
            cleared = edits.clear.len(),
            moved = edits.moves.len(),
            "residual row edits"
        );
        edits
    }

    /// Jacobian preprocessing. For pinned contacts the derivative structure of
    /// the bulk current is lifted off the electron and hole rows, over the
    /// contact node's unknowns and those of each neighbor.
    pub(crate) fn harvest_rows<J: JacobianMatrix>(
        &mut self,
        mesh: &Mesh,
        time: &TimeContext,
        jac: &J,
    ) -> RowEdits {
        let mut rows = Vec::new();
        if self.config.recombination.is_infinite() {
            for node in self.owned(mesh) {
                let semi = &mesh.nodes[node.semiconductor];
                let target = mesh.nodes[node.metal].row(COND_PSI);

                let cols = block(semi);
                let mut values = row_difference(jac, semi, &cols);
                // Bulk storage self-terms are not part of the interface current.
                if let Some(step) = time.step() {
                    let storage_slope = step.weights().slope() * semi.volume;
                    values[SEMI_N] -= storage_slope;
                    values[SEMI_P] += storage_slope;
                }
                rows.push(HarvestedRow {
                    row: target,
                    cols,
                    values,
                });

                for link in &semi.neighbors {
                    let cols = block(&mesh.nodes[link.node]);
                    rows.push(HarvestedRow {
                        row: target,
                        values: row_difference(jac, semi, &cols),
                        cols,
                    });
                }
            }
            trace!(contact = %self.label, rows = rows.len(), "harvested jacobian rows");
        }
        self.buffers.rows = Some(rows);
        self.row_edits(mesh)
    }
}
