use nalgebra::DVector;
use num_dual::DualDVec64;
use tracing::trace;

use super::equations::{contact_equations, insulator_continuity, ContactState};
use super::OhmicContact;
use crate::discretization::mesh::{FvmNode, Mesh, COND_PSI, COND_T, SEMI_N, SEMI_P, SEMI_PSI, SEMI_T};
use crate::error::ContactError;
use crate::models::BandModel;
use crate::numerics::assembly::{InsertMode, JacobianMatrix};
use crate::numerics::dual::{
    SlotLayout, CONTACT_SLOTS, SLOT_METAL_PSI, SLOT_METAL_T, SLOT_SEMI_N, SLOT_SEMI_P,
    SLOT_SEMI_PSI, SLOT_SEMI_T,
};
use crate::numerics::transient::TimeContext;

impl ContactState<DualDVec64> {
    /// Independent variables seeded with unit derivatives in their slots.
    pub fn seed(
        x: &DVector<f64>,
        mesh: &Mesh,
        semi: &FvmNode,
        metal: &FvmNode,
        layout: &SlotLayout,
    ) -> Self {
        Self {
            v_metal: layout.seed(metal.value(x, COND_PSI), SLOT_METAL_PSI),
            t_metal: layout.seed(metal.value(x, COND_T), SLOT_METAL_T),
            v_semi: layout.seed(semi.value(x, SEMI_PSI), SLOT_SEMI_PSI),
            n: layout.seed(semi.value(x, SEMI_N), SLOT_SEMI_N),
            p: layout.seed(semi.value(x, SEMI_P), SLOT_SEMI_P),
            t_semi: layout.seed(semi.value(x, SEMI_T), SLOT_SEMI_T),
            v_neighbors: semi
                .neighbors
                .iter()
                .enumerate()
                .map(|(j, link)| {
                    layout.seed(
                        mesh.nodes[link.node].value(x, SEMI_PSI),
                        SlotLayout::neighbor_slot(j),
                    )
                })
                .collect(),
        }
    }
}

impl<M: BandModel> OhmicContact<M> {
    pub(crate) fn assemble_jacobian<J: JacobianMatrix>(
        &mut self,
        mesh: &Mesh,
        time: &TimeContext,
        x: &DVector<f64>,
        jac: &mut J,
        mode: &mut InsertMode,
    ) -> Result<(), ContactError> {
        if mode.needs_flush() {
            jac.assemble();
        }

        // Replay before anything new lands on the metal rows.
        let harvested = self.buffers.rows.take();
        if self.config.recombination.is_infinite() {
            let rows = harvested.ok_or(ContactError::MissingHarvest)?;
            for r in &rows {
                jac.add_row(r.row, &r.cols, &r.values);
            }
            trace!(contact = %self.label, rows = rows.len(), "replayed harvested rows");
        }

        let insulator = SlotLayout::insulator();
        for node in self.owned(mesh) {
            let semi = &mesh.nodes[node.semiconductor];
            let metal = &mesh.nodes[node.metal];
            let layout = SlotLayout::contact(semi.neighbors.len());
            let state = ContactState::<DualDVec64>::seed(x, mesh, semi, metal, &layout);
            let eqs = contact_equations(
                &self.config.recombination,
                &self.material,
                time,
                mesh,
                semi,
                metal,
                &state,
            );

            let mut cols = Vec::with_capacity(layout.width());
            cols.extend([
                metal.row(COND_PSI),
                metal.row(COND_T),
                semi.row(SEMI_PSI),
                semi.row(SEMI_N),
                semi.row(SEMI_P),
                semi.row(SEMI_T),
            ]);

            for (row, value) in [
                (semi.row(SEMI_PSI), &eqs.potential),
                (semi.row(SEMI_N), &eqs.electron),
                (semi.row(SEMI_P), &eqs.hole),
                (semi.row(SEMI_T), &eqs.temperature),
            ] {
                let grad = layout.gradient(value);
                jac.add_row(row, &cols, &grad.as_slice()[..CONTACT_SLOTS]);
            }

            // Displacement terms reach the neighbor potentials.
            cols.extend(
                semi.neighbors
                    .iter()
                    .map(|link| mesh.nodes[link.node].row(SEMI_PSI)),
            );
            let grad = layout.gradient(&eqs.injected);
            jac.add_row(metal.row(COND_PSI), &cols, grad.as_slice());

            for &id in &node.insulators {
                let ins = &mesh.nodes[id];
                let (potential, temperature) = insulator_continuity(
                    &insulator.seed(ins.value(x, COND_PSI), 2),
                    &insulator.seed(ins.value(x, COND_T), 3),
                    &insulator.seed(metal.value(x, COND_PSI), 0),
                    &insulator.seed(metal.value(x, COND_T), 1),
                );
                let ins_cols = [
                    metal.row(COND_PSI),
                    metal.row(COND_T),
                    ins.row(COND_PSI),
                    ins.row(COND_T),
                ];
                jac.add_row(ins.row(COND_PSI), &ins_cols, insulator.gradient(&potential).as_slice());
                jac.add_row(ins.row(COND_T), &ins_cols, insulator.gradient(&temperature).as_slice());
            }
        }

        *mode = InsertMode::Add;
        Ok(())
    }
}
