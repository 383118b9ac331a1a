use nalgebra::DVector;
use tracing::trace;

use super::equations::{contact_equations, insulator_continuity, ContactState};
use super::preprocess::HarvestedCurrent;
use super::OhmicContact;
use crate::discretization::mesh::{FvmNode, Mesh, COND_PSI, COND_T, SEMI_N, SEMI_P, SEMI_PSI, SEMI_T};
use crate::error::ContactError;
use crate::models::BandModel;
use crate::numerics::assembly::{InsertMode, ResidualVector};
use crate::numerics::transient::TimeContext;

impl ContactState<f64> {
    pub fn read(x: &DVector<f64>, mesh: &Mesh, semi: &FvmNode, metal: &FvmNode) -> Self {
        Self {
            v_metal: metal.value(x, COND_PSI),
            t_metal: metal.value(x, COND_T),
            v_semi: semi.value(x, SEMI_PSI),
            n: semi.value(x, SEMI_N),
            p: semi.value(x, SEMI_P),
            t_semi: semi.value(x, SEMI_T),
            v_neighbors: semi
                .neighbors
                .iter()
                .map(|link| mesh.nodes[link.node].value(x, SEMI_PSI))
                .collect(),
        }
    }
}

impl<M: BandModel> OhmicContact<M> {
    /// Harvested currents must line up with this pass's owned nodes.
    fn check_currents(&self, mesh: &Mesh, currents: &[HarvestedCurrent]) -> Result<(), ContactError> {
        let mut visited = 0;
        for node in self.owned(mesh) {
            if let Some(entry) = currents.get(visited) {
                if entry.root != node.root {
                    return Err(ContactError::HarvestOrder {
                        harvested: entry.root,
                        visited: node.root,
                    });
                }
            }
            visited += 1;
        }
        if visited != currents.len() {
            return Err(ContactError::CurrentBufferLength {
                held: currents.len(),
                visited,
            });
        }
        Ok(())
    }

    pub(crate) fn assemble_residual<V: ResidualVector>(
        &mut self,
        mesh: &Mesh,
        time: &TimeContext,
        x: &DVector<f64>,
        f: &mut V,
        mode: &mut InsertMode,
    ) -> Result<(), ContactError> {
        if mode.needs_flush() {
            f.assemble();
        }
        self.terminal.reset_pass();

        let currents = if self.config.recombination.is_infinite() {
            let currents = self.buffers.currents.take().ok_or(ContactError::MissingCurrents)?;
            self.check_currents(mesh, &currents)?;
            Some(currents)
        } else {
            None
        };

        let mut pass_current = 0.0;
        for (position, node) in self.owned(mesh).enumerate() {
            let semi = &mesh.nodes[node.semiconductor];
            let metal = &mesh.nodes[node.metal];
            let state = ContactState::<f64>::read(x, mesh, semi, metal);
            let eqs = contact_equations(
                &self.config.recombination,
                &self.material,
                time,
                mesh,
                semi,
                metal,
                &state,
            );

            let mut injected = eqs.injected;
            if let Some(entry) = currents.as_ref().and_then(|c| c.get(position)) {
                injected += entry.value;
            }

            f.add_value(semi.row(SEMI_PSI), eqs.potential);
            f.add_value(semi.row(SEMI_N), eqs.electron);
            f.add_value(semi.row(SEMI_P), eqs.hole);
            f.add_value(semi.row(SEMI_T), eqs.temperature);
            f.add_value(metal.row(COND_PSI), injected);

            for &id in &node.insulators {
                let ins = &mesh.nodes[id];
                let (potential, temperature) = insulator_continuity(
                    &ins.value(x, COND_PSI),
                    &ins.value(x, COND_T),
                    &state.v_metal,
                    &state.t_metal,
                );
                f.add_value(ins.row(COND_PSI), potential);
                f.add_value(ins.row(COND_T), temperature);
            }

            pass_current += injected;
        }

        self.terminal.record_pass(pass_current * self.config.z_width);
        *mode = InsertMode::Add;
        trace!(
            contact = %self.label,
            current = self.terminal.pass_current(),
            "residual pass"
        );
        Ok(())
    }
}
