use nalgebra::DVector;
use tracing::info;

use super::OhmicContact;
use crate::discretization::mesh::{Mesh, COND_PSI};
use crate::parallel::Communicator;

/// Terminal quantities of a contact.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Terminal {
    pass_current: f64,
    current: f64,
    potential: f64,
}

impl Terminal {
    /// Terminal current published for the last accepted solution (A).
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Mean metal potential published for the last accepted solution (V).
    pub fn potential(&self) -> f64 {
        self.potential
    }

    /// Current accumulated on this process by the latest residual pass.
    pub fn pass_current(&self) -> f64 {
        self.pass_current
    }

    pub(crate) fn reset_pass(&mut self) {
        self.pass_current = 0.0;
    }

    pub(crate) fn record_pass(&mut self, current: f64) {
        self.pass_current = current;
    }

    pub(crate) fn publish<C: Communicator>(&mut self, comm: &C, local_potentials: &[f64]) {
        self.current = comm.sum(self.pass_current);
        self.potential = mean_potential(&comm.all_gather(local_potentials));
    }
}

/// Arithmetic mean; zero when there is nothing to average.
pub fn mean_potential(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

impl<M> OhmicContact<M> {
    /// Reduce the last residual pass's current and the owned metal potentials
    /// over all processes.
    pub(crate) fn publish_terminal<C: Communicator>(&mut self, mesh: &Mesh, x: &DVector<f64>, comm: &C) {
        let potentials: Vec<f64> = self
            .owned(mesh)
            .map(|node| mesh.nodes[node.metal].value(x, COND_PSI))
            .collect();
        self.terminal.publish(comm, &potentials);
        info!(
            contact = %self.label,
            current = self.terminal.current(),
            potential = self.terminal.potential(),
            "terminal update"
        );
    }
}
