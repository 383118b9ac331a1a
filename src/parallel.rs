//! Collective operations across the processes sharing a partitioned mesh.

use std::sync::{Arc, Barrier, Mutex, PoisonError};

pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Sum of `value` over all ranks.
    fn sum(&self, value: f64) -> f64;

    /// Concatenation of every rank's `values`, in rank order.
    fn all_gather(&self, values: &[f64]) -> Vec<f64>;
}

/// Single-process communicator.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn sum(&self, value: f64) -> f64 {
        value
    }

    fn all_gather(&self, values: &[f64]) -> Vec<f64> {
        values.to_vec()
    }
}

struct Exchange {
    barrier: Barrier,
    slots: Mutex<Vec<Vec<f64>>>,
}

/// Simulates `size` processes with threads sharing one exchange area.
///
/// Every rank must issue the same collectives in the same order, exactly as
/// with a message-passing runtime; a rank that skips a collective deadlocks
/// the others.
#[derive(Clone)]
pub struct SharedMemoryComm {
    rank: usize,
    size: usize,
    exchange: Arc<Exchange>,
}

impl SharedMemoryComm {
    /// One communicator per rank, to be moved into its own thread.
    pub fn universe(size: usize) -> Vec<Self> {
        let size = size.max(1);
        let exchange = Arc::new(Exchange {
            barrier: Barrier::new(size),
            slots: Mutex::new(vec![Vec::new(); size]),
        });
        (0..size)
            .map(|rank| Self {
                rank,
                size,
                exchange: Arc::clone(&exchange),
            })
            .collect()
    }

    fn exchange(&self, payload: Vec<f64>) -> Vec<Vec<f64>> {
        {
            let mut slots = self
                .exchange
                .slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            slots[self.rank] = payload;
        }
        self.exchange.barrier.wait();
        let gathered = self
            .exchange
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        // Nobody may overwrite a slot before every rank has read it.
        self.exchange.barrier.wait();
        gathered
    }
}

impl Communicator for SharedMemoryComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn sum(&self, value: f64) -> f64 {
        self.exchange(vec![value])
            .iter()
            .flat_map(|slot| slot.iter())
            .sum()
    }

    fn all_gather(&self, values: &[f64]) -> Vec<f64> {
        self.exchange(values.to_vec()).concat()
    }
}
