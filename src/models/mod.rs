pub mod band;
pub mod fermi;

use std::collections::HashMap;

pub use band::{equilibrium_densities, BandModel, BandState, CarrierPair, SiliconBand};

/// Material models keyed by the name a region refers to.
#[derive(Clone, Debug)]
pub struct MaterialLibrary<M> {
    entries: HashMap<String, M>,
}

impl<M> Default for MaterialLibrary<M> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<M> MaterialLibrary<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, model: M) -> Self {
        self.insert(name, model);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, model: M) {
        self.entries.insert(name.into(), model);
    }

    pub fn get(&self, name: &str) -> Option<&M> {
        self.entries.get(name)
    }
}
