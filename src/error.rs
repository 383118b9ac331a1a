use thiserror::Error;

/// Failures raised while binding or evaluating a contact.
///
/// Binding errors are structural: the contact cannot be built on a mesh that breaks the
/// node-correspondence invariants, so no assembly call is ever made on such a mesh.
/// Buffer errors mean the preprocess / assembly protocol was driven out of order.
#[derive(Debug, Error, PartialEq)]
pub enum ContactError {
    #[error("region {0} does not exist")]
    UnknownRegion(usize),
    #[error("region {region} is not a {expected} region")]
    RegionKind {
        region: usize,
        expected: &'static str,
    },
    #[error("node at position {position} carries id {id}")]
    NodeIndex { position: usize, id: usize },
    #[error("semiconductor region {0} does not name a material")]
    UnnamedMaterial(usize),
    #[error("no material model named `{0}`")]
    MissingMaterial(String),
    #[error("boundary node {root} has no counterpart in semiconductor region {region}")]
    MissingSemiconductorNode { root: usize, region: usize },
    #[error("boundary node {root} has no counterpart in metal region {region}")]
    MissingMetalNode { root: usize, region: usize },
    #[error("neighbor {neighbor} of node {node} sits at zero distance")]
    DegenerateNeighbor { node: usize, neighbor: usize },
    #[error("missing scalar parameter `{0}`")]
    MissingParameter(String),
    #[error("residual preprocessing must run before residual assembly")]
    MissingCurrents,
    #[error("jacobian preprocessing must run before jacobian assembly")]
    MissingHarvest,
    #[error("current harvested at node {harvested} consumed at node {visited}")]
    HarvestOrder { harvested: usize, visited: usize },
    #[error("{held} currents were harvested but {visited} owned nodes were visited")]
    CurrentBufferLength { held: usize, visited: usize },
}
