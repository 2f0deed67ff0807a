//! Collective communication, reductions and mesh generation.

pub mod communicator;
pub mod meshgen;
pub mod reduction;

pub use meshgen::BoxMeshBuilder;
pub use reduction::{MinAccumulator, SumAccumulator};
