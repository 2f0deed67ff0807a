//! Mesh topology seen from one rank.
//!
//! - Cell and vertex identifiers
//! - Cell ownership and per-rank cell status (owned, ghost, artificial)
//! - Boundary indicators of domain-boundary faces
//! - The [`MeshView`](mesh::MeshView) trait and its in-memory [`MeshPartition`](mesh::MeshPartition)

pub mod labels;
pub mod mesh;
pub mod ownership;
pub mod point;

pub use mesh::{FaceRef, MeshPartition, MeshView};
pub use ownership::CellStatus;
