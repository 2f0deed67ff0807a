//! PostError: unified error type for phasefield-post public APIs
//!
//! Every fallible operation in the crate returns `Result<_, PostError>`.
//! Collective communication failures are not represented here: a failed
//! collective is fatal for the whole process group.

use thiserror::Error;

/// Unified error type for postprocessing operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PostError {
    /// The crack-opening axis is not a spatial axis of the mesh.
    #[error("direction {direction} is not a valid axis for a {dim}-dimensional mesh")]
    InvalidDirection { direction: usize, dim: usize },
    /// No rank holds any vertex, so the query point cannot be resolved.
    #[error("no mesh vertex found for query point {point:?}")]
    NoVertexFound { point: Vec<f64> },
    /// A degree of freedom was read that is neither owned nor ghosted here.
    #[error("degree of freedom {0} is not present in the ghosted vector")]
    MissingDof(usize),
    /// A global DoF index exceeds the size of the distributed vector.
    #[error("degree of freedom {index} out of range for vector of size {size}")]
    DofOutOfRange { index: usize, size: usize },
    /// A field component index exceeds the number of components.
    #[error("component {component} out of range for {n_components} components")]
    InvalidComponent { component: usize, n_components: usize },
    /// Element geometry is degenerate or malformed.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Mesh construction arguments are inconsistent.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
    /// A configuration value is out of its admissible range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Two buffers that must agree in length do not.
    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    /// The MPI runtime could not be initialised.
    #[error("MPI error: {0}")]
    Mpi(String),
}
