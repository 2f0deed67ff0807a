#![cfg_attr(docsrs, feature(doc_cfg))]
//! # phasefield-post
//!
//! phasefield-post computes distributed postprocessing quantities of a
//! phase-field fracture finite-element solution on a partitioned hypercube
//! mesh. Every quantity is assembled from rank-local contributions and
//! combined with one collective reduction, so all ranks return the same value
//! independent of the partitioning.
//!
//! ## Quantities
//! - Boundary load: net traction `∫ σ(u)·n` over a tagged boundary, with
//!   `σ = λ tr(ε) I + 2μ ε` ([`BoundaryLoadIntegrator`](postprocess::BoundaryLoadIntegrator))
//! - Crack opening displacement along transect lines
//!   ([`CrackOpeningProfileSampler`](postprocess::CrackOpeningProfileSampler))
//! - Solution values at the mesh vertex nearest to query points
//!   ([`NearestVertexSampler`](postprocess::NearestVertexSampler))
//!
//! ## Communication
//! Algorithms take a [`Communicator`](algs::communicator::Communicator)
//! explicitly: `NoComm` for serial runs, `ThreadComm` for an in-process group
//! of ranks, and `MpiComm` with the `mpi-support` feature.
//!
//! ```toml
//! [dependencies]
//! phasefield-post = "0.3"
//! # features = ["mpi-support"]
//! ```
//!
//! ## Logging
//! Diagnostics go through the `log` facade; no logger is installed.

pub mod algs;
pub mod config;
pub mod data;
pub mod discretization;
pub mod geometry;
pub mod physics;
pub mod post_error;
pub mod postprocess;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{Communicator, NoComm, ThreadComm};
    pub use crate::algs::meshgen::BoxMeshBuilder;
    pub use crate::config::PostprocessConfig;
    pub use crate::data::dof::{DofHandler, DofLayout};
    pub use crate::data::vector::{DistributedVector, GhostedVector, SolutionRead, interpolate};
    pub use crate::geometry::tensor::{Tensor1, Tensor2};
    pub use crate::physics::elasticity::ElasticParameters;
    pub use crate::post_error::PostError;
    pub use crate::postprocess::{
        BoundaryLoadIntegrator, CodSettings, CrackOpeningProfileSampler, FaceVisitPolicy,
        NearestVertexSampler, PostprocessReport, Postprocessor,
    };
    pub use crate::topology::mesh::{MeshPartition, MeshView};
    pub use crate::topology::point::{BoundaryId, CellId, VertexId};
}
