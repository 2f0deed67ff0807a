//! Data module: DoF numbering and distributed vectors
#![warn(missing_docs)]

pub mod dof;
pub mod vector;
