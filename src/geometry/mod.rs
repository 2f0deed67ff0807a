//! Geometry utilities: fixed-size tensors for points, gradients and stresses.

pub mod tensor;

pub use tensor::{Tensor1, Tensor2};
