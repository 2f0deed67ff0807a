//! Runtime discretization helpers for quadrature and reference-element evaluation.

pub mod runtime;

pub use runtime::{BasisTabulation, QuadratureRule, tabulate_q1};
