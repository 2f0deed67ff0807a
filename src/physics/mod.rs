//! Field evaluation and constitutive laws.

pub mod elasticity;
pub mod fe;
