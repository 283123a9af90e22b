//! Derivative-free constrained minimisation used to fit the correction matrix.
//!
//! The default [`Cobyla`] minimizer handles equality (`h(x) = 0`) and
//! inequality (`g(x) >= 0`) constraints through the `cobyla` crate. Other
//! solvers plug in through [`ConstrainedMinimizer`].

mod cobyla_minimizer;
pub mod types;

#[cfg(test)]
mod tests;

pub use cobyla_minimizer::Cobyla;
pub use types::{ConstrainedMinimizer, Constraint, Solution, SolverConfig};
