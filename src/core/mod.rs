mod builder;
mod config;
mod error;
mod expand;
mod horizon;
mod model;
mod problem;
mod solution;
mod solver;

pub use builder::*;
pub use config::*;
pub use error::*;
pub use expand::*;
pub use horizon::*;
pub use model::*;
pub use problem::*;
pub use solution::*;
pub use solver::*;

use std::time::Duration;

/// Searches assignments of a constraint model.
pub trait Solver {
    /// Solves the model within the given wall-clock budget.
    /// Implementations report every failure through the response status.
    fn solve(&mut self, model: &Model, time_limit: Duration) -> SolverResponse;

    /// Returns the name of the solver.
    fn name(&self) -> &str;
}
