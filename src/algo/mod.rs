use crate::core::Solver;

#[cfg(feature = "gurobi")]
mod gurobi;
mod list;
#[cfg(test)]
pub(crate) mod stub;

#[cfg(feature = "gurobi")]
pub use gurobi::Gurobi;
pub use list::List;

/// Every solver backend compiled into the binary.
#[allow(unsafe_code)]
#[linkme::distributed_slice]
pub static SOLVERS: [fn() -> Box<dyn Solver>];

/// Creates the solver with the given name, ignoring case.
#[must_use]
pub fn solver(name: &str) -> Option<Box<dyn Solver>> {
    SOLVERS
        .iter()
        .map(|init| init())
        .find(|solver| solver.name().eq_ignore_ascii_case(name))
}

/// Names of every available solver.
#[must_use]
pub fn solver_names() -> Vec<String> {
    SOLVERS.iter().map(|init| init().name().to_owned()).collect()
}
