use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Raw outcome of a solver run.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
    /// Best possible assignment found and proven.
    Optimal,
    /// Some assignment found, optimality not proven.
    Feasible,
    /// Proven that no assignment exists.
    Infeasible,
    /// Budget exhausted without a solution or proof.
    Unknown,
    /// Model malformed.
    ModelInvalid,
}

impl SolverStatus {
    /// Returns whether the response carries an assignment.
    #[must_use]
    pub const fn has_solution(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

impl Display for SolverStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Optimal => "OPTIMAL",
            Self::Feasible => "FEASIBLE",
            Self::Infeasible => "INFEASIBLE",
            Self::Unknown => "UNKNOWN",
            Self::ModelInvalid => "MODEL_INVALID",
        };
        write!(f, "{name}")
    }
}

/// Search diagnostics reported by a solver.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SolverStats {
    /// Search decisions. Branch-and-bound nodes for MILP backends, interval placements over all
    /// passes for list scheduling.
    pub branches: u64,
    /// Rejected decisions. Zero for MILP backends, placements pushed later by an already placed
    /// interval for list scheduling.
    pub conflicts: u64,
    pub wall_time: Duration,
}

/// The answer of a solver.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverResponse {
    pub status: SolverStatus,
    /// One value per model variable when `status` has a solution, empty otherwise.
    pub values: Vec<i64>,
    pub objective: Option<f64>,
    pub stats: SolverStats,
    /// Backend specific explanation of a failure.
    pub detail: Option<String>,
}

impl SolverResponse {
    /// A response carrying an assignment.
    #[must_use]
    pub const fn solved(status: SolverStatus, values: Vec<i64>, objective: f64) -> Self {
        Self {
            status,
            values,
            objective: Some(objective),
            stats: SolverStats {
                branches: 0,
                conflicts: 0,
                wall_time: Duration::ZERO,
            },
            detail: None,
        }
    }

    /// A response without an assignment.
    #[must_use]
    pub const fn failed(status: SolverStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective: None,
            stats: SolverStats {
                branches: 0,
                conflicts: 0,
                wall_time: Duration::ZERO,
            },
            detail: None,
        }
    }

    /// Attaches a failure explanation.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attaches search statistics.
    #[must_use]
    pub const fn with_stats(mut self, stats: SolverStats) -> Self {
        self.stats = stats;
        self
    }

    /// Returns the value of a variable, if the response has an assignment.
    #[must_use]
    pub fn value(&self, var: super::VarId) -> Option<i64> {
        self.values.get(var.index()).copied()
    }
}
