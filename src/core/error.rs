use super::SolverStatus;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors raised while assembling a constraint model.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ModelError {
    #[error("variable `{0}` does not exist")]
    UnknownVariable(usize),
    #[error("interval `{0}` does not exist")]
    UnknownInterval(usize),
    #[error("variable `{name}` has an empty domain [{lower}, {upper}]")]
    EmptyDomain { name: String, lower: i64, upper: i64 },
    #[error("enforcement literal `{0}` is not a boolean variable")]
    NonBooleanLiteral(String),
    #[error("interval `{0}` has a negative size")]
    NegativeSize(String),
    #[error("time value {0} does not fit the model")]
    TimeOverflow(u64),
    #[error("objective overflows with horizon {horizon} and violation weight {weight}")]
    ObjectiveOverflow { horizon: i64, weight: i64 },
}

/// A non-successful solver outcome with a hint on how to recover.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SolverOutcomeError {
    #[error("Solver status: INFEASIBLE. Constraints cannot be satisfied: check machine capacity against total work ({total_work}h), setup time tightness, or enlarge the horizon ({horizon}h).")]
    Infeasible { total_work: u64, horizon: i64 },
    #[error("Solver status: UNKNOWN. Time budget exhausted before a solution was proven: relax the time limit or reduce the problem size.")]
    Unknown,
    #[error("Solver status: MODEL_INVALID. Malformed constraints: {0}")]
    ModelInvalid(String),
    #[error("Solver status: UNKNOWN. Solver returned {actual} values for {expected} variables.")]
    IncompleteAssignment { expected: usize, actual: usize },
}

impl SolverOutcomeError {
    /// Returns the raw solver status this error wraps.
    #[must_use]
    pub const fn status(&self) -> SolverStatus {
        match self {
            Self::Infeasible { .. } => SolverStatus::Infeasible,
            Self::Unknown | Self::IncompleteAssignment { .. } => SolverStatus::Unknown,
            Self::ModelInvalid(_) => SolverStatus::ModelInvalid,
        }
    }
}

impl From<ModelError> for SolverOutcomeError {
    fn from(error: ModelError) -> Self {
        Self::ModelInvalid(error.to_string())
    }
}

/// A data inconsistency noticed while scheduling. Never fatal, always reported.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Diagnostic {
    #[error("order {order} ({product}) unit {unit} task {step}: no machine supports operation `{operation}`, task not scheduled")]
    UnsupportedOperation {
        order: usize,
        product: String,
        unit: u64,
        step: usize,
        operation: String,
    },
    #[error("order {order}: unknown product `{product}`, order not scheduled")]
    UnknownProduct { order: usize, product: String },
    #[error("setup time `{key}` does not name a pair of known products")]
    UnmatchedSetupKey { key: String },
    #[error("machine {machine}: task {task} starts {gap}h after task {previous} but needs {setup}h setup")]
    SetupGapShortfall {
        machine: String,
        previous: usize,
        task: usize,
        gap: i64,
        setup: u64,
    },
}

impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
