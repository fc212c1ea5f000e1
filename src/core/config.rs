use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default penalty per hour of deadline violation.
pub const DEFAULT_VIOLATION_WEIGHT: i64 = 1000;

/// Default wall-clock budget handed to the solver.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(30);

/// Per-invocation scheduling parameters. Nothing here outlives a single call.
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, Eq, Serialize, PartialEq)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Overrides the estimated planning horizon, in hours.
    pub horizon: Option<i64>,
    /// Objective weight of a single violation hour relative to one makespan hour.
    pub violation_weight: i64,
    /// Time budget of the solver.
    pub time_limit: Duration,
}

impl SchedulingConfig {
    /// Sets a fixed horizon.
    #[must_use]
    pub const fn with_horizon(mut self, horizon: i64) -> Self {
        self.horizon = Some(horizon);
        self
    }

    /// Sets the violation weight.
    #[must_use]
    pub const fn with_violation_weight(mut self, weight: i64) -> Self {
        self.violation_weight = weight;
        self
    }

    /// Sets the solver time limit.
    #[must_use]
    pub const fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            horizon: None,
            violation_weight: DEFAULT_VIOLATION_WEIGHT,
            time_limit: DEFAULT_TIME_LIMIT,
        }
    }
}
