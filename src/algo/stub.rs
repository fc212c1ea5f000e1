//! Deterministic solver answering with a crafted response.

use crate::core::{
    Comparison, Constraint, Model, SchedulingModel, Solver, SolverResponse, SolverStatus,
};
use std::time::Duration;

/// Replays a fixed response and records how it was called.
#[derive(Clone, Debug)]
pub struct Stub {
    pub response: SolverResponse,
    pub calls: usize,
    pub time_limit: Option<Duration>,
}

impl Stub {
    pub const fn new(response: SolverResponse) -> Self {
        Self {
            response,
            calls: 0,
            time_limit: None,
        }
    }

    pub const fn failing(status: SolverStatus) -> Self {
        Self::new(SolverResponse::failed(status))
    }
}

impl Solver for Stub {
    fn solve(&mut self, _model: &Model, time_limit: Duration) -> SolverResponse {
        self.calls += 1;
        self.time_limit = Some(time_limit);
        self.response.clone()
    }

    fn name(&self) -> &'static str {
        "Stub"
    }
}

/// Builds a full assignment from task starts and order violations.
/// Ends follow from interval sizes, the makespan from the ends, and every setup choice is set
/// to whichever branch the starts satisfy.
pub fn assignment(built: &SchedulingModel, starts: &[i64], violations: &[i64]) -> Vec<i64> {
    let model = &built.model;
    let mut values = vec![0; model.variables().len()];

    for (vars, &start) in built.tasks.iter().zip(starts) {
        values[vars.start.index()] = start;
        values[vars.end.index()] = start + model.interval(vars.interval).size;
    }
    for (&var, &violation) in built.violations.iter().zip(violations) {
        values[var.index()] = violation;
    }
    if let Some(makespan) = built.makespan {
        let ends = built.tasks.iter().map(|vars| values[vars.end.index()]);
        values[makespan.index()] = ends.max().unwrap_or_default();
    }

    for constraint in model.constraints() {
        if let Constraint::Linear(linear) = constraint {
            if let Some(literal) = linear.enforce.filter(|literal| !literal.negated) {
                let holds = linear.comparison == Comparison::GreaterEqual
                    && linear.expr.evaluate(&values) >= i128::from(linear.rhs);
                values[literal.var.index()] = i64::from(holds);
            }
        }
    }

    values
}
