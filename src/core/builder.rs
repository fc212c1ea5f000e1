use super::{
    Comparison, Expansion, Horizon, IntervalId, LinearExpr, Literal, Model, ModelError, Problem,
    SchedulingConfig, VarId,
};
use tracing::debug;

/// Decision variables of one task instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TaskVars {
    pub start: VarId,
    pub end: VarId,
    pub interval: IntervalId,
}

/// The scheduling problem expressed as a constraint model, with handles back to the expansion.
#[derive(Clone, Debug)]
pub struct SchedulingModel {
    pub model: Model,
    /// Indexed by task instance id.
    pub tasks: Vec<TaskVars>,
    /// Violation slack, indexed like [`Expansion::orders`].
    pub violations: Vec<VarId>,
    /// `None` when there is nothing to schedule.
    pub makespan: Option<VarId>,
    pub horizon: i64,
    /// Objective weight actually used for violations.
    pub violation_weight: i64,
}

fn time(value: u64) -> Result<i64, ModelError> {
    i64::try_from(value).map_err(|_| ModelError::TimeOverflow(value))
}

/// Returns a violation weight for which one violation hour outweighs any makespan gain.
#[must_use]
pub fn effective_violation_weight(configured: i64, horizon: i64) -> i64 {
    configured.max(horizon.saturating_add(1))
}

impl SchedulingModel {
    /// Translates the expansion into a constraint model.
    ///
    /// Creates start/end variables and a fixed-size interval per task, chains the steps of each
    /// unit, forbids overlaps per machine, and for every ordered pair of tasks sharing a machine
    /// whose products require a setup adds a boolean choosing which one goes first. Each order
    /// gets a violation slack bounding the end of all its units. The objective is
    /// `makespan + weight * sum(violations)`.
    ///
    /// # Errors
    /// - If a duration or setup time does not fit the time domain.
    /// - If the objective can overflow.
    pub fn build(
        problem: &Problem,
        expansion: &Expansion,
        horizon: &Horizon,
        config: &SchedulingConfig,
    ) -> Result<Self, ModelError> {
        let h = horizon.length;
        let mut model = Model::new("production_schedule");

        let mut tasks = Vec::with_capacity(expansion.tasks.len());
        for task in &expansion.tasks {
            let start = model.new_int(format!("start_{}", task.id), 0, h);
            let end = model.new_int(format!("end_{}", task.id), 0, h);
            let interval =
                model.new_interval(format!("interval_{}", task.id), start, time(task.duration)?, end);
            tasks.push(TaskVars {
                start,
                end,
                interval,
            });
        }

        for &(earlier, later) in &expansion.precedences {
            let expr = LinearExpr::from(tasks[later].start).term(tasks[earlier].end, -1);
            model.add_linear(
                format!("precedence_{earlier}_{later}"),
                expr,
                Comparison::GreaterEqual,
                0,
            );
        }

        let mut setups = 0;
        for (machine, group) in expansion
            .machine_tasks(problem.machines.len())
            .iter()
            .enumerate()
        {
            if group.is_empty() {
                continue;
            }

            let name = &problem.machines[machine].name;
            let intervals = group.iter().map(|&task| tasks[task].interval).collect();
            model.add_no_overlap(format!("no_overlap_{name}"), intervals);

            if group.len() < 2 || problem.setup_times.is_empty() {
                continue;
            }

            for &i in group {
                for &j in group {
                    if i == j {
                        continue;
                    }

                    let from = expansion.tasks[i].product;
                    let to = expansion.tasks[j].product;
                    let setup = time(problem.setup_times.get(from, to))?;
                    if setup == 0 {
                        continue;
                    }

                    let before = Literal::positive(model.new_bool(format!("setup_{i}_to_{j}")));
                    let expr = LinearExpr::from(tasks[j].start).term(tasks[i].end, -1);
                    model.add_enforced(
                        format!("setup_gap_{i}_to_{j}"),
                        expr,
                        Comparison::GreaterEqual,
                        setup,
                        Some(before),
                    );
                    let expr = LinearExpr::from(tasks[i].start).term(tasks[j].end, -1);
                    model.add_enforced(
                        format!("setup_after_{i}_to_{j}"),
                        expr,
                        Comparison::GreaterEqual,
                        0,
                        Some(before.not()),
                    );
                    setups += 1;
                }
            }
        }

        let mut violations = Vec::with_capacity(expansion.orders.len());
        for order in &expansion.orders {
            let violation = model.new_int(format!("order_violation_{}", order.id), 0, h);
            // Deadlines past the horizon can never be violated.
            let deadline = i64::try_from(order.deadline).unwrap_or(i64::MAX).min(h);
            for &last in &order.finals {
                let expr = LinearExpr::from(tasks[last].end).term(violation, -1);
                model.add_linear(
                    format!("deadline_{}_{last}", order.id),
                    expr,
                    Comparison::LessEqual,
                    deadline,
                );
            }
            violations.push(violation);
        }

        let weight = effective_violation_weight(config.violation_weight, h);
        if weight != config.violation_weight {
            debug!(
                configured = config.violation_weight,
                weight, "violation weight raised above horizon"
            );
        }

        let overflow = ModelError::ObjectiveOverflow { horizon: h, weight };
        i64::try_from(violations.len())
            .ok()
            .and_then(|orders| weight.checked_mul(h)?.checked_mul(orders)?.checked_add(h))
            .ok_or(overflow)?;

        let mut objective = LinearExpr::new();
        let makespan = if tasks.is_empty() {
            None
        } else {
            let makespan = model.new_int("makespan", 0, h);
            let ends = tasks.iter().map(|task| task.end).collect();
            model.add_max_equality("makespan", makespan, ends);
            objective = objective.term(makespan, 1);
            Some(makespan)
        };
        for &violation in &violations {
            objective = objective.term(violation, weight);
        }
        model.minimize(objective);

        debug!(
            variables = model.variables().len(),
            intervals = model.intervals().len(),
            constraints = model.constraints().len(),
            precedences = expansion.precedences.len(),
            setups,
            "model built"
        );

        Ok(Self {
            model,
            tasks,
            violations,
            makespan,
            horizon: h,
            violation_weight: weight,
        })
    }
}
