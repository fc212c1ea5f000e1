#![deny(clippy::all, clippy::cargo, clippy::expect_used, clippy::unwrap_used)]
#![deny(clippy::pedantic, clippy::nursery, unsafe_code)]
#![warn(clippy::unimplemented, clippy::redundant_type_annotations)]

use crate::core::{
    interpret, Expansion, Horizon, Problem, ScheduleResult, SchedulingConfig, SchedulingModel,
    Solver, SolverOutcomeError,
};
use anyhow::Result;
use std::io::BufRead;
use tracing::{info, warn};

pub mod algo;
pub mod core;
pub mod data;
pub mod logging;

/// Schedules the problem with the given solver.
///
/// Estimates the horizon, expands orders into task instances, builds the constraint model,
/// hands it to the solver within the configured time budget and interprets the answer.
/// Every outcome, including model construction failures, is encoded in the returned result.
///
/// # Panics
/// - If the solver answer or the schedule is invalid in debug mode.
pub fn solve_schedule(
    problem: &Problem,
    config: &SchedulingConfig,
    solver: &mut dyn Solver,
) -> ScheduleResult {
    let horizon = match Horizon::resolve(problem, config.horizon) {
        Ok(horizon) => horizon,
        Err(error) => return ScheduleResult::failed(error.into(), Vec::new()),
    };

    let expansion = Expansion::new(problem);
    for diagnostic in &expansion.diagnostics {
        warn!("{diagnostic}");
    }
    info!(
        horizon = horizon.length,
        total_work = horizon.total_work,
        tasks = expansion.tasks.len(),
        orders = expansion.orders.len(),
        "orders expanded"
    );
    let flexible = expansion.flexible_tasks();
    if flexible > 0 {
        info!(flexible, "tasks bound to the first of several capable machines");
    }

    let built = match SchedulingModel::build(problem, &expansion, &horizon, config) {
        Ok(built) => built,
        Err(error) => {
            warn!("model construction failed: {error}");
            let failure = SolverOutcomeError::from(error);
            return ScheduleResult::failed(failure, expansion.diagnostics);
        }
    };

    let response = solver.solve(&built.model, config.time_limit);
    info!(
        solver = solver.name(),
        status = %response.status,
        objective = ?response.objective,
        branches = response.stats.branches,
        wall_time = ?response.stats.wall_time,
        "solver finished"
    );

    debug_assert!(
        !response.status.has_solution()
            || response.values.len() != built.model.variables().len()
            || built.model.check(&response.values).is_ok(),
        "Solver answer is invalid: {:?}",
        built.model.check(&response.values)
    );

    let anchor = problem
        .start_time
        .unwrap_or_else(|| chrono::Local::now().naive_local());
    let result = interpret(problem, &expansion, &built, &horizon, &response, anchor);
    for diagnostic in result.diagnostics.iter().skip(expansion.diagnostics.len()) {
        warn!("{diagnostic}");
    }

    if let Some(report) = &result.report {
        debug_assert!(report.verify(built.horizon), "Schedule is invalid: {report:?}");
        info!(
            status = ?result.status,
            makespan = report.makespan,
            violations = report.deadline_violations.len(),
            total_violation_hours = report.total_violation_hours,
            "schedule ready"
        );
    } else {
        warn!(message = result.message.as_deref().unwrap_or_default(), "no schedule");
    }

    result.with_solver(solver.name(), &response)
}

/// Reads a problem from the reader, schedules it and writes the result to stdout as JSON.
///
/// # Errors
/// - If the problem could not be read from the reader.
/// - If the result could not be written to stdout.
pub fn run_reader(
    solver: &mut dyn Solver,
    config: &SchedulingConfig,
    start_time: Option<chrono::NaiveDateTime>,
    reader: &mut impl BufRead,
) -> Result<ScheduleResult> {
    let mut problem: Problem = data::deserialize(reader)?;
    if let Some(start_time) = start_time {
        problem = problem.with_start_time(start_time);
    }

    let result = solve_schedule(&problem, config, solver);
    println!("{}", data::to_string(&result)?);

    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algo::{stub::Stub, List};
    use crate::core::{
        Diagnostic, Machine, Order, Product, ProductTask, ResultStatus, SetupTimes, SolverStatus,
    };
    use crate::data::gen::{generate, DeadlineMode, GeneratorConfig, WorkloadSize};
    use ahash::{HashMap, HashMapExt};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn anchor() -> anyhow::Result<chrono::NaiveDateTime> {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|date| date.and_hms_opt(8, 0, 0))
            .ok_or_else(|| anyhow::anyhow!("bad date"))
    }

    fn cut_and_paint(deadline: u64) -> anyhow::Result<Problem> {
        Ok(Problem::new(
            vec![Machine::new("A", ["cut"]), Machine::new("B", ["paint"])],
            vec![Product::new(
                "P1",
                vec![ProductTask::new("cut", 2), ProductTask::new("paint", 3)],
            )],
            SetupTimes::new(),
            vec![Order::new("P1", 1, deadline)],
        )
        .with_start_time(anchor()?))
    }

    fn solve(problem: &Problem) -> ScheduleResult {
        logging::init_test();
        solve_schedule(problem, &SchedulingConfig::default(), &mut List)
    }

    #[test]
    fn two_step_product_runs_back_to_back() -> anyhow::Result<()> {
        let result = solve(&cut_and_paint(10)?);

        assert_eq!(result.status, ResultStatus::Optimal);
        let report = result.report.ok_or_else(|| anyhow::anyhow!("no schedule"))?;
        assert_eq!(report.makespan, 5);
        assert!(report.deadline_violations.is_empty());
        assert_eq!(report.total_violation_hours, 0);

        let tasks: Vec<_> = report
            .schedule
            .iter()
            .map(|entry| (entry.machine.as_str(), entry.start, entry.end))
            .collect();
        assert_eq!(tasks, vec![("A", 0, 2), ("B", 2, 5)]);
        assert_eq!(report.schedule[1].end_datetime.to_string(), "2024-03-01 13:00:00");
        assert_eq!(result.solver.map(|solver| solver.name), Some("List".to_owned()));
        Ok(())
    }

    #[test]
    fn missed_deadline_is_reported() -> anyhow::Result<()> {
        let result = solve(&cut_and_paint(3)?);

        assert_eq!(result.status, ResultStatus::FeasibleWithViolations);
        let report = result.report.ok_or_else(|| anyhow::anyhow!("no schedule"))?;
        assert_eq!(report.makespan, 5);
        assert_eq!(report.total_violation_hours, 2);
        assert_eq!(report.deadline_violations.len(), 1);
        assert_eq!(report.deadline_violations[0].actual_completion, 5);
        assert_eq!(report.deadline_violations[0].violation_hours, 2);
        Ok(())
    }

    #[test]
    fn setup_separates_products_on_shared_machine() -> anyhow::Result<()> {
        let problem = Problem::new(
            vec![Machine::new("A", ["cut"])],
            vec![
                Product::new("P1", vec![ProductTask::new("cut", 2)]),
                Product::new("P2", vec![ProductTask::new("cut", 3)]),
            ],
            SetupTimes::new().with("P1", "P2", 4),
            vec![Order::new("P1", 1, 50), Order::new("P2", 1, 50)],
        );

        let result = solve(&problem);

        assert!(result.diagnostics.is_empty());
        let report = result.report.ok_or_else(|| anyhow::anyhow!("no schedule"))?;
        let machine = report.machine_schedule("A");
        assert_eq!(machine.len(), 2);
        let (first, second) = (&machine[0], &machine[1]);
        let setup = match (first.order.as_str(), second.order.as_str()) {
            ("P1", "P2") => 4,
            ("P2", "P1") => 0,
            other => anyhow::bail!("unexpected sequence {other:?}"),
        };
        assert!(second.start - first.end >= setup);
        assert_eq!(i64::try_from(second.setup_time)?, setup);
        assert_eq!(report.makespan, second.end);
        Ok(())
    }

    #[test]
    fn setups_hold_between_every_pair_on_a_machine() -> anyhow::Result<()> {
        let problem = Problem::new(
            vec![Machine::new("A", ["cut"])],
            vec![
                Product::new("P1", vec![ProductTask::new("cut", 2)]),
                Product::new("P2", vec![ProductTask::new("cut", 3)]),
            ],
            SetupTimes::new().with("P1", "P2", 2).with("P2", "P1", 3),
            vec![Order::new("P1", 2, 50), Order::new("P2", 2, 50)],
        );
        let setup = |from: &str, to: &str| match (from, to) {
            ("P1", "P2") => 2,
            ("P2", "P1") => 3,
            _ => 0,
        };

        let result = solve(&problem);

        assert!(result.diagnostics.is_empty());
        let report = result.report.ok_or_else(|| anyhow::anyhow!("no schedule"))?;
        assert!(report.verify(Horizon::estimate(&problem)?.length));
        let machine = report.machine_schedule("A");
        assert_eq!(machine.len(), 4);
        for (position, earlier) in machine.iter().enumerate() {
            for later in &machine[position + 1..] {
                assert!(later.start - earlier.end >= setup(&earlier.order, &later.order));
            }
        }
        for pair in machine.windows(2) {
            let expected = setup(&pair[0].order, &pair[1].order);
            assert_eq!(i64::try_from(pair[1].setup_time)?, expected);
        }
        Ok(())
    }

    #[test]
    fn urgent_order_overtakes_input_order() -> anyhow::Result<()> {
        let problem = Problem::new(
            vec![Machine::new("A", ["cut"])],
            vec![
                Product::new("Long", vec![ProductTask::new("cut", 10)]),
                Product::new("Short", vec![ProductTask::new("cut", 1)]),
            ],
            SetupTimes::new(),
            vec![Order::new("Long", 1, 100), Order::new("Short", 1, 1)],
        );

        let result = solve(&problem);

        assert_eq!(result.status, ResultStatus::Feasible);
        let report = result.report.ok_or_else(|| anyhow::anyhow!("no schedule"))?;
        assert_eq!(report.total_violation_hours, 0);
        assert!(report.deadline_violations.is_empty());
        assert_eq!(report.makespan, 11);
        let orders: Vec<_> = report
            .machine_schedule("A")
            .iter()
            .map(|entry| entry.order.as_str())
            .collect();
        assert_eq!(orders, vec!["Short", "Long"]);
        Ok(())
    }

    #[test]
    fn unsupported_operation_is_diagnosed() -> anyhow::Result<()> {
        let mut problem = cut_and_paint(10)?;
        problem.products[0].tasks.push(ProductTask::new("weld", 1));

        let result = solve(&problem);

        assert!(result.is_success());
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::UnsupportedOperation {
                order: 0,
                product: "P1".to_owned(),
                unit: 0,
                step: 2,
                operation: "weld".to_owned(),
            }]
        );
        let report = result.report.ok_or_else(|| anyhow::anyhow!("no schedule"))?;
        assert_eq!(report.schedule.len(), 2);
        Ok(())
    }

    #[test]
    fn short_horizon_fails_without_schedule() -> anyhow::Result<()> {
        let problem = cut_and_paint(10)?;
        let config = SchedulingConfig::default().with_horizon(3);

        let result = solve_schedule(&problem, &config, &mut List);

        assert_eq!(result.status, ResultStatus::Infeasible);
        assert!(result.report.is_none());
        let message = result.message.unwrap_or_default();
        assert!(message.starts_with("Solver status: INFEASIBLE."));
        Ok(())
    }

    #[test]
    fn every_solver_failure_maps_to_infeasible() -> anyhow::Result<()> {
        let problem = cut_and_paint(10)?;

        for (status, name) in [
            (SolverStatus::Infeasible, "INFEASIBLE"),
            (SolverStatus::Unknown, "UNKNOWN"),
            (SolverStatus::ModelInvalid, "MODEL_INVALID"),
        ] {
            let mut stub = Stub::failing(status);
            let result = solve_schedule(&problem, &SchedulingConfig::default(), &mut stub);

            assert_eq!(result.status, ResultStatus::Infeasible);
            assert!(result.report.is_none());
            assert!(result.message.unwrap_or_default().contains(name));
            assert_eq!(result.failure.map(|failure| failure.status()), Some(status));
            assert_eq!(result.solver.map(|solver| solver.status), Some(status));
        }
        Ok(())
    }

    #[test]
    fn time_limit_reaches_solver() -> anyhow::Result<()> {
        let problem = cut_and_paint(10)?;
        let config = SchedulingConfig::default().with_time_limit(Duration::from_secs(5));
        let mut stub = Stub::failing(SolverStatus::Unknown);

        let _ = solve_schedule(&problem, &config, &mut stub);

        assert_eq!(stub.calls, 1);
        assert_eq!(stub.time_limit, Some(Duration::from_secs(5)));
        Ok(())
    }

    #[test]
    fn construction_failure_skips_solver() -> anyhow::Result<()> {
        let problem = cut_and_paint(10)?;
        let config = SchedulingConfig::default().with_horizon(i64::MAX / 2);
        let mut stub = Stub::failing(SolverStatus::Optimal);

        let result = solve_schedule(&problem, &config, &mut stub);

        assert_eq!(stub.calls, 0);
        assert_eq!(result.status, ResultStatus::Infeasible);
        assert!(result
            .message
            .unwrap_or_default()
            .starts_with("Solver status: MODEL_INVALID."));
        Ok(())
    }

    #[test]
    fn repeated_runs_agree() -> anyhow::Result<()> {
        let problem = generate(&GeneratorConfig {
            size: WorkloadSize::Large,
            deadlines: DeadlineMode::Tight,
            seed: Some(3),
        })
        .with_start_time(anchor()?);

        let config = SchedulingConfig::default().with_time_limit(Duration::from_secs(3600));
        let first = solve_schedule(&problem, &config, &mut List).report;
        let second = solve_schedule(&problem, &config, &mut List).report;

        let summary = |report: Option<crate::core::ScheduleReport>| {
            report.map(|report| (report.makespan, report.total_violation_hours))
        };
        assert!(first.is_some());
        assert_eq!(summary(first), summary(second));
        Ok(())
    }

    #[test]
    fn generated_workloads_hold_invariants() -> anyhow::Result<()> {
        for (seed, deadlines) in [(1, DeadlineMode::Achievable), (2, DeadlineMode::Tight)] {
            let problem = generate(&GeneratorConfig {
                size: WorkloadSize::Large,
                deadlines,
                seed: Some(seed),
            })
            .with_start_time(anchor()?);
            let horizon = Horizon::estimate(&problem)?;

            let result = solve(&problem);

            assert!(result.diagnostics.iter().all(|diagnostic| {
                !matches!(diagnostic, Diagnostic::UnsupportedOperation { .. })
            }));
            let report = result.report.ok_or_else(|| anyhow::anyhow!("no schedule"))?;
            assert!(report.verify(horizon.length));

            let mut completion: HashMap<usize, i64> = HashMap::new();
            for entry in &report.schedule {
                let end = completion.entry(entry.order_id).or_default();
                *end = (*end).max(entry.end);
            }
            let mut violated: HashMap<&str, Vec<i64>> = HashMap::new();
            for violation in &report.deadline_violations {
                assert!(violation.violation_hours > 0);
                let deadline = i64::try_from(violation.deadline)?;
                assert!(violation.actual_completion <= deadline + violation.violation_hours);
                violated.entry(&violation.product).or_default().push(violation.violation_hours);
            }
            for (id, order) in problem.orders.iter().enumerate() {
                let end = completion.get(&id).copied().unwrap_or_default();
                let deadline = i64::try_from(order.deadline)?;
                if end > deadline {
                    assert!(violated.contains_key(order.product.as_str()));
                }
            }
            assert_eq!(
                report.total_violation_hours,
                report.deadline_violations.iter().map(|v| v.violation_hours).sum::<i64>()
            );
        }
        Ok(())
    }
}
