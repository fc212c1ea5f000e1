use super::{
    Diagnostic, Expansion, Horizon, Problem, SchedulingModel, SolverOutcomeError, SolverResponse,
    SolverStatus,
};
use ahash::{HashMap, HashMapExt};
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Datetime format of every reported timestamp.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_datetime<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format(DATETIME_FORMAT))
}

/// Status of a scheduling call.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    Optimal,
    Feasible,
    FeasibleWithViolations,
    Infeasible,
}

/// A scheduled task.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub task_id: usize,
    /// Name of the ordered product.
    pub order: String,
    pub operation: String,
    pub machine: String,
    pub start: i64,
    pub end: i64,
    pub duration: u64,
    #[serde(serialize_with = "serialize_datetime")]
    pub start_datetime: NaiveDateTime,
    #[serde(serialize_with = "serialize_datetime")]
    pub end_datetime: NaiveDateTime,
    /// Setup spent right before this task on its machine.
    pub setup_time: u64,
    #[serde(skip)]
    pub order_id: usize,
    #[serde(skip)]
    pub unit: u64,
    #[serde(skip)]
    pub step: usize,
}

/// An order completed after its deadline.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DeadlineViolation {
    pub product: String,
    pub quantity: u64,
    pub deadline: u64,
    pub actual_completion: i64,
    pub violation_hours: i64,
}

/// A solved schedule.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ScheduleReport {
    pub makespan: i64,
    /// Sorted by start time.
    pub schedule: Vec<ScheduleEntry>,
    #[serde(serialize_with = "serialize_datetime")]
    pub start_datetime: NaiveDateTime,
    pub deadline_violations: Vec<DeadlineViolation>,
    pub total_violation_hours: i64,
}

impl ScheduleReport {
    /// Verifies interval sizes, machine exclusivity, unit step order, bounds and makespan.
    #[must_use]
    pub fn verify(&self, horizon: i64) -> bool {
        let sized = self.schedule.iter().all(|entry| {
            i64::try_from(entry.duration).is_ok_and(|duration| entry.end - entry.start == duration)
        });
        let bounded = self
            .schedule
            .iter()
            .all(|entry| entry.start >= 0 && entry.end <= horizon);
        let makespan = self.schedule.iter().map(|entry| entry.end).max().unwrap_or(0);

        let mut machines: HashMap<&str, Vec<&ScheduleEntry>> = HashMap::new();
        let mut units: HashMap<(usize, u64), Vec<&ScheduleEntry>> = HashMap::new();
        for entry in &self.schedule {
            machines.entry(&entry.machine).or_default().push(entry);
            units.entry((entry.order_id, entry.unit)).or_default().push(entry);
        }

        let exclusive = machines.values_mut().all(|tasks| {
            tasks.sort_by_key(|entry| (entry.start, entry.end));
            tasks.windows(2).all(|pair| pair[0].end <= pair[1].start)
        });
        let ordered = units.values_mut().all(|tasks| {
            tasks.sort_by_key(|entry| entry.step);
            tasks.windows(2).all(|pair| pair[0].end <= pair[1].start)
        });

        sized && bounded && exclusive && ordered && makespan == self.makespan
    }

    /// Returns the entries of one machine ordered by start time.
    #[must_use]
    pub fn machine_schedule(&self, machine: &str) -> Vec<&ScheduleEntry> {
        self.schedule
            .iter()
            .filter(|entry| entry.machine == machine)
            .collect()
    }
}

/// Summary of the solver run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SolverSummary {
    pub name: String,
    pub status: SolverStatus,
    pub objective: Option<f64>,
    pub branches: u64,
    pub conflicts: u64,
    pub wall_time_secs: f64,
}

/// Outcome of a scheduling call. Failures are values, never errors.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduleResult {
    pub status: ResultStatus,
    #[serde(flatten)]
    pub report: Option<ScheduleReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverSummary>,
    #[serde(skip)]
    pub failure: Option<SolverOutcomeError>,
}

impl ScheduleResult {
    /// A failed call. No partial schedule is kept.
    #[must_use]
    pub fn failed(failure: SolverOutcomeError, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            status: ResultStatus::Infeasible,
            report: None,
            message: Some(failure.to_string()),
            diagnostics,
            solver: None,
            failure: Some(failure),
        }
    }

    /// Attaches the solver summary.
    #[must_use]
    pub fn with_solver(mut self, name: &str, response: &SolverResponse) -> Self {
        self.solver = Some(SolverSummary {
            name: name.to_owned(),
            status: response.status,
            objective: response.objective,
            branches: response.stats.branches,
            conflicts: response.stats.conflicts,
            wall_time_secs: response.stats.wall_time.as_secs_f64(),
        });
        self
    }

    /// Returns whether a schedule was produced.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.report.is_some()
    }
}

fn offset(anchor: NaiveDateTime, hours: i64) -> NaiveDateTime {
    TimeDelta::try_hours(hours)
        .and_then(|delta| anchor.checked_add_signed(delta))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Turns a solver response into a schedule result.
///
/// Successful responses yield the task entries sorted by start, realized setup times recomputed
/// per machine from the solved sequence, and the deadline violations read from the order slacks.
/// Every other status yields a failure carrying the raw status and a hint.
#[must_use]
pub fn interpret(
    problem: &Problem,
    expansion: &Expansion,
    built: &SchedulingModel,
    horizon: &Horizon,
    response: &SolverResponse,
    anchor: NaiveDateTime,
) -> ScheduleResult {
    let mut diagnostics = expansion.diagnostics.clone();

    if !response.status.has_solution() {
        let failure = match response.status {
            SolverStatus::Infeasible => SolverOutcomeError::Infeasible {
                total_work: horizon.total_work,
                horizon: horizon.length,
            },
            SolverStatus::ModelInvalid => {
                SolverOutcomeError::ModelInvalid(response.detail.clone().unwrap_or_default())
            }
            _ => SolverOutcomeError::Unknown,
        };
        return ScheduleResult::failed(failure, diagnostics);
    }

    let expected = built.model.variables().len();
    if response.values.len() != expected {
        let failure = SolverOutcomeError::IncompleteAssignment {
            expected,
            actual: response.values.len(),
        };
        return ScheduleResult::failed(failure, diagnostics);
    }

    let values = &response.values;
    let mut schedule: Vec<ScheduleEntry> = expansion
        .tasks
        .iter()
        .zip(&built.tasks)
        .map(|(task, vars)| {
            let start = values[vars.start.index()];
            let end = values[vars.end.index()];
            ScheduleEntry {
                task_id: task.id,
                order: task.product.to_owned(),
                operation: task.operation.to_owned(),
                machine: problem.machines[task.machine].name.clone(),
                start,
                end,
                duration: task.duration,
                start_datetime: offset(anchor, start),
                end_datetime: offset(anchor, end),
                setup_time: 0,
                order_id: task.order,
                unit: task.unit,
                step: task.step,
            }
        })
        .collect();
    schedule.sort_by_key(|entry| (entry.start, entry.task_id));

    let mut machines: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (position, entry) in schedule.iter().enumerate() {
        machines.entry(&entry.machine).or_default().push(position);
    }
    let mut setups = Vec::new();
    for positions in machines.values() {
        for pair in positions.windows(2) {
            let (previous, current) = (&schedule[pair[0]], &schedule[pair[1]]);
            let setup = problem.setup_times.get(&previous.order, &current.order);
            let gap = current.start - previous.end;
            if i64::try_from(setup).map_or(true, |setup| gap < setup) {
                diagnostics.push(Diagnostic::SetupGapShortfall {
                    machine: current.machine.clone(),
                    previous: previous.task_id,
                    task: current.task_id,
                    gap,
                    setup,
                });
            }
            setups.push((pair[1], setup));
        }
    }
    for (position, setup) in setups {
        schedule[position].setup_time = setup;
    }

    let mut deadline_violations = Vec::new();
    let mut total_violation_hours = 0;
    for (order, &slack) in expansion.orders.iter().zip(&built.violations) {
        let violation = values[slack.index()];
        if violation <= 0 {
            continue;
        }
        let actual_completion = order
            .finals
            .iter()
            .map(|&task| values[built.tasks[task].end.index()])
            .max()
            .unwrap_or_default();
        deadline_violations.push(DeadlineViolation {
            product: order.product.to_owned(),
            quantity: order.quantity,
            deadline: order.deadline,
            actual_completion,
            violation_hours: violation,
        });
        total_violation_hours += violation;
    }

    let status = if total_violation_hours > 0 {
        ResultStatus::FeasibleWithViolations
    } else if response.status == SolverStatus::Optimal {
        ResultStatus::Optimal
    } else {
        ResultStatus::Feasible
    };

    let makespan = built.makespan.map_or(0, |makespan| values[makespan.index()]);

    ScheduleResult {
        status,
        report: Some(ScheduleReport {
            makespan,
            schedule,
            start_datetime: anchor,
            deadline_violations,
            total_violation_hours,
        }),
        message: None,
        diagnostics,
        solver: None,
        failure: None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algo::stub::assignment;
    use crate::core::{
        Machine, Order, Product, ProductTask, SchedulingConfig, SetupTimes,
    };
    use chrono::NaiveDate;

    fn problem() -> Problem {
        Problem::new(
            vec![Machine::new("A", ["cut"])],
            vec![
                Product::new("P1", vec![ProductTask::new("cut", 2)]),
                Product::new("P2", vec![ProductTask::new("cut", 3)]),
            ],
            SetupTimes::new().with("P1", "P2", 4),
            vec![Order::new("P1", 1, 10), Order::new("P2", 1, 5)],
        )
    }

    fn anchor() -> anyhow::Result<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(8, 0, 0))
            .ok_or_else(|| anyhow::anyhow!("bad date"))
    }

    fn run(
        problem: &Problem,
        response: impl FnOnce(&SchedulingModel) -> SolverResponse,
    ) -> anyhow::Result<ScheduleResult> {
        let expansion = Expansion::new(problem);
        let horizon = Horizon::estimate(problem)?;
        let built =
            SchedulingModel::build(problem, &expansion, &horizon, &SchedulingConfig::default())?;
        let response = response(&built);
        Ok(interpret(problem, &expansion, &built, &horizon, &response, anchor()?))
    }

    #[test]
    fn reads_schedule_setups_and_violations() -> anyhow::Result<()> {
        let problem = problem();
        let result = run(&problem, |built| {
            let values = assignment(built, &[0, 6], &[0, 4]);
            SolverResponse::solved(SolverStatus::Feasible, values, 4013.0)
        })?;

        assert_eq!(result.status, ResultStatus::FeasibleWithViolations);
        assert!(result.diagnostics.is_empty());
        let report = result.report.ok_or_else(|| anyhow::anyhow!("no report"))?;
        assert!(report.verify(1000));
        assert_eq!(report.makespan, 9);
        assert_eq!(report.total_violation_hours, 4);

        let second = &report.schedule[1];
        assert_eq!((second.task_id, second.start, second.end), (1, 6, 9));
        assert_eq!(second.order, "P2");
        assert_eq!(second.setup_time, 4);
        assert_eq!(report.schedule[0].setup_time, 0);
        assert_eq!(
            second.start_datetime.format(DATETIME_FORMAT).to_string(),
            "2024-01-01 14:00"
        );

        assert_eq!(
            report.deadline_violations,
            vec![DeadlineViolation {
                product: "P2".to_owned(),
                quantity: 1,
                deadline: 5,
                actual_completion: 9,
                violation_hours: 4,
            }]
        );
        Ok(())
    }

    #[test]
    fn optimal_without_violations() -> anyhow::Result<()> {
        let mut problem = problem();
        problem.orders[1].deadline = 20;
        let result = run(&problem, |built| {
            let values = assignment(built, &[0, 6], &[0, 0]);
            SolverResponse::solved(SolverStatus::Optimal, values, 9.0)
        })?;

        assert_eq!(result.status, ResultStatus::Optimal);
        assert!(result.is_success());
        let report = result.report.ok_or_else(|| anyhow::anyhow!("no report"))?;
        assert!(report.deadline_violations.is_empty());
        assert_eq!(report.machine_schedule("A").len(), 2);
        Ok(())
    }

    #[test]
    fn short_setup_gap_is_reported() -> anyhow::Result<()> {
        let problem = problem();
        let result = run(&problem, |built| {
            let values = assignment(built, &[0, 3], &[0, 1]);
            SolverResponse::solved(SolverStatus::Feasible, values, 1006.0)
        })?;

        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::SetupGapShortfall {
                machine: "A".to_owned(),
                previous: 0,
                task: 1,
                gap: 1,
                setup: 4,
            }]
        );
        Ok(())
    }

    #[test]
    fn failures_carry_status_and_hint() -> anyhow::Result<()> {
        let problem = problem();
        let result = run(&problem, |_| SolverResponse::failed(SolverStatus::Infeasible))?;

        assert_eq!(result.status, ResultStatus::Infeasible);
        assert!(result.report.is_none());
        let message = result.message.unwrap_or_default();
        assert!(message.starts_with("Solver status: INFEASIBLE."));
        assert!(message.contains("(5h)"));

        let result = run(&problem, |_| {
            SolverResponse::failed(SolverStatus::ModelInvalid).with_detail("bad bounds")
        })?;
        assert_eq!(
            result.failure,
            Some(SolverOutcomeError::ModelInvalid("bad bounds".to_owned()))
        );
        Ok(())
    }

    #[test]
    fn short_assignment_is_rejected() -> anyhow::Result<()> {
        let result = run(&problem(), |_| {
            SolverResponse::solved(SolverStatus::Optimal, vec![0], 0.0)
        })?;

        assert!(matches!(
            result.failure,
            Some(SolverOutcomeError::IncompleteAssignment { actual: 1, .. })
        ));
        assert!(result.report.is_none());
        Ok(())
    }

    #[test]
    fn serializes_flat() -> anyhow::Result<()> {
        let result = run(&problem(), |built| {
            let values = assignment(built, &[0, 6], &[0, 4]);
            SolverResponse::solved(SolverStatus::Feasible, values, 4013.0)
        })?;

        let json = serde_json::to_value(&result)?;
        assert_eq!(json["status"], "FEASIBLE_WITH_VIOLATIONS");
        assert_eq!(json["makespan"], 9);
        assert_eq!(json["start_datetime"], "2024-01-01 08:00");
        assert_eq!(json["schedule"][0]["end_datetime"], "2024-01-01 10:00");
        assert!(json.get("message").is_none());
        Ok(())
    }
}
