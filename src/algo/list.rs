use crate::core::{
    Comparison, Constraint, LinearConstraint, Model, Solver, SolverResponse, SolverStats,
    SolverStatus, VarId, VarKind,
};
use ahash::{HashMap, HashMapExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::debug;

/// Upper bound on dispatch passes per solve.
const MAX_PASSES: usize = 128;

/// Passes without improvement after which the search stops early.
const STALL_LIMIT: usize = 8;

/// Interval placements over all passes after which no new pass is started.
const PLACEMENT_BUDGET: u64 = 20_000;

/// Seed of the randomized passes, fixed so that equal inputs give equal schedules.
const SEED: u64 = 0x5eed;

/// List scheduling solver with restarts.
///
/// Each pass places intervals one at a time at the earliest start that respects every placed
/// interval sharing a no-overlap group or a conditional gap with it, then fixes the remaining
/// variables to their cheapest consistent values. The next interval is picked among the ready
/// ones by a priority mixing its earliest start and its due date. Due dates come from weighted
/// slack rows `end - slack <= due` and are pushed back through precedences.
///
/// The first passes use pure earliest-start and earliest-due-date priorities, later ones random
/// mixes of both with jitter. The best assignment is kept until the root lower bound of the
/// objective is met, the time limit expires, passes stop improving or the placement budget is
/// spent. Reports `Optimal` only when the bound is met.
///
/// Statistics: `branches` counts interval placements over all passes, `conflicts` counts
/// placements pushed later by an already placed interval.
#[derive(Clone, Debug, Default)]
pub struct List;

impl Solver for List {
    fn solve(&mut self, model: &Model, time_limit: Duration) -> SolverResponse {
        let started = Instant::now();
        let mut search = Search::new(model, started + time_limit);
        let response = search.run();
        response.with_stats(SolverStats {
            branches: search.branches,
            conflicts: search.conflicts,
            wall_time: started.elapsed(),
        })
    }

    fn name(&self) -> &'static str {
        "List"
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::SOLVERS)]
static INSTANCE: fn() -> Box<dyn Solver> = || Box::new(List);

fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Variable whose domain became empty.
struct Empty(VarId);

struct Search<'a> {
    model: &'a Model,
    deadline: Instant,
    lower: Vec<i64>,
    upper: Vec<i64>,
    unconditional: Vec<&'a LinearConstraint>,
    conditional: Vec<&'a LinearConstraint>,
    /// Conditional constraints by the variable of their enforcement literal.
    guarded: HashMap<VarId, Vec<&'a LinearConstraint>>,
    /// Variables appearing in an unconditional linear constraint.
    bound: Vec<bool>,
    maxes: Vec<(VarId, &'a [VarId])>,
    /// Intervals each interval may not overlap with.
    partners: Vec<Vec<usize>>,
    /// Minimum distance from the end of the first interval to the start of the second
    /// when the first one goes before.
    gaps: HashMap<(usize, usize), i64>,
    /// Intervals that must be placed before each interval.
    predecessors: Vec<Vec<usize>>,
    /// Unconditional `start(to) - end(from) >= gap` links as `(from, to, gap)`.
    precedences: Vec<(usize, usize, i64)>,
    /// Objective coefficient of every variable.
    weights: HashMap<VarId, i64>,
    /// Latest end of each interval that keeps every weighted slack at zero.
    due: Vec<i64>,
    branches: u64,
    conflicts: u64,
}

impl<'a> Search<'a> {
    fn new(model: &'a Model, deadline: Instant) -> Self {
        let variables = model.variables();
        let mut search = Self {
            model,
            deadline,
            lower: variables.iter().map(|var| var.lower).collect(),
            upper: variables.iter().map(|var| var.upper).collect(),
            unconditional: Vec::new(),
            conditional: Vec::new(),
            guarded: HashMap::new(),
            bound: vec![false; variables.len()],
            maxes: Vec::new(),
            partners: vec![Vec::new(); model.intervals().len()],
            gaps: HashMap::new(),
            predecessors: vec![Vec::new(); model.intervals().len()],
            precedences: Vec::new(),
            weights: model
                .objective()
                .map(|objective| objective.terms.iter().copied().collect())
                .unwrap_or_default(),
            due: Vec::new(),
            branches: 0,
            conflicts: 0,
        };

        for constraint in model.constraints() {
            match constraint {
                Constraint::Linear(linear) if linear.enforce.is_some() => {
                    search.conditional.push(linear);
                    if let Some(literal) = linear.enforce {
                        search.guarded.entry(literal.var).or_default().push(linear);
                    }
                }
                Constraint::Linear(linear) => {
                    for &(var, _) in &linear.expr.terms {
                        search.bound[var.index()] = true;
                    }
                    search.unconditional.push(linear);
                }
                Constraint::MaxEquality { target, args, .. } => search.maxes.push((*target, args)),
                Constraint::NoOverlap { .. } => {}
            }
        }

        search
    }

    fn run(&mut self) -> SolverResponse {
        if let Err(error) = self.model.validate() {
            return SolverResponse::failed(SolverStatus::ModelInvalid).with_detail(error.to_string());
        }

        self.index_structure();

        if let Err(Empty(var)) = self.propagate() {
            let name = &self.model.variable(var).name;
            return SolverResponse::failed(SolverStatus::Infeasible)
                .with_detail(format!("domain of `{name}` is empty"));
        }
        let bound = self.objective_bound();
        self.index_due_dates();

        let (lower, upper) = (self.lower.clone(), self.upper.clone());
        let mut rng = StdRng::seed_from_u64(SEED);
        let mut best: Option<(i128, Vec<i64>)> = None;
        let mut failure = None;
        let mut stalled = 0;
        let mut passes = 0;

        while passes < MAX_PASSES && stalled < STALL_LIMIT && self.branches < PLACEMENT_BUDGET {
            if Instant::now() >= self.deadline {
                failure.get_or_insert_with(|| "time limit reached".to_owned());
                break;
            }

            let priority = Priority::new(passes, self.due.len(), &mut rng);
            self.lower.clone_from(&lower);
            self.upper.clone_from(&upper);
            passes += 1;

            match self.pass(&priority) {
                Ok((objective, values)) => {
                    if matches!(&best, Some((incumbent, _)) if *incumbent <= objective) {
                        stalled += 1;
                    } else {
                        best = Some((objective, values));
                        stalled = 0;
                    }
                }
                Err(detail) => {
                    failure = Some(detail);
                    stalled += 1;
                }
            }

            if best.as_ref().is_some_and(|(objective, _)| *objective <= bound) {
                break;
            }
        }

        let Some((objective, values)) = best else {
            let detail = failure.unwrap_or_else(|| "no pass completed".to_owned());
            return SolverResponse::failed(SolverStatus::Unknown).with_detail(detail);
        };

        let status = if objective <= bound {
            SolverStatus::Optimal
        } else {
            SolverStatus::Feasible
        };
        debug!(%status, %objective, %bound, passes, "list search finished");

        #[allow(clippy::cast_precision_loss)]
        let objective = objective as f64;
        SolverResponse::solved(status, values, objective)
    }

    /// Runs one dispatch pass from the root bounds and returns the objective and assignment.
    fn pass(&mut self, priority: &Priority) -> Result<(i128, Vec<i64>), String> {
        self.place_intervals(priority)?;
        self.fix_remaining()?;

        let values = self.lower.clone();
        self.model.check(&values).map_err(|error| error.to_string())?;
        Ok((self.model.objective_value(&values), values))
    }

    fn index_structure(&mut self) {
        let model = self.model;
        let intervals = model.intervals();
        let mut owner = vec![None; model.variables().len()];
        for (index, interval) in intervals.iter().enumerate() {
            owner[interval.start.index()] = Some(index);
            owner[interval.end.index()] = Some(index);
        }

        for constraint in model.constraints() {
            if let Constraint::NoOverlap { intervals, .. } = constraint {
                for &first in intervals {
                    for &second in intervals {
                        if first != second {
                            self.link(first.index(), second.index(), 0);
                        }
                    }
                }
            }
        }

        for linear in self.conditional.clone() {
            let Some((later, earlier, gap)) = linear.as_difference() else {
                continue;
            };
            if let (Some(from), Some(to)) = (owner[earlier.index()], owner[later.index()]) {
                if from != to
                    && intervals[from].end == earlier
                    && intervals[to].start == later
                {
                    self.link(from, to, gap);
                }
            }
        }

        for linear in self.unconditional.clone() {
            let Some((later, earlier, gap)) = linear.as_difference() else {
                continue;
            };
            if let (Some(from), Some(to)) = (owner[earlier.index()], owner[later.index()]) {
                if from != to && !self.predecessors[to].contains(&from) {
                    self.predecessors[to].push(from);
                }
                if intervals[from].end == earlier && intervals[to].start == later {
                    self.precedences.push((from, to, gap));
                }
            }
        }
    }

    /// Derives due dates from rows `slack - end >= -due` whose slack is penalized in the
    /// objective, then pulls them back along precedences.
    fn index_due_dates(&mut self) {
        let model = self.model;
        let intervals = model.intervals();
        let mut ends = HashMap::new();
        for (index, interval) in intervals.iter().enumerate() {
            ends.insert(interval.end, index);
        }

        self.due = intervals
            .iter()
            .map(|interval| self.upper[interval.end.index()])
            .collect();

        for linear in &self.unconditional {
            let Some((slack, end, gap)) = linear.as_difference() else {
                continue;
            };
            let penalized = self.weights.get(&slack).is_some_and(|&weight| weight > 0);
            if let (true, Some(&index)) = (penalized, ends.get(&end)) {
                self.due[index] = self.due[index].min(gap.saturating_neg());
            }
        }

        for _ in 0..intervals.len() {
            let mut changed = false;
            for &(from, to, gap) in &self.precedences {
                let latest = self.due[to]
                    .saturating_sub(intervals[to].size)
                    .saturating_sub(gap);
                if latest < self.due[from] {
                    self.due[from] = latest;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn link(&mut self, from: usize, to: usize, gap: i64) {
        if !self.partners[from].contains(&to) {
            self.partners[from].push(to);
            self.partners[to].push(from);
        }
        let entry = self.gaps.entry((from, to)).or_insert(gap);
        *entry = (*entry).max(gap);
    }

    fn set_lower(&mut self, var: VarId, value: i128) -> Result<bool, Empty> {
        let value = saturate(value);
        if value <= self.lower[var.index()] {
            return Ok(false);
        }
        self.lower[var.index()] = value;
        if value > self.upper[var.index()] {
            return Err(Empty(var));
        }
        Ok(true)
    }

    fn set_upper(&mut self, var: VarId, value: i128) -> Result<bool, Empty> {
        let value = saturate(value);
        if value >= self.upper[var.index()] {
            return Ok(false);
        }
        self.upper[var.index()] = value;
        if value < self.lower[var.index()] {
            return Err(Empty(var));
        }
        Ok(true)
    }

    /// Tightens bounds for `sum(sign * coefficient * var) <= rhs`.
    fn propagate_less_equal(
        &mut self,
        terms: &[(VarId, i64)],
        sign: i128,
        rhs: i128,
    ) -> Result<bool, Empty> {
        let minimum = |search: &Self, var: VarId, coefficient: i128| {
            let low = coefficient * i128::from(search.lower[var.index()]);
            let high = coefficient * i128::from(search.upper[var.index()]);
            low.min(high)
        };

        let total: i128 = terms
            .iter()
            .map(|&(var, coefficient)| minimum(self, var, sign * i128::from(coefficient)))
            .sum();

        let mut changed = false;
        for &(var, coefficient) in terms {
            let coefficient = sign * i128::from(coefficient);
            let slack = rhs - (total - minimum(self, var, coefficient));
            changed |= match coefficient.signum() {
                1 => self.set_upper(var, slack.div_euclid(coefficient))?,
                -1 => self.set_lower(var, -slack.div_euclid(-coefficient))?,
                _ => false,
            };
        }
        Ok(changed)
    }

    /// Bounds propagation over unconditional constraints until a fixpoint.
    fn propagate(&mut self) -> Result<(), Empty> {
        let model = self.model;
        let rounds = self.lower.len() + 2;
        for _ in 0..rounds {
            let mut changed = false;

            for interval in model.intervals() {
                let (start, end, size) = (interval.start, interval.end, i128::from(interval.size));
                changed |= self.set_lower(end, i128::from(self.lower[start.index()]) + size)?;
                changed |= self.set_upper(end, i128::from(self.upper[start.index()]) + size)?;
                changed |= self.set_lower(start, i128::from(self.lower[end.index()]) - size)?;
                changed |= self.set_upper(start, i128::from(self.upper[end.index()]) - size)?;
            }

            for index in 0..self.unconditional.len() {
                let linear = self.unconditional[index];
                let rhs = i128::from(linear.rhs);
                let terms = linear.expr.terms.as_slice();
                if linear.comparison != Comparison::GreaterEqual {
                    changed |= self.propagate_less_equal(terms, 1, rhs)?;
                }
                if linear.comparison != Comparison::LessEqual {
                    changed |= self.propagate_less_equal(terms, -1, -rhs)?;
                }
            }

            for index in 0..self.maxes.len() {
                let (target, args) = self.maxes[index];
                let lowest = args.iter().map(|var| self.lower[var.index()]).max();
                let highest = args.iter().map(|var| self.upper[var.index()]).max();
                if let (Some(lowest), Some(highest)) = (lowest, highest) {
                    changed |= self.set_lower(target, i128::from(lowest))?;
                    changed |= self.set_upper(target, i128::from(highest))?;
                }
                let ceiling = i128::from(self.upper[target.index()]);
                for &arg in args {
                    changed |= self.set_upper(arg, ceiling)?;
                }
            }

            if !changed {
                break;
            }
        }
        Ok(())
    }

    fn objective_bound(&self) -> i128 {
        self.model.objective().map_or(0, |objective| {
            objective
                .terms
                .iter()
                .map(|&(var, coefficient)| {
                    let value = if coefficient >= 0 {
                        self.lower[var.index()]
                    } else {
                        self.upper[var.index()]
                    };
                    i128::from(coefficient) * i128::from(value)
                })
                .sum()
        })
    }

    fn fix(&mut self, var: VarId, value: i64) -> Result<(), String> {
        self.lower[var.index()] = value;
        self.upper[var.index()] = value;
        self.propagate().map_err(|Empty(var)| {
            format!("no value left for `{}`", self.model.variable(var).name)
        })
    }

    fn place_intervals(&mut self, priority: &Priority) -> Result<(), String> {
        let model = self.model;
        let intervals = model.intervals();
        let mut placed = vec![false; intervals.len()];

        for _ in 0..intervals.len() {
            if Instant::now() >= self.deadline {
                return Err("time limit reached".into());
            }

            let next = (0..intervals.len())
                .filter(|&index| !placed[index])
                .filter(|&index| self.predecessors[index].iter().all(|&other| placed[other]))
                .min_by_key(|&index| {
                    let start = self.lower[intervals[index].start.index()];
                    (priority.key(index, start, self.due[index]), start, index)
                });
            let Some(next) = next else {
                return Err("precedence cycle between intervals".into());
            };

            let start = self.earliest_start(next, &placed);
            let interval = &intervals[next];
            if start > self.upper[interval.start.index()] {
                return Err(format!("`{}` does not fit before the horizon", interval.name));
            }

            self.fix(interval.start, start)?;
            placed[next] = true;
            self.branches += 1;
        }

        Ok(())
    }

    /// Smallest start from the current lower bound that clears every placed partner.
    fn earliest_start(&mut self, index: usize, placed: &[bool]) -> i64 {
        let model = self.model;
        let intervals = model.intervals();
        let size = intervals[index].size;
        let mut start = self.lower[intervals[index].start.index()];

        loop {
            let next = self.partners[index]
                .iter()
                .filter(|&&other| placed[other])
                .filter_map(|&other| {
                    let other_start = self.lower[intervals[other].start.index()];
                    let other_end = self.lower[intervals[other].end.index()];
                    let before = self.gaps.get(&(index, other)).copied().unwrap_or_default();
                    let after = self.gaps.get(&(other, index)).copied().unwrap_or_default();

                    let fits_after = other_end + after <= start;
                    let fits_before = start + size + before <= other_start;
                    (!fits_after && !fits_before).then_some(other_end + after)
                })
                .min();

            match next {
                Some(next) => {
                    self.conflicts += 1;
                    start = next;
                }
                None => return start,
            }
        }
    }

    fn fix_remaining(&mut self) -> Result<(), String> {
        let model = self.model;
        for (index, variable) in model.variables().iter().enumerate() {
            let var = VarId(index);
            if variable.kind == VarKind::Boolean || self.lower[index] == self.upper[index] {
                continue;
            }
            let value = if self.weights.get(&var).is_some_and(|&weight| weight < 0) {
                self.upper[index]
            } else {
                self.lower[index]
            };
            self.fix(var, value)?;
        }

        for (index, variable) in model.variables().iter().enumerate() {
            if variable.kind != VarKind::Boolean || self.lower[index] == self.upper[index] {
                continue;
            }
            let var = VarId(index);
            let value = [1, 0]
                .into_iter()
                .find(|&value| self.consistent(var, value))
                .ok_or_else(|| format!("no consistent value for `{}`", variable.name))?;
            if self.bound[index] {
                self.fix(var, value)?;
            } else {
                self.lower[index] = value;
                self.upper[index] = value;
            }
        }

        Ok(())
    }

    /// Checks the conditional constraints activated by `var == value`.
    fn consistent(&self, var: VarId, value: i64) -> bool {
        let Some(guarded) = self.guarded.get(&var) else {
            return true;
        };
        guarded.iter().all(|linear| {
            let Some(literal) = linear.enforce else {
                return true;
            };
            if (value != 0) == literal.negated {
                return true;
            }
            let lhs = linear.expr.evaluate(&self.lower);
            match linear.comparison {
                Comparison::LessEqual => lhs <= i128::from(linear.rhs),
                Comparison::GreaterEqual => lhs >= i128::from(linear.rhs),
                Comparison::Equal => lhs == i128::from(linear.rhs),
            }
        })
    }
}

/// Dispatch priority of one pass. Lower keys are placed first.
struct Priority {
    start_weight: i128,
    due_weight: i128,
    jitter: Vec<i64>,
}

impl Priority {
    /// Largest random offset added to a key, in time units.
    const JITTER: i64 = 8;

    /// Pass 0 dispatches by earliest start, pass 1 by earliest due date, later passes by
    /// random mixes of both.
    fn new(pass: usize, intervals: usize, rng: &mut impl Rng) -> Self {
        match pass {
            0 => Self {
                start_weight: 1,
                due_weight: 0,
                jitter: vec![0; intervals],
            },
            1 => Self {
                start_weight: 0,
                due_weight: 1,
                jitter: vec![0; intervals],
            },
            _ => {
                let start_weight = rng.gen_range(0..=4);
                Self {
                    start_weight,
                    due_weight: 4 - start_weight,
                    jitter: (0..intervals).map(|_| rng.gen_range(0..=Self::JITTER)).collect(),
                }
            }
        }
    }

    fn key(&self, index: usize, start: i64, due: i64) -> i128 {
        self.start_weight * i128::from(start)
            + self.due_weight * i128::from(due)
            + i128::from(self.jitter[index])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::{LinearExpr, Literal};

    const LIMIT: Duration = Duration::from_secs(10);

    fn chain(horizon: i64) -> (Model, Vec<VarId>) {
        let mut model = Model::new("chain");
        let s0 = model.new_int("s0", 0, horizon);
        let e0 = model.new_int("e0", 0, horizon);
        let s1 = model.new_int("s1", 0, horizon);
        let e1 = model.new_int("e1", 0, horizon);
        model.new_interval("i0", s0, 2, e0);
        model.new_interval("i1", s1, 3, e1);
        model.add_linear("prec", LinearExpr::from(s1).term(e0, -1), Comparison::GreaterEqual, 0);
        let makespan = model.new_int("makespan", 0, horizon);
        model.add_max_equality("makespan", makespan, vec![e0, e1]);
        model.minimize(LinearExpr::from(makespan));
        (model, vec![s0, e0, s1, e1, makespan])
    }

    #[test]
    fn chain_is_solved_optimally() {
        let (model, _) = chain(100);
        let response = List.solve(&model, LIMIT);

        assert_eq!(response.status, SolverStatus::Optimal);
        assert_eq!(response.values, vec![0, 2, 2, 5, 5]);
        assert_eq!(response.objective, Some(5.0));
        assert_eq!(model.check(&response.values), Ok(()));
    }

    #[test]
    fn short_horizon_is_infeasible() {
        let (model, _) = chain(4);
        let response = List.solve(&model, LIMIT);

        assert_eq!(response.status, SolverStatus::Infeasible);
        assert!(response.values.is_empty());
        assert!(response.detail.is_some());
    }

    #[test]
    fn malformed_model_is_reported() {
        let mut model = Model::new("bad");
        model.new_int("x", 3, 1);
        let response = List.solve(&model, LIMIT);
        assert_eq!(response.status, SolverStatus::ModelInvalid);
    }

    #[test]
    fn exhausted_budget_is_unknown() {
        let (model, _) = chain(100);
        let response = List.solve(&model, Duration::ZERO);
        assert_eq!(response.status, SolverStatus::Unknown);
    }

    #[test]
    fn conditional_gap_is_respected() {
        let mut model = Model::new("setup");
        let s0 = model.new_int("s0", 0, 50);
        let e0 = model.new_int("e0", 0, 50);
        let s1 = model.new_int("s1", 0, 50);
        let e1 = model.new_int("e1", 0, 50);
        let i0 = model.new_interval("i0", s0, 2, e0);
        let i1 = model.new_interval("i1", s1, 3, e1);
        model.add_no_overlap("machine", vec![i0, i1]);
        let before = Literal::positive(model.new_bool("before"));
        model.add_enforced(
            "gap",
            LinearExpr::from(s1).term(e0, -1),
            Comparison::GreaterEqual,
            4,
            Some(before),
        );
        model.add_enforced(
            "after",
            LinearExpr::from(s0).term(e1, -1),
            Comparison::GreaterEqual,
            0,
            Some(before.not()),
        );

        let response = List.solve(&model, LIMIT);

        assert!(response.status.has_solution());
        assert_eq!(model.check(&response.values), Ok(()));
        let (s0, e0, s1, e1) = (
            response.values[0],
            response.values[1],
            response.values[2],
            response.values[3],
        );
        assert!(s1 >= e0 + 4 || s0 >= e1);
    }

    #[test]
    fn violation_slack_is_minimized() {
        let (mut model, vars) = chain(100);
        let violation = model.new_int("violation", 0, 100);
        model.add_linear(
            "deadline",
            LinearExpr::from(vars[3]).term(violation, -1),
            Comparison::LessEqual,
            3,
        );
        model.minimize(LinearExpr::from(vars[4]).term(violation, 101));

        let response = List.solve(&model, LIMIT);

        assert_eq!(response.status, SolverStatus::Optimal);
        assert_eq!(response.value(violation), Some(2));
    }

    /// Two jobs on one machine, the first in input order long with a late deadline and the
    /// second short with an early one. Returns the model and both slacks.
    fn urgent_last() -> (Model, VarId, VarId) {
        let mut model = Model::new("urgent_last");
        let s0 = model.new_int("s0", 0, 100);
        let e0 = model.new_int("e0", 0, 100);
        let s1 = model.new_int("s1", 0, 100);
        let e1 = model.new_int("e1", 0, 100);
        let long = model.new_interval("long", s0, 10, e0);
        let short = model.new_interval("short", s1, 1, e1);
        model.add_no_overlap("machine", vec![long, short]);

        let late = model.new_int("late", 0, 100);
        let early = model.new_int("early", 0, 100);
        model.add_linear(
            "late_deadline",
            LinearExpr::from(e0).term(late, -1),
            Comparison::LessEqual,
            100,
        );
        model.add_linear(
            "early_deadline",
            LinearExpr::from(e1).term(early, -1),
            Comparison::LessEqual,
            1,
        );

        let makespan = model.new_int("makespan", 0, 100);
        model.add_max_equality("makespan", makespan, vec![e0, e1]);
        model.minimize(LinearExpr::from(makespan).term(late, 101).term(early, 101));
        (model, late, early)
    }

    #[test]
    fn due_dates_follow_weighted_slacks_and_precedences() {
        let (mut model, vars) = chain(100);
        let violation = model.new_int("violation", 0, 100);
        model.add_linear(
            "deadline",
            LinearExpr::from(vars[3]).term(violation, -1),
            Comparison::LessEqual,
            5,
        );
        model.minimize(LinearExpr::from(vars[4]).term(violation, 101));

        let mut search = Search::new(&model, Instant::now() + LIMIT);
        search.index_structure();
        assert!(search.propagate().is_ok());
        search.index_due_dates();

        assert_eq!(search.due, vec![2, 5]);
    }

    #[test]
    fn urgent_job_is_dispatched_before_long_one() {
        let (model, late, early) = urgent_last();
        let response = List.solve(&model, LIMIT);

        assert!(response.status.has_solution());
        assert_eq!(model.check(&response.values), Ok(()));
        assert_eq!(response.value(late), Some(0));
        assert_eq!(response.value(early), Some(0));
        assert_eq!(response.values[2], 0);
        assert_eq!(response.values[0], 1);
        assert_eq!(response.objective, Some(11.0));
    }

    #[test]
    fn unmet_root_bound_is_not_optimal() {
        let (model, _, _) = urgent_last();
        let response = List.solve(&model, LIMIT);

        assert_eq!(response.status, SolverStatus::Feasible);
        assert!(response.stats.branches > 2);
    }
}
