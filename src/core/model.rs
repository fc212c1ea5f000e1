//! A small solver-agnostic constraint model.
//!
//! Models hold integer and boolean variables, fixed-size intervals, linear constraints that may
//! be enforced by a literal, no-overlap groups and max-equalities, plus a linear objective that
//! is minimized. Backends in [`crate::algo`] translate it into their own representation.

use super::ModelError;
use std::fmt::{Display, Formatter};

/// Handle of a model variable.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of the variable in the model and in solver assignments.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Handle of a model interval.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct IntervalId(pub(crate) usize);

impl IntervalId {
    /// Position of the interval in the model.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VarKind {
    Integer,
    Boolean,
}

/// A bounded decision variable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lower: i64,
    pub upper: i64,
}

/// A boolean variable or its negation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Literal {
    pub var: VarId,
    pub negated: bool,
}

impl Literal {
    /// The positive literal of a boolean variable.
    #[must_use]
    pub const fn positive(var: VarId) -> Self {
        Self {
            var,
            negated: false,
        }
    }

    /// The negation of this literal.
    #[must_use]
    pub const fn not(self) -> Self {
        Self {
            var: self.var,
            negated: !self.negated,
        }
    }

    /// Evaluates the literal under the given assignment.
    #[must_use]
    pub fn holds(self, values: &[i64]) -> bool {
        (values[self.var.0] != 0) != self.negated
    }
}

/// A fixed-size interval: `end == start + size`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Interval {
    pub name: String,
    pub start: VarId,
    pub end: VarId,
    pub size: i64,
}

/// Weighted sum of variables.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, i64)>,
}

impl LinearExpr {
    /// Creates an empty expression.
    #[must_use]
    pub const fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Adds `coefficient * var` to the expression.
    #[must_use]
    pub fn term(mut self, var: VarId, coefficient: i64) -> Self {
        self.terms.push((var, coefficient));
        self
    }

    /// Evaluates the expression under the given assignment.
    #[must_use]
    pub fn evaluate(&self, values: &[i64]) -> i128 {
        self.terms
            .iter()
            .map(|&(var, coefficient)| i128::from(values[var.0]) * i128::from(coefficient))
            .sum()
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        Self::new().term(var, 1)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Comparison {
    LessEqual,
    GreaterEqual,
    Equal,
}

impl Comparison {
    fn holds(self, lhs: i128, rhs: i128) -> bool {
        match self {
            Self::LessEqual => lhs <= rhs,
            Self::GreaterEqual => lhs >= rhs,
            Self::Equal => lhs == rhs,
        }
    }
}

impl Display for Comparison {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LessEqual => write!(f, "<="),
            Self::GreaterEqual => write!(f, ">="),
            Self::Equal => write!(f, "=="),
        }
    }
}

/// `expr <cmp> rhs`, only required while `enforce` holds (always when `None`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub expr: LinearExpr,
    pub comparison: Comparison,
    pub rhs: i64,
    pub enforce: Option<Literal>,
}

impl LinearConstraint {
    /// Returns `Some((later, earlier, gap))` when the constraint reads `later - earlier >= gap`.
    #[must_use]
    pub fn as_difference(&self) -> Option<(VarId, VarId, i64)> {
        let [(a, ca), (b, cb)] = self.expr.terms.as_slice() else {
            return None;
        };
        match (self.comparison, *ca, *cb) {
            (Comparison::GreaterEqual, 1, -1) => Some((*a, *b, self.rhs)),
            (Comparison::GreaterEqual, -1, 1) => Some((*b, *a, self.rhs)),
            (Comparison::LessEqual, -1, 1) => Some((*a, *b, -self.rhs)),
            (Comparison::LessEqual, 1, -1) => Some((*b, *a, -self.rhs)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Constraint {
    Linear(LinearConstraint),
    /// No two of the intervals may overlap.
    NoOverlap {
        name: String,
        intervals: Vec<IntervalId>,
    },
    /// `target == max(args)`.
    MaxEquality {
        name: String,
        target: VarId,
        args: Vec<VarId>,
    },
}

impl Constraint {
    /// Returns the name of the constraint.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Linear(linear) => &linear.name,
            Self::NoOverlap { name, .. } | Self::MaxEquality { name, .. } => name,
        }
    }
}

/// A constraint that an assignment does not satisfy.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("assignment violates `{0}`")]
pub struct Unsatisfied(pub String);

/// A constraint optimization model.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Model {
    name: String,
    variables: Vec<Variable>,
    intervals: Vec<Interval>,
    constraints: Vec<Constraint>,
    objective: Option<LinearExpr>,
}

impl Model {
    /// Creates an empty model.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    #[must_use]
    pub fn variable(&self, var: VarId) -> &Variable {
        &self.variables[var.0]
    }

    #[must_use]
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    #[must_use]
    pub fn interval(&self, interval: IntervalId) -> &Interval {
        &self.intervals[interval.0]
    }

    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    #[must_use]
    pub const fn objective(&self) -> Option<&LinearExpr> {
        self.objective.as_ref()
    }

    /// Adds an integer variable with domain `[lower, upper]`.
    pub fn new_int(&mut self, name: impl Into<String>, lower: i64, upper: i64) -> VarId {
        self.push_var(name.into(), VarKind::Integer, lower, upper)
    }

    /// Adds a boolean variable.
    pub fn new_bool(&mut self, name: impl Into<String>) -> VarId {
        self.push_var(name.into(), VarKind::Boolean, 0, 1)
    }

    fn push_var(&mut self, name: String, kind: VarKind, lower: i64, upper: i64) -> VarId {
        self.variables.push(Variable {
            name,
            kind,
            lower,
            upper,
        });
        VarId(self.variables.len() - 1)
    }

    /// Adds an interval of fixed size spanning `[start, end)`.
    pub fn new_interval(
        &mut self,
        name: impl Into<String>,
        start: VarId,
        size: i64,
        end: VarId,
    ) -> IntervalId {
        let name = name.into();
        self.intervals.push(Interval {
            name,
            start,
            end,
            size,
        });
        IntervalId(self.intervals.len() - 1)
    }

    /// Adds `expr <cmp> rhs`.
    pub fn add_linear(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        comparison: Comparison,
        rhs: i64,
    ) -> usize {
        self.add_enforced(name, expr, comparison, rhs, None)
    }

    /// Adds `expr <cmp> rhs` that only has to hold while `enforce` holds.
    pub fn add_enforced(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        comparison: Comparison,
        rhs: i64,
        enforce: Option<Literal>,
    ) -> usize {
        self.push(Constraint::Linear(LinearConstraint {
            name: name.into(),
            expr,
            comparison,
            rhs,
            enforce,
        }))
    }

    /// Forbids any overlap between the given intervals.
    pub fn add_no_overlap(&mut self, name: impl Into<String>, intervals: Vec<IntervalId>) -> usize {
        self.push(Constraint::NoOverlap {
            name: name.into(),
            intervals,
        })
    }

    /// Adds `target == max(args)`.
    pub fn add_max_equality(
        &mut self,
        name: impl Into<String>,
        target: VarId,
        args: Vec<VarId>,
    ) -> usize {
        self.push(Constraint::MaxEquality {
            name: name.into(),
            target,
            args,
        })
    }

    fn push(&mut self, constraint: Constraint) -> usize {
        self.constraints.push(constraint);
        self.constraints.len() - 1
    }

    /// Sets the expression to minimize.
    pub fn minimize(&mut self, objective: LinearExpr) {
        self.objective = Some(objective);
    }

    /// Checks that every handle points into the model and every domain is non-empty.
    ///
    /// # Errors
    /// - If the model is malformed.
    pub fn validate(&self) -> Result<(), ModelError> {
        for variable in &self.variables {
            if variable.lower > variable.upper {
                return Err(ModelError::EmptyDomain {
                    name: variable.name.clone(),
                    lower: variable.lower,
                    upper: variable.upper,
                });
            }
        }

        for interval in &self.intervals {
            self.check_var(interval.start)?;
            self.check_var(interval.end)?;
            if interval.size < 0 {
                return Err(ModelError::NegativeSize(interval.name.clone()));
            }
        }

        for constraint in &self.constraints {
            match constraint {
                Constraint::Linear(linear) => {
                    for &(var, _) in &linear.expr.terms {
                        self.check_var(var)?;
                    }
                    if let Some(literal) = linear.enforce {
                        self.check_var(literal.var)?;
                        if self.variables[literal.var.0].kind != VarKind::Boolean {
                            let name = self.variables[literal.var.0].name.clone();
                            return Err(ModelError::NonBooleanLiteral(name));
                        }
                    }
                }
                Constraint::NoOverlap { intervals, .. } => {
                    for interval in intervals {
                        if interval.0 >= self.intervals.len() {
                            return Err(ModelError::UnknownInterval(interval.0));
                        }
                    }
                }
                Constraint::MaxEquality { target, args, .. } => {
                    self.check_var(*target)?;
                    for &var in args {
                        self.check_var(var)?;
                    }
                }
            }
        }

        if let Some(objective) = &self.objective {
            for &(var, _) in &objective.terms {
                self.check_var(var)?;
            }
        }

        Ok(())
    }

    fn check_var(&self, var: VarId) -> Result<(), ModelError> {
        if var.0 < self.variables.len() {
            Ok(())
        } else {
            Err(ModelError::UnknownVariable(var.0))
        }
    }

    /// Verifies a complete assignment against domains, intervals and constraints.
    ///
    /// # Errors
    /// - With the name of the first violated element.
    pub fn check(&self, values: &[i64]) -> Result<(), Unsatisfied> {
        if values.len() != self.variables.len() {
            return Err(Unsatisfied(format!(
                "assignment size {} != {}",
                values.len(),
                self.variables.len()
            )));
        }

        for (variable, &value) in self.variables.iter().zip(values) {
            if value < variable.lower || value > variable.upper {
                return Err(Unsatisfied(variable.name.clone()));
            }
        }

        for interval in &self.intervals {
            if values[interval.end.0] != values[interval.start.0] + interval.size {
                return Err(Unsatisfied(interval.name.clone()));
            }
        }

        for constraint in &self.constraints {
            let satisfied = match constraint {
                Constraint::Linear(linear) => {
                    linear.enforce.is_some_and(|literal| !literal.holds(values))
                        || linear
                            .comparison
                            .holds(linear.expr.evaluate(values), i128::from(linear.rhs))
                }
                Constraint::NoOverlap { intervals, .. } => {
                    intervals.iter().enumerate().all(|(i, &first)| {
                        intervals[i + 1..].iter().all(|&second| {
                            let first = &self.intervals[first.0];
                            let second = &self.intervals[second.0];
                            first.size == 0
                                || second.size == 0
                                || values[first.end.0] <= values[second.start.0]
                                || values[second.end.0] <= values[first.start.0]
                        })
                    })
                }
                Constraint::MaxEquality { target, args, .. } => {
                    args.iter().map(|var| values[var.0]).max() == Some(values[target.0])
                }
            };

            if !satisfied {
                return Err(Unsatisfied(constraint.name().to_owned()));
            }
        }

        Ok(())
    }

    /// Evaluates the objective, zero when none is set.
    #[must_use]
    pub fn objective_value(&self, values: &[i64]) -> i128 {
        self.objective
            .as_ref()
            .map_or(0, |objective| objective.evaluate(values))
    }
}
