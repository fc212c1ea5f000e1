#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
use crate::core::{
    Comparison, Constraint, LinearExpr, Model, Solver, SolverResponse, SolverStats, SolverStatus,
};
use anyhow::Result;
use grb::prelude::*;
use std::time::{Duration, Instant};

/// MILP solver backed by Gurobi.
/// Conditional constraints, no-overlap pairs and max-equalities are linearized with big-M terms
/// derived from the variable bounds.
#[derive(Clone, Debug, Default)]
pub struct Gurobi;

impl Solver for Gurobi {
    fn solve(&mut self, model: &Model, time_limit: Duration) -> SolverResponse {
        let started = Instant::now();
        if let Err(error) = model.validate() {
            return SolverResponse::failed(SolverStatus::ModelInvalid).with_detail(error.to_string());
        }

        gurobi_impl(model, time_limit).unwrap_or_else(|err| {
            tracing::error!("Gurobi failed {err}");
            SolverResponse::failed(SolverStatus::Unknown)
                .with_detail(err.to_string())
                .with_stats(SolverStats {
                    wall_time: started.elapsed(),
                    ..SolverStats::default()
                })
        })
    }

    fn name(&self) -> &'static str {
        "Gurobi"
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::SOLVERS)]
static INSTANCE: fn() -> Box<dyn Solver> = || Box::new(Gurobi);

fn create_model(name: &str, time_limit: Duration) -> Result<grb::Model> {
    let mut env = Env::new("")?;
    env.set(param::OutputFlag, 0)?;
    env.set(param::LogToConsole, 0)?;
    env.set(param::TimeLimit, time_limit.as_secs_f64())?;
    Ok(grb::Model::with_env(name, env)?)
}

/// Smallest and largest value of the expression under the variable bounds.
fn range(model: &Model, expr: &LinearExpr) -> (f64, f64) {
    expr.terms
        .iter()
        .fold((0.0, 0.0), |(low, high), &(var, coefficient)| {
            let variable = model.variable(var);
            let a = coefficient as f64 * variable.lower as f64;
            let b = coefficient as f64 * variable.upper as f64;
            (low + a.min(b), high + a.max(b))
        })
}

fn to_expr(vars: &[Var], expr: &LinearExpr) -> Expr {
    expr.terms
        .iter()
        .map(|&(var, coefficient)| coefficient as f64 * vars[var.index()])
        .grb_sum()
}

fn add_vars(grb_model: &mut grb::Model, model: &Model) -> Result<Vec<Var>> {
    let mut vars = Vec::with_capacity(model.variables().len());
    for variable in model.variables() {
        let var = match variable.kind {
            crate::core::VarKind::Boolean => add_binvar!(grb_model, name: &variable.name)?,
            crate::core::VarKind::Integer => add_intvar!(
                grb_model,
                name: &variable.name,
                bounds: variable.lower as f64..variable.upper as f64
            )?,
        };
        vars.push(var);
    }
    Ok(vars)
}

fn gurobi_impl(model: &Model, time_limit: Duration) -> Result<SolverResponse> {
    let mut grb_model = create_model(model.name(), time_limit)?;
    let vars = add_vars(&mut grb_model, model)?;

    for interval in model.intervals() {
        let (start, end) = (vars[interval.start.index()], vars[interval.end.index()]);
        grb_model.add_constr(
            &format!("size_{}", interval.name),
            c!(end - start == interval.size as f64),
        )?;
    }

    for (index, constraint) in model.constraints().iter().enumerate() {
        match constraint {
            Constraint::Linear(linear) => {
                let expr = to_expr(&vars, &linear.expr);
                let rhs = linear.rhs as f64;
                let (low, high) = range(model, &linear.expr);
                let name = &linear.name;

                let Some(literal) = linear.enforce else {
                    match linear.comparison {
                        Comparison::LessEqual => grb_model.add_constr(name, c!(expr <= rhs))?,
                        Comparison::GreaterEqual => grb_model.add_constr(name, c!(expr >= rhs))?,
                        Comparison::Equal => grb_model.add_constr(name, c!(expr == rhs))?,
                    };
                    continue;
                };

                let b = vars[literal.var.index()];
                if linear.comparison != Comparison::GreaterEqual {
                    let m = (high - rhs).max(0.0);
                    let guarded = if literal.negated {
                        c!(expr.clone() - m * b <= rhs)
                    } else {
                        c!(expr.clone() + m * b <= rhs + m)
                    };
                    grb_model.add_constr(&format!("{name}_le"), guarded)?;
                }
                if linear.comparison != Comparison::LessEqual {
                    let m = (rhs - low).max(0.0);
                    let guarded = if literal.negated {
                        c!(expr + m * b >= rhs)
                    } else {
                        c!(expr - m * b >= rhs - m)
                    };
                    grb_model.add_constr(&format!("{name}_ge"), guarded)?;
                }
            }
            Constraint::NoOverlap { intervals, .. } => {
                for (i, &first) in intervals.iter().enumerate() {
                    for &second in &intervals[i + 1..] {
                        let first = model.interval(first);
                        let second = model.interval(second);
                        let m = (model.variable(first.end).upper - model.variable(second.start).lower)
                            .max(model.variable(second.end).upper - model.variable(first.start).lower)
                            .max(0) as f64;
                        let z = add_binvar!(grb_model, name: &format!("order_{}_{}", first.name, second.name))?;
                        let (s1, e1) = (vars[first.start.index()], vars[first.end.index()]);
                        let (s2, e2) = (vars[second.start.index()], vars[second.end.index()]);
                        grb_model.add_constr(
                            &format!("disjoint_{}_{}_a", first.name, second.name),
                            c!(e1 - s2 + m * z <= m),
                        )?;
                        grb_model.add_constr(
                            &format!("disjoint_{}_{}_b", first.name, second.name),
                            c!(e2 - s1 - m * z <= 0.0),
                        )?;
                    }
                }
            }
            Constraint::MaxEquality { target, args, .. } => {
                let t = vars[target.index()];
                let mut selectors = Vec::with_capacity(args.len());
                for (k, &arg) in args.iter().enumerate() {
                    let a = vars[arg.index()];
                    let m = (model.variable(*target).upper - model.variable(arg).lower).max(0) as f64;
                    let y = add_binvar!(grb_model, name: &format!("max_{index}_{k}"))?;
                    grb_model.add_constr(&format!("max_{index}_{k}_ge"), c!(t - a >= 0.0))?;
                    grb_model.add_constr(&format!("max_{index}_{k}_le"), c!(t - a + m * y <= m))?;
                    selectors.push(y);
                }
                grb_model.add_constr(&format!("max_{index}_select"), c!(selectors.iter().copied().grb_sum() == 1.0))?;
            }
        }
    }

    if let Some(objective) = model.objective() {
        grb_model.set_objective(to_expr(&vars, objective), Minimize)?;
    }

    grb_model.optimize()?;

    let solutions = grb_model.get_attr(attr::SolCount)?;
    let status = match grb_model.status()? {
        Status::Optimal => SolverStatus::Optimal,
        Status::Infeasible | Status::InfOrUnbd => SolverStatus::Infeasible,
        _ if solutions > 0 => SolverStatus::Feasible,
        _ => SolverStatus::Unknown,
    };

    let stats = SolverStats {
        branches: grb_model.get_attr(attr::NodeCount)? as u64,
        conflicts: 0,
        wall_time: Duration::from_secs_f64(grb_model.get_attr(attr::Runtime)?.max(0.0)),
    };

    if !status.has_solution() {
        return Ok(SolverResponse::failed(status).with_stats(stats));
    }

    let mut values = Vec::with_capacity(vars.len());
    for var in &vars {
        values.push(grb_model.get_obj_attr(attr::X, var)?.round() as i64);
    }
    let objective = grb_model.get_attr(attr::ObjVal)?;

    Ok(SolverResponse::solved(status, values, objective).with_stats(stats))
}
