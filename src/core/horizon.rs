use super::{ModelError, Problem};

/// Lower bound of every estimated horizon.
pub const MINIMUM_HORIZON: u64 = 1000;

/// Slack factor between total work and horizon, reserved for setups and machine contention.
pub const HORIZON_FACTOR: u64 = 3;

/// Planning window of a scheduling call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Horizon {
    /// Sum of processing times of every unit of every order.
    pub total_work: u64,
    /// Upper bound of any start or end time.
    pub length: i64,
}

impl Horizon {
    /// Estimates the horizon as `max(1000, 3 * total_work)`.
    /// This is a heuristic bound: a feasible schedule longer than it is never found.
    ///
    /// # Errors
    /// - If the total work does not fit into the model's time domain.
    pub fn estimate(problem: &Problem) -> Result<Self, ModelError> {
        let total_work = total_work(problem)?;
        let length = total_work
            .checked_mul(HORIZON_FACTOR)
            .ok_or(ModelError::TimeOverflow(total_work))?
            .max(MINIMUM_HORIZON);
        let length = i64::try_from(length).map_err(|_| ModelError::TimeOverflow(length))?;
        Ok(Self { total_work, length })
    }

    /// Uses the given horizon instead of the estimate, keeping the workload figure for reporting.
    ///
    /// # Errors
    /// - If the total work does not fit into the model's time domain.
    pub fn fixed(problem: &Problem, length: i64) -> Result<Self, ModelError> {
        let total_work = total_work(problem)?;
        Ok(Self { total_work, length })
    }

    /// Estimates the horizon unless `length` overrides it.
    ///
    /// # Errors
    /// - If the total work does not fit into the model's time domain.
    pub fn resolve(problem: &Problem, length: Option<i64>) -> Result<Self, ModelError> {
        length.map_or_else(|| Self::estimate(problem), |length| Self::fixed(problem, length))
    }
}

fn total_work(problem: &Problem) -> Result<u64, ModelError> {
    problem.products.iter().try_fold(0u64, |total, product| {
        let quantity: u64 = problem
            .orders
            .iter()
            .filter(|order| order.product == product.name)
            .try_fold(0u64, |sum, order| sum.checked_add(order.quantity))
            .ok_or(ModelError::TimeOverflow(total))?;
        product
            .tasks
            .iter()
            .try_fold(0u64, |sum, task| sum.checked_add(task.duration))
            .and_then(|work| work.checked_mul(quantity))
            .and_then(|work| total.checked_add(work))
            .ok_or(ModelError::TimeOverflow(total))
    })
}
