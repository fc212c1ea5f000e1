use super::{Diagnostic, Problem};

/// One unit's execution of one process step, bound to a machine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskInstance<'a> {
    pub id: usize,
    /// Position of the order in the input.
    pub order: usize,
    pub unit: u64,
    /// Position of the step in the product's process plan.
    pub step: usize,
    pub product: &'a str,
    pub operation: &'a str,
    pub duration: u64,
    /// Index of the machine executing the task.
    pub machine: usize,
    /// Every machine able to execute the task, in input order. Only the first one is used;
    /// the rest is reported as routing flexibility left unexploited.
    pub eligible: Vec<usize>,
}

/// An expanded order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderRecord<'a> {
    /// Position of the order in the input.
    pub id: usize,
    pub product: &'a str,
    pub quantity: u64,
    pub deadline: u64,
    /// Ids of the last task of every unit. The order completes when all of them end.
    pub finals: Vec<usize>,
}

/// Result of expanding the orders of a problem into task instances.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Expansion<'a> {
    pub tasks: Vec<TaskInstance<'a>>,
    /// Consecutive tasks of a unit, `(earlier, later)`.
    pub precedences: Vec<(usize, usize)>,
    pub orders: Vec<OrderRecord<'a>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> Expansion<'a> {
    /// Expands every order into one task instance per unit and process step.
    ///
    /// Each instance is bound to the first machine, in input order, able to perform its
    /// operation. Steps no machine supports are skipped and reported, the unit's chain
    /// continues from the previous created task.
    #[must_use]
    pub fn new(problem: &'a Problem) -> Self {
        let mut expansion = Self::default();

        for key in problem.setup_times.unmatched_keys(&problem.products) {
            expansion
                .diagnostics
                .push(Diagnostic::UnmatchedSetupKey { key: key.to_owned() });
        }

        for (id, order) in problem.orders.iter().enumerate() {
            let Some(product) = problem.product(&order.product) else {
                expansion.diagnostics.push(Diagnostic::UnknownProduct {
                    order: id,
                    product: order.product.clone(),
                });
                continue;
            };

            let mut record = OrderRecord {
                id,
                product: &product.name,
                quantity: order.quantity,
                deadline: order.deadline,
                finals: Vec::new(),
            };

            for unit in 0..order.quantity {
                let mut previous = None;

                for (step, task) in product.tasks.iter().enumerate() {
                    let eligible: Vec<usize> = problem
                        .machines
                        .iter()
                        .enumerate()
                        .filter(|(_, machine)| machine.can_perform(&task.operation))
                        .map(|(index, _)| index)
                        .collect();

                    let Some(&machine) = eligible.first() else {
                        expansion.diagnostics.push(Diagnostic::UnsupportedOperation {
                            order: id,
                            product: product.name.clone(),
                            unit,
                            step,
                            operation: task.operation.clone(),
                        });
                        continue;
                    };

                    let task_id = expansion.tasks.len();
                    expansion.tasks.push(TaskInstance {
                        id: task_id,
                        order: id,
                        unit,
                        step,
                        product: &product.name,
                        operation: &task.operation,
                        duration: task.duration,
                        machine,
                        eligible,
                    });

                    if let Some(previous) = previous {
                        expansion.precedences.push((previous, task_id));
                    }
                    previous = Some(task_id);
                }

                if let Some(last) = previous {
                    record.finals.push(last);
                }
            }

            expansion.orders.push(record);
        }

        expansion
    }

    /// Returns task ids grouped by machine index, in creation order.
    #[must_use]
    pub fn machine_tasks(&self, machines: usize) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); machines];
        for task in &self.tasks {
            groups[task.machine].push(task.id);
        }
        groups
    }

    /// Number of tasks that more than one machine could execute.
    #[must_use]
    pub fn flexible_tasks(&self) -> usize {
        self.tasks.iter().filter(|task| task.eligible.len() > 1).count()
    }
}
