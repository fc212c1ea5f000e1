#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
//! Synthetic workloads for stress testing and demos.

use crate::core::{Machine, Order, Problem, Product, ProductTask, SetupTimes};
use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

static OPERATIONS: [&str; 28] = [
    "cutting",
    "drilling",
    "milling",
    "turning",
    "grinding",
    "welding",
    "assembly",
    "painting",
    "coating",
    "polishing",
    "inspection",
    "testing",
    "packaging",
    "heat_treatment",
    "surface_finishing",
    "deburring",
    "threading",
    "boring",
    "stamping",
    "forging",
    "casting",
    "molding",
    "extrusion",
    "rolling",
    "drawing",
    "sintering",
    "brazing",
    "soldering",
];

/// Scale of the generated workload.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
pub enum WorkloadSize {
    /// 8-15 machines, 15-25 products, 20-40 orders.
    #[default]
    Large,
    /// 20-30 machines, 40-60 products, 60-100 orders.
    Extreme,
}

/// How deadlines relate to the work an order needs.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
pub enum DeadlineMode {
    /// Every deadline leaves room for the order's own work.
    #[default]
    Achievable,
    /// Some orders get a deadline shorter than their own work.
    Tight,
}

/// Parameters of a generated workload.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GeneratorConfig {
    pub size: WorkloadSize,
    pub deadlines: DeadlineMode,
    /// Makes the workload reproducible. A fresh one is drawn every call otherwise.
    pub seed: Option<u64>,
}

struct Profile {
    machines: RangeInclusive<usize>,
    products: RangeInclusive<usize>,
    orders: RangeInclusive<usize>,
    /// Number of leading pool operations in use.
    pool: usize,
    operations_per_machine: RangeInclusive<usize>,
    tasks_per_product: RangeInclusive<usize>,
    durations: RangeInclusive<u64>,
    setup_ratio: f64,
    setup_times: RangeInclusive<u64>,
    quantities: RangeInclusive<u64>,
    slack: (f64, f64),
    tight: (f64, f64),
    floor: u64,
    letters: bool,
}

static LARGE: Profile = Profile {
    machines: 8..=15,
    products: 15..=25,
    orders: 20..=40,
    pool: 18,
    operations_per_machine: 2..=4,
    tasks_per_product: 3..=8,
    durations: 1..=6,
    setup_ratio: 0.4,
    setup_times: 1..=4,
    quantities: 1..=5,
    slack: (1.5, 3.0),
    tight: (0.5, 0.8),
    floor: 20,
    letters: true,
};

static EXTREME: Profile = Profile {
    machines: 20..=30,
    products: 40..=60,
    orders: 60..=100,
    pool: OPERATIONS.len(),
    operations_per_machine: 2..=5,
    tasks_per_product: 3..=10,
    durations: 1..=8,
    setup_ratio: 0.3,
    setup_times: 1..=5,
    quantities: 1..=4,
    slack: (1.5, 3.5),
    tight: (0.4, 0.7),
    floor: 30,
    letters: false,
};

/// Share of orders receiving a tight deadline in [`DeadlineMode::Tight`].
const TIGHT_SHARE: f64 = 0.4;

impl WorkloadSize {
    fn profile(self) -> &'static Profile {
        match self {
            Self::Large => &LARGE,
            Self::Extreme => &EXTREME,
        }
    }
}

fn machine_name(profile: &Profile, index: usize) -> String {
    match u8::try_from(index) {
        Ok(index) if profile.letters && index < 26 => format!("Machine_{}", char::from(b'A' + index)),
        _ => format!("Machine_{}", index + 1),
    }
}

fn gen_machines(profile: &Profile, rng: &mut impl Rng) -> Vec<Machine> {
    let count = rng.gen_range(profile.machines.clone());
    let pool = &OPERATIONS[..profile.pool];
    let stride = (pool.len() / count + 1).max(2);

    (0..count)
        .map(|i| {
            let wanted = rng.gen_range(profile.operations_per_machine.clone());
            let first = (i * stride).min(pool.len());
            let last = ((i + 1) * stride).min(pool.len());
            let mut operations: Vec<&str> = pool[first..last].iter().take(wanted).copied().collect();
            if operations.len() < wanted {
                let missing = wanted - operations.len();
                operations.extend(pool.choose_multiple(rng, missing).copied());
            }
            Machine::new(machine_name(profile, i), operations)
        })
        .collect()
}

fn gen_products(profile: &Profile, covered: &[&str], rng: &mut impl Rng) -> Vec<Product> {
    let count = rng.gen_range(profile.products.clone());

    (0..count)
        .map(|i| {
            let tasks = rng.gen_range(profile.tasks_per_product.clone()).min(covered.len());
            let operations: Vec<&str> = covered.choose_multiple(rng, tasks).copied().collect();
            let tasks = operations
                .into_iter()
                .map(|operation| ProductTask::new(operation, rng.gen_range(profile.durations.clone())))
                .collect();
            Product::new(format!("Product_{}", i + 1), tasks)
        })
        .collect()
}

fn gen_setup_times(profile: &Profile, products: &[Product], rng: &mut impl Rng) -> SetupTimes {
    let pairs = products.len() * products.len().saturating_sub(1);
    let attempts = (pairs as f64 * profile.setup_ratio) as usize;
    let mut setup = SetupTimes::new();

    for _ in 0..attempts {
        let from = &products[rng.gen_range(0..products.len())].name;
        let to = &products[rng.gen_range(0..products.len())].name;
        let time = rng.gen_range(profile.setup_times.clone());
        if from != to {
            setup.insert(from, to, time);
        }
    }
    setup
}

fn gen_orders(
    profile: &Profile,
    deadlines: DeadlineMode,
    products: &[Product],
    rng: &mut impl Rng,
) -> Vec<Order> {
    let count = rng.gen_range(profile.orders.clone());

    (0..count)
        .map(|_| {
            let product = &products[rng.gen_range(0..products.len())];
            let quantity = rng.gen_range(profile.quantities.clone());
            let work = product.unit_work().saturating_mul(quantity) as f64;

            let tight = deadlines == DeadlineMode::Tight && rng.gen_bool(TIGHT_SHARE);
            let (low, high) = if tight { profile.tight } else { profile.slack };
            let deadline = (work * rng.gen_range(low..high)) as u64;

            Order::new(product.name.clone(), quantity, deadline.max(profile.floor))
        })
        .collect()
}

/// Generates a random workload.
///
/// Machines get consecutive slices of the operation pool, topped up with random picks.
/// Products only use operations some machine can perform, so every task is schedulable.
#[must_use]
pub fn generate(config: &GeneratorConfig) -> Problem {
    let mut rng = config
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let profile = config.size.profile();

    let machines = gen_machines(profile, &mut rng);
    let covered: Vec<&str> = machines
        .iter()
        .flat_map(|machine| machine.operations.iter().map(String::as_str))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let products = gen_products(profile, &covered, &mut rng);
    let setup_times = gen_setup_times(profile, &products, &mut rng);
    let orders = gen_orders(profile, config.deadlines, &products, &mut rng);

    tracing::info!(
        size = ?config.size,
        deadlines = ?config.deadlines,
        machines = machines.len(),
        products = products.len(),
        orders = orders.len(),
        setup_times = setup_times.len(),
        units = orders.iter().map(|order| order.quantity).sum::<u64>(),
        "workload generated"
    );

    Problem::new(machines, products, setup_times, orders)
}
