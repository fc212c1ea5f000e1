use anyhow::anyhow;
use clap::Parser;
use production_scheduling::core::{
    parse_start_time, SchedulingConfig, DEFAULT_VIOLATION_WEIGHT,
};
use production_scheduling::data::gen::{generate, DeadlineMode, GeneratorConfig, WorkloadSize};
use production_scheduling::{algo, data, logging, run_reader};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::time::Duration;

fn parse_seconds(text: &str) -> Result<Duration, String> {
    let seconds: f64 = text.parse().map_err(|err| format!("{err}"))?;
    Duration::try_from_secs_f64(seconds).map_err(|err| format!("{err}"))
}

/// Application scheduling production orders on machines.
#[derive(Debug, Parser)]
#[command(version, about)]
enum Application {
    /// Schedule the problem read from a JSON file, or stdin when no file is given.
    Run {
        /// The input file.
        input: Option<PathBuf>,
        /// Solver backend, see the `solvers` command.
        #[clap(short, long, default_value = "List")]
        solver: String,
        /// Planning horizon in hours. Estimated from the workload when absent.
        #[clap(long)]
        horizon: Option<i64>,
        /// Objective weight of one hour of deadline violation.
        #[clap(short = 'w', long, default_value_t = DEFAULT_VIOLATION_WEIGHT)]
        violation_weight: i64,
        /// Solver time budget in seconds.
        #[clap(short, long, value_parser = parse_seconds, default_value = "30")]
        time_limit: Duration,
        /// Anchor of the schedule, overrides the input's `start_time`. Defaults to now.
        #[clap(long, value_parser = parse_start_time)]
        start_time: Option<chrono::NaiveDateTime>,
    },
    /// Generate a random workload.
    Gen {
        /// Scale of the workload.
        #[clap(long, value_enum, default_value_t = WorkloadSize::Large)]
        size: WorkloadSize,
        /// Deadline mode of the orders.
        #[clap(short, long, value_enum, default_value_t = DeadlineMode::Achievable)]
        deadlines: DeadlineMode,
        /// Seed making the workload reproducible.
        #[clap(long)]
        seed: Option<u64>,
        /// Output file. Written to stdout when absent.
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// List the available solver backends.
    Solvers,
}

fn main() -> anyhow::Result<()> {
    logging::init();

    match Application::parse() {
        Application::Run {
            input,
            solver,
            horizon,
            violation_weight,
            time_limit,
            start_time,
        } => {
            let mut backend = algo::solver(&solver).ok_or_else(|| {
                anyhow!(
                    "Unknown solver `{solver}`, available: {}",
                    algo::solver_names().join(", ")
                )
            })?;

            let mut config = SchedulingConfig::default()
                .with_violation_weight(violation_weight)
                .with_time_limit(time_limit);
            if let Some(horizon) = horizon {
                config = config.with_horizon(horizon);
            }

            match input {
                Some(path) => {
                    let mut reader = BufReader::new(File::open(path)?);
                    run_reader(backend.as_mut(), &config, start_time, &mut reader)?;
                }
                None => {
                    run_reader(backend.as_mut(), &config, start_time, &mut std::io::stdin().lock())?;
                }
            }
            Ok(())
        }
        Application::Gen {
            size,
            deadlines,
            seed,
            output,
        } => {
            let problem = generate(&GeneratorConfig {
                size,
                deadlines,
                seed,
            });
            let text = data::to_string(&problem)?;
            match output {
                Some(path) => File::create(path)?.write_all(text.as_bytes())?,
                None => println!("{text}"),
            }
            Ok(())
        }
        Application::Solvers => {
            for name in algo::solver_names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}
