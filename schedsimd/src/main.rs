//! # Scheduler Simulation Host
//!
//! Main entry point for the scheduler simulator.

use anyhow::{bail, Context};
use schedsimd::{logging, Simulation, SimulationReport, TickSource};
use sim_kernel::SchedulerConfig;
use std::env;
use std::process;
use std::time::Duration;

#[derive(Debug, Default)]
struct Options {
    config_path: Option<String>,
    threads: bool,
    tick_ms: Option<u64>,
    seed: Option<u64>,
    audit: bool,
}

fn main() -> anyhow::Result<()> {
    let _logger = logging::initialize().context("failed to start logger")?;

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let mut config = match &options.config_path {
        Some(path) => SchedulerConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => SchedulerConfig::default(),
    };
    if options.seed.is_some() {
        config.seed = options.seed;
    }

    let tick_source = match options.tick_ms {
        Some(ms) => TickSource::Interval(Duration::from_millis(ms)),
        None => TickSource::Immediate,
    };

    let report = if options.threads {
        let mut simulation = Simulation::threaded(config, tick_source)?;
        let report = simulation.run()?;
        simulation.into_workers().shutdown()?;
        report
    } else {
        Simulation::simulated(config, tick_source)?.run()?
    };

    print_report(&report, options.audit)
}

fn print_report(report: &SimulationReport, audit: bool) -> anyhow::Result<()> {
    let json = if audit {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string_pretty(&report.summary)?
    };
    println!("{}", json);
    Ok(())
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let mut options = Options::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    bail!("Missing value for --config");
                };
                options.config_path = Some(path.clone());
            }
            "--threads" => {
                options.threads = true;
            }
            "--tick-ms" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    bail!("Missing value for --tick-ms");
                };
                let ms: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid tick-ms value: {}", value))?;
                if ms == 0 {
                    bail!("tick-ms must be positive");
                }
                options.tick_ms = Some(ms);
            }
            "--seed" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    bail!("Missing value for --seed");
                };
                options.seed = Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid seed value: {}", value))?,
                );
            }
            "--audit" => {
                options.audit = true;
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => bail!("Unknown option: {}", other),
        }
        i += 1;
    }

    Ok(options)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <FILE>      JSON scheduler configuration");
    eprintln!("  --threads                Back each process with an OS thread");
    eprintln!("  --tick-ms <N>            Fire the timer every N milliseconds");
    eprintln!("  --seed <N>               Seed for burst sampling");
    eprintln!("  --audit                  Include the scheduling audit trail");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --seed 42", program);
    eprintln!("  {} --config sched.json --threads --tick-ms 10", program);
}
