// SPDX-License-Identifier: MIT
// alertsim: incident-response pipeline simulation
//
// - Runs agents and responders on a fixed tick until quit or max ticks.
// - Prints a summary report on exit.
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use alertsim::commands::{command_channel, CommandHandlers, Flow};
use alertsim::config::SimConfig;
use alertsim::input::spawn_stdin_listener;
use alertsim::report::{write_table, Report};
use alertsim::simulation::context::SimulationContext;

const COMMAND_QUEUE_CAPACITY: usize = 16;
const MAX_IDLE: Duration = Duration::from_millis(10);

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with the simulation config. Flags given below override it.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of monitored units (agents)
    #[arg(long)]
    agents: Option<usize>,

    /// Number of responders
    #[arg(long)]
    responders: Option<usize>,

    /// Probability that an agent raises an alert on a tick
    #[arg(long = "chance-to-crash")]
    chance_to_crash: Option<f32>,

    /// Probability that a busy responder finishes its job on a tick
    #[arg(long = "chance-to-handle")]
    chance_to_handle: Option<f32>,

    /// Alerts a unit can hold until its job is finished
    #[arg(long = "alerts-capacity")]
    alerts_capacity: Option<usize>,

    #[arg(long = "tick-interval-ms")]
    tick_interval_ms: Option<u64>,

    /// Number of concurrent producers the alarming agents are split into
    #[arg(long = "agent-batches")]
    agent_batches: Option<usize>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Start paused
    #[arg(long)]
    paused: bool,

    /// Stop after this many ticks
    #[arg(long = "max-ticks")]
    max_ticks: Option<u64>,

    /// Write the log to this file instead of stderr
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long = "report-json")]
    report_json: bool,

    /// Do not read commands from stdin
    #[arg(
        long = "no-input",
        help = "Do not read commands from stdin",
        long_help = "Do not read commands from stdin.\n\
                 Without input the run only ends at --max-ticks or when the process is killed."
    )]
    no_input: bool,
}

fn validate_args(args: &Args) -> Result<(), String> {
    // nobody could resume the run
    if args.paused && args.no_input {
        return Err("--paused must not be used together with --no-input".into());
    }

    for (name, chance) in [
        ("--chance-to-crash", args.chance_to_crash),
        ("--chance-to-handle", args.chance_to_handle),
    ] {
        if let Some(chance) = chance {
            if !(0.0..=1.0).contains(&chance) {
                return Err(format!("{} must be within [0, 1]", name));
            }
        }
    }

    if args.max_ticks == Some(0) {
        return Err("--max-ticks must be at least 1".into());
    }

    Ok(())
}

fn build_config(args: &Args) -> anyhow::Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };

    if let Some(agents) = args.agents {
        config.agents = agents;
    }
    if let Some(responders) = args.responders {
        config.responders = responders;
    }
    if let Some(chance) = args.chance_to_crash {
        config.chance_to_crash = chance;
    }
    if let Some(chance) = args.chance_to_handle {
        config.chance_to_handle = chance;
    }
    if let Some(capacity) = args.alerts_capacity {
        config.alerts_capacity = capacity;
    }
    if let Some(interval) = args.tick_interval_ms {
        config.tick_interval_ms = interval;
    }
    if let Some(batches) = args.agent_batches {
        config.agent_batches = batches;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.paused {
        config.start_paused = true;
    }
    if args.max_ticks.is_some() {
        config.max_ticks = args.max_ticks;
    }

    config.validate()?;
    Ok(config)
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("could not create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn run(config: SimConfig, read_input: bool) -> anyhow::Result<Report> {
    let mut ctx = SimulationContext::new(config)?;
    let idle = ctx.config().tick_interval().min(MAX_IDLE);

    let (sender, queue) = command_channel(COMMAND_QUEUE_CAPACITY);
    if read_input {
        // the listener thread is left to die with the process
        spawn_stdin_listener(sender).context("failed to start the input listener")?;
    } else {
        drop(sender);
    }
    let mut handlers = CommandHandlers::with_defaults();

    info!("Starting alertsim");

    let mut last = Instant::now();
    loop {
        if handlers.process(&queue, &mut ctx) == Flow::Stop {
            info!("quit requested");
            break;
        }

        let now = Instant::now();
        ctx.step(now.duration_since(last))?;
        last = now;

        if ctx.is_finished() {
            info!("reached the configured number of ticks");
            break;
        }
        thread::sleep(idle);
    }

    info!("Stopping alertsim after {} ticks", ctx.ticks());
    Ok(Report::from_context(&ctx)?)
}

fn print_report(report: &Report, as_json: bool) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if as_json {
        serde_json::to_writer_pretty(&mut out, report)?;
        writeln!(out)?;
    } else {
        write_table(report, &mut out)?;
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {e}");
        std::process::exit(2);
    }

    if let Err(e) = init_logging(args.log_file.as_deref()) {
        eprintln!("Error: {e:#}");
        std::process::exit(2);
    }

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            std::process::exit(2);
        }
    };

    let report = match run(config, !args.no_input) {
        Ok(report) => report,
        Err(e) => {
            error!("simulation stopped: {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = print_report(&report, args.report_json) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
