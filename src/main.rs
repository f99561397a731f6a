//! Multilevel queue CPU scheduling simulation application.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::io;
use std::path::PathBuf;

use clap::Parser;
use eyre::WrapErr;

use mlqsim::{report, summarize, workload, MlqScheduler, Process};

/// Source of the simulated process set when no workload file is given.
#[derive(Debug, Clone, Copy, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
enum InputOption {
    /// The built-in five-process reference dataset.
    Default,
    /// Line-per-process entry on standard input.
    Interactive,
}

/// Runs the multilevel queue (MLQ) scheduling simulation.
#[derive(Parser)]
#[command(version, about)]
struct Opt {
    /// Path to a workload CSV file (`PID,ArrivalTime,BurstTime,Priority`).
    workload: Option<PathBuf>,

    /// Process source used when no workload file is given.
    #[arg(short, long, default_value = "default")]
    input: InputOption,

    /// Verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Store the logs in this file.
    #[arg(long)]
    log_output: Option<PathBuf>,

    /// Do not log to stderr.
    #[arg(long)]
    no_stderr: bool,
}

/// Set up a logger based on the given user options.
fn set_up_logger(opt: &Opt) -> Result<(), fern::InitError> {
    let log_level = match opt.verbose {
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        3.. => log::LevelFilter::Trace,
        _ => log::LevelFilter::Warn,
    };
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(log_level);
    let dispatch = if let Some(path) = &opt.log_output {
        let _ = std::fs::remove_file(path);
        dispatch.chain(
            std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .append(false)
                .open(path)?,
        )
    } else {
        dispatch
    };
    let dispatch = if opt.no_stderr {
        dispatch
    } else {
        dispatch.chain(io::stderr())
    };
    dispatch.apply()?;
    Ok(())
}

/// Resolves the process set from the CLI options.
fn processes(opt: &Opt) -> eyre::Result<Vec<Process>> {
    if let Some(path) = &opt.workload {
        return workload::load_csv(path)
            .wrap_err_with(|| format!("failed to load workload from `{}`", path.display()));
    }
    match opt.input {
        InputOption::Default => Ok(workload::default_workload()),
        InputOption::Interactive => {
            println!("Enter one `PID,ArrivalTime,BurstTime,Priority` per line, `done` to finish:");
            workload::read_interactive(io::stdin().lock()).wrap_err("failed to read processes")
        }
    }
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::parse();
    set_up_logger(&opt).wrap_err("failed to set up logging")?;

    let processes = processes(&opt)?;
    println!("{}", report::algorithm_info());
    println!("{}", report::queue_assignment(&processes));

    let schedule = MlqScheduler::new(processes)?.run()?;
    let metrics = summarize(schedule.completed())?;

    println!("{}", report::results_table(&metrics));
    println!("{}", report::gantt_chart(schedule.trace()));
    Ok(())
}
