//! Process sources: the built-in reference dataset, CSV workload files, and
//! interactive entry. Every source yields fully validated [`Process`]
//! records before the scheduler sees them.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use serde::Deserialize;

use crate::{Error, Process};

/// Row shape of the workload CSV: `PID,ArrivalTime,BurstTime,Priority`.
#[derive(Debug, Deserialize)]
struct WorkloadRow {
    pid: String,
    arrival_time: i64,
    burst_time: i64,
    priority: i64,
}

impl TryFrom<WorkloadRow> for Process {
    type Error = Error;

    fn try_from(row: WorkloadRow) -> Result<Self, Error> {
        Process::new(row.pid, row.arrival_time, row.burst_time, row.priority)
    }
}

/// The five-process reference dataset from the assignment sheet.
#[must_use]
pub fn default_workload() -> Vec<Process> {
    [
        ("P1", 0, 10, 3),
        ("P2", 2, 5, 1),
        ("P3", 4, 3, 4),
        ("P4", 6, 8, 2),
        ("P5", 8, 1, 5),
    ]
    .into_iter()
    .map(|(pid, arrival, burst, priority)| {
        Process::new(pid, arrival, burst, priority).expect("reference dataset is valid")
    })
    .collect()
}

/// Loads a workload from a CSV file. See [`read_csv`] for the format.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the file cannot be opened or contains
/// invalid process fields.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Process>, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| {
        Error::InvalidInput(format!(
            "unable to open workload file `{}`: {err}",
            path.display()
        ))
    })?;
    read_csv(file)
}

/// Reads the workload CSV format from any reader.
///
/// One `PID,ArrivalTime,BurstTime,Priority` record per line; blank lines and
/// lines starting with `#` are ignored, and lines with the wrong number of
/// fields are skipped with a warning.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] on unreadable records, non-integer
/// fields, or out-of-range process values.
pub fn read_csv(reader: impl io::Read) -> Result<Vec<Process>, Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);
    let mut processes = Vec::new();
    for record in csv_reader.records() {
        let record =
            record.map_err(|err| Error::InvalidInput(format!("workload record: {err}")))?;
        let line = record.position().map_or(0, csv::Position::line);
        if record.len() != 4 {
            log::warn!(
                "skipping workload line {line}: expected 4 fields, found {}",
                record.len()
            );
            continue;
        }
        let row: WorkloadRow = record
            .deserialize(None)
            .map_err(|err| Error::InvalidInput(format!("workload line {line}: {err}")))?;
        processes.push(Process::try_from(row)?);
    }
    Ok(processes)
}

/// Reads processes interactively, one `PID,ArrivalTime,BurstTime,Priority`
/// line per process.
///
/// `done` finishes the entry; an empty line, or finishing with no valid
/// entries, falls back to [`default_workload`]. Unparsable lines are
/// reported and skipped so the operator can retry.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the input stream itself fails.
pub fn read_interactive(input: impl BufRead) -> Result<Vec<Process>, Error> {
    let mut processes = Vec::new();
    for line in input.lines() {
        let line = line.map_err(|err| Error::InvalidInput(format!("failed to read input: {err}")))?;
        let line = line.trim();
        if line.is_empty() {
            log::info!("empty entry, falling back to the default workload");
            return Ok(default_workload());
        }
        if line.eq_ignore_ascii_case("done") {
            break;
        }
        match parse_line(line) {
            Ok(process) => processes.push(process),
            Err(err) => log::warn!("{err}"),
        }
    }
    if processes.is_empty() {
        log::info!("no processes entered, falling back to the default workload");
        return Ok(default_workload());
    }
    Ok(processes)
}

fn parse_line(line: &str) -> Result<Process, Error> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    let [pid, arrival, burst, priority] = parts[..] else {
        return Err(Error::InvalidInput(format!(
            "expected `PID,ArrivalTime,BurstTime,Priority`, found `{line}`"
        )));
    };
    let parse = |field: &str, name: &str| {
        field.parse::<i64>().map_err(|_| {
            Error::InvalidInput(format!("{name} must be an integer, found `{field}`"))
        })
    };
    Process::new(
        pid,
        parse(arrival, "arrival time")?,
        parse(burst, "burst time")?,
        parse(priority, "priority")?,
    )
}
