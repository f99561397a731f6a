use serde::Serialize;

use crate::{Error, Process, ProcessMetrics};

/// Per-process metrics plus their arithmetic means for one finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    /// Metrics of every completed process, in completion order.
    pub processes: Vec<ProcessMetrics>,
    /// Arithmetic means across all completed processes.
    pub averages: Averages,
}

/// Arithmetic means of the per-process metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Averages {
    /// Mean completion time.
    pub completion: f64,
    /// Mean turnaround time.
    pub turnaround: f64,
    /// Mean waiting time.
    pub waiting: f64,
    /// Mean response time.
    pub response: f64,
}

/// Derives per-process and average metrics from the completed-process list.
///
/// A record without a completion stamp is skipped with a warning; under
/// correct engine behavior this cannot happen for a fully-completed run.
///
/// # Errors
///
/// Returns [`Error::EmptyInput`] if no process contributes metrics.
#[allow(clippy::cast_precision_loss)]
pub fn summarize(completed: &[Process]) -> Result<MetricsReport, Error> {
    if completed.is_empty() {
        return Err(Error::EmptyInput);
    }
    let mut processes = Vec::with_capacity(completed.len());
    for process in completed {
        match process.metrics() {
            Ok(metrics) => processes.push(metrics),
            Err(err) => log::warn!("skipping {} in metrics: {err}", process.pid()),
        }
    }
    if processes.is_empty() {
        return Err(Error::EmptyInput);
    }
    let count = processes.len() as f64;
    let sum = |f: fn(&ProcessMetrics) -> u64| processes.iter().map(f).sum::<u64>() as f64;
    let averages = Averages {
        completion: sum(|m| m.completion) / count,
        turnaround: sum(|m| m.turnaround) / count,
        waiting: sum(|m| m.waiting) / count,
        response: sum(|m| m.response) / count,
    };
    Ok(MetricsReport {
        processes,
        averages,
    })
}
