//! Text renderers over finished runs: the per-process results table, the
//! Gantt-style timeline, and the queue-assignment listing. All renderers are
//! pure functions into `String`; only the binary prints.

use itertools::Itertools;

use crate::{MetricsReport, Process, ProcessId, QueueClass, TraceEntry};

/// A maximal run of consecutive trace entries for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedSpan {
    /// The executing process.
    pub pid: ProcessId,
    /// First clock value of the span.
    pub start: u64,
    /// Clock value one past the last executed unit.
    pub end: u64,
}

/// Merges unit trace entries into contiguous per-process spans. Spans
/// separated by an idle gap are kept apart even for the same process.
#[must_use]
pub fn merge_trace(trace: &[TraceEntry]) -> Vec<MergedSpan> {
    trace
        .iter()
        .map(|entry| MergedSpan {
            pid: entry.pid.clone(),
            start: entry.start,
            end: entry.end,
        })
        .coalesce(|previous, next| {
            if previous.pid == next.pid && previous.end == next.start {
                Ok(MergedSpan {
                    pid: previous.pid,
                    start: previous.start,
                    end: next.end,
                })
            } else {
                Err((previous, next))
            }
        })
        .collect()
}

/// Renders the per-process results table with an averages row.
#[must_use]
pub fn results_table(report: &MetricsReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:<6} {:<6} {:<10} {:<8} {:<6} {:<6} {:<6} {:<6}\n",
        "PID", "AT", "BT", "Priority", "Queue", "CT", "TAT", "WT", "RT"
    ));
    out.push_str(&"-".repeat(66));
    out.push('\n');
    for metrics in report
        .processes
        .iter()
        .sorted_by(|a, b| a.pid.cmp(&b.pid))
    {
        out.push_str(&format!(
            "{:<6} {:<6} {:<6} {:<10} {:<8} {:<6} {:<6} {:<6} {:<6}\n",
            metrics.pid.as_str(),
            metrics.arrival_time,
            metrics.burst_time,
            metrics.priority,
            metrics.queue.to_string(),
            metrics.completion,
            metrics.turnaround,
            metrics.waiting,
            metrics.response,
        ));
    }
    out.push_str(&"-".repeat(66));
    out.push('\n');
    let avg = &report.averages;
    out.push_str(&format!(
        "{:<6} {:<6} {:<6} {:<10} {:<8} {:<6.2} {:<6.2} {:<6.2} {:<6.2}\n",
        "AVG", "", "", "", "", avg.completion, avg.turnaround, avg.waiting, avg.response,
    ));
    let (system, user): (Vec<_>, Vec<_>) = report
        .processes
        .iter()
        .partition(|metrics| metrics.queue == QueueClass::System);
    out.push_str(&format!(
        "\nTotal processes: {} ({} system, {} user)\n",
        report.processes.len(),
        system.len(),
        user.len(),
    ));
    out.push_str(&format!(
        "Average turnaround: {:.2}  waiting: {:.2}  response: {:.2}\n",
        avg.turnaround, avg.waiting, avg.response,
    ));
    out
}

/// Renders the merged-interval Gantt chart plus the detailed execution log.
#[must_use]
pub fn gantt_chart(trace: &[TraceEntry]) -> String {
    let spans = merge_trace(trace);
    let Some(first) = spans.first() else {
        return String::from("(no execution recorded)\n");
    };

    // Each simulated unit is four characters wide; boundary timestamps sit
    // under the cell separators.
    let mut chart = String::from("|");
    let mut times = first.start.to_string();
    for span in &spans {
        let width = usize::try_from((span.end - span.start) * 4 - 2).unwrap_or(2);
        chart.push_str(&format!(" {:^width$} |", span.pid.as_str()));
        let label = span.end.to_string();
        let padding = (width + 2).saturating_sub(label.len() - 1);
        times.push_str(&" ".repeat(padding));
        times.push_str(&label);
    }

    let mut out = String::from("Process execution timeline:\n\n");
    out.push_str(&chart);
    out.push('\n');
    out.push_str(&times);
    out.push_str("\n\n");
    out.push_str(&format!(
        "{:<10} {:<12} {:<12} {:<10}\n",
        "Process", "Start", "End", "Duration"
    ));
    out.push_str(&"-".repeat(46));
    out.push('\n');
    for span in &spans {
        out.push_str(&format!(
            "{:<10} {:<12} {:<12} {:<10}\n",
            span.pid.as_str(),
            span.start,
            span.end,
            span.end - span.start
        ));
    }
    out
}

/// Renders the static queue-assignment listing derived from each process's
/// queue class.
#[must_use]
pub fn queue_assignment(processes: &[Process]) -> String {
    let mut out = String::new();
    let format_group = |out: &mut String, header: &str, rule: &str, queue: QueueClass| {
        out.push_str(header);
        out.push('\n');
        out.push_str(rule);
        out.push('\n');
        let members = processes
            .iter()
            .filter(|process| process.queue() == queue)
            .sorted_by(|a, b| a.pid().cmp(b.pid()))
            .collect_vec();
        if members.is_empty() {
            out.push_str("    (none)\n");
        }
        for process in members {
            out.push_str(&format!(
                "    {}: priority={}, arrival={}, burst={}\n",
                process.pid(),
                process.priority(),
                process.arrival_time(),
                process.burst_time(),
            ));
        }
    };
    format_group(
        &mut out,
        "Queue 1 (system processes, preemptive priority):",
        "  priority 1-2, lower number runs first",
        QueueClass::System,
    );
    out.push('\n');
    format_group(
        &mut out,
        "Queue 2 (user processes, FCFS):",
        "  priority 3 and above, arrival order",
        QueueClass::User,
    );
    out.push_str("\nQueue 1 always executes before queue 2.\n");
    out
}

/// The scheduling-policy banner shown before a run.
#[must_use]
pub fn algorithm_info() -> &'static str {
    "Multilevel queue scheduling\n\
       Queue 1 (system, priority 1-2): preemptive priority, lower number wins\n\
       Queue 2 (user, priority 3+): first-come first-served\n\
       Queue 1 always preempts queue 2; queue 2 runs only while queue 1 is empty\n"
}
