//! Multilevel queue (MLQ) CPU scheduling simulation.
//!
//! Two ready queues share a single simulated CPU: queue 1 holds system
//! processes (priority 1 and 2) scheduled by preemptive priority, queue 2
//! holds user processes scheduled FCFS. Queue 1 always dominates queue 2.
//! The [`MlqScheduler`] advances a discrete virtual clock one unit per
//! dispatch decision and records an execution trace from which per-process
//! metrics are derived.

#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::fmt;

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

mod process;
pub use process::{Process, ProcessMetrics};

mod scheduler;
pub use scheduler::{MlqScheduler, Schedule};

mod observer;
pub use observer::{NullObserver, Observer, RecordingObserver, SchedulerEvent};

mod metrics;
pub use metrics::{summarize, Averages, MetricsReport};

pub mod report;
pub mod workload;

/// Process ID.
#[derive(
    From, Into, Debug, PartialEq, PartialOrd, Eq, Ord, Serialize, Deserialize, Clone, Hash, Display,
)]
pub struct ProcessId(String);

impl From<&str> for ProcessId {
    fn from(pid: &str) -> Self {
        Self(pid.to_string())
    }
}

impl ProcessId {
    /// The ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The queue a process is permanently assigned to, derived from its priority
/// once at creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QueueClass {
    /// Queue 1: system processes (priority 1–2), preemptive priority.
    System,
    /// Queue 2: user processes (priority 3 and above), FCFS.
    User,
}

impl QueueClass {
    /// Maps a priority to its queue. Priority 1–2 is system, the rest user.
    #[must_use]
    pub fn from_priority(priority: u32) -> Self {
        if priority <= 2 {
            Self::System
        } else {
            Self::User
        }
    }
}

impl fmt::Display for QueueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "Q1"),
            Self::User => write!(f, "Q2"),
        }
    }
}

/// One unit of recorded CPU execution.
///
/// The engine appends one entry per simulated unit, so `end == start + 1`;
/// consecutive entries for the same process are merged by the report layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// The executing process.
    pub pid: ProcessId,
    /// Clock value at which the unit began.
    pub start: u64,
    /// Clock value at which the unit ended.
    pub end: u64,
}

/// Errors reported by the simulation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or out-of-range process fields, rejected before any
    /// simulation state is touched.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Metrics requested over an empty completed-process list.
    #[error("no completed processes to compute metrics over")]
    EmptyInput,

    /// The simulation exceeded its safety bound. Unreachable under correct
    /// scheduling logic; the snapshot of the clock and queues is reported
    /// for diagnosis.
    #[error("scheduling deadlock at time {time} (queue 1: {queue1:?}, queue 2: {queue2:?})")]
    SchedulingDeadlock {
        /// Clock value when the bound was exceeded.
        time: u64,
        /// Processes waiting in queue 1.
        queue1: Vec<ProcessId>,
        /// Processes waiting in queue 2.
        queue2: Vec<ProcessId>,
    },

    /// Metrics derived from a process that has not completed yet.
    #[error("process {0} has not completed; metrics are unavailable")]
    PrematureMetricsRequest(ProcessId),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_queue_classification() {
        assert_eq!(QueueClass::from_priority(1), QueueClass::System);
        assert_eq!(QueueClass::from_priority(2), QueueClass::System);
        assert_eq!(QueueClass::from_priority(3), QueueClass::User);
        assert_eq!(QueueClass::from_priority(5), QueueClass::User);
    }

    #[test]
    fn test_queue_display() {
        assert_eq!(QueueClass::System.to_string(), "Q1");
        assert_eq!(QueueClass::User.to_string(), "Q2");
    }
}
