use serde::{Deserialize, Serialize};

use crate::{Error, ProcessId, QueueClass};

/// A single simulated process.
///
/// Static identity and timing inputs are fixed at construction; the
/// execution state (`remaining_time`, first-dispatch and completion stamps)
/// is mutated only by the scheduler. Once the scheduler moves a process to
/// the completed list it is never mutated again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pid: ProcessId,
    arrival_time: u64,
    burst_time: u64,
    priority: u32,
    queue: QueueClass,
    remaining_time: u64,
    started: Option<u64>,
    completed: Option<u64>,
}

impl Process {
    /// Constructs a process and derives its queue assignment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `arrival_time` is negative,
    /// `burst_time` is not positive, or `priority` is below 1.
    pub fn new(
        pid: impl Into<ProcessId>,
        arrival_time: i64,
        burst_time: i64,
        priority: i64,
    ) -> Result<Self, Error> {
        let pid = pid.into();
        let arrival_time = u64::try_from(arrival_time)
            .map_err(|_| Error::InvalidInput(format!("{pid}: arrival time must be >= 0")))?;
        if burst_time <= 0 {
            return Err(Error::InvalidInput(format!(
                "{pid}: burst time must be positive"
            )));
        }
        if priority < 1 {
            return Err(Error::InvalidInput(format!(
                "{pid}: priority must be at least 1"
            )));
        }
        let burst_time = u64::try_from(burst_time)
            .map_err(|_| Error::InvalidInput(format!("{pid}: burst time out of range")))?;
        let priority = u32::try_from(priority)
            .map_err(|_| Error::InvalidInput(format!("{pid}: priority out of range")))?;
        Ok(Self {
            pid,
            arrival_time,
            burst_time,
            priority,
            queue: QueueClass::from_priority(priority),
            remaining_time: burst_time,
            started: None,
            completed: None,
        })
    }

    /// The process ID.
    #[must_use]
    pub fn pid(&self) -> &ProcessId {
        &self.pid
    }

    /// When the process arrives in its ready queue.
    #[must_use]
    pub fn arrival_time(&self) -> u64 {
        self.arrival_time
    }

    /// Total CPU time the process requires.
    #[must_use]
    pub fn burst_time(&self) -> u64 {
        self.burst_time
    }

    /// Priority level; 1 is the highest.
    #[must_use]
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// The queue the process is assigned to.
    #[must_use]
    pub fn queue(&self) -> QueueClass {
        self.queue
    }

    /// CPU time still required.
    #[must_use]
    pub fn remaining_time(&self) -> u64 {
        self.remaining_time
    }

    /// The time of the first CPU grant, if any.
    #[must_use]
    pub fn started(&self) -> Option<u64> {
        self.started
    }

    /// The completion stamp, if the process has finished.
    #[must_use]
    pub fn completed_at(&self) -> Option<u64> {
        self.completed
    }

    /// Whether the process has exhausted its burst time.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.remaining_time == 0
    }

    /// Consumes up to `units` of remaining time and returns the units
    /// actually consumed. No-op once done.
    pub(crate) fn advance(&mut self, units: u64) -> u64 {
        let consumed = units.min(self.remaining_time);
        self.remaining_time -= consumed;
        consumed
    }

    /// Stamps the first CPU grant. Idempotent, so response time always
    /// reflects the first grant even across preemptions.
    pub(crate) fn record_first_dispatch(&mut self, time: u64) {
        if self.started.is_none() {
            self.started = Some(time);
        }
    }

    /// Stamps the completion time. Set at most once.
    pub(crate) fn complete(&mut self, time: u64) {
        debug_assert!(self.is_done());
        debug_assert!(time >= self.arrival_time);
        if self.completed.is_none() {
            self.completed = Some(time);
        }
    }

    /// Derives the per-process metrics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PrematureMetricsRequest`] before the process has
    /// completed.
    pub fn metrics(&self) -> Result<ProcessMetrics, Error> {
        let (Some(completed), Some(started)) = (self.completed, self.started) else {
            return Err(Error::PrematureMetricsRequest(self.pid.clone()));
        };
        let turnaround = completed - self.arrival_time;
        Ok(ProcessMetrics {
            pid: self.pid.clone(),
            arrival_time: self.arrival_time,
            burst_time: self.burst_time,
            priority: self.priority,
            queue: self.queue,
            completion: completed,
            turnaround,
            waiting: turnaround - self.burst_time,
            response: started - self.arrival_time,
        })
    }
}

/// Metrics of a single completed process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMetrics {
    /// The process ID.
    pub pid: ProcessId,
    /// Arrival time (AT).
    pub arrival_time: u64,
    /// Burst time (BT).
    pub burst_time: u64,
    /// Priority level.
    pub priority: u32,
    /// Assigned queue.
    pub queue: QueueClass,
    /// Completion time (CT).
    pub completion: u64,
    /// Turnaround time, `CT - AT`.
    pub turnaround: u64,
    /// Waiting time, `TAT - BT`.
    pub waiting: u64,
    /// Response time, first CPU grant minus arrival.
    pub response: u64,
}
