use crate::{ProcessId, QueueClass};

/// Receives scheduling events as pure notifications.
///
/// The engine calls these hooks at every decision point; implementations
/// must not influence scheduling. All methods default to no-ops, so an
/// observer only implements the hooks it cares about.
pub trait Observer {
    /// A process was admitted to its ready queue.
    fn on_arrival(&mut self, time: u64, pid: &ProcessId, queue: QueueClass) {
        let _ = (time, pid, queue);
    }

    /// A process was granted the CPU for one unit. `first` is set on the
    /// very first grant of the process's lifetime.
    fn on_dispatch(&mut self, time: u64, pid: &ProcessId, first: bool) {
        let _ = (time, pid, first);
    }

    /// The running process lost the CPU to `by` before finishing.
    fn on_preempt(&mut self, time: u64, preempted: &ProcessId, by: &ProcessId) {
        let _ = (time, preempted, by);
    }

    /// A process exhausted its burst time.
    fn on_complete(&mut self, time: u64, pid: &ProcessId) {
        let _ = (time, pid);
    }

    /// The CPU had no eligible process and the clock jumped to the next
    /// pending arrival.
    fn on_idle(&mut self, from: u64, until: u64) {
        let _ = (from, until);
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {}

/// A single recorded scheduling event. See [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Admission to a ready queue.
    Arrival {
        /// Admission time.
        time: u64,
        /// The admitted process.
        pid: ProcessId,
        /// The queue it joined.
        queue: QueueClass,
    },
    /// A one-unit CPU grant.
    Dispatch {
        /// Grant time.
        time: u64,
        /// The dispatched process.
        pid: ProcessId,
        /// Whether this was the first grant ever.
        first: bool,
    },
    /// Loss of the CPU before completion.
    Preempt {
        /// Preemption time.
        time: u64,
        /// The process that lost the CPU.
        preempted: ProcessId,
        /// The process that took it.
        by: ProcessId,
    },
    /// Completion of a process.
    Complete {
        /// Completion time.
        time: u64,
        /// The completed process.
        pid: ProcessId,
    },
    /// An idle span with no trace entries.
    Idle {
        /// Clock value before the jump.
        from: u64,
        /// Clock value after the jump.
        until: u64,
    },
}

/// Observer that records the full event sequence, used by tests to assert
/// on scheduling decisions instead of parsing log output.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Vec<SchedulerEvent>,
}

impl RecordingObserver {
    /// The recorded events in emission order.
    #[must_use]
    pub fn events(&self) -> &[SchedulerEvent] {
        &self.events
    }

    /// Consumes the observer, yielding the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<SchedulerEvent> {
        self.events
    }
}

impl Observer for RecordingObserver {
    fn on_arrival(&mut self, time: u64, pid: &ProcessId, queue: QueueClass) {
        self.events.push(SchedulerEvent::Arrival {
            time,
            pid: pid.clone(),
            queue,
        });
    }

    fn on_dispatch(&mut self, time: u64, pid: &ProcessId, first: bool) {
        self.events.push(SchedulerEvent::Dispatch {
            time,
            pid: pid.clone(),
            first,
        });
    }

    fn on_preempt(&mut self, time: u64, preempted: &ProcessId, by: &ProcessId) {
        self.events.push(SchedulerEvent::Preempt {
            time,
            preempted: preempted.clone(),
            by: by.clone(),
        });
    }

    fn on_complete(&mut self, time: u64, pid: &ProcessId) {
        self.events.push(SchedulerEvent::Complete {
            time,
            pid: pid.clone(),
        });
    }

    fn on_idle(&mut self, from: u64, until: u64) {
        self.events.push(SchedulerEvent::Idle { from, until });
    }
}
