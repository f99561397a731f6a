use std::collections::{HashSet, VecDeque};

use crate::{Error, NullObserver, Observer, Process, QueueClass, TraceEntry};

/// Extra ticks allowed past the theoretical finish time before the run is
/// declared deadlocked.
const DEADLOCK_MARGIN: u64 = 10;

/// The outcome of a finished simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    completed: Vec<Process>,
    trace: Vec<TraceEntry>,
}

impl Schedule {
    /// The completed processes, in completion order.
    #[must_use]
    pub fn completed(&self) -> &[Process] {
        &self.completed
    }

    /// The execution trace, one entry per simulated unit, in chronological
    /// order.
    #[must_use]
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Decomposes the schedule into its completed list and trace.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Process>, Vec<TraceEntry>) {
        (self.completed, self.trace)
    }
}

/// Multilevel queue scheduler over a fixed process set.
///
/// Queue 1 (system) is re-sorted by `(priority, arrival)` before every
/// dispatch decision; queue 2 (user) keeps strict arrival order and only
/// runs while queue 1 is empty. The running process is held in an explicit
/// slot outside its queue; a preempted user process is reinserted at the
/// *front* of queue 2 so it resumes ahead of later arrivals.
pub struct MlqScheduler {
    pending: Vec<Process>,
    queue1: Vec<Process>,
    queue2: VecDeque<Process>,
    running: Option<Process>,
    completed: Vec<Process>,
    trace: Vec<TraceEntry>,
    clock: u64,
    total: usize,
    horizon: u64,
}

impl MlqScheduler {
    /// Constructs a scheduler over the given processes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if two processes share an ID.
    pub fn new(processes: Vec<Process>) -> Result<Self, Error> {
        let mut seen = HashSet::new();
        for process in &processes {
            if !seen.insert(process.pid().clone()) {
                return Err(Error::InvalidInput(format!(
                    "duplicate process ID `{}`",
                    process.pid()
                )));
            }
        }
        let horizon = processes.iter().map(Process::burst_time).sum::<u64>()
            + processes
                .iter()
                .map(Process::arrival_time)
                .max()
                .unwrap_or(0)
            + DEADLOCK_MARGIN;
        let total = processes.len();
        Ok(Self {
            pending: processes,
            queue1: Vec::new(),
            queue2: VecDeque::new(),
            running: None,
            completed: Vec::new(),
            trace: Vec::new(),
            clock: 0,
            total,
            horizon,
        })
    }

    /// Runs the simulation to completion without an observer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchedulingDeadlock`] if the safety bound is
    /// exceeded; unreachable under correct dispatch logic.
    pub fn run(self) -> Result<Schedule, Error> {
        self.run_with(&mut NullObserver)
    }

    /// Runs the simulation to completion, notifying `observer` at every
    /// decision point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchedulingDeadlock`] if the safety bound is
    /// exceeded; unreachable under correct dispatch logic.
    pub fn run_with(mut self, observer: &mut dyn Observer) -> Result<Schedule, Error> {
        log::debug!(
            "starting MLQ simulation: {} processes, horizon {}",
            self.total,
            self.horizon
        );
        while self.completed.len() < self.total {
            if self.clock > self.horizon {
                return Err(self.deadlock());
            }
            self.admit_arrivals(observer);
            self.check_preemption(observer);
            self.select_next();
            if let Some(mut process) = self.running.take() {
                let start = self.clock;
                let first = process.started().is_none();
                process.record_first_dispatch(start);
                observer.on_dispatch(start, process.pid(), first);
                log::trace!(
                    "time {start}: {} executing (remaining {})",
                    process.pid(),
                    process.remaining_time()
                );
                process.advance(1);
                self.clock += 1;
                self.trace.push(TraceEntry {
                    pid: process.pid().clone(),
                    start,
                    end: self.clock,
                });
                if process.is_done() {
                    process.complete(self.clock);
                    log::debug!("time {}: {} completed", self.clock, process.pid());
                    observer.on_complete(self.clock, process.pid());
                    self.completed.push(process);
                } else {
                    self.running = Some(process);
                }
            } else {
                self.idle_jump(observer)?;
            }
        }
        Ok(Schedule {
            completed: self.completed,
            trace: self.trace,
        })
    }

    /// Admits every pending process whose arrival time equals the current
    /// clock, in input order, before any dispatch decision at this instant.
    fn admit_arrivals(&mut self, observer: &mut dyn Observer) {
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].arrival_time() == self.clock {
                let process = self.pending.remove(index);
                log::debug!(
                    "time {}: {} arrived, assigned to {}",
                    self.clock,
                    process.pid(),
                    process.queue()
                );
                observer.on_arrival(self.clock, process.pid(), process.queue());
                match process.queue() {
                    QueueClass::System => self.queue1.push(process),
                    QueueClass::User => self.queue2.push_back(process),
                }
            } else {
                index += 1;
            }
        }
    }

    /// Evicts the running process if queue 1 holds a stronger candidate.
    ///
    /// A running user process loses the CPU to any queue-1 process; a
    /// running system process only to a strictly smaller priority value.
    fn check_preemption(&mut self, observer: &mut dyn Observer) {
        let Some(current) = self.running.take() else {
            return;
        };
        if self.queue1.is_empty() {
            self.running = Some(current);
            return;
        }
        self.sort_queue1();
        match current.queue() {
            QueueClass::User => {
                let by = self.queue1[0].pid().clone();
                log::debug!(
                    "time {}: {} preempted by queue 1 process {by}",
                    self.clock,
                    current.pid()
                );
                observer.on_preempt(self.clock, current.pid(), &by);
                // Front, not back: the preempted job keeps its FCFS position
                // over later queue-2 arrivals.
                self.queue2.push_front(current);
            }
            QueueClass::System => {
                if self.queue1[0].priority() < current.priority() {
                    let by = self.queue1[0].pid().clone();
                    log::debug!(
                        "time {}: {} preempted by higher priority {by}",
                        self.clock,
                        current.pid()
                    );
                    observer.on_preempt(self.clock, current.pid(), &by);
                    self.queue1.push(current);
                    self.sort_queue1();
                } else {
                    self.running = Some(current);
                }
            }
        }
    }

    /// Fills the running slot per the static queue-1-over-queue-2 rule.
    fn select_next(&mut self) {
        if self.running.is_some() {
            return;
        }
        if self.queue1.is_empty() {
            self.running = self.queue2.pop_front();
        } else {
            self.sort_queue1();
            self.running = Some(self.queue1.remove(0));
        }
    }

    fn sort_queue1(&mut self) {
        self.queue1
            .sort_by_key(|p| (p.priority(), p.arrival_time()));
    }

    /// Jumps the clock to the next pending arrival. Produces no trace
    /// entries and must only be reached with both queues empty.
    fn idle_jump(&mut self, observer: &mut dyn Observer) -> Result<(), Error> {
        debug_assert!(self.queue1.is_empty() && self.queue2.is_empty());
        let next = self
            .pending
            .iter()
            .map(Process::arrival_time)
            .min()
            .ok_or_else(|| self.deadlock())?;
        debug_assert!(next > self.clock);
        log::debug!("time {}: cpu idle, next arrival at {next}", self.clock);
        observer.on_idle(self.clock, next);
        self.clock = next;
        Ok(())
    }

    fn deadlock(&self) -> Error {
        Error::SchedulingDeadlock {
            time: self.clock,
            queue1: self.queue1.iter().map(|p| p.pid().clone()).collect(),
            queue2: self.queue2.iter().map(|p| p.pid().clone()).collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{workload, RecordingObserver, SchedulerEvent};

    use quickcheck_macros::quickcheck;
    use rstest::rstest;

    fn proc(pid: &str, arrival: i64, burst: i64, priority: i64) -> Process {
        Process::new(pid, arrival, burst, priority).unwrap()
    }

    fn run(processes: Vec<Process>) -> Schedule {
        MlqScheduler::new(processes).unwrap().run().unwrap()
    }

    fn completion(schedule: &Schedule, pid: &str) -> u64 {
        schedule
            .completed()
            .iter()
            .find(|p| p.pid().as_str() == pid)
            .unwrap()
            .completed_at()
            .unwrap()
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let processes = vec![proc("A", 0, 1, 1), proc("A", 1, 1, 1)];
        assert!(matches!(
            MlqScheduler::new(processes),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_single_process_runs_uninterrupted() {
        // Scenario: one user process alone on the CPU.
        let schedule = run(vec![proc("A", 0, 5, 3)]);
        assert_eq!(
            schedule.trace(),
            (0..5)
                .map(|t| TraceEntry {
                    pid: "A".into(),
                    start: t,
                    end: t + 1,
                })
                .collect::<Vec<_>>()
        );
        let metrics = schedule.completed()[0].metrics().unwrap();
        assert_eq!(metrics.completion, 5);
        assert_eq!(metrics.turnaround, 5);
        assert_eq!(metrics.waiting, 0);
        assert_eq!(metrics.response, 0);
    }

    #[test]
    fn test_equal_or_lower_priority_does_not_preempt_queue1() {
        // Priority 2 arriving at t=1 must not preempt running priority 1.
        let schedule = run(vec![proc("A", 0, 4, 1), proc("B", 1, 2, 2)]);
        assert_eq!(completion(&schedule, "A"), 4);
        assert_eq!(completion(&schedule, "B"), 6);
    }

    #[test]
    fn test_higher_priority_preempts_queue1() {
        let schedule = run(vec![proc("A", 0, 4, 2), proc("B", 1, 2, 1)]);
        // A runs [0,1), B runs [1,3), A resumes [3,6).
        assert_eq!(completion(&schedule, "B"), 3);
        assert_eq!(completion(&schedule, "A"), 6);
    }

    #[test]
    fn test_queue1_arrival_preempts_running_user_process() {
        let schedule = run(vec![proc("U", 0, 3, 3), proc("S", 1, 1, 1)]);
        assert_eq!(
            schedule.trace(),
            vec![
                TraceEntry {
                    pid: "U".into(),
                    start: 0,
                    end: 1,
                },
                TraceEntry {
                    pid: "S".into(),
                    start: 1,
                    end: 2,
                },
                TraceEntry {
                    pid: "U".into(),
                    start: 2,
                    end: 3,
                },
                TraceEntry {
                    pid: "U".into(),
                    start: 3,
                    end: 4,
                },
            ]
        );
        assert_eq!(completion(&schedule, "S"), 2);
        assert_eq!(completion(&schedule, "U"), 4);
        // The preemption must not disturb the first-dispatch stamp.
        let user = &schedule
            .completed()
            .iter()
            .find(|p| p.pid().as_str() == "U")
            .unwrap();
        assert_eq!(user.started(), Some(0));
    }

    #[test]
    fn test_preempted_user_process_resumes_before_later_arrivals() {
        // U1 is preempted by S while U2 waits behind it; the front
        // reinsertion keeps U1 ahead of U2.
        let schedule = run(vec![
            proc("U1", 0, 3, 3),
            proc("U2", 1, 2, 4),
            proc("S", 2, 1, 1),
        ]);
        // U1 [0,2), S [2,3), U1 [3,4), U2 [4,6).
        assert_eq!(completion(&schedule, "S"), 3);
        assert_eq!(completion(&schedule, "U1"), 4);
        assert_eq!(completion(&schedule, "U2"), 6);
    }

    #[test]
    fn test_idle_gap_jumps_clock_without_trace() {
        let schedule = run(vec![proc("Z", 5, 1, 5)]);
        assert_eq!(
            schedule.trace(),
            vec![TraceEntry {
                pid: "Z".into(),
                start: 5,
                end: 6,
            }]
        );
        assert_eq!(completion(&schedule, "Z"), 6);
    }

    #[test]
    fn test_observer_sees_preemption_sequence() {
        let processes = vec![proc("U", 0, 3, 3), proc("S", 1, 1, 1)];
        let mut observer = RecordingObserver::default();
        MlqScheduler::new(processes)
            .unwrap()
            .run_with(&mut observer)
            .unwrap();
        assert_eq!(
            observer.into_events(),
            vec![
                SchedulerEvent::Arrival {
                    time: 0,
                    pid: "U".into(),
                    queue: QueueClass::User,
                },
                SchedulerEvent::Dispatch {
                    time: 0,
                    pid: "U".into(),
                    first: true,
                },
                SchedulerEvent::Arrival {
                    time: 1,
                    pid: "S".into(),
                    queue: QueueClass::System,
                },
                SchedulerEvent::Preempt {
                    time: 1,
                    preempted: "U".into(),
                    by: "S".into(),
                },
                SchedulerEvent::Dispatch {
                    time: 1,
                    pid: "S".into(),
                    first: true,
                },
                SchedulerEvent::Complete {
                    time: 2,
                    pid: "S".into(),
                },
                SchedulerEvent::Dispatch {
                    time: 2,
                    pid: "U".into(),
                    first: false,
                },
                SchedulerEvent::Dispatch {
                    time: 3,
                    pid: "U".into(),
                    first: false,
                },
                SchedulerEvent::Complete {
                    time: 4,
                    pid: "U".into(),
                },
            ]
        );
    }

    #[test]
    fn test_observer_sees_idle_jump() {
        let mut observer = RecordingObserver::default();
        MlqScheduler::new(vec![proc("Z", 5, 1, 5)])
            .unwrap()
            .run_with(&mut observer)
            .unwrap();
        assert_eq!(
            observer.events()[0],
            SchedulerEvent::Idle { from: 0, until: 5 }
        );
    }

    #[test]
    fn test_reference_workload_schedule() {
        let schedule = run(workload::default_workload());
        let merged = crate::report::merge_trace(schedule.trace());
        let spans: Vec<(&str, u64, u64)> = merged
            .iter()
            .map(|s| (s.pid.as_str(), s.start, s.end))
            .collect();
        assert_eq!(
            spans,
            vec![
                ("P1", 0, 2),
                ("P2", 2, 7),
                ("P4", 7, 15),
                ("P1", 15, 23),
                ("P3", 23, 26),
                ("P5", 26, 27),
            ]
        );
        // Completion order matches retirement order.
        let order: Vec<&str> = schedule
            .completed()
            .iter()
            .map(|p| p.pid().as_str())
            .collect();
        assert_eq!(order, vec!["P2", "P4", "P1", "P3", "P5"]);
        assert_eq!(completion(&schedule, "P1"), 23);
        assert_eq!(completion(&schedule, "P2"), 7);
        assert_eq!(completion(&schedule, "P3"), 26);
        assert_eq!(completion(&schedule, "P4"), 15);
        assert_eq!(completion(&schedule, "P5"), 27);
    }

    #[rstest]
    #[case(vec![proc("A", 0, 5, 3)])]
    #[case(vec![proc("A", 0, 4, 1), proc("B", 1, 2, 2)])]
    #[case(workload::default_workload())]
    fn test_runs_are_deterministic(#[case] processes: Vec<Process>) {
        let first = run(processes.clone());
        let second = run(processes);
        assert_eq!(first, second);
    }

    /// Builds a valid workload from raw fuzz input.
    fn arbitrary_workload(raw: &[(u8, u8, u8)]) -> Vec<Process> {
        raw.iter()
            .enumerate()
            .map(|(index, &(arrival, burst, priority))| {
                proc(
                    &format!("P{index}"),
                    i64::from(arrival % 16),
                    i64::from(burst % 8) + 1,
                    i64::from(priority % 5) + 1,
                )
            })
            .collect()
    }

    #[quickcheck]
    fn every_process_completes_exactly_once(raw: Vec<(u8, u8, u8)>) -> bool {
        let processes = arbitrary_workload(&raw);
        let total = processes.len();
        let schedule = run(processes);
        let mut pids: Vec<_> = schedule
            .completed()
            .iter()
            .map(|p| p.pid().clone())
            .collect();
        pids.sort();
        pids.dedup();
        schedule.completed().len() == total && pids.len() == total
    }

    #[quickcheck]
    fn trace_time_per_process_equals_burst(raw: Vec<(u8, u8, u8)>) -> bool {
        let processes = arbitrary_workload(&raw);
        let schedule = run(processes);
        schedule.completed().iter().all(|process| {
            let executed: u64 = schedule
                .trace()
                .iter()
                .filter(|e| e.pid == *process.pid())
                .map(|e| e.end - e.start)
                .sum();
            executed == process.burst_time()
        })
    }

    #[quickcheck]
    fn response_and_waiting_are_non_negative(raw: Vec<(u8, u8, u8)>) -> bool {
        let processes = arbitrary_workload(&raw);
        let schedule = run(processes);
        schedule.completed().iter().all(|process| {
            let started = process.started().unwrap();
            let completed = process.completed_at().unwrap();
            started >= process.arrival_time()
                && completed - process.arrival_time() >= process.burst_time()
        })
    }

    #[quickcheck]
    fn user_process_never_runs_while_system_process_waits(raw: Vec<(u8, u8, u8)>) -> bool {
        let processes = arbitrary_workload(&raw);
        let system: Vec<Process> = processes
            .iter()
            .filter(|p| p.queue() == QueueClass::System)
            .cloned()
            .collect();
        let schedule = run(processes.clone());
        let user_entries = schedule.trace().iter().filter(|entry| {
            processes
                .iter()
                .any(|p| p.pid() == &entry.pid && p.queue() == QueueClass::User)
        });
        for entry in user_entries {
            for process in &system {
                let arrived = process.arrival_time() <= entry.start;
                let executed: u64 = schedule
                    .trace()
                    .iter()
                    .filter(|e| e.pid == *process.pid() && e.end <= entry.start)
                    .map(|e| e.end - e.start)
                    .sum();
                let finished = executed == process.burst_time();
                if arrived && !finished {
                    return false;
                }
            }
        }
        true
    }

    #[quickcheck]
    fn trace_is_chronological(raw: Vec<(u8, u8, u8)>) -> bool {
        let schedule = run(arbitrary_workload(&raw));
        schedule
            .trace()
            .windows(2)
            .all(|w| w[0].end <= w[1].start)
            && schedule.trace().iter().all(|e| e.end == e.start + 1)
    }
}
