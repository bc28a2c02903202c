//! Execution Queue
//!
//! Cooperative FIFO that defers work out of the call stack that produced
//! it. At most one rescan task is pending at a time; further rescan
//! requests are folded into it. The owner drains one task per interval.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Work item that can absorb a later duplicate of itself.
pub trait QueueTask {
    /// Merge a later rescan request into this pending one.
    fn absorb(&mut self, later: Self)
    where
        Self: Sized,
    {
        let _ = later;
    }
}

/// What happened to an enqueued task
#[derive(Debug, PartialEq, Eq)]
pub enum Enqueued<T> {
    /// Will run on a later drain
    Deferred,
    /// Merged into the pending rescan
    Coalesced,
    /// Queueing is disabled; the caller runs it now
    Immediate(T),
}

#[derive(Debug)]
pub struct ExecutionQueue<T> {
    tasks: VecDeque<(T, bool)>,
    rescan_pending: bool,
    enabled: bool,
    interval: Duration,
    next_run: Option<Instant>,
}

impl<T: QueueTask> ExecutionQueue<T> {
    pub fn new(enabled: bool, interval: Duration) -> Self {
        Self {
            tasks: VecDeque::new(),
            rescan_pending: false,
            enabled,
            interval,
            next_run: None,
        }
    }

    pub fn enqueue(&mut self, task: T, rescan: bool) -> Enqueued<T> {
        if !self.enabled {
            return Enqueued::Immediate(task);
        }

        if rescan && self.rescan_pending {
            if let Some((pending, _)) = self.tasks.iter_mut().find(|(_, is_rescan)| *is_rescan) {
                pending.absorb(task);
            }
            tracing::trace!("rescan coalesced into pending task");
            return Enqueued::Coalesced;
        }

        self.rescan_pending |= rescan;
        self.tasks.push_back((task, rescan));
        Enqueued::Deferred
    }

    /// Release the front task if the drain interval has elapsed.
    pub fn pop_due(&mut self, now: Instant) -> Option<T> {
        if self.next_run.is_some_and(|at| now < at) {
            return None;
        }
        let (task, rescan) = self.tasks.pop_front()?;
        if rescan {
            self.rescan_pending = false;
        }
        self.next_run = Some(now + self.interval);
        Some(task)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_pending_rescan(&self) -> bool {
        self.rescan_pending
    }

    /// Drop every pending task
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.rescan_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Job {
        Scan { force: bool },
        Note(u32),
    }

    impl QueueTask for Job {
        fn absorb(&mut self, later: Self) {
            if let (Job::Scan { force }, Job::Scan { force: later_force }) = (self, later) {
                *force |= later_force;
            }
        }
    }

    const TICK: Duration = Duration::from_millis(1);

    #[test]
    fn test_fifo_one_per_interval() {
        let mut queue = ExecutionQueue::new(true, TICK);
        let t0 = Instant::now();
        queue.enqueue(Job::Note(1), false);
        queue.enqueue(Job::Note(2), false);

        assert_eq!(queue.pop_due(t0), Some(Job::Note(1)));
        assert_eq!(queue.pop_due(t0), None);
        assert_eq!(queue.pop_due(t0 + TICK), Some(Job::Note(2)));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_rescan_coalesces_and_keeps_force() {
        let mut queue = ExecutionQueue::new(true, TICK);
        let t0 = Instant::now();

        assert_eq!(queue.enqueue(Job::Scan { force: false }, true), Enqueued::Deferred);
        assert_eq!(queue.enqueue(Job::Note(7), false), Enqueued::Deferred);
        assert_eq!(queue.enqueue(Job::Scan { force: true }, true), Enqueued::Coalesced);
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.pop_due(t0), Some(Job::Scan { force: true }));
        assert!(!queue.has_pending_rescan());

        // a new rescan may be queued once the previous one ran
        assert_eq!(queue.enqueue(Job::Scan { force: false }, true), Enqueued::Deferred);
    }

    #[test]
    fn test_disabled_queue_runs_immediately() {
        let mut queue = ExecutionQueue::new(false, TICK);
        assert_eq!(queue.enqueue(Job::Note(3), false), Enqueued::Immediate(Job::Note(3)));
        assert_eq!(queue.enqueue(Job::Scan { force: false }, true), Enqueued::Immediate(Job::Scan { force: false }));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut queue = ExecutionQueue::new(true, TICK);
        queue.enqueue(Job::Scan { force: false }, true);
        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.has_pending_rescan());
    }
}
