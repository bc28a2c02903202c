//! Scan rate limiter
//!
//! Leading-edge throttle with a trailing run: a trigger inside the interval
//! replaces any earlier pending run with one due at the interval boundary.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    enabled: bool,
    last_run: Option<Instant>,
    pending: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration, enabled: bool) -> Self {
        Self {
            interval,
            enabled,
            last_run: None,
            pending: None,
        }
    }

    /// Request a run. Returns `true` if it should happen now.
    pub fn trigger(&mut self, now: Instant, ignore_throttle: bool) -> bool {
        self.pending = None;

        let due = match self.last_run {
            Some(last) => now.saturating_duration_since(last) > self.interval,
            None => true,
        };

        if due || !self.enabled || ignore_throttle {
            self.last_run = Some(now);
            return true;
        }

        let at = self.last_run.map_or(now, |last| last + self.interval);
        tracing::trace!("scan throttled for {:?}", at.saturating_duration_since(now));
        self.pending = Some(at);
        false
    }

    /// Fire the trailing run once its time has come.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(at) if now >= at => {
                self.pending = None;
                self.last_run = Some(now);
                true
            }
            _ => false,
        }
    }

    pub fn pending_at(&self) -> Option<Instant> {
        self.pending
    }

    /// Forget a scheduled trailing run
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_trigger_runs() {
        let mut throttle = Throttle::new(ms(250), true);
        assert!(throttle.trigger(Instant::now(), false));
    }

    #[test]
    fn test_burst_collapses_to_boundary_run() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(ms(250), true);
        assert!(throttle.trigger(t0, true));

        assert!(!throttle.trigger(t0 + ms(10), false));
        assert!(!throttle.trigger(t0 + ms(60), false));
        assert_eq!(throttle.pending_at(), Some(t0 + ms(250)));

        assert!(!throttle.poll(t0 + ms(249)));
        assert!(throttle.poll(t0 + ms(250)));
        assert!(!throttle.poll(t0 + ms(500)));
    }

    #[test]
    fn test_ignore_and_disabled_bypass() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(ms(250), true);
        throttle.trigger(t0, false);
        assert!(throttle.trigger(t0 + ms(1), true));

        let mut off = Throttle::new(ms(250), false);
        off.trigger(t0, false);
        assert!(off.trigger(t0 + ms(1), false));
    }

    #[test]
    fn test_immediate_run_clears_pending() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(ms(250), true);
        throttle.trigger(t0, false);
        throttle.trigger(t0 + ms(50), false);
        assert!(throttle.trigger(t0 + ms(60), true));
        assert_eq!(throttle.pending_at(), None);
    }
}
