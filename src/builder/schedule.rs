//! Cooperative, deadline-based timer for templating ticks

use std::time::{Duration, Instant};

/// A single re-armable deadline
///
/// Nothing runs on its own: the host loop asks [`Schedule::due`] and fires the
/// tick itself. Arming always replaces the previous deadline, so at most one
/// tick is ever pending and missed ticks are never queued.
#[derive(Debug, Clone)]
pub struct Schedule {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Schedule {
    /// Create a disarmed schedule
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start a fresh period at `now`
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// Drop the pending tick, if any
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the pending tick should fire at `now`
    pub fn due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(500);

    #[test]
    fn test_new_is_disarmed() {
        let schedule = Schedule::new(PERIOD);
        assert!(!schedule.is_armed());
        assert!(!schedule.due(Instant::now()));
        assert_eq!(schedule.interval(), PERIOD);
    }

    #[test]
    fn test_due_after_interval() {
        let start = Instant::now();
        let mut schedule = Schedule::new(PERIOD);
        schedule.arm(start);
        assert!(!schedule.due(start));
        assert!(!schedule.due(start + Duration::from_millis(499)));
        assert!(schedule.due(start + PERIOD));
        assert!(schedule.due(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_cancel_drops_pending_tick() {
        let start = Instant::now();
        let mut schedule = Schedule::new(PERIOD);
        schedule.arm(start);
        schedule.cancel();
        assert!(!schedule.due(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_rearm_replaces_deadline() {
        let start = Instant::now();
        let mut schedule = Schedule::new(PERIOD);
        schedule.arm(start);
        schedule.arm(start + Duration::from_millis(300));
        assert_eq!(schedule.deadline(), Some(start + Duration::from_millis(800)));
        assert!(!schedule.due(start + PERIOD));
    }
}
