use std::time::{Duration, Instant};

/// A single re-armable deadline.
///
/// At most one tick is pending at any time: arming replaces the pending
/// deadline instead of adding a second one.
#[derive(Clone, Debug)]
pub struct Schedule {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Schedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Schedules the next tick one interval after `now`, returning the deadline it replaced.
    /// Nothing is armed if that instant cannot be represented.
    pub fn arm(&mut self, now: Instant) -> Option<Instant> {
        std::mem::replace(&mut self.deadline, now.checked_add(self.interval))
    }

    /// Cancels the pending tick, if any
    pub fn cancel(&mut self) -> Option<Instant> {
        self.deadline.take()
    }

    /// Changes the interval; a pending tick is re-armed with the new period
    pub fn set_interval(&mut self, interval: Duration, now: Instant) -> Option<Instant> {
        self.interval = interval;
        if self.is_armed() {
            self.arm(now)
        } else {
            None
        }
    }

    /// Consumes the pending tick if it is due at `now`
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_and_fire() {
        let now = Instant::now();
        let mut schedule = Schedule::new(Duration::from_secs(30));
        assert!(!schedule.fire(now + Duration::from_secs(60)));

        assert_eq!(schedule.arm(now), None);
        assert_eq!(schedule.deadline(), Some(now + Duration::from_secs(30)));
        assert!(!schedule.fire(now + Duration::from_secs(29)));
        assert!(schedule.fire(now + Duration::from_secs(30)));
        assert!(!schedule.is_armed());
        assert!(!schedule.fire(now + Duration::from_secs(31)));
    }

    #[test]
    fn test_interval_change_replaces_pending_tick() {
        let start = Instant::now();
        let mut schedule = Schedule::new(Duration::from_secs(30));
        schedule.arm(start);

        let now = start + Duration::from_secs(10);
        let cancelled = schedule.set_interval(Duration::from_secs(5), now);

        // Exactly one pending tick was cancelled and exactly one armed
        assert_eq!(cancelled, Some(start + Duration::from_secs(30)));
        assert_eq!(schedule.deadline(), Some(now + Duration::from_secs(5)));
        assert!(schedule.fire(now + Duration::from_secs(5)));
        assert!(!schedule.fire(start + Duration::from_secs(30)));
    }

    #[test]
    fn test_interval_change_while_idle() {
        let now = Instant::now();
        let mut schedule = Schedule::new(Duration::from_secs(30));

        assert_eq!(schedule.set_interval(Duration::from_secs(60), now), None);
        assert!(!schedule.is_armed());
        assert_eq!(schedule.interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_unrepresentable_deadline() {
        let now = Instant::now();
        let mut schedule = Schedule::new(Duration::MAX);

        assert_eq!(schedule.arm(now), None);
        assert!(!schedule.is_armed());
        assert_eq!(schedule.set_interval(Duration::MAX, now), None);
    }

    #[test]
    fn test_cancel() {
        let now = Instant::now();
        let mut schedule = Schedule::new(Duration::from_secs(1));
        schedule.arm(now);

        assert!(schedule.cancel().is_some());
        assert!(schedule.cancel().is_none());
        assert!(!schedule.fire(now + Duration::from_secs(2)));
    }
}
