use std::time::Duration;

/// Fixed-period timer driven by an external clock.
///
/// Fires at most once per poll. When polls fall behind by several periods
/// the missed ones are dropped and the phase is kept.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next_due: Duration,
    fired: u64,
}

impl Ticker {
    /// First firing one period after `start`.
    pub fn new(period: Duration, start: Duration) -> Self {
        let period = period.max(Duration::from_micros(1));
        Self {
            period,
            next_due: start + period,
            fired: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_due(&self) -> Duration {
        self.next_due
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn poll(&mut self, now: Duration) -> bool {
        if now < self.next_due {
            return false;
        }
        let behind = (now - self.next_due).as_nanos() / self.period.as_nanos();
        let skipped = behind as u32;
        if skipped > 0 {
            tracing::trace!(skipped, "ticker skipped periods");
        }
        self.next_due += self.period * (skipped + 1);
        self.fired += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fires_once_per_period() {
        let mut t = Ticker::new(ms(100), Duration::ZERO);
        assert!(!t.poll(ms(50)));
        assert!(t.poll(ms(100)));
        assert!(!t.poll(ms(150)));
        assert!(t.poll(ms(210)));
        assert_eq!(t.next_due(), ms(300));
        assert_eq!(t.fired(), 2);
    }

    #[test]
    fn missed_periods_are_skipped() {
        let mut t = Ticker::new(ms(100), Duration::ZERO);
        assert!(t.poll(ms(1050)));
        assert_eq!(t.next_due(), ms(1100));
        assert!(!t.poll(ms(1060)));
        assert_eq!(t.fired(), 1);
    }
}
