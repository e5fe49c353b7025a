use std::collections::VecDeque;
use std::time::Duration;

/// Rolling frame-time window for the fps readout.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    window: VecDeque<Duration>,
    capacity: usize,
    total: Duration,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            total: Duration::ZERO,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        if self.window.len() == self.capacity {
            if let Some(old) = self.window.pop_front() {
                self.total -= old;
            }
        }
        self.window.push_back(dt);
        self.total += dt;
    }

    pub fn count(&self) -> usize {
        self.window.len()
    }

    pub fn average(&self) -> Duration {
        match self.window.len() {
            0 => Duration::ZERO,
            n => self.total / n as u32,
        }
    }

    pub fn slowest(&self) -> Duration {
        self.window.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    /// Frames per second over the window, 0 before any non-zero frame.
    pub fn fps(&self) -> f32 {
        let avg = self.average().as_secs_f32();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(60)
    }
}

/// Counters kept by the frame driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub packets: u64,
    pub moves_sent: u64,
    pub animation_ticks: u64,
    pub heartbeats: u64,
    pub warnings: u64,
    pub evicted_entities: u64,
    pub evicted_chunks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_over_window() {
        let mut t = FrameTimer::new(3);
        for ms in [10, 20, 30] {
            t.record(Duration::from_millis(ms));
        }
        assert_eq!(t.count(), 3);
        assert_eq!(t.average(), Duration::from_millis(20));
        assert_eq!(t.slowest(), Duration::from_millis(30));
        assert!((t.fps() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn window_slides() {
        let mut t = FrameTimer::new(2);
        for ms in [10, 20, 30] {
            t.record(Duration::from_millis(ms));
        }
        assert_eq!(t.count(), 2);
        assert_eq!(t.average(), Duration::from_millis(25));
    }

    #[test]
    fn empty_timer_reports_zero() {
        let t = FrameTimer::default();
        assert_eq!(t.average(), Duration::ZERO);
        assert_eq!(t.fps(), 0.0);
    }
}
