use std::time::Duration;

/// Read-only view of the current tick, passed to every lifecycle call.
///
/// Time is logical: it advances by exactly one period per tick, starting at
/// zero on the first tick. Commands that wait or time out compare against
/// `now()` instead of the wall clock, so a run is reproducible tick for tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickContext {
    tick: u64,
    period: Duration,
}

impl TickContext {
    pub fn new(tick: u64, period: Duration) -> Self {
        Self { tick, period }
    }

    /// Zero-based tick index
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Fixed control period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Scheduler time at the start of this tick
    pub fn now(&self) -> Duration {
        self.period
            .checked_mul(self.tick.min(u32::MAX as u64) as u32)
            .unwrap_or(Duration::MAX)
    }

    /// Time elapsed since an earlier `now()` reading
    pub fn since(&self, earlier: Duration) -> Duration {
        self.now().saturating_sub(earlier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_clock() {
        let ctx = TickContext::new(50, Duration::from_millis(20));
        assert_eq!(ctx.now(), Duration::from_secs(1));
        assert_eq!(ctx.since(Duration::from_millis(400)), Duration::from_millis(600));
        assert_eq!(ctx.since(Duration::from_secs(5)), Duration::ZERO);
    }
}
