//! Simulation clock, owned by the scheduler and lent to each phase

use serde::{Deserialize, Serialize};

use crate::core::types::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    /// Index of the tick currently being processed
    pub tick: Tick,
    /// Wall-clock length of one tick
    pub interval_ms: u64,
}

impl SimClock {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            tick: 0,
            interval_ms,
        }
    }

    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// Simulated milliseconds between `since` and now
    pub fn elapsed_ms_since(&self, since: Tick) -> u64 {
        self.tick.saturating_sub(since).saturating_mul(self.interval_ms)
    }

    pub fn ticks_since(&self, since: Tick) -> Tick {
        self.tick.saturating_sub(since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_ms() {
        let mut clock = SimClock::new(600);
        for _ in 0..4 {
            clock.advance();
        }
        assert_eq!(clock.tick, 4);
        assert_eq!(clock.elapsed_ms_since(0), 2400);
        assert_eq!(clock.elapsed_ms_since(9), 0);
    }
}
