use std::time::{Duration, Instant};

use crate::hal::Clock;

/// Wall clock counting from construction, like the board's `millis()`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn delay_ms(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_moves_clock_forward() {
        let clock = SystemClock::new();
        let before = clock.millis();
        clock.delay_ms(5);
        assert!(clock.millis() >= before + 5);
    }
}
