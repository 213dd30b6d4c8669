/// Start point of a millisecond interval on a wrapping `u32` tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickTimer {
    start: u32,
}

impl TickTimer {
    pub const fn new(now: u32) -> Self {
        Self { start: now }
    }

    pub fn restart(&mut self, now: u32) {
        self.start = now;
    }

    pub fn elapsed(&self, now: u32) -> u32 {
        now.wrapping_sub(self.start)
    }

    /// Returns true once `timeout` ms have passed and restarts the interval at
    /// `now`, so the next call measures a fresh window.
    pub fn expired(&mut self, now: u32, timeout: u32) -> bool {
        if self.elapsed(now) >= timeout {
            self.start = now;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_and_restarts() {
        let mut timer = TickTimer::new(1_000);
        assert!(!timer.expired(1_999, 1_000));
        assert!(timer.expired(2_000, 1_000));
        assert!(!timer.expired(2_500, 1_000));
        assert!(timer.expired(3_000, 1_000));
    }

    #[test]
    fn survives_tick_wraparound() {
        let mut timer = TickTimer::new(u32::MAX - 99);
        assert_eq!(timer.elapsed(100), 200);
        assert!(!timer.expired(50, 200));
        assert!(timer.expired(100, 200));
    }
}
