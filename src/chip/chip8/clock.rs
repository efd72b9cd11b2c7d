use std::time::Duration;

use crate::chip::chip8::constants::CHIP8_TIMER_HZ;

/// Paces a host loop: tells how long one instruction takes at the configured
/// rate and when the 60 Hz refresh (timer tick and frame presentation) is due.
#[derive(Clone, Debug)]
pub struct Clock {
    clock_hz: u32,
    cycles_since_refresh: u32,
}

impl Clock {
    /// Rates below the refresh rate are raised to it.
    pub fn new(clock_hz: u32) -> Self {
        Clock {
            clock_hz: clock_hz.max(CHIP8_TIMER_HZ),
            cycles_since_refresh: 0,
        }
    }

    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    pub fn set_clock_hz(&mut self, clock_hz: u32) {
        self.clock_hz = clock_hz.max(CHIP8_TIMER_HZ);
        self.cycles_since_refresh = 0;
    }

    /// Time budget of a single cycle.
    pub fn period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.clock_hz))
    }

    pub fn cycles_per_refresh(&self) -> u32 {
        self.clock_hz / CHIP8_TIMER_HZ
    }

    /// Accounts for one cycle. Returns true when the timers should be
    /// ticked and the display refreshed.
    pub fn advance(&mut self) -> bool {
        self.cycles_since_refresh += 1;
        if self.cycles_since_refresh >= self.cycles_per_refresh() {
            self.cycles_since_refresh = 0;
            return true;
        }
        false
    }
}
