use crate::chip::chip8::constants::CHIP8_DEFAULT_CLOCK_HZ;

/// Preferences that survive loading programs and snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chip8Config {
    /// Instructions per second the host should execute.
    pub clock_hz: u32,

    /// Seed for the random number generator used by `CXKK`. Without a seed
    /// the generator is seeded from the operating system.
    pub seed: Option<u64>,
}

impl Default for Chip8Config {
    fn default() -> Self {
        Chip8Config {
            clock_hz: CHIP8_DEFAULT_CLOCK_HZ,
            seed: None,
        }
    }
}
