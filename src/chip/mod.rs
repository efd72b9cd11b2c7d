pub mod chip8;
mod error;
pub mod keypad;

use std::path::Path;

pub use error::{Error, SnapshotError};
pub use keypad::{KeyState, Keypad};

/// Something the framebuffer of a chip can be presented on.
pub trait DisplaySink {
    /// Receives the full pixel buffer, one byte per pixel, row major.
    fn present(&mut self, pixels: &[u8]);
}

pub trait Chip {
    /// Reads the program stored at `path` and loads it into memory, resetting
    /// the chip. Returns the number of bytes loaded.
    fn load_program(&mut self, path: &Path) -> Result<usize, Error>;

    /// Executes a single fetch-decode-execute cycle.
    fn cycle(&mut self);

    /// Decrements the timers. Hosts call this at 60 Hz.
    fn tick_timers(&mut self);

    fn read_output_pins(&self) -> &[u8];

    /// Returns whether the output pins changed since the last call and
    /// clears the flag.
    fn take_draw_flag(&mut self) -> bool;

    /// Hands the output pins to `sink` if they changed since they were last presented.
    fn present<D: DisplaySink>(&mut self, sink: &mut D)
    where
        Self: Sized,
    {
        if self.take_draw_flag() {
            sink.present(self.read_output_pins());
        }
    }
}
