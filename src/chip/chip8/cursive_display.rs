use cursive::{
    theme::{BaseColor, Color, ColorStyle},
    view::View,
    views::TextView,
    CbSink, Printer, Vec2,
};
use tracing::warn;

use crate::chip::{
    chip8::constants::{CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_SIZE, CHIP8_DISPLAY_WIDTH},
    DisplaySink,
};

/// Name of the [`Display`] view inside the cursive view tree.
pub const SCREEN_VIEW: &str = "screen";

/// Name of the text view showing debugger output.
pub const DEBUGGER_VIEW: &str = "debugger";

/// Represents the display of the CHIP-8
pub struct Display {
    pixels: [u8; CHIP8_DISPLAY_SIZE],
}

impl Display {
    /// Creates a new display from a slice holding one byte per pixel.
    pub fn new(pixels: &[u8]) -> Self {
        let mut display = Display::default();
        display.set_pixels(pixels);
        display
    }

    /// Replaces the displayed pixels. Slices of the wrong size are ignored.
    pub fn set_pixels(&mut self, pixels: &[u8]) {
        if pixels.len() != CHIP8_DISPLAY_SIZE {
            warn!(len = pixels.len(), "ignoring frame of unexpected size");
            return;
        }
        self.pixels.copy_from_slice(pixels);
    }
}

impl Default for Display {
    fn default() -> Self {
        Display {
            pixels: [0; CHIP8_DISPLAY_SIZE],
        }
    }
}

/// Implements cursive::view::View for Display to enable drawing it
/// as a View out of the box.
impl View for Display {
    fn draw(&self, printer: &Printer) {
        printer.with_color(
            ColorStyle::new(Color::Light(BaseColor::Green), Color::Dark(BaseColor::Black)),
            |printer| {
                for y in 0..CHIP8_DISPLAY_HEIGHT {
                    for x in 0..CHIP8_DISPLAY_WIDTH {
                        let cell = if self.pixels[x + CHIP8_DISPLAY_WIDTH * y] == 1 {
                            "█"
                        } else {
                            " "
                        };
                        printer.print((x, y), cell);
                    }
                }
            },
        );
    }

    fn required_size(&mut self, _: Vec2) -> Vec2 {
        Vec2::new(CHIP8_DISPLAY_WIDTH, CHIP8_DISPLAY_HEIGHT)
    }
}

/// Presents frames by sending them to the cursive event loop, which may run
/// on another thread.
pub struct CursiveSink {
    sink: CbSink,
}

impl CursiveSink {
    pub fn new(sink: CbSink) -> Self {
        CursiveSink { sink }
    }

    /// Replaces the content of the debugger text view.
    pub fn show_debugger(&mut self, text: String) {
        let result = self.sink.send(Box::new(move |s: &mut cursive::Cursive| {
            s.call_on_name(DEBUGGER_VIEW, |view: &mut TextView| view.set_content(text));
        }));
        if result.is_err() {
            warn!("ui is gone, dropping debugger update");
        }
    }
}

impl DisplaySink for CursiveSink {
    fn present(&mut self, pixels: &[u8]) {
        let pixels = pixels.to_vec();
        let result = self.sink.send(Box::new(move |s: &mut cursive::Cursive| {
            s.call_on_name(SCREEN_VIEW, |display: &mut Display| {
                display.set_pixels(&pixels)
            });
        }));
        if result.is_err() {
            warn!("ui is gone, dropping frame");
        }
    }
}
