/// Size of the addressable memory in bytes.
pub const CHIP8_MEMORY_SIZE: usize = 4096;

/// Address the program is loaded to and where execution starts.
pub const CHIP8_PROGRAM_START: u16 = 0x200;

pub const CHIP8_MAX_PROGRAM_SIZE: usize = CHIP8_MEMORY_SIZE - CHIP8_PROGRAM_START as usize; // 3584

pub const CHIP8_REGISTER_COUNT: usize = 16;

pub const CHIP8_STACK_SIZE: usize = 16;

pub const CHIP8_DISPLAY_WIDTH: usize = 64;

pub const CHIP8_DISPLAY_HEIGHT: usize = 32;

pub const CHIP8_DISPLAY_SIZE: usize = CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT;

/// Rate at which hosts tick the timers and refresh the display.
pub const CHIP8_TIMER_HZ: u32 = 60;

/// Default instruction rate.
pub const CHIP8_DEFAULT_CLOCK_HZ: u32 = 600;

pub const CHIP8_CHARSET_OFFSET: u16 = 0x0;

/// Bytes per glyph of the built-in charset.
pub const CHIP8_GLYPH_SIZE: u16 = 5;

pub const CHIP8_CHARSET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
