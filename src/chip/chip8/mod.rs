/// Host pacing of instruction and timer rates.
mod clock;
/// Persisted preferences.
mod config;
/// CHIP-8 constants.
pub mod constants;
/// Cursive display output.
pub mod cursive_display;
/// Execution control and state inspection for hosts.
pub mod debugger;
/// Mnemonics for decoded instructions.
mod disassembler;
/// Decoding of opcodes and their execution.
mod opcodes;
/// Saving and restoring the complete machine state.
mod snapshot;
/// Convenience functions for modification of the CHIP-8 state.
mod util;

#[cfg(test)]
mod tests;

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

pub use clock::Clock;
pub use config::Chip8Config;
pub use opcodes::{Instruction, Opcode};

use crate::chip::{
    chip8::constants::{
        CHIP8_CHARSET, CHIP8_CHARSET_OFFSET, CHIP8_DISPLAY_SIZE, CHIP8_MAX_PROGRAM_SIZE,
        CHIP8_MEMORY_SIZE, CHIP8_PROGRAM_START, CHIP8_REGISTER_COUNT, CHIP8_STACK_SIZE,
    },
    Chip, Error, KeyState, Keypad,
};

/// Represents the state of the CHIP-8.
pub struct Chip8<K = KeyState> {
    /// 4096 bytes of main memory
    memory: [u8; CHIP8_MEMORY_SIZE],

    /// 16 registers where each can store one byte
    registers: [u8; CHIP8_REGISTER_COUNT],

    /// An index register
    index: u16,

    /// A program counter
    program_counter: u16,

    /// The output pins, one byte per pixel holding either 0 or 1. Those are
    /// usually wired up to a display, but as a display is optional here we
    /// refer to them as output pins.
    output_pins: [u8; CHIP8_DISPLAY_SIZE],

    /// The delay timer. Decremented by the host at 60 Hz.
    delay_timer: u8,

    /// The sound timer. Decremented by the host at 60 Hz. Nothing is sounded.
    sound_timer: u8,

    /// A stack. Note that there are no instructions allowing to modify the
    /// stack and it is only used to store return addresses for the return
    /// opcode.
    stack: [u16; CHIP8_STACK_SIZE],

    /// A pointer, pointing to the next free slot of the stack.
    stack_pointer: u8,

    /// The keypad. Owned by the host, only queried by the chip.
    keypad: K,

    /// A flag that indicates whether the output pins changed since it
    /// was last taken.
    draw: bool,

    /// Raised while state is being loaded or saved. Cycles are skipped
    /// while it is set.
    paused: Arc<AtomicBool>,

    rng: StdRng,

    config: Chip8Config,
}

/// Keeps the paused flag raised for as long as it is alive.
struct PauseGuard(Arc<AtomicBool>);

impl PauseGuard {
    fn engage(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        PauseGuard(Arc::clone(flag))
    }
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<K: Keypad> Chip for Chip8<K> {
    fn load_program(&mut self, path: &Path) -> Result<usize, Error> {
        let program = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_rom(&program)
    }

    fn cycle(&mut self) {
        if self.is_paused() {
            return;
        }

        let opcode = self.next_instruction();
        let instruction = opcode.decode();
        trace!(
            pc = self.program_counter,
            opcode = opcode.word(),
            "{}",
            instruction
        );
        instruction.execute(self);
    }

    fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    fn read_output_pins(&self) -> &[u8] {
        &self.output_pins
    }

    fn take_draw_flag(&mut self) -> bool {
        std::mem::take(&mut self.draw)
    }
}

impl Chip8 {
    /// Constructs a new CHIP-8 with the default configuration and a keypad
    /// without any key pressed.
    pub fn new() -> Self {
        Chip8::with_config(Chip8Config::default())
    }

    pub fn with_config(config: Chip8Config) -> Self {
        Chip8::with_keypad(KeyState::new(), config)
    }
}

impl<K: Keypad> Chip8<K> {
    /// Constructs a new CHIP-8 and appropriately initializes all fields so that
    /// it is ready for the first execution cycle. Essentially this means that
    /// the program counter is set to 0x200 and the default CHIP-8 charset is
    /// loaded at memory address `CHIP8_CHARSET_OFFSET`. Note that no program is
    /// loaded upon initialization.
    pub fn with_keypad(keypad: K, config: Chip8Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut chip = Chip8 {
            memory: [0; CHIP8_MEMORY_SIZE],
            registers: [0; CHIP8_REGISTER_COUNT],
            index: 0,
            program_counter: CHIP8_PROGRAM_START,
            output_pins: [0; CHIP8_DISPLAY_SIZE],
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; CHIP8_STACK_SIZE],
            stack_pointer: 0,
            keypad,
            draw: false,
            paused: Arc::new(AtomicBool::new(false)),
            rng,
            config,
        };
        chip.reset_state();
        chip
    }

    /// Zeroes registers, stack, timers, memory and output pins, and installs
    /// the charset. The configuration and the keypad are left alone.
    pub fn reset(&mut self) {
        let _pause = PauseGuard::engage(&self.paused);
        self.reset_state();
    }

    fn reset_state(&mut self) {
        self.memory = [0; CHIP8_MEMORY_SIZE];
        let charset_start = CHIP8_CHARSET_OFFSET as usize;
        self.memory[charset_start..charset_start + CHIP8_CHARSET.len()]
            .copy_from_slice(&CHIP8_CHARSET);

        self.registers = [0; CHIP8_REGISTER_COUNT];
        self.index = 0;
        self.program_counter = CHIP8_PROGRAM_START;
        self.output_pins = [0; CHIP8_DISPLAY_SIZE];
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.stack = [0; CHIP8_STACK_SIZE];
        self.stack_pointer = 0;
        self.draw = true;
    }

    /// Resets the chip and copies `program` to `CHIP8_PROGRAM_START`.
    ///
    /// Programs that do not fit into memory are rejected before any state is touched.
    pub fn load_rom(&mut self, program: &[u8]) -> Result<usize, Error> {
        if program.len() > CHIP8_MAX_PROGRAM_SIZE {
            return Err(Error::RomTooLarge {
                size: program.len(),
                max: CHIP8_MAX_PROGRAM_SIZE,
            });
        }

        let _pause = PauseGuard::engage(&self.paused);
        self.reset_state();
        let start = CHIP8_PROGRAM_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        debug!(size = program.len(), "loaded program");

        Ok(program.len())
    }

    /// Fetches the two bytes at `address` as a big-endian word. Addresses
    /// without two bytes of memory behind them yield the zero word.
    pub fn fetch(&self, address: u16) -> u16 {
        let address = address as usize;
        if address + 1 >= CHIP8_MEMORY_SIZE {
            return 0;
        }
        u16::from(self.memory[address]) << 8 | u16::from(self.memory[address + 1])
    }

    /// Fetches the next instruction based on the current state of self.program_counter.
    fn next_instruction(&self) -> Opcode {
        Opcode::new(self.fetch(self.program_counter))
    }

    /// Returns the mnemonic of the instruction stored at `address`.
    pub fn disassemble(&self, address: u16) -> String {
        Opcode::new(self.fetch(address)).decode().to_string()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn keypad(&self) -> &K {
        &self.keypad
    }

    pub fn keypad_mut(&mut self) -> &mut K {
        &mut self.keypad
    }

    pub fn config(&self) -> &Chip8Config {
        &self.config
    }

    /// Changes the instruction rate hosts should run the chip at.
    pub fn set_clock_hz(&mut self, clock_hz: u32) {
        self.config.clock_hz = clock_hz;
    }

    pub fn registers(&self) -> &[u8; CHIP8_REGISTER_COUNT] {
        &self.registers
    }

    pub fn memory(&self) -> &[u8; CHIP8_MEMORY_SIZE] {
        &self.memory
    }

    pub fn stack(&self) -> &[u16; CHIP8_STACK_SIZE] {
        &self.stack
    }

    pub fn stack_pointer(&self) -> u8 {
        self.stack_pointer
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// Whether a host with audio would currently be beeping.
    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    /// Whether the output pins changed since the flag was last taken.
    pub fn draw_flag(&self) -> bool {
        self.draw
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Chip8::new()
    }
}
