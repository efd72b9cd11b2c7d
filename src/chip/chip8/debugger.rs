use std::fmt;

use crate::chip::{
    chip8::{constants::CHIP8_MEMORY_SIZE, Chip8},
    Keypad,
};

/// Instruction slots listed on either side of the program counter.
pub const LISTING_RADIUS: i32 = 13;

/// Pause and single-step control for a host loop. While running every
/// cycle is executed; while paused only requested steps are.
#[derive(Clone, Debug, Default)]
pub struct Debugger {
    paused: bool,
    pending_steps: u32,
}

impl Debugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
        self.pending_steps = 0;
    }

    pub fn toggle(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Requests a single cycle while paused. Ignored while running.
    pub fn step(&mut self) {
        if self.paused {
            self.pending_steps += 1;
        }
    }

    /// Whether the host should execute a cycle now. Consumes a pending step.
    pub fn should_cycle(&mut self) -> bool {
        if !self.paused {
            return true;
        }
        if self.pending_steps > 0 {
            self.pending_steps -= 1;
            return true;
        }
        false
    }
}

/// A copy of the registers for display purposes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterView {
    pub program_counter: u16,
    pub index: u16,
    pub stack_pointer: u8,
    pub registers: [u8; 16],
    pub delay_timer: u8,
    pub sound_timer: u8,
}

impl fmt::Display for RegisterView {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "PC {:04X}  I {:04X}  SP {:X}",
            self.program_counter, self.index, self.stack_pointer
        )?;
        for (row, chunk) in self.registers.chunks(4).enumerate() {
            for (column, value) in chunk.iter().enumerate() {
                if column > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "V{:X} {:02X}", row * 4 + column, value)?;
            }
            writeln!(f)?;
        }
        write!(f, "DT {:02X}  ST {:02X}", self.delay_timer, self.sound_timer)
    }
}

/// One row of a disassembly listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingLine {
    pub address: u16,
    pub word: u16,
    pub mnemonic: String,
    /// Whether the program counter points at this line.
    pub current: bool,
}

impl fmt::Display for ListingLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let marker = if self.current { '>' } else { ' ' };
        write!(
            f,
            "{} {:04X}  {:04X}  {}",
            marker, self.address, self.word, self.mnemonic
        )
    }
}

impl<K: Keypad> Chip8<K> {
    pub fn register_view(&self) -> RegisterView {
        RegisterView {
            program_counter: self.program_counter,
            index: self.index,
            stack_pointer: self.stack_pointer,
            registers: self.registers,
            delay_timer: self.delay_timer,
            sound_timer: self.sound_timer,
        }
    }

    /// Disassembles the instruction slots around the program counter.
    /// Addresses outside of memory are left out.
    pub fn listing(&self) -> Vec<ListingLine> {
        let pc = i32::from(self.program_counter);
        (-LISTING_RADIUS..=LISTING_RADIUS)
            .map(|slot| pc + slot * 2)
            .filter(|&address| address >= 0 && (address as usize) < CHIP8_MEMORY_SIZE)
            .map(|address| {
                let address = address as u16;
                ListingLine {
                    address,
                    word: self.fetch(address),
                    mnemonic: self.disassemble(address),
                    current: address == self.program_counter,
                }
            })
            .collect()
    }

    /// The registers followed by the listing, as shown in a debugger panel.
    pub fn debug_report(&self) -> String {
        let mut report = format!("{}\n", self.register_view());
        for line in self.listing() {
            report.push('\n');
            report.push_str(&line.to_string());
        }
        report
    }
}
