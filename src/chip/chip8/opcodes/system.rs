use tracing::{trace, warn};

use crate::chip::{
    chip8::{constants::CHIP8_DISPLAY_SIZE, util, Chip8},
    Keypad,
};

pub(super) fn clear_screen<K>(state: &mut Chip8<K>) {
    state.output_pins = [0; CHIP8_DISPLAY_SIZE];
    state.draw = true;
    util::increment_program_counter(state);
}

pub(super) fn nop<K>(state: &mut Chip8<K>, word: u16) {
    if word != 0x0000 {
        warn!(pc = state.program_counter, opcode = word, "unsupported opcode skipped");
    }
    util::increment_program_counter(state);
}

pub(super) fn load_delay_timer<K>(state: &mut Chip8<K>, x: u8) {
    state.registers[x as usize] = state.delay_timer;
    util::increment_program_counter(state);
}

pub(super) fn set_delay_timer<K>(state: &mut Chip8<K>, x: u8) {
    state.delay_timer = state.registers[x as usize];
    util::increment_program_counter(state);
}

pub(super) fn set_sound_timer<K>(state: &mut Chip8<K>, x: u8) {
    state.sound_timer = state.registers[x as usize];
    util::increment_program_counter(state);
}

/// Stores the highest pressed key in Vx. Without a pressed key the program
/// counter stays put, so the instruction is polled again on the next cycle.
pub(super) fn wait_for_key<K: Keypad>(state: &mut Chip8<K>, x: u8) {
    let pressed = (0x0..=0xF).rev().find(|&key| state.keypad.pressed(key));

    match pressed {
        Some(key) => {
            state.registers[x as usize] = key;
            util::increment_program_counter(state);
        }
        None => trace!(pc = state.program_counter, "waiting for key"),
    }
}

pub(super) fn store_bcd<K>(state: &mut Chip8<K>, x: u8) {
    let value = state.registers[x as usize];
    let digits = [value / 100, value / 10 % 10, value % 10];

    for (offset, digit) in digits.into_iter().enumerate() {
        let address = util::index_offset(state, offset as u16);
        state.memory[address] = digit;
    }
    util::increment_program_counter(state);
}

/// Copies V0..=Vx to memory starting at the index register.
pub(super) fn store_registers<K>(state: &mut Chip8<K>, x: u8) {
    for reg in 0x0..=x {
        let address = util::index_offset(state, u16::from(reg));
        state.memory[address] = state.registers[reg as usize];
    }
    util::increment_program_counter(state);
}

/// Fills V0..=Vx from memory starting at the index register.
pub(super) fn load_registers<K>(state: &mut Chip8<K>, x: u8) {
    for reg in 0x0..=x {
        let address = util::index_offset(state, u16::from(reg));
        state.registers[reg as usize] = state.memory[address];
    }
    util::increment_program_counter(state);
}
