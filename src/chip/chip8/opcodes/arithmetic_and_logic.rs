use rand::Rng;

use crate::chip::chip8::{
    constants::{CHIP8_CHARSET_OFFSET, CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH, CHIP8_GLYPH_SIZE},
    util, Chip8,
};

pub(super) fn load_byte<K>(state: &mut Chip8<K>, x: u8, byte: u8) {
    state.registers[x as usize] = byte;
    util::increment_program_counter(state);
}

/// Adds without touching VF.
pub(super) fn add_byte<K>(state: &mut Chip8<K>, x: u8, byte: u8) {
    state.registers[x as usize] = state.registers[x as usize].wrapping_add(byte);
    util::increment_program_counter(state);
}

/// Stores the result of `f` applied to Vx and Vy in Vx. If `f` yields a
/// flag, it is stored in VF after the result.
pub(super) fn modify_registers<K>(
    state: &mut Chip8<K>,
    x: u8,
    y: u8,
    f: fn(u8, u8) -> (u8, Option<bool>),
) {
    let (value, flag) = f(state.registers[x as usize], state.registers[y as usize]);
    state.registers[x as usize] = value;
    if let Some(flag) = flag {
        util::set_flag(state, flag);
    }
    util::increment_program_counter(state);
}

pub(super) fn load_index<K>(state: &mut Chip8<K>, address: u16) {
    state.index = address;
    util::increment_program_counter(state);
}

/// VF reports whether the 16-bit addition overflowed.
pub(super) fn add_index<K>(state: &mut Chip8<K>, x: u8) {
    let (index, overflow) = state
        .index
        .overflowing_add(u16::from(state.registers[x as usize]));
    state.index = index;
    util::set_flag(state, overflow);
    util::increment_program_counter(state);
}

pub(super) fn load_font<K>(state: &mut Chip8<K>, x: u8) {
    state.index = CHIP8_CHARSET_OFFSET + u16::from(state.registers[x as usize]) * CHIP8_GLYPH_SIZE;
    util::increment_program_counter(state);
}

pub(super) fn random<K>(state: &mut Chip8<K>, x: u8, byte: u8) {
    let sample: u8 = state.rng.gen();
    state.registers[x as usize] = sample & byte;
    util::increment_program_counter(state);
}

/// XORs an `n` rows high, 8 pixels wide sprite read from memory at the index
/// register onto the output pins at (Vx, Vy). Pixels falling off an edge wrap
/// around. VF is set iff a set pixel was cleared.
pub(super) fn draw<K>(state: &mut Chip8<K>, x: u8, y: u8, n: u8) {
    fn translate_gfx(x: usize, y: usize) -> usize {
        (x % CHIP8_DISPLAY_WIDTH) + (y % CHIP8_DISPLAY_HEIGHT) * CHIP8_DISPLAY_WIDTH
    }

    let x = state.registers[x as usize] as usize;
    let y = state.registers[y as usize] as usize;

    let mut collision = false;
    for y_pos in 0..n as usize {
        let pixel_byte = state.memory[util::index_offset(state, y_pos as u16)];

        for x_pos in 0..8 {
            if pixel_byte & (0x80 >> x_pos) == 0 {
                continue;
            }

            let pixel_pos = translate_gfx(x + x_pos, y + y_pos);
            if state.output_pins[pixel_pos] == 1 {
                collision = true;
            }
            state.output_pins[pixel_pos] ^= 1;
        }
    }

    util::set_flag(state, collision);
    state.draw = true;
    util::increment_program_counter(state);
}
