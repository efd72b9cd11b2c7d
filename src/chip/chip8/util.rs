use crate::chip::chip8::{constants::CHIP8_MEMORY_SIZE, Chip8};

pub fn conditional_skip<K>(state: &mut Chip8<K>, f: impl FnOnce(&Chip8<K>) -> bool) {
    if f(&*state) {
        increment_program_counter(state);
    }
}

pub fn increment_program_counter<K>(state: &mut Chip8<K>) {
    state.program_counter = state.program_counter.wrapping_add(2);
}

/// Translates an address relative to the index register into a memory
/// offset. The index register is not range checked, so accesses wrap
/// around the end of memory.
pub fn index_offset<K>(state: &Chip8<K>, offset: u16) -> usize {
    state.index.wrapping_add(offset) as usize % CHIP8_MEMORY_SIZE
}

/// Sets VF to 1 if `flag` holds and to 0 otherwise.
pub fn set_flag<K>(state: &mut Chip8<K>, flag: bool) {
    state.registers[0xF] = u8::from(flag);
}
