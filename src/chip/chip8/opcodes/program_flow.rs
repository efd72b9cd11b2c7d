use tracing::warn;

use crate::chip::chip8::{constants::CHIP8_STACK_SIZE, util, Chip8};

pub(super) fn return_from_subroutine<K>(state: &mut Chip8<K>) {
    if state.stack_pointer > 0 {
        state.stack_pointer -= 1;
        state.program_counter = state.stack[state.stack_pointer as usize];
    } else {
        warn!(pc = state.program_counter, "return with empty stack ignored");
    }
    util::increment_program_counter(state);
}

pub(super) fn jump<K>(state: &mut Chip8<K>, address: u16) {
    state.program_counter = address;
}

/// Pushes the current program counter and jumps to `address`. A call with a
/// full stack is dropped and execution continues after it.
pub(super) fn call<K>(state: &mut Chip8<K>, address: u16) {
    if state.stack_pointer as usize >= CHIP8_STACK_SIZE {
        warn!(pc = state.program_counter, "stack overflow, call ignored");
        util::increment_program_counter(state);
        return;
    }

    state.stack[state.stack_pointer as usize] = state.program_counter;
    state.stack_pointer += 1;
    state.program_counter = address;
}

/// Skips the next instruction if `condition` holds.
pub(super) fn skip_if<K>(state: &mut Chip8<K>, condition: impl FnOnce(&Chip8<K>) -> bool) {
    util::conditional_skip(state, condition);
    util::increment_program_counter(state);
}

/// The sum is formed before it is confined to the address space.
pub(super) fn jump_with_offset<K>(state: &mut Chip8<K>, address: u16) {
    state.program_counter = (u16::from(state.registers[0x0]) + address) & 0x0FFF;
}
