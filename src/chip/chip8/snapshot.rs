use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chip::{
    chip8::{
        constants::{
            CHIP8_DISPLAY_SIZE, CHIP8_MEMORY_SIZE, CHIP8_REGISTER_COUNT, CHIP8_STACK_SIZE,
        },
        Chip8, PauseGuard,
    },
    Error, Keypad, SnapshotError,
};

/// The machine state in the order it is written. Encoded as a MessagePack
/// array, so every array carries its length and truncation is detected on decode.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    program_counter: u16,
    stack_pointer: u8,
    index: u16,
    registers: Vec<u8>,
    stack: Vec<u16>,
    memory: Vec<u8>,
    output_pins: Vec<u8>,
    delay_timer: u8,
    sound_timer: u8,
}

fn fixed<T: Copy + Default, const N: usize>(
    field: &'static str,
    values: &[T],
) -> Result<[T; N], SnapshotError> {
    if values.len() != N {
        return Err(SnapshotError::Length {
            field,
            actual: values.len(),
            expected: N,
        });
    }
    let mut array = [T::default(); N];
    array.copy_from_slice(values);
    Ok(array)
}

impl<K: Keypad> Chip8<K> {
    /// Serializes the complete machine state. The keypad and the
    /// configuration are not part of it.
    pub fn save_state(&self) -> Result<Vec<u8>, Error> {
        let _pause = PauseGuard::engage(&self.paused);

        let snapshot = Snapshot {
            program_counter: self.program_counter,
            stack_pointer: self.stack_pointer,
            index: self.index,
            registers: self.registers.to_vec(),
            stack: self.stack.to_vec(),
            memory: self.memory.to_vec(),
            output_pins: self.output_pins.to_vec(),
            delay_timer: self.delay_timer,
            sound_timer: self.sound_timer,
        };
        let bytes = rmp_serde::to_vec(&snapshot).map_err(SnapshotError::from)?;
        debug!(size = bytes.len(), "saved state");

        Ok(bytes)
    }

    /// Replaces the machine state with the one in `bytes`. The snapshot is
    /// decoded and validated completely before anything is replaced, so a
    /// rejected snapshot leaves the chip untouched.
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let snapshot: Snapshot = rmp_serde::from_slice(bytes).map_err(SnapshotError::from)?;

        let registers = fixed::<u8, CHIP8_REGISTER_COUNT>("registers", &snapshot.registers)?;
        let stack = fixed::<u16, CHIP8_STACK_SIZE>("stack", &snapshot.stack)?;
        let memory = fixed::<u8, CHIP8_MEMORY_SIZE>("memory", &snapshot.memory)?;
        let output_pins = fixed::<u8, CHIP8_DISPLAY_SIZE>("output_pins", &snapshot.output_pins)?;

        if snapshot.stack_pointer as usize > CHIP8_STACK_SIZE {
            return Err(SnapshotError::StackPointer(snapshot.stack_pointer).into());
        }
        if let Some(&pixel) = output_pins.iter().find(|&&pixel| pixel > 1) {
            return Err(SnapshotError::Pixel(pixel).into());
        }

        let _pause = PauseGuard::engage(&self.paused);
        self.program_counter = snapshot.program_counter;
        self.stack_pointer = snapshot.stack_pointer;
        self.index = snapshot.index;
        self.registers = registers;
        self.stack = stack;
        self.memory = memory;
        self.output_pins = output_pins;
        self.delay_timer = snapshot.delay_timer;
        self.sound_timer = snapshot.sound_timer;
        self.draw = true;
        debug!(pc = self.program_counter, "loaded state");

        Ok(())
    }
}
