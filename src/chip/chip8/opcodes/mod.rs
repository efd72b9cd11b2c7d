mod arithmetic_and_logic;
mod program_flow;
mod system;

use crate::chip::{chip8::Chip8, Keypad};

/// Represents a CHIP-8 opcode. A CHIP-8 opcode is two bytes long and is
/// stored big-endian in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opcode {
    word: u16,
}

impl Opcode {
    /// Constructs a new `Opcode` from its 16-bit representation.
    pub fn new(word: u16) -> Opcode {
        Opcode { word }
    }

    pub fn word(&self) -> u16 {
        self.word
    }

    /// The instruction class is the most significant nibble of the opcode.
    pub fn instruction_class(&self) -> u8 {
        (self.word >> 12) as u8
    }

    /// The second nibble, usually addressing register Vx.
    pub fn x(&self) -> u8 {
        ((self.word >> 8) & 0xF) as u8
    }

    /// The third nibble, usually addressing register Vy.
    pub fn y(&self) -> u8 {
        ((self.word >> 4) & 0xF) as u8
    }

    /// The least significant nibble.
    pub fn n(&self) -> u8 {
        (self.word & 0xF) as u8
    }

    /// The least significant byte.
    pub fn kk(&self) -> u8 {
        (self.word & 0xFF) as u8
    }

    /// The opcode without its instruction class, i.e., an address in the
    /// range 0x000 to 0xFFF (inclusive).
    pub fn nnn(&self) -> u16 {
        self.word & 0x0FFF
    }

    /// Decodes the opcode. Opcodes outside of the instruction set decode to
    /// [`Instruction::Nop`].
    pub fn decode(self) -> Instruction {
        Instruction::decode(self.word)
    }
}

/// A decoded instruction. Register operands are register indices in the
/// range 0x0 - 0xF (inclusive).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0`
    Cls,
    /// `00EE`
    Ret,
    /// `1NNN`
    Jp { address: u16 },
    /// `2NNN`
    Call { address: u16 },
    /// `3XKK`
    SeByte { x: u8, byte: u8 },
    /// `4XKK`
    SneByte { x: u8, byte: u8 },
    /// `5XY0`
    SeReg { x: u8, y: u8 },
    /// `6XKK`
    LdByte { x: u8, byte: u8 },
    /// `7XKK`
    AddByte { x: u8, byte: u8 },
    /// `8XY0`
    LdReg { x: u8, y: u8 },
    /// `8XY1`
    Or { x: u8, y: u8 },
    /// `8XY2`
    And { x: u8, y: u8 },
    /// `8XY3`
    Xor { x: u8, y: u8 },
    /// `8XY4`
    AddReg { x: u8, y: u8 },
    /// `8XY5`
    Sub { x: u8, y: u8 },
    /// `8XY6`
    Shr { x: u8 },
    /// `8XY7`
    Subn { x: u8, y: u8 },
    /// `8XYE`
    Shl { x: u8 },
    /// `9XY0`
    SneReg { x: u8, y: u8 },
    /// `ANNN`
    LdIndex { address: u16 },
    /// `BNNN`
    JpOffset { address: u16 },
    /// `CXKK`
    Rnd { x: u8, byte: u8 },
    /// `DXYN`
    Drw { x: u8, y: u8, n: u8 },
    /// `EX9E`
    Skp { x: u8 },
    /// `EXA1`
    Sknp { x: u8 },
    /// `FX07`
    LdFromDelay { x: u8 },
    /// `FX0A`
    LdKey { x: u8 },
    /// `FX15`
    LdDelay { x: u8 },
    /// `FX18`
    LdSound { x: u8 },
    /// `FX1E`
    AddIndex { x: u8 },
    /// `FX29`
    LdFont { x: u8 },
    /// `FX33`
    Bcd { x: u8 },
    /// `FX55`
    StoreRegisters { x: u8 },
    /// `FX65`
    LoadRegisters { x: u8 },
    /// Any word outside of the instruction set, including `0NNN`.
    Nop(u16),
}

impl Instruction {
    pub fn decode(word: u16) -> Instruction {
        let opcode = Opcode::new(word);
        let (x, y, n, byte, address) = (
            opcode.x(),
            opcode.y(),
            opcode.n(),
            opcode.kk(),
            opcode.nnn(),
        );

        match opcode.instruction_class() {
            0x0 => match address {
                0x0E0 => Instruction::Cls,
                0x0EE => Instruction::Ret,
                _ => Instruction::Nop(word),
            },
            0x1 => Instruction::Jp { address },
            0x2 => Instruction::Call { address },
            0x3 => Instruction::SeByte { x, byte },
            0x4 => Instruction::SneByte { x, byte },
            0x5 if n == 0x0 => Instruction::SeReg { x, y },
            0x6 => Instruction::LdByte { x, byte },
            0x7 => Instruction::AddByte { x, byte },
            0x8 => match n {
                0x0 => Instruction::LdReg { x, y },
                0x1 => Instruction::Or { x, y },
                0x2 => Instruction::And { x, y },
                0x3 => Instruction::Xor { x, y },
                0x4 => Instruction::AddReg { x, y },
                0x5 => Instruction::Sub { x, y },
                0x6 => Instruction::Shr { x },
                0x7 => Instruction::Subn { x, y },
                0xE => Instruction::Shl { x },
                _ => Instruction::Nop(word),
            },
            0x9 if n == 0x0 => Instruction::SneReg { x, y },
            0xA => Instruction::LdIndex { address },
            0xB => Instruction::JpOffset { address },
            0xC => Instruction::Rnd { x, byte },
            0xD => Instruction::Drw { x, y, n },
            0xE => match byte {
                0x9E => Instruction::Skp { x },
                0xA1 => Instruction::Sknp { x },
                _ => Instruction::Nop(word),
            },
            0xF => match byte {
                0x07 => Instruction::LdFromDelay { x },
                0x0A => Instruction::LdKey { x },
                0x15 => Instruction::LdDelay { x },
                0x18 => Instruction::LdSound { x },
                0x1E => Instruction::AddIndex { x },
                0x29 => Instruction::LdFont { x },
                0x33 => Instruction::Bcd { x },
                0x55 => Instruction::StoreRegisters { x },
                0x65 => Instruction::LoadRegisters { x },
                _ => Instruction::Nop(word),
            },
            _ => Instruction::Nop(word),
        }
    }

    /// Executes `self` relative to the given state. Every handler either sets
    /// the program counter itself or advances it past the instruction.
    pub(super) fn execute<K: Keypad>(self, state: &mut Chip8<K>) {
        use arithmetic_and_logic as alu;

        match self {
            Instruction::Cls => system::clear_screen(state),
            Instruction::Ret => program_flow::return_from_subroutine(state),
            Instruction::Jp { address } => program_flow::jump(state, address),
            Instruction::Call { address } => program_flow::call(state, address),
            Instruction::SeByte { x, byte } => {
                program_flow::skip_if(state, |state| state.registers[x as usize] == byte)
            }
            Instruction::SneByte { x, byte } => {
                program_flow::skip_if(state, |state| state.registers[x as usize] != byte)
            }
            Instruction::SeReg { x, y } => program_flow::skip_if(state, |state| {
                state.registers[x as usize] == state.registers[y as usize]
            }),
            Instruction::SneReg { x, y } => program_flow::skip_if(state, |state| {
                state.registers[x as usize] != state.registers[y as usize]
            }),
            Instruction::LdByte { x, byte } => alu::load_byte(state, x, byte),
            Instruction::AddByte { x, byte } => alu::add_byte(state, x, byte),
            Instruction::LdReg { x, y } => alu::modify_registers(state, x, y, |_, vy| (vy, None)),
            Instruction::Or { x, y } => {
                alu::modify_registers(state, x, y, |vx, vy| (vx | vy, None))
            }
            Instruction::And { x, y } => {
                alu::modify_registers(state, x, y, |vx, vy| (vx & vy, None))
            }
            Instruction::Xor { x, y } => {
                alu::modify_registers(state, x, y, |vx, vy| (vx ^ vy, None))
            }
            Instruction::AddReg { x, y } => alu::modify_registers(state, x, y, |vx, vy| {
                let (result, overflow) = vx.overflowing_add(vy);
                (result, Some(overflow))
            }),
            Instruction::Sub { x, y } => alu::modify_registers(state, x, y, |vx, vy| {
                let (result, borrow) = vx.overflowing_sub(vy);
                (result, Some(!borrow))
            }),
            Instruction::Shr { x } => {
                alu::modify_registers(state, x, x, |vx, _| (vx >> 1, Some(vx & 0x01 != 0)))
            }
            Instruction::Subn { x, y } => alu::modify_registers(state, x, y, |vx, vy| {
                let (result, borrow) = vy.overflowing_sub(vx);
                (result, Some(!borrow))
            }),
            Instruction::Shl { x } => {
                alu::modify_registers(state, x, x, |vx, _| (vx << 1, Some(vx & 0x80 != 0)))
            }
            Instruction::LdIndex { address } => alu::load_index(state, address),
            Instruction::JpOffset { address } => program_flow::jump_with_offset(state, address),
            Instruction::Rnd { x, byte } => alu::random(state, x, byte),
            Instruction::Drw { x, y, n } => alu::draw(state, x, y, n),
            Instruction::Skp { x } => program_flow::skip_if(state, |state| {
                state.keypad.pressed(state.registers[x as usize] & 0xF)
            }),
            Instruction::Sknp { x } => program_flow::skip_if(state, |state| {
                !state.keypad.pressed(state.registers[x as usize] & 0xF)
            }),
            Instruction::LdFromDelay { x } => system::load_delay_timer(state, x),
            Instruction::LdKey { x } => system::wait_for_key(state, x),
            Instruction::LdDelay { x } => system::set_delay_timer(state, x),
            Instruction::LdSound { x } => system::set_sound_timer(state, x),
            Instruction::AddIndex { x } => alu::add_index(state, x),
            Instruction::LdFont { x } => alu::load_font(state, x),
            Instruction::Bcd { x } => system::store_bcd(state, x),
            Instruction::StoreRegisters { x } => system::store_registers(state, x),
            Instruction::LoadRegisters { x } => system::load_registers(state, x),
            Instruction::Nop(word) => system::nop(state, word),
        }
    }
}
