use std::fmt;

use crate::chip::chip8::Instruction;

/// Renders the mnemonic of the instruction. Everything outside of the
/// instruction set renders as `NOP`, which is exactly what executing it does.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Instruction::Cls => write!(f, "CLS"),
            Instruction::Ret => write!(f, "RET"),
            Instruction::Jp { address } => write!(f, "JP 0x{:03X}", address),
            Instruction::Call { address } => write!(f, "CALL 0x{:03X}", address),
            Instruction::SeByte { x, byte } => write!(f, "SE V{:X}, 0x{:02X}", x, byte),
            Instruction::SneByte { x, byte } => write!(f, "SNE V{:X}, 0x{:02X}", x, byte),
            Instruction::SeReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            Instruction::LdByte { x, byte } => write!(f, "LD V{:X}, 0x{:02X}", x, byte),
            Instruction::AddByte { x, byte } => write!(f, "ADD V{:X}, 0x{:02X}", x, byte),
            Instruction::LdReg { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Instruction::Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            Instruction::And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Instruction::Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            Instruction::AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Instruction::Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            Instruction::Shr { x } => write!(f, "SHR V{:X}", x),
            Instruction::Subn { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Instruction::Shl { x } => write!(f, "SHL V{:X}", x),
            Instruction::SneReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            Instruction::LdIndex { address } => write!(f, "LD I, 0x{:03X}", address),
            Instruction::JpOffset { address } => write!(f, "JP V0, 0x{:03X}", address),
            Instruction::Rnd { x, byte } => write!(f, "RND V{:X}, 0x{:02X}", x, byte),
            Instruction::Drw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, 0x{:X}", x, y, n),
            Instruction::Skp { x } => write!(f, "SKP V{:X}", x),
            Instruction::Sknp { x } => write!(f, "SKNP V{:X}", x),
            Instruction::LdFromDelay { x } => write!(f, "LD V{:X}, DT", x),
            Instruction::LdKey { x } => write!(f, "LD V{:X}, K", x),
            Instruction::LdDelay { x } => write!(f, "LD DT, V{:X}", x),
            Instruction::LdSound { x } => write!(f, "LD ST, V{:X}", x),
            Instruction::AddIndex { x } => write!(f, "ADD I, V{:X}", x),
            Instruction::LdFont { x } => write!(f, "LD F, V{:X}", x),
            Instruction::Bcd { x } => write!(f, "LD B, V{:X}", x),
            Instruction::StoreRegisters { x } => write!(f, "LD [I], V{:X}", x),
            Instruction::LoadRegisters { x } => write!(f, "LD V{:X}, [I]", x),
            Instruction::Nop(_) => write!(f, "NOP"),
        }
    }
}
