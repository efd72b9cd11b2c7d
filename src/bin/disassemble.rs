use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use chip8_vm::chip::{
    chip8::{constants::CHIP8_PROGRAM_START, Chip8},
    Chip,
};

/// Prints the mnemonics of a CHIP-8 program.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the program to disassemble.
    rom: PathBuf,

    /// First address to disassemble, in hex.
    #[arg(long, value_parser = parse_address, default_value = "0x200")]
    start: u16,

    /// Number of instruction slots to print. Defaults to the whole program.
    #[arg(long)]
    count: Option<usize>,
}

fn parse_address(s: &str) -> Result<u16, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid address `{}`: {}", s, e))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut chip8 = Chip8::new();
    let size = match chip8.load_program(&cli.rom) {
        Ok(size) => size,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let end = usize::from(CHIP8_PROGRAM_START) + size;
    let count = cli
        .count
        .unwrap_or_else(|| end.saturating_sub(usize::from(cli.start)).div_ceil(2));

    for slot in 0..count {
        let address = usize::from(cli.start) + slot * 2;
        if address > 0xFFF {
            break;
        }
        let address = address as u16;
        println!(
            "0x{:03X}  {:04X}  {}",
            address,
            chip8.fetch(address),
            chip8.disassemble(address)
        );
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x2A0"), Ok(0x2A0));
        assert_eq!(parse_address("2a0"), Ok(0x2A0));
        assert!(parse_address("0xZZ").is_err());
    }
}
