use crate::chip::chip8::{Chip8, Chip8Config};
use crate::chip::{Chip, DisplaySink, Error, Keypad};

fn prepare_state_with_single_instruction(instruction: u16) -> Chip8 {
    let mut chip8 = Chip8::with_config(Chip8Config {
        seed: Some(0x5EED),
        ..Chip8Config::default()
    });
    chip8.memory[0x200] = ((instruction & 0xFF00) >> 8) as u8;
    chip8.memory[0x201] = (instruction & 0xFF) as u8;
    chip8
}

fn do_cycle(instruction: u16, before_cycle: impl FnOnce(&mut Chip8), after_cycle: impl FnOnce(&mut Chip8)) {
    let mut state = prepare_state_with_single_instruction(instruction);

    before_cycle(&mut state);
    state.cycle();
    after_cycle(&mut state);
}

fn write_instruction(chip8: &mut Chip8, address: u16, instruction: u16) {
    chip8.memory[address as usize] = (instruction >> 8) as u8;
    chip8.memory[address as usize + 1] = (instruction & 0xFF) as u8;
}

#[test]
fn test_new_chip_has_charset_and_starts_at_program() {
    let chip8 = Chip8::new();
    assert_eq!(chip8.program_counter, 0x200);
    assert_eq!(chip8.memory[0..5], [0xF0, 0x90, 0x90, 0x90, 0xF0]);
    assert_eq!(chip8.memory[75..80], [0xF0, 0x80, 0xF0, 0x80, 0x80]);
    assert!(chip8.memory[80..].iter().all(|&byte| byte == 0));
}

#[test]
fn test_load_rom_resets_state() {
    let mut chip8 = Chip8::with_config(Chip8Config {
        clock_hz: 1000,
        seed: None,
    });
    chip8.registers[3] = 7;
    chip8.stack_pointer = 2;
    chip8.output_pins[10] = 1;
    chip8.delay_timer = 9;
    chip8.memory[0x300] = 0xAB;

    assert_eq!(chip8.load_rom(&[0x12, 0x34, 0x56]).unwrap(), 3);

    assert_eq!(chip8.registers, [0; 16]);
    assert_eq!(chip8.stack_pointer, 0);
    assert_eq!(chip8.output_pins[10], 0);
    assert_eq!(chip8.delay_timer, 0);
    assert_eq!(chip8.memory[0x300], 0);
    assert_eq!(chip8.memory[0x200..0x203], [0x12, 0x34, 0x56]);
    assert_eq!(chip8.program_counter, 0x200);
    assert_eq!(chip8.config().clock_hz, 1000);
    assert!(!chip8.is_paused());
}

#[test]
fn test_oversized_rom_is_rejected_without_touching_state() {
    let mut chip8 = Chip8::new();
    chip8.load_rom(&[0x60, 0x01]).unwrap();
    chip8.cycle();

    let result = chip8.load_rom(&[0; 0xE01]);
    assert!(matches!(
        result,
        Err(Error::RomTooLarge {
            size: 0xE01,
            max: 0xE00
        })
    ));
    assert_eq!(chip8.registers[0], 1);
    assert_eq!(chip8.program_counter, 0x202);

    assert_eq!(chip8.load_rom(&[0xFF; 0xE00]).unwrap(), 0xE00);
    assert_eq!(chip8.memory[0xFFF], 0xFF);
}

#[test]
fn test_load_program_reports_missing_file() {
    let mut chip8 = Chip8::new();
    let result = chip8.load_program(std::path::Path::new("/nonexistent/program.ch8"));
    assert!(matches!(result, Err(Error::Io { .. })));
}

#[test]
fn test_paused_chip_does_not_cycle() {
    do_cycle(
        0x6105,
        |state| state.paused.store(true, std::sync::atomic::Ordering::Release),
        |state| {
            assert_eq!(state.program_counter, 0x200);
            assert_eq!(state.registers[1], 0);
        },
    );
}

#[test]
fn test_fetch_outside_memory_is_zero() {
    let mut chip8 = Chip8::new();
    chip8.memory[0xFFF] = 0x12;
    assert_eq!(chip8.fetch(0xFFE), 0x0012);
    assert_eq!(chip8.fetch(0xFFF), 0);
    assert_eq!(chip8.fetch(0xFFFF), 0);

    chip8.program_counter = 0xFFF;
    chip8.cycle();
    assert_eq!(chip8.program_counter, 0x1001);
    chip8.cycle();
    assert_eq!(chip8.program_counter, 0x1003);
}

#[test]
fn test_clear_screen() {
    do_cycle(
        0x00E0,
        |state| {
            state.output_pins[0] = 1;
            state.output_pins[2047] = 1;
            state.draw = false;
        },
        |state| {
            assert!(state.output_pins.iter().all(|&pixel| pixel == 0));
            assert!(state.take_draw_flag());
            assert!(!state.take_draw_flag());
            assert_eq!(state.program_counter, 0x202);
        },
    )
}

#[test]
fn test_return() {
    do_cycle(
        0x00EE,
        |state| {
            state.stack[0] = 0x300;
            state.stack_pointer = 1;
        },
        |state| {
            assert_eq!(state.stack_pointer, 0);
            assert_eq!(state.program_counter, 0x302);
        },
    )
}

#[test]
fn test_return_with_empty_stack_only_advances() {
    do_cycle(
        0x00EE,
        |_| {},
        |state| {
            assert_eq!(state.stack_pointer, 0);
            assert_eq!(state.program_counter, 0x202);
        },
    )
}

#[test]
fn test_jump() {
    do_cycle(
        0x1CAF,
        |state| {
            assert_eq!(state.program_counter, 0x200);
        },
        |state| {
            assert_eq!(state.program_counter, 0xCAF);
        },
    )
}

#[test]
fn test_call() {
    do_cycle(
        0x2CAF,
        |state| {
            assert_eq!(state.program_counter, 0x200);
        },
        |state| {
            assert_eq!(state.program_counter, 0xCAF);
            assert_eq!(state.stack_pointer, 1);
            assert_eq!(state.stack[0], 0x200);
        },
    )
}

#[test]
fn test_nested_calls_and_returns() {
    let mut chip8 = Chip8::new();
    write_instruction(&mut chip8, 0x200, 0x2300);
    for i in 0..15u16 {
        let address = 0x300 + 4 * i;
        write_instruction(&mut chip8, address, 0x2000 | (address + 4));
        write_instruction(&mut chip8, address + 2, 0x00EE);
    }
    write_instruction(&mut chip8, 0x33C, 0x00EE);

    let mut call_sites = Vec::new();
    for _ in 0..16 {
        call_sites.push(chip8.program_counter);
        chip8.cycle();
    }
    assert_eq!(chip8.stack_pointer, 16);
    assert_eq!(chip8.program_counter, 0x33C);
    assert_eq!(chip8.stack.to_vec(), call_sites);

    for call_site in call_sites.iter().rev() {
        chip8.cycle();
        assert_eq!(chip8.program_counter, call_site + 2);
    }
    assert_eq!(chip8.stack_pointer, 0);
    assert_eq!(chip8.program_counter, 0x202);
}

#[test]
fn test_call_with_full_stack_is_dropped() {
    do_cycle(
        0x2CAF,
        |state| {
            state.stack_pointer = 16;
            state.stack = [0x123; 16];
        },
        |state| {
            assert_eq!(state.stack_pointer, 16);
            assert_eq!(state.stack, [0x123; 16]);
            assert_eq!(state.program_counter, 0x202);
            assert_eq!(state.memory[0x200..0x202], [0x2C, 0xAF]);
        },
    )
}

#[test]
fn test_skip_if_equal() {
    do_cycle(
        0x34AF,
        |state| {
            state.registers[4] = 0xAF;
            assert_eq!(state.program_counter, 0x200);
        },
        |state| {
            assert_eq!(state.program_counter, 0x204);
        },
    );

    do_cycle(
        0x34BF,
        |state| {
            state.registers[4] = 0xAF;
            assert_eq!(state.program_counter, 0x200);
        },
        |state| {
            assert_eq!(state.program_counter, 0x202);
        },
    );
}

#[test]
fn test_skip_if_not_equal() {
    do_cycle(0x4111, |_| {}, |state| assert_eq!(state.program_counter, 0x204));
    do_cycle(
        0x4111,
        |state| state.registers[1] = 0x11,
        |state| assert_eq!(state.program_counter, 0x202),
    );
}

#[test]
fn test_skip_if_registers_equal() {
    do_cycle(
        0x5120,
        |state| {
            state.registers[1] = 0x11;
            state.registers[2] = 0x11;
        },
        |state| assert_eq!(state.program_counter, 0x204),
    );
    do_cycle(
        0x5120,
        |state| state.registers[1] = 0x11,
        |state| assert_eq!(state.program_counter, 0x202),
    );
}

#[test]
fn test_skip_if_registers_not_equal() {
    do_cycle(
        0x9120,
        |state| state.registers[1] = 0x11,
        |state| assert_eq!(state.program_counter, 0x204),
    );
    do_cycle(0x9120, |_| {}, |state| assert_eq!(state.program_counter, 0x202));
}

#[test]
fn test_load_and_add_byte() {
    do_cycle(0x6122, |_| {}, |state| {
        assert_eq!(state.registers[1], 0x22);
        assert_eq!(state.program_counter, 0x202);
    });

    do_cycle(
        0x7101,
        |state| {
            state.registers[1] = 0xFF;
            state.registers[0xF] = 0x7;
        },
        |state| {
            assert_eq!(state.registers[1], 0x00);
            assert_eq!(state.registers[0xF], 0x7);
        },
    );
}

#[test]
fn test_bitwise_operations() {
    for (instruction, expected) in [(0x8120, 0x3), (0x8121, 0x7), (0x8122, 0x2), (0x8123, 0x5)] {
        do_cycle(
            instruction,
            |state| {
                state.registers[1] = 0x6;
                state.registers[2] = 0x3;
            },
            |state| {
                assert_eq!(state.registers[1], expected, "instruction {:04X}", instruction);
                assert_eq!(state.program_counter, 0x202);
            },
        );
    }
}

#[test]
fn test_add_with_carry() {
    do_cycle(
        0x8124,
        |state| {
            state.registers[1] = 0xFF;
            state.registers[2] = 0x01;
        },
        |state| {
            assert_eq!(state.registers[1], 0x00);
            assert_eq!(state.registers[0xF], 1);
        },
    );

    do_cycle(
        0x8124,
        |state| {
            state.registers[1] = 0x01;
            state.registers[2] = 0x01;
            state.registers[0xF] = 1;
        },
        |state| {
            assert_eq!(state.registers[1], 0x02);
            assert_eq!(state.registers[0xF], 0);
        },
    );
}

#[test]
fn test_sub_with_borrow() {
    do_cycle(
        0x8125,
        |state| {
            state.registers[1] = 0x05;
            state.registers[2] = 0x03;
        },
        |state| {
            assert_eq!(state.registers[1], 0x02);
            assert_eq!(state.registers[0xF], 1);
        },
    );

    do_cycle(
        0x8125,
        |state| {
            state.registers[1] = 0x03;
            state.registers[2] = 0x05;
        },
        |state| {
            assert_eq!(state.registers[1], 0xFE);
            assert_eq!(state.registers[0xF], 0);
        },
    );

    do_cycle(
        0x8125,
        |state| {
            state.registers[1] = 0x05;
            state.registers[2] = 0x05;
        },
        |state| {
            assert_eq!(state.registers[1], 0x00);
            assert_eq!(state.registers[0xF], 1);
        },
    );
}

#[test]
fn test_reverse_sub_with_borrow() {
    do_cycle(
        0x8127,
        |state| {
            state.registers[1] = 0x11;
            state.registers[2] = 0x33;
        },
        |state| {
            assert_eq!(state.registers[1], 0x22);
            assert_eq!(state.registers[0xF], 1);
        },
    );

    do_cycle(
        0x8127,
        |state| {
            state.registers[1] = 0x12;
            state.registers[2] = 0x11;
        },
        |state| {
            assert_eq!(state.registers[1], 0xFF);
            assert_eq!(state.registers[0xF], 0);
        },
    );
}

#[test]
fn test_shifts() {
    do_cycle(
        0x8106,
        |state| state.registers[1] = 0x5,
        |state| {
            assert_eq!(state.registers[1], 0x2);
            assert_eq!(state.registers[0xF], 1);
        },
    );

    do_cycle(
        0x8106,
        |state| state.registers[1] = 0x4,
        |state| {
            assert_eq!(state.registers[1], 0x2);
            assert_eq!(state.registers[0xF], 0);
        },
    );

    do_cycle(
        0x810E,
        |state| state.registers[1] = 0xFF,
        |state| {
            assert_eq!(state.registers[1], 0xFE);
            assert_eq!(state.registers[0xF], 1);
        },
    );

    do_cycle(
        0x810E,
        |state| state.registers[1] = 0x4,
        |state| {
            assert_eq!(state.registers[1], 0x8);
            assert_eq!(state.registers[0xF], 0);
        },
    );
}

#[test]
fn test_flag_wins_when_vf_is_the_destination() {
    do_cycle(
        0x8F14,
        |state| {
            state.registers[0xF] = 0xFF;
            state.registers[1] = 0x02;
        },
        |state| assert_eq!(state.registers[0xF], 1),
    );
}

#[test]
fn test_load_index() {
    do_cycle(0xAABC, |_| {}, |state| {
        assert_eq!(state.index, 0xABC);
        assert_eq!(state.program_counter, 0x202);
    });
}

#[test]
fn test_jump_with_offset() {
    do_cycle(
        0xBABC,
        |state| state.registers[0] = 0x2,
        |state| assert_eq!(state.program_counter, 0xABE),
    );

    do_cycle(
        0xB300,
        |state| state.registers[0] = 0x80,
        |state| assert_eq!(state.program_counter, 0x380),
    );

    do_cycle(
        0xBFFF,
        |state| state.registers[0] = 0xFF,
        |state| assert_eq!(state.program_counter, 0x0FE),
    );
}

#[test]
fn test_random_is_masked() {
    do_cycle(
        0xC10F,
        |state| state.registers[1] = 0xFF,
        |state| {
            assert_eq!(state.registers[1] & 0xF0, 0);
            assert_eq!(state.program_counter, 0x202);
        },
    );

    do_cycle(0xC100, |state| state.registers[1] = 0xFF, |state| {
        assert_eq!(state.registers[1], 0);
    });
}

#[test]
fn test_random_is_reproducible_with_seed() {
    let run = || {
        let mut chip8 = Chip8::with_config(Chip8Config {
            seed: Some(42),
            ..Chip8Config::default()
        });
        chip8.load_rom(&[0xC1, 0xFF, 0xC2, 0xFF, 0xC3, 0xFF]).unwrap();
        for _ in 0..3 {
            chip8.cycle();
        }
        chip8.registers
    };
    assert_eq!(run(), run());
}

#[test]
fn test_draw_font_glyph() {
    do_cycle(
        0xD015,
        |state| {
            state.registers[0] = 1;
            state.registers[1] = 2;
            state.draw = false;
        },
        |state| {
            let row = |y: usize| state.output_pins[y * 64 + 1..y * 64 + 5].to_vec();
            assert_eq!(row(2), [1, 1, 1, 1]);
            assert_eq!(row(3), [1, 0, 0, 1]);
            assert_eq!(row(5), [1, 0, 0, 1]);
            assert_eq!(row(6), [1, 1, 1, 1]);
            assert_eq!(state.registers[0xF], 0);
            assert!(state.draw_flag());
            assert_eq!(state.program_counter, 0x202);
        },
    );
}

#[test]
fn test_draw_wraps_and_detects_collision() {
    let mut chip8 = prepare_state_with_single_instruction(0xD012);
    write_instruction(&mut chip8, 0x202, 0xD012);
    chip8.registers[0] = 60;
    chip8.registers[1] = 30;
    chip8.index = 0x300;
    chip8.memory[0x300] = 0xFF;
    chip8.memory[0x301] = 0x81;
    // a pixel the sprite does not cover
    chip8.output_pins[0] = 1;

    chip8.cycle();

    for x in [60, 61, 62, 63, 0, 1, 2, 3] {
        assert_eq!(chip8.output_pins[30 * 64 + x], 1, "row 30, column {}", x);
    }
    assert_eq!(chip8.output_pins[31 * 64 + 60], 1);
    assert_eq!(chip8.output_pins[31 * 64 + 3], 1);
    assert_eq!(chip8.output_pins[31 * 64 + 61], 0);
    assert_eq!(chip8.output_pins.iter().filter(|&&pixel| pixel == 1).count(), 11);
    assert_eq!(chip8.registers[0xF], 0);

    chip8.cycle();

    assert_eq!(chip8.output_pins.iter().filter(|&&pixel| pixel == 1).count(), 1);
    assert_eq!(chip8.registers[0xF], 1);
}

#[test]
fn test_draw_with_coordinates_beyond_screen() {
    do_cycle(
        0xD011,
        |state| {
            state.registers[0] = 64 + 3;
            state.registers[1] = 32 + 4;
            state.index = 0x300;
            state.memory[0x300] = 0x80;
        },
        |state| assert_eq!(state.output_pins[4 * 64 + 3], 1),
    );
}

struct OnlyKey(u8);

impl Keypad for OnlyKey {
    fn pressed(&self, key: u8) -> bool {
        key == self.0
    }
}

#[test]
fn test_skip_if_key_pressed() {
    do_cycle(
        0xE19E,
        |state| {
            state.registers[1] = 0xE;
            state.keypad_mut().set(0xE, true);
        },
        |state| assert_eq!(state.program_counter, 0x204),
    );
    do_cycle(
        0xE19E,
        |state| state.registers[1] = 0xE,
        |state| assert_eq!(state.program_counter, 0x202),
    );
}

#[test]
fn test_skip_if_key_not_pressed() {
    do_cycle(0xE1A1, |_| {}, |state| assert_eq!(state.program_counter, 0x204));
    do_cycle(
        0xE1A1,
        |state| {
            state.registers[1] = 0xE;
            state.keypad_mut().set(0xE, true);
        },
        |state| assert_eq!(state.program_counter, 0x202),
    );
}

#[test]
fn test_skip_with_custom_keypad() {
    let mut chip8 = Chip8::with_keypad(OnlyKey(0x7), Chip8Config::default());
    // SKP V0 with V0 = 0x17 addresses key 0x7
    chip8.load_rom(&[0x60, 0x17, 0xE0, 0x9E]).unwrap();
    chip8.cycle();
    chip8.cycle();
    assert_eq!(chip8.program_counter, 0x206);
}

#[test]
fn test_wait_for_key() {
    let mut chip8 = prepare_state_with_single_instruction(0xF30A);

    for _ in 0..3 {
        chip8.cycle();
        assert_eq!(chip8.program_counter, 0x200);
    }

    chip8.keypad_mut().set(0xC, true);
    chip8.keypad_mut().set(0x5, true);
    chip8.cycle();
    assert_eq!(chip8.registers[3], 0xC);
    assert_eq!(chip8.program_counter, 0x202);
}

#[test]
fn test_wait_for_key_takes_highest_pressed_key() {
    do_cycle(
        0xF10A,
        |state| {
            state.keypad_mut().set(0x0, true);
            state.keypad_mut().set(0x7, true);
            state.keypad_mut().set(0xF, true);
        },
        |state| {
            assert_eq!(state.registers[1], 0xF);
            assert_eq!(state.program_counter, 0x202);
        },
    );

    do_cycle(
        0xF10A,
        |state| state.keypad_mut().set(0x0, true),
        |state| {
            assert_eq!(state.registers[1], 0x0);
            assert_eq!(state.program_counter, 0x202);
        },
    );
}

#[test]
fn test_timers() {
    do_cycle(
        0xF107,
        |state| state.delay_timer = 0xF,
        |state| assert_eq!(state.registers[1], 0xF),
    );
    do_cycle(
        0xF115,
        |state| state.registers[1] = 0xF,
        |state| assert_eq!(state.delay_timer, 0xF),
    );
    do_cycle(
        0xF118,
        |state| state.registers[1] = 0x2,
        |state| {
            assert_eq!(state.sound_timer, 0x2);
            assert!(state.sound_active());
            state.tick_timers();
            state.tick_timers();
            state.tick_timers();
            assert_eq!(state.sound_timer, 0);
            assert!(!state.sound_active());
        },
    );
}

#[test]
fn test_add_index() {
    do_cycle(
        0xF11E,
        |state| {
            state.index = 0x1;
            state.registers[1] = 0x1;
            state.registers[0xF] = 1;
        },
        |state| {
            assert_eq!(state.index, 0x2);
            assert_eq!(state.registers[1], 0x1);
            assert_eq!(state.registers[0xF], 0);
        },
    );

    do_cycle(
        0xF11E,
        |state| {
            state.index = 0xFFFF;
            state.registers[1] = 0x2;
        },
        |state| {
            assert_eq!(state.index, 0x1);
            assert_eq!(state.registers[0xF], 1);
        },
    );
}

#[test]
fn test_load_font() {
    do_cycle(
        0xF129,
        |state| state.registers[1] = 0x2,
        |state| {
            assert_eq!(state.index, 0xA);
            assert_eq!(state.memory[0xA], 0xF0);
        },
    );
}

#[test]
fn test_bcd() {
    do_cycle(
        0xF133,
        |state| {
            state.registers[1] = 123;
            state.index = 0x300;
        },
        |state| assert_eq!(state.memory[0x300..0x303], [1, 2, 3]),
    );
    do_cycle(
        0xF133,
        |state| {
            state.registers[1] = 7;
            state.index = 0x300;
        },
        |state| assert_eq!(state.memory[0x300..0x303], [0, 0, 7]),
    );
}

#[test]
fn test_bcd_wraps_around_memory() {
    do_cycle(
        0xF133,
        |state| {
            state.registers[1] = 255;
            state.index = 0xFFF;
        },
        |state| {
            assert_eq!(state.memory[0xFFF], 2);
            assert_eq!(state.memory[0x0], 5);
            assert_eq!(state.memory[0x1], 5);
        },
    );
}

#[test]
fn test_store_and_load_registers() {
    do_cycle(
        0xF455,
        |state| {
            state.index = 0x300;
            state.registers[0..6].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        },
        |state| {
            assert_eq!(state.memory[0x300..0x306], [1, 2, 3, 4, 5, 0]);
            assert_eq!(state.index, 0x300);
        },
    );

    do_cycle(
        0xF465,
        |state| {
            state.index = 0x300;
            state.memory[0x300..0x306].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        },
        |state| {
            assert_eq!(state.registers[0..6], [1, 2, 3, 4, 5, 0]);
            assert_eq!(state.index, 0x300);
        },
    );
}

#[test]
fn test_unknown_opcodes_only_advance() {
    for instruction in [0x0123, 0x5121, 0x8128, 0xE1FF, 0xF1FF] {
        do_cycle(
            instruction,
            |_| {},
            |state| {
                assert_eq!(state.program_counter, 0x202, "opcode {:04X}", instruction);
                assert_eq!(state.registers, [0; 16]);
            },
        );
    }
}

#[test]
fn test_disassemble_zeroed_memory_is_nop() {
    let chip8 = Chip8::new();
    assert_eq!(chip8.disassemble(0x200), "NOP");
    assert_eq!(chip8.disassemble(0xFFF), "NOP");
}

#[test]
fn test_disassemble_does_not_mutate() {
    let chip8 = prepare_state_with_single_instruction(0x00E0);
    let before = chip8.save_state().unwrap();
    assert_eq!(chip8.disassemble(0x200), "CLS");
    assert_eq!(chip8.save_state().unwrap(), before);
}

#[derive(Default)]
struct RecordingSink {
    frames: Vec<Vec<u8>>,
}

impl DisplaySink for RecordingSink {
    fn present(&mut self, pixels: &[u8]) {
        self.frames.push(pixels.to_vec());
    }
}

#[test]
fn test_present_only_changed_frames() {
    let mut chip8 = prepare_state_with_single_instruction(0xD015);
    let mut sink = RecordingSink::default();

    chip8.present(&mut sink);
    assert_eq!(sink.frames.len(), 1);
    chip8.present(&mut sink);
    assert_eq!(sink.frames.len(), 1);

    chip8.cycle();
    chip8.present(&mut sink);
    assert_eq!(sink.frames.len(), 2);
    assert_eq!(sink.frames[1][0..4], [1, 1, 1, 1]);
}
