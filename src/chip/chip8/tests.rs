use ux::u4;

use crate::chip::chip8::{
    constants::{CHIP8_CHARSET, CHIP8_DISPLAY_WIDTH},
    Chip8, KeyWait, Quirks,
};
use crate::chip::{Chip, ExecutionError, FaultKind, Keypad, LoadProgramError};

fn prepare_state_with_single_instruction(instruction: u16) -> Chip8 {
    prepare_state_with_quirks(instruction, Quirks::default())
}

fn prepare_state_with_quirks(instruction: u16, quirks: Quirks) -> Chip8 {
    let mut chip8 = Chip8::with_quirks(quirks);
    chip8.memory[0x200] = ((instruction & 0xFF00) >> 8) as u8;
    chip8.memory[0x201] = (instruction & 0xFF) as u8;
    chip8
}

fn do_cycle(instruction: u16, before_cycle: fn(&mut Chip8), after_cycle: fn(&mut Chip8)) {
    let mut state = prepare_state_with_single_instruction(instruction);

    before_cycle(&mut state);
    state.step(&Keypad::new()).unwrap();
    after_cycle(&mut state);
}

fn do_faulting_cycle(instruction: u16, before_cycle: fn(&mut Chip8)) -> FaultKind {
    let mut state = prepare_state_with_single_instruction(instruction);
    before_cycle(&mut state);

    let untouched = state.clone();
    let error = state.step(&Keypad::new()).unwrap_err();

    assert_eq!(error.address, untouched.program_counter);
    assert_eq!(state.registers, untouched.registers);
    assert_eq!(state.program_counter, untouched.program_counter);
    assert_eq!(state.stack_pointer, untouched.stack_pointer);
    assert_eq!(state.index, untouched.index);
    error.kind
}

fn keypad_with(keys: &[u8]) -> Keypad {
    let mut keypad = Keypad::new();
    for key in keys {
        keypad.press(u4::new(*key));
    }
    keypad
}

#[test]
fn test_initial_state() {
    let chip8 = Chip8::new();
    assert_eq!(chip8.program_counter, 0x200);
    assert_eq!(&chip8.memory[0..80], &CHIP8_CHARSET[..]);
    assert!(chip8.memory[80..].iter().all(|byte| *byte == 0));
    assert_eq!(chip8.registers, [0; 16]);
    assert_eq!(chip8.stack_pointer, 0);
    assert!(!chip8.sound_gate);
}

#[test]
fn test_load_program_bytes() {
    let mut chip8 = Chip8::new();
    assert_eq!(chip8.load_program_bytes(&[0x12, 0x34, 0x56]).unwrap(), 3);
    assert_eq!(&chip8.memory[0x200..0x203], &[0x12, 0x34, 0x56]);

    let largest = vec![0xAB; 0x1000 - 0x200];
    assert!(chip8.load_program_bytes(&largest).is_ok());
    assert_eq!(chip8.memory[0xFFF], 0xAB);
}

#[test]
fn test_load_program_too_large() {
    let mut chip8 = Chip8::new();
    let too_large = vec![0xAB; 0x1000 - 0x200 + 1];
    match chip8.load_program_bytes(&too_large) {
        Err(LoadProgramError::ProgramTooLarge { size, max }) => {
            assert_eq!(size, 3585);
            assert_eq!(max, 3584);
        }
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(chip8.memory[0x200], 0);
}

#[test]
fn test_clear_screen() {
    do_cycle(
        0x00E0,
        |state| {
            state.framebuffer[5] = 1;
            state.framebuffer[2047] = 1;
        },
        |state| {
            assert!(state.framebuffer.iter().all(|pixel| *pixel == 0));
            assert_eq!(state.program_counter, 0x202);
            assert!(state.take_draw_flag());
        },
    )
}

#[test]
fn test_machine_code_routine_faults() {
    assert_eq!(
        do_faulting_cycle(0x0123, |_| {}),
        FaultKind::UnknownOpcode(0x0123)
    );
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
            assert_eq!(state.stack[(state.stack_pointer - 1) as usize], 0x202);
        },
    )
}

#[test]
fn test_call_then_return() {
    let mut chip8 = Chip8::new();
    // 0x200: CALL 0x300, 0x300: RET
    chip8.load_program_bytes(&[0x23, 0x00]).unwrap();
    chip8.memory[0x300] = 0x00;
    chip8.memory[0x301] = 0xEE;

    let keypad = Keypad::new();
    chip8.step(&keypad).unwrap();
    assert_eq!(chip8.program_counter, 0x300);
    chip8.step(&keypad).unwrap();
    assert_eq!(chip8.program_counter, 0x202);
    assert_eq!(chip8.stack_pointer, 0);
}

#[test]
fn test_return_with_empty_stack_faults() {
    assert_eq!(do_faulting_cycle(0x00EE, |_| {}), FaultKind::StackUnderflow);
}

#[test]
fn test_sixteen_nested_calls_then_overflow() {
    let mut chip8 = Chip8::new();
    // every instruction calls the next one
    for i in 0..17u16 {
        let target = 0x202 + 2 * i;
        let address = (0x200 + 2 * i) as usize;
        chip8.memory[address] = 0x20 | (target >> 8) as u8;
        chip8.memory[address + 1] = (target & 0xFF) as u8;
    }

    let keypad = Keypad::new();
    for _ in 0..16 {
        chip8.step(&keypad).unwrap();
    }
    assert_eq!(chip8.stack_pointer, 16);
    assert_eq!(chip8.program_counter, 0x220);

    let error = chip8.step(&keypad).unwrap_err();
    assert_eq!(
        error,
        ExecutionError {
            address: 0x220,
            kind: FaultKind::StackOverflow
        }
    );
    assert_eq!(chip8.stack_pointer, 16);
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
    do_cycle(
        0x4A10,
        |state| state.registers[0xA] = 0x11,
        |state| assert_eq!(state.program_counter, 0x204),
    );
    do_cycle(
        0x4A11,
        |state| state.registers[0xA] = 0x11,
        |state| assert_eq!(state.program_counter, 0x202),
    );
}

#[test]
fn test_skip_if_registers_equal() {
    do_cycle(
        0x5120,
        |state| {
            state.registers[1] = 7;
            state.registers[2] = 7;
        },
        |state| assert_eq!(state.program_counter, 0x204),
    );
    do_cycle(
        0x9120,
        |state| {
            state.registers[1] = 7;
            state.registers[2] = 7;
        },
        |state| assert_eq!(state.program_counter, 0x202),
    );
    do_cycle(
        0x9120,
        |state| state.registers[1] = 7,
        |state| assert_eq!(state.program_counter, 0x204),
    );
}

#[test]
fn test_register_skips_need_zero_low_nibble() {
    assert_eq!(
        do_faulting_cycle(0x5121, |_| {}),
        FaultKind::UnknownOpcode(0x5121)
    );
    assert_eq!(
        do_faulting_cycle(0x912F, |_| {}),
        FaultKind::UnknownOpcode(0x912F)
    );
}

#[test]
fn test_load_and_add_immediate() {
    do_cycle(
        0x6A42,
        |_| {},
        |state| assert_eq!(state.registers[0xA], 0x42),
    );
    do_cycle(
        0x7AFF,
        |state| {
            state.registers[0xA] = 0x02;
            state.registers[0xF] = 0x55;
        },
        |state| {
            assert_eq!(state.registers[0xA], 0x01);
            // the immediate add never touches the flag
            assert_eq!(state.registers[0xF], 0x55);
        },
    );
}

#[test]
fn test_add_with_carry_for_all_values() {
    for a in 0..=255u8 {
        for b in (0..=255u8).step_by(7) {
            let mut state = prepare_state_with_single_instruction(0x8124);
            state.registers[1] = a;
            state.registers[2] = b;
            state.step(&Keypad::new()).unwrap();

            let sum = a as u16 + b as u16;
            assert_eq!(state.registers[1], (sum % 256) as u8);
            assert_eq!(state.registers[0xF], (sum >= 256) as u8);
        }
    }
}

#[test]
fn test_subtract_for_all_values() {
    for a in 0..=255u8 {
        for b in (0..=255u8).step_by(5) {
            let mut state = prepare_state_with_single_instruction(0x8125);
            state.registers[1] = a;
            state.registers[2] = b;
            state.step(&Keypad::new()).unwrap();

            assert_eq!(state.registers[1], a.wrapping_sub(b));
            assert_eq!(state.registers[0xF], (a >= b) as u8);

            let mut state = prepare_state_with_single_instruction(0x8127);
            state.registers[1] = a;
            state.registers[2] = b;
            state.step(&Keypad::new()).unwrap();

            assert_eq!(state.registers[1], b.wrapping_sub(a));
            assert_eq!(state.registers[0xF], (b >= a) as u8);
        }
    }
}

#[test]
fn test_equal_operands_subtract_without_borrow() {
    do_cycle(
        0x8125,
        |state| {
            state.registers[1] = 9;
            state.registers[2] = 9;
        },
        |state| {
            assert_eq!(state.registers[1], 0);
            assert_eq!(state.registers[0xF], 1);
        },
    );
}

#[test]
fn test_flag_wins_when_destination_is_vf() {
    do_cycle(
        0x8F14,
        |state| {
            state.registers[0xF] = 0xFF;
            state.registers[1] = 0x01;
        },
        |state| assert_eq!(state.registers[0xF], 1),
    );
    do_cycle(
        0x8F15,
        |state| {
            state.registers[0xF] = 0x10;
            state.registers[1] = 0x01;
        },
        |state| assert_eq!(state.registers[0xF], 1),
    );
}

#[test]
fn test_register_load_and_logic() {
    do_cycle(
        0x8120,
        |state| state.registers[2] = 0x3C,
        |state| assert_eq!(state.registers[1], 0x3C),
    );
    do_cycle(
        0x8121,
        |state| {
            state.registers[1] = 0xF0;
            state.registers[2] = 0x0F;
            state.registers[0xF] = 1;
        },
        |state| {
            assert_eq!(state.registers[1], 0xFF);
            assert_eq!(state.registers[0xF], 0);
        },
    );
    do_cycle(
        0x8122,
        |state| {
            state.registers[1] = 0xF3;
            state.registers[2] = 0x3F;
            state.registers[0xF] = 1;
        },
        |state| {
            assert_eq!(state.registers[1], 0x33);
            assert_eq!(state.registers[0xF], 0);
        },
    );
    do_cycle(
        0x8123,
        |state| {
            state.registers[1] = 0xFF;
            state.registers[2] = 0x0F;
            state.registers[0xF] = 1;
        },
        |state| {
            assert_eq!(state.registers[1], 0xF0);
            assert_eq!(state.registers[0xF], 0);
        },
    );
}

#[test]
fn test_logic_keeps_flag_without_quirk() {
    let quirks = Quirks {
        logic_resets_flag: false,
        ..Quirks::default()
    };
    let mut state = prepare_state_with_quirks(0x8121, quirks);
    state.registers[0xF] = 1;
    state.step(&Keypad::new()).unwrap();
    assert_eq!(state.registers[0xF], 1);
}

#[test]
fn test_shifts_read_vx() {
    do_cycle(
        0x8126,
        |state| {
            state.registers[1] = 0b0000_0101;
            state.registers[2] = 0xFF;
        },
        |state| {
            assert_eq!(state.registers[1], 0b0000_0010);
            assert_eq!(state.registers[0xF], 1);
        },
    );
    do_cycle(
        0x812E,
        |state| {
            state.registers[1] = 0b1000_0001;
            state.registers[2] = 0x00;
        },
        |state| {
            assert_eq!(state.registers[1], 0b0000_0010);
            assert_eq!(state.registers[0xF], 1);
        },
    );
    do_cycle(
        0x812E,
        |state| state.registers[1] = 0b0100_0000,
        |state| {
            assert_eq!(state.registers[1], 0b1000_0000);
            assert_eq!(state.registers[0xF], 0);
        },
    );
}

#[test]
fn test_shifts_read_vy_with_quirk() {
    let quirks = Quirks::cosmac_vip();

    let mut state = prepare_state_with_quirks(0x8126, quirks);
    state.registers[1] = 0xFF;
    state.registers[2] = 0b0000_0110;
    state.step(&Keypad::new()).unwrap();
    assert_eq!(state.registers[1], 0b0000_0011);
    assert_eq!(state.registers[2], 0b0000_0110);
    assert_eq!(state.registers[0xF], 0);

    let mut state = prepare_state_with_quirks(0x812E, quirks);
    state.registers[1] = 0x00;
    state.registers[2] = 0b1100_0000;
    state.step(&Keypad::new()).unwrap();
    assert_eq!(state.registers[1], 0b1000_0000);
    assert_eq!(state.registers[0xF], 1);
}

#[test]
fn test_unknown_register_operation_faults() {
    for op in [0x8, 0x9, 0xA, 0xB, 0xC, 0xD, 0xF] {
        let opcode = 0x8120 | op;
        assert_eq!(
            do_faulting_cycle(opcode, |_| {}),
            FaultKind::UnknownOpcode(opcode)
        );
    }
}

#[test]
fn test_load_index() {
    do_cycle(0xA123, |_| {}, |state| assert_eq!(state.index, 0x123));
}

#[test]
fn test_jump_with_offset() {
    do_cycle(
        0xB300,
        |state| state.registers[0] = 0x42,
        |state| assert_eq!(state.program_counter, 0x342),
    );
}

#[test]
fn test_jump_with_offset_out_of_range_faults() {
    assert_eq!(
        do_faulting_cycle(0xBFFF, |state| state.registers[0] = 0x01),
        FaultKind::TargetOutOfRange(0x1000)
    );
}

#[test]
fn test_program_counter_out_of_range_faults() {
    let mut chip8 = Chip8::new();
    chip8.program_counter = 0xFFF;
    assert_eq!(
        chip8.step(&Keypad::new()).unwrap_err().kind,
        FaultKind::ProgramCounterOutOfRange(0xFFF)
    );

    // a jump to the last byte of memory is allowed, fetching from it is not
    let mut chip8 = prepare_state_with_single_instruction(0x1FFF);
    chip8.step(&Keypad::new()).unwrap();
    assert!(chip8.step(&Keypad::new()).is_err());
}

#[test]
fn test_random_respects_mask() {
    for _ in 0..64 {
        do_cycle(
            0xC30F,
            |state| state.registers[3] = 0xFF,
            |state| assert_eq!(state.registers[3] & 0xF0, 0),
        );
    }
    do_cycle(
        0xC300,
        |state| state.registers[3] = 0xFF,
        |state| assert_eq!(state.registers[3], 0),
    );
}

#[test]
fn test_draw_glyph() {
    do_cycle(
        0xD015,
        |state| state.index = 0,
        |state| {
            for (row, glyph_row) in CHIP8_CHARSET[0..5].iter().enumerate() {
                for column in 0..8 {
                    let expected = (glyph_row >> (7 - column)) & 1;
                    assert_eq!(
                        state.framebuffer[row * CHIP8_DISPLAY_WIDTH + column],
                        expected
                    );
                }
            }
            assert_eq!(state.registers[0xF], 0);
            assert!(state.take_draw_flag());
        },
    );
}

#[test]
fn test_draw_twice_restores_framebuffer() {
    let mut chip8 = Chip8::new();
    // LD I, glyph 8; DRW V0, V1, 5; DRW V0, V1, 5
    chip8
        .load_program_bytes(&[0xA0, 0x28, 0xD0, 0x15, 0xD0, 0x15])
        .unwrap();
    chip8.registers[0] = 10;
    chip8.registers[1] = 3;
    chip8.framebuffer[0] = 1;
    let before = chip8.framebuffer;

    let keypad = Keypad::new();
    chip8.step(&keypad).unwrap();
    chip8.step(&keypad).unwrap();
    assert_ne!(chip8.framebuffer, before);
    assert_eq!(chip8.registers[0xF], 0);

    chip8.step(&keypad).unwrap();
    assert_eq!(chip8.framebuffer, before);
    assert_eq!(chip8.registers[0xF], 1);
}

#[test]
fn test_draw_wraps_around_edges() {
    do_cycle(
        0xD011,
        |state| {
            state.registers[0] = 60;
            state.registers[1] = 31;
            state.index = 0x300;
            state.memory[0x300] = 0xFF;
        },
        |state| {
            let row = 31 * CHIP8_DISPLAY_WIDTH;
            for column in [60, 61, 62, 63, 0, 1, 2, 3] {
                assert_eq!(state.framebuffer[row + column], 1);
            }
            assert_eq!(state.framebuffer[row + 4], 0);
            assert_eq!(state.framebuffer[row + 59], 0);
        },
    );
    do_cycle(
        0xD012,
        |state| {
            state.registers[0] = 0;
            state.registers[1] = 31;
            state.index = 0x300;
            state.memory[0x300] = 0x80;
            state.memory[0x301] = 0x80;
        },
        |state| {
            assert_eq!(state.framebuffer[31 * CHIP8_DISPLAY_WIDTH], 1);
            assert_eq!(state.framebuffer[0], 1);
        },
    );
}

#[test]
fn test_draw_coordinates_wrap_before_drawing() {
    do_cycle(
        0xD011,
        |state| {
            state.registers[0] = 64 + 2;
            state.registers[1] = 32 + 1;
            state.index = 0x300;
            state.memory[0x300] = 0x80;
        },
        |state| assert_eq!(state.framebuffer[CHIP8_DISPLAY_WIDTH + 2], 1),
    );
}

#[test]
fn test_draw_reads_sprite_through_wrapping_index() {
    do_cycle(
        0xD012,
        |state| {
            state.index = 0xFFF;
            state.memory[0xFFF] = 0x80;
            // the second row wraps to address 0, the top row of glyph 0
        },
        |state| {
            assert_eq!(state.framebuffer[0], 1);
            assert_eq!(&state.framebuffer[CHIP8_DISPLAY_WIDTH..CHIP8_DISPLAY_WIDTH + 5], &[1, 1, 1, 1, 0]);
        },
    );
}

#[test]
fn test_draw_collision_sets_flag_last() {
    do_cycle(
        0xDF11,
        |state| {
            state.registers[0xF] = 0;
            state.registers[1] = 0;
            state.index = 0x300;
            state.memory[0x300] = 0x80;
            state.framebuffer[0] = 1;
        },
        |state| {
            assert_eq!(state.framebuffer[0], 0);
            assert_eq!(state.registers[0xF], 1);
        },
    );
}

#[test]
fn test_skip_if_key_pressed() {
    let mut state = prepare_state_with_single_instruction(0xE39E);
    state.registers[3] = 0xB;
    state.step(&keypad_with(&[0xB])).unwrap();
    assert_eq!(state.program_counter, 0x204);

    let mut state = prepare_state_with_single_instruction(0xE39E);
    state.registers[3] = 0xB;
    state.step(&keypad_with(&[0xA])).unwrap();
    assert_eq!(state.program_counter, 0x202);
}

#[test]
fn test_skip_if_key_not_pressed() {
    let mut state = prepare_state_with_single_instruction(0xE3A1);
    state.registers[3] = 0xB;
    state.step(&keypad_with(&[0xB])).unwrap();
    assert_eq!(state.program_counter, 0x202);

    let mut state = prepare_state_with_single_instruction(0xE3A1);
    state.registers[3] = 0xB;
    state.step(&Keypad::new()).unwrap();
    assert_eq!(state.program_counter, 0x204);
}

#[test]
fn test_key_index_out_of_range() {
    assert_eq!(
        do_faulting_cycle(0xE39E, |state| state.registers[3] = 0x1B),
        FaultKind::InvalidKey(0x1B)
    );

    let quirks = Quirks {
        mask_key_index: true,
        ..Quirks::default()
    };
    let mut state = prepare_state_with_quirks(0xE39E, quirks);
    state.registers[3] = 0x1B;
    state.step(&keypad_with(&[0xB])).unwrap();
    assert_eq!(state.program_counter, 0x204);
}

#[test]
fn test_unknown_key_operation_faults() {
    assert_eq!(
        do_faulting_cycle(0xE39F, |_| {}),
        FaultKind::UnknownOpcode(0xE39F)
    );
}

#[test]
fn test_timers_load_and_read() {
    do_cycle(
        0xF515,
        |state| state.registers[5] = 30,
        |state| assert_eq!(state.delay_timer, 30),
    );
    do_cycle(
        0xF507,
        |state| state.delay_timer = 17,
        |state| assert_eq!(state.registers[5], 17),
    );
}

#[test]
fn test_sound_timer_engages_gate() {
    do_cycle(
        0xF518,
        |state| state.registers[5] = 2,
        |state| {
            assert_eq!(state.sound_timer, 2);
            assert!(state.sound_gate());
            assert!(state.take_draw_flag());

            state.tick();
            assert!(state.sound_gate());
            state.tick();
            assert_eq!(state.sound_timer, 0);
            assert!(!state.sound_gate());
            assert!(state.take_draw_flag());

            state.tick();
            assert_eq!(state.sound_timer, 0);
        },
    );
    do_cycle(
        0xF518,
        |state| state.registers[5] = 0,
        |state| assert!(!state.sound_gate()),
    );
}

#[test]
fn test_tick_stops_at_zero() {
    let mut chip8 = Chip8::new();
    chip8.delay_timer = 1;
    chip8.tick();
    chip8.tick();
    assert_eq!(chip8.delay_timer, 0);
}

#[test]
fn test_steps_never_touch_timers() {
    let mut chip8 = Chip8::new();
    // JMP 0x200
    chip8.load_program_bytes(&[0x12, 0x00]).unwrap();
    chip8.delay_timer = 5;
    chip8.sound_timer = 5;
    for _ in 0..100 {
        chip8.step(&Keypad::new()).unwrap();
    }
    assert_eq!(chip8.delay_timer, 5);
    assert_eq!(chip8.sound_timer, 5);
}

#[test]
fn test_add_to_index() {
    do_cycle(
        0xF41E,
        |state| {
            state.index = 0xFFF;
            state.registers[4] = 0x02;
            state.registers[0xF] = 0;
        },
        |state| {
            assert_eq!(state.index, 0x1001);
            assert_eq!(state.registers[0xF], 0);
        },
    );
}

#[test]
fn test_glyph_address() {
    do_cycle(
        0xF429,
        |state| state.registers[4] = 0xA,
        |state| assert_eq!(state.index, 50),
    );
    do_cycle(
        0xF429,
        |state| state.registers[4] = 0x1F,
        |state| assert_eq!(state.index, 75),
    );
}

#[test]
fn test_store_bcd() {
    do_cycle(
        0xF433,
        |state| {
            state.registers[4] = 255;
            state.index = 0x300;
        },
        |state| {
            assert_eq!(&state.memory[0x300..0x303], &[2, 5, 5]);
            assert_eq!(state.index, 0x300);
        },
    );
    do_cycle(
        0xF433,
        |state| {
            state.registers[4] = 7;
            state.index = 0x300;
        },
        |state| assert_eq!(&state.memory[0x300..0x303], &[0, 0, 7]),
    );
}

#[test]
fn test_store_and_load_registers() {
    do_cycle(
        0xF255,
        |state| {
            state.registers[0] = 1;
            state.registers[1] = 2;
            state.registers[2] = 3;
            state.registers[3] = 4;
            state.index = 0x300;
        },
        |state| {
            assert_eq!(&state.memory[0x300..0x304], &[1, 2, 3, 0]);
            assert_eq!(state.index, 0x300);
        },
    );
    do_cycle(
        0xF165,
        |state| {
            state.memory[0x300] = 9;
            state.memory[0x301] = 8;
            state.memory[0x302] = 7;
            state.registers[2] = 0x42;
            state.index = 0x300;
        },
        |state| {
            assert_eq!(&state.registers[0..3], &[9, 8, 0x42]);
            assert_eq!(state.index, 0x300);
        },
    );
}

#[test]
fn test_store_and_load_advance_index_with_quirk() {
    let quirks = Quirks::cosmac_vip();

    let mut state = prepare_state_with_quirks(0xF255, quirks);
    state.index = 0x300;
    state.step(&Keypad::new()).unwrap();
    assert_eq!(state.index, 0x303);

    let mut state = prepare_state_with_quirks(0xF065, quirks);
    state.index = 0x300;
    state.step(&Keypad::new()).unwrap();
    assert_eq!(state.index, 0x301);
}

#[test]
fn test_unknown_timer_operation_faults() {
    assert_eq!(
        do_faulting_cycle(0xF4FF, |_| {}),
        FaultKind::UnknownOpcode(0xF4FF)
    );
}

#[test]
fn test_wait_for_key_press_then_release() {
    let mut chip8 = prepare_state_with_single_instruction(0xF70A);

    chip8.step(&Keypad::new()).unwrap();
    assert_eq!(chip8.program_counter, 0x200);
    assert_eq!(chip8.key_wait, KeyWait::Idle);

    chip8.step(&keypad_with(&[0x5])).unwrap();
    assert_eq!(chip8.program_counter, 0x200);
    assert_eq!(chip8.key_wait, KeyWait::Armed(0x5));

    // still held
    chip8.step(&keypad_with(&[0x5])).unwrap();
    assert_eq!(chip8.program_counter, 0x200);
    assert_eq!(chip8.registers[7], 0);

    chip8.step(&Keypad::new()).unwrap();
    assert_eq!(chip8.program_counter, 0x202);
    assert_eq!(chip8.registers[7], 0x5);
    assert_eq!(chip8.key_wait, KeyWait::Idle);
}

#[test]
fn test_wait_for_key_ignores_other_keys() {
    let mut chip8 = prepare_state_with_single_instruction(0xF70A);

    chip8.step(&keypad_with(&[0x5])).unwrap();
    // the tracked key stays down while another key is pressed and released
    chip8.step(&keypad_with(&[0x5, 0x9])).unwrap();
    chip8.step(&keypad_with(&[0x5])).unwrap();
    assert_eq!(chip8.program_counter, 0x200);
    assert_eq!(chip8.registers[7], 0);

    chip8.step(&keypad_with(&[0x9])).unwrap();
    assert_eq!(chip8.program_counter, 0x202);
    assert_eq!(chip8.registers[7], 0x5);
}

#[test]
fn test_fault_reports_address() {
    let mut chip8 = Chip8::new();
    // LD V0, 1; unknown 8-class operation
    chip8.load_program_bytes(&[0x60, 0x01, 0x80, 0x0F]).unwrap();
    chip8.step(&Keypad::new()).unwrap();

    let error = chip8.step(&Keypad::new()).unwrap_err();
    assert_eq!(error.address, 0x202);
    assert_eq!(error.kind, FaultKind::UnknownOpcode(0x800F));
}
