use core::convert::TryFrom;
use std::marker::PhantomData;

use crate::chip::{
    chip8::{
        constants::{CHIP8_CHARSET_OFFSET, CHIP8_GLYPH_LEN},
        opcodes::{
            ExecutableOpcode, Flow, InstructionParsingError, InstructionWithRegAndValue, Opcode,
        },
        Chip8, KeyWait,
    },
    FaultKind, Keypad,
};

define_instruction_with_reg_and_value!(Ldu, LduInstruction, 0xF);
impl ExecutableOpcode for LduInstruction {
    fn execute(&self, state: &mut Chip8, keypad: &Keypad) -> Result<Flow, FaultKind> {
        let reg = self.reg as usize;
        match self.value {
            0x07 => {
                state.registers[reg] = state.delay_timer;
            }
            0x0A => return Ok(wait_for_key(state, reg, keypad)),
            0x15 => {
                state.delay_timer = state.registers[reg];
            }
            0x18 => {
                state.sound_timer = state.registers[reg];
                let gate = state.sound_timer > 0;
                if gate != state.sound_gate {
                    state.sound_gate = gate;
                    state.draw = true;
                }
            }
            0x1E => {
                state.index = state.index.wrapping_add(state.registers[reg] as u16);
            }
            0x29 => {
                let glyph = (state.registers[reg] & 0xF) as u16;
                state.index = CHIP8_CHARSET_OFFSET + glyph * CHIP8_GLYPH_LEN;
            }
            0x33 => {
                let value = state.registers[reg];
                let index = state.index;
                state.set_memory_at(index, value / 100);
                state.set_memory_at(index.wrapping_add(1), value / 10 % 10);
                state.set_memory_at(index.wrapping_add(2), value % 10);
            }
            0x55 => {
                for r in 0..=self.reg {
                    let address = state.index.wrapping_add(r as u16);
                    state.set_memory_at(address, state.registers[r as usize]);
                }
                advance_index(state, self.reg);
            }
            0x65 => {
                for r in 0..=self.reg {
                    state.registers[r as usize] =
                        state.memory_at(state.index.wrapping_add(r as u16));
                }
                advance_index(state, self.reg);
            }
            _ => return Err(FaultKind::UnknownOpcode(self.opcode)),
        }
        Ok(Flow::Next)
    }
}

/// Points I past the last transferred register if the quirk asks for it.
fn advance_index(state: &mut Chip8, last_reg: u8) {
    if state.quirks.load_store_increments_index {
        state.index = state.index.wrapping_add(last_reg as u16 + 1);
    }
}

/// FX0A completes only once a key has been pressed and released again. The
/// first pressed key is latched; other keys are ignored until it is released.
fn wait_for_key(state: &mut Chip8, reg: usize, keypad: &Keypad) -> Flow {
    match state.key_wait {
        KeyWait::Idle => {
            if let Some(key) = keypad.pressed_keys().next() {
                state.key_wait = KeyWait::Armed(key);
            }
            Flow::Wait
        }
        KeyWait::Armed(key) => {
            if keypad.lookup(key) == Some(false) {
                state.key_wait = KeyWait::Idle;
                state.registers[reg] = key;
                Flow::Next
            } else {
                Flow::Wait
            }
        }
    }
}
