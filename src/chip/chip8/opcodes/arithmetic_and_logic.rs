use core::convert::TryFrom;
use rand::{thread_rng, Rng};
use std::marker::PhantomData;

use crate::chip::{
    chip8::{
        constants::{CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH},
        opcodes::{
            ExecutableOpcode, Flow, InstructionParsingError, InstructionWithAddress,
            InstructionWithOperands, InstructionWithRegAndValue, Opcode,
        },
        util, Chip8,
    },
    FaultKind, Keypad,
};

define_instruction_with_reg_and_value!(Ldr, LdrInstruction, 0x6);
impl ExecutableOpcode for LdrInstruction {
    fn execute(&self, state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        state.registers[self.reg as usize] = self.value;
        Ok(Flow::Next)
    }
}

define_instruction_with_reg_and_value!(Add, AddInstruction, 0x7);
impl ExecutableOpcode for AddInstruction {
    fn execute(&self, state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        state.registers[self.reg as usize] =
            state.registers[self.reg as usize].wrapping_add(self.value);
        Ok(Flow::Next)
    }
}

define_instruction_with_operands!(Reg, RegInstruction, 0x8);
impl ExecutableOpcode for RegInstruction {
    fn execute(&self, state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        let logic_flag = if state.quirks.logic_resets_flag {
            Some(false)
        } else {
            None
        };
        let shift_source = if state.quirks.shift_reads_vy {
            self.op2
        } else {
            self.op1
        };

        let v1 = state.registers[self.op1 as usize];
        let v2 = state.registers[self.op2 as usize];
        let vs = state.registers[shift_source as usize];

        let (result, flag) = match self.op3 {
            0x0 => (v2, None),
            0x1 => (v1 | v2, logic_flag),
            0x2 => (v1 & v2, logic_flag),
            0x3 => (v1 ^ v2, logic_flag),
            0x4 => {
                let (result, overflow) = v1.overflowing_add(v2);
                (result, Some(overflow))
            }
            0x5 => {
                let (result, borrow) = v1.overflowing_sub(v2);
                (result, Some(!borrow))
            }
            0x6 => (vs >> 1, Some(vs & 0x01 != 0)),
            0x7 => {
                let (result, borrow) = v2.overflowing_sub(v1);
                (result, Some(!borrow))
            }
            0xE => (vs << 1, Some(vs & 0x80 != 0)),
            _ => return Err(FaultKind::UnknownOpcode(self.opcode)),
        };

        state.registers[self.op1 as usize] = result;
        if let Some(flag) = flag {
            util::set_flag(state, flag);
        }
        Ok(Flow::Next)
    }
}

define_instruction_with_address!(Ld, LdInstruction, 0xA);
impl ExecutableOpcode for LdInstruction {
    fn execute(&self, state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        state.index = self.address;
        Ok(Flow::Next)
    }
}

define_instruction_with_reg_and_value!(Rnd, RndInstruction, 0xC);
impl ExecutableOpcode for RndInstruction {
    fn execute(&self, state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        let sample: u8 = thread_rng().gen();
        state.registers[self.reg as usize] = sample & self.value;
        Ok(Flow::Next)
    }
}

define_instruction_with_operands!(Drw, DrwInstruction, 0xD);
impl ExecutableOpcode for DrwInstruction {
    fn execute(&self, state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        fn translate_gfx(x: usize, y: usize) -> usize {
            (x % CHIP8_DISPLAY_WIDTH) + (y % CHIP8_DISPLAY_HEIGHT) * CHIP8_DISPLAY_WIDTH
        }

        let x = state.registers[self.op1 as usize] as usize;
        let y = state.registers[self.op2 as usize] as usize;
        let height = self.op3 as u16;

        let mut collision = false;
        for y_pos in 0..height {
            let pixel_byte = state.memory_at(state.index.wrapping_add(y_pos));

            for x_pos in 0..8 {
                let pixel_bit = (pixel_byte >> (7 - x_pos)) & 1;
                if pixel_bit == 0 {
                    continue;
                }

                let pixel_pos = translate_gfx(x + x_pos, y + y_pos as usize);
                if state.framebuffer[pixel_pos] & pixel_bit == 1 {
                    collision = true;
                }
                state.framebuffer[pixel_pos] ^= pixel_bit;
                state.draw = true;
            }
        }

        util::set_flag(state, collision);
        Ok(Flow::Next)
    }
}
