use core::convert::TryFrom;
use std::marker::PhantomData;

use crate::chip::{
    chip8::{
        constants::CHIP8_STACK_SIZE,
        opcodes::{
            ExecutableOpcode, Flow, InstructionParsingError, InstructionWithAddress,
            InstructionWithOperands, InstructionWithRegAndValue, Opcode,
        },
        util, Chip8,
    },
    FaultKind, Keypad,
};

define_instruction_with_address!(Jmp, JmpInstruction, 0x1);
impl ExecutableOpcode for JmpInstruction {
    fn execute(&self, _state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        Ok(Flow::Jump(util::jump_target(self.address)?))
    }
}

define_instruction_with_address!(Call, CallInstruction, 0x2);
impl ExecutableOpcode for CallInstruction {
    fn execute(&self, state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        let target = util::jump_target(self.address)?;
        if state.stack_pointer as usize >= CHIP8_STACK_SIZE {
            return Err(FaultKind::StackOverflow);
        }
        state.stack[state.stack_pointer as usize] = state.program_counter.wrapping_add(2);
        state.stack_pointer += 1;
        Ok(Flow::Jump(target))
    }
}

define_instruction_with_reg_and_value!(Se, SeInstruction, 0x3);
impl ExecutableOpcode for SeInstruction {
    fn execute(&self, state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        Ok(util::conditional_skip(
            state.registers[self.reg as usize] == self.value,
        ))
    }
}

define_instruction_with_reg_and_value!(Sne, SneInstruction, 0x4);
impl ExecutableOpcode for SneInstruction {
    fn execute(&self, state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        Ok(util::conditional_skip(
            state.registers[self.reg as usize] != self.value,
        ))
    }
}

define_instruction_with_operands!(Sre, SreInstruction, 0x5);
impl ExecutableOpcode for SreInstruction {
    fn execute(&self, state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        if self.op3 != 0 {
            return Err(FaultKind::UnknownOpcode(self.opcode));
        }
        Ok(util::conditional_skip(
            state.registers[self.op1 as usize] == state.registers[self.op2 as usize],
        ))
    }
}

define_instruction_with_operands!(Srne, SrneInstruction, 0x9);
impl ExecutableOpcode for SrneInstruction {
    fn execute(&self, state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        if self.op3 != 0 {
            return Err(FaultKind::UnknownOpcode(self.opcode));
        }
        Ok(util::conditional_skip(
            state.registers[self.op1 as usize] != state.registers[self.op2 as usize],
        ))
    }
}

define_instruction_with_address!(Jmpr, JmprInstruction, 0xB);
impl ExecutableOpcode for JmprInstruction {
    fn execute(&self, state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        let target = self.address + state.registers[0] as u16;
        Ok(Flow::Jump(util::jump_target(target)?))
    }
}

define_instruction_with_reg_and_value!(Sk, SkInstruction, 0xE);
impl ExecutableOpcode for SkInstruction {
    fn execute(&self, state: &mut Chip8, keypad: &Keypad) -> Result<Flow, FaultKind> {
        let expect_pressed = match self.value {
            0x9E => true,
            0xA1 => false,
            _ => return Err(FaultKind::UnknownOpcode(self.opcode)),
        };

        let mut key = state.registers[self.reg as usize];
        if state.quirks.mask_key_index {
            key &= 0xF;
        }
        let pressed = keypad.lookup(key).ok_or(FaultKind::InvalidKey(key))?;

        Ok(util::conditional_skip(pressed == expect_pressed))
    }
}
