use core::convert::TryFrom;
use std::marker::PhantomData;

use crate::chip::{
    chip8::{
        opcodes::{
            ExecutableOpcode, Flow, InstructionParsingError, InstructionWithAddress, Opcode,
        },
        Chip8,
    },
    FaultKind, Keypad,
};

define_instruction_with_address!(Sys, SysInstruction, 0x0);
impl ExecutableOpcode for SysInstruction {
    fn execute(&self, state: &mut Chip8, _keypad: &Keypad) -> Result<Flow, FaultKind> {
        match self.address {
            // CLS
            0x0E0 => {
                state.framebuffer.fill(0);
                state.draw = true;
                Ok(Flow::Next)
            }
            // RET
            0x0EE => {
                if state.stack_pointer == 0 {
                    return Err(FaultKind::StackUnderflow);
                }
                state.stack_pointer -= 1;
                Ok(Flow::Jump(state.stack[state.stack_pointer as usize]))
            }
            // 0NNN calls machine code routines, which cannot be run here
            _ => Err(FaultKind::UnknownOpcode(self.opcode)),
        }
    }
}
