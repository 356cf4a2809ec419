use crate::chip::{
    chip8::{
        constants::{CHIP8_FLAG_REGISTER, CHIP8_MEMORY_SIZE},
        opcodes::Flow,
        Chip8,
    },
    FaultKind,
};

pub fn conditional_skip(condition: bool) -> Flow {
    if condition {
        Flow::Skip
    } else {
        Flow::Next
    }
}

/// Checks that a jump or call target lies inside memory.
pub fn jump_target(address: u16) -> Result<u16, FaultKind> {
    if address as usize >= CHIP8_MEMORY_SIZE {
        return Err(FaultKind::TargetOutOfRange(address));
    }
    Ok(address)
}

/// Writes VF. Callers write the flag after the primary result so that the
/// flag wins when VF is also the destination.
pub fn set_flag(state: &mut Chip8, flag: bool) {
    state.registers[CHIP8_FLAG_REGISTER] = flag as u8;
}

pub fn increment_program_counter(state: &mut Chip8) {
    state.program_counter = state.program_counter.wrapping_add(2);
}

/// Moves the program counter as requested by the executed instruction.
pub fn advance(state: &mut Chip8, flow: Flow) {
    match flow {
        Flow::Next => increment_program_counter(state),
        Flow::Skip => {
            increment_program_counter(state);
            increment_program_counter(state);
        }
        Flow::Jump(address) => state.program_counter = address,
        Flow::Wait => {}
    }
}
