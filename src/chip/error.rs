use std::io;

use thiserror::Error;

/// Errors that prevent a program from being loaded. None of them leave a
/// partially loaded program behind.
#[derive(Debug, Error)]
pub enum LoadProgramError {
    #[error("could not open program file {0}")]
    CouldNotOpenFile(String, #[source] io::Error),

    #[error("could not read metadata of program file {0}")]
    CouldNotReadMetadata(String, #[source] io::Error),

    #[error("{0} is not a regular file")]
    NotAFile(String),

    #[error("could not read program file {0}")]
    CouldNotReadFile(String, #[source] io::Error),

    #[error("program is {size} bytes large, at most {max} bytes fit into memory")]
    ProgramTooLarge { size: usize, max: usize },
}

/// The reason an instruction could not be executed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    #[error("program counter {0:#06X} outside addressable memory")]
    ProgramCounterOutOfRange(u16),

    #[error("unsupported opcode {0:#06X}")]
    UnknownOpcode(u16),

    #[error("jump target {0:#06X} outside addressable memory")]
    TargetOutOfRange(u16),

    #[error("return with empty stack")]
    StackUnderflow,

    #[error("call with exhausted stack")]
    StackOverflow,

    #[error("key index {0:#04X} out of range")]
    InvalidKey(u8),
}

/// A fatal fault raised while executing the instruction at `address`.
/// The faulting instruction has not modified the machine state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{kind} (instruction at {address:#05X})")]
pub struct ExecutionError {
    pub address: u16,
    pub kind: FaultKind,
}
