#[macro_use]
mod macros;
mod arithmetic_and_logic;
mod program_flow;
mod system;
mod timers_and_memory;

use core::convert::TryFrom;
use std::marker::PhantomData;

use ux::u4;

use crate::chip::{
    chip8::{
        opcodes::{
            arithmetic_and_logic::{
                AddInstruction, DrwInstruction, LdInstruction, LdrInstruction, RegInstruction,
                RndInstruction,
            },
            program_flow::{
                CallInstruction, JmpInstruction, JmprInstruction, SeInstruction, SkInstruction,
                SneInstruction, SreInstruction, SrneInstruction,
            },
            system::SysInstruction,
            timers_and_memory::LduInstruction,
        },
        Chip8,
    },
    FaultKind, Keypad,
};

/// Represents a Chip 8 opcode. A Chip 8 opcode is two bytes long.
#[derive(Debug, Clone, Copy)]
pub(super) struct Opcode {
    /// The instruction class is the most significant nibble of the opcode.
    instruction_class: u4,
    /// The payload constitutes the remaining nibbles of the opcode.
    payload: OpcodePayload,
}

/// Represents the payload of a Chip 8 opcode. That is the opcode without
/// the most significant nibble.
#[derive(Debug, Clone, Copy)]
pub(super) struct OpcodePayload {
    nibbles: [u4; 3],
}

impl OpcodePayload {
    fn nibble(&self, position: usize) -> u8 {
        u8::from(self.nibbles[position])
    }

    /// Interprets the opcode payload as an address in the range 0x000 to
    /// 0xFFF (inclusive) and returns an u16 containing this address.
    fn address(&self) -> u16 {
        (self.nibble(0) as u16) << 8 | (self.nibble(1) as u16) << 4 | self.nibble(2) as u16
    }

    /// Interprets the most significant nibble of the payload as a register
    /// address in range 0x0 - 0xF (inclusive) and the remaining nibbles
    /// as a value in range 0x00 - 0xFF (inclusive).
    fn reg_and_value(&self) -> (u8, u8) {
        (self.nibble(0), (self.nibble(1) << 4) | self.nibble(2))
    }

    /// Interprets the opcode payload as three operands, each of size
    /// one nibble, i.e., in range 0x0 - 0xF (inclusive).
    fn operands(&self) -> (u8, u8, u8) {
        (self.nibble(0), self.nibble(1), self.nibble(2))
    }
}

impl Opcode {
    /// Constructs a new `Opcode` given its byte representation.
    pub(super) fn new(bytes: [u8; 2]) -> Opcode {
        Opcode {
            instruction_class: u4::new(bytes[0] >> 4),
            payload: OpcodePayload {
                nibbles: [
                    u4::new(bytes[0] & 0xF),
                    u4::new(bytes[1] >> 4),
                    u4::new(bytes[1] & 0xF),
                ],
            },
        }
    }

    fn class(&self) -> u8 {
        u8::from(self.instruction_class)
    }

    /// The opcode as it is stored in memory.
    pub(super) fn raw(&self) -> u16 {
        (self.class() as u16) << 12 | self.payload.address()
    }

    /// Selects the instruction for this opcode's class. Sub-cases within a
    /// class are checked by the instruction before it touches any state.
    pub(super) fn decode(self) -> Result<Box<dyn ExecutableOpcode>, FaultKind> {
        fn into_helper<T>(opcode: Opcode) -> Result<Box<dyn ExecutableOpcode>, FaultKind>
        where
            T: ExecutableOpcode + TryFrom<Opcode, Error = InstructionParsingError> + 'static,
        {
            T::try_from(opcode)
                .map(|instruction| Box::new(instruction) as Box<dyn ExecutableOpcode>)
                .map_err(|_| FaultKind::UnknownOpcode(opcode.raw()))
        }

        match self.class() {
            0x0 => into_helper::<SysInstruction>(self),
            0x1 => into_helper::<JmpInstruction>(self),
            0x2 => into_helper::<CallInstruction>(self),
            0x3 => into_helper::<SeInstruction>(self),
            0x4 => into_helper::<SneInstruction>(self),
            0x5 => into_helper::<SreInstruction>(self),
            0x6 => into_helper::<LdrInstruction>(self),
            0x7 => into_helper::<AddInstruction>(self),
            0x8 => into_helper::<RegInstruction>(self),
            0x9 => into_helper::<SrneInstruction>(self),
            0xA => into_helper::<LdInstruction>(self),
            0xB => into_helper::<JmprInstruction>(self),
            0xC => into_helper::<RndInstruction>(self),
            0xD => into_helper::<DrwInstruction>(self),
            0xE => into_helper::<SkInstruction>(self),
            _ => into_helper::<LduInstruction>(self),
        }
    }
}

/// Captures errors when converting opcodes to their respective instruction object.
#[derive(Debug)]
pub(super) enum InstructionParsingError {
    /// The opcode belongs to a different instruction class (got, expected).
    InvalidInstructionClass(u8, u8),
}

/// What the engine does with the program counter after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flow {
    /// Continue with the following instruction.
    Next,
    /// Skip the following instruction.
    Skip,
    /// Continue at the given address.
    Jump(u16),
    /// Execute the same instruction again.
    Wait,
}

/// Represents an opcode that can be executed.
pub(super) trait ExecutableOpcode {
    /// Executes `self` relative to the given state and returns how control
    /// continues. Faults are raised before the state is modified.
    fn execute(&self, state: &mut Chip8, keypad: &Keypad) -> Result<Flow, FaultKind>;
}

/// Represents an opcode that expects the payload to be an address.
pub(super) struct InstructionWithAddress<T> {
    instruction: PhantomData<T>,
    opcode: u16,
    address: u16,
}

/// Represents an opcode that expects the payload to be three operands.
pub(super) struct InstructionWithOperands<T> {
    instruction: PhantomData<T>,
    opcode: u16,
    op1: u8,
    op2: u8,
    op3: u8,
}

/// Represents an opcode that expects the payload to be a register pointer and a value.
pub(super) struct InstructionWithRegAndValue<T> {
    instruction: PhantomData<T>,
    opcode: u16,
    reg: u8,
    value: u8,
}

impl std::fmt::Display for InstructionParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InstructionParsingError::InvalidInstructionClass(got, expected) => write!(
                f,
                "instruction class {:#X} does not match the target instruction class {:#X}",
                got, expected
            ),
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:04X}", self.raw())
    }
}
