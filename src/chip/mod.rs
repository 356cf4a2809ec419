pub mod chip8;
mod error;
mod keypad;
mod scheduler;

use cursive::CbSink;

pub use error::{ExecutionError, FaultKind, LoadProgramError};
pub use keypad::Keypad;
pub use scheduler::{Pacer, Scheduler};

/// The surface a host needs to drive a chip: load a program, run it one
/// instruction at a time, advance its timers, and read its outputs.
pub trait Chip {
    /// The type used to address the chip's memory.
    type MemoryAddress;

    /// Loads the program stored at `path` and returns its size in bytes.
    fn load_program(&mut self, path: &str) -> Result<usize, LoadProgramError>;

    /// Fetches, decodes and executes exactly one instruction. The key state
    /// is owned by the host and only read during the instruction.
    fn cycle(&mut self, keypad: &Keypad) -> Result<(), ExecutionError>;

    /// Advances the timers by one tick of the fixed-rate timer clock.
    fn tick(&mut self);

    /// The output pins, one byte (0 or 1) per pixel, row-major.
    fn read_output_pins(&self) -> &[u8];

    /// Whether the tone should currently be audible.
    fn sound_gate(&self) -> bool;

    /// The address of the next instruction to be fetched.
    fn program_counter(&self) -> Self::MemoryAddress;
}

/// A chip that can push its outputs to a cursive user interface.
pub trait ChipWithCursiveDisplay {
    /// Sends the current outputs to the UI if they changed since the last
    /// update. Returns `false` once the UI is gone.
    fn update_ui(&mut self, gfx_sink: &CbSink) -> bool;
}
