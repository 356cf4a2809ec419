/// CHIP-8 constants.
pub mod constants;
/// Cursive display output.
pub mod cursive_display;
/// Decoding of opcodes and their execution.
mod opcodes;
/// Selection of historical instruction variants.
mod quirks;
/// Convenience functions for modification of the CHIP-8 state.
mod util;

#[cfg(test)]
mod tests;

use std::fs;
use std::fs::File;
use std::io::Read;

use log::{debug, trace, warn};

use crate::chip::{
    chip8::constants::{
        CHIP8_CHARSET, CHIP8_CHARSET_LEN, CHIP8_CHARSET_OFFSET, CHIP8_DISPLAY_HEIGHT,
        CHIP8_DISPLAY_WIDTH, CHIP8_MAX_PROGRAM_SIZE, CHIP8_MEMORY_SIZE, CHIP8_PROGRAM_START,
        CHIP8_STACK_SIZE,
    },
    chip8::opcodes::{ExecutableOpcode, Flow, Opcode},
    Chip, ExecutionError, FaultKind, Keypad, LoadProgramError,
};

pub use quirks::Quirks;

/// Progress of the wait-for-key instruction (FX0A), which spans several
/// executions of the same instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyWait {
    /// No key has been seen yet.
    Idle,
    /// The key has been pressed; the instruction completes once it is released.
    Armed(u8),
}

/// Represents the state of the CHIP-8.
#[derive(Clone)]
pub struct Chip8 {
    /// 4096 bytes of main memory. The font lives at the bottom, programs
    /// are loaded at `CHIP8_PROGRAM_START`.
    memory: [u8; CHIP8_MEMORY_SIZE],

    /// 16 registers where each can store one byte
    registers: [u8; 16],

    /// An index register. It is not range checked; memory accesses through
    /// it wrap around the address space.
    index: u16,

    /// A program counter
    program_counter: u16,

    /// The framebuffer, one byte per pixel holding either 0 or 1.
    framebuffer: [u8; CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT],

    /// The delay timer, decremented once per tick.
    delay_timer: u8,

    /// The sound timer, decremented once per tick.
    sound_timer: u8,

    /// Whether the tone is on. Engaged by loading a non-zero sound timer,
    /// released when a tick brings the sound timer to zero.
    sound_gate: bool,

    /// A stack. Note that there are no instructions allowing to modify the
    /// stack and it is only used to store return addresses for the return
    /// opcode.
    stack: [u16; CHIP8_STACK_SIZE],

    /// Number of occupied stack slots.
    stack_pointer: u8,

    /// Latch of the wait-for-key instruction.
    key_wait: KeyWait,

    quirks: Quirks,

    /// A flag that indicates whether the framebuffer or the sound gate
    /// changed since it was last taken.
    draw: bool,
}

impl Chip for Chip8 {
    /// A CHIP-8 memory address is in the range between 0 and 4096 (exclusive). We
    /// represent it using a u16 and check the range whenever it is used.
    type MemoryAddress = u16;

    fn load_program(&mut self, path: &str) -> Result<usize, LoadProgramError> {
        let mut file = File::open(path)
            .map_err(|e| LoadProgramError::CouldNotOpenFile(path.to_string(), e))?;
        let md = fs::metadata(path)
            .map_err(|e| LoadProgramError::CouldNotReadMetadata(path.to_string(), e))?;
        if !md.is_file() {
            return Err(LoadProgramError::NotAFile(path.to_string()));
        }
        if md.len() > CHIP8_MAX_PROGRAM_SIZE as u64 {
            return Err(LoadProgramError::ProgramTooLarge {
                size: md.len() as usize,
                max: CHIP8_MAX_PROGRAM_SIZE,
            });
        }

        let mut buffer = Vec::with_capacity(md.len() as usize);
        file.read_to_end(&mut buffer)
            .map_err(|e| LoadProgramError::CouldNotReadFile(path.to_string(), e))?;

        self.load_program_bytes(&buffer)
    }

    fn cycle(&mut self, keypad: &Keypad) -> Result<(), ExecutionError> {
        self.step(keypad)
    }

    fn tick(&mut self) {
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }

        if self.sound_timer > 0 {
            self.sound_timer -= 1;
            if self.sound_timer == 0 {
                self.sound_gate = false;
                self.draw = true;
            }
        }
    }

    fn read_output_pins(&self) -> &[u8] {
        &self.framebuffer
    }

    fn sound_gate(&self) -> bool {
        self.sound_gate
    }

    fn program_counter(&self) -> u16 {
        self.program_counter
    }
}

impl Chip8 {
    /// Constructs a new CHIP-8 and appropriately initializes all fields so that
    /// it is ready for the first execution cycle. Essentially this means that
    /// the program counter is set to 0x200 and the default CHIP-8 charset is
    /// loaded at memory address `CHIP8_CHARSET_OFFSET`. Note that no program is
    /// loaded upon initialization.
    pub fn new() -> Self {
        Chip8::with_quirks(Quirks::default())
    }

    /// Like `new`, but executing the instruction variants selected by `quirks`.
    pub fn with_quirks(quirks: Quirks) -> Self {
        let mut memory = [0; CHIP8_MEMORY_SIZE];
        let font_start = CHIP8_CHARSET_OFFSET as usize;
        memory[font_start..font_start + CHIP8_CHARSET_LEN as usize].copy_from_slice(&CHIP8_CHARSET);

        Chip8 {
            memory,
            registers: [0; 16],
            index: 0,
            program_counter: CHIP8_PROGRAM_START,
            framebuffer: [0; CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT],
            delay_timer: 0,
            sound_timer: 0,
            sound_gate: false,
            stack: [0; CHIP8_STACK_SIZE],
            stack_pointer: 0,
            key_wait: KeyWait::Idle,
            quirks,
            draw: false,
        }
    }

    /// Copies `program` into memory at `CHIP8_PROGRAM_START` and returns its
    /// length. Programs which do not fit are rejected without touching memory.
    pub fn load_program_bytes(&mut self, program: &[u8]) -> Result<usize, LoadProgramError> {
        if program.len() > CHIP8_MAX_PROGRAM_SIZE {
            return Err(LoadProgramError::ProgramTooLarge {
                size: program.len(),
                max: CHIP8_MAX_PROGRAM_SIZE,
            });
        }

        let start = CHIP8_PROGRAM_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        debug!("Loaded program of {} bytes", program.len());
        Ok(program.len())
    }

    /// Fetches, decodes and executes the instruction at the program counter.
    /// On a fault the state is left as it was before the instruction.
    pub fn step(&mut self, keypad: &Keypad) -> Result<(), ExecutionError> {
        let address = self.program_counter;
        match self.execute_next(keypad) {
            Ok(flow) => {
                util::advance(self, flow);
                Ok(())
            }
            Err(kind) => {
                warn!("Fault at {:#05X}: {}", address, kind);
                Err(ExecutionError { address, kind })
            }
        }
    }

    fn execute_next(&mut self, keypad: &Keypad) -> Result<Flow, FaultKind> {
        let opcode = self.next_instruction()?;
        trace!("{:#05X}: {}", self.program_counter, opcode);
        opcode.decode()?.execute(self, keypad)
    }

    /// Fetches the next instruction based on the current state of
    /// `self.program_counter`. Both bytes of the instruction must lie inside
    /// memory.
    fn next_instruction(&self) -> Result<Opcode, FaultKind> {
        let pc = self.program_counter as usize;
        if pc + 1 >= CHIP8_MEMORY_SIZE {
            return Err(FaultKind::ProgramCounterOutOfRange(self.program_counter));
        }
        Ok(Opcode::new([self.memory[pc], self.memory[pc + 1]]))
    }

    /// Reads the byte at `address`, wrapping around the address space.
    fn memory_at(&self, address: u16) -> u8 {
        self.memory[address as usize % CHIP8_MEMORY_SIZE]
    }

    /// Writes the byte at `address`, wrapping around the address space.
    fn set_memory_at(&mut self, address: u16, byte: u8) {
        self.memory[address as usize % CHIP8_MEMORY_SIZE] = byte;
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.registers
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn stack_pointer(&self) -> u8 {
        self.stack_pointer
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn framebuffer(&self) -> &[u8; CHIP8_DISPLAY_WIDTH * CHIP8_DISPLAY_HEIGHT] {
        &self.framebuffer
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    /// Returns whether the framebuffer or the sound gate changed since the
    /// last call.
    pub fn take_draw_flag(&mut self) -> bool {
        std::mem::replace(&mut self.draw, false)
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Chip8::new()
    }
}
