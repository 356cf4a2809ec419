//! A CHIP-8 virtual machine. The implementation follows the instruction set
//! described [here](https://en.wikipedia.org/wiki/CHIP-8#Opcode_table) and
//! separates the interpreter core (machine state plus the fetch/decode/execute
//! engine) from everything a host has to provide: a fixed-rate scheduler, the
//! key state, and presentation of the framebuffer and the sound gate.
//!
//! For graphical output the bundled host relies on the cursive text user
//! interface library.
pub mod chip;
