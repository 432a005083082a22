//! Register-based bytecode virtual machine.
//!
//! Programs are sequences of 32-bit words. Each instruction word packs a 4-bit
//! opcode and two 4-bit operand fields; wide opcodes take a full-word
//! immediate from the slot that follows them.
//!
//! # Architecture
//!
//! - **Registers**: a small file of signed 32-bit registers (four by default)
//! - **Code memory**: fixed-size word array, zero-filled past the program
//! - **condpc**: branch target set by `CNDPC` and used by the equality jumps
//! - **Faults**: invalid opcodes and out-of-range addresses or registers stop
//!   the machine with a [`errors::VMError`]
//!
//! # Modules
//!
//! - [`config`]: Construction parameters and defaults
//! - [`encoding`]: Instruction word packing and field extraction
//! - [`errors`]: Construction and execution errors
//! - [`isa`]: Instruction set definition and opcode mappings
//! - [`output`]: Sinks for `PRINT`
//! - [`program`]: Program container, builder and disassembler
//! - [`vm`]: Fetch-decode-execute engine

pub mod config;
pub mod encoding;
pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod output;
pub mod program;
pub mod vm;
