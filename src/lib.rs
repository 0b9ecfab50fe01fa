//! pseudoasm library
//!
//! Virtual machine and debugger for the PseudoAsm teaching instruction set:
//! 32-bit cells, two registers, a downward-growing memory stack and a fixed
//! table of 19 opcodes.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`isa`] | Cells, packed instructions, opcode table, text codec |
//! | [`memory`] | Sparse memory and write tracking |
//! | [`interpreter`] | Processor state, execution units, step/run |
//! | [`debugger`] | Breakpoints, patching, ad hoc execution, sessions |
//! | [`loader`] | Source text to memory |
//! | [`config`] | Layered configuration |

pub mod config;
pub mod debugger;
pub mod error;
pub mod interpreter;
pub mod isa;
pub mod loader;
pub mod memory;

pub use error::{CodecError, Result, VmError};
