//! Error types for the PseudoAsm virtual machine.
//!
//! Two enums cover every failure the core can report:
//!
//! | Type | Raised by |
//! |------|-----------|
//! | [`CodecError`] | Text ⇄ instruction conversion |
//! | [`VmError`] | Memory store, execution engine, debugger |
//!
//! Pausing on a breakpoint and terminating on `HLT` are not errors. They are
//! reported through [`StepResult`](crate::interpreter::StepResult) and
//! [`StopReason`](crate::interpreter::StopReason) instead.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VmError>;

/// Errors produced while assembling or disassembling an instruction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The mnemonic (or opcode) is not part of the instruction set.
    #[error("unknown instruction: {0}")]
    UnknownInstruction(String),

    /// The mnemonic is known but the operand form is not allowed for it.
    #[error("invalid use of instruction: {0}")]
    InvalidInstruction(String),
}

/// Errors produced by the memory store, the execution engine and the debugger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// A new memory cell could not be allocated.
    #[error("out of memory: no room for a cell at address {address}")]
    OutOfMemory {
        /// Address whose cell could not be created.
        address: u32,
    },

    /// The fetched opcode is not in the opcode table.
    #[error("unknown instruction 0x{opcode:02X} at address {pc}")]
    UnknownInstruction {
        /// Raw 6-bit opcode.
        opcode: u8,
        /// Program counter of the failing instruction.
        pc: u32,
    },

    /// The opcode is known but its addressing mode is not allowed.
    #[error("invalid instruction 0x{opcode:02X} (addressing mode {mode}) at address {pc}")]
    InvalidInstruction {
        /// Raw 6-bit opcode.
        opcode: u8,
        /// Raw 2-bit addressing mode.
        mode: u8,
        /// Program counter of the failing instruction.
        pc: u32,
    },

    /// `DIV` was executed with register B equal to zero.
    #[error("division by zero at address {pc}")]
    DivideByZero {
        /// Program counter of the failing instruction.
        pc: u32,
    },

    /// A breakpoint delete named an address with no breakpoint.
    #[error("no breakpoint set at address {address}")]
    NotFound {
        /// Address that was looked up.
        address: u32,
    },

    /// A query was made while its precondition did not hold.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// An instruction typed by the user could not be assembled.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
