//! Processor state.
//!
//! | Register | Width | Purpose |
//! |----------|-------|---------|
//! | A | 32-bit signed | Accumulator, arithmetic destination |
//! | B | 32-bit signed | Second operand |
//! | PC | 32-bit | Address of the next instruction |
//! | SP | 32-bit | Stack pointer, grows downward |
//! | Z / N / O | 1-bit | Zero, negative, overflow |
//!
//! The whole state is a plain `Copy` value so the debugger can save and
//! restore it in one assignment.

use crate::interpreter::traits::Flags;

/// Default initial stack pointer.
pub const DEFAULT_STACK_POINTER: u32 = 900_000;

/// Registers, flags, program counter and stack pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorState {
    /// Register A.
    pub a: i32,
    /// Register B.
    pub b: i32,
    /// Condition flags.
    pub flags: Flags,
    /// Program counter.
    pub pc: u32,
    /// Stack pointer.
    pub sp: u32,
}

impl ProcessorState {
    /// Zeroed registers and flags, PC 0, the given stack pointer.
    pub fn new(stack_pointer: u32) -> Self {
        Self {
            a: 0,
            b: 0,
            flags: Flags::default(),
            pc: 0,
            sp: stack_pointer,
        }
    }
}

impl Default for ProcessorState {
    fn default() -> Self {
        Self::new(DEFAULT_STACK_POINTER)
    }
}
