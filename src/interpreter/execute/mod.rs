//! Execution units.
//!
//! Each opcode is routed to the unit that implements it:
//!
//! | Unit | Opcodes |
//! |------|---------|
//! | [`ScalarAlu`] | `ADD` `SUB` `MUL` `DIV` |
//! | [`MemoryUnit`] | `LDA` `LDB` `STA` `STB` |
//! | [`ControlUnit`] | `NOP` `JMP` `JSP` `JSN` `JIZ` `JOF` `JSB` `RTS` `HLT` |
//! | [`IoUnit`] | `INP` `OUT` |
//!
//! Units never touch the program counter. They report what should happen to
//! it through [`ExecuteResult`] and the caller applies it. A unit that fails
//! leaves registers, flags and memory exactly as it found them.

mod alu;
mod control;
mod io;
mod memory;

pub use alu::ScalarAlu;
pub use control::ControlUnit;
pub use io::IoUnit;
pub use memory::MemoryUnit;

use crate::error::{Result, VmError};
use crate::interpreter::state::ProcessorState;
use crate::interpreter::traits::{ExecuteResult, NumberIo};
use crate::isa::{Instruction, Opcode};
use crate::memory::MemoryStore;

/// Register selected by a load or store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    A,
    B,
}

/// Arithmetic operation on A and B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Branch condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// `JMP`
    Always,
    /// `JSP`: neither zero nor negative.
    Positive,
    /// `JSN`
    Negative,
    /// `JIZ`
    Zero,
    /// `JOF`
    Overflow,
}

/// Instruction executor.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    /// Report stack pushes to the change tracker.
    pub trace_stack: bool,
}

impl Executor {
    /// Create an executor with stack tracing off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute one instruction against the given state.
    ///
    /// `state.pc` must be the address the instruction is attributed to; it is
    /// used in error reports and as the return address base for `JSB`.
    ///
    /// # Errors
    ///
    /// - [`VmError::UnknownInstruction`] for an opcode not in the table.
    /// - [`VmError::InvalidInstruction`] for a disallowed addressing mode.
    /// - [`VmError::DivideByZero`] for `DIV` with B = 0.
    /// - [`VmError::OutOfMemory`] if a store or push cannot allocate.
    pub fn execute<IO: NumberIo>(
        &self,
        instr: Instruction,
        state: &mut ProcessorState,
        memory: &mut MemoryStore,
        io: &mut IO,
    ) -> Result<ExecuteResult> {
        let opcode = instr.opcode().ok_or(VmError::UnknownInstruction {
            opcode: instr.opcode_bits(),
            pc: state.pc,
        })?;

        match opcode {
            Opcode::Nop => Ok(ExecuteResult::Continue),
            Opcode::Lda => MemoryUnit::load(Register::A, instr, state, memory),
            Opcode::Ldb => MemoryUnit::load(Register::B, instr, state, memory),
            Opcode::Sta => MemoryUnit::store(Register::A, instr, state, memory),
            Opcode::Stb => MemoryUnit::store(Register::B, instr, state, memory),
            Opcode::Inp => Ok(IoUnit::input(state, io)),
            Opcode::Out => Ok(IoUnit::output(state, io)),
            Opcode::Add => ScalarAlu::execute(ArithOp::Add, state),
            Opcode::Sub => ScalarAlu::execute(ArithOp::Sub, state),
            Opcode::Mul => ScalarAlu::execute(ArithOp::Mul, state),
            Opcode::Div => ScalarAlu::execute(ArithOp::Div, state),
            Opcode::Jmp => Ok(ControlUnit::branch(Condition::Always, instr, state)),
            Opcode::Jsp => Ok(ControlUnit::branch(Condition::Positive, instr, state)),
            Opcode::Jsn => Ok(ControlUnit::branch(Condition::Negative, instr, state)),
            Opcode::Jiz => Ok(ControlUnit::branch(Condition::Zero, instr, state)),
            Opcode::Jof => Ok(ControlUnit::branch(Condition::Overflow, instr, state)),
            Opcode::Jsb => ControlUnit::call(instr, state, memory, self.trace_stack),
            Opcode::Rts => Ok(ControlUnit::ret(state, memory)),
            Opcode::Hlt => Ok(ExecuteResult::Halt),
        }
    }
}

/// Error for an addressing mode the executing unit does not support.
pub(crate) fn invalid_mode(instr: Instruction, pc: u32) -> VmError {
    VmError::InvalidInstruction {
        opcode: instr.opcode_bits(),
        mode: instr.mode_bits(),
        pc,
    }
}
