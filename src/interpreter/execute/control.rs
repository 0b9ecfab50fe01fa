//! Control unit execution.
//!
//! Handles control flow:
//!
//! - **Branch**: `JMP` and the flag-conditional jumps
//! - **Call/Return**: `JSB` / `RTS` through the memory stack
//!
//! The stack grows downward. `JSB` decrements SP and writes the return
//! address at the new SP. `RTS` reads at SP and increments it.

use super::Condition;
use crate::error::Result;
use crate::interpreter::state::ProcessorState;
use crate::interpreter::traits::{ExecuteResult, Flags};
use crate::isa::{Cell, Instruction};
use crate::memory::MemoryStore;

/// Control unit for branches, calls and returns.
pub struct ControlUnit;

impl ControlUnit {
    /// Jump to the operand if the condition holds. The mode field is ignored.
    pub fn branch(condition: Condition, instr: Instruction, state: &ProcessorState) -> ExecuteResult {
        if Self::evaluate_condition(condition, state.flags) {
            ExecuteResult::Jump { target: instr.operand() }
        } else {
            ExecuteResult::Continue
        }
    }

    /// Evaluate a branch condition against flags.
    pub fn evaluate_condition(condition: Condition, flags: Flags) -> bool {
        match condition {
            Condition::Always => true,
            Condition::Positive => !flags.z && !flags.n,
            Condition::Negative => flags.n,
            Condition::Zero => flags.z,
            Condition::Overflow => flags.o,
        }
    }

    /// Push the return address and jump to the subroutine.
    ///
    /// The push is hidden from change tracking unless `trace_stack` is set.
    /// If the push fails, SP is left unchanged.
    pub fn call(
        instr: Instruction,
        state: &mut ProcessorState,
        memory: &mut MemoryStore,
        trace_stack: bool,
    ) -> Result<ExecuteResult> {
        let sp = state.sp.wrapping_sub(1);
        let return_address = state.pc.wrapping_add(1);

        if !trace_stack {
            memory.tracker_mut().suppress_next_write();
        }
        memory.write(sp, Cell::from_raw(return_address))?;
        state.sp = sp;

        log::trace!("JSB {} (return to {}, sp {})", instr.operand(), return_address, sp);
        Ok(ExecuteResult::Jump { target: instr.operand() })
    }

    /// Pop the return address into PC.
    pub fn ret(state: &mut ProcessorState, memory: &MemoryStore) -> ExecuteResult {
        let target = memory.read(state.sp).raw();
        state.sp = state.sp.wrapping_add(1);

        log::trace!("RTS to {} (sp {})", target, state.sp);
        ExecuteResult::Jump { target }
    }
}
