//! Memory unit: register loads and stores.
//!
//! | Mode | Load value | Store address |
//! |------|------------|---------------|
//! | Immediate `#n` | `n` sign-extended from bit 23 | invalid |
//! | Direct `n` | `mem[n]` | `n` |
//! | Indirect `(n)` | `mem[mem[n]]` | `mem[n]` |
//! | Indexed | invalid | invalid |
//!
//! `LDA` updates Z and N from the loaded value and clears O. `LDB` leaves the
//! flags alone.

use super::{invalid_mode, Register};
use crate::error::Result;
use crate::interpreter::state::ProcessorState;
use crate::interpreter::traits::{ExecuteResult, Flags};
use crate::isa::{AddressingMode, Cell, Instruction};
use crate::memory::MemoryStore;

/// Memory unit for loads and stores.
pub struct MemoryUnit;

impl MemoryUnit {
    /// Load a register according to the instruction's addressing mode.
    pub fn load(
        reg: Register,
        instr: Instruction,
        state: &mut ProcessorState,
        memory: &MemoryStore,
    ) -> Result<ExecuteResult> {
        let value = match instr.mode() {
            AddressingMode::Immediate => instr.signed_operand(),
            AddressingMode::Direct => memory.read(instr.operand()).as_int(),
            AddressingMode::Indirect => {
                let pointer = memory.read(instr.operand()).raw();
                memory.read(pointer).as_int()
            }
            AddressingMode::Indexed => return Err(invalid_mode(instr, state.pc)),
        };

        match reg {
            Register::A => {
                state.a = value;
                state.flags = Flags::from_value(value);
            }
            Register::B => state.b = value,
        }
        Ok(ExecuteResult::Continue)
    }

    /// Store a register at the address selected by the instruction.
    pub fn store(
        reg: Register,
        instr: Instruction,
        state: &ProcessorState,
        memory: &mut MemoryStore,
    ) -> Result<ExecuteResult> {
        let address = match instr.mode() {
            AddressingMode::Direct => instr.operand(),
            AddressingMode::Indirect => memory.read(instr.operand()).raw(),
            AddressingMode::Immediate | AddressingMode::Indexed => {
                return Err(invalid_mode(instr, state.pc));
            }
        };

        let value = match reg {
            Register::A => state.a,
            Register::B => state.b,
        };
        memory.write(address, Cell::from_int(value))?;
        Ok(ExecuteResult::Continue)
    }
}
