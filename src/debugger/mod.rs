//! Debugging services.
//!
//! - [`BreakpointSet`]: addresses that pause a run
//! - Patch-in-place and ad hoc execution on [`Processor`]
//! - [`Session`]: the text-reporting layer an interactive shell drives
//!
//! Patching writes a freshly assembled instruction anywhere in memory. Ad hoc
//! execution runs one assembled instruction against the live state without
//! moving the PC:
//!
//! ```
//! use pseudoasm::interpreter::{Processor, ScriptedIo};
//! use pseudoasm::memory::MemoryStore;
//!
//! let mut cpu = Processor::new(MemoryStore::new(), ScriptedIo::default());
//! cpu.execute_text("lda #12").unwrap();
//! assert_eq!(cpu.status().a, 12);
//! assert_eq!(cpu.pc(), 0);
//!
//! let change = cpu.patch(0, "hlt").unwrap();
//! assert_eq!(change.address, 0);
//! ```

mod breakpoints;
mod session;

pub use breakpoints::BreakpointSet;
pub use session::Session;

use crate::error::Result;
use crate::interpreter::{NumberIo, Processor, StepResult};
use crate::isa::{codec, Cell};
use crate::memory::MemoryChange;

impl<IO: NumberIo> Processor<IO> {
    /// Assemble `text` and store it at `address`.
    ///
    /// Returns the resulting memory change. If `address` is the PC, the next
    /// instruction has changed.
    pub fn patch(&mut self, address: u32, text: &str) -> Result<MemoryChange> {
        let instr = codec::encode(text)?;
        self.write_memory(address, Cell::from_instruction(instr))?;
        log::debug!("Patched {} with '{}'", address, instr);
        self.memory_changed()
    }

    /// Assemble `text` and execute it without moving the PC.
    ///
    /// Register, flag, stack and memory effects are kept. A memory write made
    /// by the instruction can be picked up with
    /// [`memory_changed`](Processor::memory_changed).
    pub fn execute_text(&mut self, text: &str) -> Result<StepResult> {
        let instr = codec::encode(text)?;
        log::debug!("Executing '{}' at pc {}", instr, self.pc());
        self.execute(instr, false)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{CodecError, VmError};
    use crate::interpreter::{Processor, ScriptedIo};
    use crate::memory::MemoryStore;

    fn processor() -> Processor<ScriptedIo> {
        Processor::new(MemoryStore::new(), ScriptedIo::default())
    }

    #[test]
    fn test_patch_writes_instruction() {
        let mut cpu = processor();
        let change = cpu.patch(4, "lda (7)").unwrap();
        assert_eq!(change.address, 4);
        assert_eq!(change.value, cpu.read_memory(4));
        assert_eq!(cpu.read_memory(4).as_instruction().to_string(), "lda (7)");
        assert!(!cpu.has_memory_changed());
    }

    #[test]
    fn test_patch_rejects_bad_text() {
        let mut cpu = processor();
        assert!(matches!(
            cpu.patch(0, "sta #1"),
            Err(VmError::Codec(CodecError::InvalidInstruction(_)))
        ));
        assert!(cpu.memory().is_empty());
    }

    #[test]
    fn test_patch_out_of_memory() {
        let mut cpu = Processor::new(MemoryStore::with_cell_limit(0), ScriptedIo::default());
        assert_eq!(cpu.patch(3, "nop"), Err(VmError::OutOfMemory { address: 3 }));
    }

    #[test]
    fn test_execute_text_keeps_pc() {
        let mut cpu = processor();
        cpu.execute_text("lda #6").unwrap();
        cpu.execute_text("sta 20").unwrap();
        assert_eq!(cpu.pc(), 0);

        let change = cpu.memory_changed().unwrap();
        assert_eq!((change.address, change.value.as_int()), (20, 6));
    }

    #[test]
    fn test_execute_text_jsb_moves_stack_only() {
        let mut cpu = processor();
        cpu.execute_text("jsb 50").unwrap();
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.stack_pointer(), 899_999);
        assert_eq!(cpu.read_memory(899_999).raw(), 1);
    }

    #[test]
    fn test_execute_text_errors() {
        let mut cpu = processor();
        assert!(matches!(
            cpu.execute_text("bogus"),
            Err(VmError::Codec(CodecError::UnknownInstruction(_)))
        ));
        assert_eq!(cpu.execute_text("div"), Err(VmError::DivideByZero { pc: 0 }));
    }
}
