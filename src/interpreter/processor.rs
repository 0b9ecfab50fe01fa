//! The fetch-execute engine.
//!
//! A [`Processor`] owns everything one program needs: registers, memory,
//! breakpoints and the host's number I/O. One step fetches the cell at PC,
//! reads it as an instruction, dispatches it to the [`Executor`] and applies
//! the resulting PC change.
//!
//! # Execution Model
//!
//! 1. Fetch the cell at PC and view it as an instruction
//! 2. Execute it (registers, flags, memory, I/O)
//! 3. Apply the PC change: fall through, jump, or stay on halt/error
//! 4. If PC now sits on a breakpoint, report it
//!
//! A failing instruction leaves the processor exactly as it was before the
//! step, so the same instruction can be inspected or patched and retried.

use crate::config::Config;
use crate::debugger::BreakpointSet;
use crate::error::{CodecError, Result, VmError};
use crate::interpreter::execute::Executor;
use crate::interpreter::state::ProcessorState;
use crate::interpreter::traits::{ExecuteResult, NumberIo};
use crate::isa::codec;
use crate::isa::{Cell, Instruction};
use crate::memory::{MemoryChange, MemoryStore};

/// Result of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Instruction executed, keep going.
    Continue,
    /// Instruction executed and PC landed on a breakpoint.
    Breakpoint {
        /// Address of the breakpoint (the new PC).
        pc: u32,
    },
    /// `HLT` reached. PC still points at it.
    Halt,
}

/// Why `run` stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Paused before the instruction at `pc`.
    Breakpoint {
        /// Address of the breakpoint.
        pc: u32,
    },
    /// `HLT` reached.
    Halt,
}

/// A PseudoAsm processor with its memory.
pub struct Processor<IO: NumberIo> {
    /// Registers, flags, PC and SP.
    state: ProcessorState,
    /// Program and data memory.
    memory: MemoryStore,
    /// Host number I/O for `INP` / `OUT`.
    io: IO,
    /// Addresses that pause `step`/`run`.
    breakpoints: BreakpointSet,
    /// Execution units.
    executor: Executor,
    /// Stack pointer restored by [`reset`](Self::reset).
    initial_sp: u32,
    /// Committed instructions since creation or reset.
    instructions: u64,
}

impl<IO: NumberIo> Processor<IO> {
    /// Create a processor with default settings over a loaded memory.
    pub fn new(memory: MemoryStore, io: IO) -> Self {
        Self::with_config(memory, io, &Config::default())
    }

    /// Create a processor using the stack and memory settings of `config`.
    ///
    /// Any write left pending by the loader is discarded.
    pub fn with_config(mut memory: MemoryStore, io: IO, config: &Config) -> Self {
        if let Some(limit) = config.max_cells() {
            memory.set_cell_limit(Some(limit));
        }
        memory.tracker_mut().take_last_write();

        let initial_sp = config.stack_pointer();
        log::debug!(
            "Processor initialized: {} cells loaded, sp {}, stack trace {}",
            memory.len(),
            initial_sp,
            config.trace_stack()
        );

        Self {
            state: ProcessorState::new(initial_sp),
            memory,
            io,
            breakpoints: BreakpointSet::new(),
            executor: Executor { trace_stack: config.trace_stack() },
            initial_sp,
            instructions: 0,
        }
    }

    /// Return registers, flags, PC and SP to their initial values.
    ///
    /// Memory and breakpoints are kept.
    pub fn reset(&mut self) {
        self.state = ProcessorState::new(self.initial_sp);
        self.instructions = 0;
        self.memory.tracker_mut().take_last_write();
        log::debug!("Processor reset");
    }

    /// Execute a single instruction.
    ///
    /// With `commit_pc` false the PC is restored afterwards while every other
    /// effect stays. Breakpoints are not consulted.
    ///
    /// # Errors
    ///
    /// See [`Executor::execute`]. On error nothing has changed.
    pub fn execute(&mut self, instr: Instruction, commit_pc: bool) -> Result<StepResult> {
        let saved_pc = self.state.pc;
        let result = self
            .executor
            .execute(instr, &mut self.state, &mut self.memory, &mut self.io);

        let outcome = match result? {
            ExecuteResult::Continue => {
                self.state.pc = self.state.pc.wrapping_add(1);
                StepResult::Continue
            }
            ExecuteResult::Jump { target } => {
                self.state.pc = target;
                StepResult::Continue
            }
            ExecuteResult::Halt => StepResult::Halt,
        };

        if !commit_pc {
            self.state.pc = saved_pc;
        }
        Ok(outcome)
    }

    /// Execute the instruction at PC.
    ///
    /// Returns [`StepResult::Breakpoint`] when the instruction completed and
    /// the new PC carries a breakpoint.
    pub fn step(&mut self) -> Result<StepResult> {
        let pc = self.state.pc;
        let instr = self.memory.read(pc).as_instruction();
        log::trace!("[{}] {}", pc, instr);

        let result = self.execute(instr, true)?;
        self.instructions += 1;

        if result == StepResult::Continue && self.breakpoints.contains(self.state.pc) {
            log::debug!("Breakpoint hit at {}", self.state.pc);
            return Ok(StepResult::Breakpoint { pc: self.state.pc });
        }
        Ok(result)
    }

    /// Step until a breakpoint, `HLT` or an error.
    pub fn run(&mut self) -> Result<StopReason> {
        let start = self.instructions;
        let reason = loop {
            match self.step() {
                Ok(StepResult::Continue) => continue,
                Ok(StepResult::Breakpoint { pc }) => break StopReason::Breakpoint { pc },
                Ok(StepResult::Halt) => break StopReason::Halt,
                Err(e) => {
                    log::debug!("Run stopped after {} instructions: {}", self.instructions - start, e);
                    return Err(e);
                }
            }
        };
        log::debug!("Run stopped after {} instructions: {:?}", self.instructions - start, reason);
        Ok(reason)
    }

    /// Snapshot of registers, flags, PC and SP.
    pub fn status(&self) -> ProcessorState {
        self.state
    }

    /// Replace registers, flags, PC and SP.
    pub fn set_status(&mut self, state: ProcessorState) {
        self.state = state;
    }

    /// Program counter.
    pub fn pc(&self) -> u32 {
        self.state.pc
    }

    /// Instruction at PC.
    pub fn next_instruction(&self) -> Instruction {
        self.memory.read(self.state.pc).as_instruction()
    }

    /// Assembly text of the instruction at PC.
    pub fn disassemble_next(&self) -> std::result::Result<String, CodecError> {
        codec::decode(self.next_instruction())
    }

    /// Committed instructions since creation or the last reset.
    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    /// Read a memory cell.
    pub fn read_memory(&self, address: u32) -> Cell {
        self.memory.read(address)
    }

    /// Write a memory cell. The write is change-tracked.
    pub fn write_memory(&mut self, address: u32, cell: Cell) -> Result<()> {
        self.memory.write(address, cell)
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Whether a write happened since the last [`memory_changed`](Self::memory_changed).
    pub fn has_memory_changed(&self) -> bool {
        self.memory.tracker().has_pending_write()
    }

    /// Take the last written address and its current value.
    ///
    /// # Errors
    ///
    /// [`VmError::InvalidState`] if nothing was written since the last call.
    pub fn memory_changed(&mut self) -> Result<MemoryChange> {
        let address = self
            .memory
            .tracker_mut()
            .take_last_write()
            .ok_or(VmError::InvalidState("no memory change since the last query"))?;
        Ok(MemoryChange { address, value: self.memory.read(address) })
    }

    /// Start collecting every written address.
    pub fn enable_trace(&mut self) {
        self.memory.tracker_mut().enable_trace();
    }

    /// Stop collecting written addresses and drop what was not drained.
    pub fn disable_trace(&mut self) {
        self.memory.tracker_mut().disable_trace();
    }

    /// Traced writes in ascending address order, each with its value now.
    pub fn drain_trace(&mut self) -> Vec<MemoryChange> {
        let addresses = self.memory.tracker_mut().drain_trace();
        addresses
            .into_iter()
            .map(|address| MemoryChange { address, value: self.memory.read(address) })
            .collect()
    }

    pub fn stack_pointer(&self) -> u32 {
        self.state.sp
    }

    pub fn set_stack_pointer(&mut self, sp: u32) {
        log::debug!("Stack pointer set to {}", sp);
        self.state.sp = sp;
    }

    /// Whether `JSB` pushes are change-tracked.
    pub fn stack_trace(&self) -> bool {
        self.executor.trace_stack
    }

    pub fn set_stack_trace(&mut self, enabled: bool) {
        log::debug!("Stack trace {}", if enabled { "enabled" } else { "disabled" });
        self.executor.trace_stack = enabled;
    }

    pub fn breakpoints(&self) -> &BreakpointSet {
        &self.breakpoints
    }

    pub fn breakpoints_mut(&mut self) -> &mut BreakpointSet {
        &mut self.breakpoints
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }
}

impl<IO: NumberIo> Drop for Processor<IO> {
    fn drop(&mut self) {
        self.memory.tracker_mut().disable_trace();
        log::debug!(
            "Processor torn down after {} instructions, {} cells",
            self.instructions,
            self.memory.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::traits::{Flags, ScriptedIo};

    /// Assemble `lines` at addresses 0, 1, 2, ...
    fn program(lines: &[&str]) -> MemoryStore {
        let mut memory = MemoryStore::new();
        for (addr, line) in lines.iter().enumerate() {
            let instr = codec::encode(line).unwrap();
            memory.write(addr as u32, Cell::from_instruction(instr)).unwrap();
        }
        memory
    }

    fn processor(lines: &[&str]) -> Processor<ScriptedIo> {
        Processor::new(program(lines), ScriptedIo::default())
    }

    #[test]
    fn test_lda_immediate() {
        let mut cpu = processor(&["lda #5"]);
        assert_eq!(cpu.step().unwrap(), StepResult::Continue);

        let state = cpu.status();
        assert_eq!(state.a, 5);
        assert_eq!(state.flags, Flags::default());
        assert_eq!(state.pc, 1);
        assert_eq!(cpu.instructions(), 1);
    }

    #[test]
    fn test_lda_negative_immediate() {
        let mut cpu = processor(&["lda #-1"]);
        cpu.step().unwrap();
        assert_eq!(cpu.status().a, -1);
        assert!(cpu.status().flags.n);
    }

    #[test]
    fn test_fresh_state() {
        let cpu = processor(&[]);
        let state = cpu.status();
        assert_eq!((state.a, state.b, state.pc, state.sp), (0, 0, 0, 900_000));
        assert!(!cpu.has_memory_changed());
    }

    #[test]
    fn test_divide_by_zero_leaves_state() {
        let mut cpu = processor(&["lda #9", "ldb #0", "div"]);
        cpu.step().unwrap();
        cpu.step().unwrap();
        let before = cpu.status();

        let err = cpu.step().unwrap_err();
        assert_eq!(err, VmError::DivideByZero { pc: 2 });
        assert_eq!(cpu.status(), before);
        assert_eq!(cpu.instructions(), 2);
    }

    #[test]
    fn test_mul_overflow_program() {
        let mut cpu = processor(&["lda #65536", "ldb #65536", "mul", "hlt"]);
        assert_eq!(cpu.run().unwrap(), StopReason::Halt);

        let state = cpu.status();
        assert_eq!(state.a, 0);
        assert!(state.flags.o);
        assert!(state.flags.z);
        assert_eq!(state.pc, 3);
    }

    #[test]
    fn test_jsb_and_rts() {
        let mut cpu = processor(&["jsb 3", "hlt", "nop", "lda #1", "rts"]);

        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 3);
        assert_eq!(cpu.stack_pointer(), 899_999);

        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), 1);
        assert_eq!(cpu.stack_pointer(), 900_000);

        assert_eq!(cpu.step().unwrap(), StepResult::Halt);
        assert_eq!(cpu.pc(), 1);
    }

    #[test]
    fn test_breakpoint_reported_after_step() {
        let mut cpu = processor(&["nop", "nop", "nop", "hlt"]);
        cpu.breakpoints_mut().set(2);

        assert_eq!(cpu.step().unwrap(), StepResult::Continue);
        assert_eq!(cpu.step().unwrap(), StepResult::Breakpoint { pc: 2 });
        assert_eq!(cpu.pc(), 2);
    }

    #[test]
    fn test_run_stops_at_breakpoint_then_resumes() {
        let mut cpu = processor(&["nop", "nop", "nop", "hlt"]);
        cpu.breakpoints_mut().set(2);

        assert_eq!(cpu.run().unwrap(), StopReason::Breakpoint { pc: 2 });
        assert_eq!(cpu.instructions(), 2);

        // Sitting on the breakpoint does not pause again.
        assert_eq!(cpu.run().unwrap(), StopReason::Halt);
        assert_eq!(cpu.pc(), 3);
    }

    #[test]
    fn test_breakpoint_at_start_not_hit_before_first_step() {
        let mut cpu = processor(&["nop", "hlt"]);
        cpu.breakpoints_mut().set(0);
        assert_eq!(cpu.run().unwrap(), StopReason::Halt);
    }

    #[test]
    fn test_unknown_instruction_in_uninitialized_memory() {
        let mut cpu = processor(&["nop"]);
        cpu.step().unwrap();
        let err = cpu.run().unwrap_err();
        assert_eq!(err, VmError::UnknownInstruction { opcode: 0x33, pc: 1 });
        assert_eq!(cpu.pc(), 1);
    }

    #[test]
    fn test_uninitialized_read_does_not_mark_change() {
        let mut cpu = processor(&["lda 500"]);
        cpu.step().unwrap();
        assert_eq!(cpu.read_memory(500), Cell::UNINITIALIZED);
        assert!(matches!(cpu.memory_changed(), Err(VmError::InvalidState(_))));
    }

    #[test]
    fn test_memory_changed_consumed_once() {
        let mut cpu = processor(&["lda #7", "sta 100"]);
        cpu.step().unwrap();
        cpu.step().unwrap();

        let change = cpu.memory_changed().unwrap();
        assert_eq!(change.address, 100);
        assert_eq!(change.value.as_int(), 7);
        assert!(cpu.memory_changed().is_err());
    }

    #[test]
    fn test_loader_writes_not_reported() {
        let mut cpu = processor(&["nop"]);
        assert!(!cpu.has_memory_changed());
        assert!(cpu.memory_changed().is_err());
    }

    #[test]
    fn test_stack_push_excluded_from_trace_by_default() {
        let mut cpu = processor(&["jsb 3", "sta 50", "hlt", "rts"]);
        cpu.enable_trace();
        assert_eq!(cpu.run().unwrap(), StopReason::Halt);

        let addresses: Vec<u32> = cpu.drain_trace().iter().map(|c| c.address).collect();
        assert_eq!(addresses, vec![50]);
    }

    #[test]
    fn test_stack_push_traced_when_enabled() {
        let mut cpu = processor(&["jsb 3", "sta 50", "hlt", "rts"]);
        cpu.set_stack_trace(true);
        cpu.enable_trace();
        cpu.run().unwrap();

        let trace = cpu.drain_trace();
        let addresses: Vec<u32> = trace.iter().map(|c| c.address).collect();
        assert_eq!(addresses, vec![50, 899_999]);
        assert_eq!(trace[1].value.raw(), 1);
    }

    #[test]
    fn test_trace_sorted_with_current_values() {
        let mut cpu = processor(&[
            "lda #1", "sta 30", "sta 10", "lda #2", "sta 20", "sta 30", "hlt",
        ]);
        cpu.enable_trace();
        cpu.run().unwrap();

        let trace = cpu.drain_trace();
        let pairs: Vec<(u32, i32)> = trace.iter().map(|c| (c.address, c.value.as_int())).collect();
        assert_eq!(pairs, vec![(10, 1), (20, 2), (30, 2)]);
    }

    #[test]
    fn test_execute_without_committing_pc() {
        let mut cpu = processor(&["nop"]);
        let instr = codec::encode("jmp 40").unwrap();
        assert_eq!(cpu.execute(instr, false).unwrap(), StepResult::Continue);
        assert_eq!(cpu.pc(), 0);

        let instr = codec::encode("lda #3").unwrap();
        cpu.execute(instr, false).unwrap();
        assert_eq!(cpu.status().a, 3);
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.instructions(), 0);
    }

    #[test]
    fn test_io_instructions() {
        let memory = program(&["inp", "out", "hlt"]);
        let mut cpu = Processor::new(memory, ScriptedIo::new([-12]));
        cpu.run().unwrap();

        assert_eq!(cpu.status().a, -12);
        assert!(cpu.status().flags.n);
        assert_eq!(cpu.io().outputs(), &[-12]);
    }

    #[test]
    fn test_input_queued_between_steps() {
        let mut cpu = processor(&["inp", "inp", "hlt"]);
        cpu.io_mut().push_input(3);
        cpu.step().unwrap();
        assert_eq!(cpu.status().a, 3);

        cpu.io_mut().push_input(0);
        cpu.step().unwrap();
        assert!(cpu.status().flags.z);
        assert_eq!(cpu.io().remaining_inputs(), 0);
    }

    #[test]
    fn test_conditional_loop() {
        // Count A down from 3 to 0, emitting each value.
        let mut cpu = processor(&[
            "lda #3", "ldb #1", "out", "sub", "jsp 2", "out", "hlt",
        ]);
        cpu.run().unwrap();
        assert_eq!(cpu.io().outputs(), &[3, 2, 1, 0]);
    }

    #[test]
    fn test_with_config() {
        let config = Config {
            stack_pointer: Some(100),
            trace_stack: Some(true),
            max_cells: Some(2),
        };
        let mut cpu = Processor::with_config(program(&["jsb 1", "hlt"]), ScriptedIo::default(), &config);
        assert_eq!(cpu.stack_pointer(), 100);
        assert!(cpu.stack_trace());

        // Two program cells already fill the limit.
        assert_eq!(cpu.step().unwrap_err(), VmError::OutOfMemory { address: 99 });
        assert_eq!(cpu.stack_pointer(), 100);
        assert_eq!(cpu.pc(), 0);
    }

    #[test]
    fn test_set_status_and_reset() {
        let mut cpu = processor(&["lda #4", "hlt"]);
        cpu.run().unwrap();

        let mut state = cpu.status();
        state.b = 99;
        state.pc = 0;
        cpu.set_status(state);
        assert_eq!(cpu.status().b, 99);

        cpu.reset();
        assert_eq!(cpu.status(), ProcessorState::default());
        assert_eq!(cpu.instructions(), 0);
        assert_eq!(cpu.read_memory(1).as_instruction(), codec::encode("hlt").unwrap());
    }

    #[test]
    fn test_disassemble_next() {
        let cpu = processor(&["sta (8)"]);
        assert_eq!(cpu.disassemble_next().unwrap(), "sta (8)");

        let mut cpu = processor(&["nop"]);
        cpu.step().unwrap();
        assert!(cpu.disassemble_next().is_err());
    }
}
