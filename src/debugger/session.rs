//! Interactive debugging session.
//!
//! A [`Session`] wraps a [`Processor`] and turns every debugger operation into
//! the lines a user sees: status blocks, memory changes, breakpoint notices
//! and diagnostics. All text goes to the injected [`OutputSink`], so a shell,
//! a test or a log can sit on the other end.
//!
//! | Operation | Output |
//! |-----------|--------|
//! | `status` | registers, flags and the next instruction |
//! | `step` | last memory change, status |
//! | `run` | stop reason, every changed address, status |
//! | `exec` | memory change, status |
//! | `assemble` | patched cell, status if the PC was patched |

use crate::config::Config;
use crate::error::{Result, VmError};
use crate::interpreter::{NumberIo, OutputSink, Processor, StepResult, StopReason};
use crate::loader;
use crate::memory::{MemoryChange, MemoryStore};

/// A loaded program under the debugger.
pub struct Session<IO: NumberIo, S: OutputSink> {
    processor: Processor<IO>,
    sink: S,
}

impl<IO: NumberIo, S: OutputSink> Session<IO, S> {
    /// Wrap an existing processor.
    pub fn new(processor: Processor<IO>, sink: S) -> Self {
        Self { processor, sink }
    }

    /// Load `source`, start a processor on it and show the initial status.
    ///
    /// # Errors
    ///
    /// Only running out of memory during the load is fatal.
    pub fn from_source(source: &str, io: IO, mut sink: S, config: &Config) -> Result<Self> {
        let mut memory = MemoryStore::new();
        memory.set_cell_limit(config.max_cells());

        if let Err(e) = loader::load_source(source, &mut sink, &mut memory) {
            sink.emit(&error_message(&e));
            return Err(e);
        }

        let processor = Processor::with_config(memory, io, config);
        let mut session = Self::new(processor, sink);
        session.sink.emit("Runtime initialized!");
        session.status();
        Ok(session)
    }

    /// Emit registers, flags and the next instruction.
    pub fn status(&mut self) {
        let state = self.processor.status();
        let next = self
            .processor
            .disassemble_next()
            .unwrap_or_else(|_| "???".to_string());

        self.sink.emit(&format!(
            "  Registers: A: {:<10} B: {:<10} PC: {}",
            state.a, state.b, state.pc
        ));
        self.sink.emit(&format!(
            "  Flags:     Z: {}   O: {}   N: {}",
            flag_char(state.flags.z),
            flag_char(state.flags.o),
            flag_char(state.flags.n)
        ));
        self.sink.emit(&format!("  => {}", next));
    }

    /// Execute the next instruction.
    ///
    /// On `HLT` or an error only the outcome is reported. Otherwise the
    /// memory change (if any) and the status follow.
    pub fn step(&mut self) -> Result<StepResult> {
        match self.processor.step() {
            Ok(StepResult::Halt) => {
                self.sink.emit("==> Program successfully executed.");
                Ok(StepResult::Halt)
            }
            Ok(result) => {
                self.emit_last_change();
                self.status();
                Ok(result)
            }
            Err(e) => {
                self.sink.emit(&error_message(&e));
                Err(e)
            }
        }
    }

    /// Run until a breakpoint, `HLT` or an error, then report every address
    /// written along the way with its current value.
    pub fn run(&mut self) -> Result<StopReason> {
        self.processor.enable_trace();
        let result = self.processor.run();

        match &result {
            Ok(StopReason::Breakpoint { .. }) => self.sink.emit("==> A breakpoint has been hit!"),
            Ok(StopReason::Halt) => self.sink.emit("==> Program successfully executed."),
            Err(e) => self.sink.emit(&error_message(e)),
        }

        for change in self.processor.drain_trace() {
            self.sink.emit(&change_line(&change));
        }
        self.processor.disable_trace();
        self.status();

        result
    }

    /// Assemble and execute one instruction without moving the PC.
    pub fn exec(&mut self, text: &str) -> Result<StepResult> {
        let result = self.processor.execute_text(text);
        if let Err(VmError::Codec(_)) = result {
            self.sink.emit("Error parsing asm instruction");
            return result;
        }
        if result.is_err() {
            self.sink.emit("Error executing asm instruction");
        }

        self.emit_last_change();
        self.status();
        result
    }

    /// Assemble `text` into memory at `address`.
    pub fn assemble(&mut self, address: u32, text: &str) -> Result<MemoryChange> {
        let change = match self.processor.patch(address, text) {
            Ok(change) => change,
            Err(e @ VmError::Codec(_)) => {
                self.sink.emit("Error parsing asm instruction");
                return Err(e);
            }
            Err(e) => {
                self.sink.emit("Error writing to memory");
                return Err(e);
            }
        };

        self.sink.emit(&format!("{} ({})", change_line(&change), text.trim()));
        if self.processor.pc() == address {
            self.status();
        }
        Ok(change)
    }

    /// Set a breakpoint.
    pub fn set_breakpoint(&mut self, address: u32) {
        self.processor.breakpoints_mut().set(address);
        self.sink.emit(&format!("Breakpoint set at address {}", address));
    }

    /// List breakpoints in ascending order.
    pub fn list_breakpoints(&mut self) {
        if self.processor.breakpoints().is_empty() {
            self.sink.emit("No breakpoints have been set");
            return;
        }

        self.sink.emit("Breakpoints:");
        let lines: Vec<String> = self
            .processor
            .breakpoints()
            .iter()
            .map(|address| format!("  Address {}", address))
            .collect();
        for line in lines {
            self.sink.emit(&line);
        }
    }

    /// Delete a breakpoint.
    pub fn delete_breakpoint(&mut self, address: u32) -> Result<()> {
        match self.processor.breakpoints_mut().delete(address) {
            Ok(()) => {
                self.sink.emit(&format!("Breakpoint at address {} removed", address));
                Ok(())
            }
            Err(e) => {
                self.sink.emit(&format!("There was no breakpoint set at {}!", address));
                Err(e)
            }
        }
    }

    /// Current stack pointer.
    pub fn stack_pointer(&self) -> u32 {
        self.processor.stack_pointer()
    }

    /// Emit the stack pointer.
    pub fn show_stack_pointer(&mut self) {
        let sp = self.processor.stack_pointer();
        self.sink.emit(&format!("Stack Pointer: {}", sp));
    }

    /// Move the stack pointer.
    pub fn set_stack_pointer(&mut self, sp: u32) {
        self.processor.set_stack_pointer(sp);
        self.show_stack_pointer();
    }

    /// Toggle change reporting for `JSB` pushes.
    pub fn set_stack_trace(&mut self, enabled: bool) {
        self.processor.set_stack_trace(enabled);
        self.sink.emit(if enabled {
            "Stack changes are now traced"
        } else {
            "Stack trace is disabled"
        });
    }

    pub fn processor(&self) -> &Processor<IO> {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut Processor<IO> {
        &mut self.processor
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Emit the last memory change, if there was one.
    fn emit_last_change(&mut self) {
        if let Ok(change) = self.processor.memory_changed() {
            self.sink.emit(&change_line(&change));
        }
    }
}

/// `X` for a set flag, `_` for a clear one.
fn flag_char(set: bool) -> char {
    if set {
        'X'
    } else {
        '_'
    }
}

/// One memory change line: zero-padded address, tab, signed value.
fn change_line(change: &MemoryChange) -> String {
    format!("  [Memory] {:010}:\t{}", change.address, change.value.as_int())
}

/// User-facing text for an engine error.
fn error_message(error: &VmError) -> String {
    match error {
        VmError::DivideByZero { pc } => format!("Error: Division by zero at address {}", pc),
        VmError::UnknownInstruction { pc, .. } => format!("Unknown instruction at address {}", pc),
        VmError::InvalidInstruction { pc, .. } => format!("Invalid instruction at address {}", pc),
        VmError::OutOfMemory { .. } => "CRITICAL: PseudoAsm out of memory!".to_string(),
        other => format!("Unknown error ({})", other),
    }
}
