//! PseudoAsm execution engine.
//!
//! # Architecture
//!
//! - [`traits`]: host interfaces ([`NumberIo`], [`OutputSink`]) and shared
//!   execution types ([`Flags`], [`ExecuteResult`])
//! - [`state`]: processor state (registers, flags, PC, SP)
//! - [`execute`]: execution units (ALU, memory, control, I/O)
//! - [`processor`]: fetch/step/run loop over a [`MemoryStore`](crate::memory::MemoryStore)
//!
//! # Example
//!
//! ```
//! use pseudoasm::interpreter::{Processor, ScriptedIo, StopReason};
//! use pseudoasm::isa::{codec, Cell};
//! use pseudoasm::memory::MemoryStore;
//!
//! let mut memory = MemoryStore::new();
//! for (addr, line) in ["lda #2", "ldb #3", "mul", "out", "hlt"].iter().enumerate() {
//!     let instr = codec::encode(line).unwrap();
//!     memory.write(addr as u32, Cell::from_instruction(instr)).unwrap();
//! }
//!
//! let mut cpu = Processor::new(memory, ScriptedIo::default());
//! assert_eq!(cpu.run().unwrap(), StopReason::Halt);
//! assert_eq!(cpu.io().outputs(), &[6]);
//! ```

pub mod execute;
pub mod processor;
pub mod state;
pub mod traits;

pub use execute::Executor;
pub use processor::{Processor, StepResult, StopReason};
pub use state::{ProcessorState, DEFAULT_STACK_POINTER};
pub use traits::{ExecuteResult, Flags, LogSink, NumberIo, OutputSink, ScriptedIo};
