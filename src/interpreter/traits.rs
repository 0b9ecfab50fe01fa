//! Host-facing traits and shared execution types.
//!
//! The engine never touches the console itself. Everything it needs from the
//! outside world goes through two small traits:
//!
//! - [`NumberIo`]: the `INP` / `OUT` instructions.
//! - [`OutputSink`]: diagnostic and status text from the loader and the
//!   debugging session.
//!
//! [`ScriptedIo`] and the `Vec<String>` sink make both easy to drive from
//! tests.

use std::collections::VecDeque;

/// Condition flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Zero flag: last result was zero.
    pub z: bool,
    /// Negative flag: last result was negative.
    pub n: bool,
    /// Overflow flag: last arithmetic result did not fit in 32 bits.
    pub o: bool,
}

impl Flags {
    /// Flags for a loaded or input value: Z and N from the value, O cleared.
    #[inline]
    pub fn from_value(value: i32) -> Self {
        Self {
            z: value == 0,
            n: value < 0,
            o: false,
        }
    }

    /// Flags for an arithmetic result with its overflow indication.
    #[inline]
    pub fn from_arith(value: i32, overflow: bool) -> Self {
        Self {
            o: overflow,
            ..Self::from_value(value)
        }
    }
}

/// Result of executing one instruction, before the PC is updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteResult {
    /// Fall through to PC + 1.
    Continue,

    /// Transfer control to `target`.
    Jump {
        /// New program counter.
        target: u32,
    },

    /// `HLT` reached.
    Halt,
}

/// Numeric I/O used by `INP` and `OUT`.
pub trait NumberIo {
    /// Supply the value for `INP`.
    fn read_number(&mut self) -> i32;

    /// Consume the value of `OUT`.
    fn write_number(&mut self, value: i32);
}

/// Destination for human-readable diagnostic and status lines.
pub trait OutputSink {
    /// Emit one line of text (without trailing newline).
    fn emit(&mut self, text: &str);
}

impl OutputSink for Vec<String> {
    fn emit(&mut self, text: &str) {
        self.push(text.to_string());
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn emit(&mut self, text: &str) {
        (**self).emit(text);
    }
}

/// Sink that forwards every line to `log::info!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn emit(&mut self, text: &str) {
        log::info!("{}", text);
    }
}

/// Number I/O backed by a queue of inputs and a record of outputs.
///
/// Reading past the end of the queue yields 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedIo {
    inputs: VecDeque<i32>,
    outputs: Vec<i32>,
}

impl ScriptedIo {
    /// Create with the given inputs, consumed front to back.
    pub fn new(inputs: impl IntoIterator<Item = i32>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
            outputs: Vec::new(),
        }
    }

    /// Queue another input.
    pub fn push_input(&mut self, value: i32) {
        self.inputs.push_back(value);
    }

    /// Inputs not consumed yet.
    pub fn remaining_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Every value written so far, oldest first.
    pub fn outputs(&self) -> &[i32] {
        &self.outputs
    }
}

impl NumberIo for ScriptedIo {
    fn read_number(&mut self) -> i32 {
        self.inputs.pop_front().unwrap_or_else(|| {
            log::debug!("Scripted input exhausted, reading 0");
            0
        })
    }

    fn write_number(&mut self, value: i32) {
        self.outputs.push(value);
    }
}
