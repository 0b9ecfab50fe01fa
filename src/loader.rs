//! Program loader.
//!
//! Assembles source text line by line into memory, starting at address 0.
//! One source line always occupies one cell, so line numbers and addresses
//! coincide. A line that cannot be assembled is reported and replaced by a
//! `NOP` so the rest of the program still loads and every bad line gets its
//! own diagnostic.
//!
//! Comments start at `;` and run to the end of the line.

use crate::error::{CodecError, Result};
use crate::interpreter::OutputSink;
use crate::isa::{codec, Cell};
use crate::memory::MemoryStore;

/// Counts gathered while loading a program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Lines stored, including replaced ones.
    pub lines: usize,
    /// Empty lines replaced by `NOP`.
    pub warnings: usize,
    /// Lines that failed to assemble and were replaced by `NOP`.
    pub errors: usize,
}

impl LoadReport {
    /// Whether every non-empty line assembled.
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

/// Strip the comment and line terminator from a raw source line.
pub fn prepare_line(line: &str) -> &str {
    let end = line.find([';', '\n']).unwrap_or(line.len());
    line[..end].trim_end_matches('\r')
}

/// Assemble `source` into `memory` at addresses 0, 1, 2, ...
///
/// Diagnostics go to `sink`.
///
/// # Errors
///
/// Only [`VmError::OutOfMemory`](crate::error::VmError::OutOfMemory) aborts
/// the load. Assembly errors are reported and counted in the returned
/// [`LoadReport`].
pub fn load_source<S: OutputSink + ?Sized>(
    source: &str,
    sink: &mut S,
    memory: &mut MemoryStore,
) -> Result<LoadReport> {
    let mut report = LoadReport::default();
    let nop = Cell::from_int(0);

    for (index, raw) in source.lines().enumerate() {
        let line = prepare_line(raw);

        let cell = if line.trim().is_empty() {
            sink.emit(&format!(
                "  WARNING: Empty line ({}), replacing with NOP instruction.",
                index
            ));
            report.warnings += 1;
            nop
        } else {
            match codec::encode(line) {
                Ok(instr) => Cell::from_instruction(instr),
                Err(e) => {
                    let message = match e {
                        CodecError::UnknownInstruction(_) => {
                            format!("  ERROR: Unknown instruction at line {}: {}", index, line)
                        }
                        CodecError::InvalidInstruction(_) => {
                            format!("  ERROR: Invalid use of instruction at line {}: {}", index, line)
                        }
                    };
                    log::warn!("Line {} replaced with NOP: {}", index, e);
                    sink.emit(&message);
                    sink.emit("  > WARNING: Replacing with NOP instruction!");
                    report.errors += 1;
                    nop
                }
            }
        };

        memory.write(index as u32, cell)?;
        report.lines += 1;
    }

    sink.emit("  Compilation complete.");
    log::info!(
        "Loaded {} lines ({} empty, {} errors)",
        report.lines,
        report.warnings,
        report.errors
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VmError;
    use crate::isa::Opcode;

    #[test]
    fn test_prepare_line() {
        assert_eq!(prepare_line("lda #5 ; load five"), "lda #5 ");
        assert_eq!(prepare_line("; only a comment"), "");
        assert_eq!(prepare_line("hlt\r\n"), "hlt");
        assert_eq!(prepare_line("add"), "add");
    }

    #[test]
    fn test_load_program() {
        let mut sink: Vec<String> = Vec::new();
        let mut memory = MemoryStore::new();
        let source = "lda #1 ; one\nldb 10\nadd\nhlt\n";

        let report = load_source(source, &mut sink, &mut memory).unwrap();
        assert_eq!(report, LoadReport { lines: 4, warnings: 0, errors: 0 });
        assert!(report.is_clean());
        assert_eq!(sink, vec!["  Compilation complete.".to_string()]);

        assert_eq!(memory.len(), 4);
        assert_eq!(memory.read(2).as_instruction().opcode(), Some(Opcode::Add));
        assert_eq!(memory.read(3).as_instruction().opcode(), Some(Opcode::Hlt));
    }

    #[test]
    fn test_empty_line_becomes_nop() {
        let mut sink: Vec<String> = Vec::new();
        let mut memory = MemoryStore::new();

        let report = load_source("lda #1\n   ; nothing here\nhlt", &mut sink, &mut memory).unwrap();
        assert_eq!(report.warnings, 1);
        assert_eq!(memory.read(1).raw(), 0);
        assert_eq!(
            sink[0],
            "  WARNING: Empty line (1), replacing with NOP instruction."
        );
    }

    #[test]
    fn test_bad_lines_replaced() {
        let mut sink: Vec<String> = Vec::new();
        let mut memory = MemoryStore::new();

        let report = load_source("foo 1\nsta #2\nhlt", &mut sink, &mut memory).unwrap();
        assert_eq!(report, LoadReport { lines: 3, warnings: 0, errors: 2 });
        assert!(!report.is_clean());
        assert_eq!(
            sink,
            vec![
                "  ERROR: Unknown instruction at line 0: foo 1".to_string(),
                "  > WARNING: Replacing with NOP instruction!".to_string(),
                "  ERROR: Invalid use of instruction at line 1: sta #2".to_string(),
                "  > WARNING: Replacing with NOP instruction!".to_string(),
                "  Compilation complete.".to_string(),
            ]
        );
        assert_eq!(memory.read(0).raw(), 0);
        assert_eq!(memory.read(1).raw(), 0);
    }

    #[test]
    fn test_out_of_memory_aborts() {
        let mut sink: Vec<String> = Vec::new();
        let mut memory = MemoryStore::with_cell_limit(1);

        let err = load_source("nop\nnop\nnop", &mut sink, &mut memory).unwrap_err();
        assert_eq!(err, VmError::OutOfMemory { address: 1 });
        assert!(sink.is_empty());
    }
}
