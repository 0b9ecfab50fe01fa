//! Instruction codec: textual assembly ⇄ packed [`Instruction`].
//!
//! # Syntax
//!
//! ```text
//! lda #-5     ; immediate, the operand is the value
//! lda 100     ; direct, the operand is an address
//! lda (100)   ; indirect, the operand is the address of a pointer
//! add         ; no operand
//! ```
//!
//! Mnemonics are case-insensitive. Anything left over after a valid form is
//! rejected. Comments must already be stripped (see [`crate::loader`]).

use std::fmt;
use std::str::FromStr;

use super::{AddressingMode, Instruction, Opcode, OPERAND_MASK};
use crate::error::CodecError;

/// Smallest immediate accepted (`-2^23`).
const IMMEDIATE_MIN: i64 = -0x80_0000;

/// Largest immediate accepted (`2^23 - 1`).
const IMMEDIATE_MAX: i64 = 0x7F_FFFF;

/// Assemble one line of text into an instruction.
///
/// # Errors
///
/// - [`CodecError::UnknownInstruction`] if the mnemonic is not in the table.
/// - [`CodecError::InvalidInstruction`] if the operand form is malformed or
///   not allowed for the mnemonic.
pub fn encode(text: &str) -> Result<Instruction, CodecError> {
    let text = text.trim();
    let split = text
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(text.len());
    let (mnemonic, rest) = (&text[..split], text[split..].trim());

    let opcode: Opcode = mnemonic.parse()?;
    let forms = opcode.operand_forms();
    let invalid = || CodecError::InvalidInstruction(text.to_string());

    if !forms.takes_operand() {
        return if rest.is_empty() {
            Ok(Instruction::bare(opcode))
        } else {
            Err(invalid())
        };
    }

    let (mode, operand) = parse_operand(rest).ok_or_else(invalid)?;
    if !forms.allows(mode) {
        return Err(invalid());
    }

    Ok(Instruction::new(opcode, mode, operand))
}

/// Render an instruction as assembly text.
///
/// Instructions without an operand ignore their mode and operand fields.
///
/// # Errors
///
/// - [`CodecError::UnknownInstruction`] if the opcode is not in the table.
/// - [`CodecError::InvalidInstruction`] if the stored addressing mode is not
///   allowed for the opcode.
pub fn decode(instr: Instruction) -> Result<String, CodecError> {
    let opcode = instr.opcode().ok_or_else(|| {
        CodecError::UnknownInstruction(format!("opcode 0x{:02X}", instr.opcode_bits()))
    })?;
    let forms = opcode.operand_forms();
    let mnemonic = opcode.mnemonic();

    if !forms.takes_operand() {
        return Ok(mnemonic.to_string());
    }

    let mode = instr.mode();
    if !forms.allows(mode) {
        return Err(CodecError::InvalidInstruction(format!(
            "{} with {} addressing",
            mnemonic,
            mode.name()
        )));
    }

    match mode {
        AddressingMode::Immediate => Ok(format!("{} #{}", mnemonic, instr.signed_operand())),
        AddressingMode::Direct => Ok(format!("{} {}", mnemonic, instr.operand())),
        AddressingMode::Indirect => Ok(format!("{} ({})", mnemonic, instr.operand())),
        AddressingMode::Indexed => Err(CodecError::InvalidInstruction(format!(
            "{} with indexed addressing",
            mnemonic
        ))),
    }
}

/// Parse the text after the mnemonic into a mode and a 24-bit operand field.
fn parse_operand(rest: &str) -> Option<(AddressingMode, u32)> {
    if let Some(value) = rest.strip_prefix('#') {
        let value: i64 = value.trim().parse().ok()?;
        if !(IMMEDIATE_MIN..=IMMEDIATE_MAX).contains(&value) {
            return None;
        }
        return Some((AddressingMode::Immediate, (value as u32) & OPERAND_MASK));
    }

    if let Some(inner) = rest.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        // Space may precede the address but not the closing parenthesis.
        return parse_address(inner.trim_start()).map(|addr| (AddressingMode::Indirect, addr));
    }

    parse_address(rest).map(|addr| (AddressingMode::Direct, addr))
}

/// Non-negative address that fits in the operand field.
fn parse_address(text: &str) -> Option<u32> {
    if text.contains('-') {
        return None;
    }
    let value: u32 = text.parse().ok()?;
    (value <= OPERAND_MASK).then_some(value)
}

impl FromStr for Instruction {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        encode(s)
    }
}

impl fmt::Display for Instruction {
    /// Assembly text, or `.word 0x........` for patterns that do not decode.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match decode(*self) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, ".word 0x{:08X}", self.pack()),
        }
    }
}
