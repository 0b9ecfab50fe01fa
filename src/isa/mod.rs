//! PseudoAsm instruction set.
//!
//! Every memory cell is 32 bits wide. The same bit pattern is read either as
//! a signed integer (data access) or as a packed instruction (fetch):
//!
//! | Bits | Width | Field |
//! |------|-------|-------|
//! | 31..26 | 6 | opcode |
//! | 25..24 | 2 | addressing mode |
//! | 23..0 | 24 | operand |
//!
//! # Opcode table
//!
//! | Mnemonic | Opcode | Operand forms |
//! |----------|--------|---------------|
//! | `NOP` | 0x00 | none |
//! | `LDA` / `LDB` | 0x04 / 0x05 | `#n`, `n`, `(n)` |
//! | `STA` / `STB` | 0x08 / 0x09 | `n`, `(n)` |
//! | `INP` / `OUT` | 0x18 / 0x1C | none |
//! | `ADD` `SUB` `MUL` `DIV` | 0x20..0x2C | none |
//! | `JMP` `JSP` `JSN` `JIZ` `JOF` | 0x30..0x38 | `n` |
//! | `JSB` / `RTS` | 0x3C / 0x3D | `n` / none |
//! | `HLT` | 0x3F | none |
//!
//! See [`codec`] for the textual form.

pub mod codec;

use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;

/// Width of the operand field in bits.
pub const OPERAND_BITS: u32 = 24;

/// Mask selecting the operand field.
pub const OPERAND_MASK: u32 = (1 << OPERAND_BITS) - 1;

/// Operand value stored for instructions that take no operand (-1 in 24 bits).
pub const UNUSED_OPERAND: u32 = OPERAND_MASK;

const MODE_SHIFT: u32 = 24;
const MODE_MASK: u32 = 0x3;
const OPCODE_SHIFT: u32 = 26;
const OPCODE_MASK: u32 = 0x3F;

/// Bit pattern returned when reading an address that was never written.
pub const UNINITIALIZED: u32 = 0xCCCC_CCCC;

/// One 32-bit memory cell.
///
/// No type tag is stored: whoever reads the cell decides whether it is an
/// integer or an instruction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cell(u32);

impl Cell {
    /// The value of memory that has never been written.
    pub const UNINITIALIZED: Cell = Cell(UNINITIALIZED);

    /// Wrap a raw bit pattern.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw bit pattern.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Store a signed integer.
    pub const fn from_int(value: i32) -> Self {
        Self(value as u32)
    }

    /// Integer view of the cell.
    pub const fn as_int(self) -> i32 {
        self.0 as i32
    }

    /// Store a packed instruction.
    pub const fn from_instruction(instr: Instruction) -> Self {
        Self(instr.pack())
    }

    /// Instruction view of the cell.
    pub const fn as_instruction(self) -> Instruction {
        Instruction::unpack(self.0)
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell(0x{:08X})", self.0)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Self::from_int(value)
    }
}

impl From<Instruction> for Cell {
    fn from(instr: Instruction) -> Self {
        Self::from_instruction(instr)
    }
}

/// Addressing mode field of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AddressingMode {
    /// `#n`: the operand itself is the value.
    Immediate = 0,
    /// `n`: the operand is an address.
    Direct = 1,
    /// `(n)`: the operand is the address of a pointer.
    Indirect = 2,
    /// Reserved. No instruction accepts it.
    Indexed = 3,
}

impl AddressingMode {
    /// Decode the 2-bit mode field.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & MODE_MASK as u8 {
            0 => AddressingMode::Immediate,
            1 => AddressingMode::Direct,
            2 => AddressingMode::Indirect,
            _ => AddressingMode::Indexed,
        }
    }

    /// Name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            AddressingMode::Immediate => "immediate",
            AddressingMode::Direct => "direct",
            AddressingMode::Indirect => "indirect",
            AddressingMode::Indexed => "indexed",
        }
    }
}

/// Operand forms an opcode accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandForms {
    pub immediate: bool,
    pub direct: bool,
    pub indirect: bool,
}

impl OperandForms {
    /// Bare mnemonic only.
    pub const NONE: Self = Self { immediate: false, direct: false, indirect: false };
    /// `n` only.
    pub const DIRECT: Self = Self { immediate: false, direct: true, indirect: false };
    /// `n` or `(n)`.
    pub const ADDRESS: Self = Self { immediate: false, direct: true, indirect: true };
    /// `#n`, `n` or `(n)`.
    pub const ANY: Self = Self { immediate: true, direct: true, indirect: true };

    /// Whether the opcode takes an operand at all.
    pub const fn takes_operand(self) -> bool {
        self.immediate || self.direct || self.indirect
    }

    /// Whether the given addressing mode is allowed.
    pub const fn allows(self, mode: AddressingMode) -> bool {
        match mode {
            AddressingMode::Immediate => self.immediate,
            AddressingMode::Direct => self.direct,
            AddressingMode::Indirect => self.indirect,
            AddressingMode::Indexed => false,
        }
    }
}

/// Instruction opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0x00,
    Lda = 0x04,
    Ldb = 0x05,
    Sta = 0x08,
    Stb = 0x09,
    Inp = 0x18,
    Out = 0x1C,
    Add = 0x20,
    Sub = 0x24,
    Mul = 0x28,
    Div = 0x2C,
    Jmp = 0x30,
    Jsp = 0x32,
    Jsn = 0x34,
    Jiz = 0x36,
    Jof = 0x38,
    Jsb = 0x3C,
    Rts = 0x3D,
    Hlt = 0x3F,
}

impl Opcode {
    /// Every opcode, in assembler table order.
    pub const ALL: [Opcode; 19] = [
        Opcode::Lda,
        Opcode::Ldb,
        Opcode::Sta,
        Opcode::Stb,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Rts,
        Opcode::Nop,
        Opcode::Inp,
        Opcode::Out,
        Opcode::Hlt,
        Opcode::Jsb,
        Opcode::Jmp,
        Opcode::Jsp,
        Opcode::Jsn,
        Opcode::Jiz,
        Opcode::Jof,
    ];

    /// Decode a 6-bit opcode field. Returns `None` for holes in the table.
    pub fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| *op as u8 == bits)
    }

    /// Lower-case assembler mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "nop",
            Opcode::Lda => "lda",
            Opcode::Ldb => "ldb",
            Opcode::Sta => "sta",
            Opcode::Stb => "stb",
            Opcode::Inp => "inp",
            Opcode::Out => "out",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Jmp => "jmp",
            Opcode::Jsp => "jsp",
            Opcode::Jsn => "jsn",
            Opcode::Jiz => "jiz",
            Opcode::Jof => "jof",
            Opcode::Jsb => "jsb",
            Opcode::Rts => "rts",
            Opcode::Hlt => "hlt",
        }
    }

    /// Operand forms accepted by this opcode.
    pub const fn operand_forms(self) -> OperandForms {
        match self {
            Opcode::Lda | Opcode::Ldb => OperandForms::ANY,
            Opcode::Sta | Opcode::Stb => OperandForms::ADDRESS,
            Opcode::Jmp
            | Opcode::Jsp
            | Opcode::Jsn
            | Opcode::Jiz
            | Opcode::Jof
            | Opcode::Jsb => OperandForms::DIRECT,
            Opcode::Nop
            | Opcode::Inp
            | Opcode::Out
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Rts
            | Opcode::Hlt => OperandForms::NONE,
        }
    }
}

impl FromStr for Opcode {
    type Err = CodecError;

    /// Case-insensitive mnemonic lookup.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(s))
            .ok_or_else(|| CodecError::UnknownInstruction(s.to_string()))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A packed instruction: 6-bit opcode, 2-bit addressing mode, 24-bit operand.
///
/// The fields are stored raw so that any 32-bit pattern can be represented,
/// including ones whose opcode is not in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    opcode: u8,
    mode: u8,
    operand: u32,
}

impl Instruction {
    /// Build an instruction from raw field values. Each field is truncated to its width.
    pub const fn from_fields(opcode: u8, mode: u8, operand: u32) -> Self {
        Self {
            opcode: opcode & OPCODE_MASK as u8,
            mode: mode & MODE_MASK as u8,
            operand: operand & OPERAND_MASK,
        }
    }

    /// Build an instruction with an operand.
    pub const fn new(opcode: Opcode, mode: AddressingMode, operand: u32) -> Self {
        Self::from_fields(opcode as u8, mode as u8, operand)
    }

    /// Build an instruction that takes no operand.
    pub const fn bare(opcode: Opcode) -> Self {
        Self::from_fields(opcode as u8, 0, UNUSED_OPERAND)
    }

    /// Pack into a 32-bit word.
    pub const fn pack(self) -> u32 {
        ((self.opcode as u32) << OPCODE_SHIFT)
            | ((self.mode as u32) << MODE_SHIFT)
            | self.operand
    }

    /// Unpack a 32-bit word.
    pub const fn unpack(raw: u32) -> Self {
        Self {
            opcode: ((raw >> OPCODE_SHIFT) & OPCODE_MASK) as u8,
            mode: ((raw >> MODE_SHIFT) & MODE_MASK) as u8,
            operand: raw & OPERAND_MASK,
        }
    }

    /// Raw opcode field.
    pub const fn opcode_bits(&self) -> u8 {
        self.opcode
    }

    /// Opcode, if the field names one.
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_bits(self.opcode)
    }

    /// Raw addressing mode field.
    pub const fn mode_bits(&self) -> u8 {
        self.mode
    }

    /// Addressing mode.
    pub const fn mode(&self) -> AddressingMode {
        AddressingMode::from_bits(self.mode)
    }

    /// Raw 24-bit operand.
    pub const fn operand(&self) -> u32 {
        self.operand
    }

    /// Operand sign-extended from 24 to 32 bits.
    pub const fn signed_operand(&self) -> i32 {
        let mut value = self.operand;
        if value & 0x0080_0000 != 0 {
            value |= 0xFF00_0000;
        }
        value as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_field_layout() {
        let instr = Instruction::new(Opcode::Lda, AddressingMode::Direct, 0x123456);
        assert_eq!(instr.pack(), (0x04 << 26) | (1 << 24) | 0x123456);
        assert_eq!(Instruction::unpack(instr.pack()), instr);
    }

    #[test]
    fn test_operand_truncated_to_24_bits() {
        let instr = Instruction::from_fields(0x04, 0, 0xFFFF_FFFF);
        assert_eq!(instr.operand(), 0x00FF_FFFF);
    }

    #[test]
    fn test_signed_operand() {
        assert_eq!(Instruction::from_fields(0x04, 0, 5).signed_operand(), 5);
        assert_eq!(Instruction::from_fields(0x04, 0, 0xFF_FFFF).signed_operand(), -1);
        assert_eq!(Instruction::from_fields(0x04, 0, 0x80_0000).signed_operand(), -8_388_608);
        assert_eq!(Instruction::from_fields(0x04, 0, 0x7F_FFFF).signed_operand(), 8_388_607);
    }

    #[test]
    fn test_cell_views_share_bits() {
        let cell = Cell::from_int(-1);
        assert_eq!(cell.raw(), 0xFFFF_FFFF);
        let instr = cell.as_instruction();
        assert_eq!(instr.opcode_bits(), 0x3F);
        assert_eq!(instr.opcode(), Some(Opcode::Hlt));

        // A zero cell is a NOP.
        assert_eq!(Cell::from_int(0).as_instruction().opcode(), Some(Opcode::Nop));
    }

    #[test]
    fn test_uninitialized_is_not_an_opcode() {
        assert_eq!(Cell::UNINITIALIZED.as_instruction().opcode(), None);
        assert_eq!(Cell::UNINITIALIZED.as_int(), 0xCCCC_CCCCu32 as i32);
    }

    #[test]
    fn test_opcode_from_bits() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_bits(op as u8), Some(op));
        }
        assert_eq!(Opcode::from_bits(0x01), None);
        assert_eq!(Opcode::from_bits(0x3E), None);
    }

    #[test]
    fn test_opcode_from_str() {
        assert_eq!("LDA".parse::<Opcode>(), Ok(Opcode::Lda));
        assert_eq!("jof".parse::<Opcode>(), Ok(Opcode::Jof));
        assert!(matches!(
            "foo".parse::<Opcode>(),
            Err(CodecError::UnknownInstruction(_))
        ));
    }

    #[test]
    fn test_operand_forms() {
        assert!(Opcode::Lda.operand_forms().allows(AddressingMode::Immediate));
        assert!(!Opcode::Sta.operand_forms().allows(AddressingMode::Immediate));
        assert!(!Opcode::Jmp.operand_forms().allows(AddressingMode::Indirect));
        assert!(!Opcode::Add.operand_forms().takes_operand());
        for op in Opcode::ALL {
            assert!(!op.operand_forms().allows(AddressingMode::Indexed));
        }
    }
}
