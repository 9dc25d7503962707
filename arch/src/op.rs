use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::Error;

/// Two-operand instructions, selected by the low four bits of the word.
/// Opcode 0 marks a non-basic instruction and has no entry here.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoPrimitive,
    TryFromPrimitive,
    EnumString,
    EnumIter,
    Display,
)]
#[repr(u8)]
#[strum(ascii_case_insensitive)]
pub enum BasicOp {
    SET = 0x1,
    ADD = 0x2,
    SUB = 0x3,
    MUL = 0x4,
    DIV = 0x5,
    MOD = 0x6,
    SHL = 0x7,
    SHR = 0x8,
    AND = 0x9,
    BOR = 0xA,
    XOR = 0xB,
    IFE = 0xC,
    IFN = 0xD,
    IFG = 0xE,
    IFB = 0xF,
}

impl BasicOp {
    pub fn decode(code: u16) -> Result<Self, Error> {
        u8::try_from(code)
            .ok()
            .and_then(|c| BasicOp::try_from(c).ok())
            .ok_or(Error::InvalidOpcode(code))
    }

    pub fn code(self) -> u16 {
        u8::from(self) as u16
    }
}

/// One-operand instructions, selected by bits 4-9 when the basic opcode is 0.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoPrimitive,
    TryFromPrimitive,
    EnumString,
    EnumIter,
    Display,
)]
#[repr(u8)]
#[strum(ascii_case_insensitive)]
pub enum NonBasicOp {
    JSR = 0x01,
}

impl NonBasicOp {
    pub fn decode(code: u16) -> Result<Self, Error> {
        u8::try_from(code)
            .ok()
            .and_then(|c| NonBasicOp::try_from(c).ok())
            .ok_or(Error::InvalidNonBasicOpcode(code))
    }

    pub fn code(self) -> u16 {
        u8::from(self) as u16
    }
}

/// Any mnemonic the assembler accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Basic(BasicOp),
    NonBasic(NonBasicOp),
}

impl Mnemonic {
    pub fn parse(s: &str) -> Result<Self, Error> {
        if let Ok(op) = s.parse::<BasicOp>() {
            return Ok(Mnemonic::Basic(op));
        }
        if let Ok(op) = s.parse::<NonBasicOp>() {
            return Ok(Mnemonic::NonBasic(op));
        }
        Err(Error::UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn opcode_zero_is_not_basic() {
        assert_eq!(BasicOp::decode(0), Err(Error::InvalidOpcode(0)));
        assert_eq!(BasicOp::decode(0x10), Err(Error::InvalidOpcode(0x10)));
        assert_eq!(BasicOp::decode(0xF), Ok(BasicOp::IFB));
    }

    #[test]
    fn unmapped_non_basic_opcodes() {
        assert_eq!(NonBasicOp::decode(1), Ok(NonBasicOp::JSR));
        for code in [0x00, 0x02, 0x3F] {
            assert_eq!(
                NonBasicOp::decode(code),
                Err(Error::InvalidNonBasicOpcode(code))
            );
        }
    }

    #[test]
    fn basic_table_is_dense() {
        for (idx, op) in BasicOp::iter().enumerate() {
            assert_eq!(op.code(), idx as u16 + 1);
        }
    }

    #[test]
    fn mnemonics() {
        assert_eq!(Mnemonic::parse("set"), Ok(Mnemonic::Basic(BasicOp::SET)));
        assert_eq!(Mnemonic::parse("Jsr"), Ok(Mnemonic::NonBasic(NonBasicOp::JSR)));
        assert!(Mnemonic::parse("hoge").is_err());
        assert_eq!(BasicOp::BOR.to_string(), "BOR");
    }
}
