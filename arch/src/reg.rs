use bimap::BiMap;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::error::Error;

/// Register identifiers. The discriminant is the operand field that selects
/// the register directly.
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
)]
#[repr(u8)]
pub enum Reg {
    A = 0x00,
    B = 0x01,
    C = 0x02,
    X = 0x03,
    Y = 0x04,
    Z = 0x05,
    I = 0x06,
    J = 0x07,
    POP = 0x18,
    PEEK = 0x19,
    PUSH = 0x1A,
    SP = 0x1B,
    PC = 0x1C,
    O = 0x1D,
}

static REG_MAP: Lazy<BiMap<&'static str, Reg>> = Lazy::new(|| {
    let mut map: BiMap<&'static str, Reg> = BiMap::new();
    map.insert("a", Reg::A);
    map.insert("b", Reg::B);
    map.insert("c", Reg::C);
    map.insert("x", Reg::X);
    map.insert("y", Reg::Y);
    map.insert("z", Reg::Z);
    map.insert("i", Reg::I);
    map.insert("j", Reg::J);
    map.insert("pop", Reg::POP);
    map.insert("peek", Reg::PEEK);
    map.insert("push", Reg::PUSH);
    map.insert("sp", Reg::SP);
    map.insert("pc", Reg::PC);
    map.insert("o", Reg::O);
    map
});

impl Reg {
    pub const GENERAL: [Reg; 8] = [
        Reg::A,
        Reg::B,
        Reg::C,
        Reg::X,
        Reg::Y,
        Reg::Z,
        Reg::I,
        Reg::J,
    ];

    pub fn parse(s: &str) -> Result<Reg, Error> {
        REG_MAP
            .get_by_left(s.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| Error::UnknownRegister(s.to_string()))
    }

    pub fn name(&self) -> &'static str {
        REG_MAP.get_by_right(self).copied().unwrap_or("?")
    }

    pub fn code(self) -> u8 {
        self.into()
    }

    /// A..J, the registers that can be used for indirection.
    pub fn is_general(self) -> bool {
        self.code() < 0x08
    }

    /// General register selected by the low three bits of an operand field.
    pub fn general(index: u16) -> Reg {
        Reg::GENERAL[(index & 0x7) as usize]
    }
}

impl FromStr for Reg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reg::parse(s)
    }
}

impl Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Reg::parse("SP"), Ok(Reg::SP));
        assert_eq!(Reg::parse("peek"), Ok(Reg::PEEK));
        assert_eq!("J".parse::<Reg>(), Ok(Reg::J));
        assert!(Reg::parse("hoge").is_err());
    }

    #[test]
    fn codes_match_operand_fields() {
        assert_eq!(Reg::A.code(), 0x00);
        assert_eq!(Reg::J.code(), 0x07);
        assert_eq!(Reg::try_from(0x1C), Ok(Reg::PC));
        assert!(Reg::try_from(0x08).is_err());
        assert!(Reg::X.is_general());
        assert!(!Reg::SP.is_general());
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(Reg::O.to_string(), "o");
        assert_eq!(Reg::general(6).to_string(), "i");
    }
}
