use std::fmt::Display;

use color_print::cformat;

use crate::{error::Error, reg::Reg};

/// Offset part of a `[reg+offset]` operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Imm {
    Lit(u16),
    Label(String),
}

impl Imm {
    fn word(&self) -> Word {
        match self {
            Imm::Lit(v) => Word::Lit(*v),
            Imm::Label(name) => Word::Label(name.clone()),
        }
    }
}

impl From<u16> for Imm {
    fn from(v: u16) -> Self {
        Imm::Lit(v)
    }
}

impl From<i32> for Imm {
    fn from(v: i32) -> Self {
        Imm::Lit(v as u16)
    }
}

impl From<&str> for Imm {
    fn from(name: &str) -> Self {
        Imm::Label(name.to_string())
    }
}

/// A machine word as emitted by the encoder. Symbolic words are patched by
/// the block (labels) or the linker (externals).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Word {
    Lit(u16),
    Label(String),
    External(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Register(Reg),
    Indirect(Box<Operand>),
    Offset(Reg, Imm),
    Literal(u16),
    Label(String),
    External(String),
}

impl Operand {
    /// `[inner]`. An offset operand already addresses memory and is returned
    /// as is.
    pub fn indirect(inner: Operand) -> Result<Operand, Error> {
        match inner {
            Operand::Register(r) if r.is_general() => Ok(Operand::Indirect(Box::new(inner))),
            Operand::Register(r) => Err(Error::MalformedOperand(format!(
                "cannot address memory through `{}`",
                r
            ))),
            Operand::Literal(_) | Operand::Label(_) | Operand::External(_) => {
                Ok(Operand::Indirect(Box::new(inner)))
            }
            Operand::Offset(..) => Ok(inner),
            Operand::Indirect(_) => Err(Error::MalformedOperand(format!(
                "nested indirection `[{}]`",
                inner
            ))),
        }
    }

    /// `[reg+offset]`
    pub fn offset(reg: Reg, offset: impl Into<Imm>) -> Result<Operand, Error> {
        if !reg.is_general() {
            return Err(Error::MalformedOperand(format!(
                "cannot offset from `{}`",
                reg
            )));
        }
        Ok(Operand::Offset(reg, offset.into()))
    }

    /// Symbol reference; a leading underscore marks a reference to another
    /// block.
    pub fn symbol(name: &str) -> Operand {
        match name.strip_prefix('_') {
            Some(block) if !block.is_empty() => Operand::External(block.to_string()),
            _ => Operand::Label(name.to_string()),
        }
    }

    /// The 6-bit operand field and the extra word it consumes, if any.
    pub fn code(&self) -> Result<(u16, Option<Word>), Error> {
        match self {
            Operand::Register(r) => Ok((r.code() as u16, None)),
            Operand::Indirect(inner) => match inner.as_ref() {
                Operand::Register(r) if r.is_general() => Ok((r.code() as u16 + 0x08, None)),
                Operand::Literal(v) => Ok((0x1E, Some(Word::Lit(*v)))),
                Operand::Label(name) => Ok((0x1E, Some(Word::Label(name.clone())))),
                Operand::External(name) => Ok((0x1E, Some(Word::External(name.clone())))),
                other => Err(Error::MalformedOperand(format!("[{}]", other))),
            },
            Operand::Offset(r, imm) if r.is_general() => {
                Ok((r.code() as u16 + 0x10, Some(imm.word())))
            }
            Operand::Offset(..) => Err(Error::MalformedOperand(self.to_string())),
            Operand::Literal(v) if *v <= 0x1F => Ok((*v + 0x20, None)),
            Operand::Literal(v) => Ok((0x1F, Some(Word::Lit(*v)))),
            Operand::Label(name) => Ok((0x1F, Some(Word::Label(name.clone())))),
            Operand::External(name) => Ok((0x1F, Some(Word::External(name.clone())))),
        }
    }

    /// Whether the operand consumes a word after the instruction word.
    pub fn takes_word(&self) -> bool {
        match self {
            Operand::Register(_) => false,
            Operand::Indirect(inner) => !matches!(inner.as_ref(), Operand::Register(_)),
            Operand::Literal(v) => *v > 0x1F,
            Operand::Offset(..) | Operand::Label(_) | Operand::External(_) => true,
        }
    }

    /// Whether reading the operand observes the value of `reg`.
    pub fn reads(&self, reg: Reg) -> bool {
        match self {
            Operand::Register(r) | Operand::Offset(r, _) => *r == reg,
            Operand::Indirect(inner) => inner.reads(reg),
            _ => false,
        }
    }

    pub fn cformat(&self) -> String {
        match self {
            Operand::Register(_) => cformat!("<b>{}</>", self),
            Operand::Literal(_) => cformat!("<y>{}</>", self),
            Operand::Label(_) | Operand::External(_) => cformat!("<g>{}</>", self),
            Operand::Indirect(_) | Operand::Offset(..) => cformat!("<c>{}</>", self),
        }
    }
}

impl From<Reg> for Operand {
    fn from(r: Reg) -> Self {
        Operand::Register(r)
    }
}

impl From<u16> for Operand {
    fn from(v: u16) -> Self {
        Operand::Literal(v)
    }
}

/// Untyped integer literals land here; negative values wrap to 16 bits.
impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Operand::Literal(v as u16)
    }
}

impl From<&str> for Operand {
    fn from(name: &str) -> Self {
        Operand::symbol(name)
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "{}", r),
            Operand::Indirect(inner) => write!(f, "[{}]", inner),
            Operand::Offset(r, Imm::Lit(v)) => write!(f, "[{}{:+}]", r, *v as i16),
            Operand::Offset(r, Imm::Label(name)) => write!(f, "[{}+{}]", r, name),
            Operand::Literal(v) => write!(f, "0x{:X}", v),
            Operand::Label(name) => write!(f, "{}", name),
            Operand::External(name) => write!(f, "_{}", name),
        }
    }
}
