use std::fmt::Display;

use color_print::cformat;

use crate::{
    error::Error,
    op::{BasicOp, NonBasicOp},
    operand::{Operand, Word},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    Basic(BasicOp, Operand, Operand),
    NonBasic(NonBasicOp, Operand),
}

impl Instruction {
    /// Append the instruction word followed by the extra words of `a`, then `b`.
    pub fn to_machine(&self, mem: &mut Vec<Word>) -> Result<(), Error> {
        match self {
            Instruction::Basic(op, a, b) => {
                let (acode, aw) = a.code()?;
                let (bcode, bw) = b.code()?;
                mem.push(Word::Lit(op.code() | (acode << 4) | (bcode << 10)));
                mem.extend(aw);
                mem.extend(bw);
            }
            Instruction::NonBasic(op, a) => {
                let (acode, aw) = a.code()?;
                mem.push(Word::Lit((op.code() << 4) | (acode << 10)));
                mem.extend(aw);
            }
        }
        Ok(())
    }

    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Instruction::Basic(_, a, b) => vec![a, b],
            Instruction::NonBasic(_, a) => vec![a],
        }
    }

    /// Number of words the instruction occupies.
    pub fn size(&self) -> u16 {
        1 + self.operands().iter().filter(|o| o.takes_word()).count() as u16
    }

    /// One cycle plus one for every operand that consumes an extra word.
    pub fn cycles(&self) -> u16 {
        self.size()
    }

    pub fn cformat(&self) -> String {
        match self {
            Instruction::Basic(op, a, b) => cformat!(
                "<r>{:<4}</>{}, {}",
                op.to_string(),
                a.cformat(),
                b.cformat()
            ),
            Instruction::NonBasic(op, a) => {
                cformat!("<r>{:<4}</>{}", op.to_string(), a.cformat())
            }
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Basic(op, a, b) => write!(f, "{} {}, {}", op, a, b),
            Instruction::NonBasic(op, a) => write!(f, "{} {}", op, a),
        }
    }
}
