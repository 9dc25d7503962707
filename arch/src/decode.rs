use crate::{
    error::Error,
    inst::Instruction,
    op::{BasicOp, NonBasicOp},
    operand::{Imm, Operand},
    reg::Reg,
};

/// Source of instruction words.
pub trait Fetch {
    fn fetch(&mut self, addr: u16) -> u16;
}

/// A plain word image; addresses past its end read as zero.
impl Fetch for [u16] {
    fn fetch(&mut self, addr: u16) -> u16 {
        self.get(addr as usize).copied().unwrap_or(0)
    }
}

impl Fetch for Vec<u16> {
    fn fetch(&mut self, addr: u16) -> u16 {
        self.as_mut_slice().fetch(addr)
    }
}

/// Decoded instruction together with the address of the next instruction and
/// its cycle cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub inst: Instruction,
    pub next: u16,
    pub cycles: u16,
}

struct Cursor<'a, F: Fetch + ?Sized> {
    fetch: &'a mut F,
    pc: u16,
    extra: u16,
}

impl<'a, F: Fetch + ?Sized> Cursor<'a, F> {
    fn next_word(&mut self) -> u16 {
        let word = self.fetch.fetch(self.pc);
        self.pc = self.pc.wrapping_add(1);
        word
    }

    fn extra_word(&mut self) -> u16 {
        self.extra += 1;
        self.next_word()
    }

    fn operand(&mut self, field: u16) -> Result<Operand, Error> {
        match field {
            0x00..=0x07 => Ok(Operand::Register(Reg::general(field))),
            0x08..=0x0F => Ok(Operand::Indirect(Box::new(Operand::Register(Reg::general(
                field,
            ))))),
            0x10..=0x17 => Ok(Operand::Offset(Reg::general(field), Imm::Lit(self.extra_word()))),
            0x18..=0x1D => Reg::try_from(field as u8)
                .map(Operand::Register)
                .map_err(|_| Error::InvalidOperand(field)),
            0x1E => Ok(Operand::Indirect(Box::new(Operand::Literal(self.extra_word())))),
            0x1F => Ok(Operand::Literal(self.extra_word())),
            0x20..=0x3F => Ok(Operand::Literal(field - 0x20)),
            _ => Err(Error::InvalidOperand(field)),
        }
    }
}

/// Decode the instruction at `pc`. The program counter wraps at the end of
/// the address space.
pub fn decode<F: Fetch + ?Sized>(fetch: &mut F, pc: u16) -> Result<Decoded, Error> {
    let mut cursor = Cursor { fetch, pc, extra: 0 };
    let word = cursor.next_word();

    let inst = match word & 0xF {
        0 => {
            let op = NonBasicOp::decode((word >> 4) & 0x3F)?;
            let a = cursor.operand((word >> 10) & 0x3F)?;
            Instruction::NonBasic(op, a)
        }
        code => {
            let op = BasicOp::decode(code)?;
            let a = cursor.operand((word >> 4) & 0x3F)?;
            let b = cursor.operand((word >> 10) & 0x3F)?;
            Instruction::Basic(op, a, b)
        }
    };

    Ok(Decoded {
        inst,
        next: cursor.pc,
        cycles: 1 + cursor.extra,
    })
}
