use arch::{
    inst::Instruction,
    op::{BasicOp, NonBasicOp},
    operand::{Imm, Operand, Word},
    reg::Reg,
};
use indexmap::IndexMap;

use crate::error::Error;

// ----------------------------------------------------------------------------
// Data

/// One entry of a word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataItem {
    Int(u16),
    /// One word per character.
    Str(String),
    /// Address of a label; a leading underscore refers to another block.
    Label(String),
}

impl From<u16> for DataItem {
    fn from(v: u16) -> Self {
        DataItem::Int(v)
    }
}

impl From<&str> for DataItem {
    fn from(s: &str) -> Self {
        DataItem::Str(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    Words(Vec<DataItem>),
    Zero(u16),
    Str(String),
}

/// One word per character; characters outside the 16-bit range are rejected.
fn chars(s: &str, mem: &mut Vec<Word>) -> Result<(), Error> {
    for c in s.chars() {
        let code = u16::try_from(u32::from(c))
            .map_err(|_| Error::UnknownData(format!("{:?} in {:?}", c, s)))?;
        mem.push(Word::Lit(code));
    }
    Ok(())
}

impl Data {
    pub fn to_machine(&self, mem: &mut Vec<Word>) -> Result<(), Error> {
        match self {
            Data::Words(items) => {
                for item in items {
                    match item {
                        DataItem::Int(v) => mem.push(Word::Lit(*v)),
                        DataItem::Str(s) => chars(s, mem)?,
                        DataItem::Label(name) => match Operand::symbol(name) {
                            Operand::External(block) => mem.push(Word::External(block)),
                            _ => mem.push(Word::Label(name.clone())),
                        },
                    }
                }
            }
            Data::Zero(n) => mem.extend((0..*n).map(|_| Word::Lit(0))),
            Data::Str(s) => chars(s, mem)?,
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Block

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Label(String),
    Inst(Instruction),
    Data(Data),
}

/// Word of a serialized block. Local labels are already resolved to an
/// offset from the start of the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emit {
    Lit(u16),
    Local(u16),
    External(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    items: Vec<Item>,
    /// Words of locals currently allocated on the stack.
    pub(crate) stack_usage: u16,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn label(&mut self, name: &str) -> &mut Self {
        self.items.push(Item::Label(name.to_string()));
        self
    }

    pub fn inst(&mut self, inst: Instruction) -> &mut Self {
        self.items.push(Item::Inst(inst));
        self
    }

    pub fn basic(
        &mut self,
        op: BasicOp,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
    ) -> &mut Self {
        self.inst(Instruction::Basic(op, a.into(), b.into()))
    }

    pub fn non_basic(&mut self, op: NonBasicOp, a: impl Into<Operand>) -> &mut Self {
        self.inst(Instruction::NonBasic(op, a.into()))
    }

    /// Data without a label of its own.
    pub fn raw(&mut self, data: Data) -> &mut Self {
        self.items.push(Item::Data(data));
        self
    }

    /// Labelled data.
    pub fn data(&mut self, name: &str, data: Data) -> &mut Self {
        self.label(name).raw(data)
    }

    pub fn words(&mut self, name: &str, items: impl IntoIterator<Item = DataItem>) -> &mut Self {
        self.data(name, Data::Words(items.into_iter().collect()))
    }

    pub fn zero(&mut self, name: &str, n: u16) -> &mut Self {
        self.data(name, Data::Zero(n))
    }

    pub fn string(&mut self, name: &str, s: &str) -> &mut Self {
        self.data(name, Data::Str(s.to_string()))
    }

    /// Serialize the block. Returns the words and the offset of every label.
    pub fn to_machine(&self) -> Result<(Vec<Emit>, IndexMap<String, u16>), Error> {
        let mut mem: Vec<Word> = vec![];
        let mut labels: IndexMap<String, u16> = IndexMap::new();

        for item in &self.items {
            match item {
                Item::Label(name) => {
                    let offset = u16::try_from(mem.len())
                        .map_err(|_| Error::AddressOverflow(name.clone()))?;
                    if labels.insert(name.clone(), offset).is_some() {
                        return Err(Error::RedefinedLabel(name.clone()));
                    }
                }
                Item::Inst(inst) => inst.to_machine(&mut mem)?,
                Item::Data(data) => data.to_machine(&mut mem)?,
            }
        }

        let words = mem
            .into_iter()
            .map(|word| match word {
                Word::Lit(v) => Ok(Emit::Lit(v)),
                Word::Label(name) => labels
                    .get(&name)
                    .map(|offset| Emit::Local(*offset))
                    .ok_or(Error::MissingLabel(name)),
                Word::External(name) => Ok(Emit::External(name)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((words, labels))
    }
}

macro_rules! basic_ops {
    ($($name:ident => $op:ident,)*) => {
        impl Block {
            $(
                pub fn $name(&mut self, a: impl Into<Operand>, b: impl Into<Operand>) -> &mut Self {
                    self.basic(BasicOp::$op, a, b)
                }
            )*
        }
    };
}

basic_ops! {
    set => SET,
    add => ADD,
    sub => SUB,
    mul => MUL,
    div => DIV,
    rem => MOD,
    shl => SHL,
    shr => SHR,
    and => AND,
    bor => BOR,
    xor => XOR,
    ife => IFE,
    ifn => IFN,
    ifg => IFG,
    ifb => IFB,
}

impl Block {
    pub fn jsr(&mut self, a: impl Into<Operand>) -> &mut Self {
        self.non_basic(NonBasicOp::JSR, a)
    }
}

/// `[inner]`; an offset operand is already an indirection and passes through.
/// Invalid targets are reported when the block is serialized.
pub fn ind(inner: impl Into<Operand>) -> Operand {
    match inner.into() {
        off @ Operand::Offset(..) => off,
        inner => Operand::Indirect(Box::new(inner)),
    }
}

/// `[reg+offset]`
pub fn off(reg: Reg, offset: impl Into<Imm>) -> Operand {
    Operand::Offset(reg, offset.into())
}
