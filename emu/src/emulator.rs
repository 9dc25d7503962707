use std::convert::Infallible;

use arch::{
    alu::{alu, Alu},
    decode::{decode, Fetch},
    device::Extension,
    inst::Instruction,
    op::{BasicOp, NonBasicOp},
    operand::{Imm, Operand},
    reg::Reg,
};

use crate::{error::Error, memory::Memory};

/// Where a resolved operand lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Place {
    Reg(Reg),
    Mem(u16),
    Lit(u16),
}

/// Why [`Emulator::run_until`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// An instruction left PC where it was.
    Halted,
    /// The stop condition was met.
    Cancelled,
}

/// Reads the backing array without going through devices.
struct Backing<'a>(&'a [u16]);

impl Fetch for Backing<'_> {
    fn fetch(&mut self, addr: u16) -> u16 {
        self.0[addr as usize]
    }
}

pub struct Emulator {
    memory: Memory,
    /// A, B, C, X, Y, Z, I, J
    registers: [u16; 8],
    pc: u16,
    sp: u16,
    o: u16,
    cycles: u64,
}

impl Emulator {
    pub fn new(image: &[u16]) -> Result<Self, Error> {
        Ok(Emulator {
            memory: Memory::new(image)?,
            registers: [0; 8],
            pc: 0,
            sp: 0,
            o: 0,
            cycles: 0,
        })
    }

    /// Map the devices of `extensions` in order.
    pub fn install(&mut self, extensions: &[Extension]) {
        for ext in extensions {
            self.memory.install(ext);
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    pub fn o(&self) -> u16 {
        self.o
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Current value of `reg`. Stack pseudo registers show the word they
    /// would address, without moving SP.
    pub fn register(&self, reg: Reg) -> u16 {
        match reg {
            Reg::SP => self.sp,
            Reg::PC => self.pc,
            Reg::O => self.o,
            Reg::POP | Reg::PEEK => self.memory[self.sp as usize],
            Reg::PUSH => self.memory[self.sp.wrapping_sub(1) as usize],
            general => self.registers[general.code() as usize],
        }
    }

    pub fn set_register(&mut self, reg: Reg, value: u16) -> Result<(), Error> {
        match reg {
            Reg::SP => self.sp = value,
            Reg::PC => self.pc = value,
            Reg::O => self.o = value,
            Reg::POP | Reg::PEEK | Reg::PUSH => {
                return Err(Error::OperandKind(format!("cannot set `{}` directly", reg)))
            }
            general => self.registers[general.code() as usize] = value,
        }
        Ok(())
    }

    /// The instruction at PC and its address, decoded from the backing
    /// array. Nothing is executed.
    pub fn next_instruction(&self) -> Result<(u16, Instruction), Error> {
        let decoded = decode(&mut Backing(self.memory.words()), self.pc)?;
        Ok((self.pc, decoded.inst))
    }

    // ------------------------------------------------------------------------
    // Execution

    /// Execute one instruction.
    pub fn tick(&mut self) -> Result<(), Error> {
        let decoded = decode(&mut self.memory, self.pc)?;
        self.pc = decoded.next;
        self.cycles += decoded.cycles as u64;
        self.execute(&decoded.inst)
    }

    /// Step over one instruction without executing it.
    pub fn skip(&mut self) -> Result<(), Error> {
        let decoded = decode(&mut self.memory, self.pc)?;
        self.pc = decoded.next;
        self.cycles += 1;
        Ok(())
    }

    /// Run until an instruction leaves PC unchanged.
    pub fn run(&mut self) -> Result<(), Error> {
        self.run_until(|_| false).map(|_| ())
    }

    /// Run until an instruction leaves PC unchanged or `stop` returns true.
    /// `stop` is checked before every instruction.
    pub fn run_until(&mut self, mut stop: impl FnMut(&Emulator) -> bool) -> Result<Stop, Error> {
        self.memory.start();
        let res = loop {
            if stop(self) {
                break Ok(Stop::Cancelled);
            }
            let pc = self.pc;
            if let Err(err) = self.tick() {
                break Err(err);
            }
            if self.pc == pc {
                break Ok(Stop::Halted);
            }
        };
        self.memory.stop();
        res
    }

    /// Run until an error occurs.
    pub fn run_forever(&mut self) -> Result<Infallible, Error> {
        self.memory.start();
        let err = loop {
            if let Err(err) = self.tick() {
                break err;
            }
        };
        self.memory.stop();
        Err(err)
    }

    fn execute(&mut self, inst: &Instruction) -> Result<(), Error> {
        match inst {
            Instruction::Basic(BasicOp::SET, a, b) => {
                // `a` is resolved before `b`, and only once.
                let place = self.resolve(a)?;
                let value = self.get(b)?;
                self.store(place, a, value)?;
            }
            Instruction::Basic(op, a, b) => {
                let va = self.get(a)?;
                let vb = self.get(b)?;
                match alu(*op, va, vb) {
                    Alu::Write { value, overflow } => {
                        if let Some(o) = overflow {
                            self.o = o;
                        }
                        self.set(a, value)?;
                    }
                    Alu::Test(true) => {}
                    Alu::Test(false) => self.skip()?,
                }
            }
            Instruction::NonBasic(NonBasicOp::JSR, a) => {
                let target = self.get(a)?;
                self.sp = self.sp.wrapping_sub(1);
                self.memory.write(self.sp as usize, self.pc)?;
                self.pc = target;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Operands

    /// Locate `operand`. Stack pseudo registers move SP on every call.
    fn resolve(&mut self, operand: &Operand) -> Result<Place, Error> {
        match operand {
            Operand::Register(Reg::POP) => {
                let addr = self.sp;
                self.sp = self.sp.wrapping_add(1);
                Ok(Place::Mem(addr))
            }
            Operand::Register(Reg::PEEK) => Ok(Place::Mem(self.sp)),
            Operand::Register(Reg::PUSH) => {
                self.sp = self.sp.wrapping_sub(1);
                Ok(Place::Mem(self.sp))
            }
            Operand::Register(reg) => Ok(Place::Reg(*reg)),
            Operand::Indirect(inner) => match inner.as_ref() {
                Operand::Register(reg) if reg.is_general() => {
                    Ok(Place::Mem(self.registers[reg.code() as usize]))
                }
                Operand::Literal(addr) => Ok(Place::Mem(*addr)),
                _ => Err(Error::OperandKind(format!("cannot address `{}`", operand))),
            },
            Operand::Offset(reg, Imm::Lit(offset)) if reg.is_general() => Ok(Place::Mem(
                self.registers[reg.code() as usize].wrapping_add(*offset),
            )),
            Operand::Literal(v) => Ok(Place::Lit(*v)),
            Operand::Offset(..) | Operand::Label(_) | Operand::External(_) => Err(
                Error::OperandKind(format!("unresolved operand `{}`", operand)),
            ),
        }
    }

    fn get(&mut self, operand: &Operand) -> Result<u16, Error> {
        match self.resolve(operand)? {
            Place::Reg(reg) => Ok(self.register(reg)),
            Place::Mem(addr) => self.memory.read(addr as usize),
            Place::Lit(v) => Ok(v),
        }
    }

    fn set(&mut self, operand: &Operand, value: u16) -> Result<(), Error> {
        let place = self.resolve(operand)?;
        self.store(place, operand, value)
    }

    fn store(&mut self, place: Place, operand: &Operand, value: u16) -> Result<(), Error> {
        match place {
            Place::Reg(reg) => self.set_register(reg, value),
            Place::Mem(addr) => self.memory.write(addr as usize, value),
            Place::Lit(_) => Err(Error::OperandKind(format!("cannot write to `{}`", operand))),
        }
    }
}
