//! Calling convention.
//!
//! The first three arguments travel in A, B and C, the rest on the stack,
//! pushed in reverse order so that the fourth argument ends up right above
//! the return address. J is the frame pointer and is preserved by the callee.
//! The caller drops the stack arguments after the call.

use arch::{
    operand::{Imm, Operand},
    reg::Reg,
};

use crate::{
    block::Block,
    error::Error,
    movesort::{MoveSorter, ARG_REGS},
};

impl Block {
    /// Call `target` with `args`.
    pub fn call(
        &mut self,
        target: impl Into<Operand>,
        args: impl IntoIterator<Item = Operand>,
    ) -> Result<&mut Self, Error> {
        let mut reg_args: Vec<Operand> = args.into_iter().collect();
        let stack_args = if reg_args.len() > ARG_REGS.len() {
            reg_args.split_off(ARG_REGS.len())
        } else {
            vec![]
        };

        for arg in stack_args.iter().rev() {
            self.set(Reg::PUSH, arg.clone());
        }

        for m in MoveSorter::new(reg_args)?.sort()? {
            self.set(m.dst, m.src);
        }

        self.jsr(target);

        if !stack_args.is_empty() {
            self.add(Reg::SP, stack_args.len() as u16);
        }
        Ok(self)
    }

    /// Function body with a frame. `body` receives the location of each of
    /// the `arity` arguments.
    pub fn fun(
        &mut self,
        arity: usize,
        body: impl FnOnce(&mut Block, &[Operand]) -> Result<(), Error>,
    ) -> Result<&mut Self, Error> {
        // prologue
        self.set(Reg::PUSH, Reg::J).set(Reg::J, Reg::SP);

        let args: Vec<Operand> = (0..arity)
            .map(|i| match ARG_REGS.get(i) {
                Some(reg) => Operand::Register(*reg),
                // [j] is the caller's frame pointer, [j+1] the return address
                None => Operand::Offset(Reg::J, Imm::Lit((2 + i - ARG_REGS.len()) as u16)),
            })
            .collect();
        body(self, &args)?;

        // epilogue
        self.set(Reg::SP, Reg::J)
            .set(Reg::J, Reg::POP)
            .set(Reg::PC, Reg::POP);
        Ok(self)
    }

    /// Stack storage for `n` locals below the frame pointer. Nested calls
    /// allocate below the locals of the enclosing call.
    pub fn locals(
        &mut self,
        n: u16,
        body: impl FnOnce(&mut Block, &[Operand]) -> Result<(), Error>,
    ) -> Result<&mut Self, Error> {
        let usage = self.stack_usage;
        let locals: Vec<Operand> = (0..n)
            .map(|i| {
                let offset = -(usage as i32 + i as i32 + 1);
                Operand::Offset(Reg::J, Imm::Lit(offset as u16))
            })
            .collect();

        self.stack_usage += n;
        self.sub(Reg::SP, n);
        let res = body(self, &locals);
        self.add(Reg::SP, n);
        self.stack_usage -= n;

        res.map(|_| self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch::{inst::Instruction, op::BasicOp};
    use Reg::*;

    fn insts(block: &Block) -> Vec<String> {
        block
            .items()
            .iter()
            .map(|item| match item {
                crate::block::Item::Inst(inst) => inst.to_string(),
                other => format!("{:?}", other),
            })
            .collect()
    }

    #[test]
    fn call_pushes_stack_args_in_reverse() {
        let mut b = Block::new();
        b.call("_f", [1u16, 2, 3, 4, 5].map(Operand::from)).unwrap();
        assert_eq!(
            insts(&b),
            vec![
                "SET push, 0x5",
                "SET push, 0x4",
                "SET a, 0x1",
                "SET b, 0x2",
                "SET c, 0x3",
                "JSR _f",
                "ADD sp, 0x2",
            ]
        );
    }

    #[test]
    fn call_without_stack_args() {
        let mut b = Block::new();
        b.call("_f", [Operand::from(B), Operand::from(A)]).unwrap();
        let listing = insts(&b);
        assert_eq!(listing.len(), 4);
        assert_eq!(listing[0], "SET o, a");
        assert_eq!(listing[3], "JSR _f");
    }

    #[test]
    fn fun_frame() {
        let mut b = Block::new();
        b.fun(4, |b, args| {
            assert_eq!(args[0], Operand::Register(A));
            assert_eq!(args[3].to_string(), "[j+2]");
            b.add(args[0].clone(), args[3].clone());
            Ok(())
        })
        .unwrap();
        assert_eq!(
            insts(&b),
            vec![
                "SET push, j",
                "SET j, sp",
                "ADD a, [j+2]",
                "SET sp, j",
                "SET j, pop",
                "SET pc, pop",
            ]
        );
    }

    #[test]
    fn nested_locals() {
        let mut b = Block::new();
        b.locals(2, |b, outer| {
            assert_eq!(outer[0].to_string(), "[j-1]");
            assert_eq!(outer[1].to_string(), "[j-2]");
            b.locals(1, |_, inner| {
                assert_eq!(inner[0].to_string(), "[j-3]");
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(b.stack_usage, 0);
        assert_eq!(
            b.items()[0],
            crate::block::Item::Inst(Instruction::Basic(
                BasicOp::SUB,
                Operand::Register(SP),
                Operand::Literal(2)
            ))
        );
    }
}
