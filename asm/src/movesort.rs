use std::collections::VecDeque;

use arch::{operand::Operand, reg::Reg};
use thiserror::Error;

use crate::error::Error;

/// Registers that carry the first three arguments of a call.
pub const ARG_REGS: [Reg; 3] = [Reg::A, Reg::B, Reg::C];

/// Scratch register used to break a cycle of moves.
pub const SPILL_REG: Reg = Reg::O;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub src: Operand,
    pub dst: Reg,
    pub spill: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cycle between {} moves", .cycle.len())]
pub struct CycleDetected {
    /// Moves on the cycle, each one reading what the next one overwrites.
    pub cycle: Vec<Move>,
}

/// `before` has to execute ahead of `after`.
fn precedes(before: &Move, after: &Move) -> bool {
    if before.spill {
        // the spilled value is read back from the scratch register
        after.src.reads(before.dst) || before.src.reads(after.dst)
    } else if after.spill {
        false
    } else {
        // `after` clobbers what `before` still needs
        before.src.reads(after.dst)
    }
}

/// Order `moves` so that no move overwrites a register before every other
/// move has read it.
pub fn topological_order(moves: &[Move]) -> Result<Vec<Move>, CycleDetected> {
    let n = moves.len();
    let mut succ: Vec<Vec<usize>> = vec![vec![]; n];
    let mut pred: Vec<Vec<usize>> = vec![vec![]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j && precedes(&moves[i], &moves[j]) {
                succ[i].push(j);
                pred[j].push(i);
            }
        }
    }

    let mut indegree: Vec<usize> = pred.iter().map(|p| p.len()).collect();
    let mut ready: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut done = vec![false; n];
    let mut order = vec![];
    while let Some(i) = ready.pop_front() {
        done[i] = true;
        order.push(moves[i].clone());
        for &j in &succ[i] {
            indegree[j] -= 1;
            if indegree[j] == 0 {
                ready.push_back(j);
            }
        }
    }

    if order.len() == n {
        return Ok(order);
    }

    // Every node left has a pending predecessor; walking predecessors from
    // any of them has to come back around.
    let mut path: Vec<usize> = vec![];
    let mut node = (0..n).find(|&i| !done[i]).unwrap_or(0);
    while !path.contains(&node) {
        path.push(node);
        node = pred[node].iter().copied().find(|&p| !done[p]).unwrap_or(node);
    }
    let start = path.iter().position(|&p| p == node).unwrap_or(0);
    let mut cycle: Vec<Move> = path[start..].iter().map(|&i| moves[i].clone()).collect();
    cycle.reverse();
    Err(CycleDetected { cycle })
}

/// Schedules the parallel assignment of call arguments to [`ARG_REGS`].
#[derive(Debug, Clone)]
pub struct MoveSorter {
    moves: Vec<Move>,
}

impl MoveSorter {
    pub fn new(args: Vec<Operand>) -> Result<Self, Error> {
        if args.len() > ARG_REGS.len() {
            return Err(Error::TooManyArguments(args.len()));
        }
        let moves = args
            .into_iter()
            .zip(ARG_REGS)
            .filter(|(src, dst)| *src != Operand::Register(*dst))
            .map(|(src, dst)| Move {
                src,
                dst,
                spill: false,
            })
            .collect();
        Ok(MoveSorter { moves })
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Copy `src` to the scratch register and make every move reading `src`
    /// read the copy instead.
    fn spill(&mut self, src: Operand) -> Result<(), Error> {
        if self.moves.iter().any(|m| m.src.reads(SPILL_REG)) {
            return Err(Error::SchedulerInvariant(format!(
                "scratch register `{}` is an argument",
                SPILL_REG
            )));
        }
        for m in self.moves.iter_mut() {
            if m.src == src {
                m.src = Operand::Register(SPILL_REG);
            }
        }
        self.moves.push(Move {
            src,
            dst: SPILL_REG,
            spill: true,
        });
        Ok(())
    }

    /// Moves in execution order.
    pub fn sort(mut self) -> Result<Vec<Move>, Error> {
        match topological_order(&self.moves) {
            Ok(order) => Ok(order),
            Err(CycleDetected { cycle }) => {
                self.spill(cycle[0].src.clone())?;
                topological_order(&self.moves)
                    .map_err(|err| Error::SchedulerInvariant(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use Reg::*;

    /// Run the moves against a register file where every register holds its
    /// own name.
    fn simulate(moves: &[Move]) -> HashMap<Reg, Reg> {
        let mut regs: HashMap<Reg, Reg> = [A, B, C, X, Y, Z, I, J, O]
            .into_iter()
            .map(|r| (r, r))
            .collect();
        for m in moves {
            let value = match &m.src {
                Operand::Register(r) => regs[r],
                other => panic!("unexpected source {}", other),
            };
            regs.insert(m.dst, value);
        }
        regs
    }

    fn sort(args: Vec<Reg>) -> Vec<Move> {
        MoveSorter::new(args.into_iter().map(Operand::Register).collect())
            .unwrap()
            .sort()
            .unwrap()
    }

    #[test]
    fn identity_moves_are_dropped() {
        assert!(sort(vec![A, B, C]).is_empty());
        assert_eq!(sort(vec![A, X]).len(), 1);
    }

    #[test]
    fn chain_without_cycle() {
        // A <- B, B <- C, C <- X
        let moves = sort(vec![B, C, X]);
        assert_eq!(moves.len(), 3);
        assert!(moves.iter().all(|m| !m.spill));
        let regs = simulate(&moves);
        assert_eq!((regs[&A], regs[&B], regs[&C]), (B, C, X));
    }

    #[test]
    fn rotation_uses_one_spill() {
        let moves = sort(vec![B, C, A]);
        assert_eq!(moves.len(), 4);
        assert_eq!(moves.iter().filter(|m| m.spill).count(), 1);
        let regs = simulate(&moves);
        assert_eq!((regs[&A], regs[&B], regs[&C]), (B, C, A));
    }

    #[test]
    fn every_permutation() {
        let perms = [
            [A, B, C],
            [A, C, B],
            [B, A, C],
            [B, C, A],
            [C, A, B],
            [C, B, A],
        ];
        for perm in perms {
            let regs = simulate(&sort(perm.to_vec()));
            assert_eq!((regs[&A], regs[&B], regs[&C]), (perm[0], perm[1], perm[2]));
        }
    }

    #[test]
    fn swap_is_broken() {
        let moves = sort(vec![B, A]);
        assert_eq!(moves.len(), 3);
        assert!(moves[0].spill);
        let regs = simulate(&moves);
        assert_eq!((regs[&A], regs[&B]), (B, A));
    }

    #[test]
    fn cycle_is_reported() {
        let moves = vec![
            Move { src: B.into(), dst: A, spill: false },
            Move { src: A.into(), dst: B, spill: false },
            Move { src: A.into(), dst: C, spill: false },
        ];
        let err = topological_order(&moves).unwrap_err();
        assert_eq!(err.cycle.len(), 2);
        assert!(err.cycle.iter().all(|m| m.dst != C));
    }

    #[test]
    fn too_many_arguments() {
        let args = vec![Operand::Literal(1); 4];
        assert!(matches!(MoveSorter::new(args), Err(Error::TooManyArguments(4))));
    }

    #[test]
    fn busy_scratch_register() {
        let args = vec![B.into(), A.into(), O.into()];
        let sorter = MoveSorter::new(args).unwrap();
        assert!(matches!(sorter.sort(), Err(Error::SchedulerInvariant(_))));
    }
}
