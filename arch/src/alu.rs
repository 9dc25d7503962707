use crate::op::BasicOp;

/// Effect of a basic operation on its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alu {
    /// Store `value` into `a`; update O when `overflow` is set.
    Write { value: u16, overflow: Option<u16> },
    /// Conditional; the next instruction is skipped when false.
    Test(bool),
}

macro_rules! store {
    ($value:expr) => {
        Alu::Write {
            value: $value as u16,
            overflow: None,
        }
    };
    ($value:expr, $o:expr) => {
        Alu::Write {
            value: $value as u16,
            overflow: Some($o as u16),
        }
    };
}

pub fn alu(op: BasicOp, a: u16, b: u16) -> Alu {
    use BasicOp::*;
    let (wa, wb) = (a as u64, b as u64);
    match op {
        SET => store!(b),
        ADD => {
            let res = wa + wb;
            store!(res, if res > 0xFFFF { 1 } else { 0 })
        }
        SUB => store!(a.wrapping_sub(b), if a < b { 0xFFFF } else { 0 }),
        MUL => {
            let res = wa * wb;
            store!(res, res >> 16)
        }
        DIV => match b {
            0 => store!(0, 0),
            _ => store!(a / b, (wa << 16) / wb),
        },
        MOD => match b {
            0 => store!(0),
            _ => store!(a % b),
        },
        SHL => {
            let res = wa.checked_shl(b as u32).unwrap_or(0);
            store!(res, res >> 16)
        }
        SHR => store!(
            wa.checked_shr(b as u32).unwrap_or(0),
            (wa << 16).checked_shr(b as u32).unwrap_or(0)
        ),
        AND => store!(a & b),
        BOR => store!(a | b),
        XOR => store!(a ^ b),
        IFE => Alu::Test(a == b),
        IFN => Alu::Test(a != b),
        IFG => Alu::Test(a > b),
        IFB => Alu::Test(a & b != 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BasicOp::*;

    fn w(value: u16, overflow: Option<u16>) -> Alu {
        Alu::Write { value, overflow }
    }

    macro_rules! test_alu {
        ($($name:ident: $op:ident($a:expr, $b:expr) => $expect:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(alu($op, $a, $b), $expect);
                }
            )*
        }
    }

    test_alu! {
        set: SET(1, 2) => w(2, None),
        add_carry: ADD(0x5678, 0xCCDD) => w(0x2355, Some(1)),
        add_no_carry: ADD(1, 2) => w(3, Some(0)),
        sub_borrow: SUB(0x5678, 0xCCDD) => w(0x899B, Some(0xFFFF)),
        sub_no_borrow: SUB(5, 3) => w(2, Some(0)),
        mul_high: MUL(0x5678, 3) => w(0x0368, Some(1)),
        mul_small: MUL(3, 4) => w(12, Some(0)),
        div: DIV(15, 4) => w(3, Some(0xC000)),
        div_zero: DIV(15, 0) => w(0, Some(0)),
        modulo: MOD(15, 4) => w(3, None),
        mod_zero: MOD(15, 0) => w(0, None),
        shl: SHL(0xFFFF, 4) => w(0xFFF0, Some(0xF)),
        shl_small: SHL(1, 1) => w(2, Some(0)),
        shl_far: SHL(0xFFFF, 0xFFFF) => w(0, Some(0)),
        shr: SHR(0xFF, 4) => w(0xF, Some(0xF000)),
        shr_exact: SHR(0xF0, 4) => w(0xF, Some(0)),
        shr_far: SHR(0xFFFF, 40) => w(0, Some(0)),
        and: AND(5, 4) => w(4, None),
        bor: BOR(5, 4) => w(5, None),
        xor: XOR(5, 4) => w(1, None),
        ife: IFE(5, 5) => Alu::Test(true),
        ifn: IFN(5, 5) => Alu::Test(false),
        ifg: IFG(5, 6) => Alu::Test(false),
        ifb: IFB(5, 2) => Alu::Test(false),
    }
}
