use mm_isa::ArithOp;
use mm_word::{Flags, Word};

use crate::error::Error;

/// Apply `op` to `lhs` and `rhs`, returning the result word and the flags it
/// sets. Pure function: no memory, no registers, no side effects, so the
/// control unit can call it identically regardless of which machine's operand
/// convention supplied `lhs`/`rhs`.
pub fn eval(op: ArithOp, lhs: Word, rhs: Word) -> Result<(Word, Flags), Error> {
    let (result, flags) = match op {
        ArithOp::Add => lhs.add(rhs),
        ArithOp::Sub => lhs.sub(rhs),
        ArithOp::Mul => lhs.smul(rhs),
        ArithOp::Div => {
            let (q, _) = lhs.divmod_signed(rhs)?;
            let (_, flags) = q.add(Word::zero(q.width()));
            (q, flags)
        }
        ArithOp::Mod => {
            let (_, r) = lhs.divmod_signed(rhs)?;
            let (_, flags) = r.add(Word::zero(r.width()));
            (r, flags)
        }
    };
    Ok((result, flags))
}

/// Compare `lhs` against `rhs` without producing a result word, the way a
/// `cmp` opcode does: only the flags matter to the caller.
pub fn compare(lhs: Word, rhs: Word) -> Flags {
    lhs.compare_flags(rhs)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn add_sets_zero_flag_on_zero_result() {
        let a = Word::from_signed(16, 5);
        let b = Word::from_signed(16, -5);
        let (result, flags) = eval(ArithOp::Add, a, b).unwrap();
        assert_eq!(result, Word::zero(16));
        assert!(flags.zero);
    }

    #[test]
    fn div_by_zero_is_rejected() {
        let a = Word::from_signed(16, 10);
        let b = Word::zero(16);
        assert!(eval(ArithOp::Div, a, b).is_err());
    }

    #[test]
    fn mod_matches_divmod_remainder() {
        let a = Word::from_signed(16, 7);
        let b = Word::from_signed(16, 2);
        let (r, _) = eval(ArithOp::Mod, a, b).unwrap();
        assert_eq!(r, Word::from_signed(16, 1));
    }
}
