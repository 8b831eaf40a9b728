//! Word-level expressions over bit-vector circuits.
//!
//! A [`BvExpr`] is a combinational [`AigBv`] with exactly one output word, plus a flag
//! telling whether that word is read as a two's complement integer.
//! Operators build new circuits; shared input names are merged.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::ops::{Add, BitAnd, BitOr, BitXor, Neg, Not, Range, Shl, Shr, Sub};
use std::sync::atomic::{AtomicUsize, Ordering};

use eyre::{ensure, eyre};

use crate::aig::{Aig, SymbolType};
use crate::aigbv::AigBv;
use crate::bundle::{decode_int, encode_int, wrap_int, WordValuation};
use crate::gates;

static FRESH: AtomicUsize = AtomicUsize::new(0);

fn fresh() -> String {
    format!("__fresh_{}", FRESH.fetch_add(1, Ordering::Relaxed))
}

/// What an atom reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Val {
    /// Input word with this name.
    Name(String),
    /// Constant.
    Int(i64),
    /// Input word with a fresh name.
    Fresh,
}

impl From<&str> for Val {
    fn from(name: &str) -> Self {
        Val::Name(name.to_owned())
    }
}
impl From<String> for Val {
    fn from(name: String) -> Self {
        Val::Name(name)
    }
}
impl From<i64> for Val {
    fn from(value: i64) -> Self {
        Val::Int(value)
    }
}
impl From<i32> for Val {
    fn from(value: i32) -> Self {
        Val::Int(value.into())
    }
}

/// Right-hand side of a binary operator.
#[derive(Debug, Clone)]
pub enum Operand {
    Expr(BvExpr),
    Int(i64),
}

impl From<BvExpr> for Operand {
    fn from(expr: BvExpr) -> Self {
        Operand::Expr(expr)
    }
}
impl From<&BvExpr> for Operand {
    fn from(expr: &BvExpr) -> Self {
        Operand::Expr(expr.clone())
    }
}
impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Int(value)
    }
}
impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Int(value.into())
    }
}

type UnaryGate = fn(usize, &str, &str) -> AigBv;
type BinaryGate = fn(usize, &str, &str, &str) -> AigBv;
type SameCircuit = Option<fn(&BvExpr) -> BvExpr>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BvExpr {
    aigbv: AigBv,
    signed: bool,
}

/// Atom of `wordlen` bits.
///
/// # Panics
///
/// Panics if an integer `val` does not fit into `wordlen` bits.
pub fn atom(wordlen: usize, val: impl Into<Val>, signed: bool) -> BvExpr {
    let output = fresh();
    let aigbv = match val.into() {
        Val::Name(name) => gates::identity_gate(wordlen, &name, &output),
        Val::Fresh => gates::identity_gate(wordlen, &fresh(), &output),
        Val::Int(value) => match encode_int(wordlen, value, signed) {
            Ok(bits) => gates::source_bits(&output, &bits),
            Err(e) => panic!("{}", e),
        },
    };
    BvExpr { aigbv, signed }
}

pub fn uatom(wordlen: usize, val: impl Into<Val>) -> BvExpr {
    atom(wordlen, val, false)
}

pub fn satom(wordlen: usize, val: impl Into<Val>) -> BvExpr {
    atom(wordlen, val, true)
}

/// `test ? then : other`, bitwise. `test` must be a single bit.
pub fn ite(test: &BvExpr, then: &BvExpr, other: &BvExpr) -> BvExpr {
    assert_eq!(test.size(), 1, "Condition of ite must be a single bit");
    assert_eq!(then.size(), other.size(), "Branches of ite differ in size");
    let (circ, outputs) = BvExpr::combine(&[test, then, other]);
    let mux = gates::mux_gate(then.size(), &outputs[0], &outputs[1], &outputs[2], &fresh());
    BvExpr {
        aigbv: circ.seq_unchecked(&mux),
        signed: then.signed,
    }
}

impl BvExpr {
    /// Wraps a circuit with one output word and no latches.
    pub fn from_aigbv(aigbv: AigBv, signed: bool) -> eyre::Result<Self> {
        ensure!(
            aigbv.omap().len() == 1,
            "Expression needs exactly one output word, got {}",
            aigbv.omap().len()
        );
        ensure!(aigbv.lmap().is_empty(), "Expression can not contain latches");
        Ok(Self { aigbv, signed })
    }

    pub fn aigbv(&self) -> &AigBv {
        &self.aigbv
    }
    pub fn aig(&self) -> &Aig {
        self.aigbv.aig()
    }
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn output(&self) -> &str {
        self.aigbv.outputs().next().unwrap_or("")
    }

    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.aigbv.inputs()
    }

    pub fn size(&self) -> usize {
        self.aigbv.omap().size(self.output()).unwrap_or(0)
    }

    /// Renames the output word.
    pub fn with_output(&self, name: &str) -> BvExpr {
        let mapping: HashMap<String, String> = [(self.output().to_owned(), name.to_owned())]
            .into_iter()
            .collect();
        BvExpr {
            aigbv: self
                .aigbv
                .relabel_unchecked(SymbolType::Output, &mapping),
            signed: self.signed,
        }
    }

    pub fn eval(&self, inputs: &WordValuation) -> eyre::Result<Vec<bool>> {
        let (mut outputs, _) = self.aigbv.eval(inputs, None)?;
        outputs
            .remove(self.output())
            .ok_or_else(|| eyre!("Missing output '{}'", self.output()))
    }

    /// Evaluates on integer inputs; each value is wrapped to the size of its word.
    pub fn eval_int<'a>(
        &self,
        inputs: impl IntoIterator<Item = (&'a str, i64)>,
    ) -> eyre::Result<i64> {
        let mut values = WordValuation::new();
        for (name, value) in inputs {
            let size = self
                .aigbv
                .imap()
                .size(name)
                .ok_or_else(|| eyre!("Unknown input '{}'", name))?;
            values.insert(name.to_owned(), wrap_int(size, value));
        }
        Ok(decode_int(&self.eval(&values)?, self.signed))
    }
}

impl BvExpr {
    fn with_aigbv(&self, aigbv: AigBv) -> BvExpr {
        BvExpr {
            aigbv,
            signed: self.signed,
        }
    }

    fn unsigned(aigbv: AigBv) -> BvExpr {
        BvExpr {
            aigbv,
            signed: false,
        }
    }

    /// Constant word that keeps the inputs of `self`.
    fn constant_like(&self, size: usize, value: i64) -> AigBv {
        gates::source_bits(&fresh(), &wrap_int(size, value))
            .par_unchecked(&gates::sink(self.aigbv.imap()))
    }

    /// Puts expressions side by side, renaming outputs that clash.
    /// Returns the joint circuit and the output of each expression.
    fn combine(exprs: &[&BvExpr]) -> (AigBv, Vec<String>) {
        let mut circ = AigBv::default();
        let mut outputs: Vec<String> = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let renamed;
            let expr = if outputs.iter().any(|o| o == expr.output()) {
                renamed = expr.with_output(&fresh());
                &renamed
            } else {
                *expr
            };
            assert!(
                circ.imap().agrees_with(expr.aigbv.imap()),
                "Shared inputs differ in size"
            );
            outputs.push(expr.output().to_owned());
            circ = circ.par_unchecked(&expr.aigbv);
        }
        (circ, outputs)
    }

    fn operand(&self, other: Operand) -> BvExpr {
        match other {
            Operand::Expr(expr) => expr,
            Operand::Int(value) => BvExpr {
                aigbv: gates::source_bits(&fresh(), &wrap_int(self.size(), value)),
                signed: self.signed,
            },
        }
    }

    fn unary(&self, gate: UnaryGate) -> AigBv {
        let gate = gate(self.size(), self.output(), &fresh());
        self.aigbv.seq_unchecked(&gate)
    }

    fn binary(&self, other: Operand, gate: BinaryGate, same_circuit: SameCircuit) -> AigBv {
        let other = self.operand(other);
        assert_eq!(self.size(), other.size(), "Operands differ in size");
        if let Some(shortcut) = same_circuit {
            if self.aigbv == other.aigbv {
                log::trace!("Same circuit on both sides of {}", self.output());
                return shortcut(self).aigbv;
            }
        }
        let (circ, outputs) = Self::combine(&[self, &other]);
        let gate = gate(self.size(), &outputs[0], &outputs[1], &fresh());
        circ.seq_unchecked(&gate)
    }
}

impl BvExpr {
    pub fn bit(&self, index: usize) -> BvExpr {
        self.slice(index..index + 1)
    }

    /// Bits `range` of the word, as an unsigned expression.
    ///
    /// # Panics
    ///
    /// Panics if the range is empty or exceeds the word.
    pub fn slice(&self, range: Range<usize>) -> BvExpr {
        let size = self.size();
        let gate = gates::slice_gate(size, range, self.output(), &fresh());
        Self::unsigned(self.aigbv.seq_unchecked(&gate))
    }

    /// Concatenation: `self` goes to the low bits.
    pub fn concat(&self, other: &BvExpr) -> BvExpr {
        let (circ, outputs) = Self::combine(&[self, other]);
        let gate = gates::combine_gate(
            self.size(),
            &outputs[0],
            other.size(),
            &outputs[1],
            &fresh(),
        );
        self.with_aigbv(circ.seq_unchecked(&gate))
    }

    /// `times` copies of the word, concatenated.
    pub fn repeat(&self, times: usize) -> BvExpr {
        assert!(times > 0, "Can not repeat a word zero times");
        if self.size() == 1 {
            let gate = gates::repeat(times, self.output(), &fresh());
            return self.with_aigbv(self.aigbv.seq_unchecked(&gate));
        }
        let mut acc = self.clone();
        for _ in 1..times {
            acc = acc.concat(self);
        }
        acc
    }

    /// Inner product over GF(2).
    pub fn dot(&self, other: impl Into<Operand>) -> BvExpr {
        Self::unsigned(self.binary(
            other.into(),
            gates::dot_mod2_gate,
            Some(|e| Self::unsigned(e.unary(gates::parity_gate))),
        ))
    }

    pub fn ne(&self, other: impl Into<Operand>) -> BvExpr {
        Self::unsigned(self.binary(
            other.into(),
            gates::ne_gate,
            Some(|e| Self::unsigned(e.constant_like(1, 0))),
        ))
    }

    pub fn eq(&self, other: impl Into<Operand>) -> BvExpr {
        !self.ne(other)
    }

    pub fn le(&self, other: impl Into<Operand>) -> BvExpr {
        let gate: BinaryGate = if self.signed {
            gates::signed_le_gate
        } else {
            gates::unsigned_le_gate
        };
        Self::unsigned(self.binary(
            other.into(),
            gate,
            Some(|e| Self::unsigned(e.constant_like(1, 1))),
        ))
    }

    pub fn ge(&self, other: impl Into<Operand>) -> BvExpr {
        let gate: BinaryGate = if self.signed {
            gates::signed_ge_gate
        } else {
            gates::unsigned_ge_gate
        };
        Self::unsigned(self.binary(
            other.into(),
            gate,
            Some(|e| Self::unsigned(e.constant_like(1, 1))),
        ))
    }

    pub fn lt(&self, other: impl Into<Operand>) -> BvExpr {
        !self.ge(other)
    }

    pub fn gt(&self, other: impl Into<Operand>) -> BvExpr {
        !self.le(other)
    }

    /// Absolute value; the identity for unsigned expressions.
    pub fn abs(&self) -> BvExpr {
        if self.signed {
            self.with_aigbv(self.unary(gates::abs_gate))
        } else {
            self.clone()
        }
    }
}

impl Not for &BvExpr {
    type Output = BvExpr;

    fn not(self) -> BvExpr {
        self.with_aigbv(self.unary(gates::bitwise_negate))
    }
}

/// Two's complement negation.
impl Neg for &BvExpr {
    type Output = BvExpr;

    fn neg(self) -> BvExpr {
        self.with_aigbv(self.unary(gates::negate_gate))
    }
}

impl Shl<usize> for &BvExpr {
    type Output = BvExpr;

    fn shl(self, shift: usize) -> BvExpr {
        let gate = gates::left_shift_gate(self.size(), shift, self.output(), &fresh());
        self.with_aigbv(self.aigbv.seq_unchecked(&gate))
    }
}

/// Arithmetic shift for signed expressions, logical otherwise.
impl Shr<usize> for &BvExpr {
    type Output = BvExpr;

    fn shr(self, shift: usize) -> BvExpr {
        let gate = if self.signed {
            gates::arithmetic_right_shift_gate(self.size(), shift, self.output(), &fresh())
        } else {
            gates::logical_right_shift_gate(self.size(), shift, self.output(), &fresh())
        };
        self.with_aigbv(self.aigbv.seq_unchecked(&gate))
    }
}

macro_rules! forward_unary {
    ($Trait:ident, $method:ident) => {
        impl $Trait for BvExpr {
            type Output = BvExpr;

            fn $method(self) -> BvExpr {
                (&self).$method()
            }
        }
    };
}

forward_unary!(Not, not);
forward_unary!(Neg, neg);

impl Shl<usize> for BvExpr {
    type Output = BvExpr;

    fn shl(self, shift: usize) -> BvExpr {
        &self << shift
    }
}

impl Shr<usize> for BvExpr {
    type Output = BvExpr;

    fn shr(self, shift: usize) -> BvExpr {
        &self >> shift
    }
}

macro_rules! binary_op {
    ($Trait:ident, $method:ident, $gate:expr, $same:expr) => {
        impl<T: Into<Operand>> $Trait<T> for &BvExpr {
            type Output = BvExpr;

            fn $method(self, other: T) -> BvExpr {
                self.with_aigbv(self.binary(other.into(), $gate, $same))
            }
        }

        impl<T: Into<Operand>> $Trait<T> for BvExpr {
            type Output = BvExpr;

            fn $method(self, other: T) -> BvExpr {
                (&self).$method(other)
            }
        }
    };
}

binary_op!(Add, add, |w, l, r, o| gates::add_gate(w, l, r, o, false), None);
binary_op!(
    Sub,
    sub,
    |w, l, r, o| gates::subtract_gate(w, l, r, o, false),
    Some(|e| e.with_aigbv(e.constant_like(e.size(), 0)))
);
binary_op!(BitAnd, bitand, gates::bitwise_and, Some(|e| e.clone()));
binary_op!(BitOr, bitor, gates::bitwise_or, Some(|e| e.clone()));
binary_op!(
    BitXor,
    bitxor,
    gates::bitwise_xor,
    Some(|e| e.with_aigbv(e.constant_like(e.size(), 0)))
);

impl Display for BvExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BvExpr({}, size={}, signed={})",
            self.output(),
            self.size(),
            self.signed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval2(expr: &BvExpr, x: i64, y: i64) -> i64 {
        expr.eval_int([("x", x), ("y", y)]).unwrap()
    }

    #[test]
    fn test_atoms() {
        let x = uatom(4, "x");
        assert_eq!(x.size(), 4);
        assert!(!x.is_signed());
        assert_eq!(x.inputs().collect::<Vec<_>>(), vec!["x"]);
        assert_eq!(x.eval_int([("x", 11)]).unwrap(), 11);

        let c = satom(4, -3);
        assert_eq!(c.inputs().count(), 0);
        assert_eq!(c.eval_int([]).unwrap(), -3);

        let f = atom(2, Val::Fresh, false);
        assert_eq!(f.inputs().count(), 1);
        assert_ne!(f.inputs().next(), Some(f.output()));
    }

    #[test]
    #[should_panic]
    fn test_atom_out_of_range() {
        uatom(3, 8);
    }

    #[test]
    fn test_arithmetic() {
        let x = satom(4, "x");
        let y = satom(4, "y");
        let sum = &x + &y;
        let diff = &x - &y;
        let neg = -&x;
        for a in -8..8 {
            for b in -8..8 {
                let wrap = |v: i64| (v + 8).rem_euclid(16) - 8;
                assert_eq!(eval2(&sum, a, b), wrap(a + b));
                assert_eq!(eval2(&diff, a, b), wrap(a - b));
            }
            assert_eq!(neg.eval_int([("x", a)]).unwrap(), (-a + 8).rem_euclid(16) - 8);
        }
    }

    #[test]
    fn test_integer_operands_are_wrapped() {
        let x = uatom(4, "x");
        let e = &x + 17;
        assert_eq!(e.eval_int([("x", 3)]).unwrap(), 4);
        let e = x & -1;
        assert_eq!(e.eval_int([("x", 9)]).unwrap(), 9);
    }

    #[test]
    fn test_comparisons_respect_signedness() {
        let ux = uatom(3, "x");
        let sx = satom(3, "x");
        // 0b111 is 7 unsigned and -1 signed.
        assert_eq!(ux.lt(1).eval_int([("x", 7)]).unwrap(), 0);
        assert_eq!(sx.lt(1).eval_int([("x", 7)]).unwrap(), 1);
        assert!(!sx.lt(1).is_signed());

        let x = uatom(3, "x");
        let y = uatom(3, "y");
        for a in 0..8 {
            for b in 0..8 {
                assert_eq!(eval2(&x.eq(&y), a, b) == 1, a == b);
                assert_eq!(eval2(&x.ne(&y), a, b) == 1, a != b);
                assert_eq!(eval2(&x.le(&y), a, b) == 1, a <= b);
                assert_eq!(eval2(&x.gt(&y), a, b) == 1, a > b);
            }
        }
    }

    #[test]
    fn test_same_circuit_shortcuts() {
        let x = uatom(4, "x");
        for e in [&x & &x, &x | &x] {
            assert_eq!(e, x);
        }
        for e in [&x ^ &x, &x - &x] {
            assert_eq!(e.inputs().collect::<Vec<_>>(), vec!["x"]);
            assert_eq!(e.eval_int([("x", 5)]).unwrap(), 0);
            assert_eq!(e.aig().num_gates(), 0);
        }
        assert_eq!(x.ne(&x).eval_int([("x", 5)]).unwrap(), 0);
        assert_eq!(x.eq(&x).eval_int([("x", 5)]).unwrap(), 1);
        assert_eq!(x.le(&x).eval_int([("x", 5)]).unwrap(), 1);
        assert_eq!(x.gt(&x).eval_int([("x", 5)]).unwrap(), 0);
        assert_eq!(x.dot(&x).eval_int([("x", 0b0111)]).unwrap(), 1);

        let double = &x + &x;
        assert_eq!(double.eval_int([("x", 5)]).unwrap(), 10);
    }

    #[test]
    fn test_shared_inputs() {
        let x = uatom(4, "x");
        let y = uatom(4, "y");
        let e = (&x + &y) & &x;
        assert_eq!(e.inputs().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(eval2(&e, 6, 3), (6 + 3) & 6);
    }

    #[test]
    #[should_panic(expected = "Operands differ in size")]
    fn test_size_mismatch() {
        let _ = uatom(4, "x") + uatom(3, "y");
    }

    #[test]
    fn test_bits_and_slices() {
        let x = uatom(6, "x");
        assert_eq!(x.bit(0).eval_int([("x", 0b000101)]).unwrap(), 1);
        assert_eq!(x.bit(1).eval_int([("x", 0b000101)]).unwrap(), 0);
        let s = x.slice(2..5);
        assert_eq!(s.size(), 3);
        assert_eq!(s.eval_int([("x", 0b110100)]).unwrap(), 0b101);
    }

    #[test]
    #[should_panic(expected = "Invalid slice")]
    fn test_empty_slice() {
        uatom(4, "x").slice(2..2);
    }

    #[test]
    fn test_concat_and_repeat() {
        let x = uatom(2, "x");
        let y = uatom(3, "y");
        let xy = x.concat(&y);
        assert_eq!(xy.size(), 5);
        assert_eq!(eval2(&xy, 0b10, 0b011), 0b01110);

        let r = x.repeat(3);
        assert_eq!(r.size(), 6);
        assert_eq!(r.eval_int([("x", 0b01)]).unwrap(), 0b010101);

        let b = uatom(1, "b").repeat(4);
        assert_eq!(b.eval_int([("b", 1)]).unwrap(), 0b1111);
    }

    #[test]
    fn test_shifts_and_unary() {
        let u = uatom(4, "x");
        let s = satom(4, "x");
        assert_eq!((&u << 1).eval_int([("x", 0b0110)]).unwrap(), 0b1100);
        assert_eq!((&u >> 1).eval_int([("x", 0b1000)]).unwrap(), 0b0100);
        assert_eq!((&s >> 1).eval_int([("x", -8)]).unwrap(), -4);
        assert_eq!((!&u).eval_int([("x", 0b0110)]).unwrap(), 0b1001);
        assert_eq!(s.abs().eval_int([("x", -5)]).unwrap(), 5);
        assert_eq!(u.abs(), u);
    }

    #[test]
    fn test_ite() {
        let t = uatom(1, "t");
        let x = uatom(3, "x");
        let y = uatom(3, "y");
        let e = ite(&t, &x, &y);
        assert_eq!(e.eval_int([("t", 1), ("x", 5), ("y", 2)]).unwrap(), 5);
        assert_eq!(e.eval_int([("t", 0), ("x", 5), ("y", 2)]).unwrap(), 2);

        let same = ite(&t, &x, &x);
        assert_eq!(same.eval_int([("t", 0), ("x", 6)]).unwrap(), 6);
    }

    #[test]
    fn test_from_aigbv_and_with_output() {
        let e = uatom(2, "x").with_output("out");
        assert_eq!(e.output(), "out");
        let back = BvExpr::from_aigbv(e.aigbv().clone(), false).unwrap();
        assert_eq!(back, e);

        let two = gates::tee(2, "x", &["a", "b"]);
        assert!(BvExpr::from_aigbv(two, false).is_err());
    }
}
