//! Word-level gates lowered to AND gates.
//!
//! Each constructor returns an [`AigBv`] whose ports are named by the arguments.
//! Words are little-endian: bit `0` is the least significant one.

use std::ops::Range;

use crate::aig::Aig;
use crate::aigbv::AigBv;
use crate::bundle::{bit_name, encode_int, BundleMap};
use crate::reference::Ref;

struct GateBuilder {
    aig: Aig,
    imap: BundleMap,
    omap: BundleMap,
}

impl GateBuilder {
    fn new() -> Self {
        Self {
            aig: Aig::new(),
            imap: BundleMap::new(),
            omap: BundleMap::new(),
        }
    }

    fn input(&mut self, name: &str, wordlen: usize) -> Vec<Ref> {
        if let Some(old) = self.imap.insert(name, wordlen) {
            assert_eq!(
                old, wordlen,
                "Input word '{}' is used with sizes {} and {}",
                name, old, wordlen
            );
        }
        (0..wordlen)
            .map(|i| self.aig.add_input(bit_name(name, i)))
            .collect()
    }

    fn output(&mut self, name: &str, bits: &[Ref]) {
        let old = self.omap.insert(name, bits.len());
        assert!(old.is_none(), "Duplicate output word '{}'", name);
        for (i, &bit) in bits.iter().enumerate() {
            self.aig.add_output(bit_name(name, i), bit);
        }
    }

    fn finish(self) -> AigBv {
        AigBv::from_parts(self.aig, self.imap, self.omap, BundleMap::new())
    }
}

fn unary_gate(
    wordlen: usize,
    input: &str,
    output: &str,
    f: impl FnOnce(&mut Aig, &[Ref]) -> Vec<Ref>,
) -> AigBv {
    let mut builder = GateBuilder::new();
    let xs = builder.input(input, wordlen);
    let out = f(&mut builder.aig, &xs);
    builder.output(output, &out);
    builder.finish()
}

fn binary_gate(
    wordlen: usize,
    left: &str,
    right: &str,
    output: &str,
    f: impl FnOnce(&mut Aig, &[Ref], &[Ref]) -> Vec<Ref>,
) -> AigBv {
    let mut builder = GateBuilder::new();
    let xs = builder.input(left, wordlen);
    let ys = builder.input(right, wordlen);
    let out = f(&mut builder.aig, &xs, &ys);
    builder.output(output, &out);
    builder.finish()
}

fn full_adder(aig: &mut Aig, a: Ref, b: Ref, carry: Ref) -> (Ref, Ref) {
    let t = aig.xor(a, b);
    let sum = aig.xor(t, carry);
    let c1 = aig.and(a, b);
    let c2 = aig.and(t, carry);
    (sum, aig.or(c1, c2))
}

/// Ripple-carry addition. Returns the sum and the carry out.
fn ripple_add(aig: &mut Aig, xs: &[Ref], ys: &[Ref], carry_in: Ref) -> (Vec<Ref>, Ref) {
    let mut carry = carry_in;
    let mut sum = Vec::with_capacity(xs.len());
    for (&x, &y) in xs.iter().zip(ys) {
        let (s, c) = full_adder(aig, x, y, carry);
        sum.push(s);
        carry = c;
    }
    (sum, carry)
}

/// `xs - ys` as `xs + !ys + 1`. The carry out is set iff `xs >= ys` (unsigned).
fn ripple_sub(aig: &mut Aig, xs: &[Ref], ys: &[Ref]) -> (Vec<Ref>, Ref) {
    let inverted: Vec<Ref> = ys.iter().map(|&y| -y).collect();
    ripple_add(aig, xs, &inverted, Ref::TRUE)
}

fn negate_bits(aig: &mut Aig, xs: &[Ref]) -> Vec<Ref> {
    let zeros = vec![Ref::FALSE; xs.len()];
    ripple_sub(aig, &zeros, xs).0
}

fn unsigned_lt_bits(aig: &mut Aig, xs: &[Ref], ys: &[Ref]) -> Ref {
    -ripple_sub(aig, xs, ys).1
}

fn flip_sign(xs: &[Ref]) -> Vec<Ref> {
    let mut flipped = xs.to_vec();
    if let Some(msb) = flipped.last_mut() {
        *msb = -*msb;
    }
    flipped
}

fn signed_lt_bits(aig: &mut Aig, xs: &[Ref], ys: &[Ref]) -> Ref {
    unsigned_lt_bits(aig, &flip_sign(xs), &flip_sign(ys))
}

fn equal_bits(aig: &mut Aig, xs: &[Ref], ys: &[Ref]) -> Ref {
    let eqs: Vec<Ref> = xs.iter().zip(ys).map(|(&x, &y)| aig.xnor(x, y)).collect();
    aig.and_all(eqs)
}

pub fn identity_gate(wordlen: usize, input: &str, output: &str) -> AigBv {
    unary_gate(wordlen, input, output, |_, xs| xs.to_vec())
}

/// Constant word `value`. Fails if the value does not fit into `wordlen` bits.
pub fn source(wordlen: usize, value: i64, output: &str, signed: bool) -> eyre::Result<AigBv> {
    Ok(source_bits(output, &encode_int(wordlen, value, signed)?))
}

/// Constant word with the given bits.
pub fn source_bits(output: &str, bits: &[bool]) -> AigBv {
    let mut builder = GateBuilder::new();
    let refs: Vec<Ref> = bits.iter().map(|&b| Ref::from_bool(b)).collect();
    builder.output(output, &refs);
    builder.finish()
}

/// Consumes the given input words.
pub fn sink(inputs: &BundleMap) -> AigBv {
    let mut builder = GateBuilder::new();
    for (name, size) in inputs.iter() {
        builder.input(name, size);
    }
    builder.finish()
}

/// Copies the input word to every output.
///
/// Panics if an output name is repeated.
pub fn tee(wordlen: usize, input: &str, outputs: &[&str]) -> AigBv {
    let mut builder = GateBuilder::new();
    let xs = builder.input(input, wordlen);
    for output in outputs {
        builder.output(output, &xs);
    }
    builder.finish()
}

/// Repeats a single bit `times` times.
pub fn repeat(times: usize, input: &str, output: &str) -> AigBv {
    unary_gate(1, input, output, |_, xs| vec![xs[0]; times])
}

pub fn index_gate(wordlen: usize, index: usize, input: &str, output: &str) -> AigBv {
    slice_gate(wordlen, index..index + 1, input, output)
}

pub fn slice_gate(wordlen: usize, range: Range<usize>, input: &str, output: &str) -> AigBv {
    assert!(
        range.start < range.end && range.end <= wordlen,
        "Invalid slice {:?} of a {}-bit word",
        range,
        wordlen
    );
    unary_gate(wordlen, input, output, |_, xs| xs[range].to_vec())
}

/// Concatenation: `left` goes to the low bits, `right` to the high bits.
///
/// `left` and `right` may name the same word only if the sizes agree.
pub fn combine_gate(
    left_wordlen: usize,
    left: &str,
    right_wordlen: usize,
    right: &str,
    output: &str,
) -> AigBv {
    let mut builder = GateBuilder::new();
    let mut bits = builder.input(left, left_wordlen);
    bits.extend(builder.input(right, right_wordlen));
    builder.output(output, &bits);
    builder.finish()
}

/// Inverse of [`combine_gate`]. Panics if `left` and `right` are the same name.
pub fn split_gate(
    input: &str,
    left_wordlen: usize,
    left: &str,
    right_wordlen: usize,
    right: &str,
) -> AigBv {
    let mut builder = GateBuilder::new();
    let bits = builder.input(input, left_wordlen + right_wordlen);
    let (low, high) = bits.split_at(left_wordlen);
    builder.output(left, low);
    builder.output(right, high);
    builder.finish()
}

pub fn reverse_gate(wordlen: usize, input: &str, output: &str) -> AigBv {
    unary_gate(wordlen, input, output, |_, xs| xs.iter().rev().copied().collect())
}

pub fn bitwise_and(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        xs.iter().zip(ys).map(|(&x, &y)| aig.and(x, y)).collect()
    })
}

pub fn bitwise_or(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        xs.iter().zip(ys).map(|(&x, &y)| aig.or(x, y)).collect()
    })
}

pub fn bitwise_xor(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        xs.iter().zip(ys).map(|(&x, &y)| aig.xor(x, y)).collect()
    })
}

pub fn bitwise_negate(wordlen: usize, input: &str, output: &str) -> AigBv {
    unary_gate(wordlen, input, output, |_, xs| xs.iter().map(|&x| -x).collect())
}

/// Conjunction of all bits.
pub fn reduce_and(wordlen: usize, input: &str, output: &str) -> AigBv {
    unary_gate(wordlen, input, output, |aig, xs| vec![aig.and_all(xs.iter().copied())])
}

/// Disjunction of all bits.
pub fn reduce_or(wordlen: usize, input: &str, output: &str) -> AigBv {
    unary_gate(wordlen, input, output, |aig, xs| vec![aig.or_all(xs.iter().copied())])
}

pub fn is_nonzero_gate(wordlen: usize, input: &str, output: &str) -> AigBv {
    reduce_or(wordlen, input, output)
}

pub fn is_zero_gate(wordlen: usize, input: &str, output: &str) -> AigBv {
    unary_gate(wordlen, input, output, |aig, xs| vec![-aig.or_all(xs.iter().copied())])
}

pub fn eq_gate(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        vec![equal_bits(aig, xs, ys)]
    })
}

pub fn ne_gate(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        vec![-equal_bits(aig, xs, ys)]
    })
}

/// Modular addition. With `has_carry`, the carry out is the 1-bit output `<output>_carry`.
pub fn add_gate(wordlen: usize, left: &str, right: &str, output: &str, has_carry: bool) -> AigBv {
    let mut builder = GateBuilder::new();
    let xs = builder.input(left, wordlen);
    let ys = builder.input(right, wordlen);
    let (sum, carry) = ripple_add(&mut builder.aig, &xs, &ys, Ref::FALSE);
    builder.output(output, &sum);
    if has_carry {
        builder.output(&format!("{}_carry", output), &[carry]);
    }
    builder.finish()
}

/// Modular subtraction. With `has_carry`, the 1-bit output `<output>_carry`
/// is set iff `left >= right` (unsigned), i.e. no borrow occurred.
pub fn subtract_gate(
    wordlen: usize,
    left: &str,
    right: &str,
    output: &str,
    has_carry: bool,
) -> AigBv {
    let mut builder = GateBuilder::new();
    let xs = builder.input(left, wordlen);
    let ys = builder.input(right, wordlen);
    let (diff, carry) = ripple_sub(&mut builder.aig, &xs, &ys);
    builder.output(output, &diff);
    if has_carry {
        builder.output(&format!("{}_carry", output), &[carry]);
    }
    builder.finish()
}

/// Two's complement negation.
pub fn negate_gate(wordlen: usize, input: &str, output: &str) -> AigBv {
    unary_gate(wordlen, input, output, negate_bits)
}

pub fn inc_gate(wordlen: usize, input: &str, output: &str) -> AigBv {
    unary_gate(wordlen, input, output, |aig, xs| {
        let zeros = vec![Ref::FALSE; xs.len()];
        ripple_add(aig, xs, &zeros, Ref::TRUE).0
    })
}

pub fn dec_gate(wordlen: usize, input: &str, output: &str) -> AigBv {
    unary_gate(wordlen, input, output, |aig, xs| {
        let ones = vec![Ref::TRUE; xs.len()];
        ripple_add(aig, xs, &ones, Ref::FALSE).0
    })
}

pub fn unsigned_lt_gate(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        vec![unsigned_lt_bits(aig, xs, ys)]
    })
}

pub fn unsigned_le_gate(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        vec![-unsigned_lt_bits(aig, ys, xs)]
    })
}

pub fn unsigned_gt_gate(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        vec![unsigned_lt_bits(aig, ys, xs)]
    })
}

pub fn unsigned_ge_gate(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        vec![-unsigned_lt_bits(aig, xs, ys)]
    })
}

pub fn signed_lt_gate(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        vec![signed_lt_bits(aig, xs, ys)]
    })
}

pub fn signed_le_gate(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        vec![-signed_lt_bits(aig, ys, xs)]
    })
}

pub fn signed_gt_gate(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        vec![signed_lt_bits(aig, ys, xs)]
    })
}

pub fn signed_ge_gate(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        vec![-signed_lt_bits(aig, xs, ys)]
    })
}

/// Shift towards the most significant bit, filling with zeros.
pub fn left_shift_gate(wordlen: usize, shift: usize, input: &str, output: &str) -> AigBv {
    unary_gate(wordlen, input, output, |_, xs| {
        (0..xs.len())
            .map(|i| if i >= shift { xs[i - shift] } else { Ref::FALSE })
            .collect()
    })
}

/// Shift towards the least significant bit, filling with zeros.
pub fn logical_right_shift_gate(wordlen: usize, shift: usize, input: &str, output: &str) -> AigBv {
    unary_gate(wordlen, input, output, |_, xs| {
        (0..xs.len())
            .map(|i| xs.get(i + shift).copied().unwrap_or(Ref::FALSE))
            .collect()
    })
}

/// Shift towards the least significant bit, filling with the sign bit.
pub fn arithmetic_right_shift_gate(
    wordlen: usize,
    shift: usize,
    input: &str,
    output: &str,
) -> AigBv {
    unary_gate(wordlen, input, output, |_, xs| {
        let sign = xs.last().copied().unwrap_or(Ref::FALSE);
        (0..xs.len())
            .map(|i| xs.get(i + shift).copied().unwrap_or(sign))
            .collect()
    })
}

/// Absolute value of a signed word.
pub fn abs_gate(wordlen: usize, input: &str, output: &str) -> AigBv {
    unary_gate(wordlen, input, output, |aig, xs| {
        let Some(&sign) = xs.last() else {
            return Vec::new();
        };
        let negated = negate_bits(aig, xs);
        xs.iter()
            .zip(negated)
            .map(|(&x, n)| aig.ite(sign, n, x))
            .collect()
    })
}

/// 1 iff an odd number of bits is set.
pub fn parity_gate(wordlen: usize, input: &str, output: &str) -> AigBv {
    unary_gate(wordlen, input, output, |aig, xs| vec![aig.xor_all(xs.iter().copied())])
}

/// Inner product over GF(2).
pub fn dot_mod2_gate(wordlen: usize, left: &str, right: &str, output: &str) -> AigBv {
    binary_gate(wordlen, left, right, output, |aig, xs, ys| {
        let products: Vec<Ref> = xs.iter().zip(ys).map(|(&x, &y)| aig.and(x, y)).collect();
        vec![aig.xor_all(products)]
    })
}

/// `test ? left : right` with a 1-bit `test`.
pub fn mux_gate(wordlen: usize, test: &str, left: &str, right: &str, output: &str) -> AigBv {
    let mut builder = GateBuilder::new();
    let t = builder.input(test, 1)[0];
    let xs = builder.input(left, wordlen);
    let ys = builder.input(right, wordlen);
    let out: Vec<Ref> = xs
        .iter()
        .zip(&ys)
        .map(|(&x, &y)| builder.aig.ite(t, x, y))
        .collect();
    builder.output(output, &out);
    builder.finish()
}
