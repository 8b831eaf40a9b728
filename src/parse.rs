use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use eyre::{bail, ensure, eyre, WrapErr};
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{one_of, space1, u32 as u32_parser};
use nom::combinator::{opt, rest};
use nom::sequence::preceded;
use nom::IResult;

use crate::aig::Aig;
use crate::reference::Ref;
use crate::toposort::toposort_backward;

pub(crate) const HEADER_MAGIC: &str = "aag";

impl Aig {
    pub fn parse_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        log::debug!("Reading AIG from {}", path.display());
        let file =
            File::open(path).wrap_err_with(|| format!("Failed to open {}", path.display()))?;
        let lines = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        Self::parse_lines(lines.into_iter())
    }

    pub fn parse_str(s: &str) -> eyre::Result<Self> {
        Self::parse_lines(s.lines().map(|s| s.to_owned()))
    }

    pub fn parse_lines(mut lines: impl Iterator<Item = String>) -> eyre::Result<Self> {
        let header = parse_header(&lines.next().ok_or_else(|| eyre!("Missing header"))?)?;
        let check_range = |lit: u32, what: &str| -> eyre::Result<()> {
            ensure!(
                lit >> 1 <= header.max,
                "{} literal {} is greater than max {}",
                what,
                lit,
                header.max
            );
            Ok(())
        };

        let mut inputs = Vec::new();
        for _ in 0..header.inputs {
            let lit = parse_input(&lines.next().ok_or_else(|| eyre!("Missing input"))?)?;
            check_range(lit, "Input")?;
            inputs.push(lit);
        }

        let mut latches = Vec::new();
        for _ in 0..header.latches {
            let latch = parse_latch(&lines.next().ok_or_else(|| eyre!("Missing latch"))?)?;
            check_range(latch.lit, "Latch")?;
            check_range(latch.next, "Latch next")?;
            latches.push(latch);
        }

        let mut outputs = Vec::new();
        for _ in 0..header.outputs {
            let lit = parse_output(&lines.next().ok_or_else(|| eyre!("Missing output"))?)?;
            check_range(lit, "Output")?;
            outputs.push(lit);
        }

        let mut gates = Vec::new();
        for _ in 0..header.gates {
            let gate = parse_and_gate(&lines.next().ok_or_else(|| eyre!("Missing gate"))?)?;
            check_range(gate.lit, "Gate")?;
            check_range(gate.left, "Gate argument")?;
            check_range(gate.right, "Gate argument")?;
            gates.push(gate);
        }

        let mut symbols: HashMap<(char, usize), String> = HashMap::new();
        for line in lines {
            if line.starts_with('c') {
                break;
            }
            if line.is_empty() {
                continue;
            }
            let (kind, position, name) = parse_symbol(&line)?;
            let count = match kind {
                'i' => inputs.len(),
                'l' => latches.len(),
                _ => outputs.len(),
            };
            ensure!(
                position < count,
                "Symbol '{}' refers to missing position {}",
                line,
                position
            );
            ensure!(
                symbols.insert((kind, position), name).is_none(),
                "Duplicate symbol for {}{}",
                kind,
                position
            );
        }
        let mut symbol = |kind: char, position: usize| {
            symbols
                .remove(&(kind, position))
                .unwrap_or_else(|| format!("{}{}", kind, position))
        };

        let mut aig = Aig::new();
        // AIGER variable -> literal in the new graph
        let mut mapping: HashMap<u32, Ref> = HashMap::from([(0, Ref::FALSE)]);

        for (position, &lit) in inputs.iter().enumerate() {
            let name = symbol('i', position);
            ensure!(aig.input(&name).is_none(), "Duplicate input name '{}'", name);
            let r = aig.add_input(name);
            define(&mut mapping, lit, r)?;
        }
        let mut latch_names = Vec::with_capacity(latches.len());
        for (position, latch) in latches.iter().enumerate() {
            let name = symbol('l', position);
            ensure!(aig.latch(&name).is_none(), "Duplicate latch name '{}'", name);
            let r = aig.add_latch(name.clone(), latch.init);
            define(&mut mapping, latch.lit, r)?;
            latch_names.push(name);
        }

        // Gates may be listed in any order.
        let by_var: HashMap<u32, &RawGate> = gates.iter().map(|g| (g.lit >> 1, g)).collect();
        ensure!(by_var.len() == gates.len(), "Duplicate gate definition");
        let graph: HashMap<u32, Vec<u32>> = gates
            .iter()
            .map(|g| (g.lit >> 1, vec![g.left >> 1, g.right >> 1]))
            .collect();
        let mut sort = toposort_backward(&graph);
        for mut layer in sort.by_ref() {
            layer.sort();
            for var in layer {
                let Some(gate) = by_var.get(&var) else {
                    continue;
                };
                let left = translate(&mapping, gate.left)?;
                let right = translate(&mapping, gate.right)?;
                let r = aig.and(left, right);
                define(&mut mapping, gate.lit, r)?;
            }
        }
        ensure!(!sort.is_cyclic(), "Combinational cycle between gates");

        for (name, latch) in latch_names.iter().zip(latches.iter()) {
            aig.set_latch_next(name, translate(&mapping, latch.next)?);
        }
        for (position, &lit) in outputs.iter().enumerate() {
            let name = symbol('o', position);
            ensure!(aig.output(&name).is_none(), "Duplicate output name '{}'", name);
            aig.add_output(name, translate(&mapping, lit)?);
        }

        log::debug!("Parsed {}", aig);
        Ok(aig)
    }
}

fn define(mapping: &mut HashMap<u32, Ref>, lit: u32, r: Ref) -> eyre::Result<()> {
    ensure!(
        mapping.insert(lit >> 1, r).is_none(),
        "Duplicate definition of variable {}",
        lit >> 1
    );
    Ok(())
}

fn translate(mapping: &HashMap<u32, Ref>, lit: u32) -> eyre::Result<Ref> {
    let r = mapping
        .get(&(lit >> 1))
        .ok_or_else(|| eyre!("Undefined variable {}", lit >> 1))?;
    Ok(if lit & 1 == 1 { -*r } else { *r })
}

/// AIGER header: `'aag M I L O A'`, where `M >= I + L + A`.
struct Header {
    /// Maximum variable index.
    max: u32,
    /// Number of inputs.
    inputs: u32,
    /// Number of latches.
    latches: u32,
    /// Number of outputs.
    outputs: u32,
    /// Number of AND gates.
    gates: u32,
}

struct RawLatch {
    lit: u32,
    next: u32,
    init: bool,
}

struct RawGate {
    lit: u32,
    left: u32,
    right: u32,
}

fn parse_header(s: &str) -> eyre::Result<Header> {
    fn header(s: &str) -> IResult<&str, (u32, u32, u32, u32, u32)> {
        let (s, _) = tag(HEADER_MAGIC)(s)?;
        let (s, m) = preceded(space1, u32_parser)(s)?;
        let (s, i) = preceded(space1, u32_parser)(s)?;
        let (s, l) = preceded(space1, u32_parser)(s)?;
        let (s, o) = preceded(space1, u32_parser)(s)?;
        let (s, a) = preceded(space1, u32_parser)(s)?;
        Ok((s, (m, i, l, o, a)))
    }

    let (s, (m, i, l, o, a)) = header(s).map_err(|e| e.to_owned())?;
    ensure!(s.is_empty(), "Extra data after header: {}", s);
    ensure!(
        m as u64 >= i as u64 + l as u64 + a as u64,
        "Invalid header {:?}: M < I + L + A",
        (m, i, l, o, a)
    );
    Ok(Header {
        max: m,
        inputs: i,
        latches: l,
        outputs: o,
        gates: a,
    })
}

fn parse_input(s: &str) -> eyre::Result<u32> {
    let (s, lit) = u32_parser::<_, nom::error::Error<&str>>(s).map_err(|e| e.to_owned())?;
    ensure!(s.is_empty(), "Extra data after input: {}", s);
    ensure!(lit & 1 == 0, "Input must be even: {}", lit);
    ensure!(lit != 0, "Input cannot be the constant");
    Ok(lit)
}

fn parse_latch(s: &str) -> eyre::Result<RawLatch> {
    fn latch(s: &str) -> IResult<&str, (u32, u32, Option<u32>)> {
        let (s, lit) = u32_parser(s)?;
        let (s, next) = preceded(space1, u32_parser)(s)?;
        let (s, init) = opt(preceded(space1, u32_parser))(s)?;
        Ok((s, (lit, next, init)))
    }

    let (s, (lit, next, init)) = latch(s).map_err(|e| e.to_owned())?;
    ensure!(s.is_empty(), "Extra data after latch: {}", s);
    ensure!(lit & 1 == 0, "Latch literal must be even: {}", lit);
    ensure!(lit != 0, "Latch cannot be the constant");
    let init = match init {
        None | Some(0) => false,
        Some(1) => true,
        Some(x) if x == lit => bail!("Uninitialized latch {} is not supported", lit),
        Some(x) => bail!("Invalid latch initial value {}", x),
    };
    Ok(RawLatch { lit, next, init })
}

fn parse_output(s: &str) -> eyre::Result<u32> {
    let (s, lit) = u32_parser::<_, nom::error::Error<&str>>(s).map_err(|e| e.to_owned())?;
    ensure!(s.is_empty(), "Extra data after output: {}", s);
    Ok(lit)
}

fn parse_and_gate(s: &str) -> eyre::Result<RawGate> {
    fn and_gate(s: &str) -> IResult<&str, (u32, u32, u32)> {
        let (s, lit) = u32_parser(s)?;
        let (s, left) = preceded(space1, u32_parser)(s)?;
        let (s, right) = preceded(space1, u32_parser)(s)?;
        Ok((s, (lit, left, right)))
    }

    let (s, (lit, left, right)) = and_gate(s).map_err(|e| e.to_owned())?;
    ensure!(s.is_empty(), "Extra data after gate: {}", s);
    ensure!(lit & 1 == 0, "Gate literal must be even: {}", lit);
    ensure!(lit != 0, "Gate cannot be the constant");
    Ok(RawGate { lit, left, right })
}

/// Symbol table entry: `i<pos> <name>`, `l<pos> <name>` or `o<pos> <name>`.
fn parse_symbol(s: &str) -> eyre::Result<(char, usize, String)> {
    fn symbol(s: &str) -> IResult<&str, (char, u32, &str)> {
        let (s, kind) = one_of("ilo")(s)?;
        let (s, position) = u32_parser(s)?;
        let (s, _) = alt((tag(" "), tag("\t")))(s)?;
        let (s, name) = rest(s)?;
        Ok((s, (kind, position, name)))
    }

    let (_, (kind, position, name)) = symbol(s).map_err(|e| e.to_owned())?;
    ensure!(!name.is_empty(), "Empty symbol name: {}", s);
    Ok((kind, position as usize, name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;

    use crate::aig::Valuation;

    #[test]
    fn test_parse_header() {
        let s = "aag 7 2 0 2 3";
        let header = parse_header(s).unwrap();
        assert_eq!(header.max, 7);
        assert_eq!(header.inputs, 2);
        assert_eq!(header.latches, 0);
        assert_eq!(header.outputs, 2);
        assert_eq!(header.gates, 3);
    }

    #[test]
    fn test_parse_invalid_header_with_max_too_small() {
        let s = "aag 4 2 0 2 3"; // 4 < 2+3
        let res = parse_header(s);
        assert!(res.is_err());
    }

    #[test]
    fn test_parse_invalid_header_with_too_large_number() {
        let s = "aag 7 2 0 22222222222222 3"; // value too large for u32
        let res = parse_header(s);
        assert!(res.is_err());
    }

    #[test]
    fn test_parse_invalid_header_with_extra_tail() {
        let s = "aag 7 2 0 2 3 "; // note the extra space at the end
        let res = parse_header(s);
        assert!(res.is_err());
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("6").unwrap(), 6);
        assert!(parse_input("3").is_err());
        assert!(parse_input("0").is_err());
    }

    #[test]
    fn test_parse_latch() {
        let latch = parse_latch("2 3").unwrap();
        assert_eq!((latch.lit, latch.next, latch.init), (2, 3, false));
        let latch = parse_latch("4 6 1").unwrap();
        assert!(latch.init);
        assert!(parse_latch("4 6 4").is_err());
        assert!(parse_latch("4 6 7").is_err());
        assert!(parse_latch("5 6").is_err());
    }

    #[test]
    fn test_parse_output_negated() {
        assert_eq!(parse_output("7").unwrap(), 7);
        assert!(parse_output("7 1").is_err());
    }

    #[test]
    fn test_parse_and_gate() {
        let gate = parse_and_gate("8 3 4").unwrap();
        assert_eq!((gate.lit, gate.left, gate.right), (8, 3, 4));
        assert!(parse_and_gate("9 3 4").is_err());
    }

    #[test]
    fn test_parse_symbol() {
        assert_eq!(
            parse_symbol("i0 x[0]").unwrap(),
            ('i', 0, "x[0]".to_string())
        );
        assert_eq!(
            parse_symbol("o12 a b").unwrap(),
            ('o', 12, "a b".to_string())
        );
        assert!(parse_symbol("x0 a").is_err());
        assert!(parse_symbol("i0").is_err());
    }

    #[test]
    fn test_parse_aig() {
        let aig = Aig::parse_str(indoc! {"
            aag 3 2 0 1 1
            2
            4
            6
            6 2 5
            i0 x
            i1 y
            o0 z
        "})
        .unwrap();
        assert_eq!(aig.inputs().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(aig.outputs().collect::<Vec<_>>(), vec!["z"]);
        assert_eq!(aig.num_gates(), 1);
        let values = Valuation::from([("x".to_string(), true), ("y".to_string(), false)]);
        let (outputs, _) = aig.eval(&values, None).unwrap();
        assert!(outputs["z"]);
    }

    #[test]
    fn test_parse_default_names_and_comment() {
        let aig = Aig::parse_str(indoc! {"
            aag 1 1 0 1 0
            2
            3
            c
            this is a comment
        "})
        .unwrap();
        assert_eq!(aig.inputs().collect::<Vec<_>>(), vec!["i0"]);
        assert_eq!(aig.outputs().collect::<Vec<_>>(), vec!["o0"]);
        assert_eq!(aig.output("o0"), Some(-aig.input("i0").unwrap()));
    }

    #[test]
    fn test_parse_toggle() {
        let aig = Aig::parse_str(indoc! {"
            aag 1 0 1 2 0
            2 3 1
            2
            3
            l0 s
        "})
        .unwrap();
        assert_eq!(aig.latch2init(), Valuation::from([("s".to_string(), true)]));
        let latch = aig.latch("s").unwrap();
        assert_eq!(latch.next, Ref::negative(latch.id));
    }

    #[test]
    fn test_parse_unordered_gates() {
        let aig = Aig::parse_str(indoc! {"
            aag 5 3 0 1 2
            2
            4
            6
            10
            10 8 6
            8 2 4
        "})
        .unwrap();
        assert_eq!(aig.num_gates(), 2);
        let values: Valuation = ["i0", "i1", "i2"]
            .iter()
            .map(|n| (n.to_string(), true))
            .collect();
        assert!(aig.eval(&values, None).unwrap().0["o0"]);
    }

    #[test]
    fn test_parse_errors() {
        // cycle
        assert!(Aig::parse_str("aag 3 1 0 1 2\n2\n6\n4 2 6\n6 2 4").is_err());
        // undefined variable
        assert!(Aig::parse_str("aag 3 1 0 1 1\n2\n4\n4 2 6").is_err());
        // duplicate definition
        assert!(Aig::parse_str("aag 2 2 0 0 0\n2\n2").is_err());
        // literal out of range
        assert!(Aig::parse_str("aag 1 1 0 1 0\n2\n4").is_err());
        // missing lines
        assert!(Aig::parse_str("aag 2 2 0 0 0\n2").is_err());
        // duplicate names
        assert!(Aig::parse_str("aag 2 2 0 0 0\n2\n4\ni0 x\ni1 x").is_err());
    }

    #[test]
    fn test_parse_huge_header_without_body() {
        assert!(Aig::parse_str("aag 4294967295 0 0 0 4294967295\n").is_err());
        assert!(Aig::parse_str("aag 4294967295 4294967295 0 0 0\n").is_err());
        assert!(Aig::parse_str("aag 4294967295 0 0 4294967295 0\n2\n").is_err());
    }

    #[test]
    fn test_parse_missing_file() {
        let path = std::env::temp_dir().join("aiger_bv_no_such_file.aag");
        let err = Aig::parse_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to open"));
    }
}
