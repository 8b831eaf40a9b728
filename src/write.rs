use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use eyre::WrapErr;

use crate::aig::Aig;
use crate::parse::HEADER_MAGIC;

impl Aig {
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let path = path.as_ref();
        log::debug!("Writing AIG to {}", path.display());
        let f =
            File::create(path).wrap_err_with(|| format!("Failed to create {}", path.display()))?;
        let mut f = BufWriter::new(f);
        self.write(&mut f)?;
        f.flush()
            .wrap_err_with(|| format!("Failed to write {}", path.display()))
    }

    pub fn write_to_string(&self) -> eyre::Result<String> {
        log::debug!("Writing AIG to string");
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        let s = String::from_utf8(buf)?;
        Ok(s)
    }

    /// Writes the circuit in the ASCII AIGER format, with a symbol table.
    pub fn write(&self, writer: &mut impl Write) -> eyre::Result<()> {
        // Header:
        let m = self.max_id();
        let i = self.num_inputs();
        let l = self.num_latches();
        let o = self.num_outputs();
        let a = self.num_gates();
        writeln!(writer, "{} {} {} {} {} {}", HEADER_MAGIC, m, i, l, o, a)?;

        // Inputs:
        for (_, id) in self.input_ids() {
            writeln!(writer, "{}", id * 2)?;
        }

        // Latches:
        for (name, id) in self.latch_ids() {
            if let Some(latch) = self.latch(name) {
                if latch.init {
                    writeln!(writer, "{} {} 1", id * 2, latch.next.raw())?;
                } else {
                    writeln!(writer, "{} {}", id * 2, latch.next.raw())?;
                }
            }
        }

        // Outputs:
        for (_, output) in self.output_refs() {
            writeln!(writer, "{}", output.raw())?;
        }

        // Gates:
        for gate in self.and_gates() {
            let [left, right] = gate.args;
            writeln!(writer, "{} {} {}", gate.id * 2, right.raw(), left.raw())?;
        }

        // Symbols:
        for (position, (name, _)) in self.input_ids().enumerate() {
            writeln!(writer, "i{} {}", position, name)?;
        }
        for (position, (name, _)) in self.latch_ids().enumerate() {
            writeln!(writer, "l{} {}", position, name)?;
        }
        for (position, (name, _)) in self.output_refs().enumerate() {
            writeln!(writer, "o{} {}", position, name)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;

    use crate::aig::Valuation;

    #[test]
    fn test_write_aig() {
        let mut aig = Aig::new();
        let x = aig.add_input("x");
        let y = aig.add_input("y");
        let g = aig.and(-x, y);
        let h = aig.and(-g, x);
        aig.add_output("a", -g);
        aig.add_output("b", h);
        let s = aig.write_to_string().unwrap();
        let expected = indoc! {"
            aag 4 2 0 2 2
            2
            4
            7
            8
            6 4 3
            8 7 2
            i0 x
            i1 y
            o0 a
            o1 b
        "};
        assert_eq!(s, expected);
    }

    #[test]
    fn test_write_toggle() {
        let mut aig = Aig::new();
        let s = aig.add_latch("s", true);
        aig.set_latch_next("s", -s);
        aig.add_output("pos", s);
        aig.add_output("neg", -s);
        let s = aig.write_to_string().unwrap();
        let expected = indoc! {"
            aag 1 0 1 2 0
            2 3 1
            3
            2
            l0 s
            o0 neg
            o1 pos
        "};
        assert_eq!(s, expected);
    }

    #[test]
    fn test_write_then_parse() {
        let mut aig = Aig::new();
        let x = aig.add_input("x[0]");
        let y = aig.add_input("y[0]");
        let s = aig.add_latch("acc", false);
        let t = aig.xor(x, s);
        aig.set_latch_next("acc", t);
        let u = aig.or(t, y);
        aig.add_output("out", u);

        let parsed = Aig::parse_str(&aig.write_to_string().unwrap()).unwrap();
        assert_eq!(parsed, aig);

        let steps: Vec<Valuation> = [(true, false), (false, false), (true, true)]
            .iter()
            .map(|&(x, y)| Valuation::from([("x[0]".to_string(), x), ("y[0]".to_string(), y)]))
            .collect();
        assert_eq!(
            parsed.simulate(&steps, None).unwrap(),
            aig.simulate(&steps, None).unwrap()
        );
    }

    #[test]
    fn test_write_to_file() {
        let mut aig = Aig::new();
        let x = aig.add_input("x");
        let s = aig.add_latch("s", true);
        let g = aig.and(x, s);
        aig.set_latch_next("s", -g);
        aig.add_output("y", g);

        let path = std::env::temp_dir().join(format!("aiger_bv_{}_write.aag", std::process::id()));
        aig.write_to_file(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed = Aig::parse_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(contents, aig.write_to_string().unwrap());
        assert_eq!(parsed, aig);
    }

    #[test]
    fn test_write_to_missing_directory() {
        let path = std::env::temp_dir()
            .join("aiger_bv_no_such_dir")
            .join("out.aag");
        let err = Aig::new().write_to_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to create"));
    }
}
