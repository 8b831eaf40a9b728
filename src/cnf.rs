use std::collections::{BTreeMap, HashMap};

use crate::aig::Aig;
use crate::node::Node;
use crate::reference::Ref;

/// Tseitin encoding of the combinational part of an AIG.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Cnf {
    pub clauses: Vec<Vec<i32>>,
    /// Variable of each input.
    pub inputs: BTreeMap<String, i32>,
    /// Variable of each latch (its current state).
    pub latches: BTreeMap<String, i32>,
    /// Literal of each output.
    pub outputs: BTreeMap<String, i32>,
}

impl Cnf {
    pub fn num_vars(&self) -> usize {
        self.clauses
            .iter()
            .flatten()
            .chain(self.inputs.values())
            .chain(self.latches.values())
            .chain(self.outputs.values())
            .map(|lit| lit.unsigned_abs() as usize)
            .max()
            .unwrap_or(0)
    }
}

impl Aig {
    pub fn to_cnf(&self) -> Cnf {
        let mut mapping = HashMap::new(); // {id: lit}
        let mut clauses = Vec::new();

        let mut inputs = BTreeMap::new();
        for (name, id) in self.input_ids() {
            let x = mapping.len() as i32 + 1;
            mapping.insert(id, x);
            inputs.insert(name.to_owned(), x);
        }
        let mut latches = BTreeMap::new();
        for (name, id) in self.latch_ids() {
            let x = mapping.len() as i32 + 1;
            mapping.insert(id, x);
            latches.insert(name.to_owned(), x);
        }

        fn ref2lit(r: Ref, mapping: &HashMap<u32, i32>) -> i32 {
            let lit = mapping[&r.id()];
            if r.is_negated() {
                -lit
            } else {
                lit
            }
        }

        for (i, layer) in self.layers_input().enumerate().skip(1) {
            for id in layer {
                match self.node(id) {
                    Node::Zero => {
                        panic!("Unexpected zero on level {}", i);
                    }
                    Node::Input(_) | Node::Latch(_) => {
                        panic!("Unexpected leaf {} on level {}", id, i);
                    }
                    Node::AndGate(gate) => {
                        let x = mapping.len() as i32 + 1;
                        mapping.insert(id, x);
                        let [left, right] = gate.args;
                        match (left.get_const(), right.get_const()) {
                            (Some(l), Some(r)) => {
                                if l && r {
                                    clauses.push(vec![x]);
                                } else {
                                    clauses.push(vec![-x]);
                                }
                            }
                            (Some(l), None) => {
                                let rhs = ref2lit(right, &mapping);
                                if l {
                                    clauses.push(vec![x, -rhs]);
                                    clauses.push(vec![-x, rhs]);
                                } else {
                                    clauses.push(vec![-x]);
                                }
                            }
                            (None, Some(r)) => {
                                let lhs = ref2lit(left, &mapping);
                                if r {
                                    clauses.push(vec![x, -lhs]);
                                    clauses.push(vec![-x, lhs]);
                                } else {
                                    clauses.push(vec![-x]);
                                }
                            }
                            (None, None) => {
                                let lhs = ref2lit(left, &mapping);
                                let rhs = ref2lit(right, &mapping);
                                clauses.push(vec![x, -lhs, -rhs]);
                                clauses.push(vec![-x, lhs]);
                                clauses.push(vec![-x, rhs]);
                            }
                        }
                    }
                }
            }
        }

        let mut num_vars = mapping.len() as i32;
        let mut outputs = BTreeMap::new();
        for (name, r) in self.output_refs() {
            let lit = match r.get_const() {
                Some(value) => {
                    // Constant outputs get a fresh variable fixed by a unit clause.
                    num_vars += 1;
                    clauses.push(vec![if value { num_vars } else { -num_vars }]);
                    num_vars
                }
                None => ref2lit(r, &mapping),
            };
            outputs.insert(name.to_owned(), lit);
        }

        log::debug!(
            "Encoded {} into {} clauses over {} variables",
            self,
            clauses.len(),
            num_vars
        );
        Cnf {
            clauses,
            inputs,
            latches,
            outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_cnf() {
        let mut aig = Aig::new();
        let x = aig.add_input("x");
        let y = aig.add_input("y");
        let z = aig.and(x, -y);
        aig.add_output("z", -z);

        let cnf = aig.to_cnf();
        assert_eq!(cnf.inputs["x"], 1);
        assert_eq!(cnf.inputs["y"], 2);
        assert_eq!(cnf.outputs["z"], -3);
        assert_eq!(
            cnf.clauses,
            vec![vec![3, -1, 2], vec![-3, 1], vec![-3, -2]]
        );
        assert_eq!(cnf.num_vars(), 3);
    }

    #[test]
    fn test_to_cnf_constant_output() {
        let mut aig = Aig::new();
        aig.add_input("x");
        aig.add_output("t", Ref::TRUE);
        aig.add_output("f", Ref::FALSE);

        let cnf = aig.to_cnf();
        assert_eq!(cnf.outputs["f"], 2);
        assert_eq!(cnf.outputs["t"], 3);
        assert_eq!(cnf.clauses, vec![vec![-2], vec![3]]);
    }

    #[test]
    fn test_to_cnf_latch_is_free() {
        let mut aig = Aig::new();
        let x = aig.add_input("x");
        let s = aig.add_latch("s", false);
        let g = aig.and(x, s);
        aig.set_latch_next("s", g);
        aig.add_output("out", g);

        let cnf = aig.to_cnf();
        assert_eq!(cnf.latches["s"], 2);
        assert_eq!(cnf.outputs["out"], 3);
        assert_eq!(cnf.clauses.len(), 3);
    }
}
