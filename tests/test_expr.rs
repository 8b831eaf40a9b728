use aiger_bv::aig::UnrollOptions;
use aiger_bv::bundle::{decode_int, wrap_int, WordValuation};
use aiger_bv::expr::{ite, satom, uatom};
use aiger_bv::gates;

#[test]
fn test_max_of_two() {
    let x = satom(5, "x");
    let y = satom(5, "y");
    let max = ite(&x.gt(&y), &x, &y);
    for a in -16..16 {
        for b in -16..16 {
            let out = max.eval_int([("x", a), ("y", b)]).unwrap();
            assert_eq!(out, a.max(b), "max({}, {})", a, b);
        }
    }
}

#[test]
fn test_polynomial() {
    // 3x + 5 mod 2^6
    let x = uatom(6, "x");
    let e = (&x << 1) + &x + 5;
    for a in 0..64 {
        assert_eq!(e.eval_int([("x", a)]).unwrap(), (3 * a + 5) % 64);
    }
}

#[test]
fn test_expression_as_circuit() {
    let x = uatom(4, "x");
    let y = uatom(4, "y");
    let e = (&x ^ &y).with_output("diff");
    let circ = e.aigbv().clone();
    let text = circ.write_to_string().unwrap();
    assert!(text.starts_with("aag "));
    assert_eq!(circ.outputs().collect::<Vec<_>>(), vec!["diff"]);

    let inputs = WordValuation::from([
        ("x".to_string(), wrap_int(4, 0b1100)),
        ("y".to_string(), wrap_int(4, 0b1010)),
    ]);
    let (outputs, _) = circ.eval(&inputs, None).unwrap();
    assert_eq!(decode_int(&outputs["diff"], false), 0b0110);
}

#[test]
fn test_accumulator_unrolled() {
    // acc' = acc + x, starting at zero, observed after every step.
    let x = uatom(3, "x");
    let acc = uatom(3, "acc");
    let sum = (&acc + &x).with_output("next");
    let circ = sum
        .aigbv()
        .seq(&gates::tee(3, "next", &["acc_out", "acc_next"]))
        .unwrap()
        .feedback(&["acc"], &["acc_next"], None, None, false)
        .unwrap();

    let unrolled = circ.unroll(3, &UnrollOptions::default()).unwrap();
    let inputs = WordValuation::from([
        ("x##time_0".to_string(), wrap_int(3, 2)),
        ("x##time_1".to_string(), wrap_int(3, 3)),
        ("x##time_2".to_string(), wrap_int(3, 5)),
    ]);
    let (outputs, _) = unrolled.eval(&inputs, None).unwrap();
    assert_eq!(decode_int(&outputs["acc_out##time_1"], false), 2);
    assert_eq!(decode_int(&outputs["acc_out##time_2"], false), 5);
    assert_eq!(decode_int(&outputs["acc_out##time_3"], false), 2);
}
