//! End-to-end tests driving the public interpreter API the way a
//! host application would: validate, load, inject inputs, run, read
//! outputs back.

use leeway_formula::{EvalError, Interpreter};
use pretty_assertions::assert_eq;

const DOUBLER: &str = r#"
input x "X";
output y "Y" "%.1f";

main() {
    y = x * 2;
}
"#;

/// Set input, run, read output
#[test]
fn test_end_to_end_doubler() {
    let mut interp = Interpreter::load(DOUBLER).unwrap();

    // Introspection drives the pre-run setup
    assert_eq!(interp.program().inputs().len(), 1);
    assert_eq!(interp.program().inputs()[0].prompt, "X");
    assert_eq!(interp.program().outputs()[0].label, "Y");
    assert_eq!(interp.program().outputs()[0].format, "%.1f");

    for output in interp.program().outputs().to_vec() {
        interp.declare_variable(&output.name);
    }
    interp.set_variable("x", 3.0);

    interp.run().unwrap();
    assert_eq!(interp.get_variable("y"), Some(6.0));
}

/// A blank input is deleted before the run; referencing it is a semantic
/// error naming the variable
#[test]
fn test_end_to_end_unset_input() {
    let mut interp = Interpreter::load(DOUBLER).unwrap();
    interp.declare_variable("y");
    interp.delete_variable("x");

    let err = interp.run().unwrap_err();
    assert_eq!(err, EvalError::UnsetVariable("x".into()));
    assert!(err.to_string().contains('x'));

    // The output was never assigned; the caller renders it blank
    assert_eq!(interp.get_variable("y"), None);
}

/// An output the formula never assigns reads back as absent
#[test]
fn test_unassigned_output_is_absent() {
    let mut interp = Interpreter::load(
        r#"
        input x "X";
        output y "Y" "%.1f";
        output z "Z" "%.1f";
        main() { y = x; }
        "#,
    )
    .unwrap();
    interp.declare_variable("y");
    interp.declare_variable("z");
    interp.set_variable("x", 4.0);

    interp.run().unwrap();
    assert_eq!(interp.get_variable("y"), Some(4.0));
    assert_eq!(interp.get_variable("z"), None);
}

/// validate accepts exactly the texts load accepts, with the same error
#[test]
fn test_validate_load_round_trip() {
    let good = [DOUBLER, "main() { }", "f(a) { return a; } main() { f(1); }"];
    for source in good {
        assert_eq!(Interpreter::validate(source), Ok(()));
        assert!(Interpreter::load(source).is_ok());
    }

    let bad = ["", "main( {", "main() { var ; }", "input x;\nmain() { }"];
    for source in bad {
        let validate_err = Interpreter::validate(source).unwrap_err();
        let load_err = Interpreter::load(source).err().unwrap();
        assert_eq!(validate_err, load_err);
    }
}

/// A multi-function formula using helpers, loops, and inputs together
#[test]
fn test_compound_interest_formula() {
    let mut interp = Interpreter::load(
        r#"
        input principal "Principal";
        input rate "Rate (percent)";
        input years "Years";
        output total "Total" "%.2f";

        grow(amount, r) {
            return amount + amount * r / 100;
        }

        main() {
            var i = 0;
            total = principal;
            while (i < years) {
                total = grow(total, rate);
                i++;
            }
        }
        "#,
    )
    .unwrap();

    interp.declare_variable("total");
    interp.set_variable("principal", 1000.0);
    interp.set_variable("rate", 10.0);
    interp.set_variable("years", 2.0);

    interp.run().unwrap();
    let total = interp.get_variable("total").unwrap();
    assert!((total - 1210.0).abs() < 1e-9);
}

/// Semantic errors surface as values, never panics, and leave the
/// interpreter reusable
#[test]
fn test_interpreter_survives_semantic_errors() {
    let mut interp = Interpreter::load(
        r#"
        output y "Y" "%.1f";
        main() { y = helper(1, 2); }
        "#,
    )
    .unwrap();
    interp.declare_variable("y");

    assert_eq!(
        interp.run(),
        Err(EvalError::UnknownFunction("helper".into()))
    );

    // Reload with a fixed formula and run again on the same instance
    interp
        .reload(
            r#"
            output y "Y" "%.1f";
            helper(a, b) { return a + b; }
            main() { y = helper(1, 2); }
            "#,
        )
        .unwrap();
    interp.declare_variable("y");
    interp.run().unwrap();
    assert_eq!(interp.get_variable("y"), Some(3.0));
}

/// Inputs survive multiple runs of the same program
#[test]
fn test_repeated_runs() {
    let mut interp = Interpreter::load(DOUBLER).unwrap();
    interp.declare_variable("y");
    interp.set_variable("x", 1.0);
    interp.run().unwrap();
    assert_eq!(interp.get_variable("y"), Some(2.0));

    interp.set_variable("x", 21.0);
    interp.run().unwrap();
    assert_eq!(interp.get_variable("y"), Some(42.0));
}
