use expect_test::expect;

use super::*;

fn sample_function() -> Function {
    let mut func = Function::declaration("mix", vec!["a".to_string(), "b".to_string()]);
    let entry = func.add_block("entry");
    let sum = func.add_instr(
        entry,
        Instr::Binary {
            op: BinOp::Add,
            lhs: Value::Param(0),
            rhs: Value::Param(1),
        },
    );
    let cmp = func.add_instr(
        entry,
        Instr::Cmp {
            pred: CmpPred::Ule,
            lhs: sum,
            rhs: Value::Num(10.0),
        },
    );
    let then_block = func.add_block("then");
    let else_block = func.add_block("else");
    let merge = func.add_block("merge");
    func.set_terminator(
        entry,
        Terminator::CondBr {
            cond: cmp,
            then_dest: then_block,
            else_dest: else_block,
        },
    );
    func.set_terminator(then_block, Terminator::Br(merge));
    func.set_terminator(else_block, Terminator::Br(merge));
    let result = func.add_instr(
        merge,
        Instr::Phi {
            incomings: vec![(sum, then_block), (Value::Num(0.0), else_block)],
        },
    );
    func.set_terminator(merge, Terminator::Ret(result));
    func
}

#[test]
fn display_renders_blocks_in_order() {
    let func = sample_function();
    expect![[r#"
        define @mix(%a, %b) {
        entry:
          %0 = fadd %a, %b
          %1 = fcmp ule %0, 10
          br %1, label %then, label %else
        then:
          br label %merge
        else:
          br label %merge
        merge:
          %2 = phi [ %0, %then ], [ 0, %else ]
          ret %2
        }
    "#]]
    .assert_eq(&func.to_string());
}

#[test]
fn display_renders_declarations() {
    let func = Function::declaration("sin", vec!["x".to_string()]);
    expect![[r#"
        declare @sin(%x)
    "#]]
    .assert_eq(&func.to_string());
}

#[test]
fn module_display_lists_every_function() {
    let mut module = Module::new("test");
    module.add_function(Function::declaration("sin", vec!["x".to_string()]));
    module.add_function(sample_function());
    expect![[r#"
        ; module test

        declare @sin(%x)

        define @mix(%a, %b) {
        entry:
          %0 = fadd %a, %b
          %1 = fcmp ule %0, 10
          br %1, label %then, label %else
        then:
          br label %merge
        else:
          br label %merge
        merge:
          %2 = phi [ %0, %then ], [ 0, %else ]
          ret %2
        }
    "#]]
    .assert_eq(&module.to_string());
}

#[test]
fn block_labels_are_uniquified() {
    let mut func = Function::declaration("f", vec![]);
    let a = func.add_block("then");
    let b = func.add_block("then");
    let c = func.add_block("then");
    assert_eq!(func.blocks[a.0].label, "then");
    assert_eq!(func.blocks[b.0].label, "then1");
    assert_eq!(func.blocks[c.0].label, "then2");
}

#[test]
fn predecessors_follow_terminators() {
    let func = sample_function();
    assert_eq!(func.preds(BlockId(0)), vec![]);
    // `merge` is reached from both `then` and `else`.
    assert_eq!(func.preds(BlockId(3)), vec![BlockId(1), BlockId(2)]);
}

#[test]
fn verify_accepts_a_well_formed_function() {
    assert_eq!(verify::verify_function(&sample_function()), Ok(()));
}

#[test]
fn verify_rejects_a_missing_terminator() {
    let mut func = Function::declaration("f", vec![]);
    func.add_block("entry");
    let err = verify::verify_function(&func).unwrap_err();
    assert!(err.contains("no terminator"), "unexpected error: {err}");
}

#[test]
fn verify_rejects_phi_predecessor_mismatch() {
    let mut func = Function::declaration("f", vec![]);
    let entry = func.add_block("entry");
    let next = func.add_block("next");
    func.set_terminator(entry, Terminator::Br(next));
    // The phi claims an edge from `next` itself, which is not a predecessor.
    let phi = func.add_instr(
        next,
        Instr::Phi {
            incomings: vec![(Value::Num(1.0), entry), (Value::Num(2.0), next)],
        },
    );
    func.set_terminator(next, Terminator::Ret(phi));
    let err = verify::verify_function(&func).unwrap_err();
    assert!(err.contains("predecessors"), "unexpected error: {err}");
}

#[test]
fn verify_rejects_a_trailing_phi() {
    let mut func = Function::declaration("f", vec![]);
    let entry = func.add_block("entry");
    let next = func.add_block("next");
    func.set_terminator(entry, Terminator::Br(next));
    let sum = func.add_instr(
        next,
        Instr::Binary {
            op: BinOp::Add,
            lhs: Value::Num(1.0),
            rhs: Value::Num(2.0),
        },
    );
    let phi = func.add_instr(
        next,
        Instr::Phi {
            incomings: vec![(sum, entry)],
        },
    );
    func.set_terminator(next, Terminator::Ret(phi));
    let err = verify::verify_function(&func).unwrap_err();
    assert!(err.contains("lead"), "unexpected error: {err}");
}

#[test]
fn eval_selects_by_branch() {
    let mut module = Module::new("test");
    module.add_function(sample_function());
    assert_eq!(eval::call(&module, "mix", &[3.0, 4.0]), Ok(7.0));
    assert_eq!(eval::call(&module, "mix", &[20.0, 0.0]), Ok(0.0));
}

#[test]
fn eval_reports_missing_and_bodyless_functions() {
    let mut module = Module::new("test");
    module.add_function(Function::declaration("sin", vec!["x".to_string()]));
    assert_eq!(
        eval::call(&module, "cos", &[1.0]),
        Err(eval::EvalError::UnknownFunction("cos".to_string()))
    );
    assert_eq!(
        eval::call(&module, "sin", &[1.0]),
        Err(eval::EvalError::NotDefined("sin".to_string()))
    );
}

#[test]
fn eval_checks_arity() {
    let mut module = Module::new("test");
    module.add_function(sample_function());
    assert_eq!(
        eval::call(&module, "mix", &[1.0]),
        Err(eval::EvalError::ArityMismatch {
            name: "mix".to_string(),
            required: 2,
            given: 1,
        })
    );
}

#[test]
fn comparison_predicates_handle_nan() {
    assert!(CmpPred::Ule.apply(f64::NAN, 1.0));
    assert!(CmpPred::Ule.apply(1.0, 1.0));
    assert!(!CmpPred::Oeq.apply(f64::NAN, f64::NAN));
    assert!(!CmpPred::One.apply(f64::NAN, 1.0));
    assert!(CmpPred::One.apply(2.0, 1.0));
}
