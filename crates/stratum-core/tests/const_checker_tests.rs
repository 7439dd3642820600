/*!
# Const Checker Integration Tests
*/

use stratum_core::ast::build::*;
use stratum_core::ast::{Decl, File, Pos, Stmt};
use stratum_core::check::{CheckerState, ConstChecker};
use stratum_core::{Pipeline, TransformError};

fn with_const(stmts: Vec<Stmt>) -> File {
    file(vec![
        Decl::Gen(constant("X", lit(slice_ty(ty("int")), vec![int(1)]), Pos::new(1, 7))),
        func("main", vec![], vec![], stmts),
    ])
}

#[test]
fn test_each_mutation_is_one_violation() {
    let mutations: Vec<Stmt> = vec![
        assign(id("X"), lit(slice_ty(ty("int")), vec![])),
        inc(id("X")),
        dec(id("X")),
    ];
    for mutation in mutations {
        let mut checker = ConstChecker::new();
        let violations = checker.check(&with_const(vec![mutation]));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].related, Some(Pos::new(1, 7)));
    }
}

#[test]
fn test_violations_are_batched() {
    let file = with_const(vec![
        assign(id("X").at(4, 2), lit(slice_ty(ty("int")), vec![])),
        if_stmt(id("ok"), vec![inc(index(id("X").at(6, 3), int(0)))]),
        define("y", id("X")),
        dec(id("y")),
    ]);
    match Pipeline::default().lower(file) {
        Err(TransformError::ConstViolations(violations)) => {
            let lines: Vec<u32> = violations.iter().map(|v| v.pos.line).collect();
            assert_eq!(lines, vec![4, 6]);
        }
        other => panic!("expected batched violations, got {other:?}"),
    }
}

#[test]
fn test_checker_is_fresh_per_file() {
    let first = with_const(vec![inc(id("X"))]);
    let second = main_file(vec![define("X", int(1)), inc(id("X"))]);
    assert!(ConstChecker::run(&first).is_err());
    assert!(ConstChecker::run(&second).is_ok());

    let mut checker = ConstChecker::default();
    assert_eq!(checker.state(), CheckerState::Collecting);
    assert!(checker.check(&second).is_empty());
    assert_eq!(checker.state(), CheckerState::Checking);
}

#[test]
fn test_clean_file_lowers_with_slice_const_as_var() -> anyhow::Result<()> {
    let file = with_const(vec![define("n", call_fn("len", vec![id("X")]))]);
    let lowered = Pipeline::default().lower(file)?;
    let source = lowered.source();
    assert!(source.contains("var X = &[]int{1}"), "{source}");
    assert!(!source.contains("const X"), "{source}");
    assert!(source.contains("n := len(*X)"), "{source}");
    Ok(())
}
