// Printer tests: lowered shapes must come out as valid base-language source.

use pretty_assertions::assert_eq;

use super::build::*;
use super::*;

#[test]
fn test_precedence_parenthesises_only_when_needed() {
    let sum = binary(BinaryOp::Add, id("a"), id("b"));
    let product = binary(BinaryOp::Mul, paren(sum.clone()), id("c"));
    assert_eq!(product.to_source(), "(a + b) * c");

    let unparenthesised = binary(BinaryOp::Mul, sum, id("c"));
    assert_eq!(unparenthesised.to_source(), "(a + b) * c");

    let left_assoc = binary(BinaryOp::Sub, binary(BinaryOp::Sub, id("a"), id("b")), id("c"));
    assert_eq!(left_assoc.to_source(), "a - b - c");
    let right_nested = binary(BinaryOp::Sub, id("a"), binary(BinaryOp::Sub, id("b"), id("c")));
    assert_eq!(right_nested.to_source(), "a - (b - c)");
}

#[test]
fn test_pointer_shapes() {
    assert_eq!(index(Expr::deref(id("xs")), int(0)).to_source(), "(*xs)[0]");
    assert_eq!(
        slice_expr(Expr::deref(id("xs")), None, Some(int(0))).to_source(),
        "(*xs)[:0]"
    );
    assert_eq!(field_of(Expr::deref(id("p")), "X").to_source(), "(*p).X");
    assert_eq!(
        call(ptr_ty(slice_ty(ty("byte"))), vec![id("s")]).to_source(),
        "(*[]byte)(s)"
    );
    assert_eq!(Expr::addr(lit(sel("rt", "Str"), vec![])).to_source(), "&rt.Str{}");
}

#[test]
fn test_string_quoting() {
    assert_eq!(quote("plain"), r#""plain""#);
    assert_eq!(quote("tab\there"), r#""tab\there""#);
    assert_eq!(quote("say \"hi\"\n"), r#""say \"hi\"\n""#);
    assert_eq!(quote("\u{1}é"), "\"\\x01é\"");
    assert_eq!(string("a\\b").to_source(), r#""a\\b""#);
}

#[test]
fn test_grouped_declarations() {
    let decl = constants(vec![
        ("A", int(1), Pos::default()),
        ("B", string("b"), Pos::default()),
    ]);
    assert_eq!(decl.to_source(), "const (\n\tA = 1\n\tB = \"b\"\n)");
}

#[test]
fn test_control_flow_statements() {
    let stmt = if_stmt(
        binary(BinaryOp::Gtr, id("n"), int(0)),
        vec![inc(id("n")), ret(vec![id("n")])],
    );
    assert_eq!(stmt.to_source(), "if n > 0 {\n\tn++\n\treturn n\n}");

    let switch = Stmt::new(
        StmtKind::Switch {
            init: None,
            tag: Some(id("k")),
            clauses: vec![
                CaseClause {
                    exprs: vec![int(1), int(2)],
                    body: vec![expr_stmt(call_fn("f", vec![]))],
                    pos: Pos::default(),
                },
                CaseClause {
                    exprs: vec![],
                    body: vec![],
                    pos: Pos::default(),
                },
            ],
        },
        Pos::default(),
    );
    assert_eq!(switch.to_source(), "switch k {\ncase 1, 2:\n\tf()\ndefault:\n}");
}

#[test]
fn test_whole_file() {
    let mut file = file(vec![func(
        "main",
        vec![],
        vec![],
        vec![define("ok", call(sel("bytes", "Equal"), vec![id("a"), id("b")]))],
    )]);
    file.imports.push(ImportDecl {
        specs: vec![ImportSpec {
            alias: None,
            path: "bytes".into(),
            pos: Pos::default(),
        }],
        grouped: true,
        pos: Pos::default(),
    });
    assert_eq!(
        file.to_source(),
        "package main\n\nimport (\n\t\"bytes\"\n)\n\nfunc main() {\n\tok := bytes.Equal(a, b)\n}\n"
    );
}

#[test]
fn test_func_literal_indents_with_its_context() {
    let stmt = define(
        "f",
        func_lit(
            vec![field("x", ty("int"))],
            vec![anon(ty("int"))],
            vec![ret(vec![id("x")])],
        ),
    );
    let outer = if_stmt(id("ok"), vec![stmt]);
    assert_eq!(
        outer.to_source(),
        "if ok {\n\tf := func(x int) int {\n\t\treturn x\n\t}\n}"
    );
}
