//! Concatenation lowering.
//!
//! `a ++ b` becomes `rt.StrConcat(a, b)` when either side is a string and
//! `rt.Concat[T](a, b)` when either side is a slice of known element type.
//! Base-language `string` operands are converted with `rt.StrFrom` first.
//! Inside a constant initializer, concatenating two string constants is
//! plain `+`. Only innermost concatenations are lowered on a traversal; the
//! transformer repeats the pass until a traversal rewrites nothing, so a
//! chain is lowered from its leaves outwards and every level sees the
//! helper result types of the level below.

use tracing::trace;

use crate::ast::{BinaryOp, Expr, ExprKind, ToSource};
use crate::errors::{TransformError, TransformResult};
use crate::runtime::Helper;
use crate::transform::{PassContext, PassMode, RewritePass, ValueSlot, Visit};
use crate::types::TypeDescriptor;

pub struct ConcatLowering;

fn is_concat(expr: &Expr) -> bool {
    matches!(
        expr.unparen().kind,
        ExprKind::Binary {
            op: BinaryOp::Concat,
            ..
        }
    )
}

/// Literal left unlowered or a value of type `string`.
fn is_base_string(cx: &PassContext<'_>, expr: &Expr) -> bool {
    expr.unparen().is_string_lit()
        || cx.tracker.underlying(&cx.tracker.expr_type(expr)) == TypeDescriptor::primitive("string")
}

/// Lowered literal, `rt.StrConcat` result or `str` binding.
fn is_byte_string(cx: &PassContext<'_>, expr: &Expr) -> bool {
    !expr.unparen().is_string_lit() && cx.tracker.expr_type(expr).is_byte_string()
}

fn as_byte_string(cx: &mut PassContext<'_>, expr: Expr) -> Expr {
    if is_base_string(cx, &expr) {
        let pos = expr.pos;
        cx.runtime_call(Helper::StrFrom, Vec::new(), vec![expr], pos)
    } else {
        expr
    }
}

fn slice_element(cx: &PassContext<'_>, expr: &Expr) -> Option<Expr> {
    match cx.tracker.expr_type(expr) {
        TypeDescriptor::Slice(elem) => cx.type_arg(&elem, expr.pos),
        _ => None,
    }
}

impl RewritePass for ConcatLowering {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn description(&self) -> &'static str {
        "Lower ++ to the runtime's string and slice concatenation helpers"
    }

    fn mode(&self) -> PassMode {
        PassMode::FixedPoint
    }

    fn enter_expr(&mut self, expr: &mut Expr, cx: &mut PassContext<'_>) -> TransformResult<Visit> {
        let ExprKind::Binary {
            op: BinaryOp::Concat,
            left,
            right,
        } = &expr.kind
        else {
            return Ok(Visit::Descend);
        };
        if is_concat(left) || is_concat(right) {
            return Ok(Visit::Descend);
        }

        let pos = expr.pos;
        if cx.slot == ValueSlot::Constant
            && cx.tracker.is_string_constant(left)
            && cx.tracker.is_string_constant(right)
        {
            if let ExprKind::Binary { op, .. } = &mut expr.kind {
                *op = BinaryOp::Add;
            }
            trace!(%pos, "constant string concatenation");
            return Ok(Visit::Rewritten);
        }

        let stringish = |expr: &Expr| is_byte_string(cx, expr) || is_base_string(cx, expr);
        let (helper, type_args) = if stringish(left) || stringish(right) {
            (Helper::StrConcat, Vec::new())
        } else if let Some(elem) = slice_element(cx, left).or_else(|| slice_element(cx, right)) {
            (Helper::Concat, vec![elem])
        } else {
            return Err(TransformError::unresolved(
                format!(
                    "cannot determine the operand types of `{}`; ++ needs str operands \
                     or slices with a known element type",
                    expr.to_source()
                ),
                pos,
            ));
        };

        let ExprKind::Binary { left, right, .. } = expr.take().kind else {
            return Ok(Visit::Descend);
        };
        let (left, right) = match helper {
            Helper::StrConcat => (as_byte_string(cx, *left), as_byte_string(cx, *right)),
            _ => (*left, *right),
        };
        trace!(%pos, helper = helper.name(), "concatenation");
        *expr = cx.runtime_call(helper, type_args, vec![left, right], pos);
        Ok(Visit::Rewritten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::ast::{Decl, Pos, Stmt};
    use crate::config::TransformConfig;
    use crate::imports::ImportSet;
    use crate::transform::passes::{test_support::run, Pointerize, StringLiterals};
    use crate::transform::Transformer;

    fn lower(passes: Vec<Box<dyn RewritePass>>, stmts: Vec<Stmt>) -> Vec<String> {
        let mut file = main_file(stmts);
        run(passes, &mut file).unwrap();
        body_source(&file, "main")
    }

    #[test]
    fn test_string_chain_converges_left_associated() {
        let config = TransformConfig::default();
        let mut transformer = Transformer::new(&config);
        transformer.add_pass(Box::new(StringLiterals));
        transformer.add_pass(Box::new(ConcatLowering));

        let mut file = main_file(vec![define(
            "s",
            concat(concat(string("a"), string("b")), string("c")),
        )]);
        transformer
            .run(&mut file, &mut ImportSet::new(), &mut Vec::new())
            .unwrap();
        assert_eq!(
            body_source(&file, "main"),
            vec!["s := rt.StrConcat(rt.StrConcat(&rt.Str{0x61}, &rt.Str{0x62}), &rt.Str{0x63})"]
        );
        // two rewriting traversals and one that confirms the fixed point
        assert_eq!(transformer.stats()["concat"].traversals, 3);
        assert_eq!(transformer.stats()["concat"].rewrites, 2);
    }

    #[test]
    fn test_raw_literal_operands_pick_string_helper() {
        let out = lower(
            vec![Box::new(ConcatLowering)],
            vec![define("s", concat(string("a"), id("t")))],
        );
        assert_eq!(out, vec![r#"s := rt.StrConcat(rt.StrFrom("a"), t)"#]);
    }

    #[test]
    fn test_string_constant_operand_is_converted() {
        let mut file = file(vec![
            Decl::Gen(constant("Greeting", string("hi"), Pos::new(1, 7))),
            func("main", vec![], vec![], vec![define("s", concat(id("Greeting"), string("!")))]),
        ]);
        run(vec![Box::new(StringLiterals), Box::new(ConcatLowering)], &mut file).unwrap();
        assert_eq!(
            body_source(&file, "main"),
            vec!["s := rt.StrConcat(rt.StrFrom(Greeting), &rt.Str{0x21})"]
        );
        assert!(file.to_source().contains(r#"const Greeting = "hi""#));
    }

    #[test]
    fn test_constant_initializer_keeps_string_addition() {
        let mut file = file(vec![
            Decl::Gen(constant("G", concat(string("a"), string("b")), Pos::new(1, 7))),
            Decl::Gen(constant("H", concat(id("G"), string("c")), Pos::new(2, 7))),
        ]);
        let (imports, _) =
            run(vec![Box::new(StringLiterals), Box::new(ConcatLowering)], &mut file).unwrap();
        let source = file.to_source();
        assert!(source.contains(r#"const G = "a" + "b""#));
        assert!(source.contains(r#"const H = G + "c""#));
        assert!(imports.is_empty());
    }

    #[test]
    fn test_str_parameters() {
        let mut file = file(vec![func(
            "join",
            vec![field("s1", ty("str")), field("s2", ty("str"))],
            vec![anon(ty("str"))],
            vec![ret(vec![concat(id("s1"), id("s2"))])],
        )]);
        run(vec![Box::new(ConcatLowering)], &mut file).unwrap();
        assert_eq!(body_source(&file, "join"), vec!["return rt.StrConcat(s1, s2)"]);
    }

    #[test]
    fn test_slice_concatenation_uses_element_type() {
        let out = lower(
            vec![Box::new(Pointerize), Box::new(ConcatLowering)],
            vec![
                define("xs", lit(slice_ty(ty("int32")), vec![int(1)])),
                define("ys", concat(id("xs"), lit(slice_ty(ty("int32")), vec![int(2)]))),
                define("zs", concat(concat(id("xs"), id("ys")), id("xs"))),
            ],
        );
        assert_eq!(
            out,
            vec![
                "xs := &[]int32{1}",
                "ys := rt.Concat[int32](xs, &[]int32{2})",
                "zs := rt.Concat[int32](rt.Concat[int32](xs, ys), xs)",
            ]
        );
    }

    #[test]
    fn test_right_nested_chain() {
        let out = lower(
            vec![Box::new(StringLiterals), Box::new(ConcatLowering)],
            vec![define(
                "s",
                concat(string("a"), paren(concat(string("b"), string("c")))),
            )],
        );
        assert_eq!(
            out,
            vec!["s := rt.StrConcat(&rt.Str{0x61}, (rt.StrConcat(&rt.Str{0x62}, &rt.Str{0x63})))"]
        );
    }

    #[test]
    fn test_unknown_operands_are_unresolved() {
        let mut file = main_file(vec![define(
            "v",
            concat(call(sel("pkg", "A"), vec![]), call(sel("pkg", "B"), vec![])).at(3, 7),
        )]);
        let err = run(vec![Box::new(ConcatLowering)], &mut file).unwrap_err();
        match err {
            TransformError::UnresolvedType { message, pos } => {
                assert_eq!(pos.line, 3);
                assert!(message.contains("pkg.A() ++ pkg.B()"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
