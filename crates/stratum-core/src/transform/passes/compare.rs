//! Byte-string comparison lowering.
//!
//! Comparing two `str` values compares their bytes, not their pointers:
//! `a == b` becomes `bytes.Equal(*a, *b)` and an ordering `a < b` becomes
//! `bytes.Compare(*a, *b) < 0`.

use tracing::trace;

use crate::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::errors::TransformResult;
use crate::transform::{PassContext, RewritePass};

use super::deref_value;

pub struct CompareLowering;

fn is_byte_string(cx: &PassContext<'_>, expr: &Expr) -> bool {
    expr.unparen().is_string_lit() || cx.tracker.expr_type(expr).is_byte_string()
}

impl RewritePass for CompareLowering {
    fn name(&self) -> &'static str {
        "compare"
    }

    fn description(&self) -> &'static str {
        "Compare str values by content through the bytes package"
    }

    fn exit_expr(&mut self, expr: &mut Expr, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        let ExprKind::Binary { op, left, right } = &expr.kind else {
            return Ok(false);
        };
        let op = *op;
        if !op.is_comparison() || !is_byte_string(cx, left) || !is_byte_string(cx, right) {
            return Ok(false);
        }

        let pos = expr.pos;
        let ExprKind::Binary { left, right, .. } = expr.take().kind else {
            return Ok(false);
        };
        let runtime = cx.runtime_name();
        let args = vec![deref_value(*left, runtime), deref_value(*right, runtime)];
        trace!(%pos, op = op.token(), "byte-string comparison");

        *expr = match op {
            BinaryOp::Eql => Expr::call(cx.compare_ref("Equal", pos), args),
            BinaryOp::Neq => Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(Expr::call(cx.compare_ref("Equal", pos), args)),
                },
                pos,
            ),
            _ => Expr::binary(
                op,
                Expr::call(cx.compare_ref("Compare", pos), args),
                Expr::int(0, pos),
            ),
        };
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::ast::File;
    use crate::transform::passes::{test_support::run, StringLiterals};

    fn str_func(body: Vec<crate::ast::Stmt>) -> File {
        file(vec![func(
            "cmp",
            vec![field("a", ty("str")), field("b", ty("str")), field("n", ty("int"))],
            vec![],
            body,
        )])
    }

    #[test]
    fn test_equality_and_ordering() {
        let mut file = str_func(vec![
            define("eq", binary(BinaryOp::Eql, id("a"), id("b"))),
            define("ne", binary(BinaryOp::Neq, id("a"), string("x"))),
            define("lt", binary(BinaryOp::Lss, id("a"), id("b"))),
            define("ge", binary(BinaryOp::Geq, id("b"), id("a"))),
            define("plain", binary(BinaryOp::Eql, id("n"), int(3))),
        ]);
        let (imports, _) = run(
            vec![Box::new(StringLiterals), Box::new(CompareLowering)],
            &mut file,
        )
        .unwrap();
        assert_eq!(
            body_source(&file, "cmp"),
            vec![
                "eq := bytes.Equal(*a, *b)",
                "ne := !bytes.Equal(*a, rt.Str{0x78})",
                "lt := bytes.Compare(*a, *b) < 0",
                "ge := bytes.Compare(*b, *a) >= 0",
                "plain := n == 3",
            ]
        );
        assert!(imports.contains("bytes"));
        assert_eq!(imports.len(), 2);
    }

    #[test]
    fn test_mixed_operands_are_left_alone() {
        let mut file = str_func(vec![
            if_stmt(binary(BinaryOp::Eql, id("a"), id("nil")), vec![]),
            define("c", binary(BinaryOp::Gtr, id("n"), call_fn("len", vec![id("b")]))),
        ]);
        let (imports, _) = run(vec![Box::new(CompareLowering)], &mut file).unwrap();
        let out = body_source(&file, "cmp");
        assert!(out[0].starts_with("if a == nil {"));
        assert_eq!(out[1], "c := n > len(b)");
        assert!(imports.is_empty());
    }
}
