//! Reject `make`: allocation is spelled with literals in Stratum.

use crate::ast::{Expr, ExprKind, ToSource};
use crate::errors::{TransformError, TransformResult};
use crate::transform::{PassContext, RewritePass};

use super::call_name;

pub struct RejectMake;

impl RewritePass for RejectMake {
    fn name(&self) -> &'static str {
        "reject-make"
    }

    fn description(&self) -> &'static str {
        "Refuse calls to make and point at the literal forms that replace it"
    }

    fn exit_expr(&mut self, expr: &mut Expr, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        if call_name(expr) != Some("make") || cx.tracker.is_bound("make") {
            return Ok(false);
        }
        let what = match &expr.kind {
            ExprKind::Call { args, .. } => args
                .first()
                .map(|ty| format!(" of {}", ty.to_source()))
                .unwrap_or_default(),
            _ => String::new(),
        };
        Err(TransformError::unsupported(
            format!(
                "make{what} is not supported; use a literal instead: \
                 []T{{}} for slices, map[K]V{{}} for maps, chan T{{}} (or chan T{{n}}) for channels"
            ),
            expr.pos,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::ast::Stmt;
    use crate::transform::passes::test_support::run;

    fn reject(stmts: Vec<Stmt>) -> TransformResult<()> {
        let mut file = main_file(stmts);
        run(vec![Box::new(RejectMake)], &mut file).map(|_| ())
    }

    fn make_call() -> Expr {
        call_fn("make", vec![slice_ty(ty("int")), int(4)]).at(7, 9)
    }

    #[test]
    fn test_make_rejected_in_every_position() {
        let positions = vec![
            expr_stmt(make_call()),
            decl_stmt(var("xs", None, Some(make_call()))),
            define("n", call_fn("len", vec![make_call()])),
            define("f", func_lit(vec![], vec![], vec![ret(vec![make_call()])])),
        ];
        for stmt in positions {
            let err = reject(vec![stmt]).unwrap_err();
            match err {
                TransformError::UnsupportedConstruct { message, pos } => {
                    assert_eq!(pos.line, 7);
                    assert!(message.contains("make of []int"));
                    assert!(message.contains("[]T{}"));
                    assert!(message.contains("map[K]V{}"));
                    assert!(message.contains("chan T{}"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_local_make_is_an_ordinary_call() {
        let result = reject(vec![
            define("make", func_lit(vec![], vec![], vec![])),
            expr_stmt(call_fn("make", vec![])),
        ]);
        assert!(result.is_ok());
    }
}
