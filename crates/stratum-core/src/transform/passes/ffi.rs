//! Foreign-library built-ins.
//!
//! `dlopen`, `dlsym`, `dlclose` and `dlerror` and the `RTLD_*` load flags
//! resolve to the runtime's ffi package.

use tracing::trace;

use crate::ast::{Expr, ExprKind};
use crate::errors::TransformResult;
use crate::runtime::{ffi_function, is_ffi_flag};
use crate::transform::{PassContext, RewritePass};

pub struct ForeignLibrary;

impl RewritePass for ForeignLibrary {
    fn name(&self) -> &'static str {
        "ffi"
    }

    fn description(&self) -> &'static str {
        "Resolve dl* built-ins and RTLD_* flags to the ffi package"
    }

    fn exit_expr(&mut self, expr: &mut Expr, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        let ExprKind::Ident(name) = &expr.kind else {
            return Ok(false);
        };
        if cx.tracker.is_bound(name) {
            return Ok(false);
        }
        let lowered = match ffi_function(name) {
            Some(function) => function,
            None if is_ffi_flag(name) => name.as_str(),
            None => return Ok(false),
        };
        let lowered = lowered.to_string();
        trace!(pos = %expr.pos, builtin = %name, "foreign-library reference");
        *expr = cx.ffi_ref(&lowered, expr.pos);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::ast::BinaryOp;
    use crate::transform::passes::test_support::run;

    #[test]
    fn test_functions_and_flags() {
        let mut file = main_file(vec![
            define(
                "h",
                call_fn(
                    "dlopen",
                    vec![
                        string("libm.so.6"),
                        binary(BinaryOp::Or, id("RTLD_NOW"), id("RTLD_GLOBAL")),
                    ],
                ),
            ),
            define("sym", call_fn("dlsym", vec![id("h"), string("cos")])),
            if_stmt(
                binary(BinaryOp::Eql, id("sym"), id("nil")),
                vec![expr_stmt(call(sel("log", "Fatal"), vec![call_fn("dlerror", vec![])]))],
            ),
            expr_stmt(call_fn("dlclose", vec![id("h")])),
        ]);
        let (imports, _) = run(vec![Box::new(ForeignLibrary)], &mut file).unwrap();
        let out = body_source(&file, "main");
        assert_eq!(
            out[0],
            r#"h := ffi.Open("libm.so.6", ffi.RTLD_NOW | ffi.RTLD_GLOBAL)"#
        );
        assert_eq!(out[1], r#"sym := ffi.Sym(h, "cos")"#);
        assert!(out[2].contains("log.Fatal(ffi.Error())"));
        assert_eq!(out[3], "ffi.Close(h)");
        assert!(imports.contains("github.com/stratum-lang/stratum/rt/ffi"));
        assert_eq!(imports.len(), 1);
    }

    #[test]
    fn test_local_names_win() {
        let mut file = main_file(vec![
            define("RTLD_LAZY", int(1)),
            define("flags", id("RTLD_LAZY")),
        ]);
        let (imports, _) = run(vec![Box::new(ForeignLibrary)], &mut file).unwrap();
        assert_eq!(body_source(&file, "main")[1], "flags := RTLD_LAZY");
        assert!(imports.is_empty());
    }
}
