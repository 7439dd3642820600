//! Reference pointerization.
//!
//! Slice, map, channel and `str` values are pointers once lowered. Literals
//! gain a `&` (channels go through the runtime's constructor) and every site
//! that needs the underlying value reads through the pointer. Variables
//! declared without an initializer start out pointing at an empty value.
//!
//! `append` reads its target through the pointer wherever it appears and
//! its result is boxed again with `rt.Ptr`; as a statement of its own, or
//! assigned back through a pointer, it grows the target in place.

use tracing::trace;

use crate::ast::{
    AssignOp, ChanDir, DeclKind, Expr, ExprKind, GenDecl, Spec, Stmt, StmtKind, UnaryOp,
};
use crate::errors::{TransformError, TransformResult};
use crate::runtime::{match_helper_call, Helper};
use crate::transform::{PassContext, RewritePass};
use crate::types::TypeDescriptor;

use super::{call_name, deref_value, is_deref};

/// Built-ins whose first argument is read through the pointer.
const DEREF_FIRST_ARG: &[&str] = &["len", "cap", "delete", "close"];

pub struct Pointerize;

fn wants_deref(cx: &PassContext<'_>, expr: &Expr) -> bool {
    !is_deref(expr) && cx.tracker.expr_type(expr).is_reference()
}

fn deref_in_place(expr: &mut Expr, runtime: &str) {
    let value = expr.take();
    *expr = deref_value(value, runtime);
}

fn is_builtin_call(cx: &PassContext<'_>, expr: &Expr, builtin: &str) -> bool {
    call_name(expr) == Some(builtin) && !cx.tracker.is_bound(builtin)
}

fn first_arg_mut(expr: &mut Expr) -> Option<&mut Expr> {
    match &mut expr.kind {
        ExprKind::Call { args, .. } => args.first_mut(),
        _ => None,
    }
}

/// `append(x, ..)` where `x` is a pointer-wrapped slice or `str`.
fn is_growing_append(cx: &PassContext<'_>, expr: &Expr) -> bool {
    if !is_builtin_call(cx, expr, "append") {
        return false;
    }
    match &expr.kind {
        ExprKind::Call { args, .. } => args.first().is_some_and(|target| {
            let ty = cx.tracker.expr_type(target);
            !is_deref(target) && (matches!(ty, TypeDescriptor::Slice(_)) || ty.is_byte_string())
        }),
        _ => false,
    }
}

/// `append(x, ys...)` => `rt.Ptr(append(*x, *ys...))`
fn box_append(expr: &mut Expr, cx: &mut PassContext<'_>) {
    let pos = expr.pos;
    let runtime = cx.runtime_name();
    let mut call = expr.take();
    if let ExprKind::Call { args, ellipsis, .. } = &mut call.kind {
        if let Some(target) = args.first_mut() {
            deref_in_place(target, runtime);
        }
        if *ellipsis && args.len() > 1 {
            if let Some(spread) = args.last_mut() {
                if wants_deref(cx, spread) {
                    deref_in_place(spread, runtime);
                }
            }
        }
    }
    trace!(%pos, "append result re-boxed");
    *expr = cx.runtime_call(Helper::Ptr, Vec::new(), vec![call], pos);
}

/// The `append(*x, ..)` inside a result produced by [`box_append`].
fn boxed_append(cx: &PassContext<'_>, expr: &Expr) -> Option<Expr> {
    let boxed = match_helper_call(expr, cx.runtime_name())?;
    match boxed.args {
        [inner] if boxed.helper == Helper::Ptr && is_builtin_call(cx, inner, "append") => Some(inner.clone()),
        _ => None,
    }
}

/// The dereferenced target of an unboxed `append(*x, ..)`.
fn append_target(expr: &Expr) -> Option<Expr> {
    match &expr.kind {
        ExprKind::Call { args, .. } => args.first().cloned(),
        _ => None,
    }
}

/// Non-nil zero value for a variable declared with a slice, map, channel or
/// `str` type.
fn zero_reference(cx: &mut PassContext<'_>, ty: &Expr) -> Option<Expr> {
    let pos = ty.pos;
    let empty = |ty: Expr| {
        Expr::addr(Expr::new(
            ExprKind::CompositeLit {
                ty: Some(Box::new(ty)),
                elts: Vec::new(),
            },
            pos,
        ))
    };
    match &ty.unparen().kind {
        ExprKind::ArrayType { len: None, .. } | ExprKind::MapType { .. } => Some(empty(ty.clone())),
        ExprKind::ChanType {
            dir: ChanDir::Both,
            elem,
        } => {
            let elem = (**elem).clone();
            Some(cx.runtime_call(Helper::Chan, vec![elem], vec![Expr::int(0, pos)], pos))
        }
        _ if cx.tracker.descriptor_of_type_expr(ty).is_byte_string() => {
            let str_ty = cx.runtime_ref(Helper::Str, pos);
            Some(empty(str_ty))
        }
        _ => None,
    }
}

impl RewritePass for Pointerize {
    fn name(&self) -> &'static str {
        "pointerize"
    }

    fn description(&self) -> &'static str {
        "Wrap slice, map and channel values in pointers and dereference their uses"
    }

    fn exit_expr(&mut self, expr: &mut Expr, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        if is_growing_append(cx, expr) {
            box_append(expr, cx);
            return Ok(true);
        }

        let pos = expr.pos;
        let runtime = cx.runtime_name();
        match &mut expr.kind {
            ExprKind::CompositeLit { ty: Some(ty), elts } => match &ty.kind {
                ExprKind::ArrayType { len: None, .. } | ExprKind::MapType { .. } => {
                    let literal = expr.take();
                    *expr = Expr::addr(literal);
                    Ok(true)
                }
                ExprKind::ChanType { elem, .. } => {
                    if elts.len() > 1 {
                        return Err(TransformError::unsupported(
                            "a channel literal takes at most one element, its buffer size",
                            pos,
                        ));
                    }
                    let elem = (**elem).clone();
                    let size = elts.first().cloned().unwrap_or_else(|| Expr::int(0, pos));
                    trace!(%pos, "channel literal");
                    *expr = cx.runtime_call(Helper::Chan, vec![elem], vec![size], pos);
                    Ok(true)
                }
                _ => Ok(false),
            },
            // `&[]T{..}` written out already
            ExprKind::Unary {
                op: UnaryOp::Addr,
                operand,
            } if matches!(
                operand.kind,
                ExprKind::Unary {
                    op: UnaryOp::Addr,
                    ..
                }
            ) =>
            {
                let inner = operand.take();
                *expr = inner;
                Ok(true)
            }
            ExprKind::Unary {
                op: UnaryOp::Recv,
                operand,
            } => {
                if wants_deref(cx, operand) {
                    deref_in_place(operand, runtime);
                    return Ok(true);
                }
                Ok(false)
            }
            ExprKind::Index { base, .. } | ExprKind::Slice { base, .. } => {
                if wants_deref(cx, base) {
                    deref_in_place(base, runtime);
                    return Ok(true);
                }
                Ok(false)
            }
            ExprKind::Call { fun, args, .. } => {
                let Some(name) = fun.as_ident() else {
                    return Ok(false);
                };
                if !DEREF_FIRST_ARG.contains(&name) || cx.tracker.is_bound(name) {
                    return Ok(false);
                }
                match args.first_mut() {
                    Some(first) if wants_deref(cx, first) => {
                        deref_in_place(first, runtime);
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            }
            _ => Ok(false),
        }
    }

    fn exit_gen_decl(&mut self, decl: &mut GenDecl, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        if decl.kind != DeclKind::Var {
            return Ok(false);
        }
        let mut changed = false;
        for spec in &mut decl.specs {
            let Spec::Value(spec) = spec else {
                continue;
            };
            let Some(ty) = spec.ty.as_ref().filter(|_| spec.values.is_empty()) else {
                continue;
            };
            if let Some(zero) = zero_reference(cx, ty) {
                trace!(pos = %zero.pos, "zero value for reference variable");
                spec.values = vec![zero; spec.names.len()];
                changed = true;
            }
        }
        Ok(changed)
    }

    fn exit_stmt(&mut self, stmt: &mut Stmt, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        let pos = stmt.pos;
        let runtime = cx.runtime_name();
        match &mut stmt.kind {
            StmtKind::Send { chan: target, .. } | StmtKind::Range { target, .. } => {
                if wants_deref(cx, target) {
                    deref_in_place(target, runtime);
                    return Ok(true);
                }
                Ok(false)
            }
            // x = rt.Ptr(append(*x, ..))  =>  *x = append(*x, ..)
            StmtKind::Assign {
                lhs,
                op: AssignOp::Assign,
                rhs,
            } if lhs.len() == 1 && rhs.len() == 1 => {
                let Some(append) = boxed_append(cx, &rhs[0]) else {
                    return Ok(false);
                };
                if wants_deref(cx, &lhs[0]) {
                    deref_in_place(&mut lhs[0], runtime);
                } else if !is_deref(&lhs[0]) {
                    return Ok(false);
                }
                rhs[0] = append;
                Ok(true)
            }
            StmtKind::Expr(expr) => {
                // bare append(x, ..) grows x in place
                if let Some(append) = boxed_append(cx, expr) {
                    let Some(lhs) = append_target(&append) else {
                        return Ok(false);
                    };
                    *stmt = Stmt::new(
                        StmtKind::Assign {
                            lhs: vec![lhs],
                            op: AssignOp::Assign,
                            rhs: vec![append],
                        },
                        pos,
                    );
                    return Ok(true);
                }

                if !is_builtin_call(cx, expr, "clear") {
                    return Ok(false);
                }
                let Some(target) = first_arg_mut(expr) else {
                    return Ok(false);
                };
                if !wants_deref(cx, target) {
                    return Ok(false);
                }
                if cx.tracker.is_map_type(&cx.tracker.expr_type(target)) {
                    deref_in_place(target, runtime);
                    return Ok(true);
                }
                // clearing a slice or str truncates it: *x = (*x)[:0]
                let value = deref_value(target.clone(), runtime);
                let truncated = Expr::new(
                    ExprKind::Slice {
                        base: Box::new(value.clone()),
                        low: None,
                        high: Some(Box::new(Expr::int(0, pos))),
                        max: None,
                    },
                    pos,
                );
                *stmt = Stmt::new(
                    StmtKind::Assign {
                        lhs: vec![value],
                        op: AssignOp::Assign,
                        rhs: vec![truncated],
                    },
                    pos,
                );
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::transform::passes::test_support::run;

    fn pointerize(stmts: Vec<Stmt>) -> Vec<String> {
        let mut file = main_file(stmts);
        run(vec![Box::new(Pointerize)], &mut file).unwrap();
        body_source(&file, "main")
    }

    #[test]
    fn test_slice_literal_and_uses() {
        let out = pointerize(vec![
            define("xs", lit(slice_ty(ty("int")), vec![int(1), int(2)])),
            define("n", call_fn("len", vec![id("xs")])),
            assign(index(id("xs"), int(0)), int(3)),
            assign(id("xs"), call_fn("append", vec![id("xs"), int(4)])),
            define("ys", slice_expr(id("xs"), Some(int(1)), None)),
        ]);
        assert_eq!(
            out,
            vec![
                "xs := &[]int{1, 2}",
                "n := len(*xs)",
                "(*xs)[0] = 3",
                "*xs = append(*xs, 4)",
                "ys := (*xs)[1:]",
            ]
        );
    }

    #[test]
    fn test_map_operations() {
        let out = pointerize(vec![
            define(
                "m",
                lit(map_ty(ty("string"), ty("int")), vec![kv(string("a"), int(1))]),
            ),
            expr_stmt(call_fn("delete", vec![id("m"), string("a")])),
            expr_stmt(call_fn("clear", vec![id("m")])),
            define("v", index(id("m"), string("b"))),
        ]);
        assert_eq!(
            out,
            vec![
                r#"m := &map[string]int{"a": 1}"#,
                r#"delete(*m, "a")"#,
                "clear(*m)",
                r#"v := (*m)["b"]"#,
            ]
        );
    }

    #[test]
    fn test_channel_literal_and_operations() {
        let mut file = main_file(vec![
            define("ch", lit(chan_ty(ty("int")), vec![int(4)])),
            send(id("ch"), int(1)),
            define("v", recv(id("ch"))),
            expr_stmt(call_fn("close", vec![id("ch")])),
        ]);
        let (imports, _) = run(vec![Box::new(Pointerize)], &mut file).unwrap();
        assert_eq!(
            body_source(&file, "main"),
            vec!["ch := rt.Chan[int](4)", "*ch <- 1", "v := <-*ch", "close(*ch)"]
        );
        assert!(imports.contains("github.com/stratum-lang/stratum/rt"));
    }

    #[test]
    fn test_bare_append_and_clear_grow_in_place() {
        let out = pointerize(vec![
            define("xs", lit(slice_ty(ty("byte")), vec![])),
            expr_stmt(call_fn("append", vec![id("xs"), int(5)])),
            expr_stmt(call_fn("clear", vec![id("xs")])),
        ]);
        assert_eq!(
            out,
            vec![
                "xs := &[]byte{}",
                "*xs = append(*xs, 5)",
                "*xs = (*xs)[:0]"
            ]
        );
    }

    #[test]
    fn test_append_result_is_boxed_where_a_value_is_expected() {
        let mut file = file(vec![
            func(
                "grow",
                vec![field("xs", slice_ty(ty("int")))],
                vec![anon(slice_ty(ty("int")))],
                vec![ret(vec![call_fn("append", vec![id("xs"), int(1)])])],
            ),
            func(
                "main",
                vec![],
                vec![],
                vec![
                    define("xs", lit(slice_ty(ty("int")), vec![int(1)])),
                    define("ys", call_fn("append", vec![id("xs"), int(4)])),
                    expr_stmt(call_fn("consume", vec![call_fn("append", vec![id("ys"), int(5)])])),
                    define("n", call_fn("len", vec![call_fn("append", vec![id("ys"), int(6)])])),
                    assign(index(id("ys"), int(0)), int(7)),
                ],
            ),
        ]);
        let (imports, _) = run(vec![Box::new(Pointerize)], &mut file).unwrap();
        assert_eq!(body_source(&file, "grow"), vec!["return rt.Ptr(append(*xs, 1))"]);
        assert_eq!(
            body_source(&file, "main"),
            vec![
                "xs := &[]int{1}",
                "ys := rt.Ptr(append(*xs, 4))",
                "consume(rt.Ptr(append(*ys, 5)))",
                "n := len(append(*ys, 6))",
                "(*ys)[0] = 7",
            ]
        );
        assert!(imports.contains("github.com/stratum-lang/stratum/rt"));
    }

    #[test]
    fn test_append_spread_and_nested_append() {
        let out = pointerize(vec![
            define("xs", lit(slice_ty(ty("int")), vec![int(1)])),
            define("ys", lit(slice_ty(ty("int")), vec![int(2)])),
            assign(id("xs"), call_spread("append", vec![id("xs"), id("ys")])),
            define(
                "zs",
                call_fn("append", vec![call_fn("append", vec![id("xs"), int(3)]), int(4)]),
            ),
        ]);
        assert_eq!(
            out,
            vec![
                "xs := &[]int{1}",
                "ys := &[]int{2}",
                "*xs = append(*xs, *ys...)",
                "zs := rt.Ptr(append(append(*xs, 3), 4))",
            ]
        );
    }

    #[test]
    fn test_uninitialized_reference_variables_get_empty_values() {
        let out = pointerize(vec![
            decl_stmt(var("zs", Some(slice_ty(ty("int"))), None)),
            decl_stmt(var("m", Some(map_ty(ty("string"), ty("int"))), None)),
            decl_stmt(var("s", Some(ty("str")), None)),
            decl_stmt(var("ch", Some(chan_ty(ty("int"))), None)),
            decl_stmt(var("n", Some(ty("int")), None)),
            expr_stmt(call_fn("append", vec![id("zs"), int(1)])),
        ]);
        assert_eq!(
            out,
            vec![
                "var zs []int = &[]int{}",
                "var m map[string]int = &map[string]int{}",
                "var s str = &rt.Str{}",
                "var ch chan int = rt.Chan[int](0)",
                "var n int",
                "*zs = append(*zs, 1)",
            ]
        );
    }

    #[test]
    fn test_explicit_pointer_is_not_wrapped_twice() {
        let out = pointerize(vec![
            define("xs", Expr::addr(lit(slice_ty(ty("int")), vec![int(1)]))),
            define("n", call_fn("len", vec![Expr::deref(id("xs"))])),
        ]);
        assert_eq!(out, vec!["xs := &[]int{1}", "n := len(*xs)"]);
    }

    #[test]
    fn test_range_target_and_untracked_values() {
        let out = pointerize(vec![
            define("xs", lit(slice_ty(ty("int")), vec![int(1)])),
            range(Some("i"), Some("v"), id("xs"), vec![]),
            define("n", call_fn("len", vec![call(sel("pkg", "Load"), vec![])])),
        ]);
        assert!(out[1].starts_with("for i, v := range *xs {"));
        assert_eq!(out[2], "n := len(pkg.Load())");
    }

    #[test]
    fn test_shadowed_builtin_is_left_alone() {
        let out = pointerize(vec![
            define("xs", lit(slice_ty(ty("int")), vec![int(1)])),
            define("len", func_lit(vec![], vec![anon(ty("int"))], vec![ret(vec![int(0)])])),
            define("n", call_fn("len", vec![id("xs")])),
        ]);
        assert_eq!(out[2], "n := len(xs)");
    }

    #[test]
    fn test_channel_literal_with_two_elements_is_rejected() {
        let mut file = main_file(vec![define(
            "ch",
            lit(chan_ty(ty("int")), vec![int(1), int(2)]),
        )]);
        let err = run(vec![Box::new(Pointerize)], &mut file).unwrap_err();
        assert!(matches!(err, TransformError::UnsupportedConstruct { .. }));
    }
}
