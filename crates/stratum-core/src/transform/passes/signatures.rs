//! Signature lowering.
//!
//! Once values are pointer-wrapped their declared types must follow:
//! `[]T` becomes `*[]T`, `map[K]V` becomes `*map[K]V`, `chan T` becomes
//! `*chan T` and `str` becomes `*rt.Str`, at every level of nesting. A type
//! declaration's own right-hand side and a composite literal's outermost
//! type are not wrapped; the first names a value type and the second already
//! sits under the `&` added by pointerization.

use tracing::trace;

use crate::ast::{Expr, ExprKind, FuncType};
use crate::errors::TransformResult;
use crate::runtime::{match_helper_call, Helper};
use crate::transform::{PassContext, RewritePass, TypeRole};
use crate::types::BYTE_STRING;

pub struct SignatureLowering;

fn wrap_in_place(ty: &mut Expr) {
    let inner = ty.take();
    *ty = Expr::deref(inner);
}

/// Lower `ty` in place. `wrap` says whether a reference type at this level
/// becomes a pointer.
fn lower(ty: &mut Expr, wrap: bool, cx: &mut PassContext<'_>) -> bool {
    let pos = ty.pos;
    match &mut ty.kind {
        ExprKind::Ident(name) if name == BYTE_STRING && !cx.tracker.is_bound(BYTE_STRING) => {
            let runtime_str = cx.runtime_ref(Helper::Str, pos);
            *ty = if wrap {
                Expr::deref(runtime_str)
            } else {
                runtime_str
            };
            true
        }
        ExprKind::ArrayType { len, elem } => {
            let is_slice = len.is_none();
            let changed = lower(elem, true, cx);
            if is_slice && wrap {
                wrap_in_place(ty);
                return true;
            }
            changed
        }
        ExprKind::MapType { key, value } => {
            let key_changed = lower(key, true, cx);
            let value_changed = lower(value, true, cx);
            if wrap {
                wrap_in_place(ty);
                return true;
            }
            key_changed || value_changed
        }
        ExprKind::ChanType { elem, .. } => {
            let changed = lower(elem, true, cx);
            if wrap {
                wrap_in_place(ty);
                return true;
            }
            changed
        }
        // `*[]T` and `*str` are already the pointer spelling
        ExprKind::Star(inner) => {
            let already_wrapped = cx.tracker.descriptor_of_type_expr(inner).is_reference();
            lower(inner, !already_wrapped, cx)
        }
        ExprKind::Paren(inner) => lower(inner, wrap, cx),
        ExprKind::StructType(fields) | ExprKind::InterfaceType(fields) => {
            let mut changed = false;
            for field in fields {
                changed |= lower(&mut field.ty, true, cx);
            }
            changed
        }
        ExprKind::FuncType(func) => lower_signature(func, cx),
        ExprKind::Ellipsis(Some(elem)) => lower(elem, true, cx),
        // instantiated generic type
        ExprKind::Index { indices, .. } => {
            let mut changed = false;
            for arg in indices {
                changed |= lower(arg, true, cx);
            }
            changed
        }
        _ => false,
    }
}

fn lower_signature(func: &mut FuncType, cx: &mut PassContext<'_>) -> bool {
    let mut changed = false;
    for field in func.params.iter_mut().chain(func.results.iter_mut()) {
        changed |= lower(&mut field.ty, true, cx);
    }
    changed
}

impl RewritePass for SignatureLowering {
    fn name(&self) -> &'static str {
        "signatures"
    }

    fn description(&self) -> &'static str {
        "Pointer-wrap slice, map, channel and str types in declarations"
    }

    fn rewrite_type(
        &mut self,
        ty: &mut Expr,
        role: TypeRole,
        cx: &mut PassContext<'_>,
    ) -> TransformResult<bool> {
        let changed = match role {
            TypeRole::Declared => lower(ty, true, cx),
            TypeRole::TypeSpec | TypeRole::Literal => lower(ty, false, cx),
        };
        if changed {
            trace!(pos = %ty.pos, ?role, "lowered type");
        }
        Ok(changed)
    }

    /// Type arguments of runtime helpers are element types, so they lower
    /// like any nested type.
    fn exit_expr(&mut self, expr: &mut Expr, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        let has_type_args = matches!(
            match_helper_call(expr, cx.runtime_name()),
            Some(call) if !call.type_args.is_empty()
        );
        if !has_type_args {
            return Ok(false);
        }
        let ExprKind::Call { fun, .. } = &mut expr.kind else {
            return Ok(false);
        };
        let ExprKind::Index { indices, .. } = &mut fun.kind else {
            return Ok(false);
        };
        let mut changed = false;
        for arg in indices {
            changed |= lower(arg, true, cx);
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::ast::{Decl, File, ToSource};
    use crate::transform::passes::{test_support::run, Pointerize};

    fn lower_file(mut file: File) -> File {
        run(vec![Box::new(Pointerize), Box::new(SignatureLowering)], &mut file).unwrap();
        file
    }

    fn header(file: &File, index: usize) -> String {
        match &file.decls[index] {
            Decl::Func(func) => func.to_source().lines().next().unwrap_or_default().to_string(),
            Decl::Gen(decl) => decl.to_source(),
        }
    }

    #[test]
    fn test_function_signature() {
        let file = lower_file(file(vec![func(
            "join",
            vec![field("parts", slice_ty(ty("str"))), field("sep", ty("str"))],
            vec![anon(ty("str"))],
            vec![ret(vec![id("sep")])],
        )]));
        assert_eq!(
            header(&file, 0),
            "func join(parts *[]*rt.Str, sep *rt.Str) *rt.Str {"
        );
    }

    #[test]
    fn test_type_declarations() {
        let file = lower_file(file(vec![
            Decl::Gen(type_decl(
                "Config",
                struct_ty(vec![
                    field("Tags", slice_ty(ty("string"))),
                    field("Index", map_ty(ty("string"), ty("int"))),
                    field("Name", ty("str")),
                    field("Next", ptr_ty(ty("Config"))),
                ]),
            )),
            Decl::Gen(type_decl("Buf", slice_ty(ty("byte")))),
            Decl::Gen(type_decl("Text", ty("str"))),
        ]));
        assert_eq!(
            header(&file, 0),
            "type Config struct { Tags *[]string; Index *map[string]int; Name *rt.Str; Next *Config }"
        );
        assert_eq!(header(&file, 1), "type Buf []byte");
        assert_eq!(header(&file, 2), "type Text rt.Str");
    }

    #[test]
    fn test_variables_and_literals() {
        let file = lower_file(main_file(vec![
            decl_stmt(var("names", Some(slice_ty(ty("str"))), None)),
            decl_stmt(var("events", Some(chan_ty(ty("int"))), None)),
            define(
                "grid",
                lit(
                    slice_ty(slice_ty(ty("int"))),
                    vec![elided(vec![int(1)])],
                ),
            ),
            define(
                "groups",
                lit(map_ty(ty("string"), slice_ty(ty("int"))), vec![]),
            ),
            define("fixed", lit(array_ty(2, ty("str")), vec![])),
        ]));
        assert_eq!(
            body_source(&file, "main"),
            vec![
                "var names *[]*rt.Str = &[]*rt.Str{}",
                "var events *chan int = rt.Chan[int](0)",
                "grid := &[]*[]int{{1}}",
                "groups := &map[string]*[]int{}",
                "fixed := [2]*rt.Str{}",
            ]
        );
    }

    #[test]
    fn test_existing_pointers_are_not_wrapped_again() {
        let file = lower_file(file(vec![func(
            "fill",
            vec![field("xs", ptr_ty(slice_ty(ty("int")))), field("p", ptr_ty(ty("Point")))],
            vec![],
            vec![],
        )]));
        assert_eq!(header(&file, 0), "func fill(xs *[]int, p *Point) {");
    }

    #[test]
    fn test_helper_type_arguments() {
        let mut file = main_file(vec![
            define(
                "c",
                Helper::Chan.call("rt", vec![ty("str")], vec![int(0)], Default::default()),
            ),
            define(
                "d",
                Helper::CloneSlice.call("rt", vec![slice_ty(ty("int"))], vec![id("xss")], Default::default()),
            ),
        ]);
        let (imports, _) = run(vec![Box::new(SignatureLowering)], &mut file).unwrap();
        assert_eq!(
            body_source(&file, "main"),
            vec!["c := rt.Chan[*rt.Str](0)", "d := rt.CloneSlice[*[]int](xss)"]
        );
        assert!(imports.contains("github.com/stratum-lang/stratum/rt"));
    }

    #[test]
    fn test_func_literal_and_assertion_types() {
        let file = lower_file(main_file(vec![
            define(
                "f",
                func_lit(vec![field("m", map_ty(ty("string"), ty("str")))], vec![], vec![]),
            ),
            define(
                "v",
                Expr::new(
                    ExprKind::TypeAssert {
                        base: Box::new(id("x")),
                        ty: Some(Box::new(slice_ty(ty("int")))),
                    },
                    Default::default(),
                ),
            ),
        ]));
        let out = body_source(&file, "main");
        assert!(out[0].starts_with("f := func(m *map[string]*rt.Str) {"));
        assert_eq!(out[1], "v := x.(*[]int)");
    }
}
