//! Generic memory built-ins.
//!
//! `clone`, `copy`, `grow` and `free` dispatch on the type of their first
//! argument: slices and maps get the monomorphic runtime helper, anything
//! else goes through the reflective one.

use tracing::{trace, warn};

use crate::ast::{Expr, ExprKind, Pos};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::errors::TransformResult;
use crate::runtime::Helper;
use crate::transform::{PassContext, RewritePass};
use crate::types::TypeDescriptor;

pub struct GenericBuiltins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Clone,
    Copy,
    Grow,
    Free,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "clone" => Some(Builtin::Clone),
            "copy" => Some(Builtin::Copy),
            "grow" => Some(Builtin::Grow),
            "free" => Some(Builtin::Free),
            _ => None,
        }
    }

    fn slice_helper(self) -> Helper {
        match self {
            Builtin::Clone => Helper::CloneSlice,
            Builtin::Copy => Helper::CopySlice,
            Builtin::Grow => Helper::GrowSlice,
            Builtin::Free => Helper::FreeSlice,
        }
    }

    fn map_helper(self) -> Helper {
        match self {
            Builtin::Clone => Helper::CloneMap,
            Builtin::Copy => Helper::CopyMap,
            Builtin::Grow => Helper::GrowMap,
            Builtin::Free => Helper::FreeMap,
        }
    }

    fn reflective_helper(self) -> Helper {
        match self {
            Builtin::Clone => Helper::DeepCopy,
            Builtin::Copy => Helper::DeepCopyInto,
            Builtin::Grow => Helper::Grow,
            Builtin::Free => Helper::Free,
        }
    }
}

/// Monomorphic helper and its type arguments for `ty`, if there is one.
fn specialise(
    builtin: Builtin,
    ty: &TypeDescriptor,
    cx: &PassContext<'_>,
    pos: Pos,
) -> Option<(Helper, Vec<Expr>)> {
    match ty {
        TypeDescriptor::Slice(elem) => Some((builtin.slice_helper(), vec![cx.type_arg(elem, pos)?])),
        TypeDescriptor::Map(key, value) => Some((
            builtin.map_helper(),
            vec![cx.type_arg(key, pos)?, cx.type_arg(value, pos)?],
        )),
        _ => None,
    }
}

impl RewritePass for GenericBuiltins {
    fn name(&self) -> &'static str {
        "generic-builtins"
    }

    fn description(&self) -> &'static str {
        "Dispatch clone, copy, grow and free to type-specific runtime helpers"
    }

    fn exit_expr(&mut self, expr: &mut Expr, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        let ExprKind::Call { fun, args, .. } = &expr.kind else {
            return Ok(false);
        };
        let Some(name) = fun.as_ident() else {
            return Ok(false);
        };
        let Some(builtin) = Builtin::from_name(name) else {
            return Ok(false);
        };
        if cx.tracker.is_bound(name) {
            return Ok(false);
        }
        let Some(first) = args.first() else {
            return Ok(false);
        };

        let pos = expr.pos;
        let ty = cx.tracker.expr_type(first);
        let (helper, type_args) = match specialise(builtin, &ty, cx, pos) {
            Some(specialised) => specialised,
            None => {
                if ty.is_unknown() && cx.config.warn_reflective_fallback {
                    let message = format!(
                        "type of the argument to {name} is not known; using the reflective {}",
                        builtin.reflective_helper().name()
                    );
                    warn!(%pos, "{message}");
                    cx.report(Diagnostic::new(DiagnosticKind::ReflectiveFallback, message, pos));
                }
                (builtin.reflective_helper(), Vec::new())
            }
        };

        let ExprKind::Call { args, .. } = expr.take().kind else {
            return Ok(false);
        };
        trace!(%pos, helper = helper.name(), %ty, "generic built-in");
        *expr = cx.runtime_call(helper, type_args, args, pos);
        Ok(true)
    }
}
