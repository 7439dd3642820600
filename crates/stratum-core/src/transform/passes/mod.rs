//! Lowering passes, in the order the pipeline runs them.

pub mod builtins;
pub mod coerce;
pub mod compare;
pub mod concat;
pub mod constants;
pub mod exemption;
pub mod ffi;
pub mod literalize;
pub mod pointerize;
pub mod reject_make;
pub mod signatures;

pub use builtins::GenericBuiltins;
pub use coerce::CoerceLowering;
pub use compare::CompareLowering;
pub use concat::ConcatLowering;
pub use constants::ConstDemotion;
pub use ffi::ForeignLibrary;
pub use literalize::StringLiterals;
pub use pointerize::Pointerize;
pub use reject_make::RejectMake;
pub use signatures::SignatureLowering;

use crate::ast::{Expr, ExprKind, UnaryOp};
use crate::runtime::{match_helper_call, Helper};

use super::rules::RewritePass;

/// The full pipeline. String-literal exemption is not a traversal of its own;
/// it is consulted by `StringLiterals`.
pub fn default_passes() -> Vec<Box<dyn RewritePass>> {
    vec![
        Box::new(Pointerize),
        Box::new(RejectMake),
        Box::new(StringLiterals),
        Box::new(ConcatLowering),
        Box::new(CompareLowering),
        Box::new(GenericBuiltins),
        Box::new(CoerceLowering),
        Box::new(ForeignLibrary),
        Box::new(SignatureLowering),
        Box::new(ConstDemotion),
    ]
}

/// `*expr`, folding `*&x` and `*rt.Ptr(x)` to `x`.
pub(crate) fn deref_value(expr: Expr, runtime: &str) -> Expr {
    if let Some(boxed) = match_helper_call(&expr, runtime) {
        if boxed.helper == Helper::Ptr && boxed.args.len() == 1 {
            return boxed.args[0].clone();
        }
    }
    match expr.kind {
        ExprKind::Unary {
            op: UnaryOp::Addr,
            operand,
        } => *operand,
        kind => Expr::deref(Expr::new(kind, expr.pos)),
    }
}

/// Whether `expr` is already an explicit dereference.
pub(crate) fn is_deref(expr: &Expr) -> bool {
    matches!(expr.unparen().kind, ExprKind::Star(_))
}

/// The callee's name when `expr` is a call to a plain identifier.
pub(crate) fn call_name(expr: &Expr) -> Option<&str> {
    match &expr.kind {
        ExprKind::Call { fun, .. } => fun.as_ident(),
        _ => None,
    }
}
