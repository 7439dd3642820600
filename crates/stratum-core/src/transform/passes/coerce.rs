//! Zero-copy slice reinterpretation.
//!
//! `[]U(src)` and `[]U(src, Tag)` over a slice or `str` source lower to
//! `rt.Coerce[S, U](src, rt.Tag)`. Conversions whose source is a base-language
//! string or a named value type are ordinary conversions and stay as written.

use tracing::trace;

use crate::ast::{Expr, ExprKind, Pos, ToSource};
use crate::errors::{TransformError, TransformResult};
use crate::runtime::{ElementKind, Endianness, Helper};
use crate::transform::{PassContext, RewritePass};
use crate::types::TypeDescriptor;

pub struct CoerceLowering;

/// `Tag` or `rt.Tag`
fn endianness_of(tag: &Expr, runtime: &str) -> Option<Endianness> {
    match tag.unparen().as_qualified() {
        Some((pkg, name)) if pkg == runtime => Endianness::from_tag(name),
        Some(_) => None,
        None => tag.unparen().as_ident().and_then(Endianness::from_tag),
    }
}

fn tag_helper(order: Endianness) -> Helper {
    match order {
        Endianness::Little => Helper::LittleEndian,
        Endianness::Big => Helper::BigEndian,
        Endianness::Native => Helper::NativeEndian,
    }
}

fn fixed_width(ty: &TypeDescriptor) -> bool {
    matches!(ty, TypeDescriptor::Primitive(name) if ElementKind::from_type_name(name).is_some())
}

/// `(*[]byte)(src)`: a `*rt.Str` viewed as the byte slice it wraps.
fn byte_slice_view(src: Expr, pos: Pos) -> Expr {
    let ty = Expr::deref(Expr::slice_of(Expr::ident("byte", pos)));
    Expr::call(ty, vec![src])
}

impl RewritePass for CoerceLowering {
    fn name(&self) -> &'static str {
        "coerce"
    }

    fn description(&self) -> &'static str {
        "Lower []U(src, Endian) reinterpretations to the runtime's Coerce helper"
    }

    fn exit_expr(&mut self, expr: &mut Expr, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        let ExprKind::Call { fun, args, .. } = &expr.kind else {
            return Ok(false);
        };
        let ExprKind::ArrayType {
            len: None,
            elem: target,
        } = &fun.unparen().kind
        else {
            return Ok(false);
        };
        let pos = expr.pos;
        let (src, tag) = match args.as_slice() {
            [src] => (src, None),
            [src, tag] => (src, Some(tag)),
            _ => {
                return Err(TransformError::unsupported(
                    format!(
                        "{} takes a source slice and an optional endianness tag",
                        fun.to_source()
                    ),
                    pos,
                ))
            }
        };

        let order = match tag {
            None => Endianness::Native,
            Some(tag) => endianness_of(tag, cx.runtime_name()).ok_or_else(|| {
                TransformError::unsupported(
                    format!(
                        "unknown endianness {}; expected LittleEndian, BigEndian or NativeEndian",
                        tag.to_source()
                    ),
                    tag.pos,
                )
            })?,
        };

        let src_ty = cx.tracker.expr_type(src);
        let (elem, through_str) = match &src_ty {
            TypeDescriptor::Slice(elem) => ((**elem).clone(), false),
            ty if ty.is_byte_string() => (TypeDescriptor::primitive("byte"), true),
            TypeDescriptor::Unknown => {
                return Err(TransformError::unresolved(
                    format!(
                        "cannot determine the element type of `{}` in {}",
                        src.to_source(),
                        expr.to_source()
                    ),
                    pos,
                ))
            }
            // a plain conversion
            _ if tag.is_none() => return Ok(false),
            other => {
                return Err(TransformError::unsupported(
                    format!("cannot reinterpret a value of type {other} as {}", fun.to_source()),
                    pos,
                ))
            }
        };

        let target_ty = cx.tracker.descriptor_of_type_expr(target);
        if tag.is_some() && order != Endianness::Native && !(fixed_width(&elem) && fixed_width(&target_ty)) {
            return Err(TransformError::unsupported(
                format!(
                    "{} reinterpretation needs fixed-width numeric element types, not {elem} and {target_ty}",
                    order.tag()
                ),
                pos,
            ));
        }
        let Some(src_arg) = cx.type_arg(&elem, pos) else {
            return Err(TransformError::unresolved(
                format!("element type {elem} of `{}` is not fully known", src.to_source()),
                pos,
            ));
        };
        let dst_arg = (**target).clone();

        let ExprKind::Call { mut args, .. } = expr.take().kind else {
            return Ok(false);
        };
        args.truncate(1);
        let mut source = args.pop().unwrap_or_else(|| Expr::ident("_", pos));
        if through_str {
            source = byte_slice_view(source, pos);
        }
        let order_arg = cx.runtime_ref(tag_helper(order), pos);
        trace!(%pos, src = %elem, dst = %target_ty, order = order.tag(), "coercion");
        *expr = cx.runtime_call(Helper::Coerce, vec![src_arg, dst_arg], vec![source, order_arg], pos);
        Ok(true)
    }
}
