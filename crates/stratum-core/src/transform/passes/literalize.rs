//! String literalization.
//!
//! A string literal in value position becomes a pointer to a byte-backed
//! runtime string, `&rt.Str{0x68, 0x69}`. Literals whose position expects
//! some other type, and constant initializers, are left as they are.

use tracing::trace;

use crate::ast::{Expr, ExprKind, LitKind, Pos, UnaryOp};
use crate::errors::{TransformError, TransformResult};
use crate::runtime::Helper;
use crate::transform::{PassContext, RewritePass};

use super::exemption::is_exempt;

pub struct StringLiterals;

/// Bytes of a string literal, decoded the way the base language decodes it.
/// `literal` includes its quotes; `None` if it is malformed.
pub fn decode_string_literal(literal: &str) -> Option<Vec<u8>> {
    if let Some(raw) = literal
        .strip_prefix('`')
        .and_then(|rest| rest.strip_suffix('`'))
    {
        // carriage returns are discarded from raw strings
        return Some(raw.bytes().filter(|&b| b != b'\r').collect());
    }

    let body = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let escape = chars.next()?;
        match escape {
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'v' => out.push(0x0b),
            '\\' => out.push(b'\\'),
            '"' => out.push(b'"'),
            '0'..='7' => {
                let mut value = escape.to_digit(8)?;
                for _ in 0..2 {
                    value = value * 8 + chars.next()?.to_digit(8)?;
                }
                out.push(u8::try_from(value).ok()?);
            }
            'x' => out.push(u8::try_from(hex_digits(&mut chars, 2)?).ok()?),
            'u' | 'U' => {
                let width = if escape == 'u' { 4 } else { 8 };
                let c = char::from_u32(hex_digits(&mut chars, width)?)?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            _ => return None,
        }
    }
    Some(out)
}

fn hex_digits(chars: &mut std::str::Chars<'_>, count: usize) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..count {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

fn byte_lit(byte: u8, pos: Pos) -> Expr {
    Expr::new(
        ExprKind::BasicLit {
            kind: LitKind::Int,
            value: format!("{byte:#04x}"),
        },
        pos,
    )
}

impl RewritePass for StringLiterals {
    fn name(&self) -> &'static str {
        "string-literals"
    }

    fn description(&self) -> &'static str {
        "Turn string literals into pointers to runtime byte strings"
    }

    fn exit_expr(&mut self, expr: &mut Expr, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        let pos = expr.pos;
        match &mut expr.kind {
            ExprKind::BasicLit {
                kind: LitKind::String,
                value,
            } => {
                if is_exempt(&cx.slot, &cx.tracker) {
                    return Ok(false);
                }
                let Some(bytes) = decode_string_literal(value) else {
                    return Err(TransformError::unsupported(
                        format!("malformed string literal {value}"),
                        pos,
                    ));
                };
                trace!(%pos, len = bytes.len(), "string literal");
                let ty = cx.runtime_ref(Helper::Str, pos);
                let elts = bytes.into_iter().map(|b| byte_lit(b, pos)).collect();
                *expr = Expr::addr(Expr::new(
                    ExprKind::CompositeLit {
                        ty: Some(Box::new(ty)),
                        elts,
                    },
                    pos,
                ));
                Ok(true)
            }
            // `len(*"ab")` leaves `*&rt.Str{..}` behind
            ExprKind::Star(inner)
                if matches!(
                    inner.kind,
                    ExprKind::Unary {
                        op: UnaryOp::Addr,
                        ..
                    }
                ) =>
            {
                let ExprKind::Unary { operand, .. } = inner.take().kind else {
                    return Ok(false);
                };
                *expr = *operand;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
