//! Syntactic type model used to drive type-directed lowering.
//!
//! Types are never inferred the way the base compiler infers them; they are
//! read off declarations, literals and the shapes produced by earlier passes.
//! Whatever cannot be seen that way is [`TypeDescriptor::Unknown`].

pub mod tracker;

pub use tracker::TypeTracker;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{ChanDir, Expr, ExprKind, Pos};

/// Name of Stratum's mutable byte-backed string type.
pub const BYTE_STRING: &str = "str";

const PRIMITIVES: &[&str] = &[
    "bool", "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32",
    "uint64", "uintptr", "byte", "rune", "float32", "float64", "complex64", "complex128", "error",
    "any", BYTE_STRING,
];

pub fn is_primitive_name(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDescriptor {
    Primitive(String),
    Pointer(Box<TypeDescriptor>),
    Slice(Box<TypeDescriptor>),
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Chan(Box<TypeDescriptor>),
    /// Declared or imported type, or any type spelled in a form the tracker
    /// does not model (arrays, function types); the name is its spelling.
    Named(String),
    Unknown,
}

impl Default for TypeDescriptor {
    fn default() -> Self {
        TypeDescriptor::Unknown
    }
}

impl TypeDescriptor {
    pub fn primitive(name: &str) -> Self {
        Self::Primitive(name.to_string())
    }

    pub fn byte_string() -> Self {
        Self::Primitive(BYTE_STRING.to_string())
    }

    pub fn slice(elem: TypeDescriptor) -> Self {
        Self::Slice(Box::new(elem))
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    pub fn pointer(inner: TypeDescriptor) -> Self {
        Self::Pointer(Box::new(inner))
    }

    pub fn chan(elem: TypeDescriptor) -> Self {
        Self::Chan(Box::new(elem))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeDescriptor::Unknown)
    }

    pub fn is_known(&self) -> bool {
        !self.is_unknown()
    }

    pub fn is_byte_string(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive(name) if name == BYTE_STRING)
    }

    /// Slice, map, channel and `str` values are pointer-wrapped once lowered.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Slice(_) | TypeDescriptor::Map(..) | TypeDescriptor::Chan(_)
        ) || self.is_byte_string()
    }

    /// Pick `other` when `self` carries no information.
    pub fn or(self, other: TypeDescriptor) -> TypeDescriptor {
        if self.is_unknown() {
            other
        } else {
            self
        }
    }

    /// Render as a dialect type expression, e.g. for a helper's type argument.
    pub fn to_type_expr(&self, pos: Pos) -> Option<Expr> {
        let kind = match self {
            TypeDescriptor::Unknown => return None,
            TypeDescriptor::Primitive(name) => ExprKind::Ident(name.clone()),
            TypeDescriptor::Named(name) => match name.split_once('.') {
                Some((pkg, sel)) if !pkg.is_empty() && !sel.contains(|c: char| matches!(c, '.' | '[' | ' ')) => {
                    return Some(Expr::qualified(pkg, sel, pos));
                }
                _ => ExprKind::Ident(name.clone()),
            },
            TypeDescriptor::Pointer(inner) => ExprKind::Star(Box::new(inner.to_type_expr(pos)?)),
            TypeDescriptor::Slice(elem) => ExprKind::ArrayType {
                len: None,
                elem: Box::new(elem.to_type_expr(pos)?),
            },
            TypeDescriptor::Map(key, value) => ExprKind::MapType {
                key: Box::new(key.to_type_expr(pos)?),
                value: Box::new(value.to_type_expr(pos)?),
            },
            TypeDescriptor::Chan(elem) => ExprKind::ChanType {
                dir: ChanDir::Both,
                elem: Box::new(elem.to_type_expr(pos)?),
            },
        };
        Some(Expr::new(kind, pos))
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(name) | TypeDescriptor::Named(name) => write!(f, "{name}"),
            TypeDescriptor::Pointer(inner) => write!(f, "*{inner}"),
            TypeDescriptor::Slice(elem) => write!(f, "[]{elem}"),
            TypeDescriptor::Map(key, value) => write!(f, "map[{key}]{value}"),
            TypeDescriptor::Chan(elem) => write!(f, "chan {elem}"),
            TypeDescriptor::Unknown => write!(f, "<unknown>"),
        }
    }
}
