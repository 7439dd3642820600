/*!
# Runtime Helper Library surface

Lowered code calls into a small runtime package (`rt` by default) and, for
foreign-library loading, into `rt/ffi`. This module is the catalogue of that
surface: the helper names the passes emit and recognise, and how a helper
call is spelled in the tree. The `coerce` submodule is a reference model of
the reinterpretation helper's contract.
*/

pub mod coerce;

pub use coerce::{ElementKind, Endianness};

use crate::ast::{Expr, ExprKind, Pos};

/// Functions, types and values exported by the runtime package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Helper {
    /// `StrConcat(a, b *Str) *Str`
    StrConcat,
    /// `StrFrom(s string) *Str`
    StrFrom,
    /// `Concat[T](a, b *[]T) *[]T`
    Concat,
    CloneSlice,
    CloneMap,
    CopySlice,
    CopyMap,
    GrowSlice,
    GrowMap,
    FreeSlice,
    FreeMap,
    /// Reflective fallbacks; recurse through pointers, structs, slices, maps
    /// and arrays, copying scalars directly.
    DeepCopy,
    DeepCopyInto,
    Grow,
    Free,
    /// `Coerce[S, U](s *[]S, e Endian) *[]U`
    Coerce,
    /// `Chan[T](size int) *chan T`
    Chan,
    /// `Ptr[T](v T) *T`; re-boxes a value produced from a dereference.
    Ptr,
    /// `type Str []byte`
    Str,
    LittleEndian,
    BigEndian,
    NativeEndian,
}

impl Helper {
    pub const ALL: [Helper; 22] = [
        Helper::StrConcat,
        Helper::StrFrom,
        Helper::Concat,
        Helper::CloneSlice,
        Helper::CloneMap,
        Helper::CopySlice,
        Helper::CopyMap,
        Helper::GrowSlice,
        Helper::GrowMap,
        Helper::FreeSlice,
        Helper::FreeMap,
        Helper::DeepCopy,
        Helper::DeepCopyInto,
        Helper::Grow,
        Helper::Free,
        Helper::Coerce,
        Helper::Chan,
        Helper::Ptr,
        Helper::Str,
        Helper::LittleEndian,
        Helper::BigEndian,
        Helper::NativeEndian,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Helper::StrConcat => "StrConcat",
            Helper::StrFrom => "StrFrom",
            Helper::Concat => "Concat",
            Helper::CloneSlice => "CloneSlice",
            Helper::CloneMap => "CloneMap",
            Helper::CopySlice => "CopySlice",
            Helper::CopyMap => "CopyMap",
            Helper::GrowSlice => "GrowSlice",
            Helper::GrowMap => "GrowMap",
            Helper::FreeSlice => "FreeSlice",
            Helper::FreeMap => "FreeMap",
            Helper::DeepCopy => "DeepCopy",
            Helper::DeepCopyInto => "DeepCopyInto",
            Helper::Grow => "Grow",
            Helper::Free => "Free",
            Helper::Coerce => "Coerce",
            Helper::Chan => "Chan",
            Helper::Ptr => "Ptr",
            Helper::Str => "Str",
            Helper::LittleEndian => "LittleEndian",
            Helper::BigEndian => "BigEndian",
            Helper::NativeEndian => "NativeEndian",
        }
    }

    pub fn from_name(name: &str) -> Option<Helper> {
        Helper::ALL.iter().copied().find(|helper| helper.name() == name)
    }

    /// `pkg.Name`
    pub fn reference(&self, pkg: &str, pos: Pos) -> Expr {
        Expr::qualified(pkg, self.name(), pos)
    }

    /// `pkg.Name[type_args...](args...)`
    pub fn call(&self, pkg: &str, type_args: Vec<Expr>, args: Vec<Expr>, pos: Pos) -> Expr {
        let fun = Expr::instantiate(self.reference(pkg, pos), type_args);
        let mut call = Expr::call(fun, args);
        call.pos = pos;
        call
    }
}

/// Foreign-library built-ins and their `ffi` equivalents.
pub const FFI_FUNCTIONS: &[(&str, &str)] = &[
    ("dlopen", "Open"),
    ("dlsym", "Sym"),
    ("dlclose", "Close"),
    ("dlerror", "Error"),
];

/// Load flags; they keep their names inside the `ffi` package.
pub const FFI_FLAGS: &[&str] = &["RTLD_LAZY", "RTLD_NOW", "RTLD_GLOBAL", "RTLD_LOCAL"];

pub fn ffi_function(builtin: &str) -> Option<&'static str> {
    FFI_FUNCTIONS
        .iter()
        .find(|(name, _)| *name == builtin)
        .map(|(_, lowered)| *lowered)
}

pub fn is_ffi_flag(name: &str) -> bool {
    FFI_FLAGS.contains(&name)
}

/// A call to a runtime helper found in the tree.
#[derive(Debug, Clone, Copy)]
pub struct HelperCall<'a> {
    pub helper: Helper,
    pub type_args: &'a [Expr],
    pub args: &'a [Expr],
}

/// Recognise `pkg.Helper(...)` and `pkg.Helper[T...](...)` where `pkg` is the
/// runtime package name.
pub fn match_helper_call<'a>(expr: &'a Expr, runtime: &str) -> Option<HelperCall<'a>> {
    let ExprKind::Call { fun, args, .. } = &expr.unparen().kind else {
        return None;
    };
    let (callee, type_args) = match &fun.kind {
        ExprKind::Index { base, indices } => (base.as_ref(), indices.as_slice()),
        _ => (fun.as_ref(), &[][..]),
    };
    let (pkg, name) = callee.as_qualified()?;
    if pkg != runtime {
        return None;
    }
    Some(HelperCall {
        helper: Helper::from_name(name)?,
        type_args,
        args,
    })
}
