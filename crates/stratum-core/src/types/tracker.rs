/*!
# Type Tracker

Per-file table of the statically apparent type of every bound name.

Bindings live in a stack of lexical scopes: the walker pushes a scope for
every block, function body and statement header, so a name declared in an
inner block shadows an outer one only until that block ends. File-level
declarations sit in the bottom scope and survive every pass over the file.

Queries never fail. Anything the tracker cannot see resolves to
[`TypeDescriptor::Unknown`] and the caller decides whether that is fatal.
*/

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::trace;

use super::{is_primitive_name, TypeDescriptor, BYTE_STRING};
use crate::ast::{
    BinaryOp, Expr, ExprKind, FuncDecl, Ident, LitKind, ToSource, TypeSpec, UnaryOp,
};
use crate::runtime::{match_helper_call, Helper};

/// Built-ins whose result type follows the type of their first argument.
const SAME_TYPE_BUILTINS: &[&str] = &["append", "clone", "grow"];

/// Guard against cyclic local type declarations (`type A B; type B A`).
const MAX_NAMED_RESOLUTION: usize = 16;

#[derive(Debug, Clone, Default)]
struct NamedType {
    underlying: TypeDescriptor,
    fields: IndexMap<String, TypeDescriptor>,
    is_struct: bool,
}

#[derive(Debug, Clone)]
pub struct TypeTracker {
    scopes: Vec<IndexMap<String, TypeDescriptor>>,
    named: HashMap<String, NamedType>,
    functions: HashMap<String, Vec<TypeDescriptor>>,
    runtime: String,
}

impl Default for TypeTracker {
    fn default() -> Self {
        Self::new("rt")
    }
}

impl TypeTracker {
    /// `runtime` is the name lowered code uses for the runtime package; it is
    /// needed to read types back out of helper calls made by earlier passes.
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            scopes: vec![IndexMap::new()],
            named: HashMap::new(),
            functions: HashMap::new(),
            runtime: runtime.into(),
        }
    }

    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    /// Pop the innermost scope. The file scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn declare(&mut self, name: &str, ty: TypeDescriptor) {
        if name == "_" {
            return;
        }
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        match scope.get_mut(name) {
            // widening favours the most specific type seen so far
            Some(existing) if ty.is_unknown() => {
                trace!(binding = name, kept = %existing, "keeping known type over unknown redeclaration");
            }
            Some(existing) => *existing = ty,
            None => {
                scope.insert(name.to_string(), ty);
            }
        }
    }

    /// Record `names` declared with an optional type and initializers.
    pub fn record_declaration(&mut self, names: &[Ident], declared: Option<&Expr>, values: &[Expr]) {
        let types = match declared {
            Some(ty) => vec![self.descriptor_of_type_expr(ty); names.len()],
            None => self.value_types(names.len(), values),
        };
        for (name, ty) in names.iter().zip(types) {
            trace!(name = %name.name, ty = %ty, "declare");
            self.declare(&name.name, ty);
        }
    }

    /// Record a declaration whose type is already known (parameters,
    /// range variables).
    pub fn record_typed(&mut self, name: &str, ty: TypeDescriptor) {
        self.declare(name, ty);
    }

    /// Record `lhs = rhs`. Only plain identifier targets carry bindings; an
    /// `Unknown` right-hand side never erases a known type.
    pub fn record_assignment(&mut self, lhs: &[Expr], rhs: &[Expr]) {
        let types = self.value_types(lhs.len(), rhs);
        for (target, ty) in lhs.iter().zip(types) {
            let Some(name) = target.unparen().as_ident() else {
                continue;
            };
            if name == "_" {
                continue;
            }
            let scope = self
                .scopes
                .iter_mut()
                .rev()
                .find(|scope| scope.contains_key(name));
            match scope {
                Some(scope) => {
                    if ty.is_known() {
                        scope.insert(name.to_string(), ty);
                    }
                }
                // assignment to a package-level name declared in another file
                None => {
                    if ty.is_known() {
                        self.scopes[0].insert(name.to_string(), ty);
                    }
                }
            }
        }
    }

    fn value_types(&self, count: usize, values: &[Expr]) -> Vec<TypeDescriptor> {
        if values.len() == count {
            return values.iter().map(|value| self.expr_type(value)).collect();
        }
        // `a, b := f()` and `v, ok := m[k]`
        if let [single] = values {
            if let ExprKind::Call { fun, .. } = &single.unparen().kind {
                if let Some(results) = fun.as_ident().and_then(|name| self.functions.get(name)) {
                    let mut types = results.clone();
                    types.resize(count, TypeDescriptor::Unknown);
                    return types;
                }
            }
            if let ExprKind::Index { .. } | ExprKind::TypeAssert { .. } = &single.unparen().kind {
                let mut types = vec![self.expr_type(single)];
                types.resize(count, TypeDescriptor::primitive("bool"));
                return types;
            }
        }
        vec![TypeDescriptor::Unknown; count]
    }

    /// Most recent binding of `name`, innermost scope first.
    pub fn type_of(&self, name: &str) -> TypeDescriptor {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
            .unwrap_or(TypeDescriptor::Unknown)
    }

    /// Whether `name` is declared in the file (shadowing a built-in of the
    /// same name).
    pub fn is_bound(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(name))
            || self.functions.contains_key(name)
            || self.named.contains_key(name)
    }

    pub fn record_type_decl(&mut self, spec: &TypeSpec) {
        let mut named = NamedType {
            underlying: self.descriptor_of_type_expr(&spec.ty),
            ..Default::default()
        };
        if let ExprKind::StructType(fields) = &spec.ty.kind {
            named.is_struct = true;
            for field in fields {
                let ty = self.descriptor_of_type_expr(&field.ty);
                match field.names.as_slice() {
                    // embedded field: named after its type
                    [] => {
                        let name = field.ty.to_source();
                        let name = name.trim_start_matches('*');
                        let name = name.rsplit('.').next().unwrap_or(name).to_string();
                        named.fields.insert(name, ty);
                    }
                    names => {
                        for name in names {
                            named.fields.insert(name.name.clone(), ty.clone());
                        }
                    }
                }
            }
        }
        self.named.insert(spec.name.name.clone(), named);
    }

    pub fn record_function(&mut self, decl: &FuncDecl) {
        if decl.recv.is_some() {
            return;
        }
        let results = decl
            .ty
            .results
            .iter()
            .flat_map(|field| {
                let ty = self.descriptor_of_type_expr(&field.ty);
                std::iter::repeat(ty).take(field.names.len().max(1))
            })
            .collect();
        self.functions.insert(decl.name.name.clone(), results);
    }

    /// Follow locally declared named types to their underlying type.
    pub fn underlying(&self, ty: &TypeDescriptor) -> TypeDescriptor {
        let mut current = ty.clone();
        for _ in 0..MAX_NAMED_RESOLUTION {
            match &current {
                TypeDescriptor::Named(name) => match self.named.get(name) {
                    Some(named) if !named.is_struct && named.underlying.is_known() => {
                        current = named.underlying.clone();
                    }
                    _ => return current,
                },
                _ => return current,
            }
        }
        current
    }

    pub fn is_slice_type(&self, ty: &TypeDescriptor) -> bool {
        matches!(self.underlying(ty), TypeDescriptor::Slice(_))
    }

    pub fn is_map_type(&self, ty: &TypeDescriptor) -> bool {
        matches!(self.underlying(ty), TypeDescriptor::Map(..))
    }

    pub fn is_struct_type(&self, ty: &TypeDescriptor) -> bool {
        let ty = match ty {
            TypeDescriptor::Pointer(inner) => inner.as_ref(),
            ty => ty,
        };
        matches!(ty, TypeDescriptor::Named(name) if self.named.get(name).is_some_and(|n| n.is_struct))
    }

    /// Element type of a slice (or `byte` for `str`).
    pub fn element_type(&self, ty: &TypeDescriptor) -> TypeDescriptor {
        match self.underlying(ty) {
            TypeDescriptor::Slice(elem) | TypeDescriptor::Chan(elem) => *elem,
            ty if ty.is_byte_string() => TypeDescriptor::primitive("byte"),
            _ => TypeDescriptor::Unknown,
        }
    }

    pub fn key_value_types(&self, ty: &TypeDescriptor) -> (TypeDescriptor, TypeDescriptor) {
        match self.underlying(ty) {
            TypeDescriptor::Map(key, value) => (*key, *value),
            _ => (TypeDescriptor::Unknown, TypeDescriptor::Unknown),
        }
    }

    /// Declared type of `field` on a locally declared struct.
    pub fn struct_field_type(&self, ty: &TypeDescriptor, field: &str) -> TypeDescriptor {
        let ty = match ty {
            TypeDescriptor::Pointer(inner) => inner.as_ref(),
            ty => ty,
        };
        match ty {
            TypeDescriptor::Named(name) => self
                .named
                .get(name)
                .and_then(|named| named.fields.get(field))
                .cloned()
                .unwrap_or(TypeDescriptor::Unknown),
            _ => TypeDescriptor::Unknown,
        }
    }

    /// Declared type of the `index`-th field of a locally declared struct,
    /// for positional struct literals.
    pub fn struct_field_type_at(&self, ty: &TypeDescriptor, index: usize) -> TypeDescriptor {
        let ty = match ty {
            TypeDescriptor::Pointer(inner) => inner.as_ref(),
            ty => ty,
        };
        match ty {
            TypeDescriptor::Named(name) => self
                .named
                .get(name)
                .and_then(|named| named.fields.get_index(index))
                .map(|(_, ty)| ty.clone())
                .unwrap_or(TypeDescriptor::Unknown),
            _ => TypeDescriptor::Unknown,
        }
    }

    fn is_runtime_str(&self, expr: &Expr) -> bool {
        expr.as_qualified() == Some((self.runtime.as_str(), Helper::Str.name()))
    }

    /// Descriptor for a type expression, in dialect or lowered spelling.
    pub fn descriptor_of_type_expr(&self, expr: &Expr) -> TypeDescriptor {
        match &expr.kind {
            ExprKind::Ident(name) if is_primitive_name(name) => TypeDescriptor::Primitive(name.clone()),
            ExprKind::Ident(name) => TypeDescriptor::Named(name.clone()),
            ExprKind::Selector { .. } if self.is_runtime_str(expr) => TypeDescriptor::byte_string(),
            ExprKind::Selector { .. } => TypeDescriptor::Named(expr.to_source()),
            ExprKind::Paren(inner) => self.descriptor_of_type_expr(inner),
            ExprKind::Star(inner) => {
                // `*[]T`, `*map[K]V`, `*chan T` and `*rt.Str` are the lowered
                // spelling of the dialect's reference types
                let inner = self.descriptor_of_type_expr(inner);
                if inner.is_reference() {
                    inner
                } else if inner.is_known() {
                    TypeDescriptor::pointer(inner)
                } else {
                    TypeDescriptor::Unknown
                }
            }
            ExprKind::ArrayType { len: None, elem } => {
                TypeDescriptor::slice(self.descriptor_of_type_expr(elem))
            }
            // a variadic parameter is a plain base-language slice, never
            // pointer-wrapped
            ExprKind::Ellipsis(Some(elem)) => TypeDescriptor::Named(format!("[]{}", elem.to_source())),
            ExprKind::MapType { key, value } => TypeDescriptor::map(
                self.descriptor_of_type_expr(key),
                self.descriptor_of_type_expr(value),
            ),
            ExprKind::ChanType { elem, .. } => TypeDescriptor::chan(self.descriptor_of_type_expr(elem)),
            ExprKind::ArrayType { len: Some(_), .. }
            | ExprKind::Index { .. }
            | ExprKind::StructType(_)
            | ExprKind::InterfaceType(_)
            | ExprKind::FuncType(_) => TypeDescriptor::Named(expr.to_source()),
            _ => TypeDescriptor::Unknown,
        }
    }

    /// Whether `expr` is spelled as a type (and a call on it is a conversion).
    pub fn is_type_expr(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Ident(name) => is_primitive_name(name) || self.named.contains_key(name),
            ExprKind::Paren(inner) => self.is_type_expr(inner),
            ExprKind::ArrayType { .. }
            | ExprKind::MapType { .. }
            | ExprKind::ChanType { .. }
            | ExprKind::FuncType(_)
            | ExprKind::StructType(_)
            | ExprKind::InterfaceType(_) => true,
            _ => self.is_runtime_str(expr),
        }
    }

    /// Syntactic type of an expression.
    pub fn expr_type(&self, expr: &Expr) -> TypeDescriptor {
        match &expr.kind {
            ExprKind::Ident(name) => match name.as_str() {
                "true" | "false" if !self.is_bound(name) => TypeDescriptor::primitive("bool"),
                _ => self.type_of(name),
            },
            ExprKind::BasicLit { kind, .. } => match kind {
                LitKind::Int => TypeDescriptor::primitive("int"),
                LitKind::Float => TypeDescriptor::primitive("float64"),
                LitKind::Imag => TypeDescriptor::primitive("complex128"),
                LitKind::Char => TypeDescriptor::primitive("rune"),
                LitKind::String => TypeDescriptor::byte_string(),
            },
            ExprKind::CompositeLit { ty: Some(ty), .. } => self.descriptor_of_type_expr(ty),
            ExprKind::CompositeLit { ty: None, .. } => TypeDescriptor::Unknown,
            ExprKind::KeyValue { value, .. } => self.expr_type(value),
            ExprKind::Paren(inner) => self.expr_type(inner),
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Addr => {
                    let inner = self.expr_type(operand);
                    if inner.is_reference() || inner.is_unknown() {
                        inner
                    } else {
                        TypeDescriptor::pointer(inner)
                    }
                }
                UnaryOp::Recv => self.element_type(&self.expr_type(operand)),
                UnaryOp::Not => TypeDescriptor::primitive("bool"),
                UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot => self.expr_type(operand),
            },
            ExprKind::Star(inner) => match self.expr_type(inner) {
                TypeDescriptor::Pointer(target) => *target,
                ty if ty.is_reference() => ty,
                _ => TypeDescriptor::Unknown,
            },
            ExprKind::Binary { op, left, right } => match op {
                op if op.is_comparison() => TypeDescriptor::primitive("bool"),
                BinaryOp::LAnd | BinaryOp::LOr => TypeDescriptor::primitive("bool"),
                BinaryOp::Shl | BinaryOp::Shr => self.expr_type(left),
                _ => self.expr_type(left).or(self.expr_type(right)),
            },
            ExprKind::Call { fun, args, .. } => self.call_type(expr, fun, args),
            ExprKind::Index { base, .. } => {
                let base_ty = self.underlying(&self.expr_type(base));
                match base_ty {
                    TypeDescriptor::Map(_, value) => *value,
                    ty => self.element_type(&ty),
                }
            }
            ExprKind::Slice { base, .. } => match self.underlying(&self.expr_type(base)) {
                ty @ TypeDescriptor::Slice(_) => ty,
                ty if ty.is_byte_string() => ty,
                _ => TypeDescriptor::Unknown,
            },
            ExprKind::Selector { base, sel } => {
                let base_ty = self.expr_type(base);
                self.struct_field_type(&base_ty, sel)
            }
            ExprKind::TypeAssert { ty: Some(ty), .. } => self.descriptor_of_type_expr(ty),
            _ => TypeDescriptor::Unknown,
        }
    }

    /// Whether `expr` is a compile-time constant of the base language:
    /// literals, names of such constants, package-qualified names, operators
    /// over constants, and conversions to a base type or `len`/`cap` of one.
    pub fn is_constant_expr(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::BasicLit { .. } => true,
            ExprKind::Ident(name) => {
                if !self.is_bound(name) {
                    return true;
                }
                let ty = self.type_of(name);
                !ty.is_reference() && !matches!(ty, TypeDescriptor::Pointer(_))
            }
            ExprKind::Selector { base, .. } => base.as_ident().is_some_and(|pkg| !self.is_bound(pkg)),
            ExprKind::Paren(inner) => self.is_constant_expr(inner),
            ExprKind::Unary { op, operand } => {
                !matches!(op, UnaryOp::Addr | UnaryOp::Recv) && self.is_constant_expr(operand)
            }
            ExprKind::Binary { op, left, right } => {
                *op != BinaryOp::Concat && self.is_constant_expr(left) && self.is_constant_expr(right)
            }
            ExprKind::Call {
                fun,
                args,
                ellipsis: false,
            } => {
                let Some(name) = fun.unparen().as_ident() else {
                    return false;
                };
                let evaluable = match name {
                    BYTE_STRING => false,
                    "len" | "cap" => true,
                    name => is_primitive_name(name),
                };
                evaluable && !self.is_bound(name) && args.len() == 1 && self.is_constant_expr(&args[0])
            }
            _ => false,
        }
    }

    /// Whether `expr` is a base-language string constant: a literal, a sum
    /// or concatenation of string constants, or a name bound to one.
    pub fn is_string_constant(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::BasicLit {
                kind: LitKind::String,
                ..
            } => true,
            ExprKind::Paren(inner) => self.is_string_constant(inner),
            ExprKind::Binary {
                op: BinaryOp::Add | BinaryOp::Concat,
                left,
                right,
            } => self.is_string_constant(left) && self.is_string_constant(right),
            ExprKind::Ident(name) => self.type_of(name) == TypeDescriptor::primitive("string"),
            _ => false,
        }
    }

    fn call_type(&self, call: &Expr, fun: &Expr, args: &[Expr]) -> TypeDescriptor {
        if let Some(helper) = match_helper_call(call, &self.runtime) {
            let type_arg = |i: usize| {
                helper
                    .type_args
                    .get(i)
                    .map(|ty| self.descriptor_of_type_expr(ty))
                    .unwrap_or(TypeDescriptor::Unknown)
            };
            return match helper.helper {
                Helper::StrConcat | Helper::StrFrom => TypeDescriptor::byte_string(),
                Helper::Concat | Helper::CloneSlice | Helper::GrowSlice => {
                    TypeDescriptor::slice(type_arg(0))
                }
                Helper::CloneMap | Helper::GrowMap => TypeDescriptor::map(type_arg(0), type_arg(1)),
                Helper::Coerce => TypeDescriptor::slice(type_arg(1)),
                Helper::Chan => TypeDescriptor::chan(type_arg(0)),
                Helper::DeepCopy | Helper::Grow | Helper::Ptr => helper
                    .args
                    .first()
                    .map(|arg| self.expr_type(arg))
                    .unwrap_or(TypeDescriptor::Unknown),
                Helper::CopySlice | Helper::CopyMap => TypeDescriptor::primitive("int"),
                _ => TypeDescriptor::Unknown,
            };
        }

        if self.is_type_expr(fun) {
            return self.descriptor_of_type_expr(fun);
        }

        let Some(name) = fun.unparen().as_ident() else {
            return TypeDescriptor::Unknown;
        };
        if let Some(results) = self.functions.get(name) {
            return results.first().cloned().unwrap_or(TypeDescriptor::Unknown);
        }
        if self.is_bound(name) {
            return TypeDescriptor::Unknown;
        }
        match name {
            "len" | "cap" | "copy" => TypeDescriptor::primitive("int"),
            "new" => args
                .first()
                .map(|ty| TypeDescriptor::pointer(self.descriptor_of_type_expr(ty)))
                .unwrap_or(TypeDescriptor::Unknown),
            name if SAME_TYPE_BUILTINS.contains(&name) => args
                .first()
                .map(|arg| self.expr_type(arg))
                .unwrap_or(TypeDescriptor::Unknown),
            _ => TypeDescriptor::Unknown,
        }
    }
}
