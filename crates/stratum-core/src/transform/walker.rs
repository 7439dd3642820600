/*!
# Tree Walkers

`Walker` drives one traversal of a file for a rewrite pass. It owns the
scoping discipline: the tracker is rebuilt from scratch for every traversal,
a scope is pushed for each function, block and statement header, and every
declaration is recorded after the pass has rewritten its initializers, so
later statements see the lowered shapes.

`AstWalker` is the read-only counterpart used by analyses (the const checker,
depth measurement) that never change the tree.
*/

use crate::ast::{
    AssignOp, Block, Decl, DeclKind, Expr, ExprKind, Field, File, FuncType, GenDecl, Ident, Spec,
    Stmt, StmtKind, ValueSpec,
};
use crate::errors::TransformResult;
use crate::types::{TypeDescriptor, TypeTracker};

use super::rules::{RewritePass, TypeRole, Visit};
use super::PassContext;

/// What the position an expression occupies expects it to be.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ValueSlot {
    #[default]
    Untyped,
    /// Element, key or field of a composite literal, a variable with a
    /// declared type, or a result of a function with declared results.
    Typed(TypeDescriptor),
    /// Initializer of a `const` declaration.
    Constant,
}

impl ValueSlot {
    pub fn typed(ty: TypeDescriptor) -> Self {
        if ty.is_known() {
            ValueSlot::Typed(ty)
        } else {
            ValueSlot::Untyped
        }
    }

    pub fn type_hint(&self) -> TypeDescriptor {
        match self {
            ValueSlot::Typed(ty) => ty.clone(),
            _ => TypeDescriptor::Unknown,
        }
    }
}

fn constant_or_untyped(slot: &ValueSlot) -> ValueSlot {
    match slot {
        ValueSlot::Constant => ValueSlot::Constant,
        _ => ValueSlot::Untyped,
    }
}

pub struct Walker<'w, 'c> {
    pass: &'w mut dyn RewritePass,
    cx: &'w mut PassContext<'c>,
    changes: usize,
    results: Vec<Vec<TypeDescriptor>>,
}

impl<'w, 'c> Walker<'w, 'c> {
    pub fn new(pass: &'w mut dyn RewritePass, cx: &'w mut PassContext<'c>) -> Self {
        Self {
            pass,
            cx,
            changes: 0,
            results: Vec::new(),
        }
    }

    /// Walk the whole file; returns the number of rewrites made.
    pub fn walk_file(mut self, file: &mut File) -> TransformResult<usize> {
        self.cx.tracker = TypeTracker::new(self.cx.runtime_name());
        self.prescan(file);

        for decl in &mut file.decls {
            match decl {
                Decl::Gen(gen) => self.walk_gen_decl(gen)?,
                Decl::Func(func) => {
                    self.cx.tracker.push_scope();
                    if let Some(recv) = &mut func.recv {
                        self.walk_field(recv)?;
                    }
                    let results = self.walk_signature(&mut func.ty)?;
                    if let Some(body) = &mut func.body {
                        self.results.push(results);
                        self.walk_stmts(&mut body.stmts)?;
                        self.results.pop();
                    }
                    self.cx.tracker.pop_scope();
                }
            }
        }
        Ok(self.changes)
    }

    // Package-level names are visible before their declaration.
    fn prescan(&mut self, file: &File) {
        for decl in &file.decls {
            match decl {
                Decl::Gen(gen) => {
                    for spec in &gen.specs {
                        if let Spec::Type(spec) = spec {
                            self.cx.tracker.record_type_decl(spec);
                        }
                    }
                }
                Decl::Func(func) => self.cx.tracker.record_function(func),
            }
        }
        for decl in &file.decls {
            if let Decl::Gen(gen) = decl {
                for spec in &gen.specs {
                    if let Spec::Value(spec) = spec {
                        self.record_value_spec(gen.kind, spec);
                    }
                }
            }
        }
    }

    fn record_value_spec(&mut self, kind: DeclKind, spec: &ValueSpec) {
        let tracker = &mut self.cx.tracker;
        tracker.record_declaration(&spec.names, spec.ty.as_ref(), &spec.values);
        if kind == DeclKind::Const {
            // string constants stay base-language strings
            for (i, name) in spec.names.iter().enumerate() {
                let constant = spec
                    .values
                    .get(i)
                    .is_some_and(|value| tracker.is_string_constant(value));
                if constant && tracker.type_of(&name.name).is_byte_string() {
                    tracker.record_typed(&name.name, TypeDescriptor::primitive("string"));
                }
            }
        }
    }

    fn walk_gen_decl(&mut self, decl: &mut GenDecl) -> TransformResult<()> {
        for spec in &mut decl.specs {
            match spec {
                Spec::Type(spec) => {
                    self.walk_type(&mut spec.ty, TypeRole::TypeSpec)?;
                    self.cx.tracker.record_type_decl(spec);
                }
                Spec::Value(spec) => {
                    let slot = match (decl.kind, &spec.ty) {
                        (DeclKind::Const, _) => ValueSlot::Constant,
                        (_, Some(ty)) => ValueSlot::typed(self.cx.tracker.descriptor_of_type_expr(ty)),
                        (_, None) => ValueSlot::Untyped,
                    };
                    for value in &mut spec.values {
                        self.walk_expr(value, slot.clone())?;
                    }
                    if let Some(ty) = &mut spec.ty {
                        self.walk_type(ty, TypeRole::Declared)?;
                    }
                    self.record_value_spec(decl.kind, spec);
                }
            }
        }

        let kind = decl.kind;
        if self.pass.exit_gen_decl(decl, self.cx)? {
            self.changes += 1;
            if decl.kind != kind {
                for spec in &decl.specs {
                    if let Spec::Value(spec) = spec {
                        self.record_value_spec(decl.kind, spec);
                    }
                }
            }
        }
        Ok(())
    }

    fn walk_field(&mut self, field: &mut Field) -> TransformResult<()> {
        self.cx
            .tracker
            .record_declaration(&field.names, Some(&field.ty), &[]);
        self.walk_type(&mut field.ty, TypeRole::Declared)
    }

    /// Declare parameters and results in the current scope; returns the
    /// result types.
    fn walk_signature(&mut self, ty: &mut FuncType) -> TransformResult<Vec<TypeDescriptor>> {
        for field in &mut ty.params {
            self.walk_field(field)?;
        }
        let mut results = Vec::new();
        for field in &mut ty.results {
            let desc = self.cx.tracker.descriptor_of_type_expr(&field.ty);
            results.extend(std::iter::repeat(desc).take(field.names.len().max(1)));
            self.walk_field(field)?;
        }
        Ok(results)
    }

    fn walk_type(&mut self, ty: &mut Expr, role: TypeRole) -> TransformResult<()> {
        if self.pass.rewrite_type(ty, role, self.cx)? {
            self.changes += 1;
        }
        Ok(())
    }

    fn walk_block(&mut self, block: &mut Block) -> TransformResult<()> {
        self.cx.tracker.push_scope();
        self.walk_stmts(&mut block.stmts)?;
        self.cx.tracker.pop_scope();
        Ok(())
    }

    fn walk_stmts(&mut self, stmts: &mut [Stmt]) -> TransformResult<()> {
        for stmt in stmts {
            self.walk_stmt(stmt)?;
        }
        Ok(())
    }

    fn walk_opt_stmt(&mut self, stmt: &mut Option<Box<Stmt>>) -> TransformResult<()> {
        match stmt {
            Some(stmt) => self.walk_stmt(stmt),
            None => Ok(()),
        }
    }

    fn walk_stmt(&mut self, stmt: &mut Stmt) -> TransformResult<()> {
        match &mut stmt.kind {
            StmtKind::Expr(expr) | StmtKind::Go(expr) | StmtKind::Defer(expr) => {
                self.walk_expr(expr, ValueSlot::Untyped)?;
            }
            StmtKind::Assign { lhs, op, rhs } => {
                for value in rhs.iter_mut() {
                    self.walk_expr(value, ValueSlot::Untyped)?;
                }
                if *op != AssignOp::Define {
                    for target in lhs.iter_mut() {
                        self.walk_expr(target, ValueSlot::Untyped)?;
                    }
                }
            }
            StmtKind::IncDec { target, .. } => self.walk_expr(target, ValueSlot::Untyped)?,
            StmtKind::Decl(decl) => self.walk_gen_decl(decl)?,
            StmtKind::Block(block) => self.walk_block(block)?,
            StmtKind::If {
                init,
                cond,
                then,
                els,
            } => {
                self.cx.tracker.push_scope();
                self.walk_opt_stmt(init)?;
                self.walk_expr(cond, ValueSlot::Untyped)?;
                self.walk_block(then)?;
                self.walk_opt_stmt(els)?;
                self.cx.tracker.pop_scope();
            }
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => {
                self.cx.tracker.push_scope();
                self.walk_opt_stmt(init)?;
                if let Some(cond) = cond {
                    self.walk_expr(cond, ValueSlot::Untyped)?;
                }
                self.walk_block(body)?;
                self.walk_opt_stmt(post)?;
                self.cx.tracker.pop_scope();
            }
            StmtKind::Range {
                key,
                value,
                define,
                target,
                body,
            } => {
                self.walk_expr(target, ValueSlot::Untyped)?;
                self.cx.tracker.push_scope();
                if *define {
                    let (key_ty, value_ty) = self.range_types(target);
                    for (var, ty) in [(key.as_ref(), key_ty), (value.as_ref(), value_ty)] {
                        if let Some(name) = var.and_then(|var| var.as_ident()) {
                            self.cx.tracker.record_typed(name, ty);
                        }
                    }
                } else {
                    for var in [key.as_mut(), value.as_mut()].into_iter().flatten() {
                        self.walk_expr(var, ValueSlot::Untyped)?;
                    }
                }
                self.walk_stmts(&mut body.stmts)?;
                self.cx.tracker.pop_scope();
            }
            StmtKind::Switch { init, tag, clauses } => {
                self.cx.tracker.push_scope();
                self.walk_opt_stmt(init)?;
                if let Some(tag) = tag {
                    self.walk_expr(tag, ValueSlot::Untyped)?;
                }
                for clause in clauses {
                    for expr in &mut clause.exprs {
                        self.walk_expr(expr, ValueSlot::Untyped)?;
                    }
                    self.cx.tracker.push_scope();
                    self.walk_stmts(&mut clause.body)?;
                    self.cx.tracker.pop_scope();
                }
                self.cx.tracker.pop_scope();
            }
            StmtKind::Return(values) => {
                let expected = self
                    .results
                    .last()
                    .filter(|results| results.len() == values.len())
                    .cloned();
                for (i, value) in values.iter_mut().enumerate() {
                    let slot = expected
                        .as_ref()
                        .map(|results| ValueSlot::typed(results[i].clone()))
                        .unwrap_or_default();
                    self.walk_expr(value, slot)?;
                }
            }
            StmtKind::Send { chan, value } => {
                self.walk_expr(chan, ValueSlot::Untyped)?;
                self.walk_expr(value, ValueSlot::Untyped)?;
            }
            StmtKind::Labeled { stmt, .. } => self.walk_stmt(stmt)?,
            StmtKind::Branch { .. } | StmtKind::Empty => {}
        }

        if self.pass.exit_stmt(stmt, self.cx)? {
            self.changes += 1;
        }

        if let StmtKind::Assign { lhs, op, rhs } = &stmt.kind {
            match op {
                AssignOp::Define => {
                    let names: Vec<Ident> = lhs
                        .iter()
                        .filter_map(|target| target.as_ident().map(|name| Ident::new(name, target.pos)))
                        .collect();
                    self.cx.tracker.record_declaration(&names, None, rhs);
                }
                AssignOp::Assign => self.cx.tracker.record_assignment(lhs, rhs),
                _ => {}
            }
        }
        Ok(())
    }

    fn range_types(&self, target: &Expr) -> (TypeDescriptor, TypeDescriptor) {
        let tracker = &self.cx.tracker;
        let int = TypeDescriptor::primitive("int");
        match tracker.underlying(&tracker.expr_type(target)) {
            TypeDescriptor::Slice(elem) => (int, *elem),
            TypeDescriptor::Map(key, value) => (*key, *value),
            TypeDescriptor::Chan(elem) => (*elem, TypeDescriptor::Unknown),
            ty if ty.is_byte_string() => (int, TypeDescriptor::primitive("byte")),
            TypeDescriptor::Primitive(name) if name == "string" => (int, TypeDescriptor::primitive("rune")),
            ty @ TypeDescriptor::Primitive(_) => (ty, TypeDescriptor::Unknown),
            _ => (TypeDescriptor::Unknown, TypeDescriptor::Unknown),
        }
    }

    fn walk_expr(&mut self, expr: &mut Expr, slot: ValueSlot) -> TransformResult<()> {
        self.cx.slot = slot.clone();
        match self.pass.enter_expr(expr, self.cx)? {
            Visit::Descend => {}
            Visit::Skip => return Ok(()),
            Visit::Rewritten => {
                self.changes += 1;
                return Ok(());
            }
        }

        self.walk_children(expr, &slot)?;

        self.cx.slot = slot;
        if self.pass.exit_expr(expr, self.cx)? {
            self.changes += 1;
        }
        Ok(())
    }

    fn walk_opt_expr(&mut self, expr: &mut Option<Box<Expr>>) -> TransformResult<()> {
        match expr {
            Some(expr) => self.walk_expr(expr, ValueSlot::Untyped),
            None => Ok(()),
        }
    }

    fn walk_children(&mut self, expr: &mut Expr, slot: &ValueSlot) -> TransformResult<()> {
        match &mut expr.kind {
            ExprKind::CompositeLit { ty, elts } => {
                let lit_ty = match ty {
                    Some(ty) => self.cx.tracker.descriptor_of_type_expr(ty),
                    None => slot.type_hint(),
                };
                let array_elem = match ty.as_deref() {
                    Some(Expr {
                        kind: ExprKind::ArrayType { len: Some(_), elem },
                        ..
                    }) => self.cx.tracker.descriptor_of_type_expr(elem),
                    _ => TypeDescriptor::Unknown,
                };
                if let Some(ty) = ty {
                    self.walk_type(ty, TypeRole::Literal)?;
                }
                self.walk_elements(elts, &lit_ty, array_elem)?;
            }
            ExprKind::KeyValue { key, value } => {
                self.walk_expr(key, ValueSlot::Untyped)?;
                self.walk_expr(value, ValueSlot::Untyped)?;
            }
            ExprKind::FuncLit { ty, body } => {
                self.cx.tracker.push_scope();
                let results = self.walk_signature(ty)?;
                self.results.push(results);
                self.walk_stmts(&mut body.stmts)?;
                self.results.pop();
                self.cx.tracker.pop_scope();
            }
            ExprKind::Paren(inner) => self.walk_expr(inner, slot.clone())?,
            ExprKind::Selector { base, .. } => self.walk_expr(base, ValueSlot::Untyped)?,
            ExprKind::Index { base, indices } => {
                self.walk_expr(base, ValueSlot::Untyped)?;
                for index in indices {
                    self.walk_expr(index, ValueSlot::Untyped)?;
                }
            }
            ExprKind::Slice {
                base,
                low,
                high,
                max,
            } => {
                self.walk_expr(base, ValueSlot::Untyped)?;
                self.walk_opt_expr(low)?;
                self.walk_opt_expr(high)?;
                self.walk_opt_expr(max)?;
            }
            ExprKind::TypeAssert { base, ty } => {
                self.walk_expr(base, ValueSlot::Untyped)?;
                if let Some(ty) = ty {
                    self.walk_type(ty, TypeRole::Declared)?;
                }
            }
            // operands and arguments inside a constant initializer are constant too
            ExprKind::Call { fun, args, .. } => {
                self.walk_expr(fun, ValueSlot::Untyped)?;
                for arg in args {
                    self.walk_expr(arg, constant_or_untyped(slot))?;
                }
            }
            ExprKind::Star(inner) => self.walk_expr(inner, ValueSlot::Untyped)?,
            ExprKind::Unary { operand, .. } => self.walk_expr(operand, constant_or_untyped(slot))?,
            ExprKind::Binary { left, right, .. } => {
                self.walk_expr(left, constant_or_untyped(slot))?;
                self.walk_expr(right, constant_or_untyped(slot))?;
            }
            ExprKind::Ident(_)
            | ExprKind::BasicLit { .. }
            | ExprKind::ArrayType { .. }
            | ExprKind::MapType { .. }
            | ExprKind::ChanType { .. }
            | ExprKind::StructType(_)
            | ExprKind::InterfaceType(_)
            | ExprKind::FuncType(_)
            | ExprKind::Ellipsis(_) => {}
        }
        Ok(())
    }

    fn walk_elements(
        &mut self,
        elts: &mut [Expr],
        lit_ty: &TypeDescriptor,
        array_elem: TypeDescriptor,
    ) -> TransformResult<()> {
        let tracker = &self.cx.tracker;
        if tracker.is_struct_type(lit_ty) {
            for (i, elt) in elts.iter_mut().enumerate() {
                match &mut elt.kind {
                    // field names are not expressions
                    ExprKind::KeyValue { key, value } => {
                        let field_ty = key
                            .as_ident()
                            .map(|field| self.cx.tracker.struct_field_type(lit_ty, field))
                            .unwrap_or_default();
                        self.walk_expr(value, ValueSlot::typed(field_ty))?;
                    }
                    _ => {
                        let field_ty = self.cx.tracker.struct_field_type_at(lit_ty, i);
                        self.walk_expr(elt, ValueSlot::typed(field_ty))?;
                    }
                }
            }
            return Ok(());
        }

        let (key_ty, elem_ty) = if tracker.is_map_type(lit_ty) {
            tracker.key_value_types(lit_ty)
        } else {
            (TypeDescriptor::Unknown, tracker.element_type(lit_ty).or(array_elem))
        };
        for elt in elts {
            match &mut elt.kind {
                ExprKind::KeyValue { key, value } => {
                    self.walk_expr(key, ValueSlot::typed(key_ty.clone()))?;
                    self.walk_expr(value, ValueSlot::typed(elem_ty.clone()))?;
                }
                _ => self.walk_expr(elt, ValueSlot::typed(elem_ty.clone()))?,
            }
        }
        Ok(())
    }
}

/// Read-only observer for [`AstWalker`].
pub trait Inspector {
    fn gen_decl(&mut self, decl: &GenDecl) {
        let _ = decl;
    }

    fn stmt(&mut self, stmt: &Stmt) {
        let _ = stmt;
    }

    /// `depth` is 1 for an expression directly under a statement or declaration.
    fn expr(&mut self, expr: &Expr, depth: usize) {
        let _ = (expr, depth);
    }
}

/// Utility for deep read-only traversal
pub struct AstWalker;

impl AstWalker {
    pub fn inspect_file<I: Inspector>(file: &File, inspector: &mut I) {
        for decl in &file.decls {
            match decl {
                Decl::Gen(gen) => Self::inspect_gen_decl(gen, inspector),
                Decl::Func(func) => {
                    if let Some(body) = &func.body {
                        Self::inspect_stmts(&body.stmts, inspector);
                    }
                }
            }
        }
    }

    fn inspect_gen_decl<I: Inspector>(decl: &GenDecl, inspector: &mut I) {
        inspector.gen_decl(decl);
        for spec in &decl.specs {
            if let Spec::Value(spec) = spec {
                for value in &spec.values {
                    Self::inspect_expr(value, 1, inspector);
                }
            }
        }
    }

    fn inspect_stmts<I: Inspector>(stmts: &[Stmt], inspector: &mut I) {
        for stmt in stmts {
            Self::inspect_stmt(stmt, inspector);
        }
    }

    fn inspect_stmt<I: Inspector>(stmt: &Stmt, inspector: &mut I) {
        inspector.stmt(stmt);
        let exprs = |exprs: &[Expr], inspector: &mut I| {
            for expr in exprs {
                Self::inspect_expr(expr, 1, inspector);
            }
        };
        match &stmt.kind {
            StmtKind::Expr(expr) | StmtKind::Go(expr) | StmtKind::Defer(expr) => {
                Self::inspect_expr(expr, 1, inspector)
            }
            StmtKind::Assign { lhs, rhs, .. } => {
                exprs(lhs, inspector);
                exprs(rhs, inspector);
            }
            StmtKind::IncDec { target, .. } => Self::inspect_expr(target, 1, inspector),
            StmtKind::Decl(decl) => Self::inspect_gen_decl(decl, inspector),
            StmtKind::Block(block) => Self::inspect_stmts(&block.stmts, inspector),
            StmtKind::If {
                init,
                cond,
                then,
                els,
            } => {
                if let Some(init) = init {
                    Self::inspect_stmt(init, inspector);
                }
                Self::inspect_expr(cond, 1, inspector);
                Self::inspect_stmts(&then.stmts, inspector);
                if let Some(els) = els {
                    Self::inspect_stmt(els, inspector);
                }
            }
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => {
                if let Some(init) = init {
                    Self::inspect_stmt(init, inspector);
                }
                if let Some(cond) = cond {
                    Self::inspect_expr(cond, 1, inspector);
                }
                if let Some(post) = post {
                    Self::inspect_stmt(post, inspector);
                }
                Self::inspect_stmts(&body.stmts, inspector);
            }
            StmtKind::Range {
                key,
                value,
                target,
                body,
                ..
            } => {
                for var in [key, value].into_iter().flatten() {
                    Self::inspect_expr(var, 1, inspector);
                }
                Self::inspect_expr(target, 1, inspector);
                Self::inspect_stmts(&body.stmts, inspector);
            }
            StmtKind::Switch { init, tag, clauses } => {
                if let Some(init) = init {
                    Self::inspect_stmt(init, inspector);
                }
                if let Some(tag) = tag {
                    Self::inspect_expr(tag, 1, inspector);
                }
                for clause in clauses {
                    exprs(&clause.exprs, inspector);
                    Self::inspect_stmts(&clause.body, inspector);
                }
            }
            StmtKind::Return(values) => exprs(values, inspector),
            StmtKind::Send { chan, value } => {
                Self::inspect_expr(chan, 1, inspector);
                Self::inspect_expr(value, 1, inspector);
            }
            StmtKind::Labeled { stmt, .. } => Self::inspect_stmt(stmt, inspector),
            StmtKind::Branch { .. } | StmtKind::Empty => {}
        }
    }

    fn inspect_expr<I: Inspector>(expr: &Expr, depth: usize, inspector: &mut I) {
        inspector.expr(expr, depth);
        let next = depth + 1;
        match &expr.kind {
            ExprKind::CompositeLit { elts, .. } => {
                for elt in elts {
                    Self::inspect_expr(elt, next, inspector);
                }
            }
            ExprKind::KeyValue { key, value } => {
                Self::inspect_expr(key, next, inspector);
                Self::inspect_expr(value, next, inspector);
            }
            ExprKind::FuncLit { body, .. } => Self::inspect_stmts(&body.stmts, inspector),
            ExprKind::Paren(inner)
            | ExprKind::Star(inner)
            | ExprKind::Unary { operand: inner, .. }
            | ExprKind::Selector { base: inner, .. }
            | ExprKind::TypeAssert { base: inner, .. } => Self::inspect_expr(inner, next, inspector),
            ExprKind::Index { base, indices } => {
                Self::inspect_expr(base, next, inspector);
                for index in indices {
                    Self::inspect_expr(index, next, inspector);
                }
            }
            ExprKind::Slice {
                base,
                low,
                high,
                max,
            } => {
                Self::inspect_expr(base, next, inspector);
                for bound in [low, high, max].into_iter().flatten() {
                    Self::inspect_expr(bound, next, inspector);
                }
            }
            ExprKind::Call { fun, args, .. } => {
                Self::inspect_expr(fun, next, inspector);
                for arg in args {
                    Self::inspect_expr(arg, next, inspector);
                }
            }
            ExprKind::Binary { left, right, .. } => {
                Self::inspect_expr(left, next, inspector);
                Self::inspect_expr(right, next, inspector);
            }
            _ => {}
        }
    }

    /// Number of expressions in `file` matching `predicate`.
    pub fn count_exprs(file: &File, predicate: impl Fn(&Expr) -> bool) -> usize {
        struct Counter<F> {
            predicate: F,
            count: usize,
        }
        impl<F: Fn(&Expr) -> bool> Inspector for Counter<F> {
            fn expr(&mut self, expr: &Expr, _depth: usize) {
                if (self.predicate)(expr) {
                    self.count += 1;
                }
            }
        }

        let mut counter = Counter {
            predicate,
            count: 0,
        };
        Self::inspect_file(file, &mut counter);
        counter.count
    }

    /// Deepest expression nesting anywhere in `file`.
    pub fn max_expr_depth(file: &File) -> usize {
        #[derive(Default)]
        struct Depth(usize);
        impl Inspector for Depth {
            fn expr(&mut self, _expr: &Expr, depth: usize) {
                self.0 = self.0.max(depth);
            }
        }

        let mut deepest = Depth::default();
        Self::inspect_file(file, &mut deepest);
        deepest.0
    }
}
