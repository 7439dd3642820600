/*!
# Rewrite Passes

Core trait for lowering passes and the per-pass statistics the engine keeps.
*/

use crate::ast::{Expr, GenDecl, Stmt};
use crate::errors::TransformResult;

use super::PassContext;

/// How often the engine walks the file for a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    /// One traversal.
    Once,
    /// Traversals repeat until one makes no rewrite, up to the file's ceiling.
    FixedPoint,
}

/// Returned by [`RewritePass::enter_expr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Descend,
    /// Leave the node and its children alone.
    Skip,
    /// The node was replaced; do not re-enter it in this traversal.
    Rewritten,
}

/// Where a type expression sits, for passes that rewrite declared types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRole {
    /// Variable, parameter, result, field or assertion type
    Declared,
    /// Right-hand side of a type declaration
    TypeSpec,
    /// Type of a composite literal
    Literal,
}

/// A lowering pass.
///
/// The walker drives the traversal and keeps the [`TypeTracker`] in step with
/// the scopes it enters; a pass only reacts to the nodes it cares about.
/// Every hook reports whether it changed the tree, which is what the engine
/// counts to detect a fixed point.
///
/// [`TypeTracker`]: crate::types::TypeTracker
pub trait RewritePass: Send {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn mode(&self) -> PassMode {
        PassMode::Once
    }

    /// Called before an expression's children are walked.
    fn enter_expr(&mut self, expr: &mut Expr, cx: &mut PassContext<'_>) -> TransformResult<Visit> {
        let _ = (expr, cx);
        Ok(Visit::Descend)
    }

    /// Called after an expression's children are walked.
    fn exit_expr(&mut self, expr: &mut Expr, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        let _ = (expr, cx);
        Ok(false)
    }

    /// Called after a statement's expressions and nested blocks are walked,
    /// before the tracker records what the statement declares.
    fn exit_stmt(&mut self, stmt: &mut Stmt, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        let _ = (stmt, cx);
        Ok(false)
    }

    /// Called after every spec of a declaration has been walked and recorded.
    /// A pass that changes the declaration's kind has its names recorded
    /// again under the new kind.
    fn exit_gen_decl(&mut self, decl: &mut GenDecl, cx: &mut PassContext<'_>) -> TransformResult<bool> {
        let _ = (decl, cx);
        Ok(false)
    }

    /// Called once for every type expression in a declaring position.
    fn rewrite_type(
        &mut self,
        ty: &mut Expr,
        role: TypeRole,
        cx: &mut PassContext<'_>,
    ) -> TransformResult<bool> {
        let _ = (ty, role, cx);
        Ok(false)
    }
}

/// Pass execution statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassStats {
    pub pass_name: String,
    pub traversals: u64,
    pub rewrites: u64,
    pub errors: u64,
    pub total_time_us: u64,
}

impl PassStats {
    pub fn new(pass_name: impl Into<String>) -> Self {
        Self {
            pass_name: pass_name.into(),
            ..Default::default()
        }
    }

    pub fn merge(&mut self, other: &PassStats) {
        self.traversals += other.traversals;
        self.rewrites += other.rewrites;
        self.errors += other.errors;
        self.total_time_us += other.total_time_us;
    }

    pub fn average_time_us(&self) -> f64 {
        if self.traversals == 0 {
            0.0
        } else {
            (self.total_time_us as f64) / (self.traversals as f64)
        }
    }
}
