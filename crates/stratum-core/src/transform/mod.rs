/*!
# Syntax Transformer

Multi-pass rewrite engine lowering a Stratum tree to the base language.

## Architecture

- `RewritePass`: trait implemented by every lowering pass
- `Walker`: scope-aware traversal that keeps the `TypeTracker` current
- `Transformer`: runs passes in order, once or to a fixed point, and keeps
  per-pass statistics
- `passes`: the lowering passes, in pipeline order

## Example Usage

```rust
use stratum_core::ast::File;
use stratum_core::imports::ImportSet;
use stratum_core::transform::Transformer;
use stratum_core::TransformConfig;

let config = TransformConfig::default();
let mut transformer = Transformer::with_default_passes(&config);
let mut file = File::new("main.st", "main");
let mut imports = ImportSet::new();
let mut diagnostics = Vec::new();
transformer.run(&mut file, &mut imports, &mut diagnostics)?;
# Ok::<(), stratum_core::TransformError>(())
```
*/

pub mod passes;
pub mod rules;
pub mod walker;

pub use rules::{PassMode, PassStats, RewritePass, TypeRole, Visit};
pub use walker::{AstWalker, Inspector, ValueSlot, Walker};

use std::time::Instant;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::ast::{Expr, File, Pos};
use crate::config::TransformConfig;
use crate::diagnostics::Diagnostic;
use crate::errors::{TransformError, TransformResult};
use crate::imports::ImportSet;
use crate::runtime::Helper;
use crate::types::{TypeDescriptor, TypeTracker};

/// Per-traversal state handed to every pass hook.
pub struct PassContext<'a> {
    pub config: &'a TransformConfig,
    pub tracker: TypeTracker,
    pub imports: &'a mut ImportSet,
    pub diagnostics: &'a mut Vec<Diagnostic>,
    /// Expectation of the position the current expression occupies.
    pub slot: ValueSlot,
}

impl<'a> PassContext<'a> {
    pub fn new(
        config: &'a TransformConfig,
        imports: &'a mut ImportSet,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Self {
            config,
            tracker: TypeTracker::new(config.runtime.name.clone()),
            imports,
            diagnostics,
            slot: ValueSlot::Untyped,
        }
    }

    pub fn runtime_name(&self) -> &'a str {
        &self.config.runtime.name
    }

    /// `rt.Helper[type_args](args)`, requiring the runtime import.
    pub fn runtime_call(&mut self, helper: Helper, type_args: Vec<Expr>, args: Vec<Expr>, pos: Pos) -> Expr {
        self.imports.require(&self.config.runtime.path);
        helper.call(&self.config.runtime.name, type_args, args, pos)
    }

    /// `rt.Helper`, requiring the runtime import.
    pub fn runtime_ref(&mut self, helper: Helper, pos: Pos) -> Expr {
        self.imports.require(&self.config.runtime.path);
        helper.reference(&self.config.runtime.name, pos)
    }

    /// `ffi.name`, requiring the ffi import.
    pub fn ffi_ref(&mut self, name: &str, pos: Pos) -> Expr {
        self.imports.require(&self.config.ffi.path);
        Expr::qualified(&self.config.ffi.name, name, pos)
    }

    /// `bytes.name`, requiring the comparison package import.
    pub fn compare_ref(&mut self, name: &str, pos: Pos) -> Expr {
        self.imports.require(&self.config.compare.path);
        Expr::qualified(&self.config.compare.name, name, pos)
    }

    /// Type expression for a helper's type argument; `None` when unknown.
    pub fn type_arg(&self, ty: &TypeDescriptor, pos: Pos) -> Option<Expr> {
        ty.to_type_expr(pos)
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Iteration ceiling for fixed-point passes over `file`.
pub fn fixed_point_ceiling(file: &File, config: &TransformConfig) -> usize {
    config
        .max_fixed_point_iterations
        .unwrap_or_else(|| 2 * AstWalker::max_expr_depth(file) + 8)
}

/// Ordered pass runner.
pub struct Transformer {
    config: TransformConfig,
    passes: Vec<Box<dyn RewritePass>>,
    stats: IndexMap<&'static str, PassStats>,
}

impl Transformer {
    pub fn new(config: &TransformConfig) -> Self {
        Self {
            config: config.clone(),
            passes: Vec::new(),
            stats: IndexMap::new(),
        }
    }

    /// Transformer loaded with the full lowering pipeline, in order.
    pub fn with_default_passes(config: &TransformConfig) -> Self {
        let mut transformer = Self::new(config);
        for pass in passes::default_passes() {
            transformer.add_pass(pass);
        }
        transformer
    }

    /// Add a pass; passes run in insertion order.
    pub fn add_pass(&mut self, pass: Box<dyn RewritePass>) {
        self.stats.insert(pass.name(), PassStats::new(pass.name()));
        self.passes.push(pass);
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Run every pass over `file`. The first fatal error aborts the run; the
    /// file is then in an unspecified partially lowered state and must not be
    /// emitted.
    pub fn run(
        &mut self,
        file: &mut File,
        imports: &mut ImportSet,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> TransformResult<()> {
        let mut cx = PassContext::new(&self.config, imports, diagnostics);
        for pass in &mut self.passes {
            let stats = self
                .stats
                .entry(pass.name())
                .or_insert_with(|| PassStats::new(pass.name()));
            let result = Self::run_pass(pass.as_mut(), file, &mut cx, stats);
            if result.is_err() {
                stats.errors += 1;
            }
            result?;
        }
        Ok(())
    }

    fn run_pass(
        pass: &mut dyn RewritePass,
        file: &mut File,
        cx: &mut PassContext<'_>,
        stats: &mut PassStats,
    ) -> TransformResult<()> {
        let start_time = Instant::now();
        let ceiling = match pass.mode() {
            PassMode::Once => 1,
            PassMode::FixedPoint => fixed_point_ceiling(file, cx.config),
        };

        let mut iterations = 0;
        loop {
            if iterations >= ceiling {
                return Err(TransformError::PassLimit {
                    pass: pass.name(),
                    limit: ceiling,
                });
            }
            iterations += 1;

            let rewrites = Walker::new(pass, cx).walk_file(file)?;
            stats.traversals += 1;
            stats.rewrites += rewrites as u64;
            trace!(pass = pass.name(), iteration = iterations, rewrites, "traversal done");

            if pass.mode() == PassMode::Once || rewrites == 0 {
                break;
            }
        }

        stats.total_time_us += start_time.elapsed().as_micros() as u64;
        debug!(
            pass = pass.name(),
            file = %file.name,
            traversals = iterations,
            "pass complete"
        );
        Ok(())
    }

    /// Per-pass statistics, in pipeline order
    pub fn stats(&self) -> &IndexMap<&'static str, PassStats> {
        &self.stats
    }

    pub fn clear_stats(&mut self) {
        for stats in self.stats.values_mut() {
            *stats = PassStats::new(stats.pass_name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Block, Decl, FuncDecl, FuncType, Ident, Stmt, StmtKind};

    /// Claims a rewrite on every statement, so it never converges.
    struct Stubborn;

    impl RewritePass for Stubborn {
        fn name(&self) -> &'static str {
            "stubborn"
        }

        fn description(&self) -> &'static str {
            "always reports a rewrite"
        }

        fn mode(&self) -> PassMode {
            PassMode::FixedPoint
        }

        fn exit_stmt(&mut self, _stmt: &mut Stmt, _cx: &mut PassContext<'_>) -> TransformResult<bool> {
            Ok(true)
        }
    }

    fn file_with(expr: Expr) -> File {
        let pos = Pos::new(2, 1);
        let mut file = File::new("loop.st", "main");
        file.decls.push(Decl::Func(FuncDecl {
            recv: None,
            name: Ident::new("f", pos),
            ty: FuncType::default(),
            body: Some(Block {
                stmts: vec![Stmt::new(StmtKind::Expr(expr), pos)],
                pos,
            }),
            pos,
        }));
        file
    }

    #[test]
    fn test_ceiling_scales_with_depth() {
        let pos = Pos::new(1, 1);
        let shallow = file_with(Expr::ident("x", pos));
        let deep = file_with(Expr::binary(
            BinaryOp::Concat,
            Expr::binary(BinaryOp::Concat, Expr::ident("a", pos), Expr::ident("b", pos)),
            Expr::ident("c", pos),
        ));
        let config = TransformConfig::default();
        assert_eq!(fixed_point_ceiling(&shallow, &config), 10);
        assert_eq!(fixed_point_ceiling(&deep, &config), 14);

        let config = TransformConfig {
            max_fixed_point_iterations: Some(3),
            ..Default::default()
        };
        assert_eq!(fixed_point_ceiling(&deep, &config), 3);
    }

    #[test]
    fn test_non_converging_pass_hits_limit() {
        let config = TransformConfig {
            max_fixed_point_iterations: Some(4),
            ..Default::default()
        };
        let mut transformer = Transformer::new(&config);
        transformer.add_pass(Box::new(Stubborn));

        let mut file = file_with(Expr::ident("x", Pos::new(2, 1)));
        let err = transformer
            .run(&mut file, &mut ImportSet::new(), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, TransformError::PassLimit { pass: "stubborn", limit: 4 }));

        let stats = &transformer.stats()["stubborn"];
        assert_eq!(stats.traversals, 4);
        assert_eq!(stats.errors, 1);
    }
}
