/*!
# Const Checker

Stratum lets `const` bind values of any type, which the base language cannot
express. The binding is emitted as an ordinary declaration, so immutability
is enforced here, before lowering.

The checker runs in two states over the same file. `Collecting` gathers
every `const` name and its position, grouped or not, at any nesting level,
into one flat file-wide table. `Checking` then visits every `=` and compound
assignment, every `++`/`--` and every non-declaring `range` clause, strips the
target down to its base identifier and reports each one that names a
constant. `:=` declares and is never a mutation.
*/

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{DeclKind, Expr, ExprKind, File, GenDecl, Pos, Spec, Stmt, StmtKind};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::errors::{TransformError, TransformResult};
use crate::transform::{AstWalker, Inspector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckerState {
    Collecting,
    Checking,
}

#[derive(Debug)]
pub struct ConstChecker {
    state: CheckerState,
    consts: IndexMap<String, Pos>,
    violations: Vec<Diagnostic>,
}

impl Default for ConstChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstChecker {
    pub fn new() -> Self {
        Self {
            state: CheckerState::Collecting,
            consts: IndexMap::new(),
            violations: Vec::new(),
        }
    }

    pub fn state(&self) -> CheckerState {
        self.state
    }

    /// Every constant seen so far, in declaration order.
    pub fn declarations(&self) -> &IndexMap<String, Pos> {
        &self.consts
    }

    /// Gather the file's constants and move to `Checking`.
    pub fn collect(&mut self, file: &File) {
        self.state = CheckerState::Collecting;
        AstWalker::inspect_file(file, self);
        self.state = CheckerState::Checking;
        debug!(file = %file.name, consts = self.consts.len(), "collected constants");
    }

    /// Report every mutation of a collected constant. Collects first if
    /// that has not happened yet.
    pub fn check(&mut self, file: &File) -> &[Diagnostic] {
        if self.state == CheckerState::Collecting {
            self.collect(file);
        }
        self.violations.clear();
        if !self.consts.is_empty() {
            AstWalker::inspect_file(file, self);
        }
        debug!(file = %file.name, violations = self.violations.len(), "const check done");
        &self.violations
    }

    /// Collect and check `file`; any violation fails it.
    pub fn run(file: &File) -> TransformResult<()> {
        let mut checker = Self::new();
        checker.check(file);
        if checker.violations.is_empty() {
            Ok(())
        } else {
            Err(TransformError::ConstViolations(checker.violations))
        }
    }

    pub fn into_violations(self) -> Vec<Diagnostic> {
        self.violations
    }

    fn record_consts(&mut self, decl: &GenDecl) {
        if decl.kind != DeclKind::Const {
            return;
        }
        for spec in &decl.specs {
            let Spec::Value(spec) = spec else {
                continue;
            };
            for name in spec.names.iter().filter(|name| !name.is_blank()) {
                self.consts.entry(name.name.clone()).or_insert(name.pos);
            }
        }
    }

    fn check_target(&mut self, target: &Expr, stmt_pos: Pos, action: &str) {
        let Some(base) = base_identifier(target) else {
            return;
        };
        let Some(name) = base.as_ident() else {
            return;
        };
        let Some(&declared) = self.consts.get(name) else {
            return;
        };
        let pos = if base.pos.is_known() { base.pos } else { stmt_pos };
        self.violations.push(
            Diagnostic::new(
                DiagnosticKind::ConstMutation,
                format!("cannot {action} {name}: it is declared const"),
                pos,
            )
            .with_related(declared),
        );
    }
}

/// The identifier a mutation target ultimately writes through.
fn base_identifier(expr: &Expr) -> Option<&Expr> {
    match &expr.kind {
        ExprKind::Ident(_) => Some(expr),
        ExprKind::Paren(inner)
        | ExprKind::Star(inner)
        | ExprKind::Selector { base: inner, .. }
        | ExprKind::Index { base: inner, .. }
        | ExprKind::Slice { base: inner, .. } => base_identifier(inner),
        _ => None,
    }
}

impl Inspector for ConstChecker {
    fn gen_decl(&mut self, decl: &GenDecl) {
        if self.state == CheckerState::Collecting {
            self.record_consts(decl);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        if self.state != CheckerState::Checking {
            return;
        }
        match &stmt.kind {
            StmtKind::Assign { lhs, op, .. } if op.mutates() => {
                for target in lhs {
                    self.check_target(target, stmt.pos, "assign to");
                }
            }
            StmtKind::IncDec { target, inc } => {
                let action = if *inc { "increment" } else { "decrement" };
                self.check_target(target, stmt.pos, action);
            }
            StmtKind::Range {
                key,
                value,
                define: false,
                ..
            } => {
                for target in [key, value].into_iter().flatten() {
                    self.check_target(target, stmt.pos, "assign to");
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::ast::{AssignOp, Decl};

    fn limit_file(stmts: Vec<Stmt>) -> File {
        file(vec![
            Decl::Gen(constant("Limit", int(10), Pos::new(3, 7))),
            func("main", vec![], vec![], stmts),
        ])
    }

    #[test]
    fn test_single_violation_references_both_positions() {
        let file = limit_file(vec![assign(id("Limit").at(5, 2), int(20))]);
        let mut checker = ConstChecker::new();
        let violations = checker.check(&file).to_vec();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, DiagnosticKind::ConstMutation);
        assert_eq!(violations[0].pos, Pos::new(5, 2));
        assert_eq!(violations[0].related, Some(Pos::new(3, 7)));
        assert!(violations[0].message.contains("Limit"));
        assert_eq!(checker.state(), CheckerState::Checking);
    }

    #[test]
    fn test_every_mutation_form_is_reported() {
        let file = limit_file(vec![
            assign_op(id("Limit"), AssignOp::Add, int(1)),
            inc(id("Limit")),
            dec(paren(id("Limit"))),
            assign(index(id("Limit"), int(0)), int(1)),
            assign(field_of(Expr::deref(id("Limit")), "N"), int(1)),
            Stmt::new(
                StmtKind::Range {
                    key: Some(id("Limit")),
                    value: None,
                    define: false,
                    target: id("xs"),
                    body: block(vec![]),
                },
                Pos::default(),
            ),
        ]);
        let err = ConstChecker::run(&file).unwrap_err();
        match err {
            TransformError::ConstViolations(violations) => {
                assert_eq!(violations.len(), 6);
                assert!(violations.iter().all(|v| v.related == Some(Pos::new(3, 7))));
                assert!(violations[1].message.contains("increment"));
                assert!(violations[2].message.contains("decrement"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_define_and_other_names_are_fine() {
        let file = limit_file(vec![
            define("n", id("Limit")),
            assign(id("n"), int(3)),
            define("Limit2", int(1)),
            range(Some("i"), None, id("xs"), vec![]),
        ]);
        assert!(ConstChecker::run(&file).is_ok());
    }

    #[test]
    fn test_grouped_and_nested_constants() {
        let file = file(vec![func(
            "main",
            vec![],
            vec![],
            vec![
                decl_stmt(constants(vec![
                    ("A", int(1), Pos::new(2, 3)),
                    ("B", lit(slice_ty(ty("int")), vec![]), Pos::new(3, 3)),
                ])),
                define(
                    "f",
                    func_lit(
                        vec![],
                        vec![],
                        vec![assign(index(id("B"), int(0)), int(2)).at(6, 4)],
                    ),
                ),
                if_stmt(id("ok"), vec![assign(id("A"), int(5))]),
            ],
        )]);
        let mut checker = ConstChecker::new();
        checker.collect(&file);
        assert_eq!(
            checker.declarations().keys().collect::<Vec<_>>(),
            vec!["A", "B"]
        );
        let violations = checker.check(&file);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].related, Some(Pos::new(3, 3)));
        assert_eq!(violations[0].pos, Pos::new(6, 4));
        assert_eq!(violations[1].related, Some(Pos::new(2, 3)));
    }

    #[test]
    fn test_message_rendering() {
        let file = limit_file(vec![assign(id("Limit").at(5, 2), int(20))]);
        let violations = {
            let mut checker = ConstChecker::new();
            checker.check(&file);
            checker.into_violations()
        };
        assert_eq!(
            violations[0].to_string(),
            "5:2: error (const mutation): cannot assign to Limit: it is declared const (declared at 3:7)"
        );
    }
}
