//! Diagnostic records produced by the lowering passes and the const checker.

use std::fmt;

use serde::Serialize;

use crate::ast::Pos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    UnsupportedConstruct,
    UnresolvedType,
    ConstMutation,
    InternalPassLimit,
    /// A generic built-in fell back to the reflective helper.
    ReflectiveFallback,
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::ReflectiveFallback => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::UnsupportedConstruct => "unsupported construct",
            DiagnosticKind::UnresolvedType => "unresolved type",
            DiagnosticKind::ConstMutation => "const mutation",
            DiagnosticKind::InternalPassLimit => "internal error",
            DiagnosticKind::ReflectiveFallback => "reflective fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub pos: Pos,
    pub related: Option<Pos>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, pos: Pos) -> Self {
        Self {
            kind,
            message: message.into(),
            pos,
            related: None,
        }
    }

    pub fn with_related(mut self, related: Pos) -> Self {
        self.related = Some(related);
        self
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {level} ({}): {}", self.pos, self.kind.label(), self.message)?;
        if let Some(related) = self.related {
            write!(f, " (declared at {related})")?;
        }
        Ok(())
    }
}
