use thiserror::Error;

use crate::ast::Pos;
use crate::diagnostics::{Diagnostic, DiagnosticKind};

/// Errors that abort the lowering of a single file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("{pos}: unsupported construct: {message}")]
    UnsupportedConstruct { message: String, pos: Pos },

    #[error("{pos}: unresolved type: {message}")]
    UnresolvedType { message: String, pos: Pos },

    #[error("{} immutable binding(s) mutated", .0.len())]
    ConstViolations(Vec<Diagnostic>),

    #[error("internal error: pass '{pass}' did not converge within {limit} iterations")]
    PassLimit { pass: &'static str, limit: usize },
}

impl TransformError {
    pub fn unsupported(message: impl Into<String>, pos: Pos) -> Self {
        Self::UnsupportedConstruct {
            message: message.into(),
            pos,
        }
    }

    pub fn unresolved(message: impl Into<String>, pos: Pos) -> Self {
        Self::UnresolvedType {
            message: message.into(),
            pos,
        }
    }

    /// Flatten into diagnostic records for reporting.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            TransformError::UnsupportedConstruct { message, pos } => {
                vec![Diagnostic::new(DiagnosticKind::UnsupportedConstruct, message.clone(), *pos)]
            }
            TransformError::UnresolvedType { message, pos } => {
                vec![Diagnostic::new(DiagnosticKind::UnresolvedType, message.clone(), *pos)]
            }
            TransformError::ConstViolations(violations) => violations.clone(),
            TransformError::PassLimit { pass, limit } => vec![Diagnostic::new(
                DiagnosticKind::InternalPassLimit,
                format!("pass '{pass}' did not converge within {limit} iterations"),
                Pos::default(),
            )],
        }
    }
}

pub type TransformResult<T> = std::result::Result<T, TransformError>;
