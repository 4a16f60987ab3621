//! Line-tagged diagnostics shared by the pipeline drivers.

use thiserror::Error;

use crate::codegen::CodegenError;
use crate::interpreter::EvaluationError;
use crate::parser::SyntaxError;

#[derive(Debug, Error)]
pub enum DiagnosticKind {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error("codegen error: {0}")]
    Codegen(#[from] CodegenError),
}

/// An error the user sees, tagged with the 1-based source line it belongs to.
#[derive(Debug, Error)]
#[error("line {line}: {kind}")]
pub struct Diagnostic {
    pub line: usize,
    #[source]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(line: usize, kind: impl Into<DiagnosticKind>) -> Self {
        Self {
            line,
            kind: kind.into(),
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self.kind, DiagnosticKind::Syntax(_))
    }
}
