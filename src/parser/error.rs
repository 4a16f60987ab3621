use thiserror::Error;

use super::locations::{Locatable, Span};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("unexpected token '{found}' at {span}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },
    #[error("integer literal '{lexeme}' at {span} is out of range")]
    InvalidInteger { lexeme: String, span: Span },
    #[error("line nests too deeply at {span}")]
    TooDeeplyNested { span: Span },
}

impl SyntaxError {
    pub(super) fn unexpected(found: &str, expected: &str, span: Span) -> Self {
        Self::UnexpectedToken {
            found: found.to_string(),
            expected: expected.to_string(),
            span,
        }
    }
}

impl Locatable for SyntaxError {
    fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. } => *span,
            Self::InvalidInteger { span, .. } => *span,
            Self::TooDeeplyNested { span } => *span,
        }
    }
}
