use super::ast::Statement;
use super::tokenizer::Token;

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

pub trait Locatable {
    fn span(&self) -> Span;

    fn line(&self) -> usize {
        self.span().start.line
    }
}

/// Half-open column range of a lexeme on a single source line.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    pub(crate) fn new(line: usize, start_col: usize, end_col: usize) -> Self {
        Self {
            start: Location {
                line,
                column: start_col,
            },
            end: Location {
                line,
                column: end_col,
            },
        }
    }

    /// Zero-width span just past the last column, used for end-of-line errors.
    pub(crate) fn end_of(line: usize, column: usize) -> Self {
        Self::new(line, column, column)
    }

    pub(crate) fn till<R: Locatable>(&self, other: &R) -> Self {
        Self {
            start: self.start,
            end: other.span().end,
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.start)
    }
}

impl Locatable for Token {
    fn span(&self) -> Span {
        self.span
    }
}

impl Locatable for Span {
    fn span(&self) -> Span {
        *self
    }
}

impl<R> Locatable for Box<R>
where
    R: Locatable,
{
    fn span(&self) -> Span {
        (**self).span()
    }
}

impl Locatable for Statement {
    fn span(&self) -> Span {
        match self {
            Self::Assignment(_, _, s) => *s,
            Self::Print(_, s) => *s,
            Self::If(_, _, s) => *s,
        }
    }
}
