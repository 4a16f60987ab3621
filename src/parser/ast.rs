use derivative::Derivative;

use super::locations::Span;
use super::tokenizer::{Token, TokenType as TT};

#[derive(Clone, Derivative)]
#[derivative(Debug, PartialEq)]
pub enum Statement {
    Assignment(
        String,
        Expression,
        #[derivative(Debug = "ignore")] Span,
    ),
    Print(Expression, #[derivative(Debug = "ignore")] Span),
    // The body is a single statement, never a block.
    If(
        Expression,
        Box<Statement>,
        #[derivative(Debug = "ignore")] Span,
    ),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(i64),
    Str(String),
    Name(String),
    BinaryOperation(BinaryOperator, Box<(Expression, Expression)>),
}

impl Expression {
    pub(crate) fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Self::BinaryOperation(op, Box::new((left, right)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Times => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
        }
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TryFrom<&Token> for BinaryOperator {
    type Error = ();

    fn try_from(value: &Token) -> Result<Self, Self::Error> {
        if value.typ != TT::OPERATOR {
            return Err(());
        }
        match value.lexeme.as_str() {
            "+" => Ok(Self::Plus),
            "-" => Ok(Self::Minus),
            "*" => Ok(Self::Times),
            "/" => Ok(Self::Divide),
            "%" => Ok(Self::Modulo),
            _ => Err(()),
        }
    }
}

/// Top-level statements in source order, grouped by the line they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
    pub fn len(&self) -> usize {
        self.statements.len()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}
