// # ========================= START OF THE GRAMMAR =========================

// # General grammatical elements and rules:
// #
// # * Strings with single quotes (') denote literal lexemes
// # * Upper case names (INTEGER) denote token types from the tokenizer
// # * One source line is parsed at a time. Every rule is predictive: the next
// #   unconsumed token picks the alternative, and the cursor never moves back.
// #
// # Grammar Syntax:
// #
// # e1 e2
// #   Match e1, then match e2.
// # e1 | e2
// #   Match e1 or e2.
// # ( e )
// #   Match e (allows also to use other operators in the group like '(e)*')
// # e*
// #   Match zero or more occurrences of e.

use tracing::debug;

use super::ast::*;
use super::error::SyntaxError;
use super::locations::{Locatable, Span};
use super::tokenizer::{Token, TokenType as TT};

const END_OF_LINE: &str = "end of line";

/// Deepest tree a single line may produce. Parenthesised groups, `if` bodies
/// and every operator in a chain each count as one level.
pub const MAX_NESTING: usize = 256;

/// Parse the tokens of one line into the statements it holds.
pub fn parse(input: &[Token]) -> Result<Vec<Statement>, SyntaxError> {
    Parser::new(input).program()
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    // # STARTING RULES
    // # ==============

    // program: statement*
    pub fn program(mut self) -> Result<Vec<Statement>, SyntaxError> {
        let mut statements = vec![];
        while self.peek().is_some() {
            let statement = self.statement()?;
            debug!(line = statement.line(), ?statement, "parsed statement");
            statements.push(statement);
        }
        Ok(statements)
    }

    // # STATEMENTS
    // # ==========

    // statement: print_stmt | assignment | if_stmt
    fn statement(&mut self) -> Result<Statement, SyntaxError> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("statement"));
        };
        match (token.typ, token.lexeme.as_str()) {
            (TT::IDENTIFIER, "print") => self.print_stmt(),
            (TT::KEYWORD, "if") => self.if_stmt(),
            (TT::IDENTIFIER, _) => self.assignment(),
            _ => Err(self.unexpected("statement")),
        }
    }

    // print_stmt: 'print' '(' expr ')'
    fn print_stmt(&mut self) -> Result<Statement, SyntaxError> {
        let start = self.expect("print")?.span;
        self.expect("(")?;
        let expr = self.expr()?;
        let end = self.expect(")")?;
        Ok(Statement::Print(expr, start.till(end)))
    }

    // assignment: IDENTIFIER '=' expr
    fn assignment(&mut self) -> Result<Statement, SyntaxError> {
        let Some(name) = self.advance() else {
            return Err(self.unexpected("identifier"));
        };
        self.expect("=")?;
        let expr = self.expr()?;
        let span = name.span.till(&self.last_span());
        Ok(Statement::Assignment(name.lexeme.clone(), expr, span))
    }

    // if_stmt: 'if' expr ':' statement
    fn if_stmt(&mut self) -> Result<Statement, SyntaxError> {
        let start = self.expect("if")?.span;
        let condition = self.expr()?;
        self.expect(":")?;
        self.nest()?;
        let body = self.statement()?;
        self.depth -= 1;
        let span = start.till(&body);
        Ok(Statement::If(condition, Box::new(body), span))
    }

    // # EXPRESSIONS
    // # ===========

    // expr: term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Expression, SyntaxError> {
        let base = self.depth;
        let mut left = self.term()?;
        while let Some(op) = self.operator(&[BinaryOperator::Plus, BinaryOperator::Minus]) {
            self.nest()?;
            let right = self.term()?;
            left = Expression::binary(op, left, right);
        }
        self.depth = base;
        Ok(left)
    }

    // term: factor (('*' | '/' | '%') factor)*
    fn term(&mut self) -> Result<Expression, SyntaxError> {
        let base = self.depth;
        let mut left = self.factor()?;
        while let Some(op) = self.operator(&[
            BinaryOperator::Times,
            BinaryOperator::Divide,
            BinaryOperator::Modulo,
        ]) {
            self.nest()?;
            let right = self.factor()?;
            left = Expression::binary(op, left, right);
        }
        self.depth = base;
        Ok(left)
    }

    // factor: INTEGER | STRING | IDENTIFIER | '(' expr ')'
    fn factor(&mut self) -> Result<Expression, SyntaxError> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("expression"));
        };
        let expr = match token.typ {
            TT::INTEGER => match token.lexeme.parse::<i64>() {
                Ok(value) => Expression::Number(value),
                Err(_) => {
                    return Err(SyntaxError::InvalidInteger {
                        lexeme: token.lexeme.clone(),
                        span: token.span,
                    })
                }
            },
            TT::STRING => Expression::Str(unquote(&token.lexeme)),
            TT::IDENTIFIER => Expression::Name(token.lexeme.clone()),
            TT::DELIMITER if token.lexeme == "(" => {
                self.nest()?;
                self.pos += 1;
                let inner = self.expr()?;
                self.expect(")")?;
                self.depth -= 1;
                return Ok(inner);
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.pos += 1;
        Ok(expr)
    }

    // # TOKEN HANDLING
    // # ==============

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Consume the current token if its lexeme is `value`, fail otherwise.
    fn expect(&mut self, value: &str) -> Result<&'a Token, SyntaxError> {
        match self.peek() {
            Some(token) if token.lexeme == value => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected(&format!("'{value}'"))),
        }
    }

    fn operator(&mut self, accepted: &[BinaryOperator]) -> Option<BinaryOperator> {
        let op = self
            .peek()
            .and_then(|token| BinaryOperator::try_from(token).ok())
            .filter(|op| accepted.contains(op))?;
        self.pos += 1;
        Some(op)
    }

    /// Enter one more level of nesting, failing at the current token once the
    /// line gets deeper than `MAX_NESTING`.
    fn nest(&mut self) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            let span = self.peek().map_or_else(|| self.end_span(), |token| token.span);
            return Err(SyntaxError::TooDeeplyNested { span });
        }
        Ok(())
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        match self.peek() {
            Some(token) => SyntaxError::unexpected(&token.lexeme, expected, token.span),
            None => SyntaxError::unexpected(END_OF_LINE, expected, self.end_span()),
        }
    }

    fn last_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|token| token.span)
            .unwrap_or_default()
    }

    fn end_span(&self) -> Span {
        self.tokens
            .last()
            .map(|token| Span::end_of(token.span.end.line, token.span.end.column))
            .unwrap_or_default()
    }
}

fn unquote(lexeme: &str) -> String {
    lexeme[1..lexeme.len() - 1].to_string()
}
