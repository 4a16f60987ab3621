//! Code generation: lower the parsed statements into a C translation unit.
//!
//! Every runtime value is assumed to be a `long long`. Each assigned name is
//! declared exactly once at the top of `main` (initialised to zero) and every
//! assignment becomes a plain store, so reassigning a name, or assigning it
//! inside an `if` body, stays valid C. Names are emitted with a `v_` prefix,
//! which keeps them clear of C keywords, `<stdio.h>` macros and reserved
//! `_`-uppercase identifiers.
//!
//! A name may only be read once it is assigned on every path leading to the
//! read. The interpreter would print `None` for such a read, which has no
//! `long long` counterpart.
//!
//! `/` and `%` are emitted as calls to `floor_div` and `floor_mod`, which round
//! towards negative infinity like the interpreter does and exit with status 1
//! on a zero divisor.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::parser::{BinaryOperator, Expression, Locatable, Statement};

const INDENT: &str = "    ";
const PREFIX: &str = "v_";

const FLOOR_HELPERS: &str = "\
static long long floor_div(long long a, long long b) {
    if (b == 0) {
        fputs(\"ZeroDivisionError: integer division or modulo by zero\\n\", stderr);
        exit(1);
    }
    long long q = a / b;
    if (a % b != 0 && (a < 0) != (b < 0)) {
        q -= 1;
    }
    return q;
}

static long long floor_mod(long long a, long long b) {
    if (b == 0) {
        fputs(\"ZeroDivisionError: integer division or modulo by zero\\n\", stderr);
        exit(1);
    }
    long long r = a % b;
    if (r != 0 && (r < 0) != (b < 0)) {
        r += b;
    }
    return r;
}

";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("string literals cannot be compiled, only integers are supported")]
    UnsupportedString { line: usize },
    #[error("name '{name}' may be read before it is assigned")]
    UndefinedVariable { name: String, line: usize },
}

impl CodegenError {
    pub fn line(&self) -> usize {
        match self {
            Self::UnsupportedString { line } => *line,
            Self::UndefinedVariable { line, .. } => *line,
        }
    }
}

/// Emit C source for a statement list.
pub fn generate(statements: &[Statement]) -> Result<String, CodegenError> {
    let mut assigned = HashSet::new();
    for statement in statements {
        check_stmt(statement, &mut assigned)?;
    }
    let variables = declared_names(statements);
    let floor_ops = statements.iter().any(uses_floor_ops);
    debug!(variables = variables.len(), statements = statements.len(), floor_ops, "generating C");

    let mut c = String::new();
    c.push_str("#include <stdio.h>\n");
    if floor_ops {
        c.push_str("#include <stdlib.h>\n\n");
        c.push_str(FLOOR_HELPERS);
    } else {
        c.push('\n');
    }
    c.push_str("int main(void) {\n");
    for name in &variables {
        c.push_str(&format!("{INDENT}long long {PREFIX}{name} = 0;\n"));
    }
    for statement in statements {
        emit_stmt(statement, 1, &mut c);
    }
    c.push_str(&format!("{INDENT}return 0;\n"));
    c.push_str("}\n");
    Ok(c)
}

/// Assigned names in order of first appearance, nested bodies included.
fn declared_names(statements: &[Statement]) -> Vec<String> {
    fn collect(statement: &Statement, seen: &mut HashSet<String>, names: &mut Vec<String>) {
        match statement {
            Statement::Assignment(name, _, _) => {
                if seen.insert(name.clone()) {
                    names.push(name.clone());
                }
            }
            Statement::Print(_, _) => {}
            Statement::If(_, body, _) => collect(body, seen, names),
        }
    }

    let mut seen = HashSet::new();
    let mut names = vec![];
    for statement in statements {
        collect(statement, &mut seen, &mut names);
    }
    names
}

fn uses_floor_ops(statement: &Statement) -> bool {
    fn in_expr(expr: &Expression) -> bool {
        match expr {
            Expression::BinaryOperation(BinaryOperator::Divide | BinaryOperator::Modulo, _) => true,
            Expression::BinaryOperation(_, operands) => {
                in_expr(&operands.0) || in_expr(&operands.1)
            }
            Expression::Number(_) | Expression::Str(_) | Expression::Name(_) => false,
        }
    }

    match statement {
        Statement::Assignment(_, expr, _) | Statement::Print(expr, _) => in_expr(expr),
        Statement::If(condition, body, _) => in_expr(condition) || uses_floor_ops(body),
    }
}

/// `assigned` holds the names bound on every path reaching `statement`.
fn check_stmt(statement: &Statement, assigned: &mut HashSet<String>) -> Result<(), CodegenError> {
    let line = statement.line();
    match statement {
        Statement::Assignment(name, expr, _) => {
            check_expr(expr, assigned, line)?;
            assigned.insert(name.clone());
            Ok(())
        }
        Statement::Print(expr, _) => check_expr(expr, assigned, line),
        Statement::If(condition, body, _) => {
            check_expr(condition, assigned, line)?;
            // bindings made in the body do not survive past the `if`
            check_stmt(body, &mut assigned.clone())
        }
    }
}

fn check_expr(
    expr: &Expression,
    assigned: &HashSet<String>,
    line: usize,
) -> Result<(), CodegenError> {
    match expr {
        Expression::Number(_) => Ok(()),
        Expression::Str(_) => Err(CodegenError::UnsupportedString { line }),
        Expression::Name(name) => {
            if assigned.contains(name) {
                Ok(())
            } else {
                Err(CodegenError::UndefinedVariable {
                    name: name.clone(),
                    line,
                })
            }
        }
        Expression::BinaryOperation(_, operands) => {
            check_expr(&operands.0, assigned, line)?;
            check_expr(&operands.1, assigned, line)
        }
    }
}

fn emit_stmt(statement: &Statement, depth: usize, c: &mut String) {
    let indent = INDENT.repeat(depth);
    match statement {
        Statement::Assignment(name, expr, _) => {
            c.push_str(&format!("{indent}{PREFIX}{name} = {};\n", emit_expr(expr)));
        }
        Statement::Print(expr, _) => {
            c.push_str(&format!("{indent}printf(\"%lld\\n\", {});\n", emit_expr(expr)));
        }
        Statement::If(condition, body, _) => {
            c.push_str(&format!("{indent}if ({}) {{\n", emit_expr(condition)));
            emit_stmt(body, depth + 1, c);
            c.push_str(&format!("{indent}}}\n"));
        }
    }
}

fn emit_expr(expr: &Expression) -> String {
    match expr {
        Expression::Number(value) => format!("{value}LL"),
        Expression::Name(name) => format!("{PREFIX}{name}"),
        Expression::BinaryOperation(op, operands) => {
            let (larg, rarg) = operands.as_ref();
            let (l, r) = (emit_expr(larg), emit_expr(rarg));
            match op {
                BinaryOperator::Divide => format!("floor_div({l}, {r})"),
                BinaryOperator::Modulo => format!("floor_mod({l}, {r})"),
                _ => format!("({l} {} {r})", op.symbol()),
            }
        }
        // rejected by check_expr before emission starts
        Expression::Str(s) => format!("{s:?}"),
    }
}
