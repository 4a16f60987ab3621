use std::collections::HashMap;
use std::io::{self, Write};

use thiserror::Error;
use tracing::trace;

use crate::error::Diagnostic;
use crate::parser::{BinaryOperator, Expression, Locatable, Program, Statement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
    /// What an unbound name evaluates to.
    None,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Str(_) => "str",
            Self::None => "NoneType",
        }
    }

    /// Everything except the zero integer and `None` is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Int(0) | Self::None)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
            Self::None => f.write_str("None"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("unsupported operand type(s) for {operator}: '{left}' and '{right}'")]
    UnsupportedOperation {
        operator: BinaryOperator,
        left: &'static str,
        right: &'static str,
    },
    #[error("integer division or modulo by zero")]
    ZeroDivision,
    #[error("integer overflow in {left} {operator} {right}")]
    Overflow {
        operator: BinaryOperator,
        left: i64,
        right: i64,
    },
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Tree-walking evaluator. Printed values go to `out`, one per line.
pub struct Interpreter<W> {
    env: Environment,
    out: W,
}

impl Interpreter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Interpreter<W> {
    pub fn new(out: W) -> Self {
        Self {
            env: Environment::new(),
            out,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Evaluate every statement in order. The first failure ends the run.
    pub fn run(&mut self, program: &Program) -> Result<(), Diagnostic> {
        for statement in program {
            self.evaluate(statement)
                .map_err(|e| Diagnostic::new(statement.line(), e))?;
        }
        Ok(())
    }

    pub fn evaluate(&mut self, statement: &Statement) -> Result<(), EvaluationError> {
        match statement {
            Statement::Assignment(name, expr, _) => {
                let value = self.evaluate_expr(expr)?;
                trace!(%name, %value, "binding");
                self.env.set(name.as_str(), value);
            }
            Statement::Print(expr, _) => {
                let value = self.evaluate_expr(expr)?;
                writeln!(self.out, "{value}")?;
            }
            Statement::If(condition, body, _) => {
                if self.evaluate_expr(condition)?.is_truthy() {
                    self.evaluate(body)?;
                }
            }
        }
        Ok(())
    }

    pub fn evaluate_expr(&self, expression: &Expression) -> Result<Value, EvaluationError> {
        match expression {
            Expression::Number(n) => Ok(Value::Int(*n)),
            Expression::Str(s) => Ok(Value::Str(s.clone())),
            Expression::Name(name) => Ok(self.env.get(name).cloned().unwrap_or(Value::None)),
            Expression::BinaryOperation(op, operands) => {
                let (larg, rarg) = operands.as_ref();
                let left = self.evaluate_expr(larg)?;
                let right = self.evaluate_expr(rarg)?;
                apply(*op, &left, &right)
            }
        }
    }
}

pub fn apply(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value, EvaluationError> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => arithmetic(op, *l, *r).map(Value::Int),
        _ => Err(EvaluationError::UnsupportedOperation {
            operator: op,
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

fn arithmetic(op: BinaryOperator, l: i64, r: i64) -> Result<i64, EvaluationError> {
    let overflow = || EvaluationError::Overflow {
        operator: op,
        left: l,
        right: r,
    };
    if r == 0 && matches!(op, BinaryOperator::Divide | BinaryOperator::Modulo) {
        return Err(EvaluationError::ZeroDivision);
    }
    match op {
        BinaryOperator::Plus => l.checked_add(r).ok_or_else(overflow),
        BinaryOperator::Minus => l.checked_sub(r).ok_or_else(overflow),
        BinaryOperator::Times => l.checked_mul(r).ok_or_else(overflow),
        BinaryOperator::Divide => floor_div(l, r).ok_or_else(overflow),
        BinaryOperator::Modulo => Ok(floor_mod(l, r)),
    }
}

/// Quotient rounded towards negative infinity. `r` must be non-zero.
pub fn floor_div(l: i64, r: i64) -> Option<i64> {
    let q = l.checked_div(r)?;
    if l % r != 0 && (l < 0) != (r < 0) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

/// Remainder whose sign follows the divisor. `r` must be non-zero.
pub fn floor_mod(l: i64, r: i64) -> i64 {
    let rem = l.wrapping_rem(r);
    if rem != 0 && (rem < 0) != (r < 0) {
        rem + r
    } else {
        rem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, tokenize_line};

    fn program(lines: &[&str]) -> Program {
        let statements = lines
            .iter()
            .enumerate()
            .flat_map(|(i, line)| parse(&tokenize_line(line, i + 1)).expect("line should parse"))
            .collect();
        Program::new(statements)
    }

    fn output_of(lines: &[&str]) -> String {
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.run(&program(lines)).expect("program should run");
        String::from_utf8(interpreter.into_output()).unwrap()
    }

    #[test]
    fn test_print_sum_of_variables() {
        assert_eq!(output_of(&["x = 10", "y = 20", "print(x + y)"]), "30\n");
    }

    #[test]
    fn test_if_with_false_condition_is_skipped() {
        assert_eq!(output_of(&["x = 0", "if x: print(1)", "print(2)"]), "2\n");
    }

    #[test]
    fn test_nested_if() {
        assert_eq!(output_of(&["if 1: if 0: print(5)"]), "");
        assert_eq!(output_of(&["if 1: if 2: print(5)"]), "5\n");
    }

    #[test]
    fn test_modulo_follows_divisor_sign() {
        assert_eq!(output_of(&["x = 7", "print(x % 2)"]), "1\n");
        assert_eq!(output_of(&["x = -7", "print(x % 2)"]), "1\n");
        assert_eq!(output_of(&["x = 7", "print(x % -2)"]), "-1\n");
        assert_eq!(output_of(&["x = -7", "print(x % -2)"]), "-1\n");
    }

    #[test]
    fn test_division_floors() {
        assert_eq!(output_of(&["x = -7", "print(x / 2)"]), "-4\n");
        assert_eq!(output_of(&["print(7 / 2)"]), "3\n");
        assert_eq!(output_of(&["x = 7", "print(x / -2)"]), "-4\n");
        assert_eq!(output_of(&["x = -8", "print(x / 2)"]), "-4\n");
    }

    #[test]
    fn test_precedence_and_parentheses() {
        assert_eq!(output_of(&["print(2 + 3 * 4)"]), "14\n");
        assert_eq!(output_of(&["print((2 + 3) * 4)"]), "20\n");
        assert_eq!(output_of(&["print(10 - 4 - 3)"]), "3\n");
        assert_eq!(output_of(&["print(100 / 10 / 5)"]), "2\n");
    }

    #[test]
    fn test_reassignment_overwrites() {
        assert_eq!(output_of(&["x = 1", "x = x + 1", "print(x)"]), "2\n");
    }

    #[test]
    fn test_strings_and_unbound_names() {
        assert_eq!(output_of(&["s = 'hello'", "print(s)"]), "hello\n");
        assert_eq!(output_of(&["print(missing)"]), "None\n");
        assert_eq!(output_of(&["if missing: print(1)"]), "");
        assert_eq!(output_of(&["if \"\": print(1)"]), "1\n");
    }

    #[test]
    fn test_unbound_name_is_not_stored() {
        let mut interpreter = Interpreter::new(Vec::new());
        interpreter.run(&program(&["print(ghost)"])).unwrap();
        assert!(interpreter.environment().get("ghost").is_none());
        assert!(interpreter.environment().is_empty());
    }

    #[test]
    fn test_string_arithmetic_is_unsupported() {
        let mut interpreter = Interpreter::new(Vec::new());
        let err = interpreter
            .run(&program(&["s = 'a'", "print(s % 2)"]))
            .unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.to_string().contains("unsupported operand type(s) for %: 'str' and 'int'"));
    }

    #[test]
    fn test_none_arithmetic_is_unsupported() {
        let result = apply(BinaryOperator::Plus, &Value::None, &Value::Int(1));
        assert!(matches!(
            result,
            Err(EvaluationError::UnsupportedOperation { left: "NoneType", right: "int", .. })
        ));
    }

    #[test]
    fn test_zero_division_and_overflow() {
        assert!(matches!(
            apply(BinaryOperator::Divide, &Value::Int(1), &Value::Int(0)),
            Err(EvaluationError::ZeroDivision)
        ));
        assert!(matches!(
            apply(BinaryOperator::Modulo, &Value::Int(1), &Value::Int(0)),
            Err(EvaluationError::ZeroDivision)
        ));
        assert!(matches!(
            apply(BinaryOperator::Plus, &Value::Int(i64::MAX), &Value::Int(1)),
            Err(EvaluationError::Overflow { .. })
        ));
        assert!(matches!(
            apply(BinaryOperator::Divide, &Value::Int(i64::MIN), &Value::Int(-1)),
            Err(EvaluationError::Overflow { .. })
        ));
        assert_eq!(
            apply(BinaryOperator::Modulo, &Value::Int(i64::MIN), &Value::Int(-1)).unwrap(),
            Value::Int(0)
        );
    }

    #[test]
    fn test_floor_arithmetic_grid() {
        for l in -9i64..=9 {
            for r in [-4i64, -3, -1, 1, 2, 5] {
                let q = floor_div(l, r).unwrap();
                let m = floor_mod(l, r);
                assert_eq!(q * r + m, l, "{l} = ({l} / {r}) * {r} + ({l} % {r})");
                assert!(m == 0 || (m < 0) == (r < 0), "{l} % {r} = {m}");
                assert!(m.abs() < r.abs());
            }
        }
    }
}
