//! Crate root: wires together the pipeline for a tiny line-oriented Python
//! subset.
//!
//! - `parser` turns one line of text into tokens and then into statements.
//! - `interpreter` walks the statements against a name → value environment.
//! - `codegen` emits an equivalent C program instead of running it.
//! - `toolchain` is the seam to an external C compiler.
//! - `error` holds the line-tagged diagnostics the drivers below report.

pub mod codegen;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod toolchain;

use std::io::Write;

use tracing::warn;

pub use codegen::{generate, CodegenError};
pub use error::{Diagnostic, DiagnosticKind};
pub use interpreter::{Environment, EvaluationError, Interpreter, Value};
pub use parser::{parse, tokenize, tokenize_line, Program, Statement, SyntaxError, Token, TokenType};
pub use toolchain::{CompileOutcome, Toolchain};

/// The `--emit tokens` dump: a header, then per line an `Analyzing:` line and
/// one `lexeme --> TYPE` row per token.
pub fn lexical_report<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = String::from("Lexical Analysis Output:\n");
    for (i, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        report.push_str(&format!("\nAnalyzing: {line}\n"));
        for token in tokenize_line(line, i + 1) {
            report.push_str(&format!("{:<15} --> {}\n", token.lexeme(), token.typ()));
        }
    }
    report
}

/// Tokenize and parse every line. A line that fails to parse contributes no
/// statements and one diagnostic; the lines after it are still parsed.
pub fn parse_source<I, S>(lines: I) -> (Program, Vec<Diagnostic>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut statements = vec![];
    let mut diagnostics = vec![];
    for (i, line) in lines.into_iter().enumerate() {
        let lineno = i + 1;
        let tokens = tokenize_line(line.as_ref(), lineno);
        match parse(&tokens) {
            Ok(parsed) => statements.extend(parsed),
            Err(err) => {
                warn!(line = lineno, error = %err, "skipping line");
                diagnostics.push(Diagnostic::new(lineno, err));
            }
        }
    }
    (Program::new(statements), diagnostics)
}

/// Parse, then run whatever parsed. Printed values go to `out`.
///
/// Returns every diagnostic in line order: syntax errors, plus at most one
/// evaluation error, which ends the run.
pub fn interpret_source<I, S, W>(lines: I, out: W) -> Vec<Diagnostic>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    W: Write,
{
    let (program, mut diagnostics) = parse_source(lines);
    let mut interpreter = Interpreter::new(out);
    if let Err(err) = interpreter.run(&program) {
        diagnostics.push(err);
    }
    diagnostics.sort_by_key(|d| d.line);
    diagnostics
}

/// Parse, then emit C. Any syntax or codegen diagnostic fails the whole unit.
pub fn compile_source<I, S>(lines: I) -> Result<String, Vec<Diagnostic>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (program, diagnostics) = parse_source(lines);
    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }
    generate(&program.statements).map_err(|err| vec![Diagnostic::new(err.line(), err)])
}

/// Emit C and hand it to `toolchain`.
pub fn build_source<I, S, T>(lines: I, toolchain: &T) -> Result<CompileOutcome, Vec<Diagnostic>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    T: Toolchain + ?Sized,
{
    let source = compile_source(lines)?;
    Ok(toolchain.compile(&source))
}
