use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, ExitCode, Stdio};

use clap::builder::ArgPredicate;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as ReplResult};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use minipy::{
    build_source, compile_source, interpret_source, lexical_report, parse, parse_source,
    tokenize_line, CompileOutcome, Diagnostic, Interpreter, Toolchain,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Interpret the program.
    Run,
    /// Print every token of every line.
    Tokens,
    /// Print the parsed statements.
    Ast,
    /// Print the generated C source.
    C,
}

/// Run, inspect or compile programs written in a tiny Python subset.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Source file. Starts an interactive session when omitted.
    file: Option<PathBuf>,

    /// What to do with the source. Defaults to `c` when `--output` is given.
    #[arg(
        long,
        value_enum,
        default_value_t = Emit::Run,
        default_value_if("output", ArgPredicate::IsPresent, "c")
    )]
    emit: Emit,

    /// Build an executable at this path instead of printing the C source.
    /// Only valid with `--emit c`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// C compiler used together with `--output`.
    #[arg(long, env = "CC", default_value = "cc")]
    cc: String,
}

impl Args {
    fn try_parse_checked<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = Self::try_parse_from(args)?;
        if args.output.is_some() && args.emit != Emit::C {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                "--output can only be used with --emit c",
            ));
        }
        Ok(args)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = Args::try_parse_checked(std::env::args_os()).unwrap_or_else(|err| err.exit());
    let Some(path) = args.file.as_ref() else {
        return match run_repl() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {err}");
                ExitCode::FAILURE
            }
        };
    };
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };
    let lines = source.lines().collect::<Vec<_>>();
    info!(file = %path.display(), lines = lines.len(), emit = ?args.emit, "processing");

    match (args.emit, args.output.as_ref()) {
        (Emit::Run, _) => report(&interpret_source(&lines, io::stdout().lock())),
        (Emit::Tokens, _) => {
            print!("{}", lexical_report(&lines));
            ExitCode::SUCCESS
        }
        (Emit::Ast, _) => {
            let (program, diagnostics) = parse_source(&lines);
            for statement in &program {
                println!("{statement:?}");
            }
            report(&diagnostics)
        }
        (Emit::C, None) => match compile_source(&lines) {
            Ok(c) => {
                print!("{c}");
                ExitCode::SUCCESS
            }
            Err(diagnostics) => report(&diagnostics),
        },
        (Emit::C, Some(output)) => {
            let compiler = SystemCompiler {
                cc: args.cc.clone(),
                output: output.clone(),
            };
            match build_source(&lines, &compiler) {
                Ok(outcome) => {
                    if !outcome.diagnostics.is_empty() {
                        eprint!("{}", outcome.diagnostics);
                    }
                    if outcome.success {
                        println!("Built {}", output.display());
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(diagnostics) => report(&diagnostics),
            }
        }
    }
}

fn report(diagnostics: &[Diagnostic]) -> ExitCode {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
    if diagnostics.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_repl() -> ReplResult<()> {
    let mut rl = DefaultEditor::new()?;
    let mut interpreter = Interpreter::stdout();
    let mut lineno = 0;
    loop {
        let readline = rl.readline(">> ");
        match readline {
            Ok(line) => {
                lineno += 1;
                rl.add_history_entry(line.as_str())?;
                let statements = match parse(&tokenize_line(&line, lineno)) {
                    Ok(statements) => statements,
                    Err(err) => {
                        eprintln!("{}", Diagnostic::new(lineno, err));
                        continue;
                    }
                };
                // An evaluation error only abandons the rest of this line.
                for statement in &statements {
                    if let Err(err) = interpreter.evaluate(statement) {
                        eprintln!("{}", Diagnostic::new(lineno, err));
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}

/// Pipes generated C into the system compiler on stdin.
struct SystemCompiler {
    cc: String,
    output: PathBuf,
}

impl Toolchain for SystemCompiler {
    fn compile(&self, source: &str) -> CompileOutcome {
        let cc = match which::which(&self.cc) {
            Ok(cc) => cc,
            Err(err) => return CompileOutcome::failed(format!("{}: {err}\n", self.cc)),
        };
        debug!(cc = %cc.display(), output = %self.output.display(), "invoking C compiler");
        let child = Command::new(&cc)
            .args(["-x", "c", "-", "-o"])
            .arg(&self.output)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match child {
            Ok(child) => child,
            Err(err) => return CompileOutcome::failed(format!("{}: {err}\n", cc.display())),
        };
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(source.as_bytes()) {
                return CompileOutcome::failed(format!("writing to {}: {err}\n", cc.display()));
            }
        }
        match child.wait_with_output() {
            Ok(output) => {
                let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
                diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
                if output.status.success() {
                    CompileOutcome::succeeded(diagnostics)
                } else {
                    CompileOutcome::failed(diagnostics)
                }
            }
            Err(err) => CompileOutcome::failed(format!("{}: {err}\n", cc.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_from(argv: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_checked(std::iter::once("minipy").chain(argv.iter().copied()))
    }

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = args_from(&["prog.py"]).unwrap();
        assert_eq!(args.emit, Emit::Run);
        assert_eq!(args.output, None);
        assert!(args_from(&[]).unwrap().file.is_none());
    }

    #[test]
    fn test_output_implies_c() {
        let args = args_from(&["prog.py", "-o", "prog"]).unwrap();
        assert_eq!(args.emit, Emit::C);
        assert_eq!(args.output, Some(PathBuf::from("prog")));
        assert!(args_from(&["prog.py", "--emit", "c", "--output", "prog"]).is_ok());
    }

    #[test]
    fn test_output_rejected_for_other_modes() {
        for mode in ["run", "tokens", "ast"] {
            let err = args_from(&["prog.py", "--emit", mode, "-o", "prog"]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ArgumentConflict, "--emit {mode}");
        }
    }
}
