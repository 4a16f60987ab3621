use super::locations::Span;
use const_format::concatcp;
use derivative::Derivative;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::cmp::Reverse;
use tracing::trace;

#[derive(Clone, Derivative)]
#[derivative(Debug, PartialEq)]
pub struct Token {
    pub(crate) typ: TokenType,
    pub(crate) lexeme: String,
    #[derivative(Debug = "ignore", PartialEq = "ignore")]
    pub(crate) span: Span,
}

impl Token {
    pub fn new(typ: TokenType, lexeme: &str) -> Self {
        Self {
            typ,
            lexeme: lexeme.to_string(),
            span: Span::default(),
        }
    }
    pub fn typ(&self) -> TokenType {
        self.typ
    }
    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }
    pub fn span(&self) -> Span {
        self.span
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}('{}')", self.typ, self.lexeme)
    }
}

#[allow(non_camel_case_types)]
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TokenType {
    STRING,
    FLOAT,
    INTEGER,
    IDENTIFIER,
    KEYWORD,
    OPERATOR,
    DELIMITER,
    #[default]
    UNKNOWN,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Operator lexemes, word forms included. Matching order is derived from this
/// table by `operators_by_length`, never from its textual order.
pub const OPERATORS: [&str; 26] = [
    "**=", "//=", "==", "!=", "<=", ">=", "**", "//", "+=", "-=", "*=", "/=", "%=", "=", "<",
    ">", "+", "-", "*", "/", "%", "and", "or", "not", "is", "in",
];

const WORD_OPERATORS: [&str; 5] = ["and", "or", "not", "is", "in"];

const DELIMITERS: [&str; 11] = ["(", ")", "[", "]", "{", "}", ":", ",", ".", ";", "@"];

macro_rules! alternative {
    ($t:expr) => {{
        $t
    }};
    ($t:expr, $($ts:expr),+) => {{
        concatcp!($t, "|", alternative!($($ts),+))
    }}
}

macro_rules! named {
    ($name:literal, $t:expr) => {{
        concatcp!("(?P<", $name, ">", $t, ")")
    }};
}

macro_rules! whole {
    ($t:expr) => {{
        concatcp!("^(?:", $t, ")$")
    }};
}

const S_COMMENT: &str = r"#.*";
const S_STRING: &str = r#"".*?"|'.*?'"#;
const S_FLOAT: &str = r"[+-]?(?:[0-9]+\.[0-9]*|\.[0-9]+)";
const S_INTEGER: &str = r"[+-]?[0-9]+";
const S_IDENTIFIER: &str = r"[A-Za-z_][A-Za-z_0-9]*";
const S_DELIMITER: &str = r"[()\[\]{}:;,.@]";
const S_SKIP: &str = r"\s+";
const S_MISMATCH: &str = r".";
const S_KEYWORDS: &str = r"^(False|None|True|and|as|assert|async|await|break|class|continue|def|del|elif|else|except|finally|for|from|global|if|import|in|is|lambda|nonlocal|not|or|pass|raise|return|try|while|with|yield)$";

// Everything tried before the operator alternation, in priority order.
const S_LEADING: &str = alternative!(
    named!("STRING", S_STRING),
    named!("FLOAT", S_FLOAT),
    named!("INTEGER", S_INTEGER),
    named!("IDENTIFIER", S_IDENTIFIER)
);
// Everything tried after it.
const S_TRAILING: &str = alternative!(
    named!("DELIMITER", S_DELIMITER),
    named!("SKIP", S_SKIP),
    named!("MISMATCH", S_MISMATCH)
);

const S_WHOLE_STRING: &str = whole!(S_STRING);
const S_WHOLE_FLOAT: &str = whole!(S_FLOAT);
const S_WHOLE_INTEGER: &str = whole!(S_INTEGER);
const S_WHOLE_IDENTIFIER: &str = whole!(S_IDENTIFIER);

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(S_COMMENT).expect("Error compiling regex."));
static KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(S_KEYWORDS).expect("Error compiling regex."));
static STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(S_WHOLE_STRING).expect("Error compiling regex."));
static FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(S_WHOLE_FLOAT).expect("Error compiling regex."));
static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(S_WHOLE_INTEGER).expect("Error compiling regex."));
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(S_WHOLE_IDENTIFIER).expect("Error compiling regex."));

// The regex engine picks the first alternative that matches at a position, so
// the operator alternation must list longer lexemes before their prefixes.
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    let operators = operators_by_length()
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!("{S_LEADING}|(?P<OPERATOR>{operators})|{S_TRAILING}");
    Regex::new(&pattern).expect("Error compiling regex.")
});

/// `None` marks whitespace, which never reaches the output.
const GROUPS: [(&str, Option<TokenType>); 8] = [
    ("STRING", Some(TokenType::STRING)),
    ("FLOAT", Some(TokenType::FLOAT)),
    ("INTEGER", Some(TokenType::INTEGER)),
    ("IDENTIFIER", Some(TokenType::IDENTIFIER)),
    ("OPERATOR", Some(TokenType::OPERATOR)),
    ("DELIMITER", Some(TokenType::DELIMITER)),
    ("SKIP", None),
    ("MISMATCH", Some(TokenType::UNKNOWN)),
];

pub(crate) fn operators_by_length() -> Vec<&'static str> {
    let mut operators = OPERATORS.to_vec();
    operators.sort_by_key(|op| Reverse(op.len()));
    operators
}

/// Tokenize a single line. Spans are reported on line 1.
pub fn tokenize(line: &str) -> Vec<Token> {
    tokenize_line(line, 1)
}

/// Tokenize a single line whose spans should point at `lineno` (1-based).
///
/// Never fails: characters that fit no pattern come back as `UNKNOWN` tokens.
/// Comments are stripped textually first, so a `#` inside a string literal
/// still ends the line.
pub fn tokenize_line(line: &str, lineno: usize) -> Vec<Token> {
    let code = COMMENT.replace(line, "");
    let mut tokens = vec![];
    for caps in TOKEN.captures_iter(&code) {
        if let Some(token) = token_from_captures(&caps, lineno) {
            tokens.push(token);
        }
    }
    trace!(line = lineno, count = tokens.len(), "tokenized line");
    tokens
}

fn token_from_captures(caps: &Captures, lineno: usize) -> Option<Token> {
    let (typ, m) = GROUPS
        .iter()
        .find_map(|(name, typ)| caps.name(name).map(|m| (*typ, m)))?;
    let lexeme = m.as_str();
    let typ = match typ? {
        TokenType::IDENTIFIER => reclassify(lexeme),
        typ => typ,
    };
    Some(Token {
        typ,
        lexeme: lexeme.to_string(),
        span: Span::new(lineno, m.start(), m.end()),
    })
}

fn reclassify(lexeme: &str) -> TokenType {
    if is_keyword(lexeme) {
        TokenType::KEYWORD
    } else if WORD_OPERATORS.contains(&lexeme) {
        TokenType::OPERATOR
    } else {
        TokenType::IDENTIFIER
    }
}

pub fn is_keyword(lexeme: &str) -> bool {
    KEYWORDS.is_match(lexeme)
}

pub fn is_operator(lexeme: &str) -> bool {
    OPERATORS.contains(&lexeme)
}

pub fn is_delimiter(lexeme: &str) -> bool {
    DELIMITERS.contains(&lexeme)
}

pub fn is_identifier(lexeme: &str) -> bool {
    IDENTIFIER.is_match(lexeme)
}

pub fn is_integer(lexeme: &str) -> bool {
    INTEGER.is_match(lexeme)
}

pub fn is_float(lexeme: &str) -> bool {
    FLOAT.is_match(lexeme)
}

pub fn is_string(lexeme: &str) -> bool {
    STRING.is_match(lexeme)
}
