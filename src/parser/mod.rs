mod ast;
mod error;
mod grammar;
mod locations;
pub mod tokenizer;

pub use ast::*;
pub use error::SyntaxError;
pub use grammar::{parse, Parser, MAX_NESTING};
pub use locations::{Locatable, Location, Span};
pub use tokenizer::{tokenize, tokenize_line, Token, TokenType};
