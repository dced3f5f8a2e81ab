//! Python literal reader
//!
//! Reads the literal subset of Python the randomizer uses for its data tables:
//! strings, numbers, booleans, `None`, tuples, lists, dicts, `float('inf')`
//! and `OrderedDict([...])`. Any other well-formed expression is kept as
//! [`Value::Opaque`](crate::Value::Opaque) source text rather than rejected, so a table can hold
//! engine enum references in columns nobody reads.
//!
//! ## Example
//!
//! ```
//! use ootr_data::pyliteral;
//! use ootr_data::Value;
//!
//! let source = "__version__ = '8.1.0'\n";
//! let version = pyliteral::find_assignment(source, "__version__").unwrap();
//! assert_eq!(version, Some(Value::Str("8.1.0".into())));
//! ```

mod lexer;
mod parser;

use std::fmt;

use thiserror::Error;

pub use lexer::{Lexer, StrFlavor, Token, TokenKind};
pub use parser::{find_assignment, parse_expression};

/// 1-based line and column of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{position}: unexpected character {found:?}")]
    UnexpectedChar { position: Position, found: char },

    #[error("{position}: unterminated string literal")]
    UnterminatedString { position: Position },

    #[error("{position}: invalid escape sequence")]
    InvalidEscape { position: Position },

    #[error("{position}: expected {expected}, found {found}")]
    Unexpected {
        position: Position,
        expected: &'static str,
        found: String,
    },

    #[error("{position}: dict keys must be strings, found {found}")]
    NonStringKey {
        position: Position,
        found: &'static str,
    },
}
