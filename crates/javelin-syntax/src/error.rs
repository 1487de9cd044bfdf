//! Parse error records collected on the parse result.

use std::fmt;

use javelin_core::TextRange;

/// A lexical or syntactic error tied to a source range.
///
/// Errors are data, not control flow: the lexer and parser collect them and
/// keep going. `recoverable` is false only when the surrounding construct
/// had to be abandoned entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
    pub recoverable: bool,
}

impl ParseError {
    pub fn recoverable(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
            recoverable: true,
        }
    }

    pub fn fatal(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
            recoverable: false,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}: {}",
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )
    }
}
