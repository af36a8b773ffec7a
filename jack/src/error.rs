//! Result and errors.
use std::{
    fmt::{self, Display, Formatter},
    io,
    string::FromUtf8Error,
};

use smol_str::SmolStr;

pub type JackResult<T> = std::result::Result<T, JackError>;

#[derive(Debug)]
pub enum JackError {
    /// Malformed source text.
    Lex(LexError),
    /// Source text does not follow the grammar, or refers to
    /// a variable that was never declared.
    Syntax(SyntaxError),
    Io(io::Error),
    Utf8(FromUtf8Error),
    /// Bad input path or command line.
    Usage(String),
}

impl Display for JackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "{err}"),
            Self::Syntax(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Utf8(err) => write!(f, "source is not valid UTF-8: {err}"),
            Self::Usage(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for JackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Utf8(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LexError> for JackError {
    fn from(err: LexError) -> Self {
        JackError::Lex(err)
    }
}

impl From<SyntaxError> for JackError {
    fn from(err: SyntaxError) -> Self {
        JackError::Syntax(err)
    }
}

impl From<io::Error> for JackError {
    fn from(err: io::Error) -> Self {
        JackError::Io(err)
    }
}

impl From<FromUtf8Error> for JackError {
    fn from(err: FromUtf8Error) -> Self {
        JackError::Utf8(err)
    }
}

/// Position of a diagnostic in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: SmolStr,
    /// Line number, starting at 1.
    pub line: u32,
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub location: Location,
    pub kind: LexErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Block comment `/* ...` without the closing `*/`.
    UnterminatedComment,
    /// String literal without the closing quote.
    UnterminatedString,
    /// String literals may only contain ASCII characters.
    NonAsciiString(char),
    /// Integer literal larger than the VM can represent.
    IntegerOverflow(SmolStr),
    /// The parser asked for a token past the end of the source.
    UnexpectedEof,
}

impl Display for LexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: lexical error: ", self.location)?;
        match &self.kind {
            LexErrorKind::UnterminatedComment => write!(f, "comment did not end"),
            LexErrorKind::UnterminatedString => write!(f, "string constant did not end"),
            LexErrorKind::NonAsciiString(c) => {
                write!(f, "unsupported character {c:?} in string constant")
            }
            LexErrorKind::IntegerOverflow(text) => {
                write!(f, "integer constant {text} is out of range 0..=32767")
            }
            LexErrorKind::UnexpectedEof => write!(f, "more tokens expected"),
        }
    }
}

impl std::error::Error for LexError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub location: Location,
    pub kind: SyntaxErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// Current token does not match what the grammar production expects.
    Mismatch { expected: String, encountered: String },
    /// Identifier used as a variable, but found in neither scope.
    UndefinedVariable(SmolStr),
    /// Expressions or statements nested deeper than the compiler supports.
    NestingTooDeep,
    /// More variables or arguments than a VM index can address.
    TooMany(&'static str),
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.location)?;
        match &self.kind {
            SyntaxErrorKind::Mismatch {
                expected,
                encountered,
            } => write!(f, "encountered unexpected token {encountered}, expected {expected}"),
            SyntaxErrorKind::UndefinedVariable(name) => {
                write!(f, "variable '{name}' is not defined")
            }
            SyntaxErrorKind::NestingTooDeep => write!(f, "nesting is too deep"),
            SyntaxErrorKind::TooMany(what) => write!(f, "too many {what}"),
        }
    }
}

impl std::error::Error for SyntaxError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display_names_file_and_line() {
        let err = JackError::from(SyntaxError {
            location: Location {
                file: "Main.jack".into(),
                line: 12,
            },
            kind: SyntaxErrorKind::Mismatch {
                expected: "';'".to_owned(),
                encountered: "'}'".to_owned(),
            },
        });

        assert_eq!(
            err.to_string(),
            "Main.jack:12: encountered unexpected token '}', expected ';'"
        );
    }

    #[test]
    fn test_display_lex_error() {
        let err = LexError {
            location: Location {
                file: "Foo.jack".into(),
                line: 3,
            },
            kind: LexErrorKind::UnterminatedComment,
        };

        assert_eq!(err.to_string(), "Foo.jack:3: lexical error: comment did not end");
    }
}
