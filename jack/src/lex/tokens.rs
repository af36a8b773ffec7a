//! Tokens

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub span: Span,
    pub kind: TokenKind,
    /// Line the token starts on, starting at 1.
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum TokenKind {
    /// Reserved identifiers
    Keyword(Keyword),
    /// Single character like `{`, `+` or `;`
    Symbol(char),
    /// Decimal number literal
    IntConst,
    /// Double quoted string literal
    StringConst,
    Ident,
}

/// Token classification without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Keyword,
    Symbol,
    IntegerConstant,
    StringConstant,
    Identifier,
}

impl TokenKind {
    /// Classify raw token text.
    ///
    /// The result depends only on the first character, and for text
    /// starting with a letter, on whether it is a reserved keyword.
    ///
    /// ```
    /// use jack::lex::{Keyword, TokenKind};
    ///
    /// assert_eq!(TokenKind::classify("while"), Some(TokenKind::Keyword(Keyword::While)));
    /// assert_eq!(TokenKind::classify("_while"), Some(TokenKind::Ident));
    /// assert_eq!(TokenKind::classify("42"), Some(TokenKind::IntConst));
    /// assert_eq!(TokenKind::classify("\"hi\""), Some(TokenKind::StringConst));
    /// assert_eq!(TokenKind::classify("+"), Some(TokenKind::Symbol('+')));
    /// assert_eq!(TokenKind::classify(""), None);
    /// ```
    pub fn classify(text: &str) -> Option<Self> {
        let first = text.chars().next()?;

        Some(match first {
            '0'..='9' => TokenKind::IntConst,
            'a'..='z' | 'A'..='Z' => match Keyword::parse(text) {
                Some(keyword) => TokenKind::Keyword(keyword),
                None => TokenKind::Ident,
            },
            '"' => TokenKind::StringConst,
            '_' => TokenKind::Ident,
            c => TokenKind::Symbol(c),
        })
    }

    pub fn token_type(&self) -> TokenType {
        match self {
            TokenKind::Keyword(_) => TokenType::Keyword,
            TokenKind::Symbol(_) => TokenType::Symbol,
            TokenKind::IntConst => TokenType::IntegerConstant,
            TokenKind::StringConst => TokenType::StringConstant,
            TokenKind::Ident => TokenType::Identifier,
        }
    }
}

/// Describes the kind the way a diagnostic would expect it.
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Keyword(keyword) => write!(f, "'{keyword}'"),
            TokenKind::Symbol(c) => write!(f, "'{c}'"),
            TokenKind::IntConst => write!(f, "integer constant"),
            TokenKind::StringConst => write!(f, "string constant"),
            TokenKind::Ident => write!(f, "identifier"),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenType::Keyword => write!(f, "keyword"),
            TokenType::Symbol => write!(f, "symbol"),
            TokenType::IntegerConstant => write!(f, "integerConstant"),
            TokenType::StringConstant => write!(f, "stringConstant"),
            TokenType::Identifier => write!(f, "identifier"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Span {
    pub index: u32,
    pub size: u32,
}

impl Span {
    pub fn new(index: u32, size: u32) -> Self {
        Self { index, size }
    }

    #[inline]
    pub fn fragment<'a>(&self, text: &'a str) -> &'a str {
        &text[(self.index as usize)..(self.index as usize + self.size as usize)]
    }

    /// Ending index of the span, exclusive.
    #[inline]
    pub fn end(&self) -> u32 {
        self.index + self.size
    }
}

/// Reserved keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[rustfmt::skip]
pub enum Keyword {
    // ------------------------------------------------------------------------
    // Program structure
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,

    // ------------------------------------------------------------------------
    // Types
    Int,
    Char,
    Boolean,
    Void,

    // ------------------------------------------------------------------------
    // Constants
    True,
    False,
    Null,
    This,

    // ------------------------------------------------------------------------
    // Statements
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    #[rustfmt::skip]
    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        match text.as_ref() {
            "class"       => Some(Self::Class),
            "constructor" => Some(Self::Constructor),
            "function"    => Some(Self::Function),
            "method"      => Some(Self::Method),
            "field"       => Some(Self::Field),
            "static"      => Some(Self::Static),
            "var"         => Some(Self::Var),
            // ----------------------------------------------------------------
            "int"         => Some(Self::Int),
            "char"        => Some(Self::Char),
            "boolean"     => Some(Self::Boolean),
            "void"        => Some(Self::Void),
            // ----------------------------------------------------------------
            "true"        => Some(Self::True),
            "false"       => Some(Self::False),
            "null"        => Some(Self::Null),
            "this"        => Some(Self::This),
            // ----------------------------------------------------------------
            "let"         => Some(Self::Let),
            "do"          => Some(Self::Do),
            "if"          => Some(Self::If),
            "else"        => Some(Self::Else),
            "while"       => Some(Self::While),
            "return"      => Some(Self::Return),
            // ----------------------------------------------------------------
            _ => None,
        }
    }

    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class       => "class",
            Self::Constructor => "constructor",
            Self::Function    => "function",
            Self::Method      => "method",
            Self::Field       => "field",
            Self::Static      => "static",
            Self::Var         => "var",
            Self::Int         => "int",
            Self::Char        => "char",
            Self::Boolean     => "boolean",
            Self::Void        => "void",
            Self::True        => "true",
            Self::False       => "false",
            Self::Null        => "null",
            Self::This        => "this",
            Self::Let         => "let",
            Self::Do          => "do",
            Self::If          => "if",
            Self::Else        => "else",
            Self::While       => "while",
            Self::Return      => "return",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_span_fragment() {
        const CODE: &str = "let x = 10;";

        let spans = &[
            Span::new(0, 3), // let
            Span::new(4, 1), // x
            Span::new(6, 1), // =
            Span::new(8, 2), // 10
        ];

        assert_eq!(spans[0].fragment(CODE), "let");
        assert_eq!(spans[1].fragment(CODE), "x");
        assert_eq!(spans[2].fragment(CODE), "=");
        assert_eq!(spans[3].fragment(CODE), "10");
        assert_eq!(spans[3].end(), 10);
    }

    #[test]
    fn test_keyword_text_round_trip() {
        for text in ["class", "constructor", "method", "boolean", "null", "return"] {
            let keyword = Keyword::parse(text).unwrap();
            assert_eq!(keyword.as_str(), text);
        }

        // Keywords are case sensitive.
        assert_eq!(Keyword::parse("Class"), None);
    }

    #[test]
    fn test_classify_letter_initial() {
        assert_eq!(TokenKind::classify("this"), Some(TokenKind::Keyword(Keyword::This)));
        assert_eq!(TokenKind::classify("thisOne"), Some(TokenKind::Ident));
        assert_eq!(TokenKind::classify("Main"), Some(TokenKind::Ident));
    }
}
