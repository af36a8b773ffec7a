//! Token stream with one token of look ahead.
use std::fmt::Display;

use itertools::Itertools;
use smol_str::SmolStr;

use super::{
    lexer::{parse_int, string_contents},
    Keyword, Lexer, Token, TokenKind,
};
use crate::error::{JackError, JackResult, Location, SyntaxError, SyntaxErrorKind};

/// Stream of tokens that keeps the current token as look ahead.
///
/// Tokens are lazily lexed. Consuming the current token
/// triggers the internal lexer to scan the next one.
pub struct TokenStream<'a> {
    lexer: Lexer<'a>,
    /// The look ahead token. `None` at end of source.
    current: Option<Token>,
    /// Line of the last consumed token, used for errors at end of source.
    last_line: u32,
}

impl<'a> TokenStream<'a> {
    /// Wrap the lexer and scan the first token.
    pub fn new(lexer: Lexer<'a>) -> JackResult<Self> {
        let mut stream = Self {
            lexer,
            current: None,
            last_line: 1,
        };
        stream.current = stream.lexer.next_token()?;
        Ok(stream)
    }

    pub fn file_name(&self) -> &str {
        self.lexer.file_name()
    }

    /// Source text of the given token.
    #[inline]
    pub fn fragment(&self, token: &Token) -> &'a str {
        self.lexer.fragment(token)
    }

    /// Return the current token without advancing the cursor.
    ///
    /// Returns `None` when lexing is done.
    #[inline]
    pub fn peek(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    /// Return the current token kind without advancing the cursor.
    #[inline]
    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.current.as_ref().map(|token| token.kind)
    }

    #[inline]
    pub fn peek_keyword(&self) -> Option<Keyword> {
        match self.peek_kind()? {
            TokenKind::Keyword(keyword) => Some(keyword),
            _ => None,
        }
    }

    #[inline]
    pub fn peek_symbol(&self) -> Option<char> {
        match self.peek_kind()? {
            TokenKind::Symbol(c) => Some(c),
            _ => None,
        }
    }

    /// Checks whether the current token is the given symbol, without consuming it.
    #[inline]
    pub fn at_symbol(&self, symbol: char) -> bool {
        self.peek_symbol() == Some(symbol)
    }

    /// Consumes the current token regardless of type.
    ///
    /// # Errors
    ///
    /// Returns a syntax error when the stream is at the end of the source.
    pub fn next_token(&mut self) -> JackResult<Token> {
        match self.current.take() {
            Some(token) => {
                self.last_line = token.line;
                self.current = self.lexer.next_token()?;
                Ok(token)
            }
            None => Err(self.error("more tokens")),
        }
    }

    /// Consumes the current token if it matches the given token kind.
    ///
    /// Returns true when matched. Returns false when token kinds
    /// do not match, or the token stream is at the end.
    ///
    /// Does not consume the token if the kinds do not match.
    pub fn match_token(&mut self, token_kind: TokenKind) -> JackResult<bool> {
        if self.peek_kind() == Some(token_kind) {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Return the current token and advance the cursor.
    ///
    /// The consumed token must match the given token kind, otherwise
    /// a syntax error is returned. The cursor is not advanced if
    /// the token kind does not match.
    pub fn consume(&mut self, token_kind: TokenKind) -> JackResult<Token> {
        if self.peek_kind() == Some(token_kind) {
            self.next_token()
        } else {
            Err(self.error(token_kind))
        }
    }

    #[inline]
    pub fn consume_symbol(&mut self, symbol: char) -> JackResult<Token> {
        self.consume(TokenKind::Symbol(symbol))
    }

    #[inline]
    pub fn consume_keyword(&mut self, keyword: Keyword) -> JackResult<Token> {
        self.consume(TokenKind::Keyword(keyword))
    }

    /// Consume one of the given keywords, and return which one it was.
    pub fn consume_any_keyword(&mut self, keywords: &[Keyword]) -> JackResult<Keyword> {
        match self.peek_keyword() {
            Some(keyword) if keywords.contains(&keyword) => {
                self.next_token()?;
                Ok(keyword)
            }
            _ => {
                let names = keywords.iter().map(|keyword| format!("'{keyword}'")).join(", ");
                Err(self.error(format!("one of: {names}")))
            }
        }
    }

    /// Consume an identifier and return its name.
    pub fn consume_ident(&mut self) -> JackResult<SmolStr> {
        let token = self.consume(TokenKind::Ident)?;
        Ok(SmolStr::from(self.fragment(&token)))
    }

    /// Value of the current token if it's an integer constant.
    pub fn int_val(&self) -> Option<u16> {
        let token = self.peek().filter(|token| token.kind == TokenKind::IntConst)?;
        parse_int(self.fragment(token))
    }

    /// Contents of the current token, without quotes, if it's a string constant.
    pub fn string_val(&self) -> Option<&'a str> {
        let token = self.peek().filter(|token| token.kind == TokenKind::StringConst)?;
        Some(string_contents(self.fragment(token)))
    }

    /// Location of the current token, or of the last token at end of source.
    pub fn location(&self) -> Location {
        Location {
            file: SmolStr::from(self.lexer.file_name()),
            line: self.current.as_ref().map(|token| token.line).unwrap_or(self.last_line),
        }
    }

    /// Build a mismatch error describing the current token.
    #[inline(never)]
    #[cold]
    pub fn error(&self, expected: impl Display) -> JackError {
        let encountered = match &self.current {
            Some(token) => format!("'{}'", self.fragment(token)),
            None => "end of file".to_owned(),
        };

        SyntaxError {
            location: self.location(),
            kind: SyntaxErrorKind::Mismatch {
                expected: expected.to_string(),
                encountered,
            },
        }
        .into()
    }
}
