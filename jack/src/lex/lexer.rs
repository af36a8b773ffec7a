//! Lexical analysis
use smol_str::SmolStr;

use super::{
    cursor::Cursor,
    tokens::{Keyword, Span, Token, TokenKind, TokenType},
};
use crate::{
    constants::MAX_INT,
    error::{LexError, LexErrorKind, Location},
};

/// States of the scanner that skips whitespace and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trivia {
    Start,
    /// Inside a run of whitespace.
    Whitespace,
    /// Saw `/`, which may start a comment or be a symbol.
    Slash,
    /// Inside `/* ... */`
    Block,
    /// Inside a block comment, directly after a `*`.
    BlockStar,
    /// Inside `// ...` up to the end of the line.
    Line,
}

pub struct Lexer<'a> {
    /// Character scanner
    cursor: Cursor<'a>,
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
    /// Name of the source file, for diagnostics.
    file_name: SmolStr,
    /// Most recent token produced by [`Lexer::advance`].
    current: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(file_name: impl Into<SmolStr>, source_code: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source_code),
            original: source_code,
            file_name: file_name.into(),
            current: None,
        }
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.original
    }

    pub fn file_name(&self) -> &str {
        self.file_name.as_str()
    }

    /// Line of the scanner position, starting at 1.
    pub fn line_number(&self) -> u32 {
        self.cursor.line()
    }

    /// Skip whitespace and comments, then report whether a token remains.
    ///
    /// Leaves the cursor at the first character of the next token. A `/`
    /// that turns out not to start a comment is rewound, so it can be
    /// consumed by [`Lexer::advance`] as a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`LexErrorKind::UnterminatedComment`] when a block comment
    /// reaches the end of the source.
    pub fn has_more_tokens(&mut self) -> Result<bool, LexError> {
        use Trivia as T;

        let mut state = T::Start;
        let mut mark = self.cursor.mark();

        loop {
            state = match state {
                T::Start | T::Whitespace => {
                    mark = self.cursor.mark();
                    match self.cursor.bump() {
                        None => return Ok(false),
                        Some('/') => T::Slash,
                        Some(c) if is_whitespace(c) => T::Whitespace,
                        Some(_) => {
                            self.cursor.reset(mark);
                            return Ok(true);
                        }
                    }
                }
                T::Slash => match self.cursor.bump() {
                    Some('*') => T::Block,
                    Some('/') => T::Line,
                    _ => {
                        // Not a comment after all.
                        self.cursor.reset(mark);
                        return Ok(true);
                    }
                },
                T::Block => match self.cursor.bump() {
                    Some('*') => T::BlockStar,
                    Some(_) => T::Block,
                    None => return Err(self.error_at(mark.line(), LexErrorKind::UnterminatedComment)),
                },
                T::BlockStar => match self.cursor.bump() {
                    Some('*') => T::BlockStar,
                    Some('/') => T::Start,
                    Some(_) => T::Block,
                    None => return Err(self.error_at(mark.line(), LexErrorKind::UnterminatedComment)),
                },
                T::Line => match self.cursor.bump() {
                    Some('\n') | Some('\r') => T::Start,
                    Some(_) => T::Line,
                    None => return Ok(false),
                },
            };
        }
    }

    /// Consume exactly one token and make it the current token.
    ///
    /// Must only be called after [`Lexer::has_more_tokens`] returned `true`.
    ///
    /// # Errors
    ///
    /// Returns [`LexErrorKind::UnexpectedEof`] when no characters remain.
    pub fn advance(&mut self) -> Result<(), LexError> {
        let start = self.cursor.offset();
        let line = self.cursor.line();

        match self.cursor.bump() {
            None => return Err(self.error_at(line, LexErrorKind::UnexpectedEof)),
            Some(c) if is_letter(c) => self.cursor.bump_while(is_letter_or_digit),
            Some(c) if is_digit(c) => self.cursor.bump_while(is_digit),
            Some('"') => self.consume_string(line)?,
            // Any other character is a symbol on its own.
            Some(_) => {}
        }

        let span = Span::new(start, self.cursor.offset() - start);
        let fragment = span.fragment(self.original);
        let kind = match TokenKind::classify(fragment) {
            Some(kind) => kind,
            None => return Err(self.error_at(line, LexErrorKind::UnexpectedEof)),
        };

        if kind == TokenKind::IntConst && parse_int(fragment).is_none() {
            return Err(self.error_at(line, LexErrorKind::IntegerOverflow(fragment.into())));
        }

        self.current = Some(Token { span, kind, line });

        Ok(())
    }

    /// Scan and return the next token.
    ///
    /// Returns `None` at the end of the source.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        if self.has_more_tokens()? {
            self.advance()?;
            Ok(self.current.clone())
        } else {
            self.current = None;
            Ok(None)
        }
    }

    /// The token produced by the last call to [`Lexer::advance`].
    pub fn current(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    /// Source text of the given token.
    #[inline]
    pub fn fragment(&self, token: &Token) -> &'a str {
        token.span.fragment(self.original)
    }

    pub fn token_type(&self) -> Option<TokenType> {
        self.current.as_ref().map(|token| token.kind.token_type())
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.current.as_ref()?.kind {
            TokenKind::Keyword(keyword) => Some(keyword),
            _ => None,
        }
    }

    pub fn symbol(&self) -> Option<char> {
        match self.current.as_ref()?.kind {
            TokenKind::Symbol(c) => Some(c),
            _ => None,
        }
    }

    pub fn identifier(&self) -> Option<&'a str> {
        let token = self.current.as_ref()?;
        match token.kind {
            TokenKind::Ident => Some(self.fragment(token)),
            _ => None,
        }
    }

    pub fn int_val(&self) -> Option<u16> {
        let token = self.current.as_ref()?;
        match token.kind {
            TokenKind::IntConst => parse_int(self.fragment(token)),
            _ => None,
        }
    }

    /// String constant of the current token, without the quotes.
    pub fn string_val(&self) -> Option<&'a str> {
        let token = self.current.as_ref()?;
        match token.kind {
            TokenKind::StringConst => Some(string_contents(self.fragment(token))),
            _ => None,
        }
    }

    /// Build an error located at the given line of this lexer's file.
    #[inline(never)]
    #[cold]
    fn error_at(&self, line: u32, kind: LexErrorKind) -> LexError {
        LexError {
            location: Location {
                file: self.file_name.clone(),
                line,
            },
            kind,
        }
    }
}

/// Specialised tokens.
impl<'a> Lexer<'a> {
    /// Consume a string literal up to and including the closing quote.
    ///
    /// The opening quote has already been consumed. There are no escape sequences.
    fn consume_string(&mut self, line: u32) -> Result<(), LexError> {
        loop {
            match self.cursor.bump() {
                Some('"') => return Ok(()),
                Some(c) if !c.is_ascii() => {
                    return Err(self.error_at(line, LexErrorKind::NonAsciiString(c)))
                }
                Some(_) => continue,
                None => return Err(self.error_at(line, LexErrorKind::UnterminatedString)),
            }
        }
    }
}

/// Strip the surrounding quotes from a string literal.
pub(crate) fn string_contents(fragment: &str) -> &str {
    let inner = fragment.strip_prefix('"').unwrap_or(fragment);
    inner.strip_suffix('"').unwrap_or(inner)
}

/// Parse an integer constant, rejecting values the VM can't represent.
pub(crate) fn parse_int(fragment: &str) -> Option<u16> {
    fragment.parse::<u16>().ok().filter(|value| *value <= MAX_INT)
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

#[allow(clippy::manual_is_ascii_check)] // consistency with other functions
fn is_digit(c: char) -> bool {
    matches!(c, '0'..='9')
}

fn is_letter(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_')
}

fn is_letter_or_digit(c: char) -> bool {
    is_letter(c) || is_digit(c)
}

impl<'a> IntoIterator for Lexer<'a> {
    type Item = Result<Token, LexError>;
    type IntoIter = LexerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        LexerIter {
            lexer: self,
            done: false,
        }
    }
}

/// Convenience iterator that wraps the lexer.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct LexerIter<'a> {
    // Stop after the first error.
    done: bool,
    lexer: Lexer<'a>,
}

impl<'a> LexerIter<'a> {
    pub fn lexer(&self) -> &Lexer<'a> {
        &self.lexer
    }
}

impl<'a> Iterator for LexerIter<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.lexer.next_token().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.done = true;
        }
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new("Test.jack", source)
            .into_iter()
            .map(|result| result.unwrap().kind)
            .collect()
    }

    #[test]
    fn test_let_statement() {
        use TokenType as T;

        let source = "let x = 1 + 2;";
        let mut lexer = Lexer::new("Test.jack", source);
        let mut texts = vec![];
        let mut types = vec![];

        while lexer.has_more_tokens().unwrap() {
            lexer.advance().unwrap();
            texts.push(lexer.fragment(lexer.current().unwrap()));
            types.push(lexer.token_type().unwrap());
        }

        assert_eq!(texts, ["let", "x", "=", "1", "+", "2", ";"]);
        assert_eq!(
            types,
            [
                T::Keyword,
                T::Identifier,
                T::Symbol,
                T::IntegerConstant,
                T::Symbol,
                T::IntegerConstant,
                T::Symbol
            ]
        );
    }

    #[test]
    fn test_skip_comments() {
        let source = "// line comment\n/* block\n comment */ do /** doc **/ x; // trailing";
        assert_eq!(
            kinds(source),
            [
                TokenKind::Keyword(Keyword::Do),
                TokenKind::Ident,
                TokenKind::Symbol(';'),
            ]
        );
    }

    #[test]
    fn test_slash_is_symbol() {
        assert_eq!(
            kinds("a / b"),
            [TokenKind::Ident, TokenKind::Symbol('/'), TokenKind::Ident]
        );
        assert_eq!(
            kinds("a/b"),
            [TokenKind::Ident, TokenKind::Symbol('/'), TokenKind::Ident]
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let mut lexer = Lexer::new("Bad.jack", "class\n/* never\nends");
        assert!(lexer.has_more_tokens().unwrap());
        lexer.advance().unwrap();

        let err = lexer.has_more_tokens().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
        assert_eq!(err.location.file, "Bad.jack");
        assert_eq!(err.location.line, 2);
    }

    #[test]
    fn test_comment_only_source() {
        let mut lexer = Lexer::new("Empty.jack", "  // nothing here");
        assert!(!lexer.has_more_tokens().unwrap());
        assert!(lexer.advance().is_err());
    }

    #[test]
    fn test_token_values() {
        let mut lexer = Lexer::new("Test.jack", "\"hello world\" 32767 _tmp ~");

        lexer.next_token().unwrap();
        assert_eq!(lexer.string_val(), Some("hello world"));
        assert_eq!(lexer.int_val(), None);

        lexer.next_token().unwrap();
        assert_eq!(lexer.int_val(), Some(32767));

        lexer.next_token().unwrap();
        assert_eq!(lexer.identifier(), Some("_tmp"));

        lexer.next_token().unwrap();
        assert_eq!(lexer.symbol(), Some('~'));

        assert_eq!(lexer.next_token().unwrap(), None);
    }

    #[test]
    fn test_integer_overflow() {
        let mut lexer = Lexer::new("Test.jack", "32768");
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::IntegerOverflow("32768".into()));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("Test.jack", "\"abc");
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn test_line_numbers() {
        let mut lexer = Lexer::new("Test.jack", "class\n\n  Main\r\n{");
        let lines = std::iter::from_fn(|| lexer.next_token().unwrap())
            .map(|token| token.line)
            .collect::<Vec<_>>();
        assert_eq!(lines, [1, 3, 4]);
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let mut iter = Lexer::new("Test.jack", "x /* oops").into_iter();
        assert!(matches!(iter.next(), Some(Ok(_))));
        assert!(matches!(iter.next(), Some(Err(_))));
        assert!(iter.next().is_none());
    }
}
