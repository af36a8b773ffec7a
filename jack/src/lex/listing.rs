//! XML listing of the token stream.
use std::io::Write;

use log::debug;

use super::{Lexer, TokenKind};
use crate::error::JackResult;

/// Writes every token of a source file as one XML element per line.
///
/// ```text
/// <tokens>
/// <keyword> class </keyword>
/// <identifier> Main </identifier>
/// <symbol> { </symbol>
/// ...
/// </tokens>
/// ```
pub struct TokenListing<W> {
    out: W,
}

impl<W: Write> TokenListing<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Lex the whole source and write the listing.
    ///
    /// Returns the output sink when done.
    pub fn write_tokens(mut self, mut lexer: Lexer) -> JackResult<W> {
        debug!("listing tokens of {}", lexer.file_name());

        writeln!(self.out, "<tokens>")?;

        while let Some(token) = lexer.next_token()? {
            let tag = token.kind.token_type();
            let text = match token.kind {
                TokenKind::StringConst => lexer.string_val().unwrap_or_default(),
                _ => lexer.fragment(&token),
            };
            writeln!(self.out, "<{tag}> {} </{tag}>", escape(text))?;
        }

        writeln!(self.out, "</tokens>")?;
        self.out.flush()?;

        Ok(self.out)
    }
}

/// Escape the characters that would otherwise be read as markup.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}
