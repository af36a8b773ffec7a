//! Lexical analysis of Jack source code.
mod cursor;
mod lexer;
mod listing;
mod token_stream;
mod tokens;

pub use self::{
    lexer::{Lexer, LexerIter},
    listing::TokenListing,
    token_stream::TokenStream,
    tokens::{Keyword, Span, Token, TokenKind, TokenType},
};
