//! Lexical analysis and token access.
mod cursor;
mod lexer;
mod token_stream;
mod tokens;

pub use self::{
    lexer::{Lexer, LexerIter, MAX_INT},
    token_stream::{Ident, TokenStream},
    tokens::{Keyword, Span, Symbol, Token, TokenClass, TokenKind},
};
