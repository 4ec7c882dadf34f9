//! Token stream with a single-token cursor.
use smol_str::SmolStr;

use crate::error::{JackError, JackResult, LexError, SourceLoc, SyntaxError};

use super::{Keyword, Lexer, Span, Symbol, Token, TokenKind};

/// Fully lexed sequence of tokens, consumed front to back.
///
/// The parser inspects the current token before advancing, and never
/// revisits a consumed token. The last token is always
/// [`TokenKind::EOF`], and the cursor never moves past it.
pub struct TokenStream<'a> {
    tokens: Vec<Token>,
    cursor: usize,
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
}

/// Identifier consumed from the stream.
#[derive(Debug, Clone)]
pub struct Ident {
    pub token: Token,
    pub name: SmolStr,
}

impl<'a> TokenStream<'a> {
    /// Lex the given source text in full.
    pub fn from_source(source_code: &'a str) -> Result<Self, LexError> {
        let tokens = Lexer::new(source_code).tokenize()?;
        Ok(Self::new(source_code, tokens))
    }

    pub fn new(source_code: &'a str, mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(Token { kind: TokenKind::EOF, .. })) {
            let end = source_code.len() as u32;
            tokens.push(Token {
                span: Span::new(end, 0),
                kind: TokenKind::EOF,
            });
        }

        Self {
            tokens,
            cursor: 0,
            original: source_code,
        }
    }

    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// All tokens, including the ones already consumed.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Helper function to extract the span's string fragment
    /// from the original source code.
    #[inline]
    pub fn span_fragment(&self, span: &Span) -> &'a str {
        span.fragment(self.original)
    }

    /// Number of tokens consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Token under the cursor.
    #[inline]
    pub fn current(&self) -> &Token {
        &self.tokens[self.cursor]
    }

    #[inline]
    pub fn peek_kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Indicates whether there are tokens left before end-of-file.
    #[inline]
    pub fn has_more(&self) -> bool {
        self.peek_kind() != TokenKind::EOF
    }

    /// Consumes the current token regardless of type.
    ///
    /// At end-of-file the cursor stays put and the EOF token is returned.
    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.has_more() {
            self.cursor += 1;
        }
        token
    }

    #[inline]
    pub fn check_symbol(&self, symbol: Symbol) -> bool {
        self.peek_kind() == TokenKind::Symbol(symbol)
    }

    #[inline]
    pub fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek_kind() == TokenKind::Keyword(keyword)
    }

    /// Consumes the current token if it is the given symbol.
    ///
    /// Returns true when matched. Does not consume the token
    /// if it does not match.
    pub fn match_symbol(&mut self, symbol: Symbol) -> bool {
        let is_match = self.check_symbol(symbol);
        if is_match {
            self.advance();
        }
        is_match
    }

    /// Consumes the current token if it is the given keyword.
    pub fn match_keyword(&mut self, keyword: Keyword) -> bool {
        let is_match = self.check_keyword(keyword);
        if is_match {
            self.advance();
        }
        is_match
    }
}

/// Typed accessors.
///
/// Each asserts the classification of the current token, and consumes it
/// on success. On mismatch the cursor is not advanced, and a
/// [`SyntaxError`] naming the rejecting production is returned.
impl<'a> TokenStream<'a> {
    pub fn keyword(&mut self, production: &'static str) -> JackResult<Keyword> {
        match self.peek_kind() {
            TokenKind::Keyword(keyword) => {
                self.advance();
                Ok(keyword)
            }
            _ => Err(self.error("keyword", production)),
        }
    }

    pub fn expect_keyword(&mut self, keyword: Keyword, production: &'static str) -> JackResult<Token> {
        if self.check_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("keyword '{keyword}'"), production))
        }
    }

    pub fn symbol(&mut self, production: &'static str) -> JackResult<Symbol> {
        match self.peek_kind() {
            TokenKind::Symbol(symbol) => {
                self.advance();
                Ok(symbol)
            }
            _ => Err(self.error("symbol", production)),
        }
    }

    pub fn expect_symbol(&mut self, symbol: Symbol, production: &'static str) -> JackResult<Token> {
        if self.check_symbol(symbol) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("symbol '{symbol}'"), production))
        }
    }

    pub fn identifier(&mut self, production: &'static str) -> JackResult<Ident> {
        match self.peek_kind() {
            TokenKind::Ident => {
                let token = self.advance();
                let name = SmolStr::from(self.span_fragment(&token.span));
                Ok(Ident { token, name })
            }
            _ => Err(self.error("identifier", production)),
        }
    }

    pub fn int_val(&mut self, production: &'static str) -> JackResult<u16> {
        match self.peek_kind() {
            TokenKind::Int => {
                let token = self.advance();
                // Range was checked by the lexer.
                self.span_fragment(&token.span)
                    .parse::<u16>()
                    .map_err(|_| self.error_at(&token, "integer constant", production))
            }
            _ => Err(self.error("integer constant", production)),
        }
    }

    /// Consumes a string constant, returning its contents without quotes.
    pub fn string_val(&mut self, production: &'static str) -> JackResult<&'a str> {
        match self.peek_kind() {
            TokenKind::Str => {
                let token = self.advance();
                let quoted = self.span_fragment(&token.span);
                Ok(&quoted[1..quoted.len() - 1])
            }
            _ => Err(self.error("string constant", production)),
        }
    }

    /// Source location of the given span.
    pub fn loc(&self, span: Span) -> SourceLoc {
        SourceLoc::new(self.original, span)
    }

    /// Build a syntax error pointing at the current token.
    #[inline(never)]
    #[cold]
    pub fn error(&self, expected: impl ToString, production: &'static str) -> JackError {
        self.error_at(self.current(), expected, production)
    }

    #[inline(never)]
    #[cold]
    fn error_at(&self, token: &Token, expected: impl ToString, production: &'static str) -> JackError {
        SyntaxError {
            found: token.kind.class(),
            fragment: self.span_fragment(&token.span).to_owned(),
            expected: expected.to_string(),
            production,
            loc: self.loc(token.span),
        }
        .into()
    }
}
