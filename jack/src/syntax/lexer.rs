//! Lexical analysis
use crate::error::{LexError, LexErrorKind, SourceLoc};

use super::{
    cursor::{Cursor, EOF_CHAR},
    tokens::{Keyword, Span, Symbol, Token, TokenKind},
};

/// Largest integer constant the VM can push.
pub const MAX_INT: u16 = 32767;

pub struct Lexer<'a> {
    /// Character scanner
    cursor: Cursor<'a>,
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
    /// Start absolute byte position of the current token
    /// in the source.
    start_pos: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        let mut cursor = Cursor::new(source_code);

        // Initial state of the cursor is a non-existant EOF char,
        // but the initial state of the lexer should be a valid
        // token starting character.
        //
        // Prime the cursor for the first iteration.
        cursor.next();

        let start_pos = cursor.offset();

        Self {
            cursor,
            original: source_code,
            start_pos,
        }
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Lex the whole source into a token sequence.
    ///
    /// The sequence always ends with a single [`TokenKind::EOF`] token.
    pub fn tokenize(self) -> Result<Vec<Token>, LexError> {
        self.into_iter().collect()
    }

    /// Scan the source characters and construct the next token.
    ///
    /// ## Implementation
    ///
    /// Each iteration starts with the assumption that the internal cursor
    /// is pointing to the start of the remaining source to be consumed.
    ///
    /// When an iteration is done building a token, it must leave the cursor
    /// at the start of the next token's text. It may not finish leaving the
    /// cursor pointing into its own token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        use TokenKind as TK;

        self.erase_trivia()?;

        // Assume that lexer initialization, or previous iteration,
        // leaves the cursor at the next character.
        self.start_token();

        match self.cursor.current() {
            '"' => self.consume_string(),
            '_' | 'a'..='z' | 'A'..='Z' => Ok(self.consume_ident()),
            '0'..='9' => self.consume_number(),
            EOF_CHAR if self.cursor.at_end() => Ok(self.make_token(TK::EOF)),
            c => match Symbol::parse(c) {
                Some(symbol) => Ok(self.make_token(TK::Symbol(symbol))),
                None => Err(self.error(LexErrorKind::UnknownCharacter(c))),
            },
        }
    }

    /// Create a span using the starting position of the current token,
    /// and the current offset of the cursor.
    fn make_span(&mut self) -> Span {
        let start = self.start_pos;
        let end = self.cursor.peek_offset();

        // start and end can be equal, and a token can have 0 size.
        debug_assert!(end >= start);
        let size = end - start;

        Span { index: start, size }
    }

    fn fragment(&mut self) -> &'a str {
        self.make_span().fragment(self.original)
    }

    /// Primes the lexer to consume the next token.
    fn start_token(&mut self) {
        self.start_pos = self.cursor.offset();
    }

    /// Build a token, using the source text from the position
    /// stored by [`start_token`](struct.Lexer.html#fn-start_token) to the
    /// current cursor position.
    ///
    /// Also prepare the cursor for the next iteration.
    fn make_token(&mut self, kind: TokenKind) -> Token {
        let token = Token {
            span: self.make_span(),
            kind,
        };

        // Position the cursor to the starting character for the
        // next token, so the lexer's internal state is primed
        // for the next iteration.
        self.cursor.next();
        debug_assert_eq!(self.cursor.offset(), token.span.end());

        token
    }

    #[inline(never)]
    #[cold]
    fn error(&mut self, kind: LexErrorKind) -> LexError {
        let span = self.make_span();
        LexError {
            kind,
            loc: SourceLoc::new(self.original, span),
        }
    }
}

/// Specialised tokens.
impl<'a> Lexer<'a> {
    /// Erase whitespace and comments until the start of the next token.
    fn erase_trivia(&mut self) -> Result<(), LexError> {
        loop {
            while is_whitespace(self.cursor.current()) {
                self.cursor.next();
            }

            match (self.cursor.current(), self.cursor.peek()) {
                ('/', '/') => self.erase_line_comment(),
                ('/', '*') => self.erase_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    /// Erase comment line up to, but not including, the trailing newline.
    fn erase_line_comment(&mut self) {
        debug_assert_eq!(self.cursor.current(), '/');

        while !is_newline(self.cursor.current()) && !self.cursor.at_end() {
            self.cursor.next();
        }
    }

    /// Erase a `/* ... */` or `/** ... */` comment, including the closing marker.
    fn erase_block_comment(&mut self) -> Result<(), LexError> {
        debug_assert_eq!(self.cursor.current(), '/');

        self.start_token();
        self.cursor.next(); // '/'
        self.cursor.next(); // '*'

        loop {
            if self.cursor.at_end() {
                return Err(LexError {
                    kind: LexErrorKind::UnterminatedComment,
                    loc: SourceLoc::new(self.original, Span::new(self.start_pos, 2)),
                });
            }

            if self.cursor.current() == '*' && self.cursor.peek() == '/' {
                self.cursor.next();
                self.cursor.next();
                return Ok(());
            }

            self.cursor.next();
        }
    }

    /// Make an identifier or keyword token.
    fn consume_ident(&mut self) -> Token {
        debug_assert!(is_letter(self.cursor.current()));

        while is_letter_or_digit(self.cursor.peek()) {
            self.cursor.next();
        }

        // If a valid keyword can be parsed from the source fragment, then
        // the token is a reserved keyword instead of a user defined identifier.
        let token_kind = match Keyword::parse(self.fragment()) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident,
        };

        self.make_token(token_kind)
    }

    /// Make an integer constant token.
    fn consume_number(&mut self) -> Result<Token, LexError> {
        debug_assert!(is_digit(self.cursor.current()));

        while is_digit(self.cursor.peek()) {
            self.cursor.next();
        }

        match self.fragment().parse::<u16>() {
            Ok(value) if value <= MAX_INT => Ok(self.make_token(TokenKind::Int)),
            _ => Err(self.error(LexErrorKind::IntegerOverflow)),
        }
    }

    /// Make a string constant token, quotes included in the span.
    ///
    /// Strings can't span lines, and have no escape sequences. The VM
    /// character set is ASCII, so other characters are rejected.
    fn consume_string(&mut self) -> Result<Token, LexError> {
        debug_assert_eq!(self.cursor.current(), '"');

        loop {
            match self.cursor.peek() {
                '"' => {
                    self.cursor.next();
                    return Ok(self.make_token(TokenKind::Str));
                }
                '\r' | '\n' => return Err(self.error(LexErrorKind::UnterminatedString)),
                EOF_CHAR if self.cursor.peek_offset() >= self.original.len() as u32 => {
                    return Err(self.error(LexErrorKind::UnterminatedString))
                }
                c if !c.is_ascii() => {
                    self.cursor.next();
                    return Err(self.error(LexErrorKind::UnknownCharacter(c)));
                }
                _ => {
                    self.cursor.next();
                }
            }
        }
    }
}

/// Test whether the character is considered whitespace
/// that should be ignored by the parser later.
fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0020}' // space
            | '\u{0009}' // tab
            | '\u{000A}' // line feed
            | '\u{000D}' // carriage return
            | '\u{00A0}' // no-break space
            | '\u{FEFF}' // zero width no-break space
    )
}

fn is_newline(c: char) -> bool {
    matches!(c, '\r' | '\n')
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
///
/// Stops after the EOF token, or after the first error.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct LexerIter<'a> {
    // Track end so an EOF token is emitted once.
    done: bool,
    lexer: Lexer<'a>,
}

impl<'a> Iterator for LexerIter<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.lexer.next_token();
        self.done = matches!(result, Ok(Token { kind: TokenKind::EOF, .. }) | Err(_));
        Some(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn fragments(source: &str) -> Vec<&str> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .iter()
            .map(|token| token.span.fragment(source))
            .collect()
    }

    #[test]
    fn test_adjacent_punctuation() {
        use TokenKind as TK;

        assert_eq!(
            kinds("x+1"),
            vec![TK::Ident, TK::Symbol(Symbol::Plus), TK::Int, TK::EOF]
        );
        assert_eq!(fragments("a[i]=b.c(1,2);"), vec![
            "a", "[", "i", "]", "=", "b", ".", "c", "(", "1", ",", "2", ")", ";", ""
        ]);
    }

    #[test]
    fn test_keyword_priority() {
        use TokenKind as TK;

        assert_eq!(
            kinds("let letter"),
            vec![TK::Keyword(Keyword::Let), TK::Ident, TK::EOF]
        );
        assert_eq!(kinds("_this this"), vec![TK::Ident, TK::Keyword(Keyword::This), TK::EOF]);
    }

    #[test]
    fn test_string_is_opaque() {
        const CODE: &str = r#"do Output.printString("a+b; // (c)");"#;

        let tokens = Lexer::new(CODE).tokenize().unwrap();
        let string = tokens.iter().find(|t| t.kind == TokenKind::Str).unwrap();
        assert_eq!(string.span.fragment(CODE), r#""a+b; // (c)""#);
        // do Output . printString ( "..." ) ; EOF
        assert_eq!(tokens.len(), 9);
    }

    #[test]
    fn test_comments() {
        const CODE: &str = concat!(
            "/** Class doc\n",
            " * continues here { } ;\n",
            " */\n",
            "class /* inline */ Main { // trailing\n",
            "}\n",
            "// last line without newline",
        );

        assert_eq!(fragments(CODE), vec!["class", "Main", "{", "}", ""]);
    }

    #[test]
    fn test_slash_is_symbol() {
        assert_eq!(fragments("a/b"), vec!["a", "/", "b", ""]);
        assert_eq!(fragments("a / /* c */ b"), vec!["a", "/", "b", ""]);
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::EOF]);
        assert_eq!(kinds("  \n\t// nothing\n"), vec![TokenKind::EOF]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("let s = \"abc;\nlet").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.loc.line, 1);
        assert_eq!(err.loc.column, 9);

        let err = Lexer::new("\"abc").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);

        let err = Lexer::new("\"caf\u{e9}\"").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnknownCharacter('\u{e9}'));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = Lexer::new("class /* Main {").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
        assert_eq!(err.loc.column, 7);
    }

    #[test]
    fn test_unknown_character() {
        let err = Lexer::new("let x = 1 # 2;").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnknownCharacter('#'));
        assert_eq!(err.loc.column, 11);
    }

    #[test]
    fn test_integer_range() {
        assert_eq!(kinds("32767"), vec![TokenKind::Int, TokenKind::EOF]);

        let err = Lexer::new("32768").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::IntegerOverflow);
        let err = Lexer::new("99999999").tokenize().unwrap_err();
        assert_eq!(err.kind, LexErrorKind::IntegerOverflow);
    }
}
