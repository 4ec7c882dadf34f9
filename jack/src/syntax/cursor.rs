//! Character scanner.
use itertools::{multipeek, MultiPeek};
use std::str::CharIndices;

/// Character returned when the cursor is past the end of the source.
///
/// The source text may contain a literal null character, so
/// [`Cursor::at_end`] must be checked to tell the two apart.
pub const EOF_CHAR: char = '\0';

pub struct Cursor<'a> {
    /// Iterator over UTF-8 encoded source code.
    ///
    /// `MultiPeek` buffers lookahead characters. Peeking advances an
    /// internal peek cursor, which is restored when calling `next()`
    /// or `reset_peek()`.
    chars: MultiPeek<CharIndices<'a>>,
    /// Byte position and value of the character under the cursor.
    current: (u32, char),
    /// Number of bytes in the source.
    size: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: multipeek(text.char_indices()),
            current: (0, EOF_CHAR),
            size: text.len() as u32,
        }
    }

    /// Advance the cursor and return the new current character.
    pub fn next(&mut self) -> char {
        match self.chars.next() {
            Some((index, c)) => {
                self.current = (index as u32, c);
            }
            None => {
                // There is no end-of-file character, so the
                // position is set to the size of the source.
                self.current = (self.size, EOF_CHAR);
            }
        }
        self.current.1
    }

    /// Character under the cursor.
    #[inline]
    pub fn current(&self) -> char {
        self.current.1
    }

    /// Character following the current one, without advancing.
    pub fn peek(&mut self) -> char {
        self.chars.reset_peek();
        let c = self.chars.peek().map(|(_, c)| *c).unwrap_or(EOF_CHAR);
        self.chars.reset_peek();
        c
    }

    /// Byte offset of the current character.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.current.0
    }

    /// Byte offset of the character following the current one.
    pub fn peek_offset(&mut self) -> u32 {
        if self.at_end() {
            return self.size;
        }
        self.chars.reset_peek();
        let offset = self
            .chars
            .peek()
            .map(|(index, _)| *index as u32)
            .unwrap_or(self.size);
        self.chars.reset_peek();
        offset
    }

    /// Indicates whether the cursor has moved past the last character.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.current.0 >= self.size
    }
}
