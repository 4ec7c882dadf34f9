//! Result and errors.
use std::{
    fmt::{self, Display, Formatter},
    io,
    path::PathBuf,
    string::FromUtf8Error,
};

use smol_str::SmolStr;

use crate::{
    symbol::VarKind,
    syntax::{Span, TokenClass},
};

pub type JackResult<T> = std::result::Result<T, JackError>;

#[derive(Debug)]
pub enum JackError {
    /// Malformed source text.
    Lex(LexError),
    /// Token sequence does not match the grammar.
    Syntax(SyntaxError),
    /// Identifier could not be classified, or was declared twice.
    Resolution(ResolutionError),
    /// Path given to the driver is not a source file or directory.
    Source(PathBuf),
    Io(io::Error),
    Utf8(FromUtf8Error),
    Fmt(fmt::Error),
}

impl Display for JackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "{err}"),
            Self::Syntax(err) => write!(f, "{err}"),
            Self::Resolution(err) => write!(f, "{err}"),
            Self::Source(path) => write!(f, "not a .jack file or directory: {}", path.display()),
            Self::Io(err) => write!(f, "{err}"),
            Self::Utf8(err) => write!(f, "source is not valid UTF-8: {err}"),
            Self::Fmt(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for JackError {}

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

impl From<ResolutionError> for JackError {
    fn from(err: ResolutionError) -> Self {
        JackError::Resolution(err)
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

impl From<fmt::Error> for JackError {
    fn from(err: fmt::Error) -> Self {
        JackError::Fmt(err)
    }
}

/// Position of an error in the source, with the offending
/// line kept for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoc {
    pub span: Span,
    pub line: usize,
    pub column: usize,
    /// Source line containing the start of the span, without line ending.
    pub text: String,
}

impl SourceLoc {
    pub fn new(source_code: &str, span: Span) -> Self {
        let (line, column) = span.line_column(source_code);
        let (text, _) = span.surrounding_line(source_code);
        Self {
            span,
            line,
            column,
            text: text.trim_end_matches(&['\r', '\n'][..]).to_owned(),
        }
    }
}

impl Display for SourceLoc {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let gutter = self.line.to_string();
        let pad = " ".repeat(gutter.len());
        let indent = " ".repeat(self.column.saturating_sub(1));
        let underline = "^".repeat((self.span.size as usize).max(1));

        writeln!(f, "{pad} |")?;
        writeln!(f, "{gutter} | {}", self.text)?;
        write!(f, "{pad} | {indent}{underline}")
    }
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    UnknownCharacter(char),
    /// String constant not closed before end of line.
    UnterminatedString,
    /// Block comment not closed before end of file.
    UnterminatedComment,
    /// Integer constant larger than 32767.
    IntegerOverflow,
}

impl Display for LexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (line, column) = (self.loc.line, self.loc.column);
        match &self.kind {
            LexErrorKind::UnknownCharacter(c) => {
                writeln!(f, "lexical error at {line}:{column}: unknown character {c:?}")?
            }
            LexErrorKind::UnterminatedString => {
                writeln!(f, "lexical error at {line}:{column}: unterminated string constant")?
            }
            LexErrorKind::UnterminatedComment => {
                writeln!(f, "lexical error at {line}:{column}: unterminated block comment")?
            }
            LexErrorKind::IntegerOverflow => writeln!(
                f,
                "lexical error at {line}:{column}: integer constant exceeds 32767"
            )?,
        }
        write!(f, "{}", self.loc)
    }
}

impl std::error::Error for LexError {}

/// Error returned when the current token does not fit the grammar
/// production being compiled.
#[derive(Debug, Clone)]
pub struct SyntaxError {
    /// Classification of the offending token.
    pub found: TokenClass,
    /// Source text of the offending token.
    pub fragment: String,
    /// Description of what the production required.
    pub expected: String,
    /// Grammar production that rejected the token.
    pub production: &'static str,
    pub loc: SourceLoc,
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (line, column) = (self.loc.line, self.loc.column);
        match self.found {
            TokenClass::EOF => writeln!(
                f,
                "syntax error at {line}:{column}: expected {} in {}, found end-of-file",
                self.expected, self.production
            )?,
            found => writeln!(
                f,
                "syntax error at {line}:{column}: expected {} in {}, found {found} '{}'",
                self.expected, self.production, self.fragment
            )?,
        }
        write!(f, "{}", self.loc)
    }
}

impl std::error::Error for SyntaxError {}

#[derive(Debug, Clone)]
pub struct ResolutionError {
    pub kind: ResolutionErrorKind,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionErrorKind {
    /// Name declared twice in the same scope.
    Redefined { name: SmolStr, kind: VarKind },
    /// Identifier used as a value, but no variable by that name exists.
    UndefinedVariable(SmolStr),
    /// Method called without a receiver from a function, which has no `this`.
    NoReceiver { class: SmolStr, subroutine: SmolStr },
    /// Call target's qualifier is a variable of primitive type.
    PrimitiveReceiver { name: SmolStr, ty: SmolStr },
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (line, column) = (self.loc.line, self.loc.column);
        write!(f, "resolution error at {line}:{column}: ")?;
        match &self.kind {
            ResolutionErrorKind::Redefined { name, kind } => {
                writeln!(f, "{kind} '{name}' is already defined in this scope")?
            }
            ResolutionErrorKind::UndefinedVariable(name) => {
                writeln!(f, "undefined variable '{name}'")?
            }
            ResolutionErrorKind::NoReceiver { class, subroutine } => writeln!(
                f,
                "method '{class}.{subroutine}' called without a receiver from a function"
            )?,
            ResolutionErrorKind::PrimitiveReceiver { name, ty } => {
                writeln!(f, "cannot call a subroutine on '{name}' of primitive type {ty}")?
            }
        }
        write!(f, "{}", self.loc)
    }
}

impl std::error::Error for ResolutionError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_source_loc_display() {
        const CODE: &str = "class Main {\n  let x = ;\n}";
        let loc = SourceLoc::new(CODE, Span::new(23, 1));

        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 11);
        assert_eq!(loc.text, "  let x = ;");
        assert_eq!(loc.to_string(), "  |\n2 |   let x = ;\n  |           ^");
    }

    #[test]
    fn test_source_loc_crlf() {
        const CODE: &str = "class Main {\r\n\r\n  let x = ;\r\n}";
        let loc = SourceLoc::new(CODE, Span::new(26, 1));

        assert_eq!(loc.line, 3);
        assert_eq!(loc.column, 11);
        assert_eq!(loc.text, "  let x = ;");

        let blank = SourceLoc::new(CODE, Span::new(14, 1));
        assert_eq!(blank.line, 2);
        assert_eq!(blank.text, "");
    }
}
