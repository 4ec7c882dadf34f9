//! Token and parse tree dumps in the XML format used by the course tools.
use std::io::Write;

use log::trace;

use crate::{
    error::JackResult,
    syntax::{Token, TokenClass, TokenKind},
};

/// Spaces per nesting level in the parse tree.
const INDENT: usize = 2;

/// Write one element per token, wrapped in a `<tokens>` element.
///
/// String constants are written without their quotes. The end-of-file
/// token is not written.
pub fn write_tokens<W: Write>(source_code: &str, tokens: &[Token], writer: &mut W) -> JackResult<()> {
    writeln!(writer, "<tokens>")?;

    for token in tokens.iter().filter(|token| token.kind != TokenKind::EOF) {
        let tag = token.kind.class().tag();
        writeln!(writer, "<{tag}> {} </{tag}>", escape(terminal_text(source_code, token)))?;
    }

    writeln!(writer, "</tokens>")?;
    Ok(())
}

/// Text of a terminal element. String constants lose their quotes.
pub(crate) fn terminal_text<'a>(source_code: &'a str, token: &Token) -> &'a str {
    let fragment = token.span.fragment(source_code);
    match token.kind {
        TokenKind::Str => &fragment[1..fragment.len() - 1],
        _ => fragment,
    }
}

/// Receives the shape of a class as the compiler recognises it.
///
/// Every grammar production the compiler enters is reported as an
/// [`open`](TreeSink::open)/[`close`](TreeSink::close) pair, with the
/// tokens it consumed directly reported as terminals in between.
pub trait TreeSink {
    fn open(&mut self, element: &'static str) -> JackResult<()>;

    fn close(&mut self, element: &'static str) -> JackResult<()>;

    fn terminal(&mut self, class: TokenClass, text: &str) -> JackResult<()>;
}

/// Writes the parse tree as indented XML.
pub struct TreeWriter<W: Write> {
    writer: W,
    depth: usize,
}

impl<W: Write> TreeWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, depth: 0 }
    }

    /// Flush and return the inner writer.
    pub fn finish(mut self) -> JackResult<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn indent(&mut self) -> JackResult<()> {
        write!(self.writer, "{:width$}", "", width = self.depth * INDENT)?;
        Ok(())
    }
}

impl<W: Write> TreeSink for TreeWriter<W> {
    fn open(&mut self, element: &'static str) -> JackResult<()> {
        trace!("<{}>", element);
        self.indent()?;
        writeln!(self.writer, "<{element}>")?;
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, element: &'static str) -> JackResult<()> {
        self.depth = self.depth.saturating_sub(1);
        self.indent()?;
        writeln!(self.writer, "</{element}>")?;
        Ok(())
    }

    fn terminal(&mut self, class: TokenClass, text: &str) -> JackResult<()> {
        let tag = class.tag();
        self.indent()?;
        writeln!(self.writer, "<{tag}> {} </{tag}>", escape(text))?;
        Ok(())
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::syntax::Lexer;

    fn dump(source: &str) -> String {
        let tokens = Lexer::new(source).tokenize().unwrap();
        let mut buf = Vec::new();
        write_tokens(source, &tokens, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_token_elements() {
        assert_eq!(
            dump(r#"let s = "a b"; do f(7);"#),
            "<tokens>\n\
             <keyword> let </keyword>\n\
             <identifier> s </identifier>\n\
             <symbol> = </symbol>\n\
             <stringConstant> a b </stringConstant>\n\
             <symbol> ; </symbol>\n\
             <keyword> do </keyword>\n\
             <identifier> f </identifier>\n\
             <symbol> ( </symbol>\n\
             <integerConstant> 7 </integerConstant>\n\
             <symbol> ) </symbol>\n\
             <symbol> ; </symbol>\n\
             </tokens>\n"
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(
            dump(r#"a < b & "x>y""#),
            "<tokens>\n\
             <identifier> a </identifier>\n\
             <symbol> &lt; </symbol>\n\
             <identifier> b </identifier>\n\
             <symbol> &amp; </symbol>\n\
             <stringConstant> x&gt;y </stringConstant>\n\
             </tokens>\n"
        );
        assert_eq!(escape(r#"say "hi""#), "say &quot;hi&quot;");
    }

    #[test]
    fn test_empty() {
        assert_eq!(dump("// nothing"), "<tokens>\n</tokens>\n");
    }

    #[test]
    fn test_tree_writer_indents() {
        let mut tree = TreeWriter::new(Vec::<u8>::new());
        tree.open("term").unwrap();
        tree.terminal(TokenClass::Symbol, "<").unwrap();
        tree.open("term").unwrap();
        tree.terminal(TokenClass::String, "a&b").unwrap();
        tree.close("term").unwrap();
        tree.close("term").unwrap();

        let bytes = tree.finish().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "<term>\n\
             \x20 <symbol> &lt; </symbol>\n\
             \x20 <term>\n\
             \x20   <stringConstant> a&amp;b </stringConstant>\n\
             \x20 </term>\n\
             </term>\n"
        );
    }
}
