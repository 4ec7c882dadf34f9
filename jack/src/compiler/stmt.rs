//! Statements.
use crate::{
    error::JackResult,
    syntax::{Keyword, Symbol, TokenKind},
    vm::{ArithOp, CodeSink, Segment},
};

use super::Compiler;

/// The statements a subroutine body can contain, selected by
/// their leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Let,
    If,
    While,
    Do,
    Return,
}

impl StatementKind {
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Let => Some(Self::Let),
            Keyword::If => Some(Self::If),
            Keyword::While => Some(Self::While),
            Keyword::Do => Some(Self::Do),
            Keyword::Return => Some(Self::Return),
            _ => None,
        }
    }

    /// Parse tree element of the statement.
    pub fn element(&self) -> &'static str {
        match self {
            Self::Let => "letStatement",
            Self::If => "ifStatement",
            Self::While => "whileStatement",
            Self::Do => "doStatement",
            Self::Return => "returnStatement",
        }
    }
}

impl<'a, 's, S: CodeSink + ?Sized> Compiler<'a, 's, S> {
    /// `statement*`, up to the closing brace of the enclosing block.
    pub(super) fn compile_statements(&mut self) -> JackResult<()> {
        const P: &str = "statements";

        while !self.tokens.check_symbol(Symbol::RightBrace) {
            let kind = match self.tokens.peek_kind() {
                TokenKind::Keyword(keyword) => StatementKind::from_keyword(keyword),
                _ => None,
            }
            .ok_or_else(|| self.tokens.error("statement", P))?;

            self.node(kind.element(), |this| match kind {
                StatementKind::Let => this.compile_let(),
                StatementKind::If => this.compile_if(),
                StatementKind::While => this.compile_while(),
                StatementKind::Do => this.compile_do(),
                StatementKind::Return => this.compile_return(),
            })?;
        }

        Ok(())
    }

    /// `'{' statements '}'`
    fn compile_block(&mut self, production: &'static str) -> JackResult<()> {
        self.tokens.expect_symbol(Symbol::LeftBrace, production)?;
        self.node("statements", Self::compile_statements)?;
        self.tokens.expect_symbol(Symbol::RightBrace, production)?;
        Ok(())
    }

    /// `'let' varName ('[' expression ']')? '=' expression ';'`
    fn compile_let(&mut self) -> JackResult<()> {
        const P: &str = "letStatement";

        self.tokens.expect_keyword(Keyword::Let, P)?;
        let ident = self.tokens.identifier(P)?;
        let target = self.variable(&ident)?;
        let segment = target.kind.segment();

        if self.tokens.match_symbol(Symbol::LeftBracket) {
            self.sink.write_push(segment, target.index)?;
            self.compile_expression()?;
            self.tokens.expect_symbol(Symbol::RightBracket, P)?;
            self.sink.write_arithmetic(ArithOp::Add)?;

            self.tokens.expect_symbol(Symbol::Eq, P)?;
            self.compile_expression()?;
            self.tokens.expect_symbol(Symbol::Semicolon, P)?;

            // The right-hand side may itself index an array and clobber
            // `pointer 1`, so the target address is only set afterwards.
            self.sink.write_pop(Segment::Temp, 0)?;
            self.sink.write_pop(Segment::Pointer, 1)?;
            self.sink.write_push(Segment::Temp, 0)?;
            self.sink.write_pop(Segment::That, 0)?;
        } else {
            self.tokens.expect_symbol(Symbol::Eq, P)?;
            self.compile_expression()?;
            self.tokens.expect_symbol(Symbol::Semicolon, P)?;

            self.sink.write_pop(segment, target.index)?;
        }

        Ok(())
    }

    /// `'if' '(' expression ')' '{' statements '}' ('else' '{' statements '}')?`
    fn compile_if(&mut self) -> JackResult<()> {
        const P: &str = "ifStatement";

        self.tokens.expect_keyword(Keyword::If, P)?;

        let id = self.next_label_id();
        let if_true = format!("IF_TRUE{id}");
        let if_false = format!("IF_FALSE{id}");
        let if_end = format!("IF_END{id}");

        self.tokens.expect_symbol(Symbol::LeftParen, P)?;
        self.compile_expression()?;
        self.tokens.expect_symbol(Symbol::RightParen, P)?;

        self.sink.write_arithmetic(ArithOp::Not)?;
        self.sink.write_if(&if_false)?;
        self.sink.write_label(&if_true)?;

        self.compile_block(P)?;
        self.sink.write_goto(&if_end)?;
        self.sink.write_label(&if_false)?;

        if self.tokens.match_keyword(Keyword::Else) {
            self.compile_block(P)?;
        }
        self.sink.write_label(&if_end)?;

        Ok(())
    }

    /// `'while' '(' expression ')' '{' statements '}'`
    fn compile_while(&mut self) -> JackResult<()> {
        const P: &str = "whileStatement";

        self.tokens.expect_keyword(Keyword::While, P)?;

        let id = self.next_label_id();
        let while_exp = format!("WHILE_EXP{id}");
        let while_end = format!("WHILE_END{id}");

        self.sink.write_label(&while_exp)?;

        self.tokens.expect_symbol(Symbol::LeftParen, P)?;
        self.compile_expression()?;
        self.tokens.expect_symbol(Symbol::RightParen, P)?;

        self.sink.write_arithmetic(ArithOp::Not)?;
        self.sink.write_if(&while_end)?;

        self.compile_block(P)?;
        self.sink.write_goto(&while_exp)?;
        self.sink.write_label(&while_end)?;

        Ok(())
    }

    /// `'do' subroutineCall ';'`
    fn compile_do(&mut self) -> JackResult<()> {
        const P: &str = "doStatement";

        self.tokens.expect_keyword(Keyword::Do, P)?;
        let ident = self.tokens.identifier(P)?;
        self.compile_call(ident)?;
        self.tokens.expect_symbol(Symbol::Semicolon, P)?;

        // Discard the return value.
        self.sink.write_pop(Segment::Temp, 0)?;

        Ok(())
    }

    /// `'return' expression? ';'`
    fn compile_return(&mut self) -> JackResult<()> {
        const P: &str = "returnStatement";

        self.tokens.expect_keyword(Keyword::Return, P)?;

        if self.tokens.check_symbol(Symbol::Semicolon) {
            // Every call leaves a value, void or not.
            self.sink.write_push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.tokens.expect_symbol(Symbol::Semicolon, P)?;

        self.sink.write_return()?;

        Ok(())
    }
}
