//! Expressions, terms and subroutine calls.
use smol_str::SmolStr;

use crate::{
    error::{JackResult, ResolutionErrorKind},
    symbol::{Resolution, Symbol},
    syntax::{Ident, Keyword, Symbol as Sym, TokenKind, MAX_INT},
    vm::{ArithOp, CodeSink, Segment},
};

use super::{Compiler, SubroutineKind};

/// Binary operator between two terms.
///
/// Jack has no precedence: operators apply strictly left to right,
/// and only parentheses change the grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Lt,
    Gt,
    Eq,
}

impl BinaryOp {
    #[rustfmt::skip]
    pub fn from_symbol(symbol: Sym) -> Option<Self> {
        match symbol {
            Sym::Plus    => Some(Self::Add),
            Sym::Minus   => Some(Self::Sub),
            Sym::Star    => Some(Self::Mul),
            Sym::Slash   => Some(Self::Div),
            Sym::Amp     => Some(Self::And),
            Sym::Pipe    => Some(Self::Or),
            Sym::Less    => Some(Self::Lt),
            Sym::Greater => Some(Self::Gt),
            Sym::Eq      => Some(Self::Eq),
            _ => None,
        }
    }
}

/// Resolved target of a subroutine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// `name(...)`: method on the current object.
    Method { name: SmolStr },
    /// `var.name(...)`: method on the object held by a variable.
    Instance { name: SmolStr, receiver: Symbol },
    /// `Class.name(...)`: function or constructor.
    Function { name: SmolStr },
}

impl CallTarget {
    /// Fully qualified `Class.subroutine` name.
    pub fn name(&self) -> &str {
        match self {
            Self::Method { name } | Self::Instance { name, .. } | Self::Function { name } => name.as_str(),
        }
    }

    /// Number of hidden arguments pushed before the explicit ones.
    pub fn receiver_count(&self) -> u16 {
        match self {
            Self::Method { .. } | Self::Instance { .. } => 1,
            Self::Function { .. } => 0,
        }
    }
}

fn is_primitive(ty: &str) -> bool {
    matches!(ty, "int" | "char" | "boolean")
}

impl<'a, 's, S: CodeSink + ?Sized> Compiler<'a, 's, S> {
    /// `term (op term)*`
    pub(super) fn compile_expression(&mut self) -> JackResult<()> {
        self.node("expression", |this| {
            this.compile_term()?;

            while let TokenKind::Symbol(symbol) = this.tokens.peek_kind() {
                let op = match BinaryOp::from_symbol(symbol) {
                    Some(op) => op,
                    None => break,
                };
                this.tokens.advance();

                this.compile_term()?;
                this.write_binary_op(op)?;
            }

            Ok(())
        })
    }

    fn write_binary_op(&mut self, op: BinaryOp) -> JackResult<()> {
        match op {
            BinaryOp::Add => self.sink.write_arithmetic(ArithOp::Add),
            BinaryOp::Sub => self.sink.write_arithmetic(ArithOp::Sub),
            BinaryOp::And => self.sink.write_arithmetic(ArithOp::And),
            BinaryOp::Or => self.sink.write_arithmetic(ArithOp::Or),
            BinaryOp::Lt => self.sink.write_arithmetic(ArithOp::Lt),
            BinaryOp::Gt => self.sink.write_arithmetic(ArithOp::Gt),
            BinaryOp::Eq => self.sink.write_arithmetic(ArithOp::Eq),
            // No multiply or divide in the VM.
            BinaryOp::Mul => self.sink.write_call("Math.multiply", 2),
            BinaryOp::Div => self.sink.write_call("Math.divide", 2),
        }
    }

    fn compile_term(&mut self) -> JackResult<()> {
        self.node("term", Self::compile_term_body)
    }

    /// ```text
    /// integerConstant | stringConstant | keywordConstant | varName
    ///     | varName '[' expression ']' | subroutineCall
    ///     | '(' expression ')' | unaryOp term
    /// ```
    fn compile_term_body(&mut self) -> JackResult<()> {
        const P: &str = "term";

        match self.tokens.peek_kind() {
            TokenKind::Int => {
                let value = self.tokens.int_val(P)?;
                self.sink.write_push(Segment::Constant, value)
            }
            TokenKind::Str => {
                // Span includes both quotes.
                if self.tokens.current().span.size as usize > MAX_INT as usize + 2 {
                    return Err(self.tokens.error("string constant of at most 32767 characters", P));
                }
                let text = self.tokens.string_val(P)?;
                self.write_string(text)
            }
            TokenKind::Keyword(Keyword::True) => {
                self.tokens.advance();
                self.sink.write_push(Segment::Constant, 0)?;
                self.sink.write_arithmetic(ArithOp::Not)
            }
            TokenKind::Keyword(Keyword::False | Keyword::Null) => {
                self.tokens.advance();
                self.sink.write_push(Segment::Constant, 0)
            }
            TokenKind::Keyword(Keyword::This) => {
                self.tokens.advance();
                self.sink.write_push(Segment::Pointer, 0)
            }
            TokenKind::Symbol(Sym::LeftParen) => {
                self.tokens.advance();
                self.compile_expression()?;
                self.tokens.expect_symbol(Sym::RightParen, P)?;
                Ok(())
            }
            TokenKind::Symbol(Sym::Minus) => {
                self.tokens.advance();
                self.compile_term()?;
                self.sink.write_arithmetic(ArithOp::Neg)
            }
            TokenKind::Symbol(Sym::Tilde) => {
                self.tokens.advance();
                self.compile_term()?;
                self.sink.write_arithmetic(ArithOp::Not)
            }
            TokenKind::Ident => {
                let ident = self.tokens.identifier(P)?;

                match self.tokens.peek_kind() {
                    TokenKind::Symbol(Sym::LeftBracket) => {
                        let array = self.variable(&ident)?;
                        self.tokens.advance();

                        self.sink.write_push(array.kind.segment(), array.index)?;
                        self.compile_expression()?;
                        self.tokens.expect_symbol(Sym::RightBracket, P)?;
                        self.sink.write_arithmetic(ArithOp::Add)?;

                        self.sink.write_pop(Segment::Pointer, 1)?;
                        self.sink.write_push(Segment::That, 0)
                    }
                    TokenKind::Symbol(Sym::LeftParen | Sym::Dot) => self.compile_call(ident),
                    _ => {
                        let var = self.variable(&ident)?;
                        self.sink.write_push(var.kind.segment(), var.index)
                    }
                }
            }
            _ => Err(self.tokens.error("term", P)),
        }
    }

    /// Build a `String` object one character at a time.
    fn write_string(&mut self, text: &str) -> JackResult<()> {
        // Lexer only lets ASCII through, so bytes are characters.
        self.sink.write_push(Segment::Constant, text.len() as u16)?;
        self.sink.write_call("String.new", 1)?;

        for byte in text.bytes() {
            self.sink.write_push(Segment::Constant, u16::from(byte))?;
            self.sink.write_call("String.appendChar", 2)?;
        }

        Ok(())
    }

    /// ```text
    /// subroutineName '(' expressionList ')'
    ///     | (className | varName) '.' subroutineName '(' expressionList ')'
    /// ```
    ///
    /// The leading identifier has already been consumed.
    pub(super) fn compile_call(&mut self, first: Ident) -> JackResult<()> {
        const P: &str = "subroutineCall";

        let target = if self.tokens.match_symbol(Sym::Dot) {
            let subroutine = self.tokens.identifier(P)?;
            self.resolve_qualified(&first, &subroutine)?
        } else {
            self.resolve_unqualified(&first)?
        };

        match &target {
            CallTarget::Method { .. } => self.sink.write_push(Segment::Pointer, 0)?,
            CallTarget::Instance { receiver, .. } => {
                self.sink.write_push(receiver.kind.segment(), receiver.index)?
            }
            CallTarget::Function { .. } => {}
        }

        self.tokens.expect_symbol(Sym::LeftParen, P)?;
        let n_args = self.node("expressionList", Self::compile_expression_list)?;
        self.tokens.expect_symbol(Sym::RightParen, P)?;

        self.sink.write_call(target.name(), n_args + target.receiver_count())
    }

    /// `subroutineName(...)` is a method call on `this`.
    fn resolve_unqualified(&self, name: &Ident) -> JackResult<CallTarget> {
        if self.subroutine == Some(SubroutineKind::Function) {
            return Err(self.resolution_error(
                ResolutionErrorKind::NoReceiver {
                    class: self.class_name.clone(),
                    subroutine: name.name.clone(),
                },
                name.token.span,
            ));
        }

        Ok(CallTarget::Method {
            name: format!("{}.{}", self.class_name, name.name).into(),
        })
    }

    /// `qualifier.subroutineName(...)` is a method call when the qualifier
    /// is a variable, otherwise a function call on a class.
    fn resolve_qualified(&self, qualifier: &Ident, subroutine: &Ident) -> JackResult<CallTarget> {
        match self.symbols.resolve(qualifier.name.as_str()) {
            Resolution::Variable(receiver) if is_primitive(receiver.ty.as_str()) => {
                Err(self.resolution_error(
                    ResolutionErrorKind::PrimitiveReceiver {
                        name: receiver.name.clone(),
                        ty: receiver.ty.clone(),
                    },
                    qualifier.token.span,
                ))
            }
            Resolution::Variable(receiver) => Ok(CallTarget::Instance {
                name: format!("{}.{}", receiver.ty, subroutine.name).into(),
                receiver: receiver.clone(),
            }),
            Resolution::ClassOrFunction => Ok(CallTarget::Function {
                name: format!("{}.{}", qualifier.name, subroutine.name).into(),
            }),
        }
    }

    /// `(expression (',' expression)*)?`
    ///
    /// Returns the number of expressions.
    fn compile_expression_list(&mut self) -> JackResult<u16> {
        if self.tokens.check_symbol(Sym::RightParen) {
            return Ok(0);
        }

        self.compile_expression()?;
        let mut count = 1;

        while self.tokens.match_symbol(Sym::Comma) {
            self.compile_expression()?;
            count += 1;
        }

        Ok(count)
    }
}
