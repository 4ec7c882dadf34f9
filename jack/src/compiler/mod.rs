//! Single pass compiler.
//!
//! Recursive descent parser where each grammar production also emits
//! the VM code for the construct it recognises. There is no syntax tree;
//! the only state carried between productions is the symbol table and
//! the label counter. The shape of the parse can be reported to an
//! optional [`TreeSink`] as the productions are recognised.
mod expr;
mod stmt;

pub use self::{
    expr::{BinaryOp, CallTarget},
    stmt::StatementKind,
};

use log::debug;
use smol_str::SmolStr;

use crate::{
    error::{JackError, JackResult, ResolutionError, ResolutionErrorKind},
    symbol::{Symbol, SymbolTable, VarKind},
    syntax::{Ident, Keyword, Span, Symbol as Sym, TokenKind, TokenStream},
    vm::{CodeSink, Segment},
    xml::{self, TreeSink},
};

/// Compile one class from its tokens into the given sink.
///
/// The first error aborts compilation. Instructions emitted before the
/// error are left in the sink, so callers that need all-or-nothing output
/// should compile into a buffer.
pub fn compile_class<S>(tokens: TokenStream, sink: &mut S) -> JackResult<SmolStr>
where
    S: CodeSink + ?Sized,
{
    Compiler::new(tokens, sink).compile()
}

/// Compile one class, also reporting its parse tree to `tree`.
pub fn compile_class_with_tree<'s, S>(
    tokens: TokenStream,
    sink: &'s mut S,
    tree: &'s mut dyn TreeSink,
) -> JackResult<SmolStr>
where
    S: CodeSink + ?Sized,
{
    Compiler::new(tokens, sink).with_tree(tree).compile()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

/// Compilation session for one class.
pub struct Compiler<'a, 's, S: CodeSink + ?Sized> {
    tokens: TokenStream<'a>,
    sink: &'s mut S,
    symbols: SymbolTable,
    /// Name of the class being compiled, used to qualify subroutine names.
    class_name: SmolStr,
    /// Source of unique label numbers. Never reset within a class.
    label_count: u32,
    /// Kind of the subroutine currently being compiled.
    subroutine: Option<SubroutineKind>,
    tree: Option<&'s mut dyn TreeSink>,
    /// Tokens already reported to the tree as terminals.
    reported: usize,
}

impl<'a, 's, S: CodeSink + ?Sized> Compiler<'a, 's, S> {
    pub fn new(tokens: TokenStream<'a>, sink: &'s mut S) -> Self {
        Self {
            tokens,
            sink,
            symbols: SymbolTable::new(),
            class_name: SmolStr::default(),
            label_count: 0,
            subroutine: None,
            tree: None,
            reported: 0,
        }
    }

    pub fn with_tree(mut self, tree: &'s mut dyn TreeSink) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Compile the class, returning its name.
    pub fn compile(mut self) -> JackResult<SmolStr> {
        self.node("class", Self::compile_class)?;
        Ok(self.class_name)
    }

    /// Run a production inside a parse tree element.
    ///
    /// Tokens consumed before the element opens belong to the parent, and
    /// tokens consumed by the production itself are reported before it closes.
    fn node<T>(
        &mut self,
        element: &'static str,
        production: impl FnOnce(&mut Self) -> JackResult<T>,
    ) -> JackResult<T> {
        if self.tree.is_none() {
            return production(self);
        }

        self.flush_terminals()?;
        if let Some(tree) = self.tree.as_deref_mut() {
            tree.open(element)?;
        }

        let value = production(self)?;

        self.flush_terminals()?;
        if let Some(tree) = self.tree.as_deref_mut() {
            tree.close(element)?;
        }

        Ok(value)
    }

    /// Report the tokens consumed since the last tree event.
    fn flush_terminals(&mut self) -> JackResult<()> {
        let consumed = self.tokens.position();

        if let Some(tree) = self.tree.as_deref_mut() {
            let source_code = self.tokens.source_code();
            for token in &self.tokens.tokens()[self.reported..consumed] {
                tree.terminal(token.kind.class(), xml::terminal_text(source_code, token))?;
            }
        }

        self.reported = consumed;
        Ok(())
    }

    fn next_label_id(&mut self) -> u32 {
        let id = self.label_count;
        self.label_count += 1;
        id
    }

    /// Declare a variable, rejecting a second declaration in the same scope.
    fn define(&mut self, ident: &Ident, ty: SmolStr, kind: VarKind) -> JackResult<()> {
        match self.symbols.define(ident.name.clone(), ty, kind) {
            Ok(_) => Ok(()),
            Err(redefinition) => Err(self.resolution_error(
                ResolutionErrorKind::Redefined {
                    name: redefinition.name,
                    kind: redefinition.kind,
                },
                ident.token.span,
            )),
        }
    }

    /// Look up an identifier that must name a variable.
    fn variable(&self, ident: &Ident) -> JackResult<Symbol> {
        match self.symbols.lookup(ident.name.as_str()) {
            Some(symbol) => Ok(symbol.clone()),
            None => Err(self.resolution_error(
                ResolutionErrorKind::UndefinedVariable(ident.name.clone()),
                ident.token.span,
            )),
        }
    }

    #[inline(never)]
    #[cold]
    fn resolution_error(&self, kind: ResolutionErrorKind, span: Span) -> JackError {
        ResolutionError {
            kind,
            loc: self.tokens.loc(span),
        }
        .into()
    }
}

/// Declarations
impl<'a, 's, S: CodeSink + ?Sized> Compiler<'a, 's, S> {
    /// `'class' identifier '{' classVarDec* subroutineDec* '}'`
    fn compile_class(&mut self) -> JackResult<()> {
        const P: &str = "class";

        self.tokens.expect_keyword(Keyword::Class, P)?;
        let name = self.tokens.identifier(P)?;
        self.class_name = name.name;
        self.symbols.open_class_scope();
        debug!("compiling class {}", self.class_name);

        self.tokens.expect_symbol(Sym::LeftBrace, P)?;

        while matches!(
            self.tokens.peek_kind(),
            TokenKind::Keyword(Keyword::Static | Keyword::Field)
        ) {
            self.node("classVarDec", Self::compile_class_var_dec)?;
        }

        while matches!(
            self.tokens.peek_kind(),
            TokenKind::Keyword(Keyword::Constructor | Keyword::Function | Keyword::Method)
        ) {
            self.node("subroutineDec", Self::compile_subroutine)?;
        }

        self.tokens.expect_symbol(Sym::RightBrace, P)?;

        // One class per compilation unit.
        if self.tokens.has_more() {
            return Err(self.tokens.error("end-of-file", P));
        }

        Ok(())
    }

    /// `('static'|'field') type identifier (',' identifier)* ';'`
    fn compile_class_var_dec(&mut self) -> JackResult<()> {
        const P: &str = "classVarDec";

        let kind = match self.tokens.peek_kind() {
            TokenKind::Keyword(Keyword::Static) => VarKind::Static,
            TokenKind::Keyword(Keyword::Field) => VarKind::Field,
            _ => return Err(self.tokens.error("'static' or 'field'", P)),
        };
        self.tokens.advance();

        let ty = self.compile_type(P)?;
        self.compile_var_names(ty, kind, P)
    }

    /// `type identifier (',' identifier)* ';'` after the leading keyword.
    fn compile_var_names(&mut self, ty: SmolStr, kind: VarKind, production: &'static str) -> JackResult<()> {
        loop {
            let ident = self.tokens.identifier(production)?;
            self.define(&ident, ty.clone(), kind)?;

            if !self.tokens.match_symbol(Sym::Comma) {
                break;
            }
        }

        self.tokens.expect_symbol(Sym::Semicolon, production)?;
        Ok(())
    }

    /// `'int' | 'char' | 'boolean' | identifier`
    fn compile_type(&mut self, production: &'static str) -> JackResult<SmolStr> {
        match self.tokens.peek_kind() {
            TokenKind::Keyword(keyword @ (Keyword::Int | Keyword::Char | Keyword::Boolean)) => {
                self.tokens.advance();
                Ok(SmolStr::from(keyword.as_str()))
            }
            TokenKind::Ident => Ok(self.tokens.identifier(production)?.name),
            _ => Err(self.tokens.error("type", production)),
        }
    }

    /// ```text
    /// ('constructor'|'function'|'method') (type|'void') identifier
    ///     '(' parameterList ')' subroutineBody
    /// ```
    fn compile_subroutine(&mut self) -> JackResult<()> {
        const P: &str = "subroutineDec";

        let kind = match self.tokens.peek_kind() {
            TokenKind::Keyword(Keyword::Constructor) => SubroutineKind::Constructor,
            TokenKind::Keyword(Keyword::Function) => SubroutineKind::Function,
            TokenKind::Keyword(Keyword::Method) => SubroutineKind::Method,
            _ => return Err(self.tokens.error("'constructor', 'function' or 'method'", P)),
        };
        self.tokens.advance();

        let return_type = if self.tokens.match_keyword(Keyword::Void) {
            SmolStr::from(Keyword::Void.as_str())
        } else {
            self.compile_type(P)?
        };
        let name = self.tokens.identifier(P)?;

        self.symbols.open_subroutine_scope();
        self.subroutine = Some(kind);

        if kind == SubroutineKind::Method {
            // The receiver is passed as the first argument.
            let class_name = self.class_name.clone();
            self.symbols
                .define(Keyword::This.as_str(), class_name, VarKind::Argument)
                .map_err(|_| self.tokens.error("parameter", P))?;
        }

        self.tokens.expect_symbol(Sym::LeftParen, P)?;
        self.node("parameterList", Self::compile_parameter_list)?;
        self.tokens.expect_symbol(Sym::RightParen, P)?;

        self.node("subroutineBody", |this| this.compile_subroutine_body(kind, &return_type, &name))?;

        self.subroutine = None;
        Ok(())
    }

    /// `'{' varDec* statements '}'`
    fn compile_subroutine_body(&mut self, kind: SubroutineKind, return_type: &str, name: &Ident) -> JackResult<()> {
        const P: &str = "subroutineBody";

        self.tokens.expect_symbol(Sym::LeftBrace, P)?;
        while self.tokens.check_keyword(Keyword::Var) {
            self.node("varDec", Self::compile_var_dec)?;
        }

        let full_name = format!("{}.{}", self.class_name, name.name);
        let n_locals = self.symbols.count(VarKind::Local);
        debug!(
            "{:?} {} {}: {} arguments, {} locals",
            kind,
            return_type,
            full_name,
            self.symbols.count(VarKind::Argument),
            n_locals
        );
        self.sink.write_function(&full_name, n_locals)?;

        match kind {
            SubroutineKind::Constructor => {
                // Allocate the object, one word per field.
                let n_fields = self.symbols.count(VarKind::Field);
                self.sink.write_push(Segment::Constant, n_fields)?;
                self.sink.write_call("Memory.alloc", 1)?;
                self.sink.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Method => {
                self.sink.write_push(Segment::Argument, 0)?;
                self.sink.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Function => {}
        }

        self.node("statements", Self::compile_statements)?;
        self.tokens.expect_symbol(Sym::RightBrace, P)?;

        Ok(())
    }

    /// `( type identifier (',' type identifier)* )?`
    fn compile_parameter_list(&mut self) -> JackResult<()> {
        const P: &str = "parameterList";

        if self.tokens.check_symbol(Sym::RightParen) {
            return Ok(());
        }

        loop {
            let ty = self.compile_type(P)?;
            let ident = self.tokens.identifier(P)?;
            self.define(&ident, ty, VarKind::Argument)?;

            if !self.tokens.match_symbol(Sym::Comma) {
                return Ok(());
            }
        }
    }

    /// `'var' type identifier (',' identifier)* ';'`
    fn compile_var_dec(&mut self) -> JackResult<()> {
        const P: &str = "varDec";

        self.tokens.expect_keyword(Keyword::Var, P)?;
        let ty = self.compile_type(P)?;
        self.compile_var_names(ty, VarKind::Local, P)
    }
}
