//! Compiler from the Jack language to stack VM code.
pub mod compiler;
pub mod driver;
mod error;
pub mod symbol;
pub mod syntax;
pub mod vm;
pub mod xml;

pub use self::error::{
    JackError, JackResult, LexError, LexErrorKind, ResolutionError, ResolutionErrorKind, SourceLoc,
    SyntaxError,
};

use self::{syntax::TokenStream, vm::Instr};

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile the source of one class into VM instructions.
pub fn compile_str(source_code: impl AsRef<str>) -> JackResult<Vec<Instr>> {
    let tokens = TokenStream::from_source(source_code.as_ref())?;
    let mut code = Vec::new();
    compiler::compile_class(tokens, &mut code)?;
    Ok(code)
}

pub mod prelude {
    pub use super::{
        compile_str,
        compiler::{compile_class, compile_class_with_tree},
        driver::CompilerConf,
        error::{JackError, JackResult},
        syntax::TokenStream,
        vm::{CodeSink, Instr, VmWriter},
        xml::{TreeSink, TreeWriter},
    };
}
