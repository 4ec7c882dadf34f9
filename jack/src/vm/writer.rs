use std::io::Write;

use log::trace;

use super::{ArithOp, Instr, Segment};
use crate::error::JackResult;

/// Code-emission boundary.
///
/// Implementors only need to accept whole instructions through
/// [`CodeSink::emit`]. Each write is one complete line; no partial
/// state is kept between calls.
pub trait CodeSink {
    fn emit(&mut self, instr: Instr) -> JackResult<()>;

    fn write_push(&mut self, segment: Segment, index: u16) -> JackResult<()> {
        self.emit(Instr::Push(segment, index))
    }

    fn write_pop(&mut self, segment: Segment, index: u16) -> JackResult<()> {
        self.emit(Instr::Pop(segment, index))
    }

    fn write_arithmetic(&mut self, op: ArithOp) -> JackResult<()> {
        self.emit(Instr::Arith(op))
    }

    fn write_label(&mut self, label: &str) -> JackResult<()> {
        self.emit(Instr::Label(label.into()))
    }

    fn write_goto(&mut self, label: &str) -> JackResult<()> {
        self.emit(Instr::Goto(label.into()))
    }

    fn write_if(&mut self, label: &str) -> JackResult<()> {
        self.emit(Instr::IfGoto(label.into()))
    }

    fn write_call(&mut self, name: &str, n_args: u16) -> JackResult<()> {
        self.emit(Instr::Call(name.into(), n_args))
    }

    fn write_function(&mut self, name: &str, n_locals: u16) -> JackResult<()> {
        self.emit(Instr::Function(name.into(), n_locals))
    }

    fn write_return(&mut self) -> JackResult<()> {
        self.emit(Instr::Return)
    }
}

/// Collects instructions in memory.
impl CodeSink for Vec<Instr> {
    fn emit(&mut self, instr: Instr) -> JackResult<()> {
        self.push(instr);
        Ok(())
    }
}

/// Writes instructions as VM text, one per line.
pub struct VmWriter<W: Write> {
    writer: W,
}

impl<W: Write> VmWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flush and return the inner writer.
    pub fn finish(mut self) -> JackResult<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> CodeSink for VmWriter<W> {
    fn emit(&mut self, instr: Instr) -> JackResult<()> {
        trace!("{}", instr);
        writeln!(self.writer, "{}", instr)?;
        Ok(())
    }
}

/// Render a sequence of instructions as VM text.
pub fn to_text(code: &[Instr]) -> String {
    let mut text = String::new();
    for instr in code {
        text.push_str(&instr.to_string());
        text.push('\n');
    }
    text
}
