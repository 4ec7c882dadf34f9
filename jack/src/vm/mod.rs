//! VM instructions and the code-emission boundary.
mod instr;
mod writer;

pub use self::{
    instr::{ArithOp, Instr, Segment},
    writer::{to_text, CodeSink, VmWriter},
};
