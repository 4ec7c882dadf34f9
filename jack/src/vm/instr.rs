use std::fmt;

use smol_str::SmolStr;

/// Named storage region addressed by the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Argument => "argument",
            Self::Local    => "local",
            Self::Static   => "static",
            Self::This     => "this",
            Self::That     => "that",
            Self::Pointer  => "pointer",
            Self::Temp     => "temp",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arithmetic and logical commands operating on the top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithOp {
    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Neg => "neg",
            Self::Eq  => "eq",
            Self::Gt  => "gt",
            Self::Lt  => "lt",
            Self::And => "and",
            Self::Or  => "or",
            Self::Not => "not",
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One VM instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `push segment index`
    Push(Segment, u16),
    /// `pop segment index`
    Pop(Segment, u16),
    Arith(ArithOp),
    Label(SmolStr),
    Goto(SmolStr),
    /// `if-goto label`
    /// Pops the top of the stack, and jumps when it's not zero.
    IfGoto(SmolStr),
    /// `call Class.name nArgs`
    Call(SmolStr, u16),
    /// `function Class.name nLocals`
    Function(SmolStr, u16),
    Return,
}

/// Outputs instruction as VM text.
impl fmt::Display for Instr {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instr::Push(segment, index)  => write!(f, "push {} {}", segment, index),
            Instr::Pop(segment, index)   => write!(f, "pop {} {}", segment, index),
            Instr::Arith(op)             => write!(f, "{}", op),
            Instr::Label(name)           => write!(f, "label {}", name),
            Instr::Goto(name)            => write!(f, "goto {}", name),
            Instr::IfGoto(name)          => write!(f, "if-goto {}", name),
            Instr::Call(name, n_args)    => write!(f, "call {} {}", name, n_args),
            Instr::Function(name, n_locals) => write!(f, "function {} {}", name, n_locals),
            Instr::Return                => write!(f, "return"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_instr_text() {
        assert_eq!(Instr::Push(Segment::Constant, 7).to_string(), "push constant 7");
        assert_eq!(Instr::Pop(Segment::Pointer, 1).to_string(), "pop pointer 1");
        assert_eq!(Instr::Arith(ArithOp::Not).to_string(), "not");
        assert_eq!(Instr::Label("WHILE_EXP0".into()).to_string(), "label WHILE_EXP0");
        assert_eq!(Instr::Goto("IF_END3".into()).to_string(), "goto IF_END3");
        assert_eq!(Instr::IfGoto("IF_FALSE3".into()).to_string(), "if-goto IF_FALSE3");
        assert_eq!(Instr::Call("Math.multiply".into(), 2).to_string(), "call Math.multiply 2");
        assert_eq!(Instr::Function("Main.main".into(), 0).to_string(), "function Main.main 0");
        assert_eq!(Instr::Return.to_string(), "return");
    }
}
