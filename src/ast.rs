use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Segment {
    Constant,
    Local,
    Static,
    Argument,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    pub fn name(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Command {
    // Stack Basics
    Push(Segment, u16),
    Pop(Segment, u16),
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,

    // Control
    Label(String),
    Goto(String),
    IfGoto(String),

    // Functions
    Function(String, u16),
    Call(String, u16),
    Return,
}

impl Command {
    /// Operand stack effect of a command, as (values consumed, values produced).
    ///
    /// `function` reports its local slots as produced values; `return` consumes
    /// the return value and leaves the callee's stack behind.
    pub fn stack_effect(&self) -> (u16, u16) {
        use Command::*;
        match self {
            Push(..) => (0, 1),
            Pop(..) => (1, 0),
            Add | Sub | And | Or | Eq | Gt | Lt => (2, 1),
            Neg | Not => (1, 1),
            Label(_) | Goto(_) => (0, 0),
            IfGoto(_) => (1, 0),
            Function(_, locals) => (0, *locals),
            Call(_, args) => (*args, 1),
            Return => (1, 0),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Command::*;
        match self {
            Push(seg, arg) => write!(f, "push {} {}", seg, arg),
            Pop(seg, arg) => write!(f, "pop {} {}", seg, arg),
            Add => f.write_str("add"),
            Sub => f.write_str("sub"),
            Neg => f.write_str("neg"),
            Eq => f.write_str("eq"),
            Gt => f.write_str("gt"),
            Lt => f.write_str("lt"),
            And => f.write_str("and"),
            Or => f.write_str("or"),
            Not => f.write_str("not"),
            Label(sym) => write!(f, "label {}", sym),
            Goto(sym) => write!(f, "goto {}", sym),
            IfGoto(sym) => write!(f, "if-goto {}", sym),
            Function(name, locals) => write!(f, "function {} {}", name, locals),
            Call(name, args) => write!(f, "call {} {}", name, args),
            Return => f.write_str("return"),
        }
    }
}

/// A line of VM source, 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: &str, line: usize) -> Self {
        Self {
            file: file.to_string(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A parsed command together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCommand {
    pub command: Command,
    pub location: SourceLocation,
}

#[cfg(test)]
mod tests {
    use super::{Command::*, Segment::*};

    #[test]
    fn display_matches_source_syntax() {
        assert_eq!(Push(Constant, 7).to_string(), "push constant 7");
        assert_eq!(Pop(That, 2).to_string(), "pop that 2");
        assert_eq!(IfGoto("LOOP".into()).to_string(), "if-goto LOOP");
        assert_eq!(Function("Main.fib".into(), 2).to_string(), "function Main.fib 2");
        assert_eq!(Return.to_string(), "return");
    }

    #[test]
    fn stack_effects() {
        assert_eq!(Push(Local, 0).stack_effect(), (0, 1));
        assert_eq!(Pop(Temp, 3).stack_effect(), (1, 0));
        assert_eq!(Sub.stack_effect(), (2, 1));
        assert_eq!(Lt.stack_effect(), (2, 1));
        assert_eq!(Not.stack_effect(), (1, 1));
        assert_eq!(Call("Math.max".into(), 2).stack_effect(), (2, 1));
        assert_eq!(Call("Sys.halt".into(), 0).stack_effect(), (0, 1));
    }
}
