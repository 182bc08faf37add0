//! Hack assembly instructions and the append-only builder every emitter
//! writes into.

use std::fmt;

/// Target of an `@` instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    Symbol(String),
    Number(u16),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Symbol(sym) => f.write_str(sym),
            Address::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Address {
    fn from(sym: &str) -> Self {
        Address::Symbol(sym.to_string())
    }
}

impl From<String> for Address {
    fn from(sym: String) -> Self {
        Address::Symbol(sym)
    }
}

impl From<u16> for Address {
    fn from(n: u16) -> Self {
        Address::Number(n)
    }
}

/// Registers written by a compute instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dest {
    M,
    D,
    MD,
    A,
    AM,
    AD,
    AMD,
}

impl Dest {
    pub fn writes_a(self) -> bool {
        matches!(self, Dest::A | Dest::AM | Dest::AD | Dest::AMD)
    }

    pub fn writes_d(self) -> bool {
        matches!(self, Dest::D | Dest::MD | Dest::AD | Dest::AMD)
    }

    pub fn writes_m(self) -> bool {
        matches!(self, Dest::M | Dest::MD | Dest::AM | Dest::AMD)
    }
}

impl fmt::Display for Dest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dest::M => "M",
            Dest::D => "D",
            Dest::MD => "MD",
            Dest::A => "A",
            Dest::AM => "AM",
            Dest::AD => "AD",
            Dest::AMD => "AMD",
        })
    }
}

/// The 28 computations the ALU supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comp {
    Zero,
    One,
    NegOne,
    D,
    A,
    M,
    NotD,
    NotA,
    NotM,
    NegD,
    NegA,
    NegM,
    DPlusOne,
    APlusOne,
    MPlusOne,
    DMinusOne,
    AMinusOne,
    MMinusOne,
    DPlusA,
    DPlusM,
    DMinusA,
    DMinusM,
    AMinusD,
    MMinusD,
    DAndA,
    DAndM,
    DOrA,
    DOrM,
}

impl Comp {
    pub fn mnemonic(self) -> &'static str {
        use Comp::*;
        match self {
            Zero => "0",
            One => "1",
            NegOne => "-1",
            D => "D",
            A => "A",
            M => "M",
            NotD => "!D",
            NotA => "!A",
            NotM => "!M",
            NegD => "-D",
            NegA => "-A",
            NegM => "-M",
            DPlusOne => "D+1",
            APlusOne => "A+1",
            MPlusOne => "M+1",
            DMinusOne => "D-1",
            AMinusOne => "A-1",
            MMinusOne => "M-1",
            DPlusA => "D+A",
            DPlusM => "D+M",
            DMinusA => "D-A",
            DMinusM => "D-M",
            AMinusD => "A-D",
            MMinusD => "M-D",
            DAndA => "D&A",
            DAndM => "D&M",
            DOrA => "D|A",
            DOrM => "D|M",
        }
    }

    /// Evaluate with 16-bit wrapping arithmetic.
    pub fn eval(self, a: u16, d: u16, m: u16) -> u16 {
        use Comp::*;
        match self {
            Zero => 0,
            One => 1,
            NegOne => u16::MAX,
            D => d,
            A => a,
            M => m,
            NotD => !d,
            NotA => !a,
            NotM => !m,
            NegD => d.wrapping_neg(),
            NegA => a.wrapping_neg(),
            NegM => m.wrapping_neg(),
            DPlusOne => d.wrapping_add(1),
            APlusOne => a.wrapping_add(1),
            MPlusOne => m.wrapping_add(1),
            DMinusOne => d.wrapping_sub(1),
            AMinusOne => a.wrapping_sub(1),
            MMinusOne => m.wrapping_sub(1),
            DPlusA => d.wrapping_add(a),
            DPlusM => d.wrapping_add(m),
            DMinusA => d.wrapping_sub(a),
            DMinusM => d.wrapping_sub(m),
            AMinusD => a.wrapping_sub(d),
            MMinusD => m.wrapping_sub(d),
            DAndA => d & a,
            DAndM => d & m,
            DOrA => d | a,
            DOrM => d | m,
        }
    }
}

impl fmt::Display for Comp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jump {
    JGT,
    JEQ,
    JGE,
    JLT,
    JNE,
    JLE,
    JMP,
}

impl Jump {
    /// Whether the jump is taken for a computed value.
    pub fn taken(self, value: u16) -> bool {
        let value = value as i16;
        match self {
            Jump::JGT => value > 0,
            Jump::JEQ => value == 0,
            Jump::JGE => value >= 0,
            Jump::JLT => value < 0,
            Jump::JNE => value != 0,
            Jump::JLE => value <= 0,
            Jump::JMP => true,
        }
    }
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Address(Address),
    Compute {
        dest: Option<Dest>,
        comp: Comp,
        jump: Option<Jump>,
    },
    Label(String),
    Comment(String),
}

impl Instruction {
    /// Whether the instruction occupies a ROM word.
    pub fn is_executable(&self) -> bool {
        matches!(self, Instruction::Address(_) | Instruction::Compute { .. })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Address(addr) => write!(f, "@{}", addr),
            Instruction::Compute { dest, comp, jump } => {
                if let Some(dest) = dest {
                    write!(f, "{}=", dest)?;
                }
                write!(f, "{}", comp)?;
                if let Some(jump) = jump {
                    write!(f, ";{}", jump)?;
                }
                Ok(())
            }
            Instruction::Label(name) => write!(f, "({})", name),
            Instruction::Comment(text) => write!(f, "// {}", text),
        }
    }
}

/// Append-only instruction sequence.
#[derive(Debug, Default, Clone)]
pub struct AsmBuilder {
    instructions: Vec<Instruction>,
    comments: bool,
}

impl AsmBuilder {
    pub fn new(comments: bool) -> Self {
        AsmBuilder {
            instructions: vec![],
            comments,
        }
    }

    pub fn at(&mut self, addr: impl Into<Address>) -> &mut Self {
        self.instructions.push(Instruction::Address(addr.into()));
        self
    }

    /// `dest=comp`
    pub fn set(&mut self, dest: Dest, comp: Comp) -> &mut Self {
        self.instructions.push(Instruction::Compute {
            dest: Some(dest),
            comp,
            jump: None,
        });
        self
    }

    /// `comp;jump`
    pub fn jump(&mut self, comp: Comp, jump: Jump) -> &mut Self {
        self.instructions.push(Instruction::Compute {
            dest: None,
            comp,
            jump: Some(jump),
        });
        self
    }

    pub fn label(&mut self, name: impl Into<String>) -> &mut Self {
        self.instructions.push(Instruction::Label(name.into()));
        self
    }

    /// Dropped when the builder was created without comments.
    pub fn comment(&mut self, text: impl fmt::Display) -> &mut Self {
        if self.comments {
            self.instructions.push(Instruction::Comment(text.to_string()));
        }
        self
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }
}
