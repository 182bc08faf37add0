//! A small emulator for the target computer, used to check emitted code by
//! running it.

use std::collections::HashMap;

use thiserror::Error;

use crate::asm::{Address, Comp, Dest, Instruction, Jump};

pub const RAM_SIZE: usize = 0x8000;
pub const ROM_SIZE: usize = 0x8000;
/// First RAM word handed out to variables.
pub const VARIABLE_BASE: u16 = 16;

pub const SP: u16 = 0;
pub const LCL: u16 = 1;
pub const ARG: u16 = 2;
pub const THIS: u16 = 3;
pub const THAT: u16 = 4;

const PREDEFINED: [(&str, u16); 7] = [
    ("SP", SP),
    ("LCL", LCL),
    ("ARG", ARG),
    ("THIS", THIS),
    ("THAT", THAT),
    ("SCREEN", 0x4000),
    ("KBD", 0x6000),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("label {0} is declared more than once")]
    DuplicateLabel(String),

    #[error("out of variable space at {0}")]
    TooManyVariables(String),

    #[error("program does not fit in {0} words of ROM")]
    ProgramTooLarge(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Load(u16),
    Compute {
        dest: Option<Dest>,
        comp: Comp,
        jump: Option<Jump>,
    },
}

/// Why `run` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The program counter left the program.
    Finished,
    StepLimit,
}

pub struct Machine {
    rom: Vec<Op>,
    ram: Vec<u16>,
    symbols: HashMap<String, u16>,
    a: u16,
    d: u16,
    pc: usize,
}

impl Machine {
    /// Resolve labels and variables and load the program into ROM.
    pub fn load(program: &[Instruction]) -> Result<Self, LoadError> {
        let mut symbols: HashMap<String, u16> = PREDEFINED
            .iter()
            .map(|(name, addr)| (name.to_string(), *addr))
            .collect();
        for r in 0..16u16 {
            symbols.insert(format!("R{}", r), r);
        }

        let mut rom_len = 0u16;
        for instruction in program {
            match instruction {
                Instruction::Label(name) => {
                    if symbols.insert(name.clone(), rom_len).is_some() {
                        return Err(LoadError::DuplicateLabel(name.clone()));
                    }
                }
                _ if instruction.is_executable() => {
                    rom_len = rom_len
                        .checked_add(1)
                        .filter(|len| *len as usize <= ROM_SIZE)
                        .ok_or(LoadError::ProgramTooLarge(ROM_SIZE))?;
                }
                _ => {}
            }
        }

        let mut next_variable = VARIABLE_BASE;
        let mut rom = Vec::with_capacity(rom_len as usize);
        for instruction in program {
            match instruction {
                Instruction::Address(Address::Number(n)) => rom.push(Op::Load(*n)),
                Instruction::Address(Address::Symbol(sym)) => {
                    let addr = match symbols.get(sym) {
                        Some(addr) => *addr,
                        None => {
                            if next_variable as usize >= RAM_SIZE {
                                return Err(LoadError::TooManyVariables(sym.clone()));
                            }
                            let addr = next_variable;
                            symbols.insert(sym.clone(), addr);
                            next_variable += 1;
                            addr
                        }
                    };
                    rom.push(Op::Load(addr));
                }
                Instruction::Compute { dest, comp, jump } => rom.push(Op::Compute {
                    dest: *dest,
                    comp: *comp,
                    jump: *jump,
                }),
                Instruction::Label(_) | Instruction::Comment(_) => {}
            }
        }

        Ok(Machine {
            rom,
            ram: vec![0; RAM_SIZE],
            symbols,
            a: 0,
            d: 0,
            pc: 0,
        })
    }

    fn index(addr: u16) -> usize {
        addr as usize & (RAM_SIZE - 1)
    }

    pub fn ram(&self, addr: u16) -> u16 {
        self.ram[Self::index(addr)]
    }

    pub fn set_ram(&mut self, addr: u16, value: u16) {
        self.ram[Self::index(addr)] = value;
    }

    /// RAM contents as signed words, from `start` for `len` words.
    pub fn words(&self, start: u16, len: usize) -> Vec<i16> {
        (0..len)
            .map(|i| self.ram(start.wrapping_add(i as u16)) as i16)
            .collect()
    }

    /// Address of a label or allocated variable.
    pub fn symbol(&self, name: &str) -> Option<u16> {
        self.symbols.get(name).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.pc >= self.rom.len()
    }

    /// Execute one instruction; false once the program has been left.
    pub fn step(&mut self) -> bool {
        let Some(op) = self.rom.get(self.pc).copied() else {
            return false;
        };

        match op {
            Op::Load(value) => {
                self.a = value;
                self.pc += 1;
            }
            Op::Compute { dest, comp, jump } => {
                let addr = self.a;
                let value = comp.eval(addr, self.d, self.ram(addr));
                if let Some(dest) = dest {
                    if dest.writes_m() {
                        self.set_ram(addr, value);
                    }
                    if dest.writes_a() {
                        self.a = value;
                    }
                    if dest.writes_d() {
                        self.d = value;
                    }
                }
                self.pc = match jump {
                    Some(jump) if jump.taken(value) => addr as usize,
                    _ => self.pc + 1,
                };
            }
        }
        true
    }

    pub fn run(&mut self, max_steps: usize) -> Halt {
        for _ in 0..max_steps {
            if !self.step() {
                return Halt::Finished;
            }
        }
        if self.is_finished() {
            Halt::Finished
        } else {
            Halt::StepLimit
        }
    }

    /// Run until the program counter reaches `label`. Returns false if the
    /// label is unknown, the program ends, or the step limit runs out first.
    pub fn run_to(&mut self, label: &str, max_steps: usize) -> bool {
        let Some(target) = self.symbol(label) else {
            return false;
        };
        for _ in 0..max_steps {
            if self.pc == target as usize {
                return true;
            }
            if !self.step() {
                return false;
            }
        }
        self.pc == target as usize
    }
}
