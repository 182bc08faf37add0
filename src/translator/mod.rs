//! Lowers VM commands into Hack assembly.

mod flow;
mod frame;
pub mod segment;
mod stack;

use std::collections::HashSet;

use crate::asm::{AsmBuilder, Comp, Dest, Instruction, Jump};
use crate::ast::{Command::*, *};
use crate::error::{Result, TranslateError};

pub use frame::{FRAME, RETURN_ADDRESS};
pub use stack::POP_TARGET;

/// First RAM word of the stack.
pub const STACK_BASE: u16 = 256;
/// Function the bootstrap calls; also the label scope before any `function`.
pub const ENTRY_POINT: &str = "Sys.init";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Initialise SP and call the entry point before any file.
    pub bootstrap: bool,
    /// Precede each command's code with a comment naming it.
    pub comments: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        TranslateOptions {
            bootstrap: true,
            comments: true,
        }
    }
}

/// State shared by every emitter during one translation run.
#[derive(Debug, Clone, Default)]
pub struct EmitContext {
    file: String,
    current_function: Option<String>,
    compare_sites: usize,
    call_sites: usize,
}

impl EmitContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the static namespace to another source file.
    pub fn begin_file(&mut self, name: &str) {
        self.file = name.to_string();
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn enter_function(&mut self, name: &str) {
        self.current_function = Some(name.to_string());
    }

    pub fn current_function(&self) -> &str {
        self.current_function.as_deref().unwrap_or(ENTRY_POINT)
    }

    pub fn static_symbol(&self, index: u16) -> String {
        format!("{}.{}", self.file, index)
    }

    pub fn scoped_label(&self, label: &str) -> String {
        format!("{}${}", self.current_function(), label)
    }

    /// True and end labels for the next comparison site.
    fn compare_labels(&mut self) -> (String, String) {
        let site = self.compare_sites;
        self.compare_sites += 1;
        (
            self.scoped_label(&format!("cmp.true.{}", site)),
            self.scoped_label(&format!("cmp.end.{}", site)),
        )
    }

    /// Return-address label for the next call site.
    fn return_label(&mut self) -> String {
        let site = self.call_sites;
        self.call_sites += 1;
        self.scoped_label(&format!("ret.{}", site))
    }

    pub fn compare_sites(&self) -> usize {
        self.compare_sites
    }

    pub fn call_sites(&self) -> usize {
        self.call_sites
    }
}

pub struct Translator {
    out: AsmBuilder,
    ctx: EmitContext,
    labels: HashSet<String>,
    /// Instructions already scanned for label declarations.
    claimed: usize,
}

impl Translator {
    pub fn new(options: &TranslateOptions) -> Self {
        let mut translator = Translator {
            out: AsmBuilder::new(options.comments),
            ctx: EmitContext::new(),
            labels: HashSet::new(),
            claimed: 0,
        };
        if options.bootstrap {
            translator.bootstrap();
        }
        translator
    }

    fn bootstrap(&mut self) {
        log::debug!("emitting bootstrap: SP = {}, call {}", STACK_BASE, ENTRY_POINT);
        self.out
            .comment("bootstrap")
            .at(STACK_BASE)
            .set(Dest::D, Comp::A)
            .at("SP")
            .set(Dest::M, Comp::D);
        self.out.comment(format_args!("call {} 0", ENTRY_POINT));
        frame::call(&mut self.out, &mut self.ctx, ENTRY_POINT, 0);
    }

    /// Start a new source file; `name` is its basename without extension.
    pub fn begin_file(&mut self, name: &str) {
        self.ctx.begin_file(name);
    }

    pub fn context(&self) -> &EmitContext {
        &self.ctx
    }

    pub fn translate(&mut self, command: &SourceCommand) -> Result<()> {
        log::trace!("{}: {}", command.location, command.command);
        self.out.comment(&command.command);

        let out = &mut self.out;
        let ctx = &mut self.ctx;
        match &command.command {
            Push(seg, arg) => {
                stack::push(out, ctx, *seg, *arg).map_err(|e| e.at(&command.location))?
            }
            Pop(seg, arg) => {
                stack::pop(out, ctx, *seg, *arg).map_err(|e| e.at(&command.location))?
            }
            Not => stack::unary(out, Comp::NotM),
            Neg => stack::unary(out, Comp::NegM),
            Add => stack::binary(out, Comp::DPlusM),
            Sub => stack::binary(out, Comp::MMinusD),
            And => stack::binary(out, Comp::DAndM),
            Or => stack::binary(out, Comp::DOrM),
            Eq => flow::compare(out, ctx, Jump::JEQ),
            Gt => flow::compare(out, ctx, Jump::JGT),
            Lt => flow::compare(out, ctx, Jump::JLT),
            Label(sym) => flow::label(out, ctx, sym),
            Goto(sym) => flow::goto(out, ctx, sym),
            IfGoto(sym) => flow::if_goto(out, ctx, sym),
            Function(name, locals) => frame::function(out, ctx, name, *locals),
            Call(name, args) => frame::call(out, ctx, name, *args),
            Return => frame::ret(out),
        }

        self.claim_labels(&command.location)
    }

    /// Record the labels emitted since the last call. A label declared twice
    /// would make the output unassemblable.
    fn claim_labels(&mut self, location: &SourceLocation) -> Result<()> {
        let start = self.claimed;
        self.claimed = self.out.len();
        for instruction in &self.out.instructions()[start..] {
            if let Instruction::Label(name) = instruction {
                if !self.labels.insert(name.clone()) {
                    return Err(TranslateError::DuplicateLabel {
                        location: location.clone(),
                        label: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn translate_all<'a>(
        &mut self,
        commands: impl IntoIterator<Item = &'a SourceCommand>,
    ) -> Result<()> {
        for command in commands {
            self.translate(command)?;
        }
        Ok(())
    }

    pub fn finish(self) -> Vec<Instruction> {
        self.out.into_instructions()
    }
}
