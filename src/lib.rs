//! Translator from the stack VM intermediate language to Hack assembly.
//!
//! VM files are parsed into [`ast::Command`]s, lowered by a
//! [`translator::Translator`] into [`asm::Instruction`]s, and rendered one
//! instruction per line. [`verify`] and [`machine`] check emitted programs
//! symbolically and by running them.

pub mod asm;
pub mod ast;
pub mod driver;
pub mod error;
pub mod machine;
pub mod parser;
pub mod translator;
pub mod verify;

pub use asm::{AsmBuilder, Instruction};
pub use ast::{Command, Segment, SourceCommand, SourceLocation};
pub use driver::{load, render, translate, translate_path, SourceFile, Unit};
pub use error::{Result, SegmentError, TranslateError};
pub use translator::{EmitContext, TranslateOptions, Translator};
pub use verify::{check_stack, StackIssue};
