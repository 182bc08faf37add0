//! Reads VM sources and runs them through one translator, in order.

use std::fs;
use std::path::{Path, PathBuf};

use crate::asm::Instruction;
use crate::ast::SourceCommand;
use crate::error::{Result, TranslateError};
use crate::parser;
use crate::translator::{TranslateOptions, Translator};

pub const SOURCE_EXTENSION: &str = "vm";

/// One VM source file, read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Basename without extension; the static-variable namespace.
    pub name: String,
    /// File name used in error locations.
    pub file_name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(name: &str, text: &str) -> Self {
        SourceFile {
            name: name.to_string(),
            file_name: format!("{}.{}", name, SOURCE_EXTENSION),
            text: text.to_string(),
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| TranslateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        Ok(SourceFile {
            name,
            file_name,
            text,
        })
    }

    pub fn parse(&self) -> Result<Unit> {
        let commands = parser::parse(&self.file_name, &self.text)?;
        log::debug!("parsed {} ({} commands)", self.file_name, commands.len());
        Ok(Unit {
            name: self.name.clone(),
            commands,
        })
    }
}

/// The parsed commands of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub name: String,
    pub commands: Vec<SourceCommand>,
}

fn has_source_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Source files to translate: `path` itself if it is a file, otherwise
/// every `.vm` file directly inside it, sorted by name.
pub fn discover(path: &Path) -> Result<Vec<PathBuf>> {
    let io_error = |source| TranslateError::Io {
        path: path.to_path_buf(),
        source,
    };

    if !path.is_dir() {
        fs::metadata(path).map_err(io_error)?;
        if !has_source_extension(path) {
            return Err(TranslateError::NotSourceFile {
                path: path.to_path_buf(),
            });
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = vec![];
    for entry in fs::read_dir(path).map_err(io_error)? {
        let entry_path = entry.map_err(io_error)?.path();
        if entry_path.is_file() && has_source_extension(&entry_path) {
            files.push(entry_path);
        }
    }

    if files.is_empty() {
        return Err(TranslateError::NoSourceFiles {
            path: path.to_path_buf(),
        });
    }

    files.sort();
    Ok(files)
}

pub fn load(path: &Path) -> Result<Vec<SourceFile>> {
    discover(path)?
        .iter()
        .map(|file| {
            log::debug!("reading {}", file.display());
            SourceFile::read(file)
        })
        .collect()
}

pub fn parse(files: &[SourceFile]) -> Result<Vec<Unit>> {
    files.iter().map(SourceFile::parse).collect()
}

/// Translate parsed units in order, sharing one emission context.
pub fn translate_units(units: &[Unit], options: &TranslateOptions) -> Result<Vec<Instruction>> {
    let mut translator = Translator::new(options);
    for unit in units {
        log::debug!("translating {}", unit.name);
        translator.begin_file(&unit.name);
        translator.translate_all(&unit.commands)?;
    }
    Ok(translator.finish())
}

pub fn translate(files: &[SourceFile], options: &TranslateOptions) -> Result<Vec<Instruction>> {
    translate_units(&parse(files)?, options)
}

pub fn translate_path(path: &Path, options: &TranslateOptions) -> Result<Vec<Instruction>> {
    translate(&load(path)?, options)
}

/// One instruction per line.
pub fn render(instructions: &[Instruction]) -> String {
    let mut text = String::new();
    for instruction in instructions {
        text.push_str(&instruction.to_string());
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn bare() -> TranslateOptions {
        TranslateOptions {
            bootstrap: false,
            comments: false,
        }
    }

    #[test]
    fn discovers_vm_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Sys.vm"), "function Sys.init 0\n").unwrap();
        fs::write(dir.path().join("Main.vm"), "function Main.main 0\n").unwrap();
        fs::write(dir.path().join("Main.jack"), "class Main {}\n").unwrap();
        fs::create_dir(dir.path().join("nested.vm")).unwrap();

        let files = discover(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Main.vm", "Sys.vm"]);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "nothing here").unwrap();
        assert!(matches!(
            discover(dir.path()),
            Err(TranslateError::NoSourceFiles { .. })
        ));
    }

    #[test]
    fn single_file_and_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Prog.vm");
        fs::write(&file, "push constant 1\n").unwrap();
        assert_eq!(discover(&file).unwrap(), vec![file.clone()]);

        let loaded = load(&file).unwrap();
        assert_eq!(loaded[0].name, "Prog");
        assert_eq!(loaded[0].file_name, "Prog.vm");

        assert!(matches!(
            discover(&dir.path().join("Missing.vm")),
            Err(TranslateError::Io { .. })
        ));

        let notes = dir.path().join("notes.txt");
        fs::write(&notes, "push constant 1\n").unwrap();
        assert!(matches!(
            discover(&notes),
            Err(TranslateError::NotSourceFile { path }) if path == notes
        ));
    }

    #[test]
    fn errors_name_the_file_they_came_from() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("A.vm"), "push constant 1\n").unwrap();
        fs::write(dir.path().join("B.vm"), "push constant 1\n\nfrobnicate\n").unwrap();
        let err = translate_path(dir.path(), &bare()).unwrap_err();
        assert_eq!(err.to_string(), "B.vm:3: unrecognized command `frobnicate`");
    }

    #[test]
    fn render_ends_each_line() {
        let files = [SourceFile::new("Main", "push constant 2")];
        let text = render(&translate(&files, &bare()).unwrap());
        assert_eq!(text, "@2\nD=A\n@SP\nM=M+1\nA=M-1\nM=D\n");
    }
}
