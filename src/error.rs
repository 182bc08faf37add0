//! Errors raised while reading, parsing, or translating VM sources.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ast::{Segment, SourceLocation};

/// Misuse of a memory segment, detected by the segment resolver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("cannot write to the read-only {0} segment")]
    InvalidSegmentWrite(Segment),

    #[error("index {index} is out of range for the {segment} segment")]
    IndexOutOfRange { segment: Segment, index: u16 },
}

impl SegmentError {
    pub fn at(self, location: &SourceLocation) -> TranslateError {
        let location = location.clone();
        match self {
            SegmentError::InvalidSegmentWrite(segment) => {
                TranslateError::InvalidSegmentWrite { location, segment }
            }
            SegmentError::IndexOutOfRange { segment, index } => {
                TranslateError::SegmentIndexOutOfRange {
                    location,
                    segment,
                    index,
                }
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("{location}: unrecognized command `{text}`")]
    UnrecognizedCommand {
        location: SourceLocation,
        text: String,
    },

    #[error("{location}: malformed command `{text}`: {reason}")]
    MalformedCommand {
        location: SourceLocation,
        text: String,
        reason: String,
    },

    #[error("{location}: cannot pop into the read-only {segment} segment")]
    InvalidSegmentWrite {
        location: SourceLocation,
        segment: Segment,
    },

    #[error("{location}: index {index} is out of range for the {segment} segment")]
    SegmentIndexOutOfRange {
        location: SourceLocation,
        segment: Segment,
        index: u16,
    },

    #[error("{location}: label {label} is declared more than once")]
    DuplicateLabel {
        location: SourceLocation,
        label: String,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no .vm files found in {}", .path.display())]
    NoSourceFiles { path: PathBuf },

    #[error("{} is not a .vm file", .path.display())]
    NotSourceFile { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, TranslateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_file_and_line() {
        let err = SegmentError::InvalidSegmentWrite(Segment::Constant)
            .at(&SourceLocation::new("Main.vm", 12));
        assert_eq!(
            err.to_string(),
            "Main.vm:12: cannot pop into the read-only constant segment"
        );
    }

    #[test]
    fn out_of_range_index() {
        let err = SegmentError::IndexOutOfRange {
            segment: Segment::Pointer,
            index: 2,
        }
        .at(&SourceLocation::new("Foo.vm", 3));
        assert!(matches!(
            err,
            TranslateError::SegmentIndexOutOfRange { index: 2, segment: Segment::Pointer, .. }
        ));
    }

    #[test]
    fn path_errors_name_the_path() {
        let err = TranslateError::NotSourceFile {
            path: PathBuf::from("notes.txt"),
        };
        assert_eq!(err.to_string(), "notes.txt is not a .vm file");
    }
}
