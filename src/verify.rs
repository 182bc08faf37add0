//! Symbolic operand-stack checking over a command stream.
//!
//! Heights are counted per function body, above the function's locals.
//! Control flow is followed only as far as a single forward pass allows:
//! a label takes its height from the fall-through path or from a jump seen
//! earlier, and code after an unconditional jump or `return` is unchecked
//! until such a label re-establishes the height.

use std::collections::HashMap;

use thiserror::Error;

use crate::ast::{Command, SourceCommand, SourceLocation};
use crate::translator::ENTRY_POINT;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackIssue {
    #[error("{location}: `{command}` needs {needed} value(s) but {function} has {available}")]
    Underflow {
        location: SourceLocation,
        function: String,
        command: String,
        needed: u16,
        available: u16,
    },

    #[error("{location}: {function} returns with nothing on its stack")]
    MissingReturnValue {
        location: SourceLocation,
        function: String,
    },

    #[error("{location}: label {label} reached with stack height {found}, expected {expected}")]
    InconsistentHeight {
        location: SourceLocation,
        label: String,
        expected: u16,
        found: u16,
    },
}

struct Checker {
    function: String,
    height: Option<u16>,
    labels: HashMap<String, u16>,
    issues: Vec<StackIssue>,
}

impl Checker {
    fn new() -> Self {
        Checker {
            function: ENTRY_POINT.to_string(),
            height: Some(0),
            labels: HashMap::new(),
            issues: vec![],
        }
    }

    fn consume(&mut self, location: &SourceLocation, command: &Command, needed: u16) {
        if let Some(available) = self.height {
            if available < needed {
                self.issues.push(StackIssue::Underflow {
                    location: location.clone(),
                    function: self.function.clone(),
                    command: command.to_string(),
                    needed,
                    available,
                });
            }
            self.height = Some(available.saturating_sub(needed));
        }
    }

    /// Record or check the height at a jump to `label`.
    fn jump_to(&mut self, location: &SourceLocation, label: &str) {
        let Some(found) = self.height else { return };
        match self.labels.get(label) {
            Some(&expected) if expected != found => {
                self.issues.push(StackIssue::InconsistentHeight {
                    location: location.clone(),
                    label: label.to_string(),
                    expected,
                    found,
                });
            }
            Some(_) => {}
            None => {
                self.labels.insert(label.to_string(), found);
            }
        }
    }

    fn check(&mut self, source: &SourceCommand) {
        let location = &source.location;
        let command = &source.command;
        match command {
            Command::Function(name, _) => {
                self.function = name.clone();
                self.height = Some(0);
                self.labels.clear();
            }
            Command::Label(label) => match (self.height, self.labels.get(label).copied()) {
                (Some(_), _) => self.jump_to(location, label),
                (None, recorded) => self.height = recorded,
            },
            Command::Goto(label) => {
                self.jump_to(location, label);
                self.height = None;
            }
            Command::IfGoto(label) => {
                self.consume(location, command, 1);
                self.jump_to(location, label);
            }
            Command::Return => {
                if self.height == Some(0) {
                    self.issues.push(StackIssue::MissingReturnValue {
                        location: location.clone(),
                        function: self.function.clone(),
                    });
                }
                self.height = None;
            }
            _ => {
                let (pops, pushes) = command.stack_effect();
                self.consume(location, command, pops);
                self.height = self.height.map(|h| h + pushes);
            }
        }
    }
}

/// Check every command in order; an empty result means no issue was found.
pub fn check_stack<'a>(commands: impl IntoIterator<Item = &'a SourceCommand>) -> Vec<StackIssue> {
    let mut checker = Checker::new();
    for command in commands {
        checker.check(command);
    }
    checker.issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn issues(source: &str) -> Vec<StackIssue> {
        check_stack(&parse("Check.vm", source).unwrap())
    }

    #[test]
    fn balanced_program_is_clean() {
        let source = "\
function Main.fib 0
push argument 0
push constant 2
lt
if-goto BASE
push argument 0
push constant 1
sub
call Main.fib 1
return
label BASE
push argument 0
return
";
        assert_eq!(issues(source), vec![]);
    }

    #[test]
    fn return_without_value() {
        assert_eq!(
            issues("function Foo.bar 2\nreturn"),
            vec![StackIssue::MissingReturnValue {
                location: SourceLocation::new("Check.vm", 2),
                function: "Foo.bar".to_string(),
            }]
        );
    }

    #[test]
    fn underflow_is_reported() {
        let found = issues("function Foo.bar 0\npush constant 1\nadd\nreturn");
        assert_eq!(
            found,
            vec![StackIssue::Underflow {
                location: SourceLocation::new("Check.vm", 3),
                function: "Foo.bar".to_string(),
                command: "add".to_string(),
                needed: 2,
                available: 1,
            }]
        );
    }

    #[test]
    fn call_needs_its_arguments() {
        let found = issues("function Foo.bar 0\npush constant 1\ncall Math.max 2\nreturn");
        assert!(matches!(found[..], [StackIssue::Underflow { needed: 2, .. }]));
    }

    #[test]
    fn jumps_must_agree_on_height() {
        let source = "\
function Foo.loop 0
push constant 1
label TOP
push constant 2
goto TOP
";
        let found = issues(source);
        assert!(matches!(
            &found[..],
            [StackIssue::InconsistentHeight { expected: 1, found: 2, .. }]
        ));
    }

    #[test]
    fn unreachable_code_is_not_checked() {
        let source = "function Foo.bar 0\ngoto END\nadd\nlabel END\npush constant 0\nreturn";
        assert_eq!(issues(source), vec![]);
    }
}
