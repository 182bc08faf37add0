use nom::{
    branch::alt,
    bytes::complete::{is_a, tag},
    character::{
        complete::{digit1, space1},
        is_digit,
    },
    combinator::{map, map_res, value, verify},
    sequence::tuple,
    IResult,
};

use crate::ast::{Command::*, Segment::*, *};
use crate::error::{Result, TranslateError};

/// Largest value an `@` instruction can load.
pub const MAX_INDEX: u16 = 0x7FFF;

const KEYWORDS: [&str; 17] = [
    "push", "pop", "add", "sub", "neg", "eq", "gt", "lt", "and", "or", "not", "label", "goto",
    "if-goto", "function", "call", "return",
];

fn integer(input: &str) -> IResult<&str, u16> {
    verify(map_res(digit1, |c: &str| c.parse::<u16>()), |n: &u16| {
        *n <= MAX_INDEX
    })(input)
}

fn segment(input: &str) -> IResult<&str, Segment> {
    alt((
        value(Constant, tag("constant")),
        value(Local, tag("local")),
        value(Static, tag("static")),
        value(Argument, tag("argument")),
        value(This, tag("this")),
        value(That, tag("that")),
        value(Pointer, tag("pointer")),
        value(Temp, tag("temp")),
    ))(input)
}

fn push(input: &str) -> IResult<&str, Command> {
    map(
        tuple((tag("push"), space1, segment, space1, integer)),
        |(_, _, segment, _, arg)| Push(segment, arg),
    )(input)
}

#[test]
fn test_push() {
    assert_eq!(push("push  pointer  1"), Ok(("", Push(Pointer, 1))));
}

// `pop constant n` parses; the segment resolver rejects it with location context
fn pop(input: &str) -> IResult<&str, Command> {
    map(
        tuple((tag("pop"), space1, segment, space1, integer)),
        |(_, _, segment, _, arg)| Pop(segment, arg),
    )(input)
}

fn prim(input: &str) -> IResult<&str, Command> {
    alt((
        value(Add, tag("add")),
        value(Sub, tag("sub")),
        value(Neg, tag("neg")),
        value(Eq, tag("eq")),
        value(Gt, tag("gt")),
        value(Lt, tag("lt")),
        value(And, tag("and")),
        value(Or, tag("or")),
        value(Not, tag("not")),
    ))(input)
}

#[test]
fn test_prim() {
    assert_eq!(prim("neg"), Ok(("", Neg)));
}

fn symbol(input: &str) -> IResult<&str, String> {
    map(
        verify(
            is_a("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_.$:0123456789"),
            |c: &str| !is_digit(c.as_bytes()[0]),
        ),
        |sym: &str| sym.to_string(),
    )(input)
}

fn branching(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("label"), tag("goto"), tag("if-goto"))),
            space1,
            symbol,
        )),
        |(op, _, sym)| match op {
            "label" => Label(sym),
            "goto" => Goto(sym),
            _ => IfGoto(sym),
        },
    )(input)
}

fn function(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("function"), tag("call"))),
            space1,
            symbol,
            space1,
            integer,
        )),
        |(op, _, name, _, count)| match op {
            "function" => Function(name, count),
            _ => Call(name, count),
        },
    )(input)
}

#[test]
fn test_function() {
    assert_eq!(
        function("function Main.fibonacci 0"),
        Ok(("", Function("Main.fibonacci".to_string(), 0)))
    );
    assert_eq!(
        function("call\tMath.multiply 2"),
        Ok(("", Call("Math.multiply".to_string(), 2)))
    );
}

fn command(input: &str) -> IResult<&str, Command> {
    alt((push, pop, prim, branching, function, value(Return, tag("return"))))(input)
}

fn usage(keyword: &str) -> &'static str {
    match keyword {
        "push" | "pop" => "expected `<segment> <index>` with an index up to 32767",
        "label" | "goto" | "if-goto" => "expected a single label name",
        "function" | "call" => "expected `<name> <count>` with a count up to 32767",
        _ => "expected no operands",
    }
}

/// Strip comments and surrounding whitespace from a source line.
fn strip(line: &str) -> &str {
    line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim()
}

/// Parse one already-stripped, non-empty line.
pub fn parse_line(line: &str, location: &SourceLocation) -> Result<Command> {
    let keyword = line.split_whitespace().next().unwrap_or(line);
    if !KEYWORDS.contains(&keyword) {
        return Err(TranslateError::UnrecognizedCommand {
            location: location.clone(),
            text: line.to_string(),
        });
    }

    match command(line) {
        Ok(("", command)) => Ok(command),
        _ => Err(TranslateError::MalformedCommand {
            location: location.clone(),
            text: line.to_string(),
            reason: usage(keyword).to_string(),
        }),
    }
}

/// Parse a whole source file; `file` names it in error locations.
pub fn parse(file: &str, input: &str) -> Result<Vec<SourceCommand>> {
    let mut commands = vec![];

    for (number, line) in input.lines().enumerate() {
        let line = strip(line);
        if line.is_empty() {
            continue;
        }

        let location = SourceLocation::new(file, number + 1);
        let command = parse_line(line, &location)?;
        commands.push(SourceCommand { command, location });
    }

    Ok(commands)
}
