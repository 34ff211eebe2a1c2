//! Token parsers for the assembler's source grammar.

use std::str::FromStr;

use bedrock_isa::{InstructionWord, Opcode};
use nom::branch::alt;
use nom::bytes::complete::take_till;
use nom::character::complete::{char, multispace0, multispace1, one_of, satisfy};
use nom::combinator::{map, map_opt, map_res, not, recognize, value};
use nom::multi::{many0, many1};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::IResult;

/// One parsed source element.
#[derive(Debug, PartialEq)]
pub(crate) enum Statement {
    /// `name:`, naming the address of the next word.
    Label(String),
    /// A fully encoded instruction.
    Word(InstructionWord),
    /// `set` with a label operand, resolved by the encoder.
    SetLabel { dst: u8, label: String },
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        many0(satisfy(|c| c.is_ascii_alphanumeric() || c == '_')),
    ))(input)
}

fn register(input: &str) -> IResult<&str, u8> {
    map_opt(preceded(char('r'), one_of("0123456789abcdef")), |digit| {
        digit.to_digit(16).map(|value| value as u8)
    })(input)
}

fn token_end(input: &str) -> IResult<&str, ()> {
    not(satisfy(|c| c.is_ascii_alphanumeric() || c == '_'))(input)
}

/// A whole token of lowercase hex fitting in a byte; the loader the output
/// feeds only understands lowercase digits.
fn hex_byte(input: &str) -> IResult<&str, u8> {
    map_res(
        terminated(recognize(many1(one_of("0123456789abcdef"))), token_end),
        |digits: &str| u8::from_str_radix(digits, 16),
    )(input)
}

fn hex_nibble(input: &str) -> IResult<&str, u8> {
    map_opt(
        terminated(one_of("0123456789abcdef"), token_end),
        |digit| digit.to_digit(16).map(|value| value as u8),
    )(input)
}

/// The gap between two operands: whitespace, or a comma with optional
/// whitespace around it.
fn sep(input: &str) -> IResult<&str, ()> {
    value(
        (),
        alt((
            recognize(delimited(multispace0, char(','), multispace0)),
            multispace1,
        )),
    )(input)
}

fn label_definition(input: &str) -> IResult<&str, Statement> {
    map(terminated(identifier, char(':')), |name: &str| {
        Statement::Label(name.to_string())
    })(input)
}

fn three_register(input: &str, opcode: Opcode) -> IResult<&str, Statement> {
    map(
        tuple((
            preceded(multispace1, register),
            preceded(sep, register),
            preceded(sep, register),
        )),
        move |(dst, src1, src0)| {
            Statement::Word(InstructionWord {
                opcode,
                dst,
                src1,
                src0,
            })
        },
    )(input)
}

fn destination_only(input: &str, opcode: Opcode) -> IResult<&str, Statement> {
    map(preceded(multispace1, register), move |dst| {
        Statement::Word(InstructionWord {
            opcode,
            dst,
            src1: 0,
            src0: 0,
        })
    })(input)
}

fn destination_source(input: &str, opcode: Opcode) -> IResult<&str, Statement> {
    map(
        pair(preceded(multispace1, register), preceded(sep, register)),
        move |(dst, src0)| {
            Statement::Word(InstructionWord {
                opcode,
                dst,
                src1: 0,
                src0,
            })
        },
    )(input)
}

fn source_pair(input: &str, opcode: Opcode) -> IResult<&str, Statement> {
    map(
        pair(preceded(multispace1, register), preceded(sep, register)),
        move |(src1, src0)| {
            Statement::Word(InstructionWord {
                opcode,
                dst: 0,
                src1,
                src0,
            })
        },
    )(input)
}

fn shift(input: &str, opcode: Opcode) -> IResult<&str, Statement> {
    map(
        tuple((
            preceded(multispace1, register),
            preceded(sep, hex_nibble),
            preceded(sep, register),
        )),
        move |(dst, count, src0)| {
            Statement::Word(InstructionWord {
                opcode,
                dst,
                src1: count,
                src0,
            })
        },
    )(input)
}

fn set_operands(input: &str) -> IResult<&str, Statement> {
    let (input, dst) = preceded(multispace1, register)(input)?;
    let (input, _) = sep(input)?;

    alt((
        map(hex_byte, move |immediate| {
            Statement::Word(InstructionWord {
                opcode: Opcode::Set,
                dst,
                src1: immediate >> 4,
                src0: immediate & 0xF,
            })
        }),
        map(identifier, move |label: &str| Statement::SetLabel {
            dst,
            label: label.to_string(),
        }),
    ))(input)
}

fn instruction(input: &str) -> IResult<&str, Statement> {
    let (rest, mnemonic) = identifier(input)?;
    let opcode = match Opcode::from_str(mnemonic) {
        Ok(opcode) => opcode,
        Err(()) => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Tag,
            )))
        }
    };

    use Opcode::*;
    match opcode {
        Jump | Add | Subtract | Multiply | Divide | And | Or => three_register(rest, opcode),
        ReadHi => destination_only(rest, opcode),
        Set => set_operands(rest),
        Load | Not | BusRead => destination_source(rest, opcode),
        Store | BusWrite => source_pair(rest, opcode),
        ShiftLeft | ShiftRight => shift(rest, opcode),
    }
}

fn statement(input: &str) -> IResult<&str, Statement> {
    alt((label_definition, instruction))(input)
}

/// Skip whitespace and `;` comments.
fn junk(input: &str) -> &str {
    let skipped: IResult<&str, &str> = recognize(many0(alt((
        multispace1,
        recognize(pair(char(';'), take_till(|c| c == '\n'))),
    ))))(input);

    match skipped {
        Ok((rest, _)) => rest,
        Err(_) => input,
    }
}

/// Parse a whole source text. The error is the line number of the first
/// token that would not parse.
pub(crate) fn parse(source: &str) -> Result<Vec<Statement>, usize> {
    let mut statements = Vec::new();
    let mut rest = junk(source);

    while !rest.is_empty() {
        match statement(rest) {
            Ok((next, parsed)) => {
                statements.push(parsed);
                rest = junk(next);
            }
            Err(_) => {
                let consumed = source.len() - rest.len();
                return Err(source[..consumed].matches('\n').count() + 1);
            }
        }
    }

    Ok(statements)
}
