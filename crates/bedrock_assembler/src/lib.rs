//! Two-pass assembler for the machine's mnemonic source syntax, producing
//! the hex-word stream the firmware's serial loader accepts.
//!
//! The grammar is token oriented: a mnemonic followed by its operands,
//! `name:` to define a label, `;` to end of line for comments. Commas
//! between operands are optional and immediates are lowercase hex.
//! Programs are assembled against base address [`ORIGIN`], where the
//! loader deposits words.
//!
//! A label operand to `set` materializes a 16-bit address. When the high
//! byte is non-zero it expands through scratch register rf:
//! `set d, hi; shl d, 8, d; set rf, lo; lor d, d, rf`. A forward
//! reference always reserves the four-word form and is patched once the
//! label is seen.

mod parser;

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use bedrock_isa::{InstructionWord, Opcode, Word};

use parser::Statement;

/// Where assembled programs start: the first word after the firmware.
pub const ORIGIN: Word = 0x28;

#[derive(Debug, PartialEq)]
pub enum AssembleError {
    /// The source stopped parsing on this line.
    Syntax { line: usize },
    UndefinedLabel(String),
    DuplicateLabel(String),
}

impl Display for AssembleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AssembleError::Syntax { line } => write!(f, "syntax error on line {}", line),
            AssembleError::UndefinedLabel(label) => {
                write!(f, "label \"{}\" is never defined", label)
            }
            AssembleError::DuplicateLabel(label) => {
                write!(f, "label \"{}\" is defined twice", label)
            }
        }
    }
}

fn set_word(dst: u8, value: u8) -> Word {
    Word::from(InstructionWord {
        opcode: Opcode::Set,
        dst,
        src1: value >> 4,
        src0: value & 0xF,
    })
}

/// The four-word sequence that builds a full 16-bit address in `dst`,
/// clobbering rf.
fn load_address(dst: u8, address: Word) -> [Word; 4] {
    [
        set_word(dst, (address >> 8) as u8),
        Word::from(InstructionWord {
            opcode: Opcode::ShiftLeft,
            dst,
            src1: 8,
            src0: dst,
        }),
        set_word(0xF, address as u8),
        Word::from(InstructionWord {
            opcode: Opcode::Or,
            dst,
            src1: dst,
            src0: 0xF,
        }),
    ]
}

pub fn assemble(source: &str) -> Result<Vec<Word>, AssembleError> {
    let statements = parser::parse(source).map_err(|line| AssembleError::Syntax { line })?;

    let mut words = Vec::new();
    let mut labels: HashMap<String, Word> = HashMap::new();
    let mut fixups: Vec<(usize, String)> = Vec::new();

    for statement in statements {
        match statement {
            Statement::Label(name) => {
                let address = ORIGIN + words.len() as Word;
                if labels.insert(name.clone(), address).is_some() {
                    return Err(AssembleError::DuplicateLabel(name));
                }
            }
            Statement::Word(instruction) => words.push(Word::from(instruction)),
            Statement::SetLabel { dst, label } => match labels.get(&label) {
                Some(&address) if address <= 0xFF => words.push(set_word(dst, address as u8)),
                Some(&address) => words.extend(load_address(dst, address)),
                None => {
                    fixups.push((words.len(), label));
                    words.extend(load_address(dst, 0));
                }
            },
        }
    }

    for (index, label) in fixups {
        match labels.get(&label) {
            Some(&address) => {
                // The reserved sequence holds `set dst, 0` at the top and
                // `set rf, 0` two words in; or the address bytes into
                // their immediate fields.
                words[index] |= address >> 8;
                words[index + 2] |= address & 0xFF;
            }
            None => return Err(AssembleError::UndefinedLabel(label)),
        }
    }

    Ok(words)
}

/// Render `words` one lowercase four-digit word per line: byte for byte
/// what the hex loader accepts over serial.
pub fn emit_hex(words: &[Word]) -> String {
    words.iter().map(|word| format!("{:04x}\n", word)).collect()
}
