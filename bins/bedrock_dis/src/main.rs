use std::num::ParseIntError;
use std::path::PathBuf;
use std::process;

use bedrock_isa::InstructionWord;
use structopt::StructOpt;

/// List a raw big-endian word image (a boot sector, say) as instructions.
#[derive(StructOpt)]
#[structopt(name = "bedrock-dis")]
struct Opt {
    /// The image to list
    image: PathBuf,

    /// Word address of the first word; defaults to the entry address 0x28
    #[structopt(short, long, parse(try_from_str = parse_word))]
    origin: Option<u16>,
}

fn parse_word(s: &str) -> Result<u16, ParseIntError> {
    match s.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

fn main() {
    let opt = Opt::from_args();
    let origin = opt.origin.unwrap_or(0x28);

    let data = match std::fs::read(&opt.image) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("Could not read {}: {}", opt.image.display(), err);
            process::exit(1);
        }
    };

    if data.len() % 2 != 0 {
        eprintln!("Warning: odd image size; the trailing byte is not a word");
    }

    for (index, bytes) in data.chunks_exact(2).enumerate() {
        let word = u16::from_be_bytes([bytes[0], bytes[1]]);
        let address = origin.wrapping_add(index as u16);
        println!("{:04X}  {:04X}  {}", address, word, InstructionWord::from(word));
    }
}
