use std::fs;
use std::path::PathBuf;
use std::process;

use bedrock_assembler::{assemble, emit_hex};
use structopt::StructOpt;

/// Assemble mnemonic source into the hex words the firmware's serial
/// loader accepts.
#[derive(StructOpt)]
#[structopt(name = "bedrock-asm")]
struct Opt {
    /// Source file to assemble
    source: PathBuf,

    /// Write the listing here instead of standard output
    #[structopt(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let opt = Opt::from_args();

    let source = match fs::read_to_string(&opt.source) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Could not read {}: {}", opt.source.display(), err);
            process::exit(1);
        }
    };

    let words = match assemble(&source) {
        Ok(words) => words,
        Err(err) => {
            eprintln!("{}: {}", opt.source.display(), err);
            process::exit(1);
        }
    };

    let listing = emit_hex(&words);
    match opt.output {
        Some(path) => {
            if let Err(err) = fs::write(&path, listing) {
                eprintln!("Could not write {}: {}", path.display(), err);
                process::exit(1);
            }
        }
        None => print!("{}", listing),
    }
}
