use std::fs::OpenOptions;
use std::process;

use bedrock_emulator::components::disk::DiskController;
use bedrock_emulator::components::serial::Serial;
use bedrock_emulator::machine::Machine;

const USAGE: &str = "Usage: bedrock <disk0> <disk1>\nUse -- to leave a drive empty.";

/// Open one drive operand. The operands are taken straight from the
/// argument list because the empty-drive spelling is the literal `--`,
/// which an option parser would eat as the end-of-options marker.
fn open_drive(operand: &str) -> DiskController {
    if operand == "--" {
        return DiskController::detached();
    }

    let file = match OpenOptions::new().read(true).write(true).open(operand) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Could not open disk \"{}\": {}", operand, err);
            process::exit(1);
        }
    };

    match DiskController::attach(file) {
        Ok(drive) => drive,
        Err(err) => {
            eprintln!("Could not attach disk \"{}\": {}", operand, err);
            process::exit(1);
        }
    }
}

fn main() {
    pretty_env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (disk0, disk1) = match args.as_slice() {
        [disk0, disk1] => (open_drive(disk0), open_drive(disk1)),
        _ => {
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    let mut machine = Machine::new(Serial::console(), disk0, disk1);
    if let Err(err) = machine.run() {
        eprintln!("Fatal: {}", err);
        process::exit(1);
    }
}
