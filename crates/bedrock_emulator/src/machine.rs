//! The owning aggregate: CPU state, memory and peripherals, plus the
//! fetch-decode-execute loop.

use log::{debug, trace};

use bedrock_isa::InstructionWord;

use crate::bus::IoBus;
use crate::components::disk::DiskController;
use crate::components::memory::Memory;
use crate::components::serial::Serial;
use crate::cpu::Cpu;
use crate::error::Result;
use crate::Bus;

pub struct Machine {
    pub cpu: Cpu,
    pub memory: Memory,
    pub io: IoBus,
}

impl Machine {
    pub fn new(serial: Serial, disk0: DiskController, disk1: DiskController) -> Self {
        Self {
            cpu: Cpu::default(),
            memory: Memory::new(),
            io: IoBus::new(serial, disk0, disk1),
        }
    }

    /// Fetch, decode and execute one instruction.
    pub fn tick(&mut self) -> Result<()> {
        let at = self.cpu.pc;
        let word = self.memory.read(at)?;
        self.cpu.pc = at.wrapping_add(1);

        let instruction = InstructionWord::from(word);
        trace!("{:04X}  {:04X}  {}", at, word, instruction);

        self.cpu.execute(instruction, &mut self.memory, &mut self.io)
    }

    /// Run until the guest raises the halt line. Host I/O trouble aborts
    /// the run; the guest itself cannot fault.
    pub fn run(&mut self) -> Result<()> {
        while !self.io.halted() {
            self.tick()?;
        }
        debug!("Guest halted\n{}", self.cpu);
        Ok(())
    }
}
