use tracing::trace;

use crate::error::Result;
use crate::firmware;
use crate::{Address, Bus, Word};

/// The machine's word-addressed memory: 2^16 words with the firmware image
/// overlaid on the bottom of the address space. The overlay is served on
/// every read and absorbs every write, so no guest behavior can disturb
/// the firmware.
pub struct Memory {
    ram: Vec<Word>,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            ram: vec![0; (1 << 16) - firmware::IMAGE.len()],
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus<Address> for Memory {
    fn read(&mut self, address: Address) -> Result<Word> {
        let address = address as usize;
        Ok(match firmware::IMAGE.get(address) {
            Some(word) => *word,
            None => self.ram[address - firmware::IMAGE.len()],
        })
    }

    fn write(&mut self, address: Address, value: Word) -> Result<()> {
        let address = address as usize;
        if address < firmware::IMAGE.len() {
            trace!("Dropped store of {:04X} to firmware address {:#06X}", value, address);
        } else {
            self.ram[address - firmware::IMAGE.len()] = value;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firmware_region_reads_the_image() {
        let mut memory = Memory::new();
        for (address, word) in firmware::IMAGE.iter().enumerate() {
            assert_eq!(memory.read(address as Address).unwrap(), *word);
        }
    }

    #[test]
    fn stores_into_the_firmware_region_are_dropped() {
        let mut memory = Memory::new();
        for address in 0..firmware::IMAGE.len() as Address {
            memory.write(address, 0xABCD).unwrap();
            assert_eq!(
                memory.read(address).unwrap(),
                firmware::IMAGE[address as usize]
            );
        }
    }

    #[test]
    fn ram_reads_back_what_was_stored() {
        let mut memory = Memory::new();
        for address in [firmware::ENTRY, 0x1234, Address::MAX] {
            assert_eq!(memory.read(address).unwrap(), 0);
            memory.write(address, !address).unwrap();
            assert_eq!(memory.read(address).unwrap(), !address);
        }
    }
}
