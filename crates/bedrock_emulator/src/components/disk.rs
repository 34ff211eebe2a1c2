use std::io::{Read, Seek, SeekFrom, Write};

use log::{info, warn};

use crate::error::Result;
use crate::{Address, Bus, Word};

/// Bytes per disk sector.
pub const SECTOR_SIZE: usize = 512;

/// Words per disk sector. On disk a word is big-endian: the first byte of
/// a pair is the high half.
pub const SECTOR_WORDS: usize = SECTOR_SIZE / 2;

/// Move one sector from disk into memory.
pub const COMMAND_READ: Word = 0;

/// Move one sector from memory onto disk.
pub const COMMAND_WRITE: Word = 1;

/// Anything a drive can sit on: random access over bytes.
pub trait Media: Read + Write + Seek {}

impl<T: Read + Write + Seek> Media for T {}

/// One drive. Either backed by media fixed at attach time, or absent, in
/// which case it reports zero sectors and swallows every command.
///
/// `sector` picks the sector the next command works on; `address` is the
/// word address in guest memory the transfer starts at. Neither touches
/// the disk until a command arrives on the control port.
pub struct DiskController {
    media: Option<Box<dyn Media>>,
    sector_count: Word,
    pub sector: Word,
    pub address: Word,
}

impl DiskController {
    /// A drive with nothing in it.
    pub fn detached() -> Self {
        Self {
            media: None,
            sector_count: 0,
            sector: 0,
            address: 0,
        }
    }

    /// Take ownership of `media`. Its size at this moment fixes the sector
    /// count for the lifetime of the controller, clamped to what a word
    /// can report.
    pub fn attach(mut media: impl Media + 'static) -> Result<Self> {
        let bytes = media.seek(SeekFrom::End(0))?;
        let sector_count = (bytes / SECTOR_SIZE as u64).min(u64::from(Word::MAX)) as Word;
        info!("Attached disk with {} sectors", sector_count);

        Ok(Self {
            media: Some(Box::new(media)),
            sector_count,
            sector: 0,
            address: 0,
        })
    }

    pub fn sector_count(&self) -> Word {
        self.sector_count
    }

    /// Act on a command word written to the drive's control port. Commands
    /// to an absent drive, unknown commands and commands naming a sector
    /// past the end of the disk all do nothing.
    pub fn command(&mut self, command: Word, memory: &mut impl Bus<Address>) -> Result<()> {
        if self.media.is_none() {
            return Ok(());
        }

        match command {
            COMMAND_READ => self.read_sector(memory),
            COMMAND_WRITE => self.write_sector(memory),
            _ => {
                warn!("Unknown disk command {:#06X} ignored", command);
                Ok(())
            }
        }
    }

    fn read_sector(&mut self, memory: &mut impl Bus<Address>) -> Result<()> {
        let media = match self.media.as_mut() {
            Some(media) => media,
            None => return Ok(()),
        };

        if self.sector >= self.sector_count {
            warn!("Read of sector {:#06X} past the end of the disk ignored", self.sector);
            return Ok(());
        }

        media.seek(SeekFrom::Start(u64::from(self.sector) * SECTOR_SIZE as u64))?;
        let mut sector = [0u8; SECTOR_SIZE];
        media.read_exact(&mut sector)?;

        for (offset, bytes) in sector.chunks_exact(2).enumerate() {
            let word = Word::from_be_bytes([bytes[0], bytes[1]]);
            memory.write(self.address.wrapping_add(offset as Address), word)?;
        }

        Ok(())
    }

    fn write_sector(&mut self, memory: &mut impl Bus<Address>) -> Result<()> {
        if self.sector >= self.sector_count {
            warn!("Write of sector {:#06X} past the end of the disk ignored", self.sector);
            return Ok(());
        }

        let mut sector = [0u8; SECTOR_SIZE];
        for offset in 0..SECTOR_WORDS {
            let word = memory.read(self.address.wrapping_add(offset as Address))?;
            sector[offset * 2..offset * 2 + 2].copy_from_slice(&word.to_be_bytes());
        }

        let media = match self.media.as_mut() {
            Some(media) => media,
            None => return Ok(()),
        };

        media.seek(SeekFrom::Start(u64::from(self.sector) * SECTOR_SIZE as u64))?;
        media.write_all(&sector)?;
        media.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct TestMemory(Vec<Word>);

    impl TestMemory {
        fn new() -> Self {
            Self(vec![0; 1 << 16])
        }
    }

    impl Bus<Address> for TestMemory {
        fn read(&mut self, address: Address) -> Result<Word> {
            Ok(self.0[address as usize])
        }

        fn write(&mut self, address: Address, value: Word) -> Result<()> {
            self.0[address as usize] = value;
            Ok(())
        }
    }

    fn blank_disk(sectors: usize) -> DiskController {
        DiskController::attach(Cursor::new(vec![0u8; sectors * SECTOR_SIZE])).unwrap()
    }

    #[test]
    fn attach_counts_whole_sectors() {
        assert_eq!(blank_disk(2).sector_count(), 2);

        let ragged = DiskController::attach(Cursor::new(vec![0u8; SECTOR_SIZE + 511])).unwrap();
        assert_eq!(ragged.sector_count(), 1);

        let tiny = DiskController::attach(Cursor::new(vec![0u8; 511])).unwrap();
        assert_eq!(tiny.sector_count(), 0);
    }

    #[test]
    fn attach_clamps_the_sector_count() {
        let oversized =
            DiskController::attach(Cursor::new(vec![0u8; SECTOR_SIZE * 0x10001])).unwrap();
        assert_eq!(oversized.sector_count(), Word::MAX);
    }

    #[test]
    fn detached_drive_reports_nothing_and_ignores_commands() {
        let mut drive = DiskController::detached();
        let mut memory = TestMemory::new();

        assert_eq!(drive.sector_count(), 0);
        drive.command(COMMAND_READ, &mut memory).unwrap();
        drive.command(COMMAND_WRITE, &mut memory).unwrap();
        assert!(memory.0.iter().all(|word| *word == 0));
    }

    #[test]
    fn read_loads_big_endian_words() {
        let mut image = vec![0u8; SECTOR_SIZE];
        image[0] = 0x12;
        image[1] = 0x34;
        image[510] = 0xAB;
        image[511] = 0xCD;

        let mut drive = DiskController::attach(Cursor::new(image)).unwrap();
        let mut memory = TestMemory::new();
        drive.address = 0x0100;
        drive.command(COMMAND_READ, &mut memory).unwrap();

        assert_eq!(memory.0[0x0100], 0x1234);
        assert_eq!(memory.0[0x01FF], 0xABCD);
        assert_eq!(memory.0[0x0200], 0);
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut drive = blank_disk(2);
        let mut memory = TestMemory::new();

        let pattern: Vec<Word> = (0..SECTOR_WORDS as Word)
            .map(|index| index.wrapping_mul(0x0101) ^ 0xA5A5)
            .collect();
        for (offset, word) in pattern.iter().enumerate() {
            memory.0[0x0100 + offset] = *word;
        }

        drive.sector = 1;
        drive.address = 0x0100;
        drive.command(COMMAND_WRITE, &mut memory).unwrap();

        for word in &mut memory.0[0x0100..0x0100 + SECTOR_WORDS] {
            *word = 0;
        }
        drive.command(COMMAND_READ, &mut memory).unwrap();

        assert_eq!(&memory.0[0x0100..0x0100 + SECTOR_WORDS], pattern.as_slice());
    }

    #[test]
    fn write_moves_exactly_one_sector() {
        let mut drive = blank_disk(2);
        let mut memory = TestMemory::new();
        memory.0[0x0000] = 0xBEEF;

        drive.command(COMMAND_WRITE, &mut memory).unwrap();

        // Sector 1 must be untouched by a write of sector 0.
        drive.sector = 1;
        drive.address = 0x0400;
        drive.command(COMMAND_READ, &mut memory).unwrap();
        assert!(memory.0[0x0400..0x0400 + SECTOR_WORDS]
            .iter()
            .all(|word| *word == 0));
    }

    #[test]
    fn out_of_range_sector_is_ignored() {
        let mut drive = blank_disk(1);
        let mut memory = TestMemory::new();
        memory.0[0x0000] = 0xBEEF;

        drive.sector = 1;
        drive.command(COMMAND_WRITE, &mut memory).unwrap();
        drive.command(COMMAND_READ, &mut memory).unwrap();
        assert_eq!(memory.0[0x0000], 0xBEEF);
    }

    #[test]
    fn unknown_commands_are_ignored() {
        let mut drive = blank_disk(1);
        let mut memory = TestMemory::new();
        for command in [2, 3, 0x1234, Word::MAX] {
            drive.command(command, &mut memory).unwrap();
        }
        assert!(memory.0.iter().all(|word| *word == 0));
    }

    #[test]
    fn transfers_wrap_around_the_address_space() {
        let mut image = vec![0u8; SECTOR_SIZE];
        image[0] = 0x12;
        image[1] = 0x34;
        image[2] = 0x56;
        image[3] = 0x78;

        let mut drive = DiskController::attach(Cursor::new(image)).unwrap();
        let mut memory = TestMemory::new();
        drive.address = Address::MAX;
        drive.command(COMMAND_READ, &mut memory).unwrap();

        assert_eq!(memory.0[0xFFFF], 0x1234);
        assert_eq!(memory.0[0x0000], 0x5678);
    }
}
