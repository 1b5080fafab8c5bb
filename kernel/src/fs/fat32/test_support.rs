//! An in-memory [`BlockDevice`] fake, standing in for the ATA driver so
//! the FAT32 engine's logic runs under a host `#[test]` exactly as it runs
//! against a real disk.

use crate::hal::storage::{BlockDevice, StorageError, SECTOR_SIZE};
use std::cell::RefCell;

pub struct FakeDisk {
    sectors: RefCell<Vec<[u8; SECTOR_SIZE]>>,
}

impl FakeDisk {
    pub fn new(sector_count: u32) -> Self {
        FakeDisk {
            sectors: RefCell::new(vec![[0u8; SECTOR_SIZE]; sector_count as usize]),
        }
    }
}

impl BlockDevice for FakeDisk {
    fn read_sector(&self, lba: u32, buffer: &mut [u8; SECTOR_SIZE]) -> Result<(), StorageError> {
        *buffer = self.sectors.borrow()[lba as usize];
        Ok(())
    }

    fn write_sector(&self, lba: u32, buffer: &[u8; SECTOR_SIZE]) -> Result<(), StorageError> {
        self.sectors.borrow_mut()[lba as usize] = *buffer;
        Ok(())
    }

    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
