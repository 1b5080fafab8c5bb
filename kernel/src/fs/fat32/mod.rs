//! The FAT32 engine: BIOS parameter block, cluster-chain bookkeeping,
//! directory entries, and the open file table, each split into its own
//! module the way the ATA driver and block device seam are split from it.

pub mod bpb;
pub mod cluster;
pub mod dir;
pub mod file;

#[cfg(test)]
pub(crate) mod test_support;

use bpb::{Bpb32, BpbError, FsLayout};
use crate::hal::storage::{BlockDevice, StorageError, SECTOR_SIZE};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MountError {
    #[error("failed to read the boot sector: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid BPB: {0}")]
    Bpb(#[from] BpbError),
}

/// A mounted FAT32 filesystem: the layout derived from its BPB, plus the
/// block device it sits on. `dir` and `file` operate over `&Fat32` rather
/// than owning any state of their own.
pub struct Fat32<'a> {
    pub device: &'a dyn BlockDevice,
    pub layout: FsLayout,
}

impl<'a> Fat32<'a> {
    /// Reads the boot sector at `partition_lba`, parses its BPB, and
    /// derives the FAT/data region layout. Does not touch the root
    /// directory; callers read it lazily through [`dir`].
    pub fn mount(device: &'a dyn BlockDevice, partition_lba: u32) -> Result<Self, MountError> {
        let mut sector = [0u8; SECTOR_SIZE];
        device.read_sector(partition_lba, &mut sector)?;
        let bpb = Bpb32::parse(&sector)?;
        let layout = FsLayout::new(partition_lba, &bpb);
        Ok(Fat32 { device, layout })
    }

    pub fn root_cluster(&self) -> u32 {
        self.layout.root_cluster
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FakeDisk;
    use super::*;

    fn formatted_disk() -> FakeDisk {
        let disk = FakeDisk::new(128);
        let mut boot = [0u8; SECTOR_SIZE];
        boot[11..13].copy_from_slice(&512u16.to_le_bytes());
        boot[13] = 1; // sectors per cluster
        boot[14..16].copy_from_slice(&8u16.to_le_bytes()); // reserved sectors
        boot[16] = 1; // fat copies
        boot[36..40].copy_from_slice(&8u32.to_le_bytes()); // table size
        boot[44..48].copy_from_slice(&2u32.to_le_bytes()); // root cluster
        boot[66] = 0x29;
        boot[82..90].copy_from_slice(b"FAT32   ");
        disk.write_sector(0, &boot).unwrap();
        disk
    }

    #[test]
    fn mount_reads_the_bpb_and_derives_the_layout() {
        let disk = formatted_disk();
        let fs = Fat32::mount(&disk, 0).unwrap();
        assert_eq!(fs.layout.fat_start, 8);
        assert_eq!(fs.layout.data_start, 8 + 8);
        assert_eq!(fs.root_cluster(), 2);
    }

    #[test]
    fn mount_rejects_a_sector_with_no_valid_bpb() {
        let disk = FakeDisk::new(16);
        assert!(Fat32::mount(&disk, 0).is_err());
    }
}
