//! Storage layout: the MBR partition table sits above the FAT32 engine,
//! which is itself generic over any [`crate::hal::storage::BlockDevice`].

pub mod fat32;
pub mod mbr;

use crate::drivers::ata::{AtaDevice, Drive};
use crate::hal::storage::{BlockDevice, SECTOR_SIZE};
use fat32::file::FileTable;
use fat32::{Fat32, MountError};
use spin::Mutex;
use terminal::log;

static DISK: AtaDevice = AtaDevice::new(Drive::Master);
static FILESYSTEM: Mutex<Option<Fat32<'static>>> = Mutex::new(None);
static OPEN_FILES: FileTable = FileTable::new();

/// Reads the MBR off the boot disk and mounts the filesystem singleton at
/// its FAT32 partition's starting LBA. Falls back to treating the disk as
/// an unpartitioned FAT32 volume starting at LBA 0 when no valid MBR
/// signature is present, since a freshly formatted image may carry no
/// partition table at all.
pub fn mount_root() -> Result<(), MountError> {
    let mut sector = [0u8; SECTOR_SIZE];
    DISK.read_sector(0, &mut sector).map_err(MountError::Storage)?;

    let start_lba = match mbr::find_fat32_partition(&sector) {
        Ok(partition) => partition.start_lba,
        Err(_) => 0,
    };

    let fs = Fat32::mount(&DISK, start_lba)?;
    *FILESYSTEM.lock() = Some(fs);
    log!("fs: FAT32 volume mounted at LBA {start_lba}");
    Ok(())
}

pub fn with_fs<T>(f: impl FnOnce(&Fat32<'static>) -> T) -> Option<T> {
    FILESYSTEM.lock().as_ref().map(f)
}

pub fn open_files() -> &'static FileTable {
    &OPEN_FILES
}
