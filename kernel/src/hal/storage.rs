//! The `BlockDevice` seam the FAT32 engine is generic over. Decouples
//! filesystem logic from the ATA driver so the former is host-testable
//! against an in-memory fake while the latter stays real-hardware only.

use thiserror::Error;

pub const SECTOR_SIZE: usize = 512;

#[derive(Debug, Clone, Copy, Error)]
pub enum StorageError {
    #[error("the device did not respond (IDENTIFY returned status 0x00/0xFF)")]
    DeviceAbsent,
    #[error("the device timed out waiting for BSY to clear")]
    Timeout,
    #[error("the device reported an error (status register {0:#04x})")]
    DeviceError(u8),
}

pub trait BlockDevice {
    fn read_sector(&self, lba: u32, buffer: &mut [u8; SECTOR_SIZE]) -> Result<(), StorageError>;
    fn write_sector(&self, lba: u32, buffer: &[u8; SECTOR_SIZE]) -> Result<(), StorageError>;
    fn flush(&self) -> Result<(), StorageError>;
}
