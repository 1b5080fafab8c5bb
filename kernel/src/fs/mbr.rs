//! MBR partition table: sector 0, four 16-byte primary entries starting at
//! offset 0x1BE, `0xAA55` signature at offset 510.

use thiserror::Error;

const SIGNATURE_OFFSET: usize = 510;
const TABLE_OFFSET: usize = 0x1BE;
const ENTRY_SIZE: usize = 16;

const FAT32_PARTITION_IDS: [u8; 2] = [0x0B, 0x0C];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MbrError {
    #[error("missing 0xAA55 boot signature")]
    BadSignature,
    #[error("no FAT32 partition entry found")]
    NoFat32Partition,
}

#[derive(Debug, Clone, Copy)]
pub struct PartitionEntry {
    pub bootable: bool,
    pub partition_id: u8,
    pub start_lba: u32,
    pub length: u32,
}

impl PartitionEntry {
    fn parse(bytes: &[u8]) -> Self {
        PartitionEntry {
            bootable: bytes[0] == 0x80,
            partition_id: bytes[4],
            start_lba: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            length: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        }
    }

    pub fn is_fat32(&self) -> bool {
        FAT32_PARTITION_IDS.contains(&self.partition_id)
    }
}

pub fn parse_partitions(sector: &[u8; 512]) -> Result<[PartitionEntry; 4], MbrError> {
    if u16::from_le_bytes([sector[SIGNATURE_OFFSET], sector[SIGNATURE_OFFSET + 1]]) != 0xAA55 {
        return Err(MbrError::BadSignature);
    }

    let mut entries = [PartitionEntry::parse(&sector[TABLE_OFFSET..TABLE_OFFSET + ENTRY_SIZE]); 4];
    for (i, entry) in entries.iter_mut().enumerate() {
        let offset = TABLE_OFFSET + i * ENTRY_SIZE;
        *entry = PartitionEntry::parse(&sector[offset..offset + ENTRY_SIZE]);
    }
    Ok(entries)
}

/// Finds the first FAT32 partition (`partition_id` 0x0B or 0x0C).
pub fn find_fat32_partition(sector: &[u8; 512]) -> Result<PartitionEntry, MbrError> {
    let entries = parse_partitions(sector)?;
    entries
        .into_iter()
        .find(PartitionEntry::is_fat32)
        .ok_or(MbrError::NoFat32Partition)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_mbr() -> [u8; 512] {
        let mut sector = [0u8; 512];
        sector[510..512].copy_from_slice(&0xAA55u16.to_le_bytes());
        let entry_offset = TABLE_OFFSET;
        sector[entry_offset] = 0x80; // bootable
        sector[entry_offset + 4] = 0x0C; // FAT32 LBA
        sector[entry_offset + 8..entry_offset + 12].copy_from_slice(&2048u32.to_le_bytes());
        sector[entry_offset + 12..entry_offset + 16].copy_from_slice(&65536u32.to_le_bytes());
        sector
    }

    #[test]
    fn rejects_missing_signature() {
        let sector = [0u8; 512];
        assert_eq!(parse_partitions(&sector).unwrap_err(), MbrError::BadSignature);
    }

    #[test]
    fn finds_the_fat32_partition() {
        let sector = synthetic_mbr();
        let entry = find_fat32_partition(&sector).unwrap();
        assert!(entry.bootable);
        assert_eq!(entry.start_lba, 2048);
        assert_eq!(entry.length, 65536);
    }

    #[test]
    fn reports_no_fat32_partition_when_none_qualifies() {
        let mut sector = synthetic_mbr();
        sector[TABLE_OFFSET + 4] = 0x07; // NTFS/exFAT, not FAT32
        assert_eq!(find_fat32_partition(&sector).unwrap_err(), MbrError::NoFat32Partition);
    }
}
