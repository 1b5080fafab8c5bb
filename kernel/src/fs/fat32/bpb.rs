//! BIOS Parameter Block (FAT32 variant), parsed from the first sector of
//! the partition. Read field-by-field with `from_le_bytes` rather than
//! cast through a `#[repr(C, packed)]` struct -- the sector comes in as a
//! plain `[u8; 512]` off the block device, and this keeps parsing portable
//! and trivially host-testable against a hand-built byte array.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BpbError {
    #[error("boot signature byte is neither 0x28 nor 0x29")]
    BadBootSignature,
    #[error("filesystem type label is not \"FAT32   \"")]
    NotFat32,
    #[error("a required BPB field is zero")]
    ZeroField,
    #[error("root cluster must be >= 2")]
    InvalidRootCluster,
}

#[derive(Debug, Clone, Copy)]
pub struct Bpb32 {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_copies: u8,
    pub table_size: u32,
    pub root_cluster: u32,
}

impl Bpb32 {
    pub fn parse(sector: &[u8; 512]) -> Result<Self, BpbError> {
        let bytes_per_sector = u16::from_le_bytes([sector[11], sector[12]]);
        let sectors_per_cluster = sector[13];
        let reserved_sectors = u16::from_le_bytes([sector[14], sector[15]]);
        let fat_copies = sector[16];
        let table_size = u32::from_le_bytes([sector[36], sector[37], sector[38], sector[39]]);
        let root_cluster = u32::from_le_bytes([sector[44], sector[45], sector[46], sector[47]]);
        let boot_signature = sector[66];
        let fs_type = &sector[82..90];

        if boot_signature != 0x28 && boot_signature != 0x29 {
            return Err(BpbError::BadBootSignature);
        }
        if fs_type != b"FAT32   " {
            return Err(BpbError::NotFat32);
        }
        if sectors_per_cluster == 0 || reserved_sectors == 0 || fat_copies == 0 || table_size == 0 {
            return Err(BpbError::ZeroField);
        }
        if root_cluster < 2 {
            return Err(BpbError::InvalidRootCluster);
        }

        Ok(Bpb32 {
            bytes_per_sector,
            sectors_per_cluster,
            reserved_sectors,
            fat_copies,
            table_size,
            root_cluster,
        })
    }
}

/// Layout derived from the BPB at mount time: where the FAT region and the
/// data region begin, relative to the partition's own starting LBA.
#[derive(Debug, Clone, Copy)]
pub struct FsLayout {
    pub partition_lba: u32,
    pub fat_start: u32,
    pub data_start: u32,
    pub sectors_per_cluster: u32,
    pub table_size: u32,
    pub root_cluster: u32,
}

impl FsLayout {
    pub fn new(partition_lba: u32, bpb: &Bpb32) -> Self {
        let fat_start = partition_lba + bpb.reserved_sectors as u32;
        let data_start = fat_start + bpb.table_size * bpb.fat_copies as u32;
        FsLayout {
            partition_lba,
            fat_start,
            data_start,
            sectors_per_cluster: bpb.sectors_per_cluster as u32,
            table_size: bpb.table_size,
            root_cluster: bpb.root_cluster,
        }
    }

    pub fn cluster_to_lba(&self, cluster: u32) -> u32 {
        debug_assert!(cluster >= 2);
        self.data_start + (cluster - 2) * self.sectors_per_cluster
    }

    /// Which FAT sector (relative to `fat_start`) and which 4-byte entry
    /// within it holds `cluster`'s chain link.
    pub fn fat_entry_location(&self, cluster: u32) -> (u32, usize) {
        const ENTRIES_PER_SECTOR: u32 = 512 / 4;
        (self.fat_start + cluster / ENTRIES_PER_SECTOR, (cluster % ENTRIES_PER_SECTOR) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_sector() -> [u8; 512] {
        let mut sector = [0u8; 512];
        sector[11..13].copy_from_slice(&512u16.to_le_bytes());
        sector[13] = 4; // sectors per cluster
        sector[14..16].copy_from_slice(&32u16.to_le_bytes());
        sector[16] = 2; // fat copies
        sector[36..40].copy_from_slice(&100u32.to_le_bytes());
        sector[44..48].copy_from_slice(&2u32.to_le_bytes());
        sector[66] = 0x29;
        sector[82..90].copy_from_slice(b"FAT32   ");
        sector
    }

    #[test]
    fn parses_a_well_formed_bpb() {
        let bpb = Bpb32::parse(&synthetic_sector()).unwrap();
        assert_eq!(bpb.bytes_per_sector, 512);
        assert_eq!(bpb.sectors_per_cluster, 4);
        assert_eq!(bpb.reserved_sectors, 32);
        assert_eq!(bpb.fat_copies, 2);
        assert_eq!(bpb.table_size, 100);
        assert_eq!(bpb.root_cluster, 2);
    }

    #[test]
    fn accepts_either_boot_signature_byte() {
        let mut sector = synthetic_sector();
        sector[66] = 0x28;
        assert!(Bpb32::parse(&sector).is_ok());
    }

    #[test]
    fn rejects_non_fat32_type_label() {
        let mut sector = synthetic_sector();
        sector[82..90].copy_from_slice(b"FAT16   ");
        assert_eq!(Bpb32::parse(&sector).unwrap_err(), BpbError::NotFat32);
    }

    #[test]
    fn rejects_zero_valued_fields() {
        let mut sector = synthetic_sector();
        sector[13] = 0;
        assert_eq!(Bpb32::parse(&sector).unwrap_err(), BpbError::ZeroField);
    }

    #[test]
    fn layout_computes_fat_and_data_region_starts() {
        let bpb = Bpb32::parse(&synthetic_sector()).unwrap();
        let layout = FsLayout::new(2048, &bpb);
        assert_eq!(layout.fat_start, 2048 + 32);
        assert_eq!(layout.data_start, 2048 + 32 + 100 * 2);
        assert_eq!(layout.cluster_to_lba(2), layout.data_start);
        assert_eq!(layout.cluster_to_lba(3), layout.data_start + 4);
    }
}
