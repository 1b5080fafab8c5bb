//! Fixed pool of 16 file descriptors, opened against directory entries and
//! read/written sector-at-a-time, following the cluster chain as the
//! position crosses cluster boundaries.

use super::dir::{self, DirEntry, DirError};
use super::Fat32;
use super::cluster;
use crate::hal::storage::SECTOR_SIZE;
use spin::Mutex;
use thiserror::Error;

pub const MAX_OPEN_FILES: usize = 16;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("no free file descriptors")]
    OutOfDescriptors,
    #[error("descriptor is not open")]
    NotOpen,
    #[error("unexpected end of cluster chain")]
    UnexpectedEndOfChain,
    #[error(transparent)]
    Dir(#[from] DirError),
}

/// `{ first_cluster, current_cluster, current_sector_in_cluster, size,
/// position, is_open }`. When `is_open` is false every other field is
/// meaningless and must not be read.
#[derive(Debug, Clone, Copy)]
struct Descriptor {
    first_cluster: u32,
    current_cluster: u32,
    current_sector_in_cluster: u32,
    size: u32,
    position: u32,
    is_open: bool,
    entry: Option<DirEntryHandle>,
}

/// Just enough of the owning [`DirEntry`] to rewrite it on close/write:
/// its on-disk location and its 8.3 name fields, which `update_entry`
/// needs to re-encode the slot.
#[derive(Debug, Clone, Copy)]
struct DirEntryHandle {
    location: dir::EntryLocation,
    name: [u8; 8],
    ext: [u8; 3],
    attributes: u8,
}

impl Descriptor {
    const fn closed() -> Self {
        Descriptor {
            first_cluster: 0,
            current_cluster: 0,
            current_sector_in_cluster: 0,
            size: 0,
            position: 0,
            is_open: false,
            entry: None,
        }
    }
}

pub struct FileTable {
    descriptors: Mutex<[Descriptor; MAX_OPEN_FILES]>,
}

impl FileTable {
    pub const fn new() -> Self {
        FileTable {
            descriptors: Mutex::new([Descriptor::closed(); MAX_OPEN_FILES]),
        }
    }

    /// Resolves `path`, rejects directories, claims a free descriptor, and
    /// seeds it from the directory entry. Returns the descriptor index.
    pub fn open(&self, fs: &Fat32, path: &str) -> Result<usize, FileError> {
        let entry = dir::lookup(fs, path)?;
        if entry.is_directory() {
            return Err(FileError::Dir(DirError::IsDirectory(path.into())));
        }

        let mut descriptors = self.descriptors.lock();
        let slot = descriptors
            .iter()
            .position(|d| !d.is_open)
            .ok_or(FileError::OutOfDescriptors)?;

        descriptors[slot] = Descriptor {
            first_cluster: entry.first_cluster,
            current_cluster: entry.first_cluster,
            current_sector_in_cluster: 0,
            size: entry.size,
            position: 0,
            is_open: true,
            entry: Some(DirEntryHandle {
                location: entry.location,
                name: entry.name,
                ext: entry.ext,
                attributes: entry.attributes,
            }),
        };
        Ok(slot)
    }

    /// Reads up to `buf.len()` bytes starting at the descriptor's current
    /// position, clipped to the remaining file size, following the
    /// cluster chain at each sector boundary.
    pub fn read(&self, fs: &Fat32, fd: usize, buf: &mut [u8]) -> Result<usize, FileError> {
        let mut descriptors = self.descriptors.lock();
        let desc = descriptors.get_mut(fd).ok_or(FileError::NotOpen)?;
        if !desc.is_open {
            return Err(FileError::NotOpen);
        }

        let remaining = desc.size.saturating_sub(desc.position);
        let to_read = (buf.len() as u32).min(remaining) as usize;
        let mut read_so_far = 0usize;
        let mut cluster_num = desc.current_cluster;
        let mut sector_in_cluster = desc.current_sector_in_cluster;

        while read_so_far < to_read {
            if cluster_num < 2 {
                return Err(FileError::UnexpectedEndOfChain);
            }
            let lba = fs.layout.cluster_to_lba(cluster_num) + sector_in_cluster;
            let mut sector = [0u8; SECTOR_SIZE];
            fs.device.read_sector(lba, &mut sector).map_err(DirError::from)?;

            let offset_in_sector = (desc.position as usize + read_so_far) % SECTOR_SIZE;
            let chunk = (SECTOR_SIZE - offset_in_sector).min(to_read - read_so_far);
            buf[read_so_far..read_so_far + chunk]
                .copy_from_slice(&sector[offset_in_sector..offset_in_sector + chunk]);
            read_so_far += chunk;

            if offset_in_sector + chunk == SECTOR_SIZE && read_so_far < to_read {
                sector_in_cluster += 1;
                if sector_in_cluster == fs.layout.sectors_per_cluster {
                    sector_in_cluster = 0;
                    cluster_num = cluster::next_cluster_of(fs.device, &fs.layout, cluster_num)
                        .map_err(DirError::from)?;
                }
            }
        }

        desc.position += read_so_far as u32;
        desc.current_cluster = cluster_num;
        desc.current_sector_in_cluster = sector_in_cluster;
        Ok(read_so_far)
    }

    /// Writes `buf` at the descriptor's current position, extending the
    /// cluster chain as needed, then rewrites the on-disk directory entry
    /// so its size and first-cluster fields stay accurate after close.
    pub fn write(&self, fs: &Fat32, fd: usize, buf: &[u8]) -> Result<usize, FileError> {
        let mut descriptors = self.descriptors.lock();
        let desc = descriptors.get_mut(fd).ok_or(FileError::NotOpen)?;
        if !desc.is_open {
            return Err(FileError::NotOpen);
        }

        if desc.first_cluster < 2 {
            let new_cluster = cluster::allocate_cluster(fs.device, &fs.layout).map_err(DirError::from)?;
            desc.first_cluster = new_cluster;
            desc.current_cluster = new_cluster;
            desc.current_sector_in_cluster = 0;
        }

        let mut written_so_far = 0usize;
        let mut cluster_num = desc.current_cluster;
        let mut sector_in_cluster = desc.current_sector_in_cluster;

        while written_so_far < buf.len() {
            let lba = fs.layout.cluster_to_lba(cluster_num) + sector_in_cluster;
            let mut sector = [0u8; SECTOR_SIZE];
            fs.device.read_sector(lba, &mut sector).map_err(DirError::from)?;

            let offset_in_sector = (desc.position as usize + written_so_far) % SECTOR_SIZE;
            let chunk = (SECTOR_SIZE - offset_in_sector).min(buf.len() - written_so_far);
            sector[offset_in_sector..offset_in_sector + chunk]
                .copy_from_slice(&buf[written_so_far..written_so_far + chunk]);
            fs.device.write_sector(lba, &sector).map_err(DirError::from)?;
            written_so_far += chunk;

            if offset_in_sector + chunk == SECTOR_SIZE && written_so_far < buf.len() {
                sector_in_cluster += 1;
                if sector_in_cluster == fs.layout.sectors_per_cluster {
                    sector_in_cluster = 0;
                    let next = cluster::next_cluster_of(fs.device, &fs.layout, cluster_num)
                        .map_err(DirError::from)?;
                    cluster_num = if next == 0 {
                        cluster::extend_chain(fs.device, &fs.layout, cluster_num).map_err(DirError::from)?
                    } else {
                        next
                    };
                }
            }
        }

        desc.position += written_so_far as u32;
        desc.size = desc.size.max(desc.position);
        desc.current_cluster = cluster_num;
        desc.current_sector_in_cluster = sector_in_cluster;

        if let Some(handle) = desc.entry {
            let entry = DirEntry {
                name: handle.name,
                ext: handle.ext,
                attributes: handle.attributes,
                first_cluster: desc.first_cluster,
                size: desc.size,
                location: handle.location,
            };
            dir::update_entry(fs, &entry)?;
        }
        Ok(written_so_far)
    }

    pub fn close(&self, fd: usize) -> Result<(), FileError> {
        let mut descriptors = self.descriptors.lock();
        let desc = descriptors.get_mut(fd).ok_or(FileError::NotOpen)?;
        if !desc.is_open {
            return Err(FileError::NotOpen);
        }
        *desc = Descriptor::closed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::fat32::bpb::FsLayout;
    use crate::fs::fat32::test_support::FakeDisk;

    fn mounted() -> (FakeDisk, FsLayout) {
        let disk = FakeDisk::new(256);
        let layout = FsLayout {
            partition_lba: 0,
            fat_start: 1,
            data_start: 1 + 4,
            sectors_per_cluster: 1,
            table_size: 4,
            root_cluster: 2,
        };
        let fs = Fat32 { device: &disk, layout };
        cluster::allocate_cluster(fs.device, &fs.layout).unwrap();
        (disk, layout)
    }

    #[test]
    fn write_then_read_round_trips_exact_bytes() {
        let (disk, layout) = mounted();
        let fs = Fat32 { device: &disk, layout };
        dir::touch(&fs, "/X").unwrap();

        let table = FileTable::new();
        let fd = table.open(&fs, "/X").unwrap();
        table.write(&fs, fd, b"hello").unwrap();
        table.close(fd).unwrap();

        let fd = table.open(&fs, "/X").unwrap();
        let mut buf = [0u8; 16];
        let n = table.read(&fs, fd, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
        table.close(fd).unwrap();
    }

    #[test]
    fn open_fails_on_a_directory() {
        let (disk, layout) = mounted();
        let fs = Fat32 { device: &disk, layout };
        dir::mkdir(&fs, "/D").unwrap();
        let table = FileTable::new();
        assert!(table.open(&fs, "/D").is_err());
    }

    #[test]
    fn close_zeroes_the_descriptor_for_reuse() {
        let (disk, layout) = mounted();
        let fs = Fat32 { device: &disk, layout };
        dir::touch(&fs, "/X").unwrap();
        let table = FileTable::new();
        let fd = table.open(&fs, "/X").unwrap();
        table.close(fd).unwrap();
        assert!(table.read(&fs, fd, &mut [0u8; 1]).is_err());
    }

    #[test]
    fn exhausting_the_descriptor_pool_reports_an_error() {
        let (disk, layout) = mounted();
        let fs = Fat32 { device: &disk, layout };
        dir::touch(&fs, "/X").unwrap();
        let table = FileTable::new();
        let mut held = alloc::vec::Vec::new();
        for _ in 0..MAX_OPEN_FILES {
            held.push(table.open(&fs, "/X").unwrap());
        }
        assert!(matches!(table.open(&fs, "/X"), Err(FileError::OutOfDescriptors)));
    }
}
