//! Directory entries (32 bytes, packed) and the traversal/mutation logic
//! built over them: path lookup, `ls`, `mkdir`/`touch`, and `rm`/`rmdir`.

use super::cluster::{self, FatError};
use super::Fat32;
use crate::hal::storage::{StorageError, SECTOR_SIZE};
use thiserror::Error;

pub const ENTRY_SIZE: usize = 32;
const ATTR_DIRECTORY: u8 = 0x10;
const ATTR_LFN: u8 = 0x0F;
const DELETED_MARK: u8 = 0xE5;
const END_OF_DIR: u8 = 0x00;

#[derive(Debug, Error)]
pub enum DirError {
    #[error("'{0}' does not exist")]
    NotFound(alloc::string::String),
    #[error("'{0}' is a directory")]
    IsDirectory(alloc::string::String),
    #[error("'{0}' is not a directory")]
    NotADirectory(alloc::string::String),
    #[error("'{0}' already exists")]
    AlreadyExists(alloc::string::String),
    #[error("path is null or empty")]
    EmptyPath,
    #[error(transparent)]
    Fat(#[from] FatError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One 32-byte FAT32 directory entry, decoded from its on-disk bytes.
#[derive(Debug, Clone, Copy)]
pub struct DirEntry {
    pub name: [u8; 8],
    pub ext: [u8; 3],
    pub attributes: u8,
    pub first_cluster: u32,
    pub size: u32,
    /// Where this entry lives on disk: the cluster of the directory that
    /// holds it, the sector within that cluster, and the byte offset
    /// within that sector. Needed to write the entry back in place.
    pub location: EntryLocation,
}

#[derive(Debug, Clone, Copy)]
pub struct EntryLocation {
    pub cluster: u32,
    pub sector_in_cluster: u32,
    pub offset: usize,
}

impl DirEntry {
    fn parse(bytes: &[u8], location: EntryLocation) -> Self {
        let mut name = [0u8; 8];
        name.copy_from_slice(&bytes[0..8]);
        let mut ext = [0u8; 3];
        ext.copy_from_slice(&bytes[8..11]);
        let attributes = bytes[11];
        let first_cluster_hi = u16::from_le_bytes([bytes[20], bytes[21]]);
        let first_cluster_lo = u16::from_le_bytes([bytes[26], bytes[27]]);
        let size = u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]);
        DirEntry {
            name,
            ext,
            attributes,
            first_cluster: ((first_cluster_hi as u32) << 16) | first_cluster_lo as u32,
            size,
            location,
        }
    }

    fn encode_into(&self, bytes: &mut [u8]) {
        bytes[0..8].copy_from_slice(&self.name);
        bytes[8..11].copy_from_slice(&self.ext);
        bytes[11] = self.attributes;
        bytes[12..20].fill(0);
        let hi = ((self.first_cluster >> 16) & 0xFFFF) as u16;
        let lo = (self.first_cluster & 0xFFFF) as u16;
        bytes[20..22].copy_from_slice(&hi.to_le_bytes());
        bytes[22..26].fill(0);
        bytes[26..28].copy_from_slice(&lo.to_le_bytes());
        bytes[28..32].copy_from_slice(&self.size.to_le_bytes());
    }

    pub fn is_directory(&self) -> bool {
        self.attributes & ATTR_DIRECTORY != 0
    }

    /// Trims trailing spaces from name/ext and joins them with a `.`.
    pub fn display_name(&self) -> alloc::string::String {
        let name = trimmed_ascii(&self.name);
        let ext = trimmed_ascii(&self.ext);
        if ext.is_empty() {
            name
        } else {
            let mut out = name;
            out.push('.');
            out.push_str(&ext);
            out
        }
    }
}

fn trimmed_ascii(field: &[u8]) -> alloc::string::String {
    let end = field.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
    field[..end].iter().map(|&b| b as char).collect()
}

/// Splits a display-style 8.3 name ("HELLO.TXT") into its space-padded
/// fixed-width fields, uppercased.
fn split_83(component: &str) -> ([u8; 8], [u8; 3]) {
    let mut name = [b' '; 8];
    let mut ext = [b' '; 3];
    let mut parts = component.splitn(2, '.');
    let base = parts.next().unwrap_or("");
    let extension = parts.next().unwrap_or("");
    for (i, b) in base.bytes().take(8).enumerate() {
        name[i] = b.to_ascii_uppercase();
    }
    for (i, b) in extension.bytes().take(3).enumerate() {
        ext[i] = b.to_ascii_uppercase();
    }
    (name, ext)
}

fn names_match(entry: &DirEntry, component: &str) -> bool {
    let (name, ext) = split_83(component);
    entry.name == name && entry.ext == ext
}

/// Iterates every live (non-deleted, non-LFN) entry of the directory chain
/// rooted at `cluster`, calling `visit` with each one. Stops early and
/// returns `Ok(Some(_))` if `visit` signals a match via its return value.
fn walk_directory<T>(
    fs: &Fat32,
    start_cluster: u32,
    mut visit: impl FnMut(DirEntry) -> Option<T>,
) -> Result<Option<T>, DirError> {
    let mut cluster = start_cluster;
    'clusters: loop {
        for sector_in_cluster in 0..fs.layout.sectors_per_cluster {
            let lba = fs.layout.cluster_to_lba(cluster) + sector_in_cluster;
            let mut buffer = [0u8; SECTOR_SIZE];
            fs.device.read_sector(lba, &mut buffer)?;
            for offset in (0..SECTOR_SIZE).step_by(ENTRY_SIZE) {
                let bytes = &buffer[offset..offset + ENTRY_SIZE];
                if bytes[0] == END_OF_DIR {
                    break 'clusters;
                }
                if bytes[0] == DELETED_MARK || bytes[11] == ATTR_LFN {
                    continue;
                }
                let location = EntryLocation { cluster, sector_in_cluster, offset };
                if let Some(result) = visit(DirEntry::parse(bytes, location)) {
                    return Ok(Some(result));
                }
            }
        }
        cluster = cluster::next_cluster_of(fs.device, &fs.layout, cluster)?;
        if cluster == 0 {
            break;
        }
    }
    Ok(None)
}

/// Lists every live entry directly inside `cluster` (including `.`/`..`).
pub fn list(fs: &Fat32, cluster: u32) -> Result<alloc::vec::Vec<DirEntry>, DirError> {
    let mut entries = alloc::vec::Vec::new();
    walk_directory(fs, cluster, |entry| {
        entries.push(entry);
        None::<()>
    })?;
    Ok(entries)
}

fn find_in(fs: &Fat32, cluster: u32, component: &str) -> Result<Option<DirEntry>, DirError> {
    walk_directory(fs, cluster, |entry| {
        if names_match(&entry, component) {
            Some(entry)
        } else {
            None
        }
    })
}

/// Splits `path` into its parent directory and final component, resolving
/// the parent through every component walked so far.
fn resolve_parent(fs: &Fat32, path: &str) -> Result<(u32, &str), DirError> {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return Err(DirError::EmptyPath);
    }
    let mut cluster = fs.root_cluster();
    let mut components = path.split('/').peekable();
    loop {
        let component = components.next().ok_or(DirError::EmptyPath)?;
        if components.peek().is_none() {
            return Ok((cluster, component));
        }
        let entry = find_in(fs, cluster, component)?
            .ok_or_else(|| DirError::NotFound(component.into()))?;
        if !entry.is_directory() {
            return Err(DirError::NotADirectory(component.into()));
        }
        cluster = entry.first_cluster;
    }
}

/// Resolves `path` to the entry it names, walking every intermediate
/// directory component. Non-terminal components must themselves be
/// directories.
pub fn lookup(fs: &Fat32, path: &str) -> Result<DirEntry, DirError> {
    let (parent, name) = resolve_parent(fs, path)?;
    find_in(fs, parent, name)?.ok_or_else(|| DirError::NotFound(name.into()))
}

/// Finds a free slot (deleted or end-of-directory marker) in `cluster`'s
/// chain, extending the chain with a fresh cluster if none is found.
fn find_free_slot(fs: &Fat32, start_cluster: u32) -> Result<EntryLocation, DirError> {
    let mut cluster = start_cluster;
    let mut last_cluster = start_cluster;
    loop {
        for sector_in_cluster in 0..fs.layout.sectors_per_cluster {
            let lba = fs.layout.cluster_to_lba(cluster) + sector_in_cluster;
            let mut buffer = [0u8; SECTOR_SIZE];
            fs.device.read_sector(lba, &mut buffer)?;
            for offset in (0..SECTOR_SIZE).step_by(ENTRY_SIZE) {
                let marker = buffer[offset];
                if marker == DELETED_MARK || marker == END_OF_DIR {
                    return Ok(EntryLocation { cluster, sector_in_cluster, offset });
                }
            }
        }
        last_cluster = cluster;
        let next = cluster::next_cluster_of(fs.device, &fs.layout, cluster)?;
        if next == 0 {
            break;
        }
        cluster = next;
    }
    let new_cluster = cluster::extend_chain(fs.device, &fs.layout, last_cluster)?;
    Ok(EntryLocation { cluster: new_cluster, sector_in_cluster: 0, offset: 0 })
}

fn write_entry(fs: &Fat32, entry: &DirEntry) -> Result<(), DirError> {
    let lba = fs.layout.cluster_to_lba(entry.location.cluster) + entry.location.sector_in_cluster;
    let mut buffer = [0u8; SECTOR_SIZE];
    fs.device.read_sector(lba, &mut buffer)?;
    entry.encode_into(&mut buffer[entry.location.offset..entry.location.offset + ENTRY_SIZE]);
    fs.device.write_sector(lba, &buffer)?;
    Ok(())
}

fn new_entry_at(location: EntryLocation, name: &str, attributes: u8, first_cluster: u32) -> DirEntry {
    let (name_field, ext_field) = split_83(name);
    DirEntry {
        name: name_field,
        ext: ext_field,
        attributes,
        first_cluster,
        size: 0,
        location,
    }
}

/// Creates an empty file entry in the directory `path`'s parent resolves
/// to. Rejects if an entry of that name already exists.
pub fn touch(fs: &Fat32, path: &str) -> Result<DirEntry, DirError> {
    let (parent, name) = resolve_parent(fs, path)?;
    if find_in(fs, parent, name)?.is_some() {
        return Err(DirError::AlreadyExists(name.into()));
    }
    let location = find_free_slot(fs, parent)?;
    let entry = new_entry_at(location, name, 0, 0);
    write_entry(fs, &entry)?;
    Ok(entry)
}

/// Allocates a cluster, seeds it with `.`/`..`, and links it into the
/// parent under `path`'s final component.
pub fn mkdir(fs: &Fat32, path: &str) -> Result<DirEntry, DirError> {
    let (parent, name) = resolve_parent(fs, path)?;
    if find_in(fs, parent, name)?.is_some() {
        return Err(DirError::AlreadyExists(name.into()));
    }
    let new_cluster = cluster::allocate_cluster(fs.device, &fs.layout)?;

    let dot = new_entry_at(
        EntryLocation { cluster: new_cluster, sector_in_cluster: 0, offset: 0 },
        ".",
        ATTR_DIRECTORY,
        new_cluster,
    );
    let dotdot = new_entry_at(
        EntryLocation { cluster: new_cluster, sector_in_cluster: 0, offset: ENTRY_SIZE },
        "..",
        ATTR_DIRECTORY,
        parent,
    );
    write_entry(fs, &dot)?;
    write_entry(fs, &dotdot)?;

    let location = find_free_slot(fs, parent)?;
    let entry = new_entry_at(location, name, ATTR_DIRECTORY, new_cluster);
    write_entry(fs, &entry)?;
    Ok(entry)
}

fn mark_deleted(fs: &Fat32, location: EntryLocation) -> Result<(), DirError> {
    let lba = fs.layout.cluster_to_lba(location.cluster) + location.sector_in_cluster;
    let mut buffer = [0u8; SECTOR_SIZE];
    fs.device.read_sector(lba, &mut buffer)?;
    buffer[location.offset] = DELETED_MARK;
    fs.device.write_sector(lba, &buffer)?;
    Ok(())
}

/// Rejects directories. Frees the file's cluster chain, then marks its
/// entry deleted.
pub fn rm(fs: &Fat32, path: &str) -> Result<(), DirError> {
    let entry = lookup(fs, path)?;
    if entry.is_directory() {
        return Err(DirError::IsDirectory(path.into()));
    }
    if entry.first_cluster >= 2 {
        cluster::free_chain(fs.device, &fs.layout, entry.first_cluster)?;
    }
    mark_deleted(fs, entry.location)
}

/// Recursively deletes every entry other than `.`/`..` before freeing the
/// directory's own chain. This is a deliberate departure from strict
/// POSIX `rmdir` semantics, which refuse a non-empty directory outright.
pub fn rmdir(fs: &Fat32, path: &str) -> Result<(), DirError> {
    let entry = lookup(fs, path)?;
    if !entry.is_directory() {
        return Err(DirError::NotADirectory(path.into()));
    }
    for child in list(fs, entry.first_cluster)? {
        let child_name = child.display_name();
        if child_name == "." || child_name == ".." {
            continue;
        }
        let child_path = alloc::format!("{}/{}", path.trim_end_matches('/'), child_name);
        if child.is_directory() {
            rmdir(fs, &child_path)?;
        } else {
            rm(fs, &child_path)?;
        }
    }
    cluster::free_chain(fs.device, &fs.layout, entry.first_cluster)?;
    mark_deleted(fs, entry.location)
}

/// Rewrites `entry`'s size and first-cluster fields in its on-disk slot.
/// Called after `write` extends a file's chain or changes its length, to
/// keep a fresh `open` seeing the true size.
pub(super) fn update_entry(fs: &Fat32, entry: &DirEntry) -> Result<(), DirError> {
    write_entry(fs, entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::fat32::test_support::FakeDisk;
    use crate::fs::fat32::bpb::FsLayout;

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
        // Reserve the root cluster itself as end-of-chain so walks terminate.
        let fs = Fat32 { device: &disk, layout };
        cluster::allocate_cluster(fs.device, &fs.layout).unwrap(); // consumes cluster 2 == root
        (disk, layout)
    }

    #[test]
    fn touch_then_lookup_round_trips() {
        let (disk, layout) = mounted();
        let fs = Fat32 { device: &disk, layout };
        touch(&fs, "/A").unwrap();
        let entry = lookup(&fs, "/A").unwrap();
        assert_eq!(entry.display_name(), "A");
        assert!(!entry.is_directory());
    }

    #[test]
    fn touch_rejects_duplicate_names() {
        let (disk, layout) = mounted();
        let fs = Fat32 { device: &disk, layout };
        touch(&fs, "/A").unwrap();
        assert!(matches!(touch(&fs, "/A"), Err(DirError::AlreadyExists(_))));
    }

    #[test]
    fn mkdir_seeds_dot_and_dotdot() {
        let (disk, layout) = mounted();
        let fs = Fat32 { device: &disk, layout };
        mkdir(&fs, "/D").unwrap();
        let dir_entry = lookup(&fs, "/D").unwrap();
        let children = list(&fs, dir_entry.first_cluster).unwrap();
        let names: alloc::vec::Vec<_> = children.iter().map(DirEntry::display_name).collect();
        assert!(names.contains(&alloc::string::String::from(".")));
        assert!(names.contains(&alloc::string::String::from("..")));
    }

    #[test]
    fn rm_frees_the_chain_and_hides_the_entry() {
        let (disk, layout) = mounted();
        let fs = Fat32 { device: &disk, layout };
        touch(&fs, "/A").unwrap();
        rm(&fs, "/A").unwrap();
        assert!(matches!(lookup(&fs, "/A"), Err(DirError::NotFound(_))));
    }

    #[test]
    fn case_insensitive_lookup_matches_either_case() {
        let (disk, layout) = mounted();
        let fs = Fat32 { device: &disk, layout };
        touch(&fs, "/Hello.txt").unwrap();
        assert!(lookup(&fs, "/HELLO.TXT").is_ok());
        assert!(lookup(&fs, "/hello.TXT").is_ok());
    }
}
