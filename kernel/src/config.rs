//! Boot-time constants gathered in one place, separating "things the rest
//! of the tree needs to agree on" from the code that acts on them.

/// The heap's byte count is fixed at link time rather than sized from
/// `memupper`, keeping the allocator window's extent knowable without
/// reading the multiboot info first -- `multiboot::parse` only asserts
/// that the reported upper memory covers it.
pub const HEAP_SIZE: usize = 1024 * 1024;

/// Which ATA drive (master/slave) the filesystem mounts from.
pub const BOOT_DRIVE: crate::drivers::ata::Drive = crate::drivers::ata::Drive::Master;

/// Scheduler tick frequency, in Hz.
pub const SCHEDULER_HZ: u32 = 100;
