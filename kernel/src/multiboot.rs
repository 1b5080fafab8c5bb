//! The multiboot info structure the loader hands `_start`. Only the field
//! the core actually consumes is read: `mem_upper` at offset 8, the amount
//! of memory (in KiB) above the 1 MiB mark, used to size the heap window.

use thiserror::Error;

const MAGIC: u32 = 0x2BADB002;
const MEM_UPPER_OFFSET: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MultibootError {
    #[error("multiboot magic number {0:#x} does not match the expected value")]
    BadMagic(u32),
}

/// The subset of the multiboot info block this kernel reads.
#[derive(Debug, Clone, Copy)]
pub struct MultibootInfo {
    pub mem_upper_kib: u32,
}

/// # Safety
/// `info_ptr` must be the pointer the loader passed in `ebx`, valid for at
/// least `MEM_UPPER_OFFSET + 4` bytes.
pub unsafe fn parse(magic: u32, info_ptr: *const u8) -> Result<MultibootInfo, MultibootError> {
    if magic != MAGIC {
        return Err(MultibootError::BadMagic(magic));
    }
    let mem_upper_kib = unsafe { core::ptr::read_unaligned(info_ptr.add(MEM_UPPER_OFFSET) as *const u32) };
    Ok(MultibootInfo { mem_upper_kib })
}
