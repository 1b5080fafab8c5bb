//! Flat-model Global Descriptor Table. Four entries -- null, unused, code,
//! data -- built by hand instead of through the `x86_64` crate's
//! `GlobalDescriptorTable`, which only targets long mode. The encode/decode
//! halves of a [`SegmentDescriptor`] are kept pure so the granularity
//! rounding rule can be exercised under a host `#[test]`.

use core::mem::size_of;

pub const CODE_SEGMENT_INDEX: usize = 2;
pub const DATA_SEGMENT_INDEX: usize = 3;

const ACCESS_CODE: u8 = 0x9A;
const ACCESS_DATA: u8 = 0x92;
const FLAGS_4K_32BIT: u8 = 0xC;
const FLAT_LIMIT: u32 = 64 * 1024 * 1024 - 1; // 64 MiB flat window

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, packed)]
pub struct SegmentDescriptor {
    limit_low: u16,
    base_low: u16,
    base_mid: u8,
    access: u8,
    limit_high_flags: u8,
    base_high: u8,
}

impl SegmentDescriptor {
    pub const fn null() -> Self {
        SegmentDescriptor {
            limit_low: 0,
            base_low: 0,
            base_mid: 0,
            access: 0,
            limit_high_flags: 0,
            base_high: 0,
        }
    }

    /// `limit` is the caller's requested byte limit; when it isn't already
    /// page-aligned (`limit & 0xFFF != 0xFFF`) it is rounded down to the
    /// enclosing 4 KiB page before the 12-bit granularity quantum is taken.
    pub fn new(base: u32, limit: u32, access: u8, flags: u8) -> Self {
        let quantum = if limit & 0xFFF != 0xFFF {
            (limit >> 12) - 1
        } else {
            limit >> 12
        };
        SegmentDescriptor {
            limit_low: (quantum & 0xFFFF) as u16,
            base_low: (base & 0xFFFF) as u16,
            base_mid: ((base >> 16) & 0xFF) as u8,
            access,
            limit_high_flags: (((quantum >> 16) & 0xF) as u8) | (flags << 4),
            base_high: ((base >> 24) & 0xFF) as u8,
        }
    }

    pub fn flat_code() -> Self {
        Self::new(0, FLAT_LIMIT, ACCESS_CODE, FLAGS_4K_32BIT)
    }

    pub fn flat_data() -> Self {
        Self::new(0, FLAT_LIMIT, ACCESS_DATA, FLAGS_4K_32BIT)
    }

    /// Recovers the 32-bit base this descriptor encodes.
    pub fn base(&self) -> u32 {
        (self.base_low as u32) | ((self.base_mid as u32) << 16) | ((self.base_high as u32) << 24)
    }

    /// Recovers the byte limit, applying the inverse of the granularity
    /// rounding rule (always returns a `0xFFF`-aligned value, since the
    /// scale factor is inherently lossy for unaligned inputs).
    pub fn limit(&self) -> u32 {
        let quantum = (self.limit_low as u32) | (((self.limit_high_flags & 0x0F) as u32) << 16);
        (quantum << 12) | 0xFFF
    }

    pub fn access(&self) -> u8 {
        self.access
    }
}

#[repr(C, packed)]
struct GdtPointer {
    limit: u16,
    base: u32,
}

pub struct Gdt {
    entries: [SegmentDescriptor; 4],
}

impl Gdt {
    pub const fn new() -> Self {
        Gdt {
            entries: [SegmentDescriptor::null(); 4],
        }
    }

    /// Builds the four flat-model entries (null, unused, code, data) and
    /// loads the GDTR. `self` must live for the remainder of the kernel's
    /// execution -- it is referenced by the CPU's segment registers from
    /// this point on.
    pub fn install(&'static mut self) {
        self.entries[0] = SegmentDescriptor::null();
        self.entries[1] = SegmentDescriptor::null();
        self.entries[CODE_SEGMENT_INDEX] = SegmentDescriptor::flat_code();
        self.entries[DATA_SEGMENT_INDEX] = SegmentDescriptor::flat_data();

        let pointer = GdtPointer {
            limit: (size_of::<[SegmentDescriptor; 4]>() - 1) as u16,
            base: self.entries.as_ptr() as u32,
        };

        unsafe {
            load_gdtr(&pointer as *const GdtPointer as u32);
            reload_segments();
        }
    }

    pub fn code_segment_selector(&self) -> u16 {
        (CODE_SEGMENT_INDEX * size_of::<SegmentDescriptor>()) as u16
    }

    pub fn data_segment_selector(&self) -> u16 {
        (DATA_SEGMENT_INDEX * size_of::<SegmentDescriptor>()) as u16
    }
}

#[cfg(target_arch = "x86")]
unsafe fn load_gdtr(pointer: u32) {
    unsafe {
        core::arch::asm!("lgdt [{0}]", in(reg) pointer, options(readonly, nostack, preserves_flags));
    }
}

#[cfg(not(target_arch = "x86"))]
unsafe fn load_gdtr(_pointer: u32) {}

/// Reloads every segment register from the freshly-loaded GDT: a far jump
/// to reload `cs` (required -- it can't be written directly), then `mov` to
/// reload the rest.
#[cfg(target_arch = "x86")]
unsafe fn reload_segments() {
    unsafe {
        core::arch::asm!(
            "ljmp $0x10, $2f",
            "2:",
            "mov ax, 0x18",
            "mov ds, ax",
            "mov es, ax",
            "mov fs, ax",
            "mov gs, ax",
            "mov ss, ax",
            options(att_syntax, nostack, preserves_flags),
        );
    }
}

#[cfg(not(target_arch = "x86"))]
unsafe fn reload_segments() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_code_descriptor_recovers_base_and_access() {
        let descriptor = SegmentDescriptor::flat_code();
        assert_eq!(descriptor.base(), 0);
        assert_eq!(descriptor.access(), ACCESS_CODE);
    }

    #[test]
    fn page_aligned_limit_round_trips_exactly() {
        let aligned = 0x0FFF_FFFF; // already (n<<12)-1 aligned
        let descriptor = SegmentDescriptor::new(0, aligned, ACCESS_DATA, FLAGS_4K_32BIT);
        assert_eq!(descriptor.limit(), aligned);
    }

    #[test]
    fn unaligned_limit_rounds_down_to_enclosing_page() {
        // 64 MiB - 1, not page aligned at the byte level below 0xFFF boundary
        let descriptor = SegmentDescriptor::new(0xDEAD_0000, FLAT_LIMIT, ACCESS_CODE, FLAGS_4K_32BIT);
        assert_eq!(descriptor.base(), 0xDEAD_0000);
        assert_eq!(descriptor.limit(), FLAT_LIMIT);
    }

    #[test]
    fn selectors_are_byte_offsets_into_the_table() {
        let gdt = Gdt::new();
        assert_eq!(gdt.code_segment_selector(), 0x10);
        assert_eq!(gdt.data_segment_selector(), 0x18);
    }
}
