//! Crate root: module wiring plus the boot sequence multiboot's `_start`
//! stub calls into. Built `no_std` for the kernel image and with `std`
//! available under `cargo test`, so the pure logic modules (allocator,
//! GDT/IDT encoding, scheduler, FAT32 engine) run under the ordinary host
//! test harness while the hardware-facing glue stays kernel-only.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod arch;
pub mod config;
pub mod drivers;
pub mod dyn_mem;
pub mod fs;
pub mod gui;
pub mod multiboot;
pub mod scheduler;
pub mod shell;

use terminal::log;

/// The multiboot entry stub (`arch::x86::boot`, out of scope beyond its
/// interface) calls this with the magic number in `eax` and the info
/// pointer in `ebx`, already on the C stack per cdecl.
///
/// # Safety
/// `info_ptr` must be the pointer the multiboot loader passed in `ebx`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kernel_main(magic: u32, info_ptr: *const u8) -> ! {
    terminal::vga::clear_screen();
    terminal::serial::init();
    log!("kernel: boot stub handed off, magic={magic:#x}");

    let mem_upper_kib = match unsafe { multiboot::parse(magic, info_ptr) } {
        Ok(info) => info.mem_upper_kib,
        Err(e) => {
            log!("kernel: {e}, continuing with the configured heap size only");
            0
        }
    };
    log!("kernel: multiboot reports {mem_upper_kib} KiB of upper memory");

    let heap_bottom = unsafe { HEAP_REGION.as_mut_ptr() };
    unsafe { dyn_mem::init_kheap(heap_bottom, config::HEAP_SIZE) };

    arch::x86::init();

    drivers::pci::init();
    drivers::ata::init();

    match fs::mount_root() {
        Ok(()) => log!("kernel: root filesystem mounted"),
        Err(e) => log!("kernel: failed to mount root filesystem: {e}"),
    }

    log!("kernel: initialization finished, entering idle loop");
    idle_loop()
}

/// Backing storage for the heap window. A `static mut` array rather than a
/// pointer carved out of multiboot's reported memory map, since this
/// kernel's Non-goals exclude paging and any memory map beyond the single
/// `mem_upper` check.
static mut HEAP_REGION: [u8; config::HEAP_SIZE] = [0; config::HEAP_SIZE];

fn idle_loop() -> ! {
    loop {
        #[cfg(target_arch = "x86")]
        unsafe {
            core::arch::asm!("hlt", options(nomem, nostack));
        }
        #[cfg(not(target_arch = "x86"))]
        core::hint::spin_loop();
    }
}
