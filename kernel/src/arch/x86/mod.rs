//! CPU bring-up: flat GDT, 256-entry IDT wired to the macro-generated asm
//! trampolines, 8259 PIC remap, and the PIT tick that drives the scheduler.
//!
//! The asm trampolines themselves (and the table of their addresses) only
//! make sense assembled for the 32-bit kernel target, so their generation
//! and `init()`'s use of them are confined to `target_arch = "x86"`; the
//! pure encode/decode halves of [`gdt`] and [`idt`] stay available (and
//! host-testable) unconditionally.

pub mod gdt;
pub mod handlers;
pub mod idt;
pub mod pic;
pub mod pit;

use handlers::InterruptManager;
use lazy_static::lazy_static;

#[cfg(target_arch = "x86")]
macros::generate_isr_stubs!();

#[cfg(target_arch = "x86")]
static mut GDT: gdt::Gdt = gdt::Gdt::new();
#[cfg(target_arch = "x86")]
static mut IDT: idt::Idt = idt::Idt::new();

lazy_static! {
    pub static ref MANAGER: InterruptManager = InterruptManager::new();
}

#[cfg(target_arch = "x86")]
pub fn init() {
    use crate::config::SCHEDULER_HZ;
    use idt::{EXCEPTION_COUNT, IRQ_BASE, IRQ_COUNT};
    use terminal::log;

    unsafe {
        GDT.install();
        let code_selector = GDT.code_segment_selector();

        for vector in 0u8..EXCEPTION_COUNT as u8 {
            let stub = ISR_STUB_TABLE[vector as usize] as usize as u32;
            IDT.set_trap_gate(vector, stub, code_selector);
        }
        for irq in 0u8..IRQ_COUNT as u8 {
            let stub = ISR_STUB_TABLE[EXCEPTION_COUNT + irq as usize] as usize as u32;
            IDT.set_interrupt_gate(IRQ_BASE + irq, stub, code_selector);
        }
        IDT.load();
    }

    MANAGER.remap_pic(handlers::HW_OFFSET, handlers::HW_OFFSET + 8);
    MANAGER.register(handlers::HW_OFFSET + 1, crate::drivers::keyboard::handle);
    MANAGER.register(handlers::HW_OFFSET + 12, crate::drivers::mouse::handle);
    MANAGER.activate();
    pit::configure(SCHEDULER_HZ);

    log!("arch::x86: GDT/IDT/PIC ready, scheduler tick at {SCHEDULER_HZ}Hz");
}

/// No-op outside the kernel's own 32-bit target: GDT/IDT/PIC/PIT bring-up
/// only makes sense running on real (or emulated) x86 hardware, but
/// `kernel_main` still needs something to call under a host `cargo test`.
#[cfg(not(target_arch = "x86"))]
pub fn init() {}
