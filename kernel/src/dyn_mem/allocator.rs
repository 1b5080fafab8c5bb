//! Wires [`super::heap::Heap`] up as the kernel's `#[global_allocator]`,
//! backing every `new`/`delete`-equivalent (`alloc`/`Box`/`Vec`) in the
//! image: a `spin::Mutex`-guarded heap, an `init_kheap` free function, and every
//! operation wrapped in [`crate::arch::x86::handlers::without_interrupts`]
//! since the allocator has no locking discipline of its own beyond the
//! absence of preemption during a call.

use super::heap::Heap;
use crate::arch::x86::handlers::without_interrupts;
use core::alloc::{GlobalAlloc, Layout};
use spin::Mutex;
use terminal::log;

#[cfg_attr(not(test), global_allocator)]
static ALLOCATOR: HeapAllocator = HeapAllocator::new();

pub struct HeapAllocator {
    heap: Mutex<Heap>,
}

impl HeapAllocator {
    pub const fn new() -> Self {
        HeapAllocator { heap: Mutex::new(Heap::empty()) }
    }

    /// # Safety
    /// `[bottom, bottom + size)` must be valid, writable, unaliased memory
    /// for the remainder of the kernel's execution.
    pub unsafe fn init(&self, bottom: *mut u8, size: usize) {
        without_interrupts(|| unsafe {
            self.heap.lock().init(bottom, size);
        });
    }
}

unsafe impl GlobalAlloc for HeapAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        without_interrupts(|| self.heap.lock().allocate(layout.size()))
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        without_interrupts(|| unsafe { self.heap.lock().deallocate(ptr) })
    }
}

/// # Safety
/// See [`HeapAllocator::init`].
pub unsafe fn init_kheap(bottom: *mut u8, size: usize) {
    unsafe { ALLOCATOR.init(bottom, size) };
    log!("dyn_mem: heap ready ({size} bytes at {bottom:p})");
}
