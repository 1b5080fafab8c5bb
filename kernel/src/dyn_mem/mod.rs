pub mod allocator;
pub mod heap;

pub use allocator::init_kheap;
