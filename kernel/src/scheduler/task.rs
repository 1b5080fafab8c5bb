//! A task: a fixed 4 KiB stack buffer plus a [`CPUState`] frame positioned
//! at its top. Construction pre-builds the register frame a task switch
//! would otherwise save, so the very first tick can simply resume it.

use crate::arch::x86::handlers::CPUState;
use alloc::boxed::Box;

const STACK_SIZE: usize = 4096;
const INITIAL_EFLAGS: u32 = 0x202; // IF set, reserved bit 1 set

pub struct Task {
    stack: Box<[u8; STACK_SIZE]>,
    pub cpu_state: *mut CPUState,
}

// The task owns its stack exclusively; the raw `cpu_state` pointer only
// ever aliases into that owned buffer.
unsafe impl Send for Task {}

impl Task {
    /// Builds a task whose frame, once restored by the common interrupt
    /// dispatcher, starts executing `entry_point` with interrupts enabled
    /// and a full-sized private stack.
    pub fn new(entry_point: u32, code_selector: u16, data_selector: u16) -> Self {
        let mut stack = Box::new([0u8; STACK_SIZE]);
        let frame_addr = stack.as_mut_ptr() as usize + STACK_SIZE - core::mem::size_of::<CPUState>();
        let frame = frame_addr as *mut CPUState;
        unsafe {
            frame.write(CPUState {
                eax: 0,
                ebx: 0,
                ecx: 0,
                edx: 0,
                esi: 0,
                edi: 0,
                ebp: 0,
                error: 0,
                eip: entry_point,
                cs: code_selector as u32,
                eflags: INITIAL_EFLAGS,
                esp: (stack.as_ptr() as usize + STACK_SIZE) as u32,
                ss: data_selector as u32,
            });
        }
        Task { stack, cpu_state: frame }
    }
}
