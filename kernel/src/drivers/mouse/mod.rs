//! PS/2 mouse: present as a registerable interrupt handler so IRQ12 has
//! somewhere to dispatch, but movement/button decoding is out of scope --
//! the terminal has no pointer-driven input path.

use crate::arch::x86::handlers::CPUState;
use terminal::Port8;

const DATA_PORT: Port8 = Port8::new(0x60);

/// Drains the byte so the controller's output buffer doesn't stay full,
/// without interpreting the 3-byte movement packet.
pub fn handle(frame: &mut CPUState) -> u32 {
    let _ = DATA_PORT.read();
    frame as *mut CPUState as u32
}
