//! PS/2 keyboard: scancode-set-1 decoding via `pc-keyboard`'s state
//! machine. The
//! IRQ handler reads port 0x60, feeds the byte in, and forwards any
//! decoded printable character to the terminal's line buffer.

use crate::arch::x86::handlers::CPUState;
use crate::shell;
use lazy_static::lazy_static;
use pc_keyboard::{layouts, DecodedKey, HandleControl, Keyboard, ScancodeSet1};
use spin::Mutex;
use terminal::Port8;

const DATA_PORT: Port8 = Port8::new(0x60);

lazy_static! {
    static ref KEYBOARD: Mutex<Keyboard<layouts::Us104Key, ScancodeSet1>> = Mutex::new(Keyboard::new(
        ScancodeSet1::new(),
        layouts::Us104Key,
        HandleControl::Ignore,
    ));
}

/// Decodes one scancode byte, forwarding a printable ASCII character (or
/// Enter/Backspace) to the terminal if one results. Non-ASCII keys, key
/// releases with no associated printable, and modifier-only presses yield
/// nothing.
fn read_scancode(scancode: u8) {
    let mut keyboard = KEYBOARD.lock();
    if let Ok(Some(key_event)) = keyboard.add_byte(scancode) {
        if let Some(DecodedKey::Unicode(character)) = keyboard.process_keyevent(key_event) {
            if character.is_ascii() {
                shell::on_key_down(character as u8);
            }
        }
    }
}

/// IRQ1 handler: reads the scancode and decodes it. Registered into the
/// interrupt table exactly like any other driver handler.
pub fn handle(frame: &mut CPUState) -> u32 {
    read_scancode(DATA_PORT.read());
    frame as *mut CPUState as u32
}
