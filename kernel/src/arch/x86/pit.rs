//! Programmable Interval Timer: the PIT tick on IRQ 0 is what drives the
//! scheduler's round-robin dispatch (see [`crate::scheduler`]).

use terminal::Port8;

const DATA_PORT: u16 = 0x40;
const CMD_REGISTER: u16 = 0x43;
const BASE_FREQUENCY: u32 = 1_193_182;

/// Programs channel 0 in mode 3 (square wave), low/high byte access, for a
/// tick rate of `frequency_hz`.
pub fn configure(frequency_hz: u32) {
    let cmd = Port8::new(CMD_REGISTER);
    let data = Port8::new(DATA_PORT);

    let divisor = (BASE_FREQUENCY / frequency_hz).clamp(1, u16::MAX as u32) as u16;

    cmd.write(0x36);
    data.write((divisor & 0xFF) as u8);
    data.write(((divisor >> 8) & 0xFF) as u8);
}
