//! COM1 debug channel backing the [`crate::log!`] macro. Programs the
//! 16550 UART directly through [`crate::port::Port8`] rather than a crate
//! like `uart_16550`, since that crate assumes a target `x86_64` already
//! supports.

use crate::port::Port8;
use core::fmt::{self, Write};
use spin::Mutex;

const COM1: u16 = 0x3F8;

pub struct SerialWriter {
    data: Port8,
    int_enable: Port8,
    fifo_ctrl: Port8,
    line_ctrl: Port8,
    modem_ctrl: Port8,
    line_status: Port8,
}

impl SerialWriter {
    const fn new(base: u16) -> Self {
        SerialWriter {
            data: Port8::new(base),
            int_enable: Port8::new(base + 1),
            fifo_ctrl: Port8::new(base + 2),
            line_ctrl: Port8::new(base + 3),
            modem_ctrl: Port8::new(base + 4),
            line_status: Port8::new(base + 5),
        }
    }

    fn init(&self) {
        self.int_enable.write(0x00);
        self.line_ctrl.write(0x80); // enable DLAB to set baud divisor
        self.data.write(0x03); // divisor low byte: 38400 baud
        self.int_enable.write(0x00); // divisor high byte
        self.line_ctrl.write(0x03); // 8 bits, no parity, one stop bit
        self.fifo_ctrl.write(0xC7); // enable FIFO, clear, 14-byte threshold
        self.modem_ctrl.write(0x0B); // RTS/DSR set
    }

    fn transmit_empty(&self) -> bool {
        self.line_status.read() & 0x20 != 0
    }

    fn write_byte(&self, byte: u8) {
        while !self.transmit_empty() {}
        self.data.write(byte);
    }
}

impl Write for SerialWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
        Ok(())
    }
}

static SERIAL1: Mutex<SerialWriter> = Mutex::new(SerialWriter::new(COM1));

pub fn init() {
    SERIAL1.lock().init();
}

#[doc(hidden)]
pub fn _serial_print(args: fmt::Arguments) {
    let _ = SERIAL1.lock().write_fmt(args);
}
