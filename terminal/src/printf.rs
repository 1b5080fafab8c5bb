//! A tiny `printf`-style formatter over the VGA writer, for call sites that
//! want C-style format strings (`%s`, `%d`, `%x`, `%c`) instead of
//! `core::fmt::Arguments`. Built on top of [`crate::vga`] rather than
//! re-deriving cursor handling.

use crate::vga;

pub fn putchar(byte: u8) {
    vga::_vga_print(format_args!("{}", byte as char));
}

pub fn print_hex(value: u32) {
    vga::_vga_print(format_args!("0x{value:08X}"));
}

pub fn print_int(value: i32) {
    vga::_vga_print(format_args!("{value}"));
}

/// Supports `%s`, `%d`, `%x`, `%c`, and `%%`; any other conversion is
/// printed literally (the percent sign and the following character).
pub fn printf(fmt: &str, args: &[PrintfArg]) {
    let mut args = args.iter();
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            vga::_vga_print(format_args!("{c}"));
            continue;
        }
        match chars.next() {
            Some('s') => {
                if let Some(PrintfArg::Str(s)) = args.next() {
                    vga::_vga_print(format_args!("{s}"));
                }
            }
            Some('d') => {
                if let Some(PrintfArg::Int(i)) = args.next() {
                    print_int(*i);
                }
            }
            Some('x') => {
                if let Some(PrintfArg::UInt(u)) = args.next() {
                    print_hex(*u);
                }
            }
            Some('c') => {
                if let Some(PrintfArg::Char(c)) = args.next() {
                    putchar(*c);
                }
            }
            Some('%') => vga::_vga_print(format_args!("%")),
            Some(other) => vga::_vga_print(format_args!("%{other}")),
            None => vga::_vga_print(format_args!("%")),
        }
    }
}

pub enum PrintfArg<'a> {
    Str(&'a str),
    Int(i32),
    UInt(u32),
    Char(u8),
}
