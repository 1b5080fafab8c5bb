//! The interactive terminal REPL: a 256-byte line buffer fed by the
//! keyboard IRQ, tokenized on Enter and dispatched against the FAT32
//! engine. Output goes through [`terminal::kprintln`] to the VGA buffer.

use crate::fs;
use alloc::string::String;
use alloc::vec::Vec;
use spin::Mutex;
use terminal::kprintln;

const LINE_CAPACITY: usize = 256;
const MAX_TOKENS: usize = 32;

struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    const fn new() -> Self {
        LineBuffer { bytes: Vec::new() }
    }
}

static LINE: Mutex<LineBuffer> = Mutex::new(LineBuffer::new());

/// Called from the keyboard IRQ path with one decoded ASCII byte at a
/// time. Printable bytes are appended (clipped at [`LINE_CAPACITY`]);
/// backspace erases the last character; `\n` terminates and dispatches.
pub fn on_key_down(byte: u8) {
    let mut line = LINE.lock();
    match byte {
        b'\n' => {
            kprintln!();
            let command = String::from_utf8_lossy(&line.bytes).into_owned();
            line.bytes.clear();
            drop(line);
            dispatch(&command);
        }
        0x08 => {
            if line.bytes.pop().is_some() {
                terminal::kprint!("{}", 0x08 as char);
            }
        }
        printable if line.bytes.len() < LINE_CAPACITY => {
            line.bytes.push(printable);
            terminal::kprint!("{}", printable as char);
        }
        _ => {}
    }
}

fn tokenize(line: &str) -> Vec<&str> {
    line.split(' ').filter(|s| !s.is_empty()).take(MAX_TOKENS).collect()
}

fn dispatch(line: &str) {
    let tokens = tokenize(line);
    let Some(&command) = tokens.first() else { return };

    match command {
        "ls" => cmd_ls(&tokens[1..]),
        "mkdir" => cmd_mkdir(&tokens[1..]),
        "touch" => cmd_touch(&tokens[1..]),
        "rm" => cmd_rm(&tokens[1..]),
        "rmdir" => cmd_rmdir(&tokens[1..]),
        "cat" => cmd_cat(&tokens[1..]),
        "write" => cmd_write(&tokens[1..]),
        "echo" => cmd_echo(&tokens[1..]),
        "clear" => terminal::vga::clear_screen(),
        "help" => cmd_help(),
        other => kprintln!("unknown command: {other}"),
    }
}

fn with_mounted(run: impl FnOnce(&fs::fat32::Fat32<'static>)) {
    match fs::with_fs(|f| run(f)) {
        Some(()) => {}
        None => kprintln!("no filesystem mounted"),
    }
}

fn cmd_ls(args: &[&str]) {
    let path = args.first().copied().unwrap_or("/");
    with_mounted(|fs| {
        let cluster = if path == "/" {
            fs.root_cluster()
        } else {
            match fs::fat32::dir::lookup(fs, path) {
                Ok(entry) if entry.is_directory() => entry.first_cluster,
                Ok(_) => return kprintln!("'{path}' is not a directory"),
                Err(_) => return kprintln!("'{path}' does not exist"),
            }
        };
        match fs::fat32::dir::list(fs, cluster) {
            Ok(entries) => {
                for entry in entries {
                    kprintln!("{}\t{}", entry.display_name(), entry.size);
                }
            }
            Err(e) => kprintln!("ls: {e}"),
        }
    });
}

fn cmd_mkdir(args: &[&str]) {
    let Some(&path) = args.first() else { return kprintln!("usage: mkdir <path>") };
    with_mounted(|fs| match fs::fat32::dir::mkdir(fs, path) {
        Ok(_) => {}
        Err(e) => kprintln!("mkdir: {e}"),
    });
}

fn cmd_touch(args: &[&str]) {
    let Some(&path) = args.first() else { return kprintln!("usage: touch <path>") };
    with_mounted(|fs| match fs::fat32::dir::touch(fs, path) {
        Ok(_) => {}
        Err(e) => kprintln!("touch: {e}"),
    });
}

fn cmd_rm(args: &[&str]) {
    let Some(&path) = args.first() else { return kprintln!("usage: rm <path>") };
    with_mounted(|fs| match fs::fat32::dir::rm(fs, path) {
        Ok(_) => {}
        Err(e) => kprintln!("rm: {e}"),
    });
}

fn cmd_rmdir(args: &[&str]) {
    let Some(&path) = args.first() else { return kprintln!("usage: rmdir <path>") };
    with_mounted(|fs| match fs::fat32::dir::rmdir(fs, path) {
        Ok(_) => {}
        Err(e) => kprintln!("rmdir: {e}"),
    });
}

fn cmd_cat(args: &[&str]) {
    let Some(&path) = args.first() else { return kprintln!("usage: cat <path>") };
    with_mounted(|fs| {
        let table = fs::open_files();
        let fd = match table.open(fs, path) {
            Ok(fd) => fd,
            Err(_) => return kprintln!("Could not open file '{path}'"),
        };
        let mut buf = [0u8; 512];
        loop {
            match table.read(fs, fd, &mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    for &byte in &buf[..n] {
                        terminal::kprint!("{}", byte as char);
                    }
                }
                Err(_) => break,
            }
        }
        kprintln!();
        let _ = table.close(fd);
    });
}

fn cmd_write(args: &[&str]) {
    let Some((&path, rest)) = args.split_first() else {
        return kprintln!("usage: write <path> <text>")
    };
    let text = rest.join(" ");
    with_mounted(|fs| {
        let table = fs::open_files();
        let fd = match table.open(fs, path) {
            Ok(fd) => fd,
            Err(e) => return kprintln!("write: {e}"),
        };
        if let Err(e) = table.write(fs, fd, text.as_bytes()) {
            kprintln!("write: {e}");
        }
        let _ = table.close(fd);
    });
}

fn cmd_echo(args: &[&str]) {
    kprintln!("{}", args.join(" "));
}

fn cmd_help() {
    kprintln!("ls mkdir touch rm rmdir cat write echo clear help");
}
