#![cfg(unix)]

use console_handle::{Console, ConsoleError, WinSize};
use nix::pty::{Winsize, openpty};
use nix::sys::termios::{self, LocalFlags};
use std::fs::File;
use std::io::{Read, Write};
use std::time::Duration;

/// Open a pseudo terminal pair, returning (master, slave).
fn open_pty(rows: u16, cols: u16) -> (File, File) {
    let ws = Winsize {
        ws_row: rows,
        ws_col: cols,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let pty = openpty(&ws, None).expect("openpty");
    (File::from(pty.master), File::from(pty.slave))
}

fn local_flags(file: &File) -> LocalFlags {
    termios::tcgetattr(file).expect("tcgetattr").local_flags
}

#[test]
fn regular_file_is_not_a_console() {
    let file = tempfile::tempfile().unwrap();
    let err = console_handle::from_file(file, "tmp").err().expect("should reject");
    assert!(matches!(err, ConsoleError::NotAConsole));
}

#[test]
fn candidates_pick_first_terminal() {
    let (_master, slave) = open_pty(24, 80);
    let candidates = vec![
        (tempfile::tempfile().unwrap(), "redirected".to_string()),
        (slave, "pty-slave".to_string()),
    ];
    let console = console_handle::from_candidates(candidates).unwrap();
    assert_eq!(console.name(), "pty-slave");
    assert!(console.fd() >= 0);
}

#[test]
fn no_candidates_is_not_a_console() {
    let err = console_handle::from_candidates(Vec::new()).err().unwrap();
    assert!(matches!(err, ConsoleError::NotAConsole));
}

#[test]
fn size_and_resize() {
    let (_master, slave) = open_pty(24, 80);
    let console = console_handle::from_file(slave, "pty").unwrap();

    assert_eq!(console.size().unwrap(), WinSize::new(24, 80));

    console.resize(WinSize::new(30, 100)).unwrap();
    assert_eq!(console.size().unwrap(), WinSize::new(30, 100));
}

#[test]
fn raw_mode_is_restored_by_reset() {
    let (_master, slave) = open_pty(24, 80);
    let observer = slave.try_clone().unwrap();
    let console = console_handle::from_file(slave, "pty").unwrap();

    assert!(local_flags(&observer).contains(LocalFlags::ICANON));

    console.set_raw().unwrap();
    let raw = local_flags(&observer);
    assert!(!raw.contains(LocalFlags::ICANON));
    assert!(!raw.contains(LocalFlags::ECHO));
    assert!(!raw.contains(LocalFlags::ISIG));

    console.reset().unwrap();
    let restored = local_flags(&observer);
    assert!(restored.contains(LocalFlags::ICANON));
    assert!(restored.contains(LocalFlags::ECHO));

    // Idempotent at this layer.
    console.reset().unwrap();
    assert!(local_flags(&observer).contains(LocalFlags::ICANON));
}

#[test]
fn disable_echo_uses_saved_state() {
    let (_master, slave) = open_pty(24, 80);
    let observer = slave.try_clone().unwrap();
    let console = console_handle::from_file(slave, "pty").unwrap();

    console.set_raw().unwrap();
    console.disable_echo().unwrap();

    let flags = local_flags(&observer);
    assert!(!flags.contains(LocalFlags::ECHO));
    assert!(flags.contains(LocalFlags::ICANON));
}

#[test]
fn reset_without_raw_is_noop() {
    let (_master, slave) = open_pty(24, 80);
    let observer = slave.try_clone().unwrap();
    let console = console_handle::from_file(slave, "pty").unwrap();

    console.reset().unwrap();
    assert!(local_flags(&observer).contains(LocalFlags::ICANON));
}

#[test]
fn io_passes_through() {
    let (mut master, slave) = open_pty(24, 80);
    let console = console_handle::from_file(slave, "pty").unwrap();
    console.set_raw().unwrap();

    assert_eq!(console.write(b"ping").unwrap(), 4);
    let mut out = [0u8; 4];
    master.read_exact(&mut out).unwrap();
    assert_eq!(&out, b"ping");

    assert!(!console.wait_readable(Duration::from_millis(20)).unwrap());

    master.write_all(b"x").unwrap();
    assert!(console.wait_readable(Duration::from_secs(2)).unwrap());
    let mut buf = [0u8; 8];
    let n = console.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"x");

    console.reset().unwrap();
    console.close().unwrap();
}
