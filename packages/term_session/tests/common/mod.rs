#![allow(dead_code)]

use console_handle::RawFd;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use term_session::{Console, ConsoleError, TermConfig, WinSize};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Short intervals so tests don't sit through the 500ms default.
pub fn fast_config() -> TermConfig {
    TermConfig {
        poll_interval_ms: 20,
        input_wait_ms: 10,
        ..Default::default()
    }
}

pub fn io_error(msg: &str) -> ConsoleError {
    ConsoleError::from(io::Error::other(msg.to_string()))
}

#[derive(Default)]
struct Input {
    queue: VecDeque<Vec<u8>>,
    eof: bool,
    error: Option<io::ErrorKind>,
}

impl Input {
    fn ready(&self) -> bool {
        !self.queue.is_empty() || self.eof || self.error.is_some()
    }
}

/// Scripted console for exercising sessions without a terminal.
#[derive(Default)]
pub struct MockConsole {
    input: Mutex<Input>,
    input_ready: Condvar,
    size: Mutex<WinSize>,
    size_script: Mutex<VecDeque<Result<WinSize, ConsoleError>>>,
    raw_error: Mutex<Option<ConsoleError>>,
    resize_error: Mutex<Option<ConsoleError>>,
    reset_error: Mutex<Option<ConsoleError>>,
    written: Mutex<Vec<u8>>,
    set_raw_calls: AtomicUsize,
    read_calls: AtomicUsize,
    resize_calls: AtomicUsize,
    reset_calls: AtomicUsize,
}

impl MockConsole {
    pub fn new(rows: u16, cols: u16) -> Arc<Self> {
        let console = Self::default();
        *console.size.lock().unwrap() = WinSize::new(rows, cols);
        Arc::new(console)
    }

    pub fn feed(&self, bytes: &[u8]) {
        self.input.lock().unwrap().queue.push_back(bytes.to_vec());
        self.input_ready.notify_all();
    }

    pub fn end_input(&self) {
        self.input.lock().unwrap().eof = true;
        self.input_ready.notify_all();
    }

    pub fn fail_input(&self, kind: io::ErrorKind) {
        self.input.lock().unwrap().error = Some(kind);
        self.input_ready.notify_all();
    }

    pub fn set_size(&self, rows: u16, cols: u16) {
        *self.size.lock().unwrap() = WinSize::new(rows, cols);
    }

    /// Answers for the next size queries, before falling back to `set_size`.
    pub fn script_sizes(&self, script: impl IntoIterator<Item = Result<WinSize, ConsoleError>>) {
        self.size_script.lock().unwrap().extend(script);
    }

    pub fn fail_raw(&self, err: ConsoleError) {
        *self.raw_error.lock().unwrap() = Some(err);
    }

    pub fn fail_resize(&self, err: ConsoleError) {
        *self.resize_error.lock().unwrap() = Some(err);
    }

    pub fn fail_reset(&self, err: ConsoleError) {
        *self.reset_error.lock().unwrap() = Some(err);
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    /// Input fed but not yet read by the session.
    pub fn unread(&self) -> Vec<u8> {
        self.input.lock().unwrap().queue.iter().flatten().copied().collect()
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn set_raw_calls(&self) -> usize {
        self.set_raw_calls.load(Ordering::SeqCst)
    }

    pub fn resize_calls(&self) -> usize {
        self.resize_calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) -> usize {
        self.reset_calls.load(Ordering::SeqCst)
    }
}

impl Console for MockConsole {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let mut input = self.input.lock().unwrap();
        if let Some(kind) = input.error.take() {
            return Err(io::Error::new(kind, "mock read failure"));
        }
        match input.queue.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    input.queue.push_front(chunk[n..].to_vec());
                }
                Ok(n)
            }
            None if input.eof => Ok(0),
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        let input = self.input.lock().unwrap();
        if input.ready() {
            return Ok(true);
        }
        let (input, _) = self.input_ready.wait_timeout(input, timeout).unwrap();
        Ok(input.ready())
    }

    fn fd(&self) -> RawFd {
        0
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn set_raw(&self) -> Result<(), ConsoleError> {
        self.set_raw_calls.fetch_add(1, Ordering::SeqCst);
        match self.raw_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn disable_echo(&self) -> Result<(), ConsoleError> {
        Ok(())
    }

    fn reset(&self) -> Result<(), ConsoleError> {
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
        match self.reset_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn size(&self) -> Result<WinSize, ConsoleError> {
        if let Some(next) = self.size_script.lock().unwrap().pop_front() {
            return next;
        }
        Ok(*self.size.lock().unwrap())
    }

    fn resize(&self, _size: WinSize) -> Result<(), ConsoleError> {
        self.resize_calls.fetch_add(1, Ordering::SeqCst);
        match self.resize_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
