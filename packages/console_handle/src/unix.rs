use nix::errno::Errno;
use nix::libc;
use nix::sys::termios::{self, LocalFlags, SetArg, Termios};
use std::fs::File;
use std::io::{self, IsTerminal, Read, Write};
use std::os::fd::{AsFd, AsRawFd, IntoRawFd, RawFd};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

use crate::{Console, ConsoleError, WinSize};

/// Console backed by a terminal file descriptor.
pub struct TermConsole {
    file: File,
    name: String,
    // Terminal attributes captured by the last successful `set_raw`.
    state: Mutex<Option<Termios>>,
}

/// Wrap `file` as a console if it is attached to a terminal.
pub fn from_file(file: File, name: impl Into<String>) -> Result<TermConsole, ConsoleError> {
    if !file.is_terminal() {
        return Err(ConsoleError::NotAConsole);
    }
    Ok(TermConsole {
        file,
        name: name.into(),
        state: Mutex::new(None),
    })
}

/// Return the first terminal-backed candidate, in order.
pub fn from_candidates<I>(candidates: I) -> Result<TermConsole, ConsoleError>
where
    I: IntoIterator<Item = (File, String)>,
{
    let mut last = ConsoleError::NotAConsole;
    for (file, name) in candidates {
        match from_file(file, name) {
            Ok(console) => return Ok(console),
            Err(err) => last = err,
        }
    }
    Err(last)
}

/// The current process' console: the first of stderr, stdout and stdin
/// attached to a terminal.
///
/// The chosen stream is duplicated, so closing the console leaves the
/// standard stream open.
pub fn try_current() -> Result<TermConsole, ConsoleError> {
    // Usually all three streams share one terminal, but some may be redirected.
    let candidates = [
        (io::stderr().as_fd().try_clone_to_owned(), "/dev/stderr"),
        (io::stdout().as_fd().try_clone_to_owned(), "/dev/stdout"),
        (io::stdin().as_fd().try_clone_to_owned(), "/dev/stdin"),
    ];
    from_candidates(
        candidates
            .into_iter()
            .filter_map(|(fd, name)| fd.ok().map(|fd| (File::from(fd), name.to_string()))),
    )
}

/// Like [`try_current`], but panics when no standard stream is a terminal.
///
/// At least one standard stream is expected to be a console wherever this is
/// called; use [`try_current`] where that does not hold.
pub fn current() -> TermConsole {
    match try_current() {
        Ok(console) => console,
        Err(err) => panic!("no standard stream is attached to a console: {err}"),
    }
}

impl TermConsole {
    /// Close the underlying file, reporting any error from `close(2)`.
    pub fn close(self) -> Result<(), ConsoleError> {
        nix::unistd::close(self.file.into_raw_fd())?;
        Ok(())
    }

    fn saved_state(&self) -> MutexGuard<'_, Option<Termios>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Console for TermConsole {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.file).read(buf)
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (&self.file).write(buf)
    }

    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
        let ret = unsafe { libc::poll(&mut pfd, 1, millis) };
        if ret < 0 {
            let errno = Errno::last();
            if errno == Errno::EINTR {
                return Ok(false);
            }
            return Err(errno.into());
        }
        Ok(ret > 0)
    }

    fn fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_raw(&self) -> Result<(), ConsoleError> {
        let mut state = self.saved_state();
        let original = termios::tcgetattr(&self.file)?;
        let mut raw = original.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(&self.file, SetArg::TCSANOW, &raw)?;
        *state = Some(original);
        Ok(())
    }

    fn disable_echo(&self) -> Result<(), ConsoleError> {
        let state = self.saved_state();
        let mut attrs = match state.as_ref() {
            Some(saved) => saved.clone(),
            None => termios::tcgetattr(&self.file)?,
        };
        attrs.local_flags.remove(LocalFlags::ECHO);
        termios::tcsetattr(&self.file, SetArg::TCSANOW, &attrs)?;
        Ok(())
    }

    fn reset(&self) -> Result<(), ConsoleError> {
        let state = self.saved_state();
        match state.as_ref() {
            Some(saved) => {
                termios::tcsetattr(&self.file, SetArg::TCSANOW, saved)?;
                Ok(())
            }
            None => {
                debug!("reset on {} without saved state", self.name);
                Ok(())
            }
        }
    }

    fn size(&self) -> Result<WinSize, ConsoleError> {
        let mut ws = libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let ret = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                libc::TIOCGWINSZ,
                &mut ws as *mut libc::winsize,
            )
        };
        if ret == -1 {
            return Err(Errno::last().into());
        }
        Ok(WinSize::new(ws.ws_row, ws.ws_col))
    }

    fn resize(&self, size: WinSize) -> Result<(), ConsoleError> {
        let ws = libc::winsize {
            ws_row: size.height,
            ws_col: size.width,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let ret = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                libc::TIOCSWINSZ,
                &ws as *const libc::winsize,
            )
        };
        if ret == -1 {
            return Err(Errno::last().into());
        }
        Ok(())
    }
}
