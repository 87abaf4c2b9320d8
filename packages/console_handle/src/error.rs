use std::io;
use std::sync::Arc;

/// Errors returned by console handle operations.
///
/// Cloneable so that a one-time result (such as a restore performed on close)
/// can be handed to every caller that asks for it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConsoleError {
    /// The provided file is not attached to a terminal device
    #[error("provided file is not a console")]
    NotAConsole,

    /// The operation is not available on this platform or backend
    #[error("unsupported operation")]
    Unsupported,

    /// OS error from the underlying syscall, passed through verbatim
    #[error(transparent)]
    Io(Arc<io::Error>),
}

impl ConsoleError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ConsoleError::Unsupported)
    }
}

impl From<io::Error> for ConsoleError {
    fn from(err: io::Error) -> Self {
        ConsoleError::Io(Arc::new(err))
    }
}

#[cfg(unix)]
impl From<nix::errno::Errno> for ConsoleError {
    fn from(errno: nix::errno::Errno) -> Self {
        ConsoleError::Io(Arc::new(io::Error::from(errno)))
    }
}
