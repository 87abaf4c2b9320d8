use console_handle::ConsoleError;

/// Errors that abort terminal session construction
#[derive(Debug, thiserror::Error)]
pub enum TermError {
    #[error(transparent)]
    Console(#[from] ConsoleError),

    #[error("invalid terminal config: {0}")]
    InvalidConfig(String),

    #[error("failed to load terminal config: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("terminal session requires a tokio runtime")]
    NoRuntime,

    #[error("failed to start input pump: {0}")]
    Spawn(#[source] std::io::Error),
}
