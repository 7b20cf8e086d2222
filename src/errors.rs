use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session establishment failed: {0}")]
    Session(String),

    #[error("Page operation failed: {0}")]
    Page(String),

    #[error("Notification delivery failed: {0}")]
    Notify(String),

    #[error("Snapshot store error: {0}")]
    Store(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WatchError>;
