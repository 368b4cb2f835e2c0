use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Content error: {0}")]
    Content(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("A page is already being loaded")]
    LoadInProgress,

    #[error("No more pages to load")]
    NothingToLoad,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_builder() && !e.is_decode(),
            Error::Io(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(!Error::Content("missing uid".to_string()).is_retryable());
        assert!(!Error::LoadInProgress.is_retryable());
        assert!(Error::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow")).is_retryable());
    }

    #[test]
    fn test_messages() {
        assert_eq!(Error::NothingToLoad.to_string(), "No more pages to load");
        assert_eq!(
            Error::InvalidCursor("abc".to_string()).to_string(),
            "Invalid cursor: abc"
        );
    }
}
