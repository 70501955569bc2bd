use std::path::PathBuf;

/// Failure reported by a database session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Oracle(#[from] oracle::Error),

    #[error("Not connected to a database")]
    NotConnected,
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Connection failed: {0}")]
    Connection(#[source] SessionError),

    #[error("Commit failed: {message}")]
    Commit { message: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential store error: {message}")]
    Credential { message: String },

    #[error("Embedding error: {message}")]
    Embedding { message: String },
}

impl ProvisionError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ProvisionError {
    fn from(err: reqwest::Error) -> Self {
        Self::Embedding {
            message: err.to_string(),
        }
    }
}

pub type Result<T, E = ProvisionError> = std::result::Result<T, E>;
