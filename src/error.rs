use std::io;

/// Unified error type for the dictionary engine.
///
/// Every variant is fatal to the generation being built. None of them can
/// touch the previously published generation, because the manifest is only
/// rewritten after a build has fully succeeded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input record stream is unavailable or malformed.
    #[error("source read error: {0}")]
    SourceRead(String),

    /// Index cardinality mismatch, order violation, or an artifact that
    /// failed post-upload verification.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// An object-store operation failed (after any retries).
    #[error("storage error: {op} `{path}`: {source}")]
    Storage {
        op: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },

    /// The manifest lacks a field needed for an incremental build.
    /// Callers treat this as "fall back to a full bootstrap build".
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Artifact bytes failed to decode (bad magic, CRC mismatch, truncation).
    #[error("corruption: {0}")]
    Corruption(String),

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// Local disk IO (chunk files, staging directory).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn storage(op: &'static str, path: &str, source: io::Error) -> Self {
        Error::Storage {
            op,
            path: path.to_string(),
            source,
        }
    }

    /// True for errors the retrying store should attempt again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Storage { source, .. } => !matches!(
                source.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

/// Result type alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;
