use std::path::PathBuf;
use std::str::Utf8Error;

/// Errors raised while loading the extension and calling into it.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("library path `{}` contains a NUL byte", path.display())]
    InvalidPath { path: PathBuf },
    #[error("failed to load `{}`: {reason}", path.display())]
    Open { path: PathBuf, reason: String },
    #[error("symbol `{symbol}` not found: {reason}")]
    MissingSymbol { symbol: String, reason: String },
    #[error("`{symbol}` returned a null string")]
    NullString { symbol: String },
    #[error("`{symbol}` returned invalid utf-8")]
    InvalidUtf8 {
        symbol: String,
        #[source]
        source: Utf8Error,
    },
}

/// Result type for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;
