//! Unified error type for the sysled-lib crate.
//!
//! [`LedError`] is what callers of the backends see. Probing failures are
//! described by [`ProbeError`], which stays local to a single candidate: it is
//! logged, the candidate is rolled back and the next one is tried. Only the
//! overall outcome surfaces as [`LedError::ProbeFailed`].

use std::fmt;

/// Unified error type for sysled-lib operations.
#[derive(Debug)]
pub enum LedError {
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
    /// No candidate path set of the backend probed successfully.
    ProbeFailed { backend: &'static str },
    /// No backend at all probed successfully.
    NoBackend,
    /// The backend does not implement the requested operation.
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },
    /// Backend name not recognised.
    UnknownBackend(String),
}

impl fmt::Display for LedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedError::Io(e) => write!(f, "I/O error: {e}"),
            LedError::ProbeFailed { backend } => {
                write!(f, "{backend}: no usable LED control files found")
            }
            LedError::NoBackend => write!(f, "No LED backend found"),
            LedError::Unsupported { backend, operation } => {
                write!(f, "{backend}: {operation} is not supported")
            }
            LedError::UnknownBackend(name) => write!(f, "Unknown backend: {name}"),
        }
    }
}

impl std::error::Error for LedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LedError {
    fn from(e: std::io::Error) -> Self {
        LedError::Io(e)
    }
}

/// Crate-level Result alias using [`LedError`].
pub type Result<T> = std::result::Result<T, LedError>;

/// Why a single candidate path set was rejected.
#[derive(Debug)]
pub enum ProbeError {
    /// A mandatory control file could not be opened in the required mode.
    Open {
        path: String,
        source: std::io::Error,
    },
    /// A control file opened but could not be read back.
    Read {
        path: String,
        source: std::io::Error,
    },
    /// A max_brightness file reported a non-positive range.
    InvalidMax { path: String, value: i32 },
}

impl ProbeError {
    pub(crate) fn open(path: &str, source: std::io::Error) -> Self {
        ProbeError::Open {
            path: path.to_string(),
            source,
        }
    }

    pub(crate) fn read(path: &str, source: std::io::Error) -> Self {
        ProbeError::Read {
            path: path.to_string(),
            source,
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Open { path, source } => write!(f, "{path}: open failed: {source}"),
            ProbeError::Read { path, source } => write!(f, "{path}: read failed: {source}"),
            ProbeError::InvalidMax { path, value } => {
                write!(f, "{path}: invalid max brightness {value}")
            }
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Open { source, .. } | ProbeError::Read { source, .. } => Some(source),
            ProbeError::InvalidMax { .. } => None,
        }
    }
}
