use std::io;

/// Why a single clip failed to import. Recorded in that clip's result; never
/// aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error("invalid import subdirectory")]
    BadSubdir,

    #[error("open {path}: {message}")]
    Open {
        path: String,
        kind: io::ErrorKind,
        message: String,
    },

    #[error("store {path}: {message}")]
    Store {
        path: String,
        kind: io::ErrorKind,
        message: String,
    },

    #[error("copy {path}: {message}")]
    Copy {
        path: String,
        kind: io::ErrorKind,
        message: String,
    },
}

impl ImportError {
    pub(crate) fn open(path: &str, err: &io::Error) -> Self {
        ImportError::Open {
            path: path.to_string(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub(crate) fn store(path: &str, err: &io::Error) -> Self {
        ImportError::Store {
            path: path.to_string(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub(crate) fn copy(path: &str, err: &io::Error) -> Self {
        ImportError::Copy {
            path: path.to_string(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// The underlying I/O error kind, if this came from an I/O failure.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            ImportError::BadSubdir => None,
            ImportError::Open { kind, .. }
            | ImportError::Store { kind, .. }
            | ImportError::Copy { kind, .. } => Some(*kind),
        }
    }
}
