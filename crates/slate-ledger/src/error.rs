use crate::row::RowError;
use slate_core::TakeId;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("take {id} not found")]
    NotFound { id: TakeId },

    #[error("take {id} already exists")]
    Exists { id: TakeId },

    #[error("parsing take log line {line}: {source}")]
    Parse {
        line: u64,
        #[source]
        source: RowError,
    },

    #[error("reading take log: {0}")]
    Read(#[source] csv::Error),

    #[error("writing take log: {0}")]
    Write(#[source] io::Error),

    #[error("write on closed take log")]
    Closed,

    #[error("take log unusable after an earlier write failure: {0}")]
    Broken(String),
}

impl LedgerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }

    pub fn is_exists(&self) -> bool {
        matches!(self, LedgerError::Exists { .. })
    }
}
