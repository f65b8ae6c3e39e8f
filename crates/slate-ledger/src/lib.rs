pub mod error;
pub mod export;
pub mod index;
pub mod ledger;
pub mod lock;
pub mod log_file;
pub mod paths;
pub mod row;

pub use error::LedgerError;
pub use export::write_takes_csv;
pub use index::TakeIndex;
pub use ledger::TakeLedger;
pub use lock::WorkspaceLock;
pub use log_file::LogFile;
pub use paths::SlatePaths;
pub use row::{LogRow, RowError};
