pub mod error;
pub mod importer;
pub mod status;

pub use error::ImportError;
pub use importer::{estimate_time, Importer, ImporterConfig, CHUNK_SIZE};
pub use status::{ImportResult, ImportStatus};
