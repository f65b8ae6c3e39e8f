pub mod fanout;
pub mod fs;
pub mod source;
pub mod storage;

pub use fanout::FanOut;
pub use fs::{Entry, EntryKind, Filesystem, MemFilesystem, OsFilesystem, Walk};
pub use source::{DirectorySource, Source, SourceOptions};
pub use storage::{DirectoryStorage, MultiStorage, Sink, Storage};
