//! Write-only blob storage keyed by relative path.

use crate::fanout::FanOut;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A writable destination that must be closed explicitly so durability
/// errors are observed.
pub trait Sink: Write + Send {
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Destination for imported files.
pub trait Storage: Send + Sync {
    /// Create a new blob at `path` (relative, `/`-separated).
    fn store(&self, path: &str) -> io::Result<Box<dyn Sink>>;
}

/// Storage that writes files beneath a single directory.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Storage for DirectoryStorage {
    /// Fails with `AlreadyExists` rather than overwriting an existing file.
    fn store(&self, path: &str) -> io::Result<Box<dyn Sink>> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)?;
        tracing::debug!(path = %full.display(), "storing");
        Ok(Box::new(SyncFile { file }))
    }
}

/// A file that is synced to stable storage when closed.
struct SyncFile {
    file: File,
}

impl Write for SyncFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Sink for SyncFile {
    fn close(self: Box<Self>) -> io::Result<()> {
        // The descriptor is released on drop, after the sync has reported.
        self.file.sync_all()
    }
}

/// Storage that replicates every blob to several backing storages.
pub struct MultiStorage {
    replicas: Vec<Box<dyn Storage>>,
}

impl MultiStorage {
    pub fn new(replicas: Vec<Box<dyn Storage>>) -> Self {
        Self { replicas }
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }
}

impl Storage for MultiStorage {
    /// Opens `path` on every replica. If any replica fails, the sinks that
    /// were already opened are closed and the first error is returned.
    fn store(&self, path: &str) -> io::Result<Box<dyn Sink>> {
        let mut sinks: Vec<Box<dyn Sink>> = Vec::with_capacity(self.replicas.len());
        for replica in &self.replicas {
            match replica.store(path) {
                Ok(sink) => sinks.push(sink),
                Err(e) => {
                    for sink in sinks {
                        if let Err(ce) = sink.close() {
                            tracing::warn!(path, error = %ce, "closing replica after failed store");
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(Box::new(FanOut::new(sinks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn directory_storage_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = DirectoryStorage::new(tmp.path());
        let mut sink = storage.store("DAY1/A001.RDM/clip.R3D").unwrap();
        sink.write_all(b"frames").unwrap();
        sink.close().unwrap();
        let written = std::fs::read(tmp.path().join("DAY1/A001.RDM/clip.R3D")).unwrap();
        assert_eq!(written, b"frames");
    }

    #[test]
    fn directory_storage_refuses_to_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.mov"), b"original").unwrap();
        let storage = DirectoryStorage::new(tmp.path());
        let err = storage.store("a.mov").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(tmp.path().join("a.mov")).unwrap(), b"original");
    }

    #[test]
    fn multi_storage_replicates() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let storage = MultiStorage::new(vec![
            Box::new(DirectoryStorage::new(a.path())),
            Box::new(DirectoryStorage::new(b.path())),
        ]);
        let mut sink = storage.store("x/a.mov").unwrap();
        sink.write_all(b"hello").unwrap();
        sink.close().unwrap();
        assert_eq!(std::fs::read(a.path().join("x/a.mov")).unwrap(), b"hello");
        assert_eq!(std::fs::read(b.path().join("x/a.mov")).unwrap(), b"hello");
    }

    /// Storage whose sinks record whether they were closed.
    struct TrackingStorage {
        closed: Arc<Mutex<Vec<String>>>,
    }

    struct TrackingSink {
        path: String,
        closed: Arc<Mutex<Vec<String>>>,
    }

    impl Write for TrackingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Sink for TrackingSink {
        fn close(self: Box<Self>) -> io::Result<()> {
            self.closed.lock().unwrap().push(self.path.clone());
            Ok(())
        }
    }

    impl Storage for TrackingStorage {
        fn store(&self, path: &str) -> io::Result<Box<dyn Sink>> {
            Ok(Box::new(TrackingSink {
                path: path.to_string(),
                closed: self.closed.clone(),
            }))
        }
    }

    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn store(&self, _path: &str) -> io::Result<Box<dyn Sink>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    #[test]
    fn multi_storage_closes_opened_sinks_on_failure() {
        let closed = Arc::new(Mutex::new(Vec::new()));
        let storage = MultiStorage::new(vec![
            Box::new(TrackingStorage {
                closed: closed.clone(),
            }),
            Box::new(TrackingStorage {
                closed: closed.clone(),
            }),
            Box::new(BrokenStorage),
        ]);
        let err = storage.store("a.mov").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(*closed.lock().unwrap(), vec!["a.mov", "a.mov"]);
    }

    #[test]
    fn multi_storage_existing_file_on_one_replica_fails() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::write(b.path().join("a.mov"), b"old").unwrap();
        let storage = MultiStorage::new(vec![
            Box::new(DirectoryStorage::new(a.path())),
            Box::new(DirectoryStorage::new(b.path())),
        ]);
        let err = storage.store("a.mov").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(b.path().join("a.mov")).unwrap(), b"old");
    }
}
