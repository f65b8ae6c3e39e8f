use crate::paths::SlatePaths;
use fs2::FileExt;
use std::fs::{File, OpenOptions};

/// Serializes writers of the take log across `slate` processes.
///
/// `TakeLedger` does no locking of its own, and each process replays the
/// log once at open; two writers holding stale indexes could both accept
/// the same take id. Every command that mutates the log, or imports and
/// then reconciles into it, holds this for its whole run. The flock on
/// `.slate/LOCK` is dropped with the guard or when the process exits.
pub struct WorkspaceLock {
    _file: File,
}

impl WorkspaceLock {
    /// Fails at once if another process is writing takes or importing.
    pub fn acquire(paths: &SlatePaths) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&paths.lock_file)
            .map_err(|e| {
                anyhow::anyhow!("cannot open take lock {}: {}", paths.lock_file.display(), e)
            })?;

        file.try_lock_exclusive().map_err(|_| {
            anyhow::anyhow!(
                "another slate command is importing or editing takes in {}; retry when it finishes",
                paths.root.display()
            )
        })?;

        Ok(Self { _file: file })
    }
}
