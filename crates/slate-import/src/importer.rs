//! Copies clips from a [`Source`] into [`Storage`] with pollable progress.

use crate::error::ImportError;
use crate::status::{ImportResult, ImportStatus};
use crossbeam_channel::{Receiver, Sender};
use slate_core::Clip;
use slate_media::{Source, Storage};
use std::io::{self, Read, Write};
use std::path::{Path, MAIN_SEPARATOR};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use time::OffsetDateTime;

/// Size of each read/write during a file copy. Progress is published at
/// this granularity.
pub const CHUNK_SIZE: usize = 32 * 1024;

const MIB: u64 = 1 << 20;

#[derive(Debug, Clone, Copy)]
pub struct ImporterConfig {
    /// Copy rate assumed before any bytes have been measured, in MiB/s.
    pub est_rate_mibps: u64,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self { est_rate_mibps: 60 }
    }
}

/// Linear extrapolation: how long `n` more bytes take if `written` bytes
/// took `elapsed`.
pub fn estimate_time(n: u64, written: u64, elapsed: Duration) -> Duration {
    if n == 0 || written == 0 {
        return Duration::ZERO;
    }
    let nanos = elapsed.as_nanos() * u128::from(n) / u128::from(written);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Observed copy rate, accumulated across imports.
#[derive(Debug, Clone, Copy)]
struct Rate {
    copied: u64,
    elapsed: Duration,
}

impl Rate {
    fn estimate(&self, remaining: u64) -> Duration {
        estimate_time(remaining, self.copied, self.elapsed)
    }
}

/// Copies batches of clips into storage.
///
/// One [`import`](Importer::import) may run at a time; callers serialize
/// imports themselves. [`status`](Importer::status) may be called from any
/// thread at any time.
pub struct Importer {
    storage: Box<dyn Storage>,
    rate: Mutex<Rate>,
    last: Mutex<ImportStatus>,
    updates: Mutex<Option<Receiver<ImportStatus>>>,
    waiting: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn add_eta(t: OffsetDateTime, d: Duration) -> OffsetDateTime {
    time::Duration::try_from(d)
        .ok()
        .and_then(|d| t.checked_add(d))
        .unwrap_or(t)
}

impl Importer {
    pub fn new(storage: Box<dyn Storage>, config: ImporterConfig) -> Self {
        Self {
            storage,
            rate: Mutex::new(Rate {
                copied: config.est_rate_mibps * MIB,
                elapsed: Duration::from_secs(1),
            }),
            last: Mutex::new(ImportStatus::default()),
            updates: Mutex::new(None),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Snapshot of the importer's progress.
    ///
    /// While an import is running this blocks until the copy loop reaches
    /// its next chunk boundary, so the snapshot is at most one chunk stale.
    /// Pollers are served one at a time.
    pub fn status(&self) -> ImportStatus {
        let updates = lock(&self.updates);
        if let Some(rx) = updates.as_ref() {
            self.waiting.fetch_add(1, Ordering::SeqCst);
            let got = rx.recv();
            self.waiting.fetch_sub(1, Ordering::SeqCst);
            if let Ok(st) = got {
                return st;
            }
        }
        drop(updates);
        lock(&self.last).clone()
    }

    /// Copy every file of every clip from `src` into storage under
    /// `subdir`, returning the final status.
    ///
    /// A clip that fails is recorded in its result and skipped; the batch
    /// always runs to the end of `clips`.
    pub fn import(&self, src: &dyn Source, subdir: &str, clips: Vec<Clip>) -> ImportStatus {
        let (tx, rx) = crossbeam_channel::bounded(0);
        let start = OffsetDateTime::now_utc();
        let bytes_total: u64 = clips.iter().map(|c| c.total_size).sum();
        let eta = add_eta(start, lock(&self.rate).estimate(bytes_total));
        let mut status = ImportStatus {
            active: true,
            bytes_copied: 0,
            bytes_total,
            start,
            eta,
            pending: clips.iter().cloned().collect(),
            results: Vec::with_capacity(clips.len()),
        };
        *lock(&self.last) = status.clone();
        *lock(&self.updates) = Some(rx);
        tracing::info!(clips = clips.len(), bytes = bytes_total, subdir, "import started");

        let target = clean_subdir(subdir);
        for clip in clips {
            let result = self.import_clip(src, &target, clip, &mut status, &tx);
            if let Some(err) = &result.error {
                tracing::warn!(clip = %result.clip.name, error = %err, "clip import failed");
            }
            status.pending.pop_front();
            status.results.push(result);
            self.offer(&tx, &status);
        }

        status.active = false;
        *lock(&self.last) = status.clone();
        // Wake any blocked poller before releasing the slot it holds.
        drop(tx);
        *lock(&self.updates) = None;
        tracing::info!(
            copied = status.bytes_copied,
            total = status.bytes_total,
            failed = status.failed().count(),
            "import finished"
        );
        status
    }

    fn import_clip(
        &self,
        src: &dyn Source,
        target: &Result<Option<String>, ImportError>,
        clip: Clip,
        status: &mut ImportStatus,
        tx: &Sender<ImportStatus>,
    ) -> ImportResult {
        let start = OffsetDateTime::now_utc();
        let timer = Instant::now();
        let mut clip_written = 0u64;
        let mut error = None;
        for file in &clip.paths {
            let mut file_written = 0u64;
            let res = match target {
                Ok(subdir) => self.copy_file(src, subdir.as_deref(), file, &mut file_written, status, tx),
                Err(e) => Err(e.clone()),
            };
            clip_written += file_written;
            if let Err(e) = res {
                let unattempted = clip.total_size.saturating_sub(clip_written);
                status.bytes_total = status.bytes_total.saturating_sub(unattempted);
                error = Some(e);
                break;
            }
        }
        let end = OffsetDateTime::now_utc();

        let remaining = status.bytes_total.saturating_sub(status.bytes_copied);
        let estimate = {
            let mut rate = lock(&self.rate);
            rate.copied += clip_written;
            rate.elapsed += timer.elapsed();
            rate.estimate(remaining)
        };
        status.eta = add_eta(end, estimate);

        ImportResult {
            clip,
            error,
            start,
            end,
        }
    }

    fn copy_file(
        &self,
        src: &dyn Source,
        subdir: Option<&str>,
        file: &str,
        written: &mut u64,
        status: &mut ImportStatus,
        tx: &Sender<ImportStatus>,
    ) -> Result<(), ImportError> {
        let mut reader = src.open(file).map_err(|e| ImportError::open(file, &e))?;
        let out = match subdir {
            Some(dir) => format!("{dir}/{file}"),
            None => file.to_string(),
        };
        let mut sink = self
            .storage
            .store(&out)
            .map_err(|e| ImportError::store(&out, &e))?;
        tracing::debug!(from = file, to = %out, "copying file");

        let mut buf = vec![0u8; CHUNK_SIZE];
        let copied = loop {
            let nr = match reader.read(&mut buf) {
                Ok(0) => break Ok(()),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(ImportError::copy(file, &e)),
            };
            let nw = match sink.write(&buf[..nr]) {
                Ok(n) => n,
                Err(e) => break Err(ImportError::store(&out, &e)),
            };
            *written += nw as u64;
            status.bytes_copied += nw as u64;
            if nw < nr {
                let short = io::Error::new(io::ErrorKind::WriteZero, "short write");
                break Err(ImportError::store(&out, &short));
            }
            self.offer(tx, status);
        };
        let closed = sink.close().map_err(|e| ImportError::store(&out, &e));
        copied.and(closed)
    }

    /// Hand a snapshot to a poller blocked in [`status`](Importer::status),
    /// if there is one. Never blocks the copy loop.
    fn offer(&self, tx: &Sender<ImportStatus>, status: &ImportStatus) {
        if self.waiting.load(Ordering::SeqCst) > 0 {
            let _ = tx.try_send(status.clone());
        }
    }
}

/// Normalize `subdir` lexically and reject anything that would escape the
/// storage root. `Ok(None)` means "no subdirectory".
fn clean_subdir(subdir: &str) -> Result<Option<String>, ImportError> {
    if subdir.is_empty() {
        return Ok(None);
    }
    if subdir.starts_with('/') || Path::new(subdir).is_absolute() {
        return Err(ImportError::BadSubdir);
    }
    let mut parts: Vec<&str> = Vec::new();
    for part in subdir.split(|c| c == '/' || c == MAIN_SEPARATOR) {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(p) if *p != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            p => parts.push(p),
        }
    }
    if parts.first() == Some(&"..") {
        return Err(ImportError::BadSubdir);
    }
    if parts.is_empty() {
        return Ok(None);
    }
    Ok(Some(parts.join("/")))
}
