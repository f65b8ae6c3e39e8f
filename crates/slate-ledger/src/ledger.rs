//! The take ledger: a sorted in-memory index mirrored by an append-only
//! CSV log.
//!
//! Every mutation is applied in memory, appended to the log and flushed.
//! If the append fails the index is restored to its pre-call state and the
//! ledger stops accepting writes, so the index never claims more than the
//! log holds.
//!
//! Reads take `&self` and mutations `&mut self`; callers sharing a ledger
//! across threads wrap it in a `RwLock`.

use crate::error::LedgerError;
use crate::index::TakeIndex;
use crate::row::LogRow;
use slate_core::{Take, TakeId};
use std::io::{self, Read, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
enum WriteState {
    Open,
    Closed,
    Broken(String),
}

pub struct TakeLedger<L> {
    log: L,
    index: TakeIndex,
    state: WriteState,
    /// The replayed log ended mid-line; the next append starts a new one.
    unterminated: bool,
}

/// Remembers the last byte read so replay can tell whether the log ends
/// with a line terminator.
struct TailReader<R> {
    inner: R,
    last: Option<u8>,
}

impl<R: Read> Read for TailReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.last = Some(buf[n - 1]);
        }
        Ok(n)
    }
}

impl<L: Read + Write> TakeLedger<L> {
    /// Replay `log` from its current position to the end, then use it for
    /// appends. A malformed row fails the open.
    pub fn open(mut log: L) -> Result<Self, LedgerError> {
        let mut index = TakeIndex::new();
        let mut rows = 0u64;
        let mut tail = TailReader {
            inner: &mut log,
            last: None,
        };
        {
            let mut rdr = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(&mut tail);
            for record in rdr.records() {
                let record = record.map_err(LedgerError::Read)?;
                let line = record.position().map(|p| p.line()).unwrap_or(rows + 1);
                let row = LogRow::parse(record.iter())
                    .map_err(|source| LedgerError::Parse { line, source })?;
                if row.is_delete {
                    index.remove(&row.take.id);
                } else {
                    index.upsert(row.take);
                }
                rows += 1;
            }
        }
        let unterminated = !matches!(tail.last, None | Some(b'\n' | b'\r'));
        tracing::debug!(rows, takes = index.len(), unterminated, "replayed take log");
        Ok(Self {
            log,
            index,
            state: WriteState::Open,
            unterminated,
        })
    }

    /// All takes in id order.
    pub fn list_takes(&self) -> &[Take] {
        self.index.list()
    }

    pub fn get_take(&self, id: &TakeId) -> Result<&Take, LedgerError> {
        self.index.get(id)
    }

    pub fn insert_take(&mut self, take: Take) -> Result<(), LedgerError> {
        self.mutate(|index| {
            index.insert(take.clone())?;
            Ok(vec![LogRow::record(take)])
        })
    }

    /// Replace the take at `id` with `take`. When `take.id` differs this is a
    /// move: the log gets a tombstone for `id` and a record for `take.id`.
    pub fn update_take(&mut self, id: &TakeId, take: Take) -> Result<(), LedgerError> {
        self.mutate(|index| {
            index.update(id, take.clone())?;
            let mut rows = Vec::with_capacity(2);
            if *id != take.id {
                rows.push(LogRow::tombstone(id.clone()));
            }
            rows.push(LogRow::record(take));
            Ok(rows)
        })
    }

    pub fn delete_take(&mut self, id: &TakeId) -> Result<(), LedgerError> {
        self.mutate(|index| {
            index.delete(id)?;
            Ok(vec![LogRow::tombstone(id.clone())])
        })
    }

    /// Flush the log and refuse all further writes.
    pub fn close(&mut self) -> Result<(), LedgerError> {
        self.check_writable()?;
        let res = self.log.flush();
        match res {
            Ok(()) => {
                self.state = WriteState::Closed;
                Ok(())
            }
            Err(e) => {
                self.state = WriteState::Broken(e.to_string());
                Err(LedgerError::Write(e))
            }
        }
    }

    pub fn is_writable(&self) -> bool {
        self.state == WriteState::Open
    }

    pub fn get_ref(&self) -> &L {
        &self.log
    }

    pub fn into_inner(self) -> L {
        self.log
    }

    fn check_writable(&self) -> Result<(), LedgerError> {
        match &self.state {
            WriteState::Open => Ok(()),
            WriteState::Closed => Err(LedgerError::Closed),
            WriteState::Broken(msg) => Err(LedgerError::Broken(msg.clone())),
        }
    }

    /// Apply `f` to the index and append the rows it returns. The index is
    /// restored from a snapshot if `f` or the append fails.
    fn mutate<F>(&mut self, f: F) -> Result<(), LedgerError>
    where
        F: FnOnce(&mut TakeIndex) -> Result<Vec<LogRow>, LedgerError>,
    {
        self.check_writable()?;
        let snapshot = self.index.clone();
        let rows = match f(&mut self.index) {
            Ok(rows) => rows,
            Err(e) => {
                self.index = snapshot;
                return Err(e);
            }
        };
        if let Err(e) = self.append(&rows) {
            self.index = snapshot;
            self.state = WriteState::Broken(e.to_string());
            tracing::error!(error = %e, "take log write failed; ledger is now read-only");
            return Err(LedgerError::Write(e));
        }
        Ok(())
    }

    fn append(&mut self, rows: &[LogRow]) -> io::Result<()> {
        let mut buf = Vec::new();
        if self.unterminated {
            buf.push(b'\n');
        }
        let mut w = csv::Writer::from_writer(buf);
        for row in rows {
            w.write_record(row.fields())?;
        }
        let bytes = w.into_inner().map_err(|e| e.into_error())?;
        self.log.write_all(&bytes)?;
        self.log.flush()?;
        self.unterminated = false;
        Ok(())
    }
}
