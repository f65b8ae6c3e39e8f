//! A writer that duplicates each write to several writers concurrently.

use crate::storage::Sink;
use std::io::{self, Write};
use std::thread;

/// Duplicates writes to every inner writer, one thread per writer per call.
pub struct FanOut<W> {
    writers: Vec<W>,
}

impl<W: Write + Send> FanOut<W> {
    pub fn new(writers: Vec<W>) -> Self {
        Self { writers }
    }

    pub fn into_inner(self) -> Vec<W> {
        self.writers
    }

    /// Write `buf` to every writer and wait for all of them.
    ///
    /// Returns the byte count of the shortest failed write together with its
    /// error, or `buf.len()` if every writer took the whole buffer. A writer
    /// that accepts fewer bytes without an error counts as a short write.
    pub fn write_each(&mut self, buf: &[u8]) -> (usize, io::Result<()>) {
        let results: Vec<(usize, io::Result<()>)> = if self.writers.len() == 1 {
            vec![write_once(&mut self.writers[0], buf)]
        } else {
            thread::scope(|s| {
                let handles: Vec<_> = self
                    .writers
                    .iter_mut()
                    .map(|w| s.spawn(move || write_once(w, buf)))
                    .collect();
                handles
                    .into_iter()
                    .map(|h| {
                        h.join()
                            .unwrap_or_else(|_| (0, Err(io::Error::other("replica writer panicked"))))
                    })
                    .collect()
            })
        };

        let mut end: (usize, io::Result<()>) = (buf.len(), Ok(()));
        for (n, res) in results {
            if res.is_err() && (end.1.is_ok() || n < end.0) {
                end = (n, res);
            }
        }
        end
    }
}

fn write_once<W: Write>(w: &mut W, buf: &[u8]) -> (usize, io::Result<()>) {
    match w.write(buf) {
        Ok(n) if n < buf.len() => (n, Err(io::Error::new(io::ErrorKind::WriteZero, "short write"))),
        Ok(n) => (n, Ok(())),
        Err(e) => (0, Err(e)),
    }
}

impl<W: Write + Send> Write for FanOut<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let (n, res) = self.write_each(buf);
        res.map(|()| n)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut first = Ok(());
        for w in &mut self.writers {
            let res = w.flush();
            if first.is_ok() {
                first = res;
            }
        }
        first
    }
}

impl Sink for FanOut<Box<dyn Sink>> {
    /// Closes every sink. Only the first error is returned; later ones are
    /// logged.
    fn close(self: Box<Self>) -> io::Result<()> {
        let mut first: io::Result<()> = Ok(());
        for sink in self.writers {
            if let Err(e) = sink.close() {
                if first.is_ok() {
                    first = Err(e);
                } else {
                    tracing::warn!(error = %e, "additional replica close failure");
                }
            }
        }
        first
    }
}
