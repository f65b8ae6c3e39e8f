use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

/// The on-disk take log: read from the start, appended at the end, and
/// synced to disk on every flush.
#[derive(Debug)]
pub struct LogFile {
    file: File,
}

impl LogFile {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;
        Ok(Self { file })
    }
}

impl Read for LogFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_data()
    }
}
