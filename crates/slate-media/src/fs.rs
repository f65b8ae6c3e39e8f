//! Narrow filesystem capability used by [`DirectorySource`](crate::DirectorySource).
//!
//! [`OsFilesystem`] talks to the real disk; [`MemFilesystem`] is an in-memory
//! tree for deterministic tests.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// One node visited during a walk.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Length in bytes; zero for anything but regular files.
    pub size: u64,
}

/// Returned by a walk visitor to steer the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    /// Do not descend into the directory just visited.
    SkipDir,
}

pub trait Filesystem: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    /// Visit `root` and everything below it, parents before children,
    /// siblings in lexical order. The first visitor error aborts the walk.
    fn walk(
        &self,
        root: &Path,
        visit: &mut dyn FnMut(&Entry) -> io::Result<Walk>,
    ) -> io::Result<()>;

    fn read_dir_names(&self, path: &Path) -> io::Result<Vec<String>>;
}

/// The real operating-system filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(std::fs::File::open(path)?))
    }

    fn walk(
        &self,
        root: &Path,
        visit: &mut dyn FnMut(&Entry) -> io::Result<Walk>,
    ) -> io::Result<()> {
        let mut it = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        while let Some(entry) = it.next() {
            let entry = entry.map_err(io::Error::from)?;
            let ft = entry.file_type();
            let (kind, size) = if ft.is_file() {
                let meta = entry.metadata().map_err(io::Error::from)?;
                (EntryKind::File, meta.len())
            } else if ft.is_dir() {
                (EntryKind::Dir, 0)
            } else {
                (EntryKind::Other, 0)
            };
            let step = visit(&Entry {
                path: entry.path().to_path_buf(),
                kind,
                size,
            })?;
            if step == Walk::SkipDir && kind == EntryKind::Dir {
                it.skip_current_dir();
            }
        }
        Ok(())
    }

    fn read_dir_names(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            names.push(entry?.file_name().to_string_lossy().to_string());
        }
        Ok(names)
    }
}

#[derive(Debug, Clone)]
enum MemFile {
    Data(Vec<u8>),
    Sized(u64),
}

impl MemFile {
    fn len(&self) -> u64 {
        match self {
            MemFile::Data(d) => d.len() as u64,
            MemFile::Sized(n) => *n,
        }
    }
}

/// In-memory directory tree. Parent directories are created implicitly.
#[derive(Debug, Clone, Default)]
pub struct MemFilesystem {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, MemFile>,
}

impl MemFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        for anc in path.as_ref().ancestors() {
            if anc.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(anc.to_path_buf());
        }
        self
    }

    pub fn add_file(&mut self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) -> &mut Self {
        self.insert(path.as_ref(), MemFile::Data(data.into()))
    }

    /// Add a file that reports `size` bytes and reads back as zeros, for
    /// listing tests that need realistic sizes without the memory.
    pub fn add_sized_file(&mut self, path: impl AsRef<Path>, size: u64) -> &mut Self {
        self.insert(path.as_ref(), MemFile::Sized(size))
    }

    fn insert(&mut self, path: &Path, file: MemFile) -> &mut Self {
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.insert(path.to_path_buf(), file);
        self
    }

    fn children(&self, dir: &Path) -> Vec<(PathBuf, EntryKind)> {
        let mut out: Vec<(PathBuf, EntryKind)> = self
            .dirs
            .iter()
            .filter(|d| d.parent() == Some(dir))
            .map(|d| (d.clone(), EntryKind::Dir))
            .chain(
                self.files
                    .keys()
                    .filter(|f| f.parent() == Some(dir))
                    .map(|f| (f.clone(), EntryKind::File)),
            )
            .collect();
        out.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));
        out
    }

    fn walk_from(
        &self,
        path: &Path,
        kind: EntryKind,
        visit: &mut dyn FnMut(&Entry) -> io::Result<Walk>,
    ) -> io::Result<()> {
        let size = self.files.get(path).map(MemFile::len).unwrap_or(0);
        let step = visit(&Entry {
            path: path.to_path_buf(),
            kind,
            size,
        })?;
        if kind != EntryKind::Dir || step == Walk::SkipDir {
            return Ok(());
        }
        for (child, kind) in self.children(path) {
            self.walk_from(&child, kind, visit)?;
        }
        Ok(())
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file or directory", path.display()),
    )
}

impl Filesystem for MemFilesystem {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        match self.files.get(path) {
            Some(MemFile::Data(d)) => Ok(Box::new(io::Cursor::new(d.clone()))),
            Some(MemFile::Sized(n)) => Ok(Box::new(io::repeat(0).take(*n))),
            None => Err(not_found(path)),
        }
    }

    fn walk(
        &self,
        root: &Path,
        visit: &mut dyn FnMut(&Entry) -> io::Result<Walk>,
    ) -> io::Result<()> {
        if self.dirs.contains(root) {
            self.walk_from(root, EntryKind::Dir, visit)
        } else if self.files.contains_key(root) {
            self.walk_from(root, EntryKind::File, visit)
        } else {
            Err(not_found(root))
        }
    }

    fn read_dir_names(&self, path: &Path) -> io::Result<Vec<String>> {
        if !self.dirs.contains(path) {
            return Err(not_found(path));
        }
        Ok(self
            .children(path)
            .into_iter()
            .filter_map(|(p, _)| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect())
    }
}
