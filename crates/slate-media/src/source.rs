//! Clip sources: where footage is read from during an import.

use crate::fs::{EntryKind, Filesystem, OsFilesystem, Walk};
use slate_core::{natsort, Clip};
use std::collections::HashMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A set of clips that can be listed and read.
pub trait Source: Send + Sync {
    /// List every clip the source holds.
    fn list(&self) -> io::Result<Vec<Clip>>;

    /// Open one of a clip's files. `path` is relative to the source root.
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>>;
}

/// Options for [`DirectorySource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceOptions {
    /// List a RED card's `digital_magazine.bin` / `digital_magdynamic.bin`
    /// as an extra pseudo-clip.
    pub include_red_magazine: bool,
}

/// How clips are laid out on a card.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Layout {
    /// Every visible top-level file is its own clip.
    Flat,
    /// `<rdm>/<rdc>/<files>`: each `.RDC` directory is one clip.
    Red { rdm_name: String },
}

impl Layout {
    fn clip_name(&self, path: &str, opts: &SourceOptions) -> Option<String> {
        match self {
            Layout::Flat => {
                if path.contains('/') || path.starts_with('.') {
                    None
                } else {
                    Some(path.to_string())
                }
            }
            Layout::Red { rdm_name } => {
                let parts: Vec<&str> = path.split('/').collect();
                match parts.as_slice() {
                    [name] if opts.include_red_magazine && is_digital_magazine_name(name) => {
                        Some(format!("{rdm_name} digital_magazine"))
                    }
                    [rdm, rdc, _] if is_rdm_name(rdm) && is_rdc_name(rdc) => {
                        Some(format!("{rdm}/{rdc}"))
                    }
                    _ => None,
                }
            }
        }
    }

    fn descend(&self, path: &str) -> bool {
        match self {
            Layout::Flat => false,
            Layout::Red { .. } => {
                let parts: Vec<&str> = path.split('/').collect();
                match parts.as_slice() {
                    [rdm] => is_rdm_name(rdm),
                    [rdm, rdc] => is_rdm_name(rdm) && is_rdc_name(rdc),
                    _ => false,
                }
            }
        }
    }
}

fn is_digital_magazine_name(name: &str) -> bool {
    name == "digital_magazine.bin" || name == "digital_magdynamic.bin"
}

fn is_rdm_name(name: &str) -> bool {
    name.ends_with(".RDM") || name.ends_with(".rdm")
}

fn is_rdc_name(name: &str) -> bool {
    name.ends_with(".RDC") || name.ends_with(".rdc")
}

/// A card mounted as a local directory tree.
pub struct DirectorySource {
    root: PathBuf,
    fs: Arc<dyn Filesystem>,
    layout: Layout,
    opts: SourceOptions,
}

impl DirectorySource {
    /// Open the directory at `root`, inferring the clip layout from its
    /// top-level entries.
    pub fn open(root: impl Into<PathBuf>, opts: SourceOptions) -> io::Result<Self> {
        Self::with_filesystem(root, Arc::new(OsFilesystem), opts)
    }

    pub fn with_filesystem(
        root: impl Into<PathBuf>,
        fs: Arc<dyn Filesystem>,
        opts: SourceOptions,
    ) -> io::Result<Self> {
        let root = root.into();
        let names = fs.read_dir_names(&root)?;
        let layout = names
            .into_iter()
            .find(|n| is_rdm_name(n))
            .map(|rdm_name| Layout::Red { rdm_name })
            .unwrap_or(Layout::Flat);
        tracing::debug!(root = %root.display(), ?layout, "opened directory source");
        Ok(Self {
            root,
            fs,
            layout,
            opts,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Source for DirectorySource {
    fn list(&self) -> io::Result<Vec<Clip>> {
        let mut clips: HashMap<String, Clip> = HashMap::new();
        self.fs.walk(&self.root, &mut |entry| {
            let rel = self.relative(&entry.path);
            if entry.kind == EntryKind::Dir {
                if !rel.is_empty() && !self.layout.descend(&rel) {
                    return Ok(Walk::SkipDir);
                }
                return Ok(Walk::Continue);
            }
            if entry.kind != EntryKind::File {
                return Ok(Walk::Continue);
            }
            if let Some(name) = self.layout.clip_name(&rel, &self.opts) {
                let clip = clips
                    .entry(name.clone())
                    .or_insert_with(|| Clip::new(name));
                clip.paths.push(rel);
                clip.total_size += entry.size;
            }
            Ok(Walk::Continue)
        })?;

        let mut clips: Vec<Clip> = clips.into_values().collect();
        clips.sort_by(|a, b| natsort::compare(&a.name, &b.name));
        Ok(clips)
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        self.fs.open(&self.root.join(path))
    }
}
