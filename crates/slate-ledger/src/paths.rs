use std::path::{Path, PathBuf};

/// Well-known paths under `.slate/`.
#[derive(Debug, Clone)]
pub struct SlatePaths {
    pub root: PathBuf,
    pub slate_dir: PathBuf,
    pub config_json: PathBuf,
    pub takes_csv: PathBuf,
    pub lock_file: PathBuf,
}

impl SlatePaths {
    /// Derive all paths from a workspace root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let slate_dir = root.join(".slate");
        Self {
            config_json: slate_dir.join("config.json"),
            takes_csv: slate_dir.join("takes.csv"),
            lock_file: slate_dir.join("LOCK"),
            slate_dir,
            root,
        }
    }

    /// Create `.slate/`. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.slate_dir)?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.slate_dir.is_dir()
    }

    /// Resolve a path from config relative to the workspace root.
    pub fn resolve(&self, p: impl AsRef<Path>) -> PathBuf {
        self.root.join(p)
    }

    /// Walk up from `start` looking for a directory containing `.slate/`.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut cur = start.to_path_buf();
        loop {
            if cur.join(".slate").is_dir() {
                return Some(cur);
            }
            if !cur.pop() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_builds_paths() {
        let p = SlatePaths::discover("/tmp/shoot");
        assert_eq!(p.slate_dir, PathBuf::from("/tmp/shoot/.slate"));
        assert_eq!(p.config_json, PathBuf::from("/tmp/shoot/.slate/config.json"));
        assert_eq!(p.takes_csv, PathBuf::from("/tmp/shoot/.slate/takes.csv"));
        assert_eq!(p.lock_file, PathBuf::from("/tmp/shoot/.slate/LOCK"));
        assert_eq!(p.resolve("a/b"), PathBuf::from("/tmp/shoot/a/b"));
        assert_eq!(p.resolve("/abs"), PathBuf::from("/abs"));
    }

    #[test]
    fn ensure_layout_and_find_root() {
        let tmp = tempfile::tempdir().unwrap();
        let p = SlatePaths::discover(tmp.path());
        assert!(!p.is_initialized());
        p.ensure_layout().unwrap();
        p.ensure_layout().unwrap();
        assert!(p.is_initialized());

        let nested = tmp.path().join("day1").join("cards");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(SlatePaths::find_root(&nested), Some(tmp.path().to_path_buf()));
    }
}
