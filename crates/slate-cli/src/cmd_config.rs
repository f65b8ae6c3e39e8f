use clap::Subcommand;
use serde::{Deserialize, Serialize};
use slate_ledger::SlatePaths;
use std::io::Write;
use std::path::{Path, PathBuf};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. storage_dirs)
        key: String,
        /// Config value (JSON, or a bare string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
}

// ── Typed Config ──

/// `.slate/config.json`. Every field has a default so a missing or partial
/// file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlateConfig {
    /// Replica roots every import is copied into. Empty disables imports.
    pub storage_dirs: Vec<PathBuf>,
    /// Seed for the transfer-rate estimate before any bytes are copied.
    pub est_import_rate_mibps: u64,
    /// Import RED digital magazine files as a pseudo-clip.
    pub include_red_magazine: bool,
    /// Take log, relative to the workspace root.
    pub take_file: PathBuf,
}

impl Default for SlateConfig {
    fn default() -> Self {
        Self {
            storage_dirs: Vec::new(),
            est_import_rate_mibps: slate_import::ImporterConfig::default().est_rate_mibps,
            include_red_magazine: false,
            take_file: PathBuf::from(".slate").join("takes.csv"),
        }
    }
}

/// Load the typed config, falling back to defaults when the file is absent.
pub fn load(paths: &SlatePaths) -> anyhow::Result<SlateConfig> {
    let map = read_config(&paths.config_json)?;
    let config = serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| {
        anyhow::anyhow!("invalid config {}: {e}", paths.config_json.display())
    })?;
    Ok(config)
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, repo_root: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(repo_root, &key, &value),
        ConfigCmd::Get { key } => get(repo_root, &key),
        ConfigCmd::List => list(repo_root),
    }
}

// ── Command Implementations ──

/// Read `.slate/config.json` as a raw map. Empty if the file doesn't exist.
fn read_config(path: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    if !path.exists() {
        return Ok(serde_json::Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str::<serde_json::Value>(&content)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} is not a JSON object", path.display()),
    }
}

pub(crate) fn write_config(path: &Path, config: &SlateConfig) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    write_atomic(path, json.as_bytes())
}

/// Write through a temp file in the same directory, then rename over `path`.
fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// Parse a command-line value: JSON if it parses, otherwise a plain string.
/// A bare path given for `storage_dirs` becomes a one-element list.
fn parse_value(key: &str, s: &str) -> serde_json::Value {
    let val = serde_json::from_str(s).unwrap_or_else(|_| serde_json::Value::String(s.to_string()));
    match (key, val) {
        ("storage_dirs", serde_json::Value::String(dir)) => {
            serde_json::Value::Array(vec![serde_json::Value::String(dir)])
        }
        (_, val) => val,
    }
}

/// `slate config set <key> <value>`
pub fn set(repo_root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let paths = crate::cmd_init::require(repo_root)?;
    let mut map = read_config(&paths.config_json)?;
    map.insert(key.to_string(), parse_value(key, value));
    let config: SlateConfig = serde_json::from_value(serde_json::Value::Object(map))
        .map_err(|e| anyhow::anyhow!("cannot set {key}: {e}"))?;
    write_config(&paths.config_json, &config)?;
    println!("{key} = {value}");
    Ok(())
}

/// `slate config get <key>`
pub fn get(repo_root: &Path, key: &str) -> anyhow::Result<()> {
    let paths = crate::cmd_init::require(repo_root)?;
    let config = serde_json::to_value(load(&paths)?)?;
    match config.get(key) {
        Some(val) => println!("{val}"),
        None => anyhow::bail!("unknown config key: {key}"),
    }
    Ok(())
}

/// `slate config list`
pub fn list(repo_root: &Path) -> anyhow::Result<()> {
    let paths = crate::cmd_init::require(repo_root)?;
    if let serde_json::Value::Object(map) = serde_json::to_value(load(&paths)?)? {
        for (k, v) in &map {
            println!("{k} = {v}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> (tempfile::TempDir, SlatePaths) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = SlatePaths::discover(tmp.path());
        paths.ensure_layout().unwrap();
        (tmp, paths)
    }

    #[test]
    fn missing_file_loads_defaults() {
        let (_tmp, paths) = workspace();
        let config = load(&paths).unwrap();
        assert_eq!(config, SlateConfig::default());
        assert_eq!(config.est_import_rate_mibps, 60);
        assert_eq!(config.take_file, PathBuf::from(".slate/takes.csv"));
        assert!(config.storage_dirs.is_empty());
    }

    #[test]
    fn set_persists_typed_values() {
        let (tmp, paths) = workspace();
        set(tmp.path(), "storage_dirs", "/mnt/a").unwrap();
        set(tmp.path(), "include_red_magazine", "true").unwrap();
        set(tmp.path(), "est_import_rate_mibps", "120").unwrap();

        let config = load(&paths).unwrap();
        assert_eq!(config.storage_dirs, vec![PathBuf::from("/mnt/a")]);
        assert!(config.include_red_magazine);
        assert_eq!(config.est_import_rate_mibps, 120);

        set(tmp.path(), "storage_dirs", r#"["/mnt/a","/mnt/b"]"#).unwrap();
        assert_eq!(load(&paths).unwrap().storage_dirs.len(), 2);
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_types() {
        let (tmp, paths) = workspace();
        assert!(set(tmp.path(), "colour", "blue").is_err());
        assert!(set(tmp.path(), "est_import_rate_mibps", "fast").is_err());
        assert!(!paths.config_json.exists());
    }

    #[test]
    fn commands_require_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(set(tmp.path(), "take_file", "x.csv").is_err());
        assert!(list(tmp.path()).is_err());
    }
}
