use crate::cmd_config::{self, SlateConfig};
use slate_ledger::SlatePaths;
use std::path::Path;

pub fn execute(repo_root: &Path) -> anyhow::Result<()> {
    let paths = SlatePaths::discover(repo_root);

    if paths.is_initialized() {
        println!("Already initialized at {}", paths.slate_dir.display());
        return Ok(());
    }

    paths.ensure_layout()?;
    if !paths.config_json.exists() {
        cmd_config::write_config(&paths.config_json, &SlateConfig::default())?;
    }

    println!("Initialized .slate/ at {}", paths.slate_dir.display());
    println!("Next: slate config set storage_dirs <dir>");
    Ok(())
}

/// Resolve the workspace for `repo_root`, failing if `slate init` hasn't run.
pub fn require(repo_root: &Path) -> anyhow::Result<SlatePaths> {
    let paths = SlatePaths::discover(repo_root);
    if !paths.is_initialized() {
        anyhow::bail!("No .slate/ workspace found. Run `slate init` first.");
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(require(tmp.path()).is_err());
        execute(tmp.path()).unwrap();
        let paths = require(tmp.path()).unwrap();
        assert!(paths.config_json.exists());

        cmd_config::set(tmp.path(), "include_red_magazine", "true").unwrap();
        execute(tmp.path()).unwrap();
        assert!(cmd_config::load(&paths).unwrap().include_red_magazine);
    }
}
