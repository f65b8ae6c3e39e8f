use crate::cmd_config;
use slate_core::Clip;
use slate_ledger::SlatePaths;
use slate_media::{DirectorySource, Source, SourceOptions};
use std::path::Path;

/// `slate source <path>`: list the clips on a card.
pub fn execute(repo_root: &Path, path: &Path, red_magazine: bool, json: bool) -> anyhow::Result<()> {
    let clips = list_clips(repo_root, path, red_magazine)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&clips)?);
        return Ok(());
    }
    if clips.is_empty() {
        println!("No clips found in {}", path.display());
        return Ok(());
    }
    for clip in &clips {
        println!(
            "{:<32} {:>12}  {} file(s)",
            clip.name,
            clip.total_size,
            clip.paths.len()
        );
    }
    Ok(())
}

pub(crate) fn list_clips(repo_root: &Path, path: &Path, red_magazine: bool) -> anyhow::Result<Vec<Clip>> {
    let paths = SlatePaths::discover(repo_root);
    let mut opts = SourceOptions::default();
    if paths.is_initialized() {
        opts.include_red_magazine = cmd_config::load(&paths)?.include_red_magazine;
    }
    opts.include_red_magazine |= red_magazine;

    let root = paths.resolve(path);
    let src = DirectorySource::open(&root, opts)
        .map_err(|e| anyhow::anyhow!("could not open source {}: {e}", root.display()))?;
    let clips = src
        .list()
        .map_err(|e| anyhow::anyhow!("could not list {}: {e}", root.display()))?;
    tracing::debug!(clips = clips.len(), root = %root.display(), "listed source");
    Ok(clips)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_flat_card_without_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        let card = tmp.path().join("card");
        std::fs::create_dir(&card).unwrap();
        std::fs::write(card.join("A010.mov"), b"0123").unwrap();
        std::fs::write(card.join("A002.mov"), b"01").unwrap();
        std::fs::write(card.join(".DS_Store"), b"x").unwrap();

        let clips = list_clips(tmp.path(), Path::new("card"), false).unwrap();
        let names: Vec<&str> = clips.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A002.mov", "A010.mov"]);
        assert_eq!(clips[1].total_size, 4);
    }

    #[test]
    fn missing_source_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(list_clips(tmp.path(), Path::new("nope"), false).is_err());
    }
}
