use crate::{cmd_config, cmd_init};
use anyhow::Context;
use clap::Subcommand;
use slate_core::{Take, TakeId};
use slate_ledger::{write_takes_csv, LedgerError, LogFile, SlatePaths, TakeLedger, WorkspaceLock};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum TakeCmd {
    /// List all takes in scene/take order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one take
    Get {
        scene: String,
        num: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a new take
    Add {
        scene: String,
        num: String,
        /// Clip recorded for this take
        #[arg(long, default_value = "")]
        clip: String,
        /// Mark the take as a select
        #[arg(long)]
        select: bool,
    },
    /// Edit a take, creating it if it doesn't exist
    Update {
        scene: String,
        num: String,
        /// Move the take to another scene
        #[arg(long = "to-scene")]
        to_scene: Option<String>,
        /// Move the take to another take number
        #[arg(long = "to-num")]
        to_num: Option<String>,
        #[arg(long)]
        clip: Option<String>,
        #[arg(long)]
        select: Option<bool>,
    },
    /// Delete a take
    Delete { scene: String, num: String },
    /// Export all takes as CSV
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

// ── Dispatch ──

pub fn run(cmd: TakeCmd, repo_root: &Path) -> anyhow::Result<()> {
    let paths = cmd_init::require(repo_root)?;
    match cmd {
        TakeCmd::List { json } => list(&paths, json),
        TakeCmd::Get { scene, num, json } => get(&paths, &TakeId::new(scene, num), json),
        TakeCmd::Add {
            scene,
            num,
            clip,
            select,
        } => add(&paths, Take::new(TakeId::new(scene, num), clip, select)),
        TakeCmd::Update {
            scene,
            num,
            to_scene,
            to_num,
            clip,
            select,
        } => {
            let edit = TakeEdit {
                scene: to_scene,
                num: to_num,
                clip,
                select,
            };
            update(&paths, &TakeId::new(scene, num), &edit)
        }
        TakeCmd::Delete { scene, num } => delete(&paths, &TakeId::new(scene, num)),
        TakeCmd::Export { output } => export(&paths, output.as_deref()),
    }
}

/// Open the configured take log for reading and appending.
pub fn open_ledger(paths: &SlatePaths) -> anyhow::Result<TakeLedger<LogFile>> {
    let config = cmd_config::load(paths)?;
    let path = paths.resolve(&config.take_file);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log = LogFile::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let ledger = TakeLedger::open(log).with_context(|| format!("loading {}", path.display()))?;
    Ok(ledger)
}

// ── Command Implementations ──

fn list(paths: &SlatePaths, json: bool) -> anyhow::Result<()> {
    let ledger = open_ledger(paths)?;
    let takes = ledger.list_takes();
    if json {
        println!("{}", serde_json::to_string_pretty(takes)?);
        return Ok(());
    }
    if takes.is_empty() {
        println!("(no takes logged)");
    }
    for t in takes {
        println!("{}", format_take(t));
    }
    Ok(())
}

fn get(paths: &SlatePaths, id: &TakeId, json: bool) -> anyhow::Result<()> {
    let ledger = open_ledger(paths)?;
    let take = ledger.get_take(id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(take)?);
    } else {
        println!("{}", format_take(take));
    }
    Ok(())
}

fn add(paths: &SlatePaths, take: Take) -> anyhow::Result<()> {
    let _lock = WorkspaceLock::acquire(paths)?;
    let mut ledger = open_ledger(paths)?;
    let id = take.id.clone();
    ledger.insert_take(take)?;
    ledger.close()?;
    println!("Added take {id}");
    Ok(())
}

/// Fields to change on `take update`; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct TakeEdit {
    pub scene: Option<String>,
    pub num: Option<String>,
    pub clip: Option<String>,
    pub select: Option<bool>,
}

fn update(paths: &SlatePaths, id: &TakeId, edit: &TakeEdit) -> anyhow::Result<()> {
    let _lock = WorkspaceLock::acquire(paths)?;
    let mut ledger = open_ledger(paths)?;
    let take = upsert_take(&mut ledger, id, edit)?;
    ledger.close()?;
    println!("Updated take {}", take.id);
    Ok(())
}

/// Apply `edit` to the take at `id`. A missing take is created, unless the
/// edit moves it to another id.
pub fn upsert_take<L: Read + Write>(
    ledger: &mut TakeLedger<L>,
    id: &TakeId,
    edit: &TakeEdit,
) -> anyhow::Result<Take> {
    let mut take = match ledger.get_take(id) {
        Ok(t) => t.clone(),
        Err(e) if e.is_not_found() => Take::new(id.clone(), "", false),
        Err(e) => return Err(e.into()),
    };
    if let Some(scene) = &edit.scene {
        take.id.scene = scene.clone();
    }
    if let Some(num) = &edit.num {
        take.id.num = num.clone();
    }
    if let Some(clip) = &edit.clip {
        take.clip_name = clip.clone();
    }
    if let Some(select) = edit.select {
        take.select = select;
    }

    match ledger.update_take(id, take.clone()) {
        Ok(()) => {}
        Err(LedgerError::NotFound { .. }) if *id != take.id => {
            anyhow::bail!("take {id} does not exist")
        }
        Err(LedgerError::NotFound { .. }) => ledger.insert_take(take.clone())?,
        Err(e) => return Err(e.into()),
    }
    Ok(take)
}

fn delete(paths: &SlatePaths, id: &TakeId) -> anyhow::Result<()> {
    let _lock = WorkspaceLock::acquire(paths)?;
    let mut ledger = open_ledger(paths)?;
    match ledger.delete_take(id) {
        Err(e) if e.is_not_found() => anyhow::bail!("take {id} does not exist"),
        res => res?,
    }
    ledger.close()?;
    println!("Deleted take {id}");
    Ok(())
}

fn export(paths: &SlatePaths, output: Option<&Path>) -> anyhow::Result<()> {
    let ledger = open_ledger(paths)?;
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_takes_csv(ledger.list_takes(), std::io::BufWriter::new(file))?;
            eprintln!("Exported {} takes to {}", ledger.list_takes().len(), path.display());
        }
        None => write_takes_csv(ledger.list_takes(), std::io::stdout().lock())?,
    }
    Ok(())
}

fn format_take(t: &Take) -> String {
    format!(
        "{:<8} {:<6} {:<32} {}",
        t.id.scene,
        t.id.num,
        t.clip_name,
        if t.select { "select" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ledger(log: &str) -> TakeLedger<Cursor<Vec<u8>>> {
        TakeLedger::open(Cursor::new(log.as_bytes().to_vec())).unwrap()
    }

    #[test]
    fn upsert_creates_missing_take() {
        let mut l = ledger("");
        let edit = TakeEdit {
            clip: Some("A001".into()),
            select: Some(true),
            ..TakeEdit::default()
        };
        upsert_take(&mut l, &TakeId::new("1", "1"), &edit).unwrap();
        assert_eq!(
            l.list_takes(),
            &[Take::new(TakeId::new("1", "1"), "A001", true)]
        );
    }

    #[test]
    fn upsert_keeps_unedited_fields() {
        let mut l = ledger("1,1,A001,true,false\n");
        let edit = TakeEdit {
            num: Some("2".into()),
            ..TakeEdit::default()
        };
        upsert_take(&mut l, &TakeId::new("1", "1"), &edit).unwrap();
        assert_eq!(
            l.list_takes(),
            &[Take::new(TakeId::new("1", "2"), "A001", true)]
        );
    }

    #[test]
    fn upsert_move_of_missing_take_fails() {
        let mut l = ledger("");
        let edit = TakeEdit {
            scene: Some("2".into()),
            ..TakeEdit::default()
        };
        let err = upsert_take(&mut l, &TakeId::new("1", "1"), &edit).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(l.list_takes().is_empty());
    }

    #[test]
    fn commands_round_trip_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        cmd_init::execute(tmp.path()).unwrap();
        let paths = cmd_init::require(tmp.path()).unwrap();

        add(&paths, Take::new(TakeId::new("3", "1"), "B001", false)).unwrap();
        assert!(add(&paths, Take::new(TakeId::new("3", "1"), "B002", false)).is_err());
        let edit = TakeEdit {
            select: Some(true),
            ..TakeEdit::default()
        };
        update(&paths, &TakeId::new("3", "1"), &edit).unwrap();
        delete(&paths, &TakeId::new("3", "1")).unwrap();
        assert!(delete(&paths, &TakeId::new("3", "1")).is_err());
        add(&paths, Take::new(TakeId::new("3", "2"), "B003", true)).unwrap();

        let out = tmp.path().join("takes-export.csv");
        export(&paths, Some(&out)).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "Scene,Take,Clip Name,Select\n3,2,B003,TRUE\n"
        );
        assert_eq!(open_ledger(&paths).unwrap().list_takes().len(), 1);
    }
}
