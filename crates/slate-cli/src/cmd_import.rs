use crate::{cmd_config, cmd_init, cmd_take};
use anyhow::Context;
use serde::Deserialize;
use slate_core::{Clip, Take, TakeId};
use slate_import::{ImportStatus, Importer, ImporterConfig};
use slate_ledger::{TakeLedger, WorkspaceLock};
use slate_media::{DirectorySource, DirectoryStorage, MultiStorage, Source, SourceOptions, Storage};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// A batch of clips to copy off one card, each tagged with the take it
/// belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportJob {
    /// Card root; relative paths resolve against the workspace root.
    pub path: PathBuf,
    #[serde(default)]
    pub subdirectory: String,
    pub items: Vec<ImportItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportItem {
    pub clip: Clip,
    #[serde(default)]
    pub scene: String,
    #[serde(default)]
    pub num: String,
    #[serde(default)]
    pub select: bool,
}

impl ImportItem {
    pub fn take(&self) -> Take {
        Take::new(
            TakeId::new(self.scene.clone(), self.num.clone()),
            self.clip.name.clone(),
            self.select,
        )
    }
}

/// `slate import <job.json>`
pub fn execute(repo_root: &Path, job_path: &Path) -> anyhow::Result<()> {
    let paths = cmd_init::require(repo_root)?;
    let config = cmd_config::load(&paths)?;
    if config.storage_dirs.is_empty() {
        anyhow::bail!("imports are disabled: set storage_dirs with `slate config set storage_dirs <dir>`");
    }
    let content = std::fs::read_to_string(job_path)
        .with_context(|| format!("reading {}", job_path.display()))?;
    let job: ImportJob =
        serde_json::from_str(&content).context("could not parse job")?;

    let _lock = WorkspaceLock::acquire(&paths)?;

    let card = paths.resolve(&job.path);
    let opts = SourceOptions {
        include_red_magazine: config.include_red_magazine,
    };
    let src = DirectorySource::open(&card, opts)
        .map_err(|e| anyhow::anyhow!("could not open source {}: {e}", card.display()))?;
    let replicas: Vec<Box<dyn Storage>> = config
        .storage_dirs
        .iter()
        .map(|dir| Box::new(DirectoryStorage::new(paths.resolve(dir))) as Box<dyn Storage>)
        .collect();
    let importer = Importer::new(
        Box::new(MultiStorage::new(replicas)),
        ImporterConfig {
            est_rate_mibps: config.est_import_rate_mibps,
        },
    );

    let clips = job.items.iter().map(|item| item.clip.clone()).collect();
    let status = run_with_progress(&importer, &src, &job.subdirectory, clips)?;
    println!("{}", serde_json::to_string_pretty(&status)?);

    let mut ledger = cmd_take::open_ledger(&paths)?;
    let added = add_takes_from_import(&mut ledger, &job.items, &status);
    ledger.close()?;
    tracing::info!(added, "takes added");

    let failed = status.failed().count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} clips failed to import", status.results.len());
    }
    Ok(())
}

/// Run the import on a worker thread, logging progress from this one until
/// it finishes.
fn run_with_progress(
    importer: &Importer,
    src: &dyn Source,
    subdir: &str,
    clips: Vec<Clip>,
) -> anyhow::Result<ImportStatus> {
    let done = AtomicBool::new(false);
    std::thread::scope(|s| {
        let done = &done;
        let worker = s.spawn(move || {
            let status = importer.import(src, subdir, clips);
            done.store(true, Ordering::SeqCst);
            status
        });

        let mut last_report = Instant::now();
        while !done.load(Ordering::SeqCst) {
            let st = importer.status();
            if st.active && last_report.elapsed() >= PROGRESS_INTERVAL {
                tracing::info!(
                    copied = st.bytes_copied,
                    total = st.bytes_total,
                    pending = st.pending.len(),
                    eta = %st.eta,
                    "importing"
                );
                last_report = Instant::now();
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        worker
            .join()
            .map_err(|_| anyhow::anyhow!("import worker panicked"))
    })
}

/// Log a take for every clip that copied successfully. Failures to insert
/// are logged and skipped. Returns the number of takes added.
pub fn add_takes_from_import<L: Read + Write>(
    ledger: &mut TakeLedger<L>,
    items: &[ImportItem],
    status: &ImportStatus,
) -> usize {
    let mut added = 0;
    for (item, result) in items.iter().zip(&status.results) {
        if result.error.is_some() {
            continue;
        }
        if item.clip.name != result.clip.name {
            tracing::warn!(clip = %result.clip.name, "missing clip item");
            continue;
        }
        match ledger.insert_take(item.take()) {
            Ok(()) => added += 1,
            Err(e) => {
                tracing::warn!(clip = %result.clip.name, error = %e, "could not add take");
            }
        }
    }
    added
}
