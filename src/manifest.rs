use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::diagnostics::Diagnostics;
use crate::model::{RunStateManifest, StagePaths, StageRunManifest};
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

pub fn manifest_dir(cache_root: &Path) -> PathBuf {
    cache_root.join("manifests")
}

pub fn run_state_path(cache_root: &Path) -> PathBuf {
    manifest_dir(cache_root).join("run_state.json")
}

/// Bookkeeping for one pipeline stage, written out as a run manifest on completion.
pub struct StageRun {
    stage: &'static str,
    run_id: String,
    started_ts: DateTime<Utc>,
    started_at: String,
    cache_root: PathBuf,
    source_root: Option<PathBuf>,
    counts: BTreeMap<String, usize>,
}

impl StageRun {
    pub fn start(stage: &'static str, cache_root: &Path, source_root: Option<&Path>) -> Self {
        let started_ts = Utc::now();
        let run_id = format!("run-{}", utc_compact_string(started_ts));
        info!(stage, run_id = %run_id, cache_root = %cache_root.display(), "starting stage");

        Self {
            stage,
            run_id,
            started_ts,
            started_at: now_utc_string(),
            cache_root: cache_root.to_path_buf(),
            source_root: source_root.map(Path::to_path_buf),
            counts: BTreeMap::new(),
        }
    }

    pub fn count(&mut self, key: &str, value: usize) {
        self.counts.insert(key.to_string(), value);
    }

    pub fn complete(self, store: String, diagnostics: Diagnostics) -> Result<PathBuf> {
        diagnostics.log_summary(self.stage);

        let dir = manifest_dir(&self.cache_root);
        ensure_directory(&dir)?;
        let manifest_path = dir.join(format!(
            "{}_run_{}.json",
            self.stage,
            utc_compact_string(self.started_ts)
        ));
        let updated_at = now_utc_string();
        let diagnostic_count = diagnostics.len();

        let manifest = StageRunManifest {
            manifest_version: 1,
            run_id: self.run_id.clone(),
            stage: self.stage.to_string(),
            status: "completed".to_string(),
            started_at: self.started_at,
            updated_at: updated_at.clone(),
            command: std::env::args().collect::<Vec<_>>().join(" "),
            paths: StagePaths {
                cache_root: self.cache_root.display().to_string(),
                source_root: self
                    .source_root
                    .as_ref()
                    .map(|path| path.display().to_string()),
                store,
            },
            counts: self.counts.clone(),
            diagnostics: diagnostics.into_vec(),
        };
        write_json_pretty(&manifest_path, &manifest)?;

        let state = RunStateManifest {
            last_stage: self.stage.to_string(),
            run_id: self.run_id,
            status: "completed".to_string(),
            diagnostic_count,
            manifest_path: manifest_path.display().to_string(),
            updated_at,
        };
        write_json_pretty(&run_state_path(&self.cache_root), &state)?;

        info!(
            stage = self.stage,
            path = %manifest_path.display(),
            counts = ?self.counts,
            "stage completed"
        );
        Ok(manifest_path)
    }
}
