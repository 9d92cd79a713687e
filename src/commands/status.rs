use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::inventory::inventory_path;
use crate::manifest::run_state_path;
use crate::model::{BOOK_COMPLETE_PATH, RunStateManifest, SourceInventoryManifest};
use crate::store::{StoreError, open_store};

pub fn run(args: StatusArgs) -> Result<()> {
    let cache_root = &args.store.cache_root;
    let run_state_path = run_state_path(cache_root);
    let inventory_path = inventory_path(cache_root);

    info!(cache_root = %cache_root.display(), "status requested");

    if run_state_path.exists() {
        let raw = fs::read(&run_state_path)
            .with_context(|| format!("failed to read {}", run_state_path.display()))?;
        let state: RunStateManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", run_state_path.display()))?;

        info!(
            last_stage = %state.last_stage,
            run_id = %state.run_id,
            status = %state.status,
            diagnostics = state.diagnostic_count,
            manifest = %state.manifest_path,
            updated_at = %state.updated_at,
            "loaded run-state manifest"
        );
    } else {
        warn!(path = %run_state_path.display(), "run-state manifest missing");
    }

    if inventory_path.exists() {
        let raw = fs::read(&inventory_path)
            .with_context(|| format!("failed to read {}", inventory_path.display()))?;
        let inventory: SourceInventoryManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", inventory_path.display()))?;

        info!(
            generated_at = %inventory.generated_at,
            primary = inventory.primary_file_count,
            secondary = inventory.secondary_file_count,
            corrections = inventory.correction_file_count,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    let store = open_store(&args.store)?;
    match store.read(BOOK_COMPLETE_PATH) {
        Ok(record) => {
            let units = record
                .data
                .get("verse_count")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0);
            info!(store = %store.describe(), path = BOOK_COMPLETE_PATH, units, "complete tree present");
        }
        Err(StoreError::NotFound(_)) => {
            warn!(store = %store.describe(), path = BOOK_COMPLETE_PATH, "complete tree missing");
        }
        Err(err) => return Err(err).context("failed to read the complete tree"),
    }

    Ok(())
}
