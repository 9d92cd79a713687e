use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::commands::build::VOLUMES;
use crate::manifest::manifest_dir;
use crate::model::{SourceFileEntry, SourceInventoryManifest};
use crate::util::{
    discover_numbered, discover_primary_files, file_name, list_entries_sorted, now_utc_string,
    relative_display, secondary_volume_dir, sha256_file, write_json_pretty,
};

const PRIMARY: &str = "primary";
const SECONDARY: &str = "secondary";
const CORRECTION: &str = "correction";

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.source_root)?;

    if args.dry_run {
        info!(
            primary = manifest.primary_file_count,
            secondary = manifest.secondary_file_count,
            corrections = manifest.correction_file_count,
            source = %manifest.source_root,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| inventory_path(&args.cache_root));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(files = manifest.files.len(), "inventory completed");

    Ok(())
}

pub fn inventory_path(cache_root: &Path) -> PathBuf {
    manifest_dir(cache_root).join("source_inventory.json")
}

pub fn build_manifest(source_root: &Path) -> Result<SourceInventoryManifest> {
    let correction_pattern = Regex::new(r"v(\d+)_b(\d+)_c\d+\.json$")
        .context("failed to compile correction filename regex")?;

    let mut files = Vec::new();
    for spec in &VOLUMES {
        let primary_dir = spec.directory(source_root);
        if primary_dir.is_dir() {
            for path in discover_primary_files(&primary_dir)? {
                files.push(entry(source_root, PRIMARY, spec.number, None, &path)?);
            }
        } else {
            warn!(path = %primary_dir.display(), "primary volume directory missing");
        }

        let secondary_dir = secondary_volume_dir(source_root, spec.number);
        if !secondary_dir.is_dir() {
            warn!(path = %secondary_dir.display(), "secondary volume directory missing");
            continue;
        }
        for (book, book_dir) in discover_numbered(&secondary_dir, true)? {
            for (_, path) in discover_numbered(&book_dir, false)? {
                files.push(entry(source_root, SECONDARY, spec.number, Some(book), &path)?);
            }
        }
    }

    let corrections_dir = source_root.join("corrections");
    if corrections_dir.is_dir() {
        let paths = list_entries_sorted(&corrections_dir, |path, file_type| {
            file_type.is_file() && file_name(path).is_some_and(|name| name.ends_with(".json"))
        })?;
        for path in paths {
            let (volume, book) = parse_volume_book(&path, &correction_pattern)?;
            files.push(entry(source_root, CORRECTION, volume, Some(book), &path)?);
        }
    }

    if files.is_empty() {
        bail!(
            "missing required source file: no corpus files found under {}",
            source_root.display()
        );
    }

    let count = |corpus: &str| files.iter().filter(|file| file.corpus == corpus).count();
    let primary_file_count = count(PRIMARY);
    let secondary_file_count = count(SECONDARY);
    let correction_file_count = count(CORRECTION);

    Ok(SourceInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_root: source_root.display().to_string(),
        primary_file_count,
        secondary_file_count,
        correction_file_count,
        files,
    })
}

fn entry(
    source_root: &Path,
    corpus: &str,
    volume: u32,
    book: Option<u32>,
    path: &Path,
) -> Result<SourceFileEntry> {
    Ok(SourceFileEntry {
        corpus: corpus.to_string(),
        volume,
        book,
        relative_path: relative_display(source_root, path),
        sha256: sha256_file(path)?,
    })
}

fn parse_volume_book(path: &Path, pattern: &Regex) -> Result<(u32, u32)> {
    let name = file_name(path)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;
    let captures = pattern
        .captures(name)
        .with_context(|| format!("filename does not match expected correction pattern: {name}"))?;

    let volume = captures[1]
        .parse::<u32>()
        .with_context(|| format!("invalid volume number in filename: {name}"))?;
    let book = captures[2]
        .parse::<u32>()
        .with_context(|| format!("invalid book number in filename: {name}"))?;
    Ok((volume, book))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write file");
    }

    #[test]
    fn lists_every_corpus_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        let volume_one = VOLUMES[0].directory(root);
        write(&volume_one.join("c001.xhtml"), "<html/>");
        write(&volume_one.join("c000.xhtml"), "<html/>");
        write(&volume_one.join("toc.ncx"), "");
        let book = secondary_volume_dir(root, 1).join("2");
        for name in ["10.html", "2.html", "1.html", "notes.txt"] {
            write(&book.join(name), "<hr>");
        }
        write(&root.join("corrections").join("al-kafi_v5_b2_c82.json"), "{}");

        let manifest = build_manifest(root).expect("inventory");

        assert_eq!(manifest.primary_file_count, 2);
        assert_eq!(manifest.secondary_file_count, 3);
        assert_eq!(manifest.correction_file_count, 1);
        let paths: Vec<&str> = manifest
            .files
            .iter()
            .map(|file| file.relative_path.as_str())
            .collect();
        assert_eq!(
            paths,
            vec![
                "hubeali_com/Al-Kafi-Volume-1/c000.xhtml",
                "hubeali_com/Al-Kafi-Volume-1/c001.xhtml",
                "thaqalayn_net/chapter/1/2/1.html",
                "thaqalayn_net/chapter/1/2/2.html",
                "thaqalayn_net/chapter/1/2/10.html",
                "corrections/al-kafi_v5_b2_c82.json",
            ]
        );
        let correction = &manifest.files[5];
        assert_eq!((correction.volume, correction.book), (5, Some(2)));
        assert_eq!(manifest.files[2].book, Some(2));
        assert_eq!(manifest.files[0].sha256.len(), 64);
    }

    #[test]
    fn empty_source_root_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = build_manifest(dir.path()).expect_err("nothing to inventory");
        assert!(err.to_string().contains("missing required source file"));
    }

    #[test]
    fn unexpected_correction_name_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(&dir.path().join("corrections").join("notes.json"), "{}");
        assert!(build_manifest(dir.path()).is_err());
    }
}
