use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use scraper::Selector;
use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|err| anyhow!("failed to parse selector {selector}: {err}"))
}

pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Directory entries accepted by `keep`, ordered by file name.
pub fn list_entries_sorted<F>(dir: &Path, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path, &fs::FileType) -> bool,
{
    let mut paths = Vec::new();

    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?;

        if keep(&path, &file_type) {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

/// Primary corpus chapter files: `c*.xhtml`.
pub fn discover_primary_files(dir: &Path) -> Result<Vec<PathBuf>> {
    list_entries_sorted(dir, |path, file_type| {
        file_type.is_file()
            && file_name(path).is_some_and(|name| name.starts_with('c'))
            && has_extension(path, "xhtml")
    })
}

/// Secondary corpus directory of one volume, holding one directory per book.
pub fn secondary_volume_dir(source_root: &Path, volume: u32) -> PathBuf {
    source_root
        .join("thaqalayn_net")
        .join("chapter")
        .join(volume.to_string())
}

/// Entries whose stem is a plain integer, ordered numerically.
pub fn discover_numbered(dir: &Path, directories: bool) -> Result<Vec<(u32, PathBuf)>> {
    let paths = list_entries_sorted(dir, |path, file_type| {
        let kind_matches = if directories {
            file_type.is_dir()
        } else {
            file_type.is_file() && has_extension(path, "html")
        };
        kind_matches && numeric_stem(path).is_some()
    })?;

    let mut numbered: Vec<(u32, PathBuf)> = paths
        .into_iter()
        .filter_map(|path| numeric_stem(&path).map(|number| (number, path)))
        .collect();
    numbered.sort_by_key(|(number, _)| *number);
    Ok(numbered)
}

pub fn numeric_stem(path: &Path) -> Option<u32> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.parse::<u32>().ok())
}

pub fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}

pub fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
