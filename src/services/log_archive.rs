use anyhow::{Context, Result};
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::constants::logs::{COMPRESSED_EXTENSION, COMPRESSION_LEVEL};

/// Compresses every log file in `dir` to `<name>.zst` and removes the
/// original. Files already compressed are left alone, as is any file whose
/// name contains `active_date` (the log currently being written).
///
/// A `YYYY-MM-DD` date in a file name is collapsed to `YYYYMMDD` first, and
/// underscores are dropped along with it.
pub fn compress_logs(dir: &Path, active_date: &str) -> Result<Vec<PathBuf>> {
    let mut compressed = Vec::new();

    for path in log_files(dir)? {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if is_compressed(&path) || file_name.contains(active_date) {
            continue;
        }

        let source = match normalized_name(file_name) {
            Some(renamed) => {
                let target = path.with_file_name(renamed);
                std::fs::rename(&path, &target).with_context(|| {
                    format!("Failed to rename {} -> {}", path.display(), target.display())
                })?;
                target
            }
            None => path,
        };

        let output = compress_file(&source)?;
        std::fs::remove_file(&source)
            .with_context(|| format!("Failed to remove {}", source.display()))?;

        info!("Compressed log: {}", output.display());
        compressed.push(output);
    }

    Ok(compressed)
}

/// Deletes the oldest file (by modification time) when `dir` holds more than
/// `max_files` entries. At most one file is removed per call.
pub fn prune_logs(dir: &Path, max_files: usize) -> Result<Option<PathBuf>> {
    let files = log_files(dir)?;
    if files.len() <= max_files {
        return Ok(None);
    }

    let oldest = files
        .into_iter()
        .map(|path| {
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .min_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, path)| path);

    if let Some(path) = &oldest {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove old log {}", path.display()))?;
        info!("Removed old log: {}", path.display());
    }

    Ok(oldest)
}

/// Compress, then prune.
pub fn rotate(dir: &Path, active_date: &str, max_files: usize) -> Result<()> {
    compress_logs(dir, active_date)?;
    prune_logs(dir, max_files)?;
    Ok(())
}

fn log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        debug!("Log directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_compressed(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == COMPRESSED_EXTENSION || ext == "gz")
}

fn normalized_name(file_name: &str) -> Option<String> {
    static DATE_IN_NAME: OnceLock<Regex> = OnceLock::new();
    let re = DATE_IN_NAME.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("Invalid regex"));

    re.is_match(file_name)
        .then(|| file_name.replace(['-', '_'], ""))
}

fn compress_file(source: &Path) -> Result<PathBuf> {
    let mut target = source.as_os_str().to_owned();
    target.push(".");
    target.push(COMPRESSED_EXTENSION);
    let target = PathBuf::from(target);

    let input = File::open(source)
        .with_context(|| format!("Failed to open {}", source.display()))?;
    let output = File::create(&target)
        .with_context(|| format!("Failed to create {}", target.display()))?;

    let mut writer = BufWriter::new(output);
    zstd::stream::copy_encode(BufReader::new(input), &mut writer, COMPRESSION_LEVEL)
        .with_context(|| format!("Failed to compress {}", source.display()))?;
    writer.flush().context("Failed to flush compressed log")?;

    Ok(target)
}
