//! Turn one archive into the live directories of every collection.
//!
//! Entries are copied shallowest first. A release that ships both a root
//! copy and a `Demo/` copy of the same file relies on the deeper one landing
//! last, since both normalise to the same destination.

use crate::error::HistoryError;
use crate::history::classify::classify;
use crate::history::collection::{Collection, CollectionTag, NamingConvention};
use crate::history::normalize::normalize;
use crate::history::rules::RuleSet;
use crate::history::scanner::open_archive;
use crate::history::timestamps::{epoch_sentinel, from_zip};
use crate::history::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionYield {
    pub files: usize,
    /// Newest archive-recorded stamp among copied files, else the sentinel.
    pub latest: DateTime<Tz>,
}

#[derive(Debug, Clone, Default)]
pub struct MaterializeOutcome {
    pub collections: BTreeMap<CollectionTag, CollectionYield>,
    pub skipped_entries: usize,
    /// Files whose DOS stamp was missing or invalid and took the sentinel.
    pub undated_entries: usize,
}

impl MaterializeOutcome {
    pub fn files_for(&self, tag: CollectionTag) -> usize {
        self.collections.get(&tag).map(|y| y.files).unwrap_or(0)
    }
}

#[derive(Debug)]
struct ExtractedEntry {
    name: String,
    relative: Option<PathBuf>,
    is_dir: bool,
    modified: DateTime<Tz>,
    undated: bool,
}

/// Number of path segments after collapsing `.`, `..` and repeated separators.
pub fn path_depth(name: &str) -> usize {
    let mut parts: Vec<&str> = Vec::new();
    for part in name.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." if parts.last().is_some_and(|p| *p != "..") => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.len().max(1)
}

fn clear_dir(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        } else {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
    }
    Ok(())
}

fn set_modified(path: &Path, at: SystemTime) -> Result<()> {
    let file = fs::OpenOptions::new()
        .write(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.set_modified(at)
        .with_context(|| format!("failed to set mtime on {}", path.display()))
}

fn corrupt(archive: &Path, err: impl ToString) -> anyhow::Error {
    HistoryError::CorruptArchive {
        path: archive.to_path_buf(),
        reason: err.to_string(),
    }
    .into()
}

fn create_dir_in_scratch(archive_path: &Path, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|err| corrupt(archive_path, format!("{}: {err}", dir.display())))
}

fn extract_all(archive_path: &Path, scratch: &Path, tz: Tz) -> Result<Vec<ExtractedEntry>> {
    let mut archive = open_archive(archive_path)?;
    let mut entries = Vec::with_capacity(archive.len());
    let sentinel = epoch_sentinel(tz)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|err| corrupt(archive_path, err))?;
        let name = file.name().to_string();
        let relative = file.enclosed_name();
        let is_dir = file.is_dir();
        let stamp = from_zip(tz, file.last_modified())?;
        let undated = stamp.is_none() && !is_dir;
        if undated {
            warn::emit(WarnEvent {
                code: "UNDATED_ENTRY",
                stage: "extract",
                archive: &archive_path.display().to_string(),
                source: &name,
                reason: "missing-or-invalid-dos-timestamp",
            });
        }
        let modified = stamp.unwrap_or(sentinel);

        match &relative {
            Some(rel) if is_dir => create_dir_in_scratch(archive_path, &scratch.join(rel))?,
            Some(rel) => {
                let out = scratch.join(rel);
                if let Some(parent) = out.parent() {
                    create_dir_in_scratch(archive_path, parent)?;
                }
                let mut target = File::create(&out).map_err(|err| {
                    corrupt(archive_path, format!("{}: {err}", out.display()))
                })?;
                io::copy(&mut file, &mut target).map_err(|err| corrupt(archive_path, err))?;
                drop(target);
                set_modified(&out, SystemTime::from(modified))?;
            }
            None => debug!(entry = %name, "entry escapes archive root; not extracted"),
        }

        entries.push(ExtractedEntry {
            name,
            relative,
            is_dir,
            modified,
            undated,
        });
    }
    Ok(entries)
}

fn copy_preserving_mtime(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::copy(src, dest)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dest.display()))?;
    let modified = fs::metadata(src)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("failed to stat {}", src.display()))?;
    set_modified(dest, modified)
}

fn copy_entries(
    entries: &[ExtractedEntry],
    scratch: &Path,
    naming: NamingConvention,
    collections: &[Collection],
    rules: &RuleSet,
    out: &mut MaterializeOutcome,
) -> Result<()> {
    for entry in entries {
        let Some(relative) = entry.relative.as_ref().filter(|_| !entry.is_dir) else {
            out.skipped_entries += 1;
            continue;
        };
        let source = scratch.join(relative);
        if !source.is_file() {
            return Err(HistoryError::MissingExtractedFile(source).into());
        }

        for tag in classify(&entry.name, &rules.classifier) {
            let Some(collection) = collections.iter().find(|c| c.tag == tag) else {
                continue;
            };
            let dest_rel = normalize(
                &entry.name,
                collection.naming_for(naming),
                &rules.normalizer,
            );
            let dest = collection.live_dir().join(&dest_rel);
            info!("copy {} to {}", entry.name, dest.display());
            copy_preserving_mtime(&source, &dest)?;

            if let Some(yielded) = out.collections.get_mut(&tag) {
                yielded.files += 1;
                yielded.latest = yielded.latest.max(entry.modified);
            }
        }
    }
    Ok(())
}

/// Replace every collection's live directory with the archive's classified files.
pub fn materialize(
    archive_path: &Path,
    naming: NamingConvention,
    collections: &[Collection],
    rules: &RuleSet,
    tz: Tz,
) -> Result<MaterializeOutcome> {
    materialize_in(
        &std::env::temp_dir(),
        archive_path,
        naming,
        collections,
        rules,
        tz,
    )
}

/// As [`materialize`], extracting into a scratch directory under `scratch_parent`.
pub fn materialize_in(
    scratch_parent: &Path,
    archive_path: &Path,
    naming: NamingConvention,
    collections: &[Collection],
    rules: &RuleSet,
    tz: Tz,
) -> Result<MaterializeOutcome> {
    info!(archive = %archive_path.display(), "processing archive");

    for collection in collections {
        let live = collection.live_dir();
        if live.is_dir() {
            clear_dir(&live)?;
        }
    }

    let sentinel = epoch_sentinel(tz)?;
    let mut out = MaterializeOutcome::default();
    for collection in collections {
        out.collections.insert(
            collection.tag,
            CollectionYield {
                files: 0,
                latest: sentinel,
            },
        );
    }

    // Dropping the guard removes the scratch tree on every early return.
    let scratch = tempfile::Builder::new()
        .prefix("ags-history-")
        .suffix("-ags")
        .tempdir_in(scratch_parent)
        .with_context(|| {
            format!(
                "failed to create scratch directory in {}",
                scratch_parent.display()
            )
        })?;

    let mut entries = extract_all(archive_path, scratch.path(), tz)?;
    out.undated_entries = entries.iter().filter(|entry| entry.undated).count();
    entries.sort_by_key(|entry| path_depth(&entry.name));
    copy_entries(&entries, scratch.path(), naming, collections, rules, &mut out)?;

    scratch
        .close()
        .context("failed to remove scratch directory")?;
    Ok(out)
}
