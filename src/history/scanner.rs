use crate::error::HistoryError;
use crate::history::normalize::split_ext;
use crate::history::rules::ViabilityRules;
use crate::history::warn::{self, WarnEvent};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use walkdir::WalkDir;

/// What to do when two archives in the data tree share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Later file wins without inspection.
    #[default]
    Last,
    /// Later file wins; differing content is reported.
    Warn,
    /// Differing content aborts the scan.
    Fail,
}

impl CollisionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Last => "last",
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollisionPolicy {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "last" => Ok(Self::Last),
            "warn" => Ok(Self::Warn),
            "fail" => Ok(Self::Fail),
            other => Err(anyhow!(
                "unknown collision policy `{other}`: use `last`, `warn` or `fail`"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyCollision {
    pub key: String,
    pub replaced: PathBuf,
    pub winner: PathBuf,
    pub identical: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub archives: BTreeMap<String, PathBuf>,
    pub collisions: Vec<KeyCollision>,
    pub skipped: usize,
}

fn lower_extension(name: &str) -> String {
    let file = name.rsplit('/').next().unwrap_or(name);
    split_ext(file).1.to_lowercase()
}

fn file_hash(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn open_archive(path: &Path) -> Result<zip::ZipArchive<File>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    zip::ZipArchive::new(file).map_err(|err| {
        HistoryError::CorruptArchive {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
        .into()
    })
}

pub fn has_container_extension(path: &Path, rules: &ViabilityRules) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    lower_extension(name) == rules.container_extension
}

/// True when `path` is an archive holding at least one proof-of-content entry.
///
/// A container that cannot be read is an error, not a "no".
pub fn is_viable(path: &Path, rules: &ViabilityRules) -> Result<bool> {
    if !has_container_extension(path, rules) {
        return Ok(false);
    }
    let archive = open_archive(path)?;
    let viable = archive.file_names().any(|name| {
        let ext = lower_extension(name);
        rules.proof_extensions.iter().any(|p| *p == ext)
    });
    Ok(viable)
}

/// Map lowercased archive filenames to their location under `root`.
pub fn scan_directory(
    root: &Path,
    rules: &ViabilityRules,
    policy: CollisionPolicy,
) -> Result<ScanOutcome> {
    if !root.is_dir() {
        return Err(anyhow!("archive directory does not exist: {}", root.display()));
    }

    let mut out = ScanOutcome::default();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path().to_path_buf();
        if !is_viable(&path, rules)? {
            debug!(path = %path.display(), "not a viable archive");
            out.skipped += 1;
            continue;
        }

        let key = entry.file_name().to_string_lossy().to_lowercase();
        if let Some(previous) = out.archives.get(&key) {
            let identical = match policy {
                CollisionPolicy::Last => None,
                CollisionPolicy::Warn | CollisionPolicy::Fail => {
                    Some(file_hash(previous)? == file_hash(&path)?)
                }
            };
            if identical == Some(false) {
                if policy == CollisionPolicy::Fail {
                    return Err(HistoryError::ArchiveKeyCollision {
                        key,
                        first: previous.clone(),
                        second: path,
                    }
                    .into());
                }
                warn::emit(WarnEvent {
                    code: "KEY_COLLISION",
                    stage: "scan",
                    archive: &key,
                    source: &path.display().to_string(),
                    reason: "same-name-different-content",
                });
            }
            out.collisions.push(KeyCollision {
                key: key.clone(),
                replaced: previous.clone(),
                winner: path.clone(),
                identical,
            });
        }
        out.archives.insert(key, path);
    }
    Ok(out)
}
