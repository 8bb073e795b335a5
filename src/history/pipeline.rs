use crate::history::audit;
use crate::history::collection::{Collection, CollectionTag, NamingConvention};
use crate::history::materialize::materialize;
use crate::history::order;
use crate::history::recorder::{IdentityRule, RecordOutcome, initialize_history, record_if_changed};
use crate::history::rules::RuleSet;
use crate::history::scanner::is_viable;
use crate::history::timestamps::epoch_sentinel;
use crate::history::vcs::HistoryStore;
use crate::history::versions::{VersionTable, commit_message};
use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveStatus {
    Ready,
    Missing,
    NotViable,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedArchive {
    pub key: String,
    pub status: ArchiveStatus,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
    pub naming: Option<NamingConvention>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionCommit {
    pub collection: CollectionTag,
    pub files: usize,
    pub message: String,
    pub date: String,
    pub committed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveReport {
    pub plan: PlannedArchive,
    pub commits: Vec<CollectionCommit>,
    /// Directory and unextractable entries left out of every collection.
    pub skipped_entries: usize,
    /// Copied files dated from the sentinel for lack of a usable stamp.
    pub undated_entries: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunOutcome {
    pub archives: Vec<ArchiveReport>,
}

impl RunOutcome {
    pub fn count(&self, status: ArchiveStatus) -> usize {
        self.archives
            .iter()
            .filter(|a| a.plan.status == status)
            .count()
    }

    pub fn commit_count(&self) -> usize {
        self.archives
            .iter()
            .flat_map(|a| &a.commits)
            .filter(|c| c.committed)
            .count()
    }
}

fn archive_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Decide what the run would do with `key` without touching any output.
pub fn plan_archive(
    key: &str,
    lookup: &BTreeMap<String, PathBuf>,
    rules: &RuleSet,
    versions: &VersionTable,
) -> Result<PlannedArchive> {
    let Some(path) = order::resolve(key, lookup, &rules.viability.container_extension) else {
        return Ok(PlannedArchive {
            key: key.to_string(),
            status: ArchiveStatus::Missing,
            path: None,
            version: None,
            naming: None,
        });
    };

    let status = if is_viable(path, &rules.viability)? {
        ArchiveStatus::Ready
    } else {
        ArchiveStatus::NotViable
    };
    let stem = archive_stem(path);
    Ok(PlannedArchive {
        key: key.to_string(),
        status,
        path: Some(path.clone()),
        version: versions.get(&stem).map(ToOwned::to_owned),
        naming: Some(NamingConvention::for_archive(
            &stem,
            &rules.normalizer.dos_key_prefixes,
        )),
    })
}

pub struct Pipeline<'a> {
    pub store: &'a dyn HistoryStore,
    pub collections: &'a [Collection],
    pub rules: &'a RuleSet,
    pub versions: &'a VersionTable,
    pub identities: &'a IdentityRule,
    pub tz: Tz,
    pub product_name: &'a str,
    pub logs_dir: Option<&'a Path>,
}

impl Pipeline<'_> {
    fn journal(&self, phase: &str, status: &str, message: &str) -> Result<()> {
        match self.logs_dir {
            Some(dir) => audit::append_event(dir, phase, status, message),
            None => Ok(()),
        }
    }

    pub fn initialize(&self) -> Result<()> {
        let epoch = epoch_sentinel(self.tz)?;
        for collection in self.collections {
            initialize_history(
                self.store,
                &collection.repo_dir,
                &collection.readme_source,
                epoch,
                self.identities,
            )
            .with_context(|| format!("failed to initialise {} history", collection.tag))?;
            self.journal(
                "initialize",
                "ok",
                &collection.repo_dir.display().to_string(),
            )?;
        }
        Ok(())
    }

    pub fn process_archive(&self, plan: PlannedArchive) -> Result<ArchiveReport> {
        let (Some(path), Some(naming)) = (plan.path.clone(), plan.naming) else {
            return Ok(ArchiveReport {
                plan,
                commits: Vec::new(),
                skipped_entries: 0,
                undated_entries: 0,
            });
        };
        let stem = archive_stem(&path);
        let version = self.versions.label(&stem)?.to_string();

        let yielded = materialize(&path, naming, self.collections, self.rules, self.tz)
            .with_context(|| format!("failed to materialise {}", path.display()))?;

        let mut commits = Vec::new();
        for collection in self.collections {
            if yielded.files_for(collection.tag) == 0 {
                continue;
            }
            let Some(result) = yielded.collections.get(&collection.tag) else {
                continue;
            };
            let message = commit_message(&collection.human_name, self.product_name, &version);
            let outcome = record_if_changed(
                self.store,
                &collection.repo_dir,
                &message,
                result.latest,
                self.identities,
            )?;
            let committed = outcome == RecordOutcome::Committed;
            self.journal(
                "commit",
                if committed { "committed" } else { "unchanged" },
                &message,
            )?;
            commits.push(CollectionCommit {
                collection: collection.tag,
                files: result.files,
                message,
                date: result.latest.to_rfc3339(),
                committed,
            });
        }

        Ok(ArchiveReport {
            plan,
            commits,
            skipped_entries: yielded.skipped_entries,
            undated_entries: yielded.undated_entries,
        })
    }

    /// Initialise every history, then replay archives in order.
    pub fn run(&self, keys: &[String], lookup: &BTreeMap<String, PathBuf>) -> Result<RunOutcome> {
        self.initialize()?;

        let mut out = RunOutcome::default();
        for key in keys {
            let plan = plan_archive(key, lookup, self.rules, self.versions)?;
            match plan.status {
                ArchiveStatus::Ready => {
                    out.archives.push(self.process_archive(plan)?);
                }
                ArchiveStatus::Missing | ArchiveStatus::NotViable => {
                    info!(key = %key, status = ?plan.status, "skipping archive");
                    self.journal("skip", &format!("{:?}", plan.status), key)?;
                    out.archives.push(ArchiveReport {
                        plan,
                        commits: Vec::new(),
                        skipped_entries: 0,
                        undated_entries: 0,
                    });
                }
            }
        }
        Ok(out)
    }
}
