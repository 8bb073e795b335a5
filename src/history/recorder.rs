use crate::error::HistoryError;
use crate::history::vcs::{CommitRequest, HistoryStore, Identity};
use anyhow::{Context, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use std::fs;
use std::path::Path;
use tracing::info;

pub const README_NAME: &str = "README.md";
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";

/// Authorship is picked from the commit date, never from the environment.
#[derive(Debug, Clone)]
pub struct IdentityRule {
    /// Used for commits dated at or before `cutoff`.
    pub before: Identity,
    /// Used for commits dated strictly after `cutoff`.
    pub after: Identity,
    pub cutoff: DateTime<Tz>,
}

impl IdentityRule {
    pub fn identity_for(&self, date: &DateTime<Tz>) -> &Identity {
        if *date <= self.cutoff {
            &self.before
        } else {
            &self.after
        }
    }

    fn request(&self, message: &str, date: DateTime<Tz>) -> CommitRequest {
        let identity = self.identity_for(&date).clone();
        CommitRequest {
            message: message.to_string(),
            author: identity.clone(),
            committer: identity,
            date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Committed,
    Unchanged,
}

/// Stage the whole working tree and commit it, unless nothing changed.
pub fn record_if_changed(
    store: &dyn HistoryStore,
    repo: &Path,
    message: &str,
    date: DateTime<Tz>,
    identities: &IdentityRule,
) -> Result<RecordOutcome> {
    store.stage_all(repo)?;
    if !store.has_pending_changes(repo)? {
        info!(repo = %repo.display(), "no changes; skipping commit");
        return Ok(RecordOutcome::Unchanged);
    }

    let request = identities.request(message, date);
    store.commit(repo, &request)?;
    info!(
        repo = %repo.display(),
        author = %request.author.signature(),
        date = %request.date.to_rfc3339(),
        "committed: {message}"
    );
    Ok(RecordOutcome::Committed)
}

/// Create a fresh history at `repo` seeded with a copy of `readme_source`.
///
/// Refuses to touch a path that already exists.
pub fn initialize_history(
    store: &dyn HistoryStore,
    repo: &Path,
    readme_source: &Path,
    epoch: DateTime<Tz>,
    identities: &IdentityRule,
) -> Result<()> {
    if repo.exists() {
        return Err(HistoryError::HistoryExists(repo.to_path_buf()).into());
    }
    fs::create_dir_all(repo).with_context(|| format!("failed to create {}", repo.display()))?;
    store.init_empty(repo)?;

    let readme = repo.join(README_NAME);
    fs::copy(readme_source, &readme).with_context(|| {
        format!(
            "failed to copy {} to {}",
            readme_source.display(),
            readme.display()
        )
    })?;

    store.stage_all(repo)?;
    store.commit(repo, &identities.request(INITIAL_COMMIT_MESSAGE, epoch))?;
    info!(repo = %repo.display(), "initialised history");
    Ok(())
}
