//! The version-control collaborator.
//!
//! The pipeline only needs four capabilities from a history backend, so they
//! form the `HistoryStore` seam. `GitCli` drives the real `git` binary; tests
//! use the in-memory store below.

use crate::error::HistoryError;
use anyhow::{Context, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn signature(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub message: String,
    pub author: Identity,
    pub committer: Identity,
    pub date: DateTime<Tz>,
}

pub trait HistoryStore {
    fn init_empty(&self, repo: &Path) -> Result<()>;
    fn stage_all(&self, repo: &Path) -> Result<()>;
    fn has_pending_changes(&self, repo: &Path) -> Result<bool>;
    fn commit(&self, repo: &Path, request: &CommitRequest) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct GitCli {
    bin: PathBuf,
}

impl GitCli {
    pub fn new(bin: PathBuf) -> Self {
        Self { bin }
    }

    /// Locate `git`, preferring an explicit path when it exists.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(bin) = explicit.filter(|p| p.exists()) {
            return Ok(Self::new(bin.to_path_buf()));
        }
        let found = which::which("git").context("git binary not found in AGS_HISTORY_GIT or PATH")?;
        Ok(Self::new(found))
    }

    fn run(&self, repo: &Path, args: &[&str], envs: &[(&str, String)]) -> Result<String> {
        let output = Command::new(&self.bin)
            .arg("-C")
            .arg(repo)
            .args(args)
            .envs(envs.iter().map(|(k, v)| (*k, v.as_str())))
            .output()
            .with_context(|| format!("failed to run `{} {}`", self.bin.display(), args.join(" ")))?;

        if !output.status.success() {
            return Err(HistoryError::VcsCommandFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                repo: repo.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl HistoryStore for GitCli {
    fn init_empty(&self, repo: &Path) -> Result<()> {
        self.run(repo, &["init", "--quiet"], &[])?;
        self.run(repo, &["config", "core.ignorecase", "false"], &[])?;
        Ok(())
    }

    fn stage_all(&self, repo: &Path) -> Result<()> {
        self.run(repo, &["add", "-A", "."], &[])?;
        Ok(())
    }

    fn has_pending_changes(&self, repo: &Path) -> Result<bool> {
        let out = self.run(repo, &["status", "--porcelain"], &[])?;
        Ok(!out.trim().is_empty())
    }

    fn commit(&self, repo: &Path, request: &CommitRequest) -> Result<()> {
        let date = request.date.to_rfc2822();
        let envs = [
            ("GIT_AUTHOR_NAME", request.author.name.clone()),
            ("GIT_AUTHOR_EMAIL", request.author.email.clone()),
            ("GIT_AUTHOR_DATE", date.clone()),
            ("GIT_COMMITTER_NAME", request.committer.name.clone()),
            ("GIT_COMMITTER_EMAIL", request.committer.email.clone()),
            ("GIT_COMMITTER_DATE", date),
        ];
        self.run(
            repo,
            &[
                "commit",
                "--quiet",
                "--no-gpg-sign",
                "--allow-empty-message",
                "-m",
                &request.message,
            ],
            &envs,
        )?;
        Ok(())
    }
}

#[cfg(test)]
pub mod memory {
    //! In-memory `HistoryStore` that snapshots the working tree from disk.

    use super::{CommitRequest, HistoryStore};
    use anyhow::{Result, anyhow};
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use walkdir::WalkDir;

    type Tree = BTreeMap<PathBuf, Vec<u8>>;

    #[derive(Debug, Default)]
    struct Repo {
        staged: Tree,
        commits: Vec<(CommitRequest, Tree)>,
    }

    #[derive(Debug, Default)]
    pub struct MemoryStore {
        repos: RefCell<BTreeMap<PathBuf, Repo>>,
    }

    fn read_tree(root: &Path) -> Result<Tree> {
        let mut tree = Tree::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                let rel = entry.path().strip_prefix(root)?.to_path_buf();
                tree.insert(rel, fs::read(entry.path())?);
            }
        }
        Ok(tree)
    }

    impl MemoryStore {
        pub fn commits(&self, repo: &Path) -> Vec<CommitRequest> {
            self.repos
                .borrow()
                .get(repo)
                .map(|r| r.commits.iter().map(|(c, _)| c.clone()).collect())
                .unwrap_or_default()
        }

        pub fn head_tree(&self, repo: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
            self.repos
                .borrow()
                .get(repo)
                .and_then(|r| r.commits.last().map(|(_, t)| t.clone()))
                .unwrap_or_default()
        }
    }

    impl HistoryStore for MemoryStore {
        fn init_empty(&self, repo: &Path) -> Result<()> {
            self.repos
                .borrow_mut()
                .insert(repo.to_path_buf(), Repo::default());
            Ok(())
        }

        fn stage_all(&self, repo: &Path) -> Result<()> {
            let tree = read_tree(repo)?;
            let mut repos = self.repos.borrow_mut();
            let state = repos
                .get_mut(repo)
                .ok_or_else(|| anyhow!("not a history: {}", repo.display()))?;
            state.staged = tree;
            Ok(())
        }

        fn has_pending_changes(&self, repo: &Path) -> Result<bool> {
            let repos = self.repos.borrow();
            let state = repos
                .get(repo)
                .ok_or_else(|| anyhow!("not a history: {}", repo.display()))?;
            let head = state.commits.last().map(|(_, t)| t.clone()).unwrap_or_default();
            Ok(state.staged != head)
        }

        fn commit(&self, repo: &Path, request: &CommitRequest) -> Result<()> {
            let mut repos = self.repos.borrow_mut();
            let state = repos
                .get_mut(repo)
                .ok_or_else(|| anyhow!("not a history: {}", repo.display()))?;
            let tree = state.staged.clone();
            state.commits.push((request.clone(), tree));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::timestamps::{epoch_sentinel, parse_timezone};
    use std::fs;

    fn git() -> Option<GitCli> {
        GitCli::discover(None).ok()
    }

    fn git_stdout(repo: &Path, args: &[&str]) -> String {
        let out = Command::new("git")
            .arg("-C")
            .arg(repo)
            .args(args)
            .output()
            .expect("run git");
        assert!(out.status.success(), "git {args:?} failed");
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    #[test]
    fn git_commit_records_synthesized_metadata() {
        let Some(git) = git() else {
            return;
        };
        let tmp = tempfile::tempdir().expect("tempdir");
        let repo = tmp.path();
        git.init_empty(repo).expect("init");
        fs::write(repo.join("README.md"), "seed\n").expect("write");
        git.stage_all(repo).expect("stage");
        assert!(git.has_pending_changes(repo).expect("status"));

        let tz = parse_timezone("Europe/London").expect("tz");
        let request = CommitRequest {
            message: "Initial commit".to_string(),
            author: Identity::new("CJ", "cj@example.invalid"),
            committer: Identity::new("CJ", "cj@example.invalid"),
            date: epoch_sentinel(tz).expect("sentinel"),
        };
        git.commit(repo, &request).expect("commit");

        assert!(!git.has_pending_changes(repo).expect("status"));
        let log = git_stdout(repo, &["log", "-1", "--format=%an|%ae|%cn|%aI|%cI|%s"]);
        assert_eq!(
            log,
            "CJ|cj@example.invalid|CJ|1998-12-17T22:33:36+00:00|1998-12-17T22:33:36+00:00|Initial commit"
        );
    }

    #[test]
    fn git_failure_is_typed() {
        let Some(git) = git() else {
            return;
        };
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = git.stage_all(tmp.path()).expect_err("not a repo");
        assert!(matches!(
            err.downcast_ref::<HistoryError>(),
            Some(HistoryError::VcsCommandFailed { .. })
        ));
    }

    #[test]
    fn signature_formats_empty_email() {
        assert_eq!(Identity::new("CJ", "").signature(), "CJ <>");
    }
}
