pub mod classify;
pub mod plan;
pub mod run;
pub mod scan;

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::history::config::{HistoryConfig, load_config, revalidate};
use crate::history::paths::{HistoryPaths, paths_in, resolve_paths};
use crate::history::rules::RuleProfile;
use crate::history::scanner::CollisionPolicy;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// Flags that may replace config-file and environment settings.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub profile: Option<RuleProfile>,
    pub collision_policy: Option<CollisionPolicy>,
}

/// Flags that relocate the workspace or its inputs.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceOverrides {
    pub work_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub order_file: Option<PathBuf>,
}

pub fn effective_config(overrides: &ConfigOverrides) -> Result<HistoryConfig> {
    let mut cfg = load_config()?;
    if let Some(profile) = overrides.profile {
        cfg.run.profile = profile;
    }
    if let Some(policy) = overrides.collision_policy {
        cfg.run.collision_policy = policy;
    }
    revalidate(&cfg)?;
    Ok(cfg)
}

pub fn effective_paths(overrides: &WorkspaceOverrides) -> Result<HistoryPaths> {
    let mut paths = match &overrides.work_dir {
        Some(dir) => paths_in(dir),
        None => resolve_paths()?,
    };
    if let Some(data_dir) = &overrides.data_dir {
        paths.data_dir = data_dir.clone();
    }
    if let Some(order_file) = &overrides.order_file {
        paths.order_file = order_file.clone();
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::CommandReport;

    #[test]
    fn any_issue_fails_the_report() {
        let mut report = CommandReport::new("plan");
        report.detail("ac_100.zip ready");
        assert!(report.ok);
        report.issue("ags_999.zip has no version label");
        assert!(!report.ok);
        assert_eq!(report.details, vec!["ac_100.zip ready"]);
        assert_eq!(report.issues.len(), 1);
    }
}
