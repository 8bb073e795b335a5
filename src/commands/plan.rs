use anyhow::Result;

use crate::commands::{
    CommandReport, ConfigOverrides, WorkspaceOverrides, effective_config, effective_paths,
};
use crate::history::order::load_order_file;
use crate::history::pipeline::{ArchiveStatus, plan_archive};
use crate::history::scanner::scan_directory;
use crate::history::versions::VersionTable;

#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub workspace: WorkspaceOverrides,
    pub config: ConfigOverrides,
}

/// Dry run: what `run` would do with each order key, without writing anything.
pub fn run(opts: &PlanOptions) -> Result<CommandReport> {
    let cfg = effective_config(&opts.config)?;
    let paths = effective_paths(&opts.workspace)?;
    let rules = cfg.rule_set();
    let versions = VersionTable::default().with_overrides(&cfg.versions);
    let mut report = CommandReport::new("plan");

    report.detail(format!("data_dir={}", paths.data_dir.display()));
    report.detail(format!("order_file={}", paths.order_file.display()));

    for repo in [&paths.demo_repo, &paths.templates_repo] {
        if repo.exists() {
            report.issue(format!("history already exists: {}", repo.display()));
        }
    }
    for readme in [&paths.demo_readme, &paths.templates_readme] {
        if !readme.is_file() {
            report.issue(format!("readme seed missing: {}", readme.display()));
        }
    }
    if !paths.data_dir.is_dir() {
        report.issue("archive directory does not exist");
        return Ok(report);
    }

    let keys = load_order_file(&paths.order_file)?;
    let scan = scan_directory(&paths.data_dir, &rules.viability, cfg.run.collision_policy)?;

    let mut ready = 0usize;
    for key in &keys {
        let planned = plan_archive(key, &scan.archives, &rules, &versions)?;
        match planned.status {
            ArchiveStatus::Missing => report.detail(format!("{key}: missing")),
            ArchiveStatus::NotViable => report.detail(format!("{key}: not viable")),
            ArchiveStatus::Ready => {
                ready += 1;
                let naming = planned.naming.map(|n| n.as_str()).unwrap_or_default();
                match &planned.version {
                    Some(version) => {
                        report.detail(format!("{key}: v{version} naming={naming}"));
                    }
                    None => report.issue(format!("{key}: no version label")),
                }
            }
        }
    }
    report.detail(format!("keys={} ready={ready}", keys.len()));
    Ok(report)
}
