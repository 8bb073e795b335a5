use anyhow::Result;

use crate::commands::{
    CommandReport, ConfigOverrides, WorkspaceOverrides, effective_config, effective_paths,
};
use crate::history::scanner::scan_directory;

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub workspace: WorkspaceOverrides,
    pub config: ConfigOverrides,
}

pub fn run(opts: &ScanOptions) -> Result<CommandReport> {
    let cfg = effective_config(&opts.config)?;
    let paths = effective_paths(&opts.workspace)?;
    let rules = cfg.rule_set();
    let mut report = CommandReport::new("scan");

    report.detail(format!("data_dir={}", paths.data_dir.display()));
    report.detail(format!("profile={}", rules.profile));
    report.detail(format!("collision_policy={}", cfg.run.collision_policy));

    if !paths.data_dir.is_dir() {
        report.issue("archive directory does not exist");
        return Ok(report);
    }

    let outcome = scan_directory(&paths.data_dir, &rules.viability, cfg.run.collision_policy)?;
    for (key, path) in &outcome.archives {
        report.detail(format!("{key} -> {}", path.display()));
    }
    for collision in &outcome.collisions {
        let verdict = match collision.identical {
            Some(true) => "identical",
            Some(false) => "different",
            None => "unchecked",
        };
        report.detail(format!(
            "collision {}: {} replaced by {} ({verdict})",
            collision.key,
            collision.replaced.display(),
            collision.winner.display()
        ));
    }
    report.detail(format!(
        "viable={} skipped={} collisions={}",
        outcome.archives.len(),
        outcome.skipped,
        outcome.collisions.len()
    ));
    Ok(report)
}
