use anyhow::{Context, Result, bail};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

use crate::commands::{
    CommandReport, ConfigOverrides, WorkspaceOverrides, effective_config, effective_paths,
};
use crate::error::HistoryError;
use crate::history::audit;
use crate::history::collection::default_collections;
use crate::history::order::load_order_file;
use crate::history::pipeline::{ArchiveStatus, Pipeline};
use crate::history::scanner::scan_directory;
use crate::history::vcs::GitCli;
use crate::history::versions::VersionTable;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub workspace: WorkspaceOverrides,
    pub config: ConfigOverrides,
}

fn acquire_lock(path: &Path) -> Result<File> {
    let file = File::create(path).with_context(|| format!("failed to open {}", path.display()))?;
    if file.try_lock_exclusive().is_err() {
        return Err(HistoryError::Locked(path.to_path_buf()).into());
    }
    Ok(file)
}

/// Rebuild both histories from the archive set, oldest release first.
pub fn run(opts: &RunOptions) -> Result<CommandReport> {
    let cfg = effective_config(&opts.config)?;
    let paths = effective_paths(&opts.workspace)?;
    let mut report = CommandReport::new("run");

    fs::create_dir_all(&paths.work_dir)
        .with_context(|| format!("failed to create {}", paths.work_dir.display()))?;
    let _lock = acquire_lock(&paths.lock_file)?;

    for readme in [&paths.demo_readme, &paths.templates_readme] {
        if !readme.is_file() {
            bail!("readme seed missing: {}", readme.display());
        }
    }

    let git = GitCli::discover(cfg.run.git_bin.as_deref().map(Path::new))?;
    let rules = cfg.rule_set();
    let tz = cfg.timezone()?;
    let identities = cfg.identity_rule()?;
    let versions = VersionTable::default().with_overrides(&cfg.versions);

    report.detail(format!("work_dir={}", paths.work_dir.display()));
    report.detail(format!("profile={}", rules.profile));
    report.detail(format!("known_versions={}", versions.len()));

    let scan = scan_directory(&paths.data_dir, &rules.viability, cfg.run.collision_policy)?;
    for collision in &scan.collisions {
        report.detail(format!(
            "collision {}: using {}",
            collision.key,
            collision.winner.display()
        ));
    }
    let keys = load_order_file(&paths.order_file)?;
    info!(
        archives = scan.archives.len(),
        keys = keys.len(),
        "starting history rebuild"
    );
    audit::append_event(
        &paths.logs_dir,
        "run",
        "started",
        &format!("keys={} archives={}", keys.len(), scan.archives.len()),
    )?;

    let collections = default_collections(
        &paths.demo_repo,
        &paths.templates_repo,
        &paths.demo_readme,
        &paths.templates_readme,
    );
    let pipeline = Pipeline {
        store: &git,
        collections: &collections,
        rules: &rules,
        versions: &versions,
        identities: &identities,
        tz,
        product_name: &cfg.run.product_name,
        logs_dir: Some(&paths.logs_dir),
    };
    let outcome = pipeline.run(&keys, &scan.archives)?;

    for archive in &outcome.archives {
        let key = &archive.plan.key;
        match archive.plan.status {
            ArchiveStatus::Missing => report.detail(format!("{key}: skipped (missing)")),
            ArchiveStatus::NotViable => report.detail(format!("{key}: skipped (not viable)")),
            ArchiveStatus::Ready => {
                if archive.skipped_entries > 0 {
                    report.detail(format!(
                        "{key}: {} entries not copied",
                        archive.skipped_entries
                    ));
                }
                if archive.undated_entries > 0 {
                    report.detail(format!(
                        "{key}: {} entries undated, sentinel used",
                        archive.undated_entries
                    ));
                }
                for commit in &archive.commits {
                    let state = if commit.committed { "committed" } else { "unchanged" };
                    report.detail(format!(
                        "{key}: {} {state} files={} date={} \"{}\"",
                        commit.collection, commit.files, commit.date, commit.message
                    ));
                }
            }
        }
    }
    report.detail(format!(
        "processed={} missing={} not_viable={} commits={}",
        outcome.count(ArchiveStatus::Ready),
        outcome.count(ArchiveStatus::Missing),
        outcome.count(ArchiveStatus::NotViable),
        outcome.commit_count()
    ));
    audit::append_event(
        &paths.logs_dir,
        "run",
        "finished",
        &format!("commits={}", outcome.commit_count()),
    )?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::acquire_lock;
    use crate::error::HistoryError;

    #[test]
    fn second_lock_holder_is_refused() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join(".ags-history.lock");
        let _held = acquire_lock(&path).expect("first lock");
        let err = acquire_lock(&path).expect_err("second lock");
        assert!(matches!(
            err.downcast_ref::<HistoryError>(),
            Some(HistoryError::Locked(_))
        ));
    }
}
