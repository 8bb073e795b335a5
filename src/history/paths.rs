use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct HistoryPaths {
    pub work_dir: PathBuf,
    pub data_dir: PathBuf,
    pub order_file: PathBuf,
    pub demo_repo: PathBuf,
    pub templates_repo: PathBuf,
    pub demo_readme: PathBuf,
    pub templates_readme: PathBuf,
    pub logs_dir: PathBuf,
    pub lock_file: PathBuf,
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

/// Lay out every input and output relative to `work_dir`.
pub fn paths_in(work_dir: &Path) -> HistoryPaths {
    let work_dir = work_dir.to_path_buf();
    let data_dir = env_or_default_path("AGS_HISTORY_DATA_DIR", work_dir.join("data"));
    let order_file = env_or_default_path("AGS_HISTORY_ORDER_FILE", work_dir.join("order.txt"));
    let demo_repo = env_or_default_path("AGS_HISTORY_DEMO_REPO", work_dir.join("extracted-demo"));
    let templates_repo = env_or_default_path(
        "AGS_HISTORY_TEMPLATES_REPO",
        work_dir.join("extracted-templates"),
    );
    let demo_readme =
        env_or_default_path("AGS_HISTORY_DEMO_README", work_dir.join("GAME_README.md"));
    let templates_readme = env_or_default_path(
        "AGS_HISTORY_TEMPLATES_README",
        work_dir.join("TEMPLATES_README.md"),
    );
    let logs_dir = env_or_default_path("AGS_HISTORY_LOGS_DIR", work_dir.join("logs"));
    let lock_file = work_dir.join(".ags-history.lock");

    HistoryPaths {
        work_dir,
        data_dir,
        order_file,
        demo_repo,
        templates_repo,
        demo_readme,
        templates_readme,
        logs_dir,
        lock_file,
    }
}

pub fn resolve_paths() -> Result<HistoryPaths> {
    let cwd = env::current_dir().context("current directory could not be resolved")?;
    let work_dir = env_or_default_path("AGS_HISTORY_HOME", cwd);
    Ok(paths_in(&work_dir))
}
