use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub fn parse_order(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .collect()
}

pub fn load_order_file(path: &Path) -> Result<Vec<String>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_order(&raw))
}

/// Find the archive for an order key; bare stems also match `<stem><container ext>`.
pub fn resolve<'a>(
    key: &str,
    lookup: &'a BTreeMap<String, PathBuf>,
    container_extension: &str,
) -> Option<&'a PathBuf> {
    lookup
        .get(key)
        .or_else(|| lookup.get(&format!("{key}{container_extension}")))
}
