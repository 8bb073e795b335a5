use crate::error::HistoryError;
use anyhow::Result;
use std::collections::BTreeMap;

const RELEASES: &[(&str, &str)] = &[
    ("AGS-3.3.4", "3.3.4"),
    ("AGS-3.3.2", "3.3.2"),
    ("AGS-3.3.0-hotfix2", "3.3.0-hotfix2"),
    ("AGS-3.3.0", "3.3.0"),
    ("AGS-3.2.1", "3.2.1"),
    ("AGS-3.2.0", "3.2.0"),
    ("AGS-3.1.2-SP1", "3.1.2-SP1"),
    ("AGS-3.1.2", "3.1.2"),
    ("AGS-3.1.1-Final", "3.1.1"),
    ("AGS-3.1.1", "3.1.1-pre"),
    ("AGS-3.1.0", "3.1.0"),
    ("AGS-3.0.2", "3.0.2"),
    ("AGS-3.0.1", "3.0.1"),
    ("AGS-3.0.0", "3.0.0"),
    ("demo2turn11", "2.4.0"),
    ("ags_23", "2.3.0"),
    ("ags_22", "2.2.0"),
    ("ags_214_sr5", "2.1.4-SR5"),
    ("ags_212", "2.1.2"),
    ("ags_211", "2.1.1"),
    ("ags_210", "2.1.0"),
    ("ags_207", "2.0.7"),
    ("ags_206", "2.0.6"),
    ("ags_205", "2.0.5"),
    ("ags_204", "2.0.4"),
    ("ags_203", "2.0.3"),
    ("ags_202", "2.0.2"),
    ("ags_201", "2.0.1"),
    ("ags_200x", "2.0.0"),
    ("ac_114", "1.1.4"),
    ("ac_113", "1.1.3"),
    ("ac_112", "1.1.2"),
    ("ac_11", "1.1.0"),
    ("ac_100", "1.0.0"),
];

/// Archive stem to release label, matched case-insensitively.
#[derive(Debug, Clone)]
pub struct VersionTable {
    labels: BTreeMap<String, String>,
}

impl Default for VersionTable {
    fn default() -> Self {
        Self {
            labels: RELEASES
                .iter()
                .map(|(stem, label)| (stem.to_lowercase(), (*label).to_string()))
                .collect(),
        }
    }
}

impl VersionTable {
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (stem, label) in overrides {
            self.labels.insert(stem.to_lowercase(), label.clone());
        }
        self
    }

    pub fn get(&self, stem: &str) -> Option<&str> {
        self.labels.get(&stem.to_lowercase()).map(String::as_str)
    }

    pub fn label(&self, stem: &str) -> Result<&str> {
        self.get(stem)
            .ok_or_else(|| HistoryError::UnknownVersion(stem.to_string()).into())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}

pub fn commit_message(collection: &str, product: &str, version: &str) -> String {
    format!("{collection} for {product} v{version}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let table = VersionTable::default();
        assert_eq!(table.get("ac_100"), Some("1.0.0"));
        assert_eq!(table.get("ags-3.1.1-final"), Some("3.1.1"));
        assert_eq!(table.get("AGS-3.1.1"), Some("3.1.1-pre"));
        assert_eq!(table.len(), RELEASES.len());
    }

    #[test]
    fn unknown_stem_is_typed_error() {
        let err = VersionTable::default().label("ags_99").expect_err("unknown");
        assert!(matches!(
            err.downcast_ref::<HistoryError>(),
            Some(HistoryError::UnknownVersion(_))
        ));
    }

    #[test]
    fn overrides_add_and_replace() {
        let overrides = BTreeMap::from([
            ("AGS-3.4.0".to_string(), "3.4.0".to_string()),
            ("ac_100".to_string(), "1.0.0-gold".to_string()),
        ]);
        let table = VersionTable::default().with_overrides(&overrides);
        assert_eq!(table.get("ags-3.4.0"), Some("3.4.0"));
        assert_eq!(table.get("AC_100"), Some("1.0.0-gold"));
    }

    #[test]
    fn message_names_collection_and_product() {
        assert_eq!(
            commit_message("Demo Quest", "Adventure Game Studio", "1.0.0"),
            "Demo Quest for Adventure Game Studio v1.0.0"
        );
    }
}
