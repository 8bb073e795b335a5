//! Classification, naming and viability tables.
//!
//! The tables changed over the life of the archive set, so each historical
//! variant is a `RuleProfile` that yields an immutable `RuleSet`. Nothing in
//! the core reads module-level state; callers pass the `RuleSet` down.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleProfile {
    /// Viability proven by compiled room or script files only.
    Original,
    /// Template-only archives are viable too.
    #[default]
    Extended,
}

impl RuleProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for RuleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleProfile {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "extended" => Ok(Self::Extended),
            other => Err(anyhow!(
                "unknown rule profile `{other}`: use `original` or `extended`"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRules {
    /// Exact filenames (lowercase) that never belong to the demo collection.
    pub demo_denylist: Vec<String>,
    /// Substrings of the lowercased path that mark demo content.
    pub demo_markers: Vec<String>,
    /// Extensions (lowercase, with dot) of game data files.
    pub demo_extensions: Vec<String>,
    pub template_extension: String,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            demo_denylist: strings(&[
                "acwin.exe",
                "all3927.dll",
                "seer.dll",
                "demo.bat",
                "agssave.999",
            ]),
            demo_markers: strings(&["demo game/", "demo/", "demo"]),
            demo_extensions: strings(&[
                ".crm", ".prg", ".dat", ".dta", ".spr", ".wav", ".mid", ".pcx", ".ags",
            ]),
            template_extension: ".agt".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixup {
    pub find: String,
    pub replace: String,
}

impl Fixup {
    fn new(find: &str, replace: &str) -> Self {
        Self {
            find: find.to_string(),
            replace: replace.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerRules {
    /// Leading directory segments starting with one of these are dropped.
    pub noise_prefixes: Vec<String>,
    /// Filenames starting with one of these get title-cased.
    pub keyword_prefixes: Vec<String>,
    /// Literal replacements applied after title-casing, in order.
    pub fixups: Vec<Fixup>,
    pub template_extension: String,
    /// Archive stems starting with one of these use DOS naming.
    pub dos_key_prefixes: Vec<String>,
}

impl Default for NormalizerRules {
    fn default() -> Self {
        Self {
            noise_prefixes: strings(&[
                "ags",
                "{app}",
                "{commonappdata}",
                "demo",
                "demo game",
                "templates",
            ]),
            keyword_prefixes: strings(&[
                "room",
                "game",
                "globalscript",
                "minigame",
                "music",
                "sound",
            ]),
            fixups: vec![
                Fixup::new("Globalscript", "GlobalScript"),
                Fixup::new("Minigame", "MiniGame"),
                Fixup::new("Game.Agf", "Game.agf"),
            ],
            template_extension: ".agt".to_string(),
            dos_key_prefixes: strings(&["ac_1", "ags_2"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViabilityRules {
    /// Archive container extension (lowercase, with dot).
    pub container_extension: String,
    /// At least one entry must carry one of these extensions.
    pub proof_extensions: Vec<String>,
}

impl ViabilityRules {
    pub fn for_profile(profile: RuleProfile) -> Self {
        let proof_extensions = match profile {
            RuleProfile::Original => strings(&[".crm", ".asc"]),
            RuleProfile::Extended => strings(&[".crm", ".asc", ".agt"]),
        };
        Self {
            container_extension: ".zip".to_string(),
            proof_extensions,
        }
    }
}

impl Default for ViabilityRules {
    fn default() -> Self {
        Self::for_profile(RuleProfile::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleSet {
    pub profile: RuleProfile,
    pub classifier: ClassifierRules,
    pub normalizer: NormalizerRules,
    pub viability: ViabilityRules,
}

impl RuleSet {
    pub fn for_profile(profile: RuleProfile) -> Self {
        Self {
            profile,
            classifier: ClassifierRules::default(),
            normalizer: NormalizerRules::default(),
            viability: ViabilityRules::for_profile(profile),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let extensions = self
            .classifier
            .demo_extensions
            .iter()
            .chain(&self.viability.proof_extensions)
            .chain([
                &self.classifier.template_extension,
                &self.normalizer.template_extension,
                &self.viability.container_extension,
            ]);
        for ext in extensions {
            if !ext.starts_with('.') || ext.len() < 2 || *ext != ext.to_ascii_lowercase() {
                return Err(anyhow!(
                    "invalid extension `{ext}`: require lowercase with leading dot"
                ));
            }
        }
        if self.viability.proof_extensions.is_empty() {
            return Err(anyhow!("invalid viability rules: proof extensions empty"));
        }
        if self.normalizer.fixups.iter().any(|f| f.find.is_empty()) {
            return Err(anyhow!("invalid normalizer fixup: empty find string"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{RuleProfile, RuleSet};

    #[test]
    fn extended_profile_accepts_template_archives() {
        let original = RuleSet::for_profile(RuleProfile::Original);
        let extended = RuleSet::for_profile(RuleProfile::Extended);
        assert!(!original.viability.proof_extensions.contains(&".agt".to_string()));
        assert!(extended.viability.proof_extensions.contains(&".agt".to_string()));
        assert_eq!(original.classifier, extended.classifier);
    }

    #[test]
    fn builtin_profiles_validate() {
        RuleSet::for_profile(RuleProfile::Original)
            .validate()
            .expect("original valid");
        RuleSet::for_profile(RuleProfile::Extended)
            .validate()
            .expect("extended valid");
    }

    #[test]
    fn uppercase_extension_is_rejected() {
        let mut rules = RuleSet::default();
        rules.viability.proof_extensions.push(".CRM".to_string());
        assert!(rules.validate().is_err());
    }

    #[test]
    fn profile_parses_case_insensitively() {
        assert_eq!(
            " Original ".parse::<RuleProfile>().expect("parse"),
            RuleProfile::Original
        );
        assert!("newest".parse::<RuleProfile>().is_err());
    }
}
