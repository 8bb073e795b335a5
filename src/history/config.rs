use crate::error::HistoryError;
use crate::history::recorder::IdentityRule;
use crate::history::rules::{
    ClassifierRules, NormalizerRules, RuleProfile, RuleSet, ViabilityRules,
};
use crate::history::scanner::CollisionPolicy;
use crate::history::timestamps::{DEFAULT_TIMEZONE, parse_local, parse_timezone};
use crate::history::vcs::Identity;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub profile: RuleProfile,
    pub collision_policy: CollisionPolicy,
    pub timezone: String,
    pub product_name: String,
    pub git_bin: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            profile: RuleProfile::default(),
            collision_policy: CollisionPolicy::default(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            product_name: "Adventure Game Studio".to_string(),
            git_bin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub before_name: String,
    pub before_email: String,
    pub after_name: String,
    pub after_email: String,
    /// Local time in the run timezone, `YYYY-MM-DDTHH:MM:SS`.
    pub cutoff: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            before_name: "CJ".to_string(),
            before_email: String::new(),
            after_name: "AGS Team".to_string(),
            after_email: String::new(),
            cutoff: "2011-06-01T00:00:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuleOverrides {
    pub classifier: Option<ClassifierRules>,
    pub normalizer: Option<NormalizerRules>,
    pub viability: Option<ViabilityRules>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HistoryConfig {
    pub run: RunConfig,
    pub identity: IdentityConfig,
    pub rules: RuleOverrides,
    pub versions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialHistoryConfig {
    run: Option<RunConfig>,
    identity: Option<IdentityConfig>,
    rules: Option<RuleOverrides>,
    versions: Option<BTreeMap<String, String>>,
}

impl HistoryConfig {
    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.run.timezone)
    }

    pub fn rule_set(&self) -> RuleSet {
        let mut rules = RuleSet::for_profile(self.run.profile);
        if let Some(classifier) = &self.rules.classifier {
            rules.classifier = classifier.clone();
        }
        if let Some(normalizer) = &self.rules.normalizer {
            rules.normalizer = normalizer.clone();
        }
        if let Some(viability) = &self.rules.viability {
            rules.viability = viability.clone();
        }
        rules
    }

    pub fn identity_rule(&self) -> Result<IdentityRule> {
        let tz = self.timezone()?;
        Ok(IdentityRule {
            before: Identity::new(&self.identity.before_name, &self.identity.before_email),
            after: Identity::new(&self.identity.after_name, &self.identity.after_email),
            cutoff: parse_local(tz, &self.identity.cutoff)?,
        })
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_parsed<T>(var: &str, fallback: T) -> Result<T>
where
    T: std::str::FromStr<Err = anyhow::Error>,
{
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v
            .parse::<T>()
            .map_err(|err| HistoryError::InvalidConfig(format!("{var}: {err}")).into()),
        _ => Ok(fallback),
    }
}

fn invalid(message: impl Into<String>) -> anyhow::Error {
    HistoryError::InvalidConfig(message.into()).into()
}

fn validate(cfg: &HistoryConfig) -> Result<()> {
    cfg.timezone().map_err(|err| invalid(format!("{err:#}")))?;
    cfg.identity_rule().map_err(|err| invalid(format!("{err:#}")))?;
    cfg.rule_set()
        .validate()
        .map_err(|err| invalid(format!("{err:#}")))?;
    if cfg.identity.before_name.trim().is_empty() || cfg.identity.after_name.trim().is_empty() {
        return Err(invalid("identity names cannot be empty"));
    }
    if cfg.run.product_name.trim().is_empty() {
        return Err(invalid("product name cannot be empty"));
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("AGS_HISTORY_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    Some(dirs::config_dir()?.join("ags-history").join("config.toml"))
}

fn merge_toml(base: &mut HistoryConfig, raw: &str) -> Result<()> {
    let parsed: PartialHistoryConfig =
        toml::from_str(raw).map_err(|err| invalid(format!("failed to parse config: {err}")))?;
    if let Some(run) = parsed.run {
        base.run = run;
    }
    if let Some(identity) = parsed.identity {
        base.identity = identity;
    }
    if let Some(rules) = parsed.rules {
        base.rules = rules;
    }
    if let Some(versions) = parsed.versions {
        base.versions.extend(versions);
    }
    Ok(())
}

fn merge_file_config(base: &mut HistoryConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)
        .map_err(|err| invalid(format!("failed to read {}: {err}", path.display())))?;
    merge_toml(base, &raw).with_context(|| format!("in config file {}", path.display()))
}

pub fn load_config() -> Result<HistoryConfig> {
    let mut cfg = HistoryConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.run.profile = env_parsed("AGS_HISTORY_PROFILE", cfg.run.profile)?;
    cfg.run.collision_policy =
        env_parsed("AGS_HISTORY_COLLISION_POLICY", cfg.run.collision_policy)?;
    cfg.run.timezone = env_or_string("AGS_HISTORY_TIMEZONE", &cfg.run.timezone);
    cfg.run.product_name = env_or_string("AGS_HISTORY_PRODUCT", &cfg.run.product_name);
    if let Ok(git) = env::var("AGS_HISTORY_GIT") {
        if !git.trim().is_empty() {
            cfg.run.git_bin = Some(git.trim().to_string());
        }
    }
    cfg.identity.cutoff = env_or_string("AGS_HISTORY_CUTOFF", &cfg.identity.cutoff);

    validate(&cfg)?;
    Ok(cfg)
}

/// Re-check after CLI flags have been layered on top of `load_config`.
pub fn revalidate(cfg: &HistoryConfig) -> Result<()> {
    validate(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        validate(&HistoryConfig::default()).expect("defaults valid");
    }

    #[test]
    fn file_sections_replace_defaults_and_versions_extend() {
        let mut cfg = HistoryConfig::default();
        merge_toml(
            &mut cfg,
            r#"
[run]
profile = "original"
collision_policy = "fail"
timezone = "UTC"
product_name = "AGS"

[rules.viability]
container_extension = ".zip"
proof_extensions = [".crm"]

[versions]
"AGS-3.4.0" = "3.4.0"
"#,
        )
        .expect("merge");

        assert_eq!(cfg.run.profile, RuleProfile::Original);
        assert_eq!(cfg.run.collision_policy, CollisionPolicy::Fail);
        assert_eq!(cfg.identity.before_name, "CJ");
        assert_eq!(cfg.rule_set().viability.proof_extensions, vec![".crm"]);
        assert_eq!(cfg.versions["AGS-3.4.0"], "3.4.0");
        validate(&cfg).expect("valid");
    }

    #[test]
    fn bad_timezone_is_invalid_config() {
        let mut cfg = HistoryConfig::default();
        cfg.run.timezone = "Nowhere/Land".to_string();
        let err = validate(&cfg).expect_err("invalid");
        assert!(matches!(
            err.downcast_ref::<HistoryError>(),
            Some(HistoryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn bad_cutoff_is_rejected() {
        let mut cfg = HistoryConfig::default();
        cfg.identity.cutoff = "June 2011".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let mut cfg = HistoryConfig::default();
        assert!(merge_toml(&mut cfg, "[run\nprofile=").is_err());
    }

    #[test]
    fn identity_rule_uses_configured_cutoff() {
        let mut cfg = HistoryConfig::default();
        cfg.identity.cutoff = "2005-01-01T00:00:00".to_string();
        let rule = cfg.identity_rule().expect("rule");
        assert_eq!(rule.cutoff.to_rfc3339(), "2005-01-01T00:00:00+00:00");
        assert_eq!(rule.after.signature(), "AGS Team <>");
    }
}
