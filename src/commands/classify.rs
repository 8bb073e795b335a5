use anyhow::Result;

use crate::commands::{CommandReport, ConfigOverrides, effective_config};
use crate::history::classify::classify;
use crate::history::collection::{NamingConvention, default_collections};
use crate::history::normalize::normalize;
use crate::history::paths::paths_in;

#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    pub entries: Vec<String>,
    pub dos: bool,
    pub config: ConfigOverrides,
}

/// Show where archive entry paths would land, one line per entry.
pub fn run(opts: &ClassifyOptions) -> Result<CommandReport> {
    let cfg = effective_config(&opts.config)?;
    let rules = cfg.rule_set();
    let naming = if opts.dos {
        NamingConvention::Dos
    } else {
        NamingConvention::Default
    };
    let layout = paths_in(std::path::Path::new("."));
    let collections = default_collections(
        &layout.demo_repo,
        &layout.templates_repo,
        &layout.demo_readme,
        &layout.templates_readme,
    );
    let mut report = CommandReport::new("classify");

    for entry in &opts.entries {
        let tags = classify(entry, &rules.classifier);
        if tags.is_empty() {
            report.detail(format!("{entry}: ignored"));
            continue;
        }
        let targets: Vec<String> = collections
            .iter()
            .filter(|c| tags.contains(&c.tag))
            .map(|c| {
                let dest = normalize(entry, c.naming_for(naming), &rules.normalizer);
                format!("{}:{}/{dest}", c.tag, c.live_dir_name)
            })
            .collect();
        report.detail(format!("{entry}: {}", targets.join(" ")));
    }
    Ok(report)
}
