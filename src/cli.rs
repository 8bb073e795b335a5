use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

use crate::commands::{
    self, CommandReport, ConfigOverrides, WorkspaceOverrides, classify::ClassifyOptions,
    plan::PlanOptions, run::RunOptions, scan::ScanOptions,
};
use crate::history::rules::RuleProfile;
use crate::history::scanner::CollisionPolicy;
use crate::logging;

#[derive(Debug, Parser)]
#[command(
    name = "ags-history",
    version,
    about = "Rebuild the demo game and template histories from historical release archives"
)]
struct Cli {
    /// Print the command report as JSON and log as JSON lines.
    #[arg(long, global = true)]
    json: bool,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Args)]
struct WorkspaceArgs {
    /// Directory holding the readme seeds and receiving both histories.
    #[arg(long)]
    work_dir: Option<PathBuf>,
    /// Directory searched recursively for release archives.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Text file listing archive keys, oldest first.
    #[arg(long = "order")]
    order_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct RuleArgs {
    #[arg(long)]
    profile: Option<RuleProfile>,
    #[arg(long)]
    collision_policy: Option<CollisionPolicy>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Initialise both histories and replay every archive in order.
    Run {
        #[command(flatten)]
        workspace: WorkspaceArgs,
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// List viable archives and the keys they are known by.
    Scan {
        #[command(flatten)]
        workspace: WorkspaceArgs,
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Resolve the order file against the archive set without writing anything.
    Plan {
        #[command(flatten)]
        workspace: WorkspaceArgs,
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Show which collections archive entry paths belong to and where they land.
    Classify {
        #[arg(required = true)]
        entries: Vec<String>,
        /// Use the DOS naming convention of the earliest releases.
        #[arg(long)]
        dos: bool,
        #[arg(long)]
        profile: Option<RuleProfile>,
    },
}

impl From<WorkspaceArgs> for WorkspaceOverrides {
    fn from(args: WorkspaceArgs) -> Self {
        Self {
            work_dir: args.work_dir,
            data_dir: args.data_dir,
            order_file: args.order_file,
        }
    }
}

impl From<RuleArgs> for ConfigOverrides {
    fn from(args: RuleArgs) -> Self {
        Self {
            profile: args.profile,
            collision_policy: args.collision_policy,
        }
    }
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let status = if report.ok { "ok" } else { "failed" };
    println!("{}: {status}", report.command);
    for line in &report.details {
        println!("  {line}");
    }
    for line in &report.issues {
        println!("  issue: {line}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    logging::init(cli.json, level);

    let report = match cli.command {
        Command::Run { workspace, rules } => commands::run::run(&RunOptions {
            workspace: workspace.into(),
            config: rules.into(),
        })?,
        Command::Scan { workspace, rules } => commands::scan::run(&ScanOptions {
            workspace: workspace.into(),
            config: rules.into(),
        })?,
        Command::Plan { workspace, rules } => commands::plan::run(&PlanOptions {
            workspace: workspace.into(),
            config: rules.into(),
        })?,
        Command::Classify {
            entries,
            dos,
            profile,
        } => commands::classify::run(&ClassifyOptions {
            entries,
            dos,
            config: ConfigOverrides {
                profile,
                collision_policy: None,
            },
        })?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        bail!("{} reported {} issue(s)", report.command, report.issues.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse_into_overrides() {
        let cli = Cli::try_parse_from([
            "ags-history",
            "run",
            "--work-dir",
            "/tmp/w",
            "--order",
            "/tmp/order.txt",
            "--profile",
            "original",
            "--collision-policy",
            "fail",
        ])
        .expect("parse");
        let Command::Run { workspace, rules } = cli.command else {
            panic!("expected run");
        };
        let workspace = WorkspaceOverrides::from(workspace);
        let config = ConfigOverrides::from(rules);
        assert_eq!(workspace.work_dir, Some(PathBuf::from("/tmp/w")));
        assert_eq!(workspace.order_file, Some(PathBuf::from("/tmp/order.txt")));
        assert_eq!(config.profile, Some(RuleProfile::Original));
        assert_eq!(config.collision_policy, Some(CollisionPolicy::Fail));
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert!(Cli::try_parse_from(["ags-history", "scan", "--profile", "modern"]).is_err());
    }
}
