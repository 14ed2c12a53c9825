//! CLI argument parsing for the prepare hooks.
//!
//! Build tools run script hooks with the project root as working directory and
//! describe the invocation through `CORDOVA_*` environment variables, so every
//! hook flag falls back to the matching variable.
use crate::context::OperationKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint for the hook binary.
#[derive(Parser, Debug)]
#[command(
    name = "ulhooks",
    version,
    about = "Prepare-stage hooks that wire universal links into native projects",
    after_help = "Commands:\n  before-prepare   Rename stale entitlements, register custom URL schemes\n  after-prepare    Inject manifest filters and iOS associated domains\n  preferences      Print the normalized <universal-links> preferences\n\nExamples:\n  CORDOVA_PLATFORMS=ios ulhooks before-prepare\n  ulhooks after-prepare --project-root ./app --platforms android,ios\n  ulhooks preferences --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level hook commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    BeforePrepare(HookArgs),
    AfterPrepare(HookArgs),
    Preferences(PreferencesArgs),
}

/// Build invocation shared by both lifecycle hooks.
#[derive(Parser, Debug, Clone)]
pub struct HookArgs {
    /// Project root containing config.xml, plugins/ and platforms/
    #[arg(long, value_name = "DIR", env = "CORDOVA_PROJECT_ROOT", default_value = ".")]
    pub project_root: PathBuf,

    /// Platforms targeted by this invocation (comma separated)
    #[arg(
        long,
        value_name = "LIST",
        env = "CORDOVA_PLATFORMS",
        value_delimiter = ',',
        default_value = ""
    )]
    pub platforms: Vec<String>,

    /// Raw command line of the build tool invocation
    #[arg(long, value_name = "TEXT", env = "CORDOVA_CMDLINE")]
    pub cmd_line: Option<String>,

    /// Operation kind reported by the build tool; inferred from --cmd-line when absent
    #[arg(long, value_enum, value_name = "KIND", env = "ULHOOKS_OPERATION")]
    pub operation: Option<OperationKind>,

    /// Build tool dependency tree (defaults to <root>/node_modules/cordova/node_modules)
    #[arg(long, value_name = "DIR", env = "ULHOOKS_TOOL_MODULES")]
    pub tool_modules: Option<PathBuf>,
}

/// Preferences command inputs.
#[derive(Parser, Debug)]
#[command(about = "Print the universal-links preferences read from config.xml")]
pub struct PreferencesArgs {
    /// Project root containing config.xml
    #[arg(long, value_name = "DIR", env = "CORDOVA_PROJECT_ROOT", default_value = ".")]
    pub project_root: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
