use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod android;
mod artifact;
mod cli;
mod config_xml;
mod context;
mod env_patch;
mod hooks;
mod ios;
mod munge;
mod paths;
mod preferences;
mod util;

use cli::{Command, PreferencesArgs, RootArgs};
use context::BuildContext;
use preferences::PathRule;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = RootArgs::parse();
    match cli.command {
        Command::BeforePrepare(args) => hooks::run_before_prepare(&BuildContext::from_args(&args)?),
        Command::AfterPrepare(args) => hooks::run_after_prepare(&BuildContext::from_args(&args)?),
        Command::Preferences(args) => cmd_preferences(&args),
    }
}

fn cmd_preferences(args: &PreferencesArgs) -> Result<()> {
    let ctx = BuildContext::new(args.project_root.clone(), Vec::new());
    let preferences = preferences::read_preferences(&ctx)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&preferences)?);
        return Ok(());
    }
    let Some(preferences) = preferences else {
        println!("no <universal-links> block in {}", ctx.paths().config_xml_path().display());
        return Ok(());
    };
    for host in &preferences.hosts {
        println!(
            "{}://{} (event: {})",
            host.scheme.as_deref().unwrap_or("*"),
            host.name,
            host.event
        );
        for path in &host.paths {
            let rule = match &path.rule {
                PathRule::Any => "* (any path)".to_string(),
                PathRule::Pattern(url) => format!("{url} (pattern)"),
                PathRule::Exact(url) => format!("{url} (exact)"),
            };
            println!("  {rule} -> {}", path.event);
        }
    }
    Ok(())
}
