mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, init::InitArgs, pull::PullArgs};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "logpull",
    about = "Copy date-stamped log files from a remote host over scp",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .logpull/)
    #[arg(long, global = true, env = "LOGPULL_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config to .logpull/config.yaml
    Init(InitArgs),

    /// Copy the log files for one date from the remote host
    Pull(PullArgs),

    /// Inspect and edit the config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Accept the single-dash `-date` spelling as `--date`. Left alone, clap
/// would not recognise it as a long flag.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-date") => OsString::from("--date"),
            Some(s) if s.starts_with("-date=") => OsString::from(format!("-{s}")),
            _ => arg,
        })
        .collect()
}

fn main() {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::WARN.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    // Ok carries the process exit code; for pull that is scp's own code.
    let result = match cli.command {
        Commands::Init(args) => cmd::init::run(&root, args, cli.json).map(|_| 0),
        Commands::Pull(args) => cmd::pull::run(&root, args, cli.json),
        Commands::Config { subcommand } => {
            cmd::config::run(&root, subcommand, cli.json).map(|_| 0)
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
