use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use logpull_core::config::Config;
use logpull_core::{paths, LogpullError};
use std::path::Path;

#[derive(Args)]
pub struct InitArgs {
    /// Remote username
    #[arg(long)]
    pub user: String,

    /// Remote host
    #[arg(long)]
    pub host: String,

    /// Remote SSH port
    #[arg(long)]
    pub port: Option<u16>,

    /// Remote directory holding the log files
    #[arg(long)]
    pub remote_dir: Option<String>,

    /// Local destination directory
    #[arg(long, default_value = ".")]
    pub local_dir: String,

    /// Private key for --user
    #[arg(long)]
    pub key: Option<String>,

    /// Key used for any user without its own entry
    #[arg(long)]
    pub fallback_key: Option<String>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

pub fn run(root: &Path, args: InitArgs, json: bool) -> anyhow::Result<()> {
    let path = paths::config_path(root);
    if path.exists() && !args.force {
        return Err(LogpullError::ConfigExists(path.display().to_string()).into());
    }

    let mut config = Config::new(args.user, args.host);
    config.remote.port = args.port;
    config.remote.dir = args.remote_dir;
    config.local_dir = args.local_dir;
    if let Some(key) = args.key {
        let user = config.remote.user.clone();
        config.credentials.set(user, key);
    }
    if let Some(fallback) = args.fallback_key {
        config.credentials.set_fallback(fallback);
    }

    config.save(root).context("failed to write config")?;
    tracing::debug!(path = %path.display(), "wrote config");

    if json {
        print_json(&serde_json::json!({ "path": path, "config": config }))?;
    } else {
        println!("Wrote {}", path.display());
        if config.remote.dir.is_none() {
            println!("remote.dir is not set yet; pass --remote-dir to pull or edit the config.");
        }
    }
    Ok(())
}
