use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use logpull_core::config::{Config, WarnLevel};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the current config
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Manage the username → private key mapping
    Credential {
        #[command(subcommand)]
        subcommand: CredentialSubcommand,
    },
}

#[derive(Subcommand)]
pub enum CredentialSubcommand {
    /// Map a remote user to a private key
    Set { user: String, key: String },

    /// Set the key used for users without their own entry
    Fallback { key: String },

    /// Remove a user's key mapping
    Remove { user: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
        ConfigSubcommand::Credential { subcommand } => credential(root, subcommand),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;

    if json {
        return print_json(&config);
    }

    let remote = &config.remote;
    let port = remote.port.map(|p| format!(":{p}")).unwrap_or_default();
    println!("Remote:       {}@{}{}", remote.user, remote.host, port);
    println!(
        "Remote dir:   {}",
        remote.dir.as_deref().unwrap_or("(not set)")
    );
    println!("Local dir:    {}", config.local_dir);
    println!("Default date: {}", config.default_date);
    println!("scp program:  {}", config.scp_program);
    println!();

    let mut rows: Vec<Vec<String>> = config
        .credentials
        .keys
        .iter()
        .map(|(user, key)| vec![user.clone(), key.clone()])
        .collect();
    if let Some(fallback) = &config.credentials.fallback {
        rows.push(vec!["(fallback)".to_string(), fallback.clone()]);
    }
    if rows.is_empty() {
        println!("No credentials configured.");
    } else {
        print_table(&["USER", "KEY"], rows);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root)
        .context("failed to load config")?
        .anchored(root);
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// credential
// ---------------------------------------------------------------------------

fn credential(root: &Path, subcmd: CredentialSubcommand) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    let message = match subcmd {
        CredentialSubcommand::Set { user, key } => {
            let message = format!("User '{user}' now uses key '{key}'.");
            config.credentials.set(user, key);
            message
        }
        CredentialSubcommand::Fallback { key } => {
            let message = format!("Fallback key set to '{key}'.");
            config.credentials.set_fallback(key);
            message
        }
        CredentialSubcommand::Remove { user } => {
            config.credentials.remove(&user)?;
            format!("Removed key mapping for '{user}'.")
        }
    };
    config.save(root).context("failed to save config")?;
    println!("{message}");
    Ok(())
}
