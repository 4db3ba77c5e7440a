use crate::output::print_json;
use anyhow::Context;
use chrono::{Days, Local};
use clap::Args;
use logpull_core::config::{Config, Overrides};
use logpull_core::transfer::{self, TransferPlan};
use std::path::Path;

#[derive(Args)]
pub struct PullArgs {
    /// Date prefix of the files to copy (default: config default_date)
    #[arg(long, conflicts_with = "days_ago")]
    pub date: Option<String>,

    /// Use the local date N days ago, formatted YYYYMMDD
    #[arg(long, value_name = "N")]
    pub days_ago: Option<u64>,

    /// Print the scp command instead of running it
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Per-invocation overrides of the config file.
#[derive(Args)]
pub struct OverrideArgs {
    /// Remote username
    #[arg(long, env = "LOGPULL_USER")]
    pub user: Option<String>,

    /// Remote host
    #[arg(long, env = "LOGPULL_HOST")]
    pub host: Option<String>,

    /// Remote SSH port
    #[arg(long, env = "LOGPULL_PORT")]
    pub port: Option<u16>,

    /// Remote directory holding the log files
    #[arg(long, env = "LOGPULL_REMOTE_DIR")]
    pub remote_dir: Option<String>,

    /// Local destination directory
    #[arg(long, env = "LOGPULL_LOCAL_DIR")]
    pub local_dir: Option<String>,

    /// Private key to use, ignoring the credential map
    #[arg(long, short = 'i', env = "LOGPULL_KEY")]
    pub key: Option<String>,

    /// scp program name or path
    #[arg(long = "scp", value_name = "PROGRAM", env = "LOGPULL_SCP")]
    pub scp_program: Option<String>,
}

impl From<OverrideArgs> for Overrides {
    fn from(args: OverrideArgs) -> Self {
        Overrides {
            user: args.user,
            host: args.host,
            port: args.port,
            remote_dir: args.remote_dir,
            local_dir: args.local_dir,
            key: args.key,
            scp_program: args.scp_program,
        }
    }
}

pub fn run(root: &Path, args: PullArgs, json: bool) -> anyhow::Result<i32> {
    let config = Config::load_or_default(root)
        .context("failed to load config")?
        .anchored(root)
        .apply(args.overrides.into());

    let date = match (args.date, args.days_ago) {
        (Some(date), _) => date,
        (None, Some(n)) => days_ago(n)?,
        (None, None) => config.default_date.clone(),
    };

    let plan = TransferPlan::build(&config, &date).context("cannot build transfer")?;

    if args.dry_run {
        if json {
            print_json(&serde_json::json!({
                "program": config.scp_program,
                "plan": plan,
                "command": plan.display_command(&config.scp_program),
            }))?;
        } else {
            println!("{}", plan.display_command(&config.scp_program));
        }
        return Ok(0);
    }

    let outcome = transfer::run(&plan, &config.scp_program)?;
    if json {
        print_json(&serde_json::json!({
            "plan": plan,
            "success": outcome.success(),
            "exit_code": outcome.exit_code(),
        }))?;
    }
    Ok(outcome.exit_code())
}

fn days_ago(n: u64) -> anyhow::Result<String> {
    let day = Local::now()
        .date_naive()
        .checked_sub_days(Days::new(n))
        .ok_or_else(|| anyhow::anyhow!("--days-ago {n} is out of range"))?;
    Ok(day.format("%Y%m%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_ago_zero_is_today() {
        let today = Local::now().date_naive().format("%Y%m%d").to_string();
        let got = days_ago(0).unwrap();
        // The clock may tick over midnight between the two reads.
        assert!(got.as_str() >= today.as_str(), "{got} vs {today}");
        assert_eq!(got.len(), 8);
        assert!(got.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn days_ago_out_of_range_fails() {
        assert!(days_ago(u64::MAX).is_err());
    }
}
