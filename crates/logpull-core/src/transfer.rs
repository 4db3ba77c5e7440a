//! Building and running the scp invocation that pulls dated log files.
//!
//! The remote pattern is `<remote_dir>/<date>*`. Wildcard expansion happens
//! on the remote side, so the date is passed through verbatim. The transfer
//! runs once, synchronously, with stdio inherited from the caller; whatever
//! scp exits with is handed back untouched.

use crate::config::Config;
use crate::error::{LogpullError, Result};
use crate::paths;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info, warn};

/// Remote file pattern selecting every file whose name starts with `date`.
pub fn remote_pattern(remote_dir: &str, date: &str) -> String {
    format!("{}/{}*", remote_dir.trim_end_matches('/'), date)
}

// ---------------------------------------------------------------------------
// TransferPlan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferPlan {
    pub date: String,
    pub key: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// `user@host:pattern`
    pub source: String,
    pub destination: PathBuf,
}

impl TransferPlan {
    pub fn build(config: &Config, date: &str) -> Result<Self> {
        let remote = &config.remote;
        if remote.user.trim().is_empty() {
            return Err(LogpullError::UserMissing);
        }
        if remote.host.trim().is_empty() {
            return Err(LogpullError::HostMissing);
        }
        let remote_dir = remote
            .dir
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or(LogpullError::RemoteDirMissing)?;
        if config.local_dir.trim().is_empty() {
            return Err(LogpullError::LocalDirMissing);
        }

        let key = config.credentials.key_for(&remote.user)?;
        let pattern = remote_pattern(remote_dir, date);
        let plan = Self {
            date: date.to_string(),
            key,
            port: remote.port,
            source: format!("{}@{}:{}", remote.user, remote.host, pattern),
            destination: paths::expand_home(&config.local_dir)?,
        };
        debug!(source = %plan.source, key = %plan.key.display(), "built transfer plan");
        Ok(plan)
    }

    pub fn argv(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-i".into(), self.key.clone().into_os_string()];
        if let Some(port) = self.port {
            args.push("-P".into());
            args.push(port.to_string().into());
        }
        args.push(self.source.clone().into());
        args.push(self.destination.clone().into_os_string());
        args
    }

    /// Human-readable rendering of the command, for logs and dry runs.
    pub fn display_command(&self, program: &str) -> String {
        std::iter::once(program.to_string())
            .chain(self.argv().iter().map(|a| quote(&a.to_string_lossy())))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@*~\\+=,".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct TransferOutcome {
    pub status: ExitStatus,
}

impl TransferOutcome {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code to hand back to the shell. A signal-terminated scp has no
    /// code and maps to 1.
    pub fn exit_code(&self) -> i32 {
        self.status.code().unwrap_or(1)
    }
}

/// Locate `program` on `PATH` (or use it directly when it is a path).
pub fn resolve_program(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| LogpullError::ScpNotFound(program.to_string()))
}

/// Run scp for `plan` and wait for it. Only a failure to start the process is
/// an error; a non-zero exit is reported through the outcome.
pub fn run(plan: &TransferPlan, program: &str) -> Result<TransferOutcome> {
    let resolved = resolve_program(program)?;
    run_resolved(plan, &resolved)
}

fn run_resolved(plan: &TransferPlan, program: &Path) -> Result<TransferOutcome> {
    info!(command = %plan.display_command(&program.display().to_string()), "starting transfer");

    let status = Command::new(program)
        .args(plan.argv())
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| LogpullError::SpawnFailed(e.to_string()))?;

    let outcome = TransferOutcome { status };
    if !outcome.success() {
        warn!(code = outcome.exit_code(), "scp exited with failure");
    }
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut cfg = Config::new("sqa24", "satori-login-002.mit.edu");
        cfg.remote.dir = Some("/home/sqa24/logs".to_string());
        cfg.local_dir = "/data/log".to_string();
        cfg.credentials.set("sqa24", "/keys/ubuntu/id_rsa");
        cfg.credentials.set_fallback("/keys/other/id_rsa");
        cfg
    }

    #[test]
    fn pattern_is_dir_date_wildcard() {
        for date in ["20241006", "2024", "", "not a date", "2024-10-06_x"] {
            assert_eq!(
                remote_pattern("/var/log/app", date),
                format!("/var/log/app/{date}*")
            );
        }
    }

    #[test]
    fn pattern_collapses_trailing_separators() {
        assert_eq!(remote_pattern("/var/log/", "20241006"), "/var/log/20241006*");
        assert_eq!(remote_pattern("/var/log//", "20241006"), "/var/log/20241006*");
        assert_eq!(remote_pattern("/", "20241006"), "/20241006*");
        assert_eq!(remote_pattern("logs", "20241006"), "logs/20241006*");
    }

    #[test]
    fn scenario_sqa24() {
        let plan = TransferPlan::build(&config(), "20241006").unwrap();
        assert_eq!(plan.key, PathBuf::from("/keys/ubuntu/id_rsa"));
        assert_eq!(
            plan.source,
            "sqa24@satori-login-002.mit.edu:/home/sqa24/logs/20241006*"
        );
        assert_eq!(plan.destination, PathBuf::from("/data/log"));
        assert_eq!(
            plan.argv(),
            vec![
                OsString::from("-i"),
                OsString::from("/keys/ubuntu/id_rsa"),
                OsString::from("sqa24@satori-login-002.mit.edu:/home/sqa24/logs/20241006*"),
                OsString::from("/data/log"),
            ]
        );
    }

    #[test]
    fn other_user_switches_only_the_key() {
        let base = TransferPlan::build(&config(), "20241006").unwrap();
        let mut cfg = config();
        cfg.remote.user = "alice".to_string();
        let plan = TransferPlan::build(&cfg, "20241006").unwrap();
        assert_eq!(plan.key, PathBuf::from("/keys/other/id_rsa"));
        assert_eq!(plan.destination, base.destination);
        assert_eq!(
            plan.source,
            "alice@satori-login-002.mit.edu:/home/sqa24/logs/20241006*"
        );
    }

    #[test]
    fn port_is_passed_with_capital_p() {
        let mut cfg = config();
        cfg.remote.port = Some(2222);
        let argv = TransferPlan::build(&cfg, "20241006").unwrap().argv();
        assert_eq!(argv[2], OsString::from("-P"));
        assert_eq!(argv[3], OsString::from("2222"));
    }

    #[test]
    fn missing_remote_dir_is_rejected() {
        let mut cfg = config();
        cfg.remote.dir = None;
        assert!(matches!(
            TransferPlan::build(&cfg, "20241006"),
            Err(LogpullError::RemoteDirMissing)
        ));
        cfg.remote.dir = Some("  ".to_string());
        assert!(matches!(
            TransferPlan::build(&cfg, "20241006"),
            Err(LogpullError::RemoteDirMissing)
        ));
    }

    #[test]
    fn missing_identity_is_rejected() {
        let mut cfg = config();
        cfg.remote.host.clear();
        assert!(matches!(
            TransferPlan::build(&cfg, "x"),
            Err(LogpullError::HostMissing)
        ));
        let mut cfg = config();
        cfg.remote.user.clear();
        assert!(matches!(
            TransferPlan::build(&cfg, "x"),
            Err(LogpullError::UserMissing)
        ));
    }

    #[test]
    fn display_quotes_odd_arguments() {
        let mut cfg = config();
        cfg.local_dir = "/data/my logs".to_string();
        let plan = TransferPlan::build(&cfg, "20241006").unwrap();
        assert_eq!(
            plan.display_command("scp"),
            "scp -i /keys/ubuntu/id_rsa \
             sqa24@satori-login-002.mit.edu:/home/sqa24/logs/20241006* '/data/my logs'"
        );
    }

    #[test]
    fn unknown_program_is_not_found() {
        let plan = TransferPlan::build(&config(), "20241006").unwrap();
        assert!(matches!(
            run(&plan, "logpull-no-such-scp-binary"),
            Err(LogpullError::ScpNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_is_passed_through() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("fake-scp");
        std::fs::write(&script, "#!/bin/sh\nexit 7\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let plan = TransferPlan::build(&config(), "20241006").unwrap();
        let outcome = run(&plan, &script.display().to_string()).unwrap();
        assert!(!outcome.success());
        assert_eq!(outcome.exit_code(), 7);
    }
}
