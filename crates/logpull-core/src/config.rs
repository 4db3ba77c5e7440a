use crate::credentials::CredentialMap;
use crate::error::{LogpullError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DEFAULT_DATE: &str = "20241006";
pub const DEFAULT_SCP_PROGRAM: &str = "scp";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RemoteConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Directory on the remote host holding the log files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Values supplied on the command line or through the environment.
/// Each one that is set replaces the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub remote_dir: Option<String>,
    pub local_dir: Option<String>,
    /// Key for the effective user, bypassing the credential map.
    pub key: Option<String>,
    pub scp_program: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub local_dir: String,
    #[serde(default = "default_date")]
    pub default_date: String,
    #[serde(default = "default_scp_program")]
    pub scp_program: String,
    #[serde(default)]
    pub credentials: CredentialMap,
}

fn default_version() -> u32 {
    1
}

fn default_date() -> String {
    DEFAULT_DATE.to_string()
}

fn default_scp_program() -> String {
    DEFAULT_SCP_PROGRAM.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            remote: RemoteConfig::default(),
            local_dir: String::new(),
            default_date: default_date(),
            scp_program: default_scp_program(),
            credentials: CredentialMap::default(),
        }
    }
}

impl Config {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            remote: RemoteConfig {
                user: user.into(),
                host: host.into(),
                ..RemoteConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(LogpullError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`Config::load`], but an absent file yields an empty config so
    /// every value can come from flags and the environment.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(LogpullError::NotInitialized) => Ok(Self::default()),
            other => other,
        }
    }

    /// Write the config through a sibling tempfile so a crash never leaves a
    /// truncated file behind.
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let dir = paths::logpull_dir(root);
        std::fs::create_dir_all(&dir)?;
        let data = serde_yaml::to_string(self)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Resolve a relative `local_dir` from the file against `root`, so pulls
    /// land in the same place whichever subdirectory they are run from.
    pub fn anchored(mut self, root: &Path) -> Self {
        if self.local_dir.trim().is_empty() || self.local_dir.starts_with('~') {
            return self;
        }
        let local = Path::new(&self.local_dir);
        if local.is_relative() {
            let joined: PathBuf = root.join(local).components().collect();
            self.local_dir = joined.display().to_string();
        }
        self
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(user) = overrides.user {
            self.remote.user = user;
        }
        if let Some(host) = overrides.host {
            self.remote.host = host;
        }
        if overrides.port.is_some() {
            self.remote.port = overrides.port;
        }
        if overrides.remote_dir.is_some() {
            self.remote.dir = overrides.remote_dir;
        }
        if let Some(local_dir) = overrides.local_dir {
            self.local_dir = local_dir;
        }
        if let Some(program) = overrides.scp_program {
            self.scp_program = program;
        }
        if let Some(key) = overrides.key {
            let user = self.remote.user.clone();
            self.credentials.set(user, key);
        }
        self
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.remote.user.trim().is_empty() {
            warnings.push(ConfigWarning::error("remote.user is empty"));
        }
        if self.remote.host.trim().is_empty() {
            warnings.push(ConfigWarning::error("remote.host is empty"));
        }
        match self.remote.dir.as_deref() {
            Some(dir) if !dir.trim().is_empty() => {}
            _ => warnings.push(ConfigWarning::error(
                "remote.dir is not set; transfers need a remote directory",
            )),
        }

        if self.local_dir.trim().is_empty() {
            warnings.push(ConfigWarning::error("local_dir is empty"));
        } else {
            match paths::expand_home(&self.local_dir) {
                Ok(dir) if !dir.is_dir() => warnings.push(ConfigWarning::warning(format!(
                    "local_dir '{}' does not exist",
                    dir.display()
                ))),
                Ok(_) => {}
                Err(e) => warnings.push(ConfigWarning::warning(format!(
                    "local_dir '{}': {e}",
                    self.local_dir
                ))),
            }
        }

        if !self.remote.user.trim().is_empty()
            && self.credentials.raw_key_for(&self.remote.user).is_none()
        {
            warnings.push(ConfigWarning::error(format!(
                "no credential for user '{}' and no fallback key",
                self.remote.user
            )));
        }

        let entries = self
            .credentials
            .keys
            .iter()
            .map(|(user, key)| (format!("user '{user}'"), key))
            .chain(
                self.credentials
                    .fallback
                    .iter()
                    .map(|key| ("fallback".to_string(), key)),
            );
        for (label, raw) in entries {
            match paths::expand_home(raw) {
                Ok(path) if !path.is_file() => warnings.push(ConfigWarning::warning(format!(
                    "key for {label} not found at '{}'",
                    path.display()
                ))),
                Ok(_) => {}
                Err(e) => warnings.push(ConfigWarning::warning(format!("key for {label}: {e}"))),
            }
        }

        if self.scp_program.trim().is_empty() {
            warnings.push(ConfigWarning::error("scp_program is empty"));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
