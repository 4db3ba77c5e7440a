use crate::error::{LogpullError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const LOGPULL_DIR: &str = ".logpull";
pub const CONFIG_FILE: &str = ".logpull/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn logpull_dir(root: &Path) -> PathBuf {
    root.join(LOGPULL_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Expand a leading `~` or `~/` against the current user's home directory.
/// Any other path is returned unchanged.
pub fn expand_home(raw: &str) -> Result<PathBuf> {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return Ok(PathBuf::from(raw)),
    };
    let home = home::home_dir().ok_or(LogpullError::HomeNotFound)?;
    let rest = rest.trim_start_matches(['/', '\\']);
    if rest.is_empty() {
        Ok(home)
    } else {
        Ok(home.join(rest))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_lives_under_logpull_dir() {
        let root = Path::new("/srv/project");
        assert_eq!(config_path(root), root.join(".logpull/config.yaml"));
        assert!(config_path(root).starts_with(logpull_dir(root)));
    }

    #[test]
    fn plain_paths_are_untouched() {
        for raw in ["/etc/keys/id_rsa", "relative/key", "~other/key", r"C:\keys\id_rsa"] {
            assert_eq!(expand_home(raw).unwrap(), PathBuf::from(raw));
        }
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = home::home_dir() else {
            return;
        };
        assert_eq!(expand_home("~").unwrap(), home);
        assert_eq!(expand_home("~/.ssh/id_rsa").unwrap(), home.join(".ssh/id_rsa"));
    }
}
