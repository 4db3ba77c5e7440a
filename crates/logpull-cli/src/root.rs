use logpull_core::paths::LOGPULL_DIR;
use std::path::{Path, PathBuf};

/// Resolve the directory that holds `.logpull/`.
///
/// Priority:
/// 1. `--root` flag / `LOGPULL_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.logpull/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd).unwrap_or(cwd)
}

fn find_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(LOGPULL_DIR).is_dir())
        .map(Path::to_path_buf)
}
