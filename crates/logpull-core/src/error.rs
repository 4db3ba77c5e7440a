use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogpullError {
    #[error("not initialized: run 'logpull init'")]
    NotInitialized,

    #[error("config already exists: {0} (use --force to overwrite)")]
    ConfigExists(String),

    #[error("remote directory is not set: add remote.dir to the config or pass --remote-dir")]
    RemoteDirMissing,

    #[error("remote user is not set: add remote.user to the config or pass --user")]
    UserMissing,

    #[error("remote host is not set: add remote.host to the config or pass --host")]
    HostMissing,

    #[error("local directory is not set: add local_dir to the config or pass --local-dir")]
    LocalDirMissing,

    #[error("no credential for user '{0}' and no fallback key configured")]
    NoCredential(String),

    #[error("credential not found for user: {0}")]
    CredentialNotFound(String),

    #[error("scp program not found: {0}")]
    ScpNotFound(String),

    #[error("failed to spawn scp: {0}")]
    SpawnFailed(String),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, LogpullError>;
