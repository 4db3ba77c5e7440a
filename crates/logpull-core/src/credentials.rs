//! Username → private-key mapping used to authenticate the transfer.
//!
//! Lookup is an exact match on the remote username. When the user has no
//! entry, the optional fallback key is used instead.

use crate::error::{LogpullError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialMap {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub keys: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl CredentialMap {
    /// The configured key path for `user`, before home expansion.
    pub fn raw_key_for(&self, user: &str) -> Option<&str> {
        self.keys
            .get(user)
            .or(self.fallback.as_ref())
            .map(String::as_str)
    }

    /// Resolve the key file for `user`, expanding a leading `~`.
    pub fn key_for(&self, user: &str) -> Result<PathBuf> {
        let raw = self
            .raw_key_for(user)
            .ok_or_else(|| LogpullError::NoCredential(user.to_string()))?;
        paths::expand_home(raw)
    }

    pub fn set(&mut self, user: impl Into<String>, key: impl Into<String>) {
        self.keys.insert(user.into(), key.into());
    }

    pub fn remove(&mut self, user: &str) -> Result<String> {
        self.keys
            .remove(user)
            .ok_or_else(|| LogpullError::CredentialNotFound(user.to_string()))
    }

    pub fn set_fallback(&mut self, key: impl Into<String>) {
        self.fallback = Some(key.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CredentialMap {
        let mut creds = CredentialMap::default();
        creds.set("sqa24", "/keys/ubuntu/id_rsa");
        creds.set_fallback("/keys/other/id_rsa");
        creds
    }

    #[test]
    fn mapped_user_gets_its_own_key() {
        assert_eq!(
            sample().key_for("sqa24").unwrap(),
            PathBuf::from("/keys/ubuntu/id_rsa")
        );
    }

    #[test]
    fn any_other_user_gets_fallback() {
        let creds = sample();
        for user in ["alice", "SQA24", "sqa24 ", ""] {
            assert_eq!(
                creds.key_for(user).unwrap(),
                PathBuf::from("/keys/other/id_rsa"),
                "user {user:?}"
            );
        }
    }

    #[test]
    fn missing_fallback_is_an_error() {
        let mut creds = CredentialMap::default();
        creds.set("sqa24", "/keys/ubuntu/id_rsa");
        let err = creds.key_for("alice").unwrap_err();
        assert!(matches!(err, LogpullError::NoCredential(ref u) if u == "alice"));
    }

    #[test]
    fn remove_unknown_user_fails() {
        let mut creds = sample();
        assert_eq!(creds.remove("sqa24").unwrap(), "/keys/ubuntu/id_rsa");
        assert!(matches!(
            creds.remove("sqa24"),
            Err(LogpullError::CredentialNotFound(_))
        ));
    }

    #[test]
    fn yaml_shape() {
        let yaml = serde_yaml::to_string(&sample()).unwrap();
        assert!(yaml.contains("sqa24: /keys/ubuntu/id_rsa"));
        assert!(yaml.contains("fallback: /keys/other/id_rsa"));
        let parsed: CredentialMap = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, sample());
    }
}
