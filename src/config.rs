//! Configuration Management
//!
//! Handles persistent configuration storage for morph: the configured
//! remote appliances and which one is active. The file is loaded once at
//! startup and saved explicitly by the commands that change it.

use crate::api::Session;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Overrides the configuration directory
pub const CONFIG_DIR_ENV: &str = "MORPH_CONFIG_DIR";
/// Ad-hoc remote URL, used when no remote is named
pub const URL_ENV: &str = "MORPH_URL";
/// Access token, overriding the configured one
pub const TOKEN_ENV: &str = "MORPH_ACCESS_TOKEN";

/// Remote name reported for a session built from the environment
const ENV_REMOTE: &str = "env";

/// One configured appliance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Remote {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Remote used when none is named on the command line
    #[serde(default)]
    pub active_remote: Option<String>,
    #[serde(default)]
    pub remotes: BTreeMap<String, Remote>,
}

impl Config {
    /// Directory holding the config file and the log
    pub fn config_dir() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir));
        }
        dirs::config_dir().map(|p| p.join("morph"))
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file is missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("failed to read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("no configuration directory available")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;

        Ok(())
    }

    /// Add or replace a remote; the first remote added becomes active
    pub fn add_remote(&mut self, name: &str, url: &str, access_token: Option<String>) -> Result<()> {
        if name.trim().is_empty() {
            bail!("remote name must not be empty");
        }
        let url = parse_remote_url(url)?;

        self.remotes.insert(
            name.to_string(),
            Remote {
                url: url.to_string(),
                access_token,
            },
        );
        if self.active_remote.is_none() {
            self.active_remote = Some(name.to_string());
        }
        Ok(())
    }

    /// Remove a remote, clearing the active remote if it was this one
    pub fn remove_remote(&mut self, name: &str) -> Result<Remote> {
        let Some(removed) = self.remotes.remove(name) else {
            bail!("remote '{}' is not configured", name);
        };
        if self.active_remote.as_deref() == Some(name) {
            self.active_remote = None;
        }
        Ok(removed)
    }

    /// Make `name` the active remote
    pub fn use_remote(&mut self, name: &str) -> Result<()> {
        if !self.remotes.contains_key(name) {
            bail!("remote '{}' is not configured", name);
        }
        self.active_remote = Some(name.to_string());
        Ok(())
    }

    /// Resolve the session for this invocation from the process environment
    pub fn resolve_session(&self, requested: Option<&str>) -> Result<Session> {
        self.resolve_session_with(requested, |key| std::env::var(key).ok())
    }

    /// Resolve the session: the requested remote, else `MORPH_URL`, else the
    /// active remote. `MORPH_ACCESS_TOKEN` overrides any stored token.
    pub fn resolve_session_with<F>(&self, requested: Option<&str>, env: F) -> Result<Session>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token_override = env(TOKEN_ENV).filter(|t| !t.is_empty());

        if requested.is_none() {
            if let Some(url) = env(URL_ENV).filter(|u| !u.is_empty()) {
                return Ok(Session {
                    remote: ENV_REMOTE.to_string(),
                    url: parse_remote_url(&url)?,
                    access_token: token_override,
                });
            }
        }

        let name = match requested.or(self.active_remote.as_deref()) {
            Some(name) => name,
            None => bail!("no remote configured, run `morph remote add <name> <url>` first"),
        };
        let remote = self
            .remotes
            .get(name)
            .with_context(|| format!("remote '{}' is not configured", name))?;

        Ok(Session {
            remote: name.to_string(),
            url: parse_remote_url(&remote.url)?,
            access_token: token_override.or_else(|| remote.access_token.clone()),
        })
    }
}

fn parse_remote_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid remote URL '{}'", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("remote URL must use http or https: {}", raw);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config
            .add_remote("prod", "https://morpheus.example.com", Some("abc".into()))
            .unwrap();
        config
            .add_remote("lab", "https://lab.example.com", None)
            .unwrap();
        config
    }

    #[test]
    fn test_first_remote_becomes_active() {
        let config = configured();
        assert_eq!(config.active_remote.as_deref(), Some("prod"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = Config::default();
        assert!(config.add_remote("bad", "not a url", None).is_err());
        assert!(config.add_remote("ftp", "ftp://example.com", None).is_err());
        assert!(config.remotes.is_empty());
    }

    #[test]
    fn test_resolve_active_remote() {
        let session = configured().resolve_session_with(None, |_| None).unwrap();
        assert_eq!(session.remote, "prod");
        assert_eq!(session.access_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_requested_remote_wins_over_env_url() {
        let env = |key: &str| match key {
            URL_ENV => Some("https://adhoc.example.com".to_string()),
            _ => None,
        };
        let session = configured().resolve_session_with(Some("lab"), env).unwrap();
        assert_eq!(session.remote, "lab");
        assert_eq!(session.url.as_str(), "https://lab.example.com/");
    }

    #[test]
    fn test_env_url_and_token() {
        let env = |key: &str| match key {
            URL_ENV => Some("https://adhoc.example.com".to_string()),
            TOKEN_ENV => Some("xyz".to_string()),
            _ => None,
        };
        let session = configured().resolve_session_with(None, env).unwrap();
        assert_eq!(session.remote, "env");
        assert_eq!(session.access_token.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_unknown_remote_is_an_error() {
        let err = configured()
            .resolve_session_with(Some("staging"), |_| None)
            .unwrap_err();
        assert!(err.to_string().contains("staging"));
        assert!(Config::default().resolve_session_with(None, |_| None).is_err());
    }

    #[test]
    fn test_remove_active_remote_clears_it() {
        let mut config = configured();
        config.remove_remote("prod").unwrap();
        assert!(config.active_remote.is_none());
        assert!(config.remove_remote("prod").is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = configured();
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_corrupt_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }
}
