use serde::Deserialize;
use std::fs;

use crate::constants::{
    DEFAULT_FEED_HOST, DEFAULT_FEED_PATH, DEFAULT_TIMEOUT_SECS,
};
use crate::error::{PollerError, Result};
use crate::types::Credential;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct PollerConfig {
    /// Root for cursor files and the default event log.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// Event log path, relative to `data_root`.
    #[serde(default = "default_event_log")]
    pub event_log: String,
}

/// One logical feed instance: a name and a key pair. Key material may live in
/// the file or come from `<NAME>_PUBLIC_KEY` / `<NAME>_PRIVATE_KEY` in the
/// environment (the name uppercased, non-alphanumerics mapped to `_`).
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
}

fn default_host() -> String {
    DEFAULT_FEED_HOST.to_string()
}

fn default_path() -> String {
    DEFAULT_FEED_PATH.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_data_root() -> String {
    "data".to_string()
}

fn default_event_log() -> String {
    "events/feed.ndjson".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            path: default_path(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            event_log: default_event_log(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            PollerError::Config(format!("failed to read config file '{path}': {e}"))
        })?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }
}

impl SourceConfig {
    /// Resolves the key pair for this source, preferring inline values and
    /// falling back to the environment. Missing or empty key material is a
    /// configuration error carrying the variable name the operator should set.
    pub fn credential(&self) -> Result<Credential> {
        let credential = Credential {
            public_key: self.resolve_key(self.public_key.as_deref(), "PUBLIC_KEY")?,
            private_key: self.resolve_key(self.private_key.as_deref(), "PRIVATE_KEY")?,
        };
        credential.validate()?;
        Ok(credential)
    }

    /// True when both keys resolve; used by the `sources` listing so it can
    /// report readiness without touching the feed.
    pub fn credential_resolved(&self) -> bool {
        self.credential().is_ok()
    }

    fn resolve_key(&self, inline: Option<&str>, suffix: &str) -> Result<String> {
        if let Some(value) = inline {
            if !value.trim().is_empty() {
                return Ok(value.to_string());
            }
        }
        let var = env_var_name(&self.name, suffix);
        std::env::var(&var).map_err(|_| {
            PollerError::Config(format!(
                "source '{}' has no inline key and {var} is unset",
                self.name
            ))
        })
    }
}

fn env_var_name(source: &str, suffix: &str) -> String {
    let mut name: String = source
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    name.push('_');
    name.push_str(suffix);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_sources_and_feed_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[feed]
host = "mirror.example.com"
timeout_seconds = 5

[poller]
data_root = "/var/lib/intelfeed"

[[sources]]
name = "acme_iocs"
public_key = "pub"
private_key = "prv"
"#
        )
        .unwrap();

        let config = Config::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.feed.host, "mirror.example.com");
        assert_eq!(config.feed.path, DEFAULT_FEED_PATH);
        assert_eq!(config.feed.timeout_seconds, 5);
        assert_eq!(config.poller.data_root, "/var/lib/intelfeed");
        assert_eq!(config.sources.len(), 1);

        let cred = config.sources[0].credential().unwrap();
        assert_eq!(cred.public_key, "pub");
        assert_eq!(cred.private_key, "prv");
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let err = Config::load_from("/nonexistent/intelfeed.toml").unwrap_err();
        assert!(matches!(err, PollerError::Config(_)));
    }

    #[test]
    fn env_var_name_uppercases_and_sanitizes() {
        assert_eq!(env_var_name("acme-iocs", "PUBLIC_KEY"), "ACME_IOCS_PUBLIC_KEY");
        assert_eq!(env_var_name("acme_iocs", "PRIVATE_KEY"), "ACME_IOCS_PRIVATE_KEY");
    }

    #[test]
    fn keys_fall_back_to_environment() {
        let source = SourceConfig {
            name: "envfall-test".into(),
            public_key: None,
            private_key: Some("inline-prv".into()),
        };
        std::env::set_var("ENVFALL_TEST_PUBLIC_KEY", "env-pub");

        let cred = source.credential().unwrap();
        assert_eq!(cred.public_key, "env-pub");
        assert_eq!(cred.private_key, "inline-prv");

        std::env::remove_var("ENVFALL_TEST_PUBLIC_KEY");
    }

    #[test]
    fn unresolvable_key_names_the_variable() {
        let source = SourceConfig {
            name: "noenv-test".into(),
            public_key: None,
            private_key: Some("prv".into()),
        };
        let err = source.credential().unwrap_err();
        match err {
            PollerError::Config(msg) => assert!(msg.contains("NOENV_TEST_PUBLIC_KEY")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }
}
