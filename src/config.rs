//! Service configuration
//!
//! Loaded from defaults, then an optional TOML file, then command line and
//! environment overrides applied by the binary.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::governor::{GuardianSet, QuorumConfig, DEFAULT_MIN_GUARDIANS};

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Quorum section; a guardian set takes precedence over `min_guardians`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuorumSection {
    pub min_guardians: usize,
    pub guardian_set: Option<GuardianSet>,
}

impl Default for QuorumSection {
    fn default() -> Self {
        Self {
            min_guardians: DEFAULT_MIN_GUARDIANS,
            guardian_set: None,
        }
    }
}

impl QuorumSection {
    /// Use a fixed quorum size, replacing any configured guardian set
    pub fn set_min_guardians(&mut self, min_guardians: usize) {
        self.min_guardians = min_guardians;
        self.guardian_set = None;
    }

    pub fn quorum_config(&self) -> QuorumConfig {
        match &self.guardian_set {
            Some(set) => QuorumConfig::GuardianSet(set.clone()),
            None => QuorumConfig::Fixed {
                min_guardians: self.min_guardians,
            },
        }
    }
}

/// Where guardian reports are read from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// JSON export of the `governorConfig` and `governorStatus` collections
    pub documents_path: Option<PathBuf>,
    /// Postgres connection string
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            documents_path: None,
            database_url: None,
            max_connections: 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub listen_addr: SocketAddr,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Top-level configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub quorum: QuorumSection,
    pub source: SourceSection,
    pub api: ApiSection,
    pub fetch_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            quorum: QuorumSection::default(),
            source: SourceSection::default(),
            api: ApiSection::default(),
            fetch_timeout_secs: 10,
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn quorum_config(&self) -> QuorumConfig {
        self.quorum.quorum_config()
    }

    pub fn validate(&self) -> Result<()> {
        self.quorum_config().validate()?;

        if self.fetch_timeout_secs == 0 {
            return Err(Error::ConfigError(
                "fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.source.documents_path.is_none() && self.source.database_url.is_none() {
            return Err(Error::ConfigError(
                "at least one of source.documents_path or source.database_url is required"
                    .to_string(),
            ));
        }

        if self.source.database_url.is_some() && self.source.max_connections == 0 {
            return Err(Error::ConfigError(
                "source.max_connections must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.quorum_config().min_guardians(), 13);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.api.listen_addr.port(), 8080);
        // no source configured
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_full_file() {
        let config = AppConfig::from_toml_str(
            r#"
            fetch_timeout_secs = 3
            log_format = "json"

            [quorum]
            min_guardians = 2

            [source]
            documents_path = "/var/lib/governor.json"
            database_url = "postgres://localhost/wormscan"
            max_connections = 2

            [api]
            listen_addr = "127.0.0.1:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.quorum_config().min_guardians(), 2);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.source.max_connections, 2);
        assert_eq!(config.api.listen_addr.port(), 9000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_guardian_set_overrides_min_guardians() {
        let config = AppConfig::from_toml_str(
            r#"
            [quorum]
            min_guardians = 1

            [quorum.guardian_set]
            index = 0
            keys = ["0x13947bd48b18e53fdaeee77f3473391ac727c638", "0x40e8ca3d4a1a4e4d2a9dc89d2b0d5c5c7e3f1a2b"]

            [source]
            documents_path = "governor.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.quorum_config().min_guardians(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_min_guardians_replaces_guardian_set() {
        let mut config = AppConfig::from_toml_str(
            r#"
            [quorum.guardian_set]
            index = 3
            keys = ["0x13947bd48b18e53fdaeee77f3473391ac727c638", "0x40e8ca3d4a1a4e4d2a9dc89d2b0d5c5c7e3f1a2b"]
            "#,
        )
        .unwrap();
        assert_eq!(config.quorum_config().min_guardians(), 2);

        config.quorum.set_min_guardians(5);
        assert_eq!(config.quorum.guardian_set, None);
        assert_eq!(
            config.quorum_config(),
            QuorumConfig::Fixed { min_guardians: 5 }
        );
    }

    #[test]
    fn test_validate_rejects_zero_quorum_and_timeout() {
        let mut config = AppConfig::default();
        config.source.documents_path = Some(PathBuf::from("governor.json"));
        config.quorum.min_guardians = 0;
        assert!(config.validate().is_err());

        config.quorum.min_guardians = 13;
        config.fetch_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fetch_timeout_secs = 7").unwrap();
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.fetch_timeout_secs, 7);
        assert_eq!(config.quorum.min_guardians, 13);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            AppConfig::from_toml_str("fetch_timeout_secs = \"soon\""),
            Err(Error::TomlError(_))
        ));
    }
}
