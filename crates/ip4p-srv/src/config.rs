//! Server configuration for the redirector.
//!
//! Loaded once at startup and never mutated. YAML is the default format;
//! files ending in `.toml` are parsed as TOML.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ip4p_core::{Mapping, MappingTable};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::SrvError;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Top-level redirector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listener and TLS settings.
    pub server: ServerConfig,

    /// DNS resolver tuning.
    #[serde(default)]
    pub resolver: ResolverSettings,

    /// Servable identifiers.
    #[serde(default)]
    pub mappings: Vec<Mapping>,
}

/// Listener and TLS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// TCP port to listen on.
    pub listen_port: u16,

    /// Address to bind (default: 0.0.0.0).
    #[serde(default = "default_listen_addr")]
    pub listen_addr: IpAddr,

    /// PEM certificate chain. Plain HTTP is served when unset.
    #[serde(default)]
    pub cert_file: Option<PathBuf>,

    /// PEM private key matching `cert_file`.
    #[serde(default)]
    pub key_file: Option<PathBuf>,
}

/// Paths to the certificate chain and private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

/// Options handed to the DNS resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Upstream nameservers. Empty means the system configuration.
    #[serde(default)]
    pub nameservers: Vec<IpAddr>,

    /// Per-query timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per nameserver before giving up.
    #[serde(default = "default_attempts")]
    pub attempts: usize,

    /// Resolver cache entries. Zero disables caching so DDNS changes show up
    /// on the next request.
    #[serde(default)]
    pub cache_size: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            nameservers: Vec::new(),
            timeout_secs: default_timeout_secs(),
            attempts: default_attempts(),
            cache_size: 0,
        }
    }
}

impl ResolverSettings {
    /// Per-query timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ServerConfig {
    /// Socket address to bind.
    #[must_use]
    pub const fn listen(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.listen_port)
    }

    /// TLS material, if both files are configured.
    #[must_use]
    pub fn tls(&self) -> Option<TlsFiles> {
        match (&self.cert_file, &self.key_file) {
            (Some(cert_file), Some(key_file)) => Some(TlsFiles {
                cert_file: cert_file.clone(),
                key_file: key_file.clone(),
            }),
            _ => None,
        }
    }
}

impl Config {
    /// Load and validate config from a file.
    ///
    /// Unlike a client config there is no fallback to defaults: a server
    /// without mappings or a port has nothing to serve.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SrvError::Config(format!("failed to read {}: {e}", path.display()))
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Parse and validate YAML config.
    pub fn from_yaml_str(content: &str) -> crate::Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| SrvError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate TOML config.
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| SrvError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that would only fail later, at request time.
    pub fn validate(&self) -> crate::Result<()> {
        match (&self.server.cert_file, &self.server.key_file) {
            (Some(_), None) => {
                return Err(SrvError::Config(
                    "cert_file is set but key_file is missing".into(),
                ))
            }
            (None, Some(_)) => {
                return Err(SrvError::Config(
                    "key_file is set but cert_file is missing".into(),
                ))
            }
            _ => {}
        }

        for (index, mapping) in self.mappings.iter().enumerate() {
            if mapping.identifier.is_empty() {
                return Err(SrvError::Config(format!(
                    "mapping #{index} has an empty identifier"
                )));
            }
            if mapping.domain.trim().is_empty() {
                return Err(SrvError::Config(format!(
                    "mapping '{}' has an empty domain",
                    mapping.identifier
                )));
            }
        }

        if self.mappings.is_empty() {
            warn!("no mappings configured, every request will be answered with 404");
        }

        Ok(())
    }

    /// Build the immutable lookup table from the configured mappings.
    #[must_use]
    pub fn mapping_table(&self) -> MappingTable {
        let table = MappingTable::new(self.mappings.iter().cloned());
        for identifier in table.duplicates() {
            warn!(identifier = %identifier, "duplicate mapping ignored, first entry wins");
        }
        table
    }
}

// Default value functions for serde.
const fn default_listen_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_timeout_secs() -> u64 {
    5
}

const fn default_attempts() -> usize {
    2
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
server:
  listen_port: 8443
  cert_file: "cert.pem"
  key_file: "key.pem"
mappings:
  - uuid: "u1"
    domain: "example.com"
  - identifier: "u2"
    domain: "home.example.net"
"#;

    #[test]
    fn test_yaml_config() {
        let config = Config::from_yaml_str(YAML).unwrap();
        assert_eq!(config.server.listen().to_string(), "0.0.0.0:8443");
        assert_eq!(
            config.server.tls(),
            Some(TlsFiles {
                cert_file: "cert.pem".into(),
                key_file: "key.pem".into(),
            })
        );
        assert_eq!(config.resolver, ResolverSettings::default());
        assert_eq!(config.resolver.timeout(), Duration::from_secs(5));

        let table = config.mapping_table();
        assert_eq!(table.lookup("u1"), Some("example.com"));
        assert_eq!(table.lookup("u2"), Some("home.example.net"));
    }

    #[test]
    fn test_toml_config() {
        let config = Config::from_toml_str(
            r#"
[server]
listen_port = 8080
listen_addr = "127.0.0.1"

[resolver]
nameservers = ["1.1.1.1", "2606:4700:4700::1111"]
cache_size = 16

[[mappings]]
identifier = "u1"
domain = "example.com"
"#,
        )
        .unwrap();

        assert_eq!(config.server.listen().to_string(), "127.0.0.1:8080");
        assert!(config.server.tls().is_none());
        assert_eq!(config.resolver.nameservers.len(), 2);
        assert_eq!(config.resolver.cache_size, 16);
        assert_eq!(config.resolver.attempts, 2);
        assert_eq!(config.mappings.len(), 1);
    }

    #[test]
    fn test_rejects_half_tls() {
        let err = Config::from_yaml_str("server:\n  listen_port: 443\n  cert_file: c.pem\n")
            .unwrap_err();
        assert!(matches!(err, SrvError::Config(_)));
    }

    #[test]
    fn test_rejects_empty_identifier_and_domain() {
        let empty_id = "server:\n  listen_port: 443\nmappings:\n  - uuid: \"\"\n    domain: a.com\n";
        assert!(matches!(
            Config::from_yaml_str(empty_id),
            Err(SrvError::Config(_))
        ));

        let empty_domain = "server:\n  listen_port: 443\nmappings:\n  - uuid: u1\n    domain: \"\"\n";
        assert!(matches!(
            Config::from_yaml_str(empty_domain),
            Err(SrvError::Config(_))
        ));
    }

    #[test]
    fn test_missing_port_is_error() {
        assert!(Config::from_yaml_str("mappings: []\n").is_err());
    }

    #[test]
    fn test_load_picks_format_by_extension() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        yaml.write_all(YAML.as_bytes()).unwrap();
        let config = Config::load(yaml.path()).unwrap();
        assert_eq!(config.server.listen_port, 8443);

        let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        toml_file
            .write_all(b"[server]\nlisten_port = 9000\n")
            .unwrap();
        let config = Config::load(toml_file.path()).unwrap();
        assert_eq!(config.server.listen_port, 9000);
        assert!(config.mappings.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, SrvError::Config(_)));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::from_yaml_str(YAML).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.server.listen_port, config.server.listen_port);
        assert_eq!(parsed.mappings, config.mappings);
    }
}
