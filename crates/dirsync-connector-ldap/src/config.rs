//! Directory connection configuration
//!
//! Settings for reaching and binding to the target directory.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{DirectoryError, DirectoryResult};

/// Configuration for the directory connection.
#[derive(Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory server hostname or IP address.
    pub host: String,

    /// Server port. Unset means 389, or 636 with `use_ssl`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Base DN under which the users and groups containers live.
    pub base_dn: String,

    /// Administrative bind DN (e.g., "cn=admin,dc=example,dc=com").
    pub bind_dn: String,

    /// Administrative bind password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Connection settings (timeouts).
    #[serde(default)]
    pub connection: ConnectionSettings,
}

impl std::fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("host", &self.host)
            .field("port", &self.port())
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("base_dn", &self.base_dn)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("connection", &self.connection)
            .finish()
    }
}

/// Transport timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Per-operation timeout in seconds; `None` waits for the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_timeout_secs: Option<u64>,
}

const LDAP_PORT: u16 = 389;
const LDAPS_PORT: u16 = 636;

fn default_connection_timeout() -> u64 {
    30
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connection_timeout_secs: default_connection_timeout(),
            operation_timeout_secs: None,
        }
    }
}

impl ConnectionSettings {
    /// Get connection timeout as Duration.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Get the operation timeout as Duration, if one is configured.
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_secs.map(Duration::from_secs)
    }
}

impl DirectoryConfig {
    /// Create a new config with required fields.
    pub fn new(
        host: impl Into<String>,
        base_dn: impl Into<String>,
        bind_dn: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: None,
            use_ssl: false,
            use_starttls: false,
            base_dn: base_dn.into(),
            bind_dn: bind_dn.into(),
            bind_password: None,
            connection: ConnectionSettings::default(),
        }
    }

    /// Set bind password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.bind_password = Some(password.into());
        self
    }

    /// Port to dial: the configured one, else the default for the TLS mode.
    pub fn port(&self) -> u16 {
        self.port
            .unwrap_or(if self.use_ssl { LDAPS_PORT } else { LDAP_PORT })
    }

    /// Bind password, empty when none is configured.
    pub fn password(&self) -> &str {
        self.bind_password.as_deref().unwrap_or("")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> DirectoryResult<()> {
        if self.host.trim().is_empty() {
            return Err(DirectoryError::InvalidConfiguration {
                message: "host is required".to_string(),
            });
        }

        if self.base_dn.trim().is_empty() {
            return Err(DirectoryError::InvalidConfiguration {
                message: "base_dn is required".to_string(),
            });
        }

        if self.bind_dn.trim().is_empty() {
            return Err(DirectoryError::InvalidConfiguration {
                message: "bind_dn is required".to_string(),
            });
        }

        if self.use_ssl && self.use_starttls {
            return Err(DirectoryError::InvalidConfiguration {
                message: "cannot use both SSL and STARTTLS".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DirectoryConfig {
        DirectoryConfig::new(
            "ldap.example.com",
            "dc=example,dc=com",
            "cn=admin,dc=example,dc=com",
        )
    }

    #[test]
    fn test_directory_config_new() {
        let config = config().with_password("secret");

        assert_eq!(config.host, "ldap.example.com");
        assert_eq!(config.port(), 389);
        assert_eq!(config.base_dn, "dc=example,dc=com");
        assert_eq!(config.password(), "secret");
    }

    #[test]
    fn test_port_follows_tls_mode() {
        let mut config = config();
        config.use_ssl = true;
        assert_eq!(config.port(), 636);

        config.port = Some(10636);
        assert_eq!(config.port(), 10636);
    }

    #[test]
    fn test_directory_config_validation() {
        assert!(config().validate().is_ok());

        let empty_host = DirectoryConfig::new("", "dc=example,dc=com", "cn=admin");
        assert!(empty_host.validate().is_err());

        let empty_base = DirectoryConfig::new("ldap.example.com", " ", "cn=admin");
        assert!(empty_base.validate().is_err());

        let mut both_tls = config();
        both_tls.use_ssl = true;
        both_tls.use_starttls = true;
        assert!(both_tls.validate().is_err());
    }

    #[test]
    fn test_password_is_redacted() {
        let config = config().with_password("super-secret");

        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***REDACTED***"));
    }

    #[test]
    fn test_directory_config_deserialize_defaults() {
        let json = r#"{
            "host": "ldap.example.com",
            "base_dn": "dc=example,dc=com",
            "bind_dn": "cn=admin,dc=example,dc=com"
        }"#;

        let parsed: DirectoryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.port(), 389);
        assert!(parsed.bind_password.is_none());
        assert_eq!(parsed.connection.connection_timeout_secs, 30);
        assert!(parsed.connection.operation_timeout().is_none());
    }

    #[test]
    fn test_ssl_without_port_uses_ldaps_port() {
        let json = r#"{
            "host": "ldap.example.com",
            "use_ssl": true,
            "base_dn": "dc=example,dc=com",
            "bind_dn": "cn=admin,dc=example,dc=com"
        }"#;

        let parsed: DirectoryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.port, None);
        assert_eq!(parsed.port(), 636);
    }
}
