//! Configuration for ldap-quota

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{QuotaError, Result};
use crate::lookup::SelectionPolicy;
use crate::quota::FieldPolicy;

/// Main lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LookupConfig {
    /// Directory server connection
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Search parameters
    pub search: SearchConfig,
    /// Decoding policies
    #[serde(default)]
    pub decode: DecodeConfig,
}

/// Directory server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectoryConfig {
    /// Server URL (e.g., "ldap://192.168.189.156:389")
    #[serde(default = "default_url")]
    pub url: String,
    /// LDAP protocol version
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u8,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// DN for simple bind (anonymous when absent)
    pub bind_dn: Option<String>,
    /// Password for simple bind
    pub bind_password: Option<String>,
}

/// Search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Base DN; entries are searched one level below it
    pub base_dn: String,
    /// Numeric identifier of the target entry (uidNumber)
    pub uid_number: u32,
    /// Full filter, overrides `uid_number` when set
    pub filter: Option<String>,
    /// Attribute holding the quota values
    #[serde(default = "default_attribute")]
    pub attribute: String,
    /// Maximum number of entries returned by the server
    #[serde(default = "default_size_limit")]
    pub size_limit: i32,
    /// Search timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_seconds: u64,
}

/// Decoding policies
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct DecodeConfig {
    /// Handling of values with fewer than four limits
    #[serde(default)]
    pub fields: FieldPolicy,
    /// Which decoded value wins when several are present
    #[serde(default)]
    pub selection: SelectionPolicy,
}

fn default_url() -> String {
    "ldap://127.0.0.1:389".to_string()
}

fn default_protocol_version() -> u8 {
    3
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_attribute() -> String {
    "quota".to_string()
}

fn default_size_limit() -> i32 {
    1
}

fn default_search_timeout() -> u64 {
    1000
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            protocol_version: default_protocol_version(),
            connect_timeout_seconds: default_connect_timeout(),
            bind_dn: None,
            bind_password: None,
        }
    }
}

impl DirectoryConfig {
    /// Connection timeout as a duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl SearchConfig {
    /// Search filter selecting the target entry
    pub fn filter(&self) -> String {
        match &self.filter {
            Some(filter) => filter.clone(),
            None => format!("(uidNumber={})", self.uid_number),
        }
    }

    /// Search timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl LookupConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| QuotaError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| QuotaError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Create a default development configuration
    pub fn development() -> Self {
        Self {
            directory: DirectoryConfig::default(),
            search: SearchConfig {
                base_dn: "ou=people,dc=example,dc=com".to_string(),
                uid_number: 1000,
                filter: None,
                attribute: default_attribute(),
                size_limit: default_size_limit(),
                timeout_seconds: default_search_timeout(),
            },
            decode: DecodeConfig::default(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.directory.url).map_err(|e| {
            QuotaError::Config(format!("Invalid directory URL '{}': {}", self.directory.url, e))
        })?;
        if !matches!(url.scheme(), "ldap" | "ldaps" | "ldapi") {
            return Err(QuotaError::Config(format!(
                "Unsupported URL scheme '{}'",
                url.scheme()
            )));
        }

        if !matches!(self.directory.protocol_version, 2 | 3) {
            return Err(QuotaError::Config(format!(
                "Invalid protocol version {}",
                self.directory.protocol_version
            )));
        }

        if self.directory.bind_password.is_some() && self.directory.bind_dn.is_none() {
            return Err(QuotaError::Config(
                "bind_password set without bind_dn".to_string(),
            ));
        }

        if self.directory.connect_timeout_seconds == 0 {
            return Err(QuotaError::Config(
                "Connection timeout must be at least 1 second".to_string(),
            ));
        }

        if self.search.timeout_seconds == 0 {
            return Err(QuotaError::Config(
                "Search timeout must be at least 1 second".to_string(),
            ));
        }

        if self.search.base_dn.trim().is_empty() {
            return Err(QuotaError::Config("Empty search base DN".to_string()));
        }

        if self.search.attribute.is_empty() {
            return Err(QuotaError::Config("Empty quota attribute name".to_string()));
        }

        if self.search.size_limit < 1 {
            return Err(QuotaError::Config(format!(
                "Size limit must be at least 1, got {}",
                self.search.size_limit
            )));
        }

        Ok(())
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self::development()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = LookupConfig::default();
        assert_eq!(config.search.attribute, "quota");
        assert_eq!(config.search.size_limit, 1);
        assert_eq!(config.directory.protocol_version, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[directory]
url = "ldap://192.168.189.156:389"

[search]
base_dn = "ou=people,dc=iasbs,dc=ac,dc=ir"
uid_number = 110

[decode]
fields = "strict"
selection = "first"
"#;
        let config: LookupConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.directory.url, "ldap://192.168.189.156:389");
        assert_eq!(config.search.filter(), "(uidNumber=110)");
        assert_eq!(config.search.timeout(), Duration::from_secs(1000));
        assert_eq!(config.decode.fields, FieldPolicy::Strict);
        assert_eq!(config.decode.selection, SelectionPolicy::First);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let toml = r#"
[search]
base_dn = "ou=people,dc=example,dc=com"
uid_number = 42
filter = "(&(objectClass=posixAccount)(uidNumber=42))"
"#;
        let config: LookupConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.directory.url, "ldap://127.0.0.1:389");
        assert_eq!(
            config.search.filter(),
            "(&(objectClass=posixAccount)(uidNumber=42))"
        );
        assert_eq!(config.decode.fields, FieldPolicy::Lenient);
        assert_eq!(config.decode.selection, SelectionPolicy::Last);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[search]\nbase_dn = \"ou=people,dc=example,dc=com\"\nuid_number = 7"
        )
        .unwrap();

        let config = LookupConfig::from_file(file.path()).unwrap();
        assert_eq!(config.search.uid_number, 7);
    }

    #[test]
    fn test_from_file_missing() {
        let err = LookupConfig::from_file(Path::new("/nonexistent/ldap-quota.toml")).unwrap_err();
        assert!(matches!(err, QuotaError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = LookupConfig::default();
        config.directory.url = "http://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = LookupConfig::default();
        config.directory.url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = LookupConfig::default();
        config.search.base_dn = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = LookupConfig::default();
        config.search.size_limit = 0;
        assert!(config.validate().is_err());

        let mut config = LookupConfig::default();
        config.directory.protocol_version = 4;
        assert!(config.validate().is_err());

        let mut config = LookupConfig::default();
        config.directory.bind_password = Some("secret".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = LookupConfig::default();
        config.search.timeout_seconds = 0;
        assert!(matches!(config.validate(), Err(QuotaError::Config(_))));

        let mut config = LookupConfig::default();
        config.directory.connect_timeout_seconds = 0;
        assert!(matches!(config.validate(), Err(QuotaError::Config(_))));
    }
}
