//! LDAP session backed by ldap3
//!
//! Connection stages map to distinct errors:
//! - initialize: URL parsing and TCP/TLS connect
//! - protocol version: only LDAPv3 is spoken by the transport
//! - bind: optional simple bind
//! - search: bounded one-level search

use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry, SearchOptions};
use tracing::{debug, info, warn};

use super::{DirectoryEntry, DirectorySession, SearchRequest, SearchResult, SearchScope};
use crate::config::DirectoryConfig;
use crate::error::{codes, QuotaError, Result};

/// Protocol version implemented by the transport
const SUPPORTED_PROTOCOL_VERSION: u8 = 3;

/// Connected LDAP session
pub struct LdapSession {
    ldap: Ldap,
    url: String,
}

impl LdapSession {
    /// Connect (and bind, when credentials are configured)
    ///
    /// The connection is released before returning on every failure after
    /// the initial connect.
    pub async fn connect(config: &DirectoryConfig) -> Result<Self> {
        info!("Connecting to {}", config.url);

        let settings = LdapConnSettings::new().set_conn_timeout(config.connect_timeout());
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &config.url)
            .await
            .map_err(|e| QuotaError::Initialize {
                code: result_code(&e, codes::SERVER_DOWN),
                message: e.to_string(),
            })?;

        let url = config.url.clone();
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!("LDAP connection error: {}", e);
            }
        });

        let session = Self { ldap, url };

        if config.protocol_version != SUPPORTED_PROTOCOL_VERSION {
            session.release().await;
            return Err(QuotaError::ProtocolVersion {
                code: codes::NOT_SUPPORTED,
                message: format!(
                    "Not Supported (protocol version {})",
                    config.protocol_version
                ),
            });
        }

        match (&config.bind_dn, &config.bind_password) {
            (Some(dn), password) => session.bind(dn, password.as_deref().unwrap_or("")).await,
            (None, _) => Ok(session),
        }
    }

    async fn bind(mut self, dn: &str, password: &str) -> Result<Self> {
        debug!("Binding as {}", dn);

        let outcome = self
            .ldap
            .simple_bind(dn, password)
            .await
            .and_then(|res| res.success());

        match outcome {
            Ok(_) => Ok(self),
            Err(e) => {
                self.release().await;
                Err(QuotaError::Bind {
                    code: result_code(&e, codes::SERVER_DOWN),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Unbind, logging instead of failing
    async fn release(mut self) {
        if let Err(e) = self.ldap.unbind().await {
            warn!("Failed to unbind from {}: {}", self.url, e);
        }
    }
}

#[async_trait::async_trait]
impl DirectorySession for LdapSession {
    async fn search(&mut self, request: &SearchRequest) -> Result<SearchResult> {
        debug!(
            "Searching {} for {} (attributes: {:?})",
            request.base, request.filter, request.attributes
        );

        let options = SearchOptions::new()
            .sizelimit(request.size_limit)
            .timelimit(i32::try_from(request.timeout.as_secs()).unwrap_or(i32::MAX));

        let ldap3::SearchResult(entries, result) = self
            .ldap
            .with_search_options(options)
            .with_timeout(request.timeout)
            .search(
                &request.base,
                scope(request.scope),
                &request.filter,
                request.attributes.clone(),
            )
            .await
            .map_err(|e| QuotaError::Search {
                code: result_code(&e, codes::SERVER_DOWN),
                message: e.to_string(),
            })?;

        // sizeLimitExceeded is fatal too, even when entries came back
        if result.rc != 0 {
            let message = if !result.text.is_empty() {
                result.text
            } else if result.rc == codes::SIZE_LIMIT_EXCEEDED {
                "Size limit exceeded".to_string()
            } else {
                format!("result code {}", result.rc)
            };
            return Err(QuotaError::Search {
                code: result.rc,
                message,
            });
        }

        let entries = entries
            .into_iter()
            .map(|entry| to_directory_entry(SearchEntry::construct(entry)))
            .collect();

        Ok(SearchResult::new(entries))
    }

    async fn unbind(mut self) -> Result<()> {
        debug!("Unbinding from {}", self.url);
        self.ldap.unbind().await.map_err(|e| QuotaError::Unbind {
            code: result_code(&e, codes::SERVER_DOWN),
            message: e.to_string(),
        })
    }
}

fn scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

/// Result code for an ldap3 error
fn result_code(err: &LdapError, fallback: u32) -> u32 {
    match err {
        LdapError::LdapResult { result } => result.rc,
        LdapError::Timeout { .. } => codes::TIMEOUT,
        LdapError::FilterParsing => codes::PARAM_ERROR,
        _ => fallback,
    }
}

/// Merge text and binary attribute values into one byte map
fn to_directory_entry(entry: SearchEntry) -> DirectoryEntry {
    let mut out = DirectoryEntry::new(entry.dn);

    for (name, values) in entry.attrs {
        out.attributes
            .entry(name)
            .or_default()
            .extend(values.into_iter().map(String::into_bytes));
    }
    for (name, values) in entry.bin_attrs {
        out.attributes.entry(name).or_default().extend(values);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_scope_mapping() {
        assert!(matches!(scope(SearchScope::Base), Scope::Base));
        assert!(matches!(scope(SearchScope::OneLevel), Scope::OneLevel));
        assert!(matches!(scope(SearchScope::Subtree), Scope::Subtree));
    }

    #[test]
    fn test_result_code_fallback() {
        assert_eq!(result_code(&LdapError::FilterParsing, codes::SERVER_DOWN), codes::PARAM_ERROR);
    }

    fn directory_config(url: String, protocol_version: u8) -> DirectoryConfig {
        DirectoryConfig {
            url,
            protocol_version,
            connect_timeout_seconds: 5,
            ..DirectoryConfig::default()
        }
    }

    #[tokio::test]
    async fn test_connect_refused_is_initialize_error() {
        // Grab a free port, then close it so nothing is listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = directory_config(format!("ldap://{}", addr), 3);
        let err = LdapSession::connect(&config).await.err().expect("connect should fail");

        assert!(matches!(err, QuotaError::Initialize { .. }), "got {:?}", err);
        assert_eq!(err.exit_code(), codes::SERVER_DOWN as u8);
        assert!(err.to_string().starts_with("ldap_initialize(): "));
    }

    #[tokio::test]
    async fn test_unsupported_protocol_version() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            // Keep the socket open until the client hangs up
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let _ = tokio::io::AsyncReadExt::read_to_end(&mut stream, &mut buf).await;
        });

        let config = directory_config(format!("ldap://{}", addr), 2);
        let err = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            LdapSession::connect(&config),
        )
        .await
        .expect("connect should not hang")
        .err()
        .expect("version 2 should be rejected");

        assert!(matches!(err, QuotaError::ProtocolVersion { code: 92, .. }), "got {:?}", err);
        assert_eq!(err.exit_code(), 92);

        server.abort();
    }

    #[test]
    fn test_to_directory_entry_merges_values() {
        let mut attrs = HashMap::new();
        attrs.insert("quota".to_string(), vec!["/home:1,2,3,4".to_string()]);
        let mut bin_attrs = HashMap::new();
        bin_attrs.insert("jpegPhoto".to_string(), vec![vec![0xff, 0xd8]]);

        let entry = to_directory_entry(SearchEntry {
            dn: "uid=alice,ou=people,dc=example,dc=com".to_string(),
            attrs,
            bin_attrs,
        });

        assert_eq!(entry.dn, "uid=alice,ou=people,dc=example,dc=com");
        assert_eq!(entry.values("quota"), &[b"/home:1,2,3,4".to_vec()]);
        assert_eq!(entry.values("jpegPhoto"), &[vec![0xff, 0xd8]]);
    }
}
