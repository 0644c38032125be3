//! Directory session abstraction
//!
//! The lookup only needs a bounded search and the values of one attribute,
//! so the session is modeled as a small trait. `LdapSession` talks to a real
//! server; `MockDirectory` serves canned entries for tests.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::error::Result;

pub mod ldap;
pub mod mock;

pub use ldap::LdapSession;
pub use mock::MockDirectory;

/// Search scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// The base entry only
    Base,
    /// Immediate children of the base, excluding the base itself
    OneLevel,
    /// The base and all descendants
    Subtree,
}

/// Parameters of one directory search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base: String,
    pub scope: SearchScope,
    pub filter: String,
    pub attributes: Vec<String>,
    pub size_limit: i32,
    pub timeout: Duration,
}

impl SearchRequest {
    /// One-level search for the configured attribute
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            base: config.base_dn.clone(),
            scope: SearchScope::OneLevel,
            filter: config.filter(),
            attributes: vec![config.attribute.clone()],
            size_limit: config.size_limit,
            timeout: config.timeout(),
        }
    }
}

/// One entry returned by a search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished name
    pub dn: String,
    /// Attribute values keyed by attribute name, in server order
    pub attributes: HashMap<String, Vec<Vec<u8>>>,
}

impl DirectoryEntry {
    /// Create an empty entry
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Append a value to an attribute
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Values of the attribute `name` (case-sensitive); empty when absent
    pub fn values(&self, name: &str) -> &[Vec<u8>] {
        self.attributes
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Entries returned by a search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub entries: Vec<DirectoryEntry>,
}

impl SearchResult {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self { entries }
    }

    /// Number of entries returned
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// First entry, if any
    pub fn first_entry(&self) -> Option<&DirectoryEntry> {
        self.entries.first()
    }
}

/// A connected directory session
///
/// `unbind` consumes the session, so it can be released only once.
#[async_trait::async_trait]
pub trait DirectorySession: Send {
    /// Run a bounded search
    async fn search(&mut self, request: &SearchRequest) -> Result<SearchResult>;

    /// Release the session
    async fn unbind(self) -> Result<()>;
}
