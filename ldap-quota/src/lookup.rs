//! Quota lookup
//!
//! Runs the search, picks the first entry, and decodes the values of the
//! quota attribute. The session is always unbound, whatever the outcome.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LookupConfig;
use crate::directory::{DirectoryEntry, DirectorySession, LdapSession, SearchRequest};
use crate::error::Result;
use crate::quota::{QuotaDecoder, QuotaRecord};

/// Which decoded value wins when an entry carries several quota values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Stop at the first value that decodes
    First,
    /// Decode every value; the last success wins
    #[default]
    Last,
}

/// Result of one lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The search returned no entries
    NoEntries,
    /// Entries were found but no quota value decoded
    NotFound { entries: usize },
    /// A quota value decoded
    Found { entries: usize, record: QuotaRecord },
}

impl LookupOutcome {
    /// Number of entries returned by the search
    pub fn entries(&self) -> usize {
        match self {
            LookupOutcome::NoEntries => 0,
            LookupOutcome::NotFound { entries } | LookupOutcome::Found { entries, .. } => *entries,
        }
    }

    /// Decoded record, if any
    pub fn record(&self) -> Option<&QuotaRecord> {
        match self {
            LookupOutcome::Found { record, .. } => Some(record),
            _ => None,
        }
    }
}

/// Decode the quota values of `entry`
///
/// Values are decoded in server order into a single working record, so a
/// value with fewer than four limits keeps the limits of the previous
/// successful value. Values that do not decode are skipped.
pub fn select_quota(
    entry: &DirectoryEntry,
    attribute: &str,
    decoder: &QuotaDecoder,
    policy: SelectionPolicy,
) -> Option<QuotaRecord> {
    let mut record = QuotaRecord::default();
    let mut found = false;

    for (pos, value) in entry.values(attribute).iter().enumerate() {
        match decoder.decode_bytes_into(&mut record, value) {
            Ok(matched) => {
                debug!("Decoded {} value {} of {} ({} limits)", attribute, pos, entry.dn, matched);
                found = true;
                if policy == SelectionPolicy::First {
                    break;
                }
            }
            Err(e) => {
                debug!("Skipping {} value {} of {}: {}", attribute, pos, entry.dn, e);
            }
        }
    }

    found.then_some(record)
}

/// Search-and-decode sequence
pub struct QuotaLookup {
    decoder: QuotaDecoder,
    selection: SelectionPolicy,
    attribute: String,
}

impl QuotaLookup {
    pub fn new(decoder: QuotaDecoder, selection: SelectionPolicy, attribute: impl Into<String>) -> Self {
        Self {
            decoder,
            selection,
            attribute: attribute.into(),
        }
    }

    pub fn from_config(config: &LookupConfig) -> Self {
        Self::new(
            QuotaDecoder::new(config.decode.fields),
            config.decode.selection,
            config.search.attribute.clone(),
        )
    }

    /// Search with `session`, then unbind it
    ///
    /// A failed unbind is logged and does not change the outcome.
    pub async fn run<S>(&self, mut session: S, request: &SearchRequest) -> Result<LookupOutcome>
    where
        S: DirectorySession,
    {
        let searched = session.search(request).await;

        if let Err(e) = session.unbind().await {
            warn!("{}", e);
        }

        let result = searched?;
        let entries = result.entry_count();
        info!("{} entries found", entries);

        let Some(entry) = result.first_entry() else {
            return Ok(LookupOutcome::NoEntries);
        };

        match select_quota(entry, &self.attribute, &self.decoder, self.selection) {
            Some(record) => {
                if record.has_inverted_block_limits() || record.has_inverted_inode_limits() {
                    warn!("Quota for {} has a hard limit below its soft limit", entry.dn);
                }
                Ok(LookupOutcome::Found { entries, record })
            }
            None => Ok(LookupOutcome::NotFound { entries }),
        }
    }
}

/// Connect to the configured directory and look up the quota
pub async fn lookup_quota(config: &LookupConfig) -> Result<LookupOutcome> {
    config.validate()?;

    let session = LdapSession::connect(&config.directory).await?;
    let request = SearchRequest::from_config(&config.search);

    QuotaLookup::from_config(config).run(session, &request).await
}
