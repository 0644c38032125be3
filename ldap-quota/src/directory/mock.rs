//! In-memory directory for testing
//!
//! Serves a fixed set of entries and records the searches it receives and
//! whether it was unbound. Like a server, it fails the search with
//! sizeLimitExceeded when more entries match than the request allows.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{DirectoryEntry, DirectorySession, SearchRequest, SearchResult};
use crate::error::{codes, QuotaError, Result};

/// Mock directory session
pub struct MockDirectory {
    entries: Vec<DirectoryEntry>,
    search_error: Option<(u32, String)>,
    unbind_error: Option<(u32, String)>,
    requests: Arc<Mutex<Vec<SearchRequest>>>,
    unbound: Arc<AtomicBool>,
}

/// Observer for a `MockDirectory` that outlives the session
#[derive(Clone)]
pub struct MockHandle {
    requests: Arc<Mutex<Vec<SearchRequest>>>,
    unbound: Arc<AtomicBool>,
}

impl MockDirectory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries,
            search_error: None,
            unbind_error: None,
            requests: Arc::new(Mutex::new(Vec::new())),
            unbound: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fail every search with the given result code and diagnostic
    pub fn failing_search(mut self, code: u32, message: &str) -> Self {
        self.search_error = Some((code, message.to_string()));
        self
    }

    /// Fail the unbind with the given result code and diagnostic
    pub fn failing_unbind(mut self, code: u32, message: &str) -> Self {
        self.unbind_error = Some((code, message.to_string()));
        self
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            requests: Arc::clone(&self.requests),
            unbound: Arc::clone(&self.unbound),
        }
    }
}

impl MockHandle {
    /// Searches received so far
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Whether the session was unbound
    pub fn is_unbound(&self) -> bool {
        self.unbound.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DirectorySession for MockDirectory {
    async fn search(&mut self, request: &SearchRequest) -> Result<SearchResult> {
        debug!("Mock search: {} {}", request.base, request.filter);

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some((code, message)) = &self.search_error {
            return Err(QuotaError::Search {
                code: *code,
                message: message.clone(),
            });
        }

        let limit = usize::try_from(request.size_limit).unwrap_or(0);
        if self.entries.len() > limit {
            return Err(QuotaError::Search {
                code: codes::SIZE_LIMIT_EXCEEDED,
                message: "Size limit exceeded".to_string(),
            });
        }

        Ok(SearchResult::new(self.entries.clone()))
    }

    async fn unbind(self) -> Result<()> {
        self.unbound.store(true, Ordering::SeqCst);

        match self.unbind_error {
            Some((code, message)) => Err(QuotaError::Unbind { code, message }),
            None => Ok(()),
        }
    }
}
