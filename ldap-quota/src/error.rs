//! Error types for ldap-quota

use thiserror::Error;

/// Result type alias for lookup operations
pub type Result<T> = std::result::Result<T, QuotaError>;

/// Directory result codes used for client-side failures (RFC 1823 C API numbering)
pub mod codes {
    /// The search hit its size limit
    pub const SIZE_LIMIT_EXCEEDED: u32 = 4;
    /// The server could not be reached
    pub const SERVER_DOWN: u32 = 81;
    /// The operation timed out
    pub const TIMEOUT: u32 = 85;
    /// A request parameter was rejected before it reached the server
    pub const PARAM_ERROR: u32 = 89;
    /// The requested feature is not supported by the client
    pub const NOT_SUPPORTED: u32 = 92;
}

/// Fatal lookup errors
///
/// Each directory stage gets its own variant so the caller can tell which
/// step failed. The `code` is the directory result code and becomes the
/// process exit status.
#[derive(Error, Debug)]
pub enum QuotaError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection could not be initialized
    #[error("ldap_initialize(): {message}")]
    Initialize { code: u32, message: String },

    /// Protocol version could not be negotiated
    #[error("ldap_set_option(PROTOCOL_VERSION): {message}")]
    ProtocolVersion { code: u32, message: String },

    /// Simple bind was rejected
    #[error("ldap_simple_bind(): {message}")]
    Bind { code: u32, message: String },

    /// Search failed or timed out
    #[error("ldap_search_ext_s(): {message}")]
    Search { code: u32, message: String },

    /// Session could not be released cleanly
    #[error("ldap_unbind_ext_s(): {message}")]
    Unbind { code: u32, message: String },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuotaError {
    /// Directory result code carried by session errors
    pub fn code(&self) -> Option<u32> {
        match self {
            QuotaError::Initialize { code, .. }
            | QuotaError::ProtocolVersion { code, .. }
            | QuotaError::Bind { code, .. }
            | QuotaError::Search { code, .. }
            | QuotaError::Unbind { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self.code() {
            Some(code) => u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1),
            None => 1,
        }
    }
}

/// Reasons a single `quota` value was rejected
///
/// These are recovered locally: the lookup moves on to the next value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No `:` between filesystem and limits
    #[error("missing ':' separator")]
    MissingSeparator,

    /// No numeric limit could be read after the separator
    #[error("no numeric limits after ':'")]
    NoNumericFields,

    /// Strict policy requires all four limits
    #[error("expected 4 numeric limits, found {matched}")]
    IncompleteFields { matched: usize },

    /// Attribute value is not valid UTF-8
    #[error("value is not valid UTF-8")]
    InvalidUtf8,
}
