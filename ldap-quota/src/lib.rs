//! ldap-quota: filesystem quota lookup from an LDAP directory
//!
//! Looks up one entry by numeric identifier (one level below a base DN),
//! reads its `quota` attribute and decodes the quota policy it encodes.
//!
//! # Attribute format
//!
//! ```text
//! <filesystem>:<blocks soft>,<blocks hard>,<inodes soft>,<inodes hard>
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [directory]
//! url = "ldap://192.168.189.156:389"
//!
//! [search]
//! base_dn = "ou=people,dc=iasbs,dc=ac,dc=ir"
//! uid_number = 110
//! timeout_seconds = 1000
//!
//! [decode]
//! fields = "lenient"
//! selection = "last"
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod lookup;
pub mod quota;
pub mod report;

pub use config::LookupConfig;
pub use error::{DecodeError, QuotaError, Result};
pub use lookup::{lookup_quota, LookupOutcome, QuotaLookup, SelectionPolicy};
pub use quota::{FieldPolicy, QuotaDecoder, QuotaRecord};
