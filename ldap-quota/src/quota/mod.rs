/// Filesystem quota records
///
/// This module provides:
/// - The decoded quota record for one filesystem
/// - The decoder for the `quota` attribute text format

pub mod decoder;
pub mod types;

pub use decoder::{FieldPolicy, QuotaDecoder};
pub use types::QuotaRecord;
