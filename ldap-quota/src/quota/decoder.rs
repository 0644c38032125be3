//! Decoder for `quota` attribute values
//!
//! Format (from quota.schema):
//!
//! ```text
//! <filesystem> : <blocks soft> , <blocks hard> , <inodes soft> , <inodes hard>
//! ```
//!
//! Whitespace around the path, the numbers and the commas is ignored.
//! Limits are read left to right and the scan stops at the first one that
//! does not parse, so a value may carry fewer than four limits.

use serde::{Deserialize, Serialize};

use super::types::QuotaRecord;
use crate::error::DecodeError;

/// Number of numeric limits in a complete value
pub const LIMIT_COUNT: usize = 4;

/// How to treat values with fewer than four limits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPolicy {
    /// Accept 1 to 4 limits; missing limits keep their previous value
    #[default]
    Lenient,
    /// Require all four limits
    Strict,
}

/// Parser for `quota` attribute values
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotaDecoder {
    policy: FieldPolicy,
}

impl QuotaDecoder {
    /// Create a decoder with the given field policy
    pub fn new(policy: FieldPolicy) -> Self {
        Self { policy }
    }

    /// Field policy in use
    pub fn policy(&self) -> FieldPolicy {
        self.policy
    }

    /// Decode `value` on top of `record`
    ///
    /// On success the filesystem is replaced and the matched limits are
    /// overwritten; limits missing from `value` keep whatever `record`
    /// already held. On failure `record` is left untouched.
    ///
    /// Returns the number of limits read.
    pub fn decode_into(&self, record: &mut QuotaRecord, value: &str) -> Result<usize, DecodeError> {
        let (head, tail) = value.split_once(':').ok_or(DecodeError::MissingSeparator)?;

        let limits = scan_limits(tail);
        if limits.is_empty() {
            return Err(DecodeError::NoNumericFields);
        }
        if self.policy == FieldPolicy::Strict && limits.len() < LIMIT_COUNT {
            return Err(DecodeError::IncompleteFields {
                matched: limits.len(),
            });
        }

        record.filesystem = head.trim_matches(is_space).to_string();
        for (index, limit) in limits.iter().enumerate() {
            if let Some(slot) = record.limit_mut(index) {
                *slot = *limit;
            }
        }

        Ok(limits.len())
    }

    /// Decode a raw attribute value on top of `record`
    pub fn decode_bytes_into(&self, record: &mut QuotaRecord, value: &[u8]) -> Result<usize, DecodeError> {
        let value = std::str::from_utf8(value).map_err(|_| DecodeError::InvalidUtf8)?;
        self.decode_into(record, value)
    }

    /// Decode `value` into a fresh record
    pub fn decode(&self, value: &str) -> Result<QuotaRecord, DecodeError> {
        let mut record = QuotaRecord::default();
        self.decode_into(&mut record, value)?;
        Ok(record)
    }
}

/// C `isspace` in the "C" locale (ASCII whitespace plus vertical tab)
fn is_space(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0b'
}

/// Read up to four comma separated unsigned limits
fn scan_limits(tail: &str) -> Vec<u64> {
    let mut limits = Vec::with_capacity(LIMIT_COUNT);
    let mut rest = tail;

    while limits.len() < LIMIT_COUNT {
        if !limits.is_empty() {
            match rest.trim_start_matches(is_space).strip_prefix(',') {
                Some(after) => rest = after,
                None => break,
            }
        }

        rest = rest.trim_start_matches(is_space);
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            break;
        }
        match rest[..digits].parse::<u64>() {
            Ok(limit) => limits.push(limit),
            // overflow
            Err(_) => break,
        }
        rest = &rest[digits..];
    }

    limits
}
