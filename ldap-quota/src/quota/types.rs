use serde::{Deserialize, Serialize};
use std::fmt;

/// Quota policy for one filesystem, as stored in the `quota` attribute
///
/// Hard limits are expected to be at least the soft limits, but the values
/// are passed through exactly as the directory stores them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaRecord {
    /// Filesystem path (e.g. "/home")
    pub filesystem: String,
    /// Blocks soft limit
    pub block_soft_limit: u64,
    /// Blocks hard limit
    pub block_hard_limit: u64,
    /// Inodes soft limit
    pub inode_soft_limit: u64,
    /// Inodes hard limit
    pub inode_hard_limit: u64,
}

impl QuotaRecord {
    /// Create a record with all four limits set
    pub fn new(
        filesystem: impl Into<String>,
        block_soft_limit: u64,
        block_hard_limit: u64,
        inode_soft_limit: u64,
        inode_hard_limit: u64,
    ) -> Self {
        QuotaRecord {
            filesystem: filesystem.into(),
            block_soft_limit,
            block_hard_limit,
            inode_soft_limit,
            inode_hard_limit,
        }
    }

    /// Limits in attribute order: blocks soft, blocks hard, inodes soft, inodes hard
    pub fn limits(&self) -> [u64; 4] {
        [
            self.block_soft_limit,
            self.block_hard_limit,
            self.inode_soft_limit,
            self.inode_hard_limit,
        ]
    }

    /// Mutable access to the limit at `index` (attribute order)
    pub(crate) fn limit_mut(&mut self, index: usize) -> Option<&mut u64> {
        match index {
            0 => Some(&mut self.block_soft_limit),
            1 => Some(&mut self.block_hard_limit),
            2 => Some(&mut self.inode_soft_limit),
            3 => Some(&mut self.inode_hard_limit),
            _ => None,
        }
    }

    /// Encode as a `quota` attribute value (`fs:bs,bh,is,ih`)
    pub fn to_attribute_value(&self) -> String {
        format!(
            "{}:{},{},{},{}",
            self.filesystem,
            self.block_soft_limit,
            self.block_hard_limit,
            self.inode_soft_limit,
            self.inode_hard_limit
        )
    }

    /// Check if the blocks hard limit is below the soft limit
    pub fn has_inverted_block_limits(&self) -> bool {
        self.block_hard_limit < self.block_soft_limit
    }

    /// Check if the inodes hard limit is below the soft limit
    pub fn has_inverted_inode_limits(&self) -> bool {
        self.inode_hard_limit < self.inode_soft_limit
    }
}

impl fmt::Display for QuotaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{},{},{})",
            self.filesystem,
            self.block_soft_limit,
            self.block_hard_limit,
            self.inode_soft_limit,
            self.inode_hard_limit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_record_default() {
        let record = QuotaRecord::default();
        assert!(record.filesystem.is_empty());
        assert_eq!(record.limits(), [0, 0, 0, 0]);
    }

    #[test]
    fn test_display() {
        let record = QuotaRecord::new("/home", 10, 20, 30, 40);
        assert_eq!(record.to_string(), "(/home,10,20,30,40)");
    }

    #[test]
    fn test_to_attribute_value() {
        let record = QuotaRecord::new("/srv/data", 1, 2, 3, u64::MAX);
        assert_eq!(
            record.to_attribute_value(),
            format!("/srv/data:1,2,3,{}", u64::MAX)
        );
    }

    #[test]
    fn test_limit_mut_order() {
        let mut record = QuotaRecord::default();
        for i in 0..4 {
            *record.limit_mut(i).unwrap() = (i as u64 + 1) * 10;
        }
        assert!(record.limit_mut(4).is_none());
        assert_eq!(record.limits(), [10, 20, 30, 40]);
    }

    #[test]
    fn test_inverted_limits() {
        let record = QuotaRecord::new("/home", 100, 50, 10, 10);
        assert!(record.has_inverted_block_limits());
        assert!(!record.has_inverted_inode_limits());
    }
}
