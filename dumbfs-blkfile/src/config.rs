use serde::{Deserialize, Serialize};

/// Configuration values for a block allocator.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Flush the store after every write of the allocation cursor, making the metadata write a
    /// synchronous one.
    /// Default: false
    pub sync_metadata: bool,
}

impl Options {
    /// Options with the metadata write flushed to the medium on every allocation.
    pub fn synced() -> Self {
        Self {
            sync_metadata: true,
        }
    }
}
