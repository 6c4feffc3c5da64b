//! Blocks of the logical input stream.

use crate::error::{PgzError, Result};
use bytes::Bytes;

/// A contiguous chunk of the input together with the stream position
/// immediately after it.
///
/// The offset is always positive: a block covers at least the byte before
/// `offset`, or is an empty tail reported at a non-zero position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    bytes: Bytes,
    offset: u64,
}

impl Block {
    /// Create a block ending at `offset`.
    ///
    /// Fails when `offset` is zero.
    pub fn new(bytes: impl Into<Bytes>, offset: u64) -> Result<Self> {
        if offset == 0 {
            return Err(PgzError::invalid_argument("block offset must be positive"));
        }
        Ok(Self {
            bytes: bytes.into(),
            offset,
        })
    }

    /// Create a block carrying new bytes at the same offset.
    pub fn with_bytes(&self, bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            offset: self.offset,
        }
    }

    /// The block contents.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Consume the block returning its contents.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Stream position immediately after this block.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of bytes in the block.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the block holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
