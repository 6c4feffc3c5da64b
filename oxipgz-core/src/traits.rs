//! Core traits for block compression.
//!
//! The DEFLATE primitive itself is a collaborator: anything implementing
//! [`BlockCodec`] can be scheduled by the parallel pipeline.

use crate::block::Block;
use crate::error::Result;
use std::io::{BufRead, Write};

/// Whether compressed members carry their own length in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeHintMode {
    /// Leave the header untouched.
    None,
    /// Overwrite header bytes 4..8 with the member's total compressed length.
    #[default]
    BlockLengthInHeader,
}

/// A block-level gzip encoder/decoder.
///
/// Implementations must be shareable between worker threads.
pub trait BlockCodec: Send + Sync {
    /// Compress one block into a single gzip member.
    ///
    /// The returned block keeps the input block's offset. An empty input block
    /// produces an empty output block.
    fn compress(&self, block: &Block, hint: SizeHintMode) -> Result<Block>;

    /// Decompress a block holding one or more complete gzip members.
    fn decompress(&self, block: &Block) -> Result<Block>;

    /// Decompress every member readable from `input` into `output`.
    ///
    /// Returns the number of bytes written.
    fn decompress_stream(&self, input: &mut dyn BufRead, output: &mut dyn Write) -> Result<u64>;
}

/// Compression level for algorithms that support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// No compression (store only).
    pub const NONE: Self = Self(0);
    /// Fastest compression.
    pub const FAST: Self = Self(1);
    /// Default compression (balanced).
    pub const DEFAULT: Self = Self(6);
    /// Best compression (slowest).
    pub const BEST: Self = Self(9);

    /// Create a custom compression level (0-9).
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    /// Get the level value.
    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for CompressionLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}
