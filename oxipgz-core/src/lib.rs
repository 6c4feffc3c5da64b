//! # OxiPgz Core
//!
//! Core components for the OxiPgz parallel gzip compressor.
//!
//! This crate provides the vocabulary shared by every other layer:
//!
//! - [`block`]: Chunks of the logical input tagged with their end offset
//! - [`traits`]: The block codec collaborator and compression levels
//! - [`config`]: Validated compressor settings and their builder
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! OxiPgz is layered like the rest of the OxiArc family:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: Orchestration                                       │
//! │     StreamCompressor, StreamDecompressor, CLI           │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     Member headers, block splitters, resumable output   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Scheduling                                          │
//! │     Bounded queues, ordered results, worker pool        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Core (this crate)                                   │
//! │     Block, BlockCodec, settings, errors                 │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxipgz_core::{Block, CompressorSettingsBuilder};
//!
//! let block = Block::new(b"hello".to_vec(), 5).unwrap();
//! assert_eq!(block.offset(), 5);
//!
//! let settings = CompressorSettingsBuilder::new()
//!     .default_parallelism()
//!     .default_input_read_buffer_size()
//!     .default_offset_label()
//!     .build()
//!     .unwrap();
//! assert_eq!(settings.offset_label(), "========");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod config;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use block::Block;
pub use config::{CompressorSettings, CompressorSettingsBuilder};
pub use error::{CorruptionKind, FileRole, PgzError, ResourceKind, Result};
pub use traits::{BlockCodec, CompressionLevel, SizeHintMode};
