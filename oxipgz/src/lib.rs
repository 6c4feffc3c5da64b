//! # OxiPgz
//!
//! Parallel block-oriented gzip compression with resumable output.
//!
//! The input is cut into fixed-size blocks that are compressed into
//! independent gzip members on a worker pool. The members are written in
//! input order, and after each one the output records how much input it
//! reflects, so an interrupted run picks up where it stopped.
//!
//! Decompression finds member boundaries by header pattern matching alone.
//! Provably independent members are decoded in parallel; anything else is
//! decoded sequentially, so output from any gzip encoder is accepted.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  FileCompression (paths, FileSystem)                        │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │  StreamCompressor            │  StreamDecompressor          │
//! │  reader ─► pool ─► writer    │  splitter ─► pool ─► writer  │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │  OrderedTaskPipeline (oxipgz-pipeline)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  InputFile / OutputFile / PlainOutput │ oxipgz-gzip         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxipgz::{CompressorSettings, StreamCompressor, StreamDecompressor};
//! use std::io::Cursor;
//!
//! let settings = CompressorSettings::new(4096, 2, 2, "========").unwrap();
//! let data = b"some text worth compressing ".repeat(1000);
//!
//! let mut packed = Cursor::new(Vec::new());
//! StreamCompressor::new(settings.clone())
//!     .compress(Cursor::new(data.clone()), &mut packed)
//!     .unwrap();
//!
//! let mut unpacked = Vec::new();
//! StreamDecompressor::new(settings)
//!     .decompress(Cursor::new(packed.into_inner()), &mut unpacked)
//!     .unwrap();
//! assert_eq!(unpacked, data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod compressor;
pub mod decompressor;
pub mod file;
pub mod fs;
pub mod io;
pub mod report;

pub use compressor::StreamCompressor;
pub use decompressor::StreamDecompressor;
pub use file::FileCompression;
pub use fs::{FileSystem, LocalFileSystem};
pub use io::{InputFile, OutputFile, OutputStream, PlainOutput};
pub use report::CompressionReport;

pub use oxipgz_core::{
    CompressionLevel, CompressorSettings, CompressorSettingsBuilder, PgzError, Result,
    SizeHintMode,
};
