//! # OxiPgz Gzip
//!
//! Gzip member framing for the OxiPgz parallel compressor.
//!
//! This crate knows nothing about DEFLATE internals. It finds member
//! boundaries by byte-pattern matching alone:
//!
//! - [`mask`]: Per-byte masks and fixed-length signatures
//! - [`header`]: The member header signature and the size-hint field
//! - [`buffer`]: A scanned byte view that can be cut at member boundaries
//! - [`stream`]: Rewindable and member-aligned readers
//! - [`splitter`]: Size-hint and buffer-scan strategies with a streaming
//!   fallback
//! - [`codec`]: The flate2-backed block codec
//!
//! ## Size hints
//!
//! Members written by [`GzipBlockCodec`] in
//! [`SizeHintMode::BlockLengthInHeader`](oxipgz_core::SizeHintMode) store
//! their total length in header bytes 4..8. Readers treat a zero field as
//! "no hint", so streams from any other gzip encoder still decode, through
//! the buffer scan or the streaming fallback.
//!
//! ## Example
//!
//! ```rust
//! use oxipgz_core::{Block, BlockCodec, CompressorSettings, SizeHintMode};
//! use oxipgz_gzip::{GzipBlock, GzipBlockCodec, GzipBlockSplitter, RewindableReader};
//!
//! let codec = GzipBlockCodec::default();
//! let mut stream = Vec::new();
//! for (i, part) in [&b"alpha "[..], b"beta"].iter().enumerate() {
//!     let block = Block::new(part.to_vec(), i as u64 + 1).unwrap();
//!     let member = codec.compress(&block, SizeHintMode::BlockLengthInHeader).unwrap();
//!     stream.extend_from_slice(member.bytes());
//! }
//!
//! let settings = CompressorSettings::new(1024, 1, 1, "========").unwrap();
//! let reader = RewindableReader::new(std::io::Cursor::new(stream));
//! let mut out = Vec::new();
//! for item in GzipBlockSplitter::new(reader, &settings).unwrap() {
//!     match item.unwrap() {
//!         GzipBlock::Independent(bytes) => {
//!             let block = Block::new(bytes, 1).unwrap();
//!             out.extend_from_slice(codec.decompress(&block).unwrap().bytes());
//!         }
//!         GzipBlock::Streaming(tail) => {
//!             tail.decode(&codec, &mut out).unwrap();
//!         }
//!     }
//! }
//! assert_eq!(out, b"alpha beta");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod codec;
pub mod header;
pub mod mask;
pub mod splitter;
pub mod stream;

pub use buffer::ContainerBuffer;
pub use codec::GzipBlockCodec;
pub use header::{HEADER_LEN, MEMBER_SIGNATURE};
pub use mask::{ByteMask, ByteSignature};
pub use splitter::{
    BlockSplitter, BufferBoundSplitter, GzipBlock, GzipBlockSplitter, SizeHintSplitter,
    SplitStatus, StreamingTail,
};
pub use stream::{MemberAlignedReader, RewindableReader};
