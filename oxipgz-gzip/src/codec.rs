//! Block codec backed by flate2.

use crate::header::{self, os};
use bytes::Bytes;
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use oxipgz_core::{Block, BlockCodec, CompressionLevel, PgzError, Result, SizeHintMode};
use std::io::{self, BufRead, Read, Write};
use tracing::debug;

/// Compresses each block into one gzip member, optionally recording the
/// member's length in its header.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipBlockCodec {
    level: CompressionLevel,
}

impl GzipBlockCodec {
    /// Create a codec with the given compression level.
    pub fn new(level: CompressionLevel) -> Self {
        Self { level }
    }

    /// The compression level.
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    fn encode(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = flate2::GzBuilder::new()
            .operating_system(os::UNKNOWN)
            .write(
                Vec::with_capacity(data.len() / 2 + header::HEADER_LEN),
                Compression::new(u32::from(self.level.level())),
            );
        encoder.write_all(data)?;
        encoder.finish()
    }
}

impl BlockCodec for GzipBlockCodec {
    fn compress(&self, block: &Block, hint: SizeHintMode) -> Result<Block> {
        if block.is_empty() {
            return Ok(block.with_bytes(Bytes::new()));
        }

        let mut member = self.encode(block.bytes())?;
        if hint == SizeHintMode::BlockLengthInHeader {
            match u32::try_from(member.len()) {
                Ok(len) => {
                    header::write_size_hint(&mut member, len);
                }
                Err(_) => debug!(len = member.len(), "member too long for a size hint"),
            }
        }
        Ok(block.with_bytes(member))
    }

    fn decompress(&self, block: &Block) -> Result<Block> {
        if block.is_empty() {
            return Ok(block.with_bytes(Bytes::new()));
        }

        let mut decoded = Vec::with_capacity(block.len() * 3);
        MultiGzDecoder::new(block.bytes().as_ref())
            .read_to_end(&mut decoded)
            .map_err(decode_error)?;
        Ok(block.with_bytes(decoded))
    }

    fn decompress_stream(&self, input: &mut dyn BufRead, output: &mut dyn Write) -> Result<u64> {
        let mut written = 0u64;
        let mut members = 0usize;
        while !input.fill_buf()?.is_empty() {
            let mut decoder = flate2::bufread::GzDecoder::new(&mut *input);
            written += io::copy(&mut decoder, output).map_err(decode_error)?;
            members += 1;
        }
        debug!(members, written, "streamed members decoded");
        Ok(written)
    }
}

fn decode_error(err: io::Error) -> PgzError {
    match err.kind() {
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            PgzError::format(err.to_string())
        }
        _ => PgzError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn block(data: &[u8]) -> Block {
        Block::new(data.to_vec(), 100).unwrap()
    }

    #[test]
    fn test_round_trip_with_hint() {
        let codec = GzipBlockCodec::default();
        let original = b"hello hello hello hello parallel gzip".repeat(20);

        let compressed = codec
            .compress(&block(&original), SizeHintMode::BlockLengthInHeader)
            .unwrap();
        assert_eq!(compressed.offset(), 100);
        assert!(header::is_header(compressed.bytes()));
        assert_eq!(
            header::read_size_hint(compressed.bytes()),
            Some(compressed.len() as u32)
        );

        let restored = codec.decompress(&compressed).unwrap();
        assert_eq!(restored.bytes().as_ref(), original.as_slice());
    }

    #[test]
    fn test_no_hint_mode_leaves_header() {
        let codec = GzipBlockCodec::new(CompressionLevel::FAST);
        let compressed = codec.compress(&block(b"abc"), SizeHintMode::None).unwrap();
        assert_eq!(header::read_size_hint(compressed.bytes()), None);
    }

    #[test]
    fn test_empty_block() {
        let codec = GzipBlockCodec::default();
        let empty = Block::new(Vec::new(), 7).unwrap();
        let compressed = codec
            .compress(&empty, SizeHintMode::BlockLengthInHeader)
            .unwrap();
        assert!(compressed.is_empty());
        assert_eq!(compressed.offset(), 7);
        assert!(codec.decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_stream_decodes_every_member() {
        let codec = GzipBlockCodec::default();
        let mut joined = Vec::new();
        for part in [&b"first "[..], b"second ", b"third"] {
            let member = codec
                .compress(&block(part), SizeHintMode::BlockLengthInHeader)
                .unwrap();
            joined.extend_from_slice(member.bytes());
        }

        let mut input = BufReader::new(joined.as_slice());
        let mut output = Vec::new();
        let written = codec.decompress_stream(&mut input, &mut output).unwrap();
        assert_eq!(output, b"first second third");
        assert_eq!(written, output.len() as u64);
    }

    #[test]
    fn test_garbage_is_format_error() {
        let codec = GzipBlockCodec::default();
        let err = codec.decompress(&block(b"definitely not gzip")).unwrap_err();
        assert!(matches!(err, PgzError::Format { .. }));
    }
}
