//! Discovery of independent gzip members in a compressed stream.
//!
//! Strategies are tried in order. Each one reports a [`SplitStatus`] per
//! attempt; when a strategy can no longer prove member boundaries the next
//! one takes over from the same position. Once every strategy gives up, the
//! rest of the stream is handed out as a [`StreamingTail`] to be decoded
//! sequentially.

mod buffer_bound;
mod size_hint;

pub use buffer_bound::BufferBoundSplitter;
pub use size_hint::SizeHintSplitter;

use crate::stream::{MemberAlignedReader, RewindableReader};
use bytes::Bytes;
use oxipgz_core::{BlockCodec, CompressorSettings, PgzError, Result};
use std::io::{BufReader, Write};
use tracing::{debug, info};

/// Outcome of one splitting attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitStatus {
    /// A complete member (or run of members) was found.
    Block(Bytes),
    /// The stream ended cleanly.
    StreamIsEnd,
    /// The stream is not aligned to member headers.
    WrongFormat,
    /// This strategy cannot prove the next boundary. Nothing was consumed.
    CantReadBlock,
}

/// A strategy for cutting independent members off a stream.
pub trait BlockSplitter: Send {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Try to cut the next member off `reader`.
    ///
    /// On [`SplitStatus::CantReadBlock`] and [`SplitStatus::WrongFormat`]
    /// every byte read during the attempt has been pushed back.
    fn next_status(&mut self, reader: &mut RewindableReader<'_>) -> Result<SplitStatus>;
}

/// A piece of the compressed stream produced by [`GzipBlockSplitter`].
#[derive(Debug)]
pub enum GzipBlock<'a> {
    /// Complete members that can be decoded on their own.
    Independent(Bytes),
    /// The rest of the stream, to be decoded sequentially.
    Streaming(StreamingTail<'a>),
}

/// Remainder of a stream whose member boundaries could not be proven.
#[derive(Debug)]
pub struct StreamingTail<'a> {
    reader: RewindableReader<'a>,
}

impl<'a> StreamingTail<'a> {
    /// Stream position where the tail starts.
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    /// A reader over the tail that never mixes bytes of two members in one
    /// read.
    pub fn into_reader(self) -> MemberAlignedReader<'a> {
        MemberAlignedReader::new(self.reader)
    }

    /// Decode every remaining member into `output`.
    pub fn decode(self, codec: &dyn BlockCodec, output: &mut dyn Write) -> Result<u64> {
        let mut input = BufReader::new(self.into_reader());
        codec.decompress_stream(&mut input, output)
    }
}

/// Lazily yields the members of a gzip stream.
///
/// Independent blocks come first, in stream order. At most one streaming
/// tail follows, and it is always the last item.
pub struct GzipBlockSplitter<'a> {
    reader: Option<RewindableReader<'a>>,
    strategies: Vec<Box<dyn BlockSplitter>>,
    current: usize,
    finished: bool,
}

impl<'a> GzipBlockSplitter<'a> {
    /// Split with the size-hint strategy, then the buffer scan.
    pub fn new(reader: RewindableReader<'a>, settings: &CompressorSettings) -> Result<Self> {
        let strategies: Vec<Box<dyn BlockSplitter>> = vec![
            Box::new(SizeHintSplitter::new(settings.max_independent_block_size())?),
            Box::new(BufferBoundSplitter::new(
                settings.parallel_decompression_buffer_size(),
            )?),
        ];
        Ok(Self::with_strategies(reader, strategies))
    }

    /// Split with custom strategies, tried in order.
    pub fn with_strategies(
        reader: RewindableReader<'a>,
        strategies: Vec<Box<dyn BlockSplitter>>,
    ) -> Self {
        Self {
            reader: Some(reader),
            strategies,
            current: 0,
            finished: false,
        }
    }

    fn fail(&mut self, err: PgzError) -> Option<Result<GzipBlock<'a>>> {
        self.finished = true;
        Some(Err(err))
    }
}

impl<'a> Iterator for GzipBlockSplitter<'a> {
    type Item = Result<GzipBlock<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let reader = self.reader.as_mut()?;

        while let Some(strategy) = self.strategies.get_mut(self.current) {
            match strategy.next_status(reader) {
                Ok(SplitStatus::Block(bytes)) => return Some(Ok(GzipBlock::Independent(bytes))),
                Ok(SplitStatus::StreamIsEnd) => {
                    debug!(strategy = strategy.name(), "stream ended");
                    self.finished = true;
                    return None;
                }
                Ok(SplitStatus::WrongFormat) => {
                    let position = reader.position();
                    return self.fail(PgzError::format(format!(
                        "no gzip member header at offset {position}"
                    )));
                }
                Ok(SplitStatus::CantReadBlock) => {
                    info!(
                        strategy = strategy.name(),
                        position = reader.position(),
                        "cannot split further, trying next strategy"
                    );
                    self.current += 1;
                }
                Err(err) => return self.fail(err),
            }
        }

        self.finished = true;
        match reader.is_at_end() {
            Ok(true) => None,
            Ok(false) => {
                let reader = self.reader.take()?;
                info!(position = reader.position(), "decoding the rest as a stream");
                Some(Ok(GzipBlock::Streaming(StreamingTail { reader })))
            }
            Err(err) => Some(Err(err.into())),
        }
    }
}

impl std::fmt::Debug for GzipBlockSplitter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("GzipBlockSplitter")
            .field("strategies", &names)
            .field("current", &self.current)
            .field("finished", &self.finished)
            .finish()
    }
}
