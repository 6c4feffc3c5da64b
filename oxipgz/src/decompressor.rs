//! Parallel decompression of multi-member gzip streams.

use crate::compressor::{FinishOnDrop, joined};
use crate::io::PlainOutput;
use crate::report::CompressionReport;
use bytes::Bytes;
use oxipgz_core::{Block, BlockCodec, CompressorSettings, PgzError, Result};
use oxipgz_gzip::{GzipBlock, GzipBlockCodec, GzipBlockSplitter, RewindableReader, StreamingTail};
use oxipgz_pipeline::{DisposeOptions, OrderedTaskPipeline};
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

/// Decompresses gzip streams, decoding independent members in parallel.
///
/// Members whose boundaries can be proven are decoded on the worker pool
/// and written in stream order by a writer thread. Whatever follows the
/// last provable boundary is decoded sequentially once the pool is drained.
/// Streams written by any gzip encoder decode correctly; only the degree of
/// parallelism differs.
pub struct StreamDecompressor {
    settings: CompressorSettings,
    codec: Arc<dyn BlockCodec>,
}

impl StreamDecompressor {
    /// Create a decompressor using the flate2 gzip codec.
    pub fn new(settings: CompressorSettings) -> Self {
        Self::with_codec(settings, Arc::new(GzipBlockCodec::default()))
    }

    /// Create a decompressor with a custom block codec.
    pub fn with_codec(settings: CompressorSettings, codec: Arc<dyn BlockCodec>) -> Self {
        Self { settings, codec }
    }

    /// Settings in use.
    pub fn settings(&self) -> &CompressorSettings {
        &self.settings
    }

    /// Decompress `input`, from its current position, into `output`.
    pub fn decompress<R, W>(&self, mut input: R, output: W) -> Result<CompressionReport>
    where
        R: Read + Seek + Send,
        W: Write + Send,
    {
        let position = input.stream_position()?;
        let input_len = input.seek(SeekFrom::End(0))?;
        if position >= input_len {
            return Err(PgzError::NothingToDecompress);
        }
        input.seek(SeekFrom::Start(position))?;

        let started = Instant::now();
        let reader = RewindableReader::with_position(&mut input, position);
        let splitter = GzipBlockSplitter::new(reader, &self.settings)?;
        let mut pipeline = OrderedTaskPipeline::new(
            self.settings.threads_count(),
            self.settings.compressing_queue_size(),
            self.settings.result_recheck_interval(),
        )?;

        let outcome = thread::scope(|scope| -> Result<(usize, u64)> {
            let pipeline = &pipeline;
            let writer = thread::Builder::new()
                .name("oxipgz-writer".to_string())
                .spawn_scoped(scope, move || {
                    let _finish = FinishOnDrop(pipeline);
                    let mut output = PlainOutput::new(output);
                    Self::write_members(&mut output, pipeline).map(|()| output)
                });
            let writer = match writer {
                Ok(handle) => handle,
                Err(err) => {
                    pipeline.finish();
                    return Err(err.into());
                }
            };

            let submitted = self.submit_members(splitter, pipeline);
            let mut output = joined(writer, "writer")?;
            let (members, tail) = submitted?;
            if let Some(tail) = tail {
                info!(
                    position = tail.position(),
                    "decoding the rest of the stream sequentially"
                );
                tail.decode(self.codec.as_ref(), &mut output)?;
            }
            output.flush()?;
            Ok((members, output.written()))
        });
        pipeline.dispose(DisposeOptions::forced());
        let (members, output_len) = outcome?;

        let report = CompressionReport::new(input_len, output_len);
        info!(
            independent_members = members,
            input_len,
            output_len,
            ratio = report.ratio,
            elapsed = ?started.elapsed(),
            "decompression finished"
        );
        Ok(report)
    }

    fn submit_members<'a>(
        &self,
        splitter: GzipBlockSplitter<'a>,
        pipeline: &OrderedTaskPipeline<Bytes>,
    ) -> Result<(usize, Option<StreamingTail<'a>>)> {
        let _finish = FinishOnDrop(pipeline);
        let mut members = 0usize;
        for item in splitter {
            match item? {
                GzipBlock::Independent(bytes) => {
                    members += 1;
                    let codec = Arc::clone(&self.codec);
                    let index = members as u64;
                    pipeline.submit(format!("member-{index}"), move || {
                        let block = Block::new(bytes, index)?;
                        Ok(codec.decompress(&block)?.into_bytes())
                    })?;
                }
                GzipBlock::Streaming(tail) => return Ok((members, Some(tail))),
            }
        }
        Ok((members, None))
    }

    fn write_members<W: Write>(
        output: &mut PlainOutput<W>,
        pipeline: &OrderedTaskPipeline<Bytes>,
    ) -> Result<()> {
        for result in pipeline.results()? {
            let bytes = result?;
            output.append(&bytes)?;
            debug!(len = bytes.len(), "member written");
        }
        Ok(())
    }
}

impl std::fmt::Debug for StreamDecompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamDecompressor")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
