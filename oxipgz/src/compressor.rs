//! Parallel compression of a seekable stream into resumable gzip output.

use crate::io::{InputFile, OutputFile, OutputStream};
use crate::report::CompressionReport;
use oxipgz_core::{Block, BlockCodec, CompressorSettings, PgzError, Result};
use oxipgz_gzip::GzipBlockCodec;
use oxipgz_pipeline::{DisposeOptions, OrderedTaskPipeline, panic_message};
use std::io::{Read, Seek};
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;
use tracing::{debug, info};

/// Compresses a stream block by block on a worker pool.
///
/// One reader thread cuts the input into blocks of
/// [`input_read_buffer_size`](CompressorSettings::input_read_buffer_size)
/// bytes, the pool compresses each block into an independent gzip member,
/// and the calling thread appends the members to the output in input order.
///
/// After every member the output records how much input it reflects, so a
/// run interrupted for any reason resumes where it stopped when called again
/// with the same input and output.
pub struct StreamCompressor {
    settings: CompressorSettings,
    codec: Arc<dyn BlockCodec>,
}

impl StreamCompressor {
    /// Create a compressor using the flate2 gzip codec.
    pub fn new(settings: CompressorSettings) -> Self {
        let codec = GzipBlockCodec::new(settings.compression_level());
        Self::with_codec(settings, Arc::new(codec))
    }

    /// Create a compressor with a custom block codec.
    pub fn with_codec(settings: CompressorSettings, codec: Arc<dyn BlockCodec>) -> Self {
        Self { settings, codec }
    }

    /// Settings in use.
    pub fn settings(&self) -> &CompressorSettings {
        &self.settings
    }

    /// Compress `input` into `output`, resuming from the offset recorded in
    /// `output` if there is one.
    ///
    /// On success the output is committed: its progress trailer is removed
    /// and it is a plain multi-member gzip stream. On failure the output is
    /// left as is and can be resumed.
    pub fn compress<R, W>(&self, input: R, output: W) -> Result<CompressionReport>
    where
        R: Read + Seek + Send,
        W: OutputStream,
    {
        let mut input = InputFile::new(input);
        if input.is_at_end()? {
            return Err(PgzError::NothingToCompress);
        }
        let input_len = input.total_len()?;

        let mut output = OutputFile::new(output, self.settings.offset_label())?;
        let resume_from = output.last_offset()?;
        if resume_from > input_len {
            return Err(PgzError::invalid_argument(format!(
                "output reflects {resume_from} input bytes but the input has only {input_len}"
            )));
        }
        if resume_from > 0 {
            info!(offset = resume_from, "resuming compression");
        }

        let started = Instant::now();
        let mut pipeline = OrderedTaskPipeline::new(
            self.settings.threads_count(),
            self.settings.compressing_queue_size(),
            self.settings.result_recheck_interval(),
        )?;

        let outcome = thread::scope(|scope| -> Result<usize> {
            let pipeline = &pipeline;
            let producer = thread::Builder::new()
                .name("oxipgz-reader".to_string())
                .spawn_scoped(scope, || self.produce(&mut input, resume_from, pipeline));
            let producer = match producer {
                Ok(handle) => handle,
                Err(err) => {
                    pipeline.finish();
                    return Err(err.into());
                }
            };

            let consumed = {
                let _finish = FinishOnDrop(pipeline);
                self.consume(&mut output, pipeline)
            };
            let produced = joined(producer, "reader");
            consumed.and_then(|appended| produced.map(|()| appended))
        });
        pipeline.dispose(DisposeOptions::forced());
        let appended = outcome?;

        let output_len = output.commit()?;
        let report = CompressionReport::new(input_len, output_len);
        info!(
            blocks = appended,
            input_len,
            output_len,
            ratio = report.ratio,
            elapsed = ?started.elapsed(),
            "compression finished"
        );
        Ok(report)
    }

    fn produce<R: Read + Seek>(
        &self,
        input: &mut InputFile<R>,
        from: u64,
        pipeline: &OrderedTaskPipeline<Block>,
    ) -> Result<()> {
        let _finish = FinishOnDrop(pipeline);
        let hint = self.settings.size_hint_mode();
        for block in input.read_blocks(self.settings.input_read_buffer_size(), from)? {
            let block = block?;
            let codec = Arc::clone(&self.codec);
            pipeline.submit(format!("compress@{}", block.offset()), move || {
                codec.compress(&block, hint)
            })?;
        }
        Ok(())
    }

    fn consume<W: OutputStream>(
        &self,
        output: &mut OutputFile<W>,
        pipeline: &OrderedTaskPipeline<Block>,
    ) -> Result<usize> {
        let mut appended = 0;
        for result in pipeline.results()? {
            let block = result?;
            output.append(block.bytes(), block.offset())?;
            debug!(offset = block.offset(), len = block.len(), "member appended");
            appended += 1;
        }
        Ok(appended)
    }
}

impl std::fmt::Debug for StreamCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCompressor")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Finishes a pipeline when either side of it exits, however it exits.
pub(crate) struct FinishOnDrop<'a, T: Send + 'static>(pub(crate) &'a OrderedTaskPipeline<T>);

impl<T: Send + 'static> Drop for FinishOnDrop<'_, T> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Join a scoped thread, turning a panic into an error.
pub(crate) fn joined<T>(handle: ScopedJoinHandle<'_, Result<T>>, role: &str) -> Result<T> {
    handle.join().unwrap_or_else(|payload| {
        Err(PgzError::task_panicked(
            role,
            panic_message(payload.as_ref()),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn settings(buffer: usize, threads: usize) -> CompressorSettings {
        CompressorSettings::new(buffer, threads, threads.max(2), "========").unwrap()
    }

    #[test]
    fn test_empty_input() {
        let compressor = StreamCompressor::new(settings(64, 2));
        let mut output = Cursor::new(Vec::new());
        let err = compressor
            .compress(Cursor::new(Vec::new()), &mut output)
            .unwrap_err();
        assert!(matches!(err, PgzError::NothingToCompress));
        assert!(output.get_ref().is_empty());
    }

    #[test]
    fn test_output_is_committed_gzip() {
        let data = b"hello hello hello hello parallel gzip".repeat(40);
        let compressor = StreamCompressor::new(settings(100, 3));
        let mut output = Cursor::new(Vec::new());
        let report = compressor
            .compress(Cursor::new(data.clone()), &mut output)
            .unwrap();

        let compressed = output.into_inner();
        assert_eq!(report.input_len, data.len() as u64);
        assert_eq!(report.output_len, compressed.len() as u64);
        assert!(!compressed.ends_with(b"========"));

        let mut decoded = Vec::new();
        flate2::read::MultiGzDecoder::new(compressed.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_committed_output_not_resumable() {
        let compressor = StreamCompressor::new(settings(64, 2));
        let mut output = Cursor::new(Vec::new());
        compressor
            .compress(Cursor::new(vec![1u8; 300]), &mut output)
            .unwrap();

        let err = compressor
            .compress(Cursor::new(vec![1u8; 300]), &mut output)
            .unwrap_err();
        assert!(matches!(err, PgzError::OutputCorrupted { .. }));
    }

    struct FailingCodec;

    impl BlockCodec for FailingCodec {
        fn compress(&self, block: &Block, _: oxipgz_core::SizeHintMode) -> Result<Block> {
            if block.offset() > 128 {
                return Err(PgzError::format("refusing block"));
            }
            Ok(block.clone())
        }

        fn decompress(&self, block: &Block) -> Result<Block> {
            Ok(block.clone())
        }

        fn decompress_stream(
            &self,
            _: &mut dyn std::io::BufRead,
            _: &mut dyn std::io::Write,
        ) -> Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_task_failure_leaves_resumable_output() {
        let compressor = StreamCompressor::with_codec(settings(64, 2), Arc::new(FailingCodec));
        let mut output = Cursor::new(Vec::new());
        let err = compressor
            .compress(Cursor::new(vec![9u8; 1000]), &mut output)
            .unwrap_err();
        assert!(matches!(err, PgzError::Format { .. }));

        let mut resumed = OutputFile::new(&mut output, "========").unwrap();
        assert_eq!(resumed.last_offset().unwrap(), 128);
    }
}
