//! Compressor configuration.
//!
//! [`CompressorSettings`] is validated on construction and immutable
//! afterwards. [`CompressorSettingsBuilder`] derives the thread and queue
//! counts from the machine's parallelism.

use crate::error::{PgzError, Result};
use crate::traits::{CompressionLevel, SizeHintMode};
use std::time::Duration;

/// Length of a fixed gzip member header.
const GZIP_HEADER_LEN: usize = 10;

/// Default sizes and limits.
pub mod defaults {
    use std::time::Duration;

    /// Bytes read from the input per cycle (128 KiB).
    pub const INPUT_READ_BUFFER_SIZE: usize = 128 * 1024;
    /// Largest member the size-hint splitter will read in one piece (128 MiB).
    pub const MAX_INDEPENDENT_BLOCK_SIZE: usize = 128 * 1024 * 1024;
    /// Label written before the trailing offset of an uncommitted output.
    pub const OFFSET_LABEL: &str = "========";
    /// Worker threads per logical CPU.
    pub const THREADS_PER_CPU: usize = 1;
    /// How often a waiting result consumer re-checks the oldest slot.
    pub const RESULT_RECHECK_INTERVAL: Duration = Duration::from_millis(100);
}

/// Threads that are not part of the worker pool: the reader and the writer.
const IO_THREADS: usize = 2;

/// Validated settings shared by the compressor and the decompressor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressorSettings {
    input_read_buffer_size: usize,
    threads_count: usize,
    compressing_queue_size: usize,
    offset_label: String,
    max_independent_block_size: usize,
    size_hint_mode: SizeHintMode,
    compression_level: CompressionLevel,
    result_recheck_interval: Duration,
}

impl CompressorSettings {
    /// Create settings, validating every value.
    pub fn new(
        input_read_buffer_size: usize,
        threads_count: usize,
        compressing_queue_size: usize,
        offset_label: impl Into<String>,
    ) -> Result<Self> {
        let offset_label = offset_label.into();
        if input_read_buffer_size <= GZIP_HEADER_LEN {
            return Err(PgzError::invalid_argument(format!(
                "input read buffer size must exceed {GZIP_HEADER_LEN} bytes, got {input_read_buffer_size}"
            )));
        }
        if threads_count == 0 {
            return Err(PgzError::invalid_argument("threads count must be positive"));
        }
        if compressing_queue_size == 0 {
            return Err(PgzError::invalid_argument(
                "compressing queue size must be positive",
            ));
        }
        validate_offset_label(&offset_label)?;

        Ok(Self {
            input_read_buffer_size,
            threads_count,
            compressing_queue_size,
            offset_label,
            max_independent_block_size: defaults::MAX_INDEPENDENT_BLOCK_SIZE,
            size_hint_mode: SizeHintMode::default(),
            compression_level: CompressionLevel::default(),
            result_recheck_interval: defaults::RESULT_RECHECK_INTERVAL,
        })
    }

    /// Set the size-hint splitter's block limit.
    pub fn with_max_independent_block_size(mut self, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(PgzError::invalid_argument(
                "max independent block size must be positive",
            ));
        }
        self.max_independent_block_size = limit;
        Ok(self)
    }

    /// Set whether compressed members carry a size hint.
    pub fn with_size_hint_mode(mut self, mode: SizeHintMode) -> Self {
        self.size_hint_mode = mode;
        self
    }

    /// Set the codec's compression level.
    pub fn with_compression_level(mut self, level: CompressionLevel) -> Self {
        self.compression_level = level;
        self
    }

    /// Set how often a blocked result consumer re-checks for completion.
    pub fn with_result_recheck_interval(mut self, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(PgzError::invalid_argument(
                "result recheck interval must be positive",
            ));
        }
        self.result_recheck_interval = interval;
        Ok(self)
    }

    /// Bytes read from the input per cycle.
    pub fn input_read_buffer_size(&self) -> usize {
        self.input_read_buffer_size
    }

    /// Buffer used by the scanning splitter during decompression.
    pub fn parallel_decompression_buffer_size(&self) -> usize {
        self.input_read_buffer_size
    }

    /// Number of worker threads.
    pub fn threads_count(&self) -> usize {
        self.threads_count
    }

    /// Pipeline capacity: in-flight tasks plus undrained results.
    pub fn compressing_queue_size(&self) -> usize {
        self.compressing_queue_size
    }

    /// Label of the trailing offset marker.
    pub fn offset_label(&self) -> &str {
        &self.offset_label
    }

    /// Size-hint splitter limit.
    pub fn max_independent_block_size(&self) -> usize {
        self.max_independent_block_size
    }

    /// Whether compressed members carry a size hint.
    pub fn size_hint_mode(&self) -> SizeHintMode {
        self.size_hint_mode
    }

    /// Codec compression level.
    pub fn compression_level(&self) -> CompressionLevel {
        self.compression_level
    }

    /// Result consumer re-check interval.
    pub fn result_recheck_interval(&self) -> Duration {
        self.result_recheck_interval
    }
}

fn validate_offset_label(label: &str) -> Result<()> {
    if label.trim().is_empty() {
        return Err(PgzError::invalid_argument(
            "offset label can't be empty or whitespace",
        ));
    }
    if !label.is_ascii() {
        return Err(PgzError::invalid_argument("offset label must be ASCII"));
    }
    Ok(())
}

/// Step-by-step construction of [`CompressorSettings`].
#[derive(Debug, Clone, Default)]
pub struct CompressorSettingsBuilder {
    threads_count: Option<usize>,
    compressing_queue_size: Option<usize>,
    offset_label: Option<String>,
    input_read_buffer_size: Option<usize>,
    size_hint_mode: SizeHintMode,
    compression_level: CompressionLevel,
}

impl CompressorSettingsBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the default offset label.
    pub fn default_offset_label(mut self) -> Self {
        self.offset_label = Some(defaults::OFFSET_LABEL.to_string());
        self
    }

    /// Use a custom offset label.
    pub fn offset_label(mut self, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        validate_offset_label(&label)?;
        self.offset_label = Some(label);
        Ok(self)
    }

    /// One worker thread per logical CPU.
    pub fn default_parallelism(self) -> Self {
        let threads = available_cpus() * defaults::THREADS_PER_CPU;
        self.with_threads(threads, None)
    }

    /// `threads_per_cpu` worker threads per logical CPU.
    ///
    /// Without an explicit `queue_size` the pipeline capacity is the thread
    /// count minus the reader and writer threads, but at least one.
    pub fn parallelism_by_threads_per_cpu(
        self,
        threads_per_cpu: usize,
        queue_size: Option<usize>,
    ) -> Result<Self> {
        if threads_per_cpu == 0 {
            return Err(PgzError::invalid_argument(
                "threads per CPU must be positive",
            ));
        }
        if queue_size == Some(0) {
            return Err(PgzError::invalid_argument(
                "compressing queue size must be positive",
            ));
        }
        Ok(self.with_threads(available_cpus() * threads_per_cpu, queue_size))
    }

    /// Exact thread count, independent of the machine.
    pub fn threads(self, threads: usize, queue_size: Option<usize>) -> Result<Self> {
        if threads == 0 {
            return Err(PgzError::invalid_argument("threads count must be positive"));
        }
        Ok(self.with_threads(threads, queue_size))
    }

    fn with_threads(mut self, threads: usize, queue_size: Option<usize>) -> Self {
        self.threads_count = Some(threads);
        self.compressing_queue_size =
            Some(queue_size.unwrap_or_else(|| threads.saturating_sub(IO_THREADS).max(1)));
        self
    }

    /// Bytes read from the input per cycle.
    pub fn input_read_buffer_size(mut self, size: usize) -> Result<Self> {
        if size <= GZIP_HEADER_LEN {
            return Err(PgzError::invalid_argument(format!(
                "input read buffer size must exceed {GZIP_HEADER_LEN} bytes, got {size}"
            )));
        }
        self.input_read_buffer_size = Some(size);
        Ok(self)
    }

    /// Use the default read buffer size.
    pub fn default_input_read_buffer_size(mut self) -> Self {
        self.input_read_buffer_size = Some(defaults::INPUT_READ_BUFFER_SIZE);
        self
    }

    /// Whether compressed members carry a size hint.
    pub fn size_hint_mode(mut self, mode: SizeHintMode) -> Self {
        self.size_hint_mode = mode;
        self
    }

    /// Codec compression level.
    pub fn compression_level(mut self, level: CompressionLevel) -> Self {
        self.compression_level = level;
        self
    }

    /// Validate and build the settings.
    pub fn build(self) -> Result<CompressorSettings> {
        let (Some(threads), Some(queue_size)) = (self.threads_count, self.compressing_queue_size)
        else {
            return Err(PgzError::invalid_argument("parallelism isn't set up"));
        };
        let Some(buffer_size) = self.input_read_buffer_size else {
            return Err(PgzError::invalid_argument(
                "input read buffer size isn't set up",
            ));
        };
        let Some(label) = self.offset_label else {
            return Err(PgzError::invalid_argument("offset label isn't set up"));
        };

        Ok(CompressorSettings::new(buffer_size, threads, queue_size, label)?
            .with_size_hint_mode(self.size_hint_mode)
            .with_compression_level(self.compression_level))
    }
}

fn available_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_validation() {
        assert!(CompressorSettings::new(10, 1, 1, "==").is_err());
        assert!(CompressorSettings::new(64, 0, 1, "==").is_err());
        assert!(CompressorSettings::new(64, 1, 0, "==").is_err());
        assert!(CompressorSettings::new(64, 1, 1, "   ").is_err());
        assert!(CompressorSettings::new(64, 1, 1, "метка").is_err());

        let settings = CompressorSettings::new(64, 2, 3, "##").unwrap();
        assert_eq!(settings.parallel_decompression_buffer_size(), 64);
        assert_eq!(settings.threads_count(), 2);
        assert_eq!(settings.compressing_queue_size(), 3);
        assert_eq!(
            settings.max_independent_block_size(),
            defaults::MAX_INDEPENDENT_BLOCK_SIZE
        );
    }

    #[test]
    fn test_builder_requires_everything() {
        assert!(CompressorSettingsBuilder::new().build().is_err());
        assert!(
            CompressorSettingsBuilder::new()
                .default_parallelism()
                .default_input_read_buffer_size()
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_builder_defaults() {
        let settings = CompressorSettingsBuilder::new()
            .default_parallelism()
            .default_input_read_buffer_size()
            .default_offset_label()
            .build()
            .unwrap();

        assert_eq!(settings.offset_label(), "========");
        assert_eq!(
            settings.input_read_buffer_size(),
            defaults::INPUT_READ_BUFFER_SIZE
        );
        assert!(settings.threads_count() >= 1);
        assert!(settings.compressing_queue_size() >= 1);
        assert_eq!(settings.size_hint_mode(), SizeHintMode::BlockLengthInHeader);
    }

    #[test]
    fn test_queue_size_excludes_io_threads() {
        let settings = CompressorSettingsBuilder::new()
            .threads(8, None)
            .unwrap()
            .default_input_read_buffer_size()
            .default_offset_label()
            .build()
            .unwrap();
        assert_eq!(settings.compressing_queue_size(), 6);

        let settings = CompressorSettingsBuilder::new()
            .threads(1, None)
            .unwrap()
            .default_input_read_buffer_size()
            .default_offset_label()
            .build()
            .unwrap();
        assert_eq!(settings.compressing_queue_size(), 1);
    }

    #[test]
    fn test_zero_recheck_interval_rejected() {
        let settings = CompressorSettings::new(64, 1, 1, "==").unwrap();
        assert!(settings.with_result_recheck_interval(Duration::ZERO).is_err());
    }
}
