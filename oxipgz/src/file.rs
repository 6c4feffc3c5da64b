//! Path-level compression and decompression.

use crate::compressor::StreamCompressor;
use crate::decompressor::StreamDecompressor;
use crate::fs::{FileSystem, LocalFileSystem};
use crate::report::CompressionReport;
use oxipgz_core::{CompressorSettings, Result};
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Compresses and decompresses files by path.
#[derive(Debug)]
pub struct FileCompression<F = LocalFileSystem> {
    file_system: F,
    compressor: StreamCompressor,
    decompressor: StreamDecompressor,
}

impl FileCompression<LocalFileSystem> {
    /// Work on the local file system.
    pub fn new(settings: CompressorSettings) -> Self {
        Self::with_file_system(LocalFileSystem, settings)
    }
}

impl<F: FileSystem> FileCompression<F> {
    /// Work on a custom file system.
    pub fn with_file_system(file_system: F, settings: CompressorSettings) -> Self {
        Self {
            file_system,
            decompressor: StreamDecompressor::new(settings.clone()),
            compressor: StreamCompressor::new(settings),
        }
    }

    /// Compress `input` into `output`.
    ///
    /// An existing `output` left by an interrupted run is resumed.
    pub fn compress_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<CompressionReport> {
        let (input, output) = (input.as_ref(), output.as_ref());
        debug!(input = %input.display(), output = %output.display(), "compressing file");
        let reader = self.file_system.open_read(input)?;
        let writer = self.file_system.open_read_write(output)?;
        self.compressor.compress(reader, writer)
    }

    /// Decompress `input` into `output`, replacing any existing `output`.
    pub fn decompress_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<CompressionReport> {
        let (input, output) = (input.as_ref(), output.as_ref());
        debug!(input = %input.display(), output = %output.display(), "decompressing file");
        let reader = self.file_system.open_read(input)?;
        let writer = self.file_system.create(output)?;
        self.decompressor.decompress(reader, BufWriter::new(writer))
    }
}
