//! Utility functions for the CLI.

use indicatif::{ProgressBar, ProgressStyle};
use oxipgz::{CompressionReport, CompressorSettings, SizeHintMode};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Create a spinner shown while a run is in progress.
pub fn create_spinner(message: String, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print the parameters a run will use.
pub fn print_settings(settings: &CompressorSettings) {
    println!("Threads:          {}", settings.threads_count());
    println!("Queue size:       {}", settings.compressing_queue_size());
    println!("Read buffer:      {}", format_size(settings.input_read_buffer_size() as u64));
    println!("Offset label:     {}", settings.offset_label());
    println!("Compression:      {}", settings.compression_level().level());
    let hint = match settings.size_hint_mode() {
        SizeHintMode::BlockLengthInHeader => "in header",
        SizeHintMode::None => "none",
    };
    println!("Size hint:        {hint}");
}

/// Format a byte count for humans.
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GiB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MiB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KiB", size as f64 / KB as f64)
    } else {
        format!("{size} B")
    }
}

/// Machine-readable outcome of a run.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    /// `compress` or `decompress`.
    pub operation: &'a str,
    /// Input path.
    pub input: &'a Path,
    /// Output path.
    pub output: &'a Path,
    /// Input length in bytes.
    pub input_bytes: u64,
    /// Output length in bytes.
    pub output_bytes: u64,
    /// Output size as a percentage of the input size.
    pub ratio_percent: u64,
    /// Wall time in milliseconds.
    pub elapsed_ms: u128,
}

impl<'a> RunSummary<'a> {
    /// Summarize a finished run.
    pub fn new(
        operation: &'a str,
        input: &'a Path,
        output: &'a Path,
        report: &CompressionReport,
        elapsed: Duration,
    ) -> Self {
        Self {
            operation,
            input,
            output,
            input_bytes: report.input_len,
            output_bytes: report.output_len,
            ratio_percent: report.ratio,
            elapsed_ms: elapsed.as_millis(),
        }
    }

    /// Print the summary for humans.
    pub fn print(&self) {
        println!(
            "{}: {} -> {} ({}%) in {:.2}s",
            self.operation,
            format_size(self.input_bytes),
            format_size(self.output_bytes),
            self.ratio_percent,
            self.elapsed_ms as f64 / 1000.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(12), "12 B");
        assert_eq!(format_size(2048), "2.00 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MiB");
    }

    #[test]
    fn test_summary_json() {
        let report = CompressionReport::new(1000, 250);
        let summary = RunSummary::new(
            "compress",
            Path::new("in.txt"),
            Path::new("in.txt.gz"),
            &report,
            Duration::from_millis(1500),
        );
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains(r#""ratio_percent":25"#));
        assert!(json.contains(r#""elapsed_ms":1500"#));
    }
}
