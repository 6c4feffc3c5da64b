//! OxiPgz CLI - parallel gzip compression with resumable output.

mod utils;

use clap::{Args, Parser, Subcommand};
use oxipgz::{
    CompressionLevel, CompressorSettings, CompressorSettingsBuilder, FileCompression,
    SizeHintMode,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use utils::{RunSummary, create_spinner, print_settings};

#[derive(Parser)]
#[command(name = "oxipgz")]
#[command(author, version, about = "Parallel block-oriented gzip compressor")]
#[command(long_about = "
OxiPgz compresses files into multi-member gzip streams on all CPUs and
decompresses them in parallel. Output from any gzip encoder can be
decompressed. An interrupted compression resumes where it stopped when run
again with the same input and output.

Examples:
  oxipgz compress data.bin data.bin.gz
  oxipgz compress --threads-per-cpu 2 --read-buffer 1048576 data.bin data.bin.gz
  oxipgz decompress data.bin.gz data.bin
  oxipgz decompress --json archive.gz archive.tar
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a multi-member gzip stream
    #[command(alias = "c")]
    Compress {
        /// File to compress
        input: PathBuf,

        /// Compressed output (resumed if left by an interrupted run)
        output: PathBuf,

        /// Compression level (0-9)
        #[arg(short, long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(0..=9))]
        level: u8,

        /// Do not store member lengths in gzip headers
        #[arg(long)]
        no_size_hint: bool,

        #[command(flatten)]
        options: CommonOptions,
    },

    /// Decompress a gzip stream
    #[command(alias = "d")]
    Decompress {
        /// Gzip file to decompress
        input: PathBuf,

        /// Decompressed output (replaced if it exists)
        output: PathBuf,

        #[command(flatten)]
        options: CommonOptions,
    },
}

#[derive(Args)]
struct CommonOptions {
    /// Worker threads per logical CPU
    #[arg(short = 't', long, default_value_t = 1)]
    threads_per_cpu: usize,

    /// Bytes read per block
    #[arg(short = 'b', long)]
    read_buffer: Option<usize>,

    /// Blocks in flight at once (default: threads minus two, at least one)
    #[arg(short = 'q', long)]
    queue_size: Option<usize>,

    /// Label of the progress trailer in unfinished output
    #[arg(long)]
    offset_label: Option<String>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output the summary as JSON (machine-readable)
    #[arg(short, long)]
    json: bool,

    /// Show a spinner while running
    #[arg(short = 'P', long)]
    progress: bool,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            level,
            no_size_hint,
            options,
        } => cmd_compress(&input, &output, level, no_size_hint, &options),
        Commands::Decompress {
            input,
            output,
            options,
        } => cmd_decompress(&input, &output, &options),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(verbose)
        .finish();

    // Only fails if a subscriber is already installed.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn build_settings(
    options: &CommonOptions,
    level: CompressionLevel,
    hint: SizeHintMode,
) -> Result<CompressorSettings, Box<dyn std::error::Error>> {
    let mut builder = CompressorSettingsBuilder::new()
        .parallelism_by_threads_per_cpu(options.threads_per_cpu, options.queue_size)?
        .compression_level(level)
        .size_hint_mode(hint);

    builder = match options.read_buffer {
        Some(size) => builder.input_read_buffer_size(size)?,
        None => builder.default_input_read_buffer_size(),
    };
    builder = match &options.offset_label {
        Some(label) => builder.offset_label(label.clone())?,
        None => builder.default_offset_label(),
    };

    Ok(builder.build()?)
}

fn cmd_compress(
    input: &Path,
    output: &Path,
    level: u8,
    no_size_hint: bool,
    options: &CommonOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(options.verbose);
    let hint = if no_size_hint {
        SizeHintMode::None
    } else {
        SizeHintMode::BlockLengthInHeader
    };
    let settings = build_settings(options, CompressionLevel::new(level), hint)?;
    run("compress", input, output, settings, options, |files| {
        files.compress_file(input, output)
    })
}

fn cmd_decompress(
    input: &Path,
    output: &Path,
    options: &CommonOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(options.verbose);
    let settings = build_settings(options, CompressionLevel::DEFAULT, SizeHintMode::default())?;
    run("decompress", input, output, settings, options, |files| {
        files.decompress_file(input, output)
    })
}

fn run(
    operation: &str,
    input: &Path,
    output: &Path,
    settings: CompressorSettings,
    options: &CommonOptions,
    work: impl FnOnce(&FileCompression) -> oxipgz::Result<oxipgz::CompressionReport>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !options.json {
        println!("{} {} -> {}", operation, input.display(), output.display());
        if options.verbose {
            print_settings(&settings);
        }
    }

    let files = FileCompression::new(settings);
    let spinner = create_spinner(format!("{operation}ing..."), options.progress && !options.json);
    let started = Instant::now();
    let outcome = work(&files);
    spinner.finish_and_clear();

    let report = outcome?;
    let summary = RunSummary::new(operation, input, output, &report, started.elapsed());
    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.print();
    }
    Ok(())
}
