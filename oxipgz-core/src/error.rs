//! Error types for OxiPgz operations.
//!
//! This module provides a single error type covering every failure the
//! parallel compressor can report: malformed gzip input, unavailable files,
//! empty inputs, damaged resumable output and pipeline shutdown conditions.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which side of an operation a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    /// The file being read.
    Input,
    /// The file being written.
    Output,
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Why a file could not be opened or accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// The file does not exist.
    NotFound,
    /// A parent directory does not exist.
    DirectoryNotFound,
    /// The process is not allowed to access the file.
    PermissionDenied,
    /// The path contains characters or a format the platform rejects.
    InvalidPath,
    /// The path exceeds platform limits.
    PathTooLong,
    /// Any other failure reported by the file system.
    Other,
}

impl ResourceKind {
    /// Classify an I/O error produced while opening `path`.
    pub fn classify(err: &io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
                    Self::DirectoryNotFound
                }
                _ => Self::NotFound,
            },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::InvalidInput => Self::InvalidPath,
            io::ErrorKind::NotADirectory => Self::DirectoryNotFound,
            _ if err.raw_os_error() == Some(ENAMETOOLONG) => Self::PathTooLong,
            _ => Self::Other,
        }
    }
}

#[cfg(windows)]
const ENAMETOOLONG: i32 = 206;
#[cfg(not(windows))]
const ENAMETOOLONG: i32 = 36;

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotFound => "file not found",
            Self::DirectoryNotFound => "directory not found",
            Self::PermissionDenied => "permission denied",
            Self::InvalidPath => "invalid path",
            Self::PathTooLong => "path too long",
            Self::Other => "unavailable",
        };
        f.write_str(text)
    }
}

/// How a resumable output file turned out to be damaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionKind {
    /// The trailing offset marker is missing: the file is foreign or was
    /// already committed.
    WrongFormatOrCommitted,
    /// The file became shorter while its trailer was being read.
    UnexpectedlyReduced,
}

impl fmt::Display for CorruptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongFormatOrCommitted => f.write_str("wrong format or already committed"),
            Self::UnexpectedlyReduced => f.write_str("unexpectedly reduced"),
        }
    }
}

/// The main error type for OxiPgz operations.
#[derive(Debug, Error)]
pub enum PgzError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The compressed stream is not aligned to gzip member headers.
    #[error("Invalid gzip format: {message}")]
    Format {
        /// Description of the format error.
        message: String,
    },

    /// A file could not be opened or accessed.
    #[error("Cannot access {role} file {}: {kind}", path.display())]
    ResourceUnavailable {
        /// Whether the file is the input or the output.
        role: FileRole,
        /// The path that failed.
        path: PathBuf,
        /// Classified reason.
        kind: ResourceKind,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The input stream is already at its end.
    #[error("Nothing to compress")]
    NothingToCompress,

    /// The compressed stream is empty.
    #[error("Nothing to decompress")]
    NothingToDecompress,

    /// The resumable output file is damaged.
    #[error("Output file has {kind}")]
    OutputCorrupted {
        /// What is wrong with the output.
        kind: CorruptionKind,
    },

    /// A queue, collector or pool was used after shutdown.
    #[error("{what} is closed")]
    QueueClosed {
        /// Which structure rejected the operation.
        what: &'static str,
    },

    /// A task panicked inside a worker thread.
    #[error("Task '{task}' panicked: {message}")]
    TaskPanicked {
        /// Task identifier.
        task: String,
        /// Panic payload rendered as text.
        message: String,
    },

    /// A queued task was discarded before it ran.
    #[error("Task '{task}' was cancelled before it ran")]
    TaskCancelled {
        /// Task identifier.
        task: String,
    },

    /// Invalid configuration or argument.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },
}

/// Result type alias for OxiPgz operations.
pub type Result<T> = std::result::Result<T, PgzError>;

impl PgzError {
    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a resource error for `path`, classifying `source`.
    pub fn resource(role: FileRole, path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        let kind = ResourceKind::classify(&source, &path);
        Self::ResourceUnavailable {
            role,
            path,
            kind,
            source,
        }
    }

    /// Create an output corruption error.
    pub fn output_corrupted(kind: CorruptionKind) -> Self {
        Self::OutputCorrupted { kind }
    }

    /// Create a closed-queue error.
    pub fn queue_closed(what: &'static str) -> Self {
        Self::QueueClosed { what }
    }

    /// Create a task panic error.
    pub fn task_panicked(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TaskPanicked {
            task: task.into(),
            message: message.into(),
        }
    }

    /// Create a task cancellation error.
    pub fn task_cancelled(task: impl Into<String>) -> Self {
        Self::TaskCancelled { task: task.into() }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Whether the error means there was no input to process.
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::NothingToCompress | Self::NothingToDecompress)
    }
}
