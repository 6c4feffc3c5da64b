//! Opening input and output files.

use crate::io::OutputStream;
use oxipgz_core::{FileRole, PgzError, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek};
use std::path::Path;

/// Opens the files a compression run works on.
pub trait FileSystem {
    /// Readable input.
    type Input: Read + Seek + Send;
    /// Writable output.
    type Output: OutputStream + Send;

    /// Open an existing file for reading.
    fn open_read(&self, path: &Path) -> Result<Self::Input>;

    /// Open a file for reading and writing, creating it if missing.
    /// Existing content is kept.
    fn open_read_write(&self, path: &Path) -> Result<Self::Output>;

    /// Create a file for writing, discarding any existing content.
    fn create(&self, path: &Path) -> Result<Self::Output>;
}

/// The local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    type Input = File;
    type Output = File;

    fn open_read(&self, path: &Path) -> Result<File> {
        check_path(path, FileRole::Input)?;
        File::open(path).map_err(|err| PgzError::resource(FileRole::Input, path, err))
    }

    fn open_read_write(&self, path: &Path) -> Result<File> {
        check_path(path, FileRole::Output)?;
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|err| PgzError::resource(FileRole::Output, path, err))
    }

    fn create(&self, path: &Path) -> Result<File> {
        check_path(path, FileRole::Output)?;
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|err| PgzError::resource(FileRole::Output, path, err))
    }
}

fn check_path(path: &Path, role: FileRole) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(PgzError::invalid_argument(format!("{role} file path can't be empty")));
    }
    Ok(())
}
