//! Resumable compressed output.
//!
//! While a compression run is in progress the output file ends with a
//! trailer: the offset label followed by the consumed input offset as a
//! little-endian `i64`. Each append rewrites the trailer in place, and
//! [`OutputFile::commit`] cuts it off, leaving a plain gzip stream.
//!
//! ```text
//! [member][member]...[member][label][offset: i64 LE]
//! ```

use oxipgz_core::{CorruptionKind, PgzError, Result};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use tracing::debug;

const OFFSET_LEN: usize = 8;

/// A readable, writable, seekable stream that can also be truncated.
pub trait OutputStream: Read + Write + Seek {
    /// Truncate or extend the stream to `len` bytes.
    fn set_len(&mut self, len: u64) -> io::Result<()>;
}

impl OutputStream for File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

impl OutputStream for Cursor<Vec<u8>> {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length overflows memory"))?;
        self.get_mut().resize(len, 0);
        Ok(())
    }
}

impl<T: OutputStream + ?Sized> OutputStream for &mut T {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        (**self).set_len(len)
    }
}

/// Output that remembers how much input it already reflects.
#[derive(Debug)]
pub struct OutputFile<W> {
    stream: W,
    label: Vec<u8>,
    trailer: Vec<u8>,
}

impl<W: OutputStream> OutputFile<W> {
    /// Wrap `stream`, marking progress with `label`.
    pub fn new(stream: W, label: &str) -> Result<Self> {
        if label.trim().is_empty() {
            return Err(PgzError::invalid_argument(
                "trailing offset label can't be empty or whitespace",
            ));
        }
        if !label.is_ascii() {
            return Err(PgzError::invalid_argument("trailing offset label must be ASCII"));
        }
        let label = label.as_bytes().to_vec();
        let trailer = vec![0u8; label.len() + OFFSET_LEN];
        Ok(Self {
            stream,
            label,
            trailer,
        })
    }

    /// Length of the trailer in bytes.
    pub fn trailer_len(&self) -> usize {
        self.trailer.len()
    }

    /// Current length of the underlying stream, trailer included.
    pub fn stream_len(&mut self) -> Result<u64> {
        Ok(self.stream.seek(SeekFrom::End(0))?)
    }

    /// Append `bytes` and record that the input has been consumed up to
    /// `offset`.
    ///
    /// A non-empty stream must already end with a trailer, which is
    /// overwritten.
    pub fn append(&mut self, bytes: &[u8], offset: u64) -> Result<()> {
        let offset = i64::try_from(offset)
            .map_err(|_| PgzError::invalid_argument(format!("offset {offset} is too large")))?;

        if self.stream_len()? > 0 {
            self.read_trailer()?;
            self.stream
                .seek(SeekFrom::End(-(self.trailer.len() as i64)))?;
        }

        if !bytes.is_empty() {
            self.stream.write_all(bytes)?;
        }
        self.stream.write_all(&self.label)?;
        self.stream.write_all(&offset.to_le_bytes())?;
        self.stream.flush()?;
        Ok(())
    }

    /// Input offset reflected by the output, or 0 for an empty stream.
    pub fn last_offset(&mut self) -> Result<u64> {
        if self.stream_len()? == 0 {
            return Ok(0);
        }
        self.read_trailer()
    }

    /// Remove the trailer. Returns the final length of the output.
    ///
    /// Fails when the stream has no trailer: it is foreign, empty or already
    /// committed.
    pub fn commit(&mut self) -> Result<u64> {
        let len = self.stream_len()?;
        self.read_trailer()?;
        let committed = len - self.trailer.len() as u64;
        self.stream.set_len(committed)?;
        self.stream.seek(SeekFrom::Start(committed))?;
        self.stream.flush()?;
        debug!(len = committed, "output committed");
        Ok(committed)
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> W {
        self.stream
    }

    fn read_trailer(&mut self) -> Result<u64> {
        let len = self.stream_len()?;
        if len < self.trailer.len() as u64 {
            return Err(PgzError::output_corrupted(
                CorruptionKind::WrongFormatOrCommitted,
            ));
        }

        self.stream
            .seek(SeekFrom::End(-(self.trailer.len() as i64)))?;
        if let Err(err) = self.stream.read_exact(&mut self.trailer) {
            return Err(match err.kind() {
                io::ErrorKind::UnexpectedEof => {
                    PgzError::output_corrupted(CorruptionKind::UnexpectedlyReduced)
                }
                _ => err.into(),
            });
        }

        let (label, offset) = self.trailer.split_at(self.label.len());
        if label != self.label.as_slice() {
            return Err(PgzError::output_corrupted(
                CorruptionKind::WrongFormatOrCommitted,
            ));
        }
        let mut raw = [0u8; OFFSET_LEN];
        raw.copy_from_slice(offset);
        u64::try_from(i64::from_le_bytes(raw))
            .map_err(|_| PgzError::output_corrupted(CorruptionKind::WrongFormatOrCommitted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABEL: &str = "========";

    fn trailer(offset: i64) -> Vec<u8> {
        let mut bytes = LABEL.as_bytes().to_vec();
        bytes.extend_from_slice(&offset.to_le_bytes());
        bytes
    }

    #[test]
    fn test_empty_output_has_offset_zero() {
        let mut output = OutputFile::new(Cursor::new(Vec::new()), LABEL).unwrap();
        assert_eq!(output.last_offset().unwrap(), 0);
    }

    #[test]
    fn test_append_rewrites_trailer() {
        let mut output = OutputFile::new(Cursor::new(Vec::new()), LABEL).unwrap();
        output.append(b"abc", 100).unwrap();
        output.append(b"de", 250).unwrap();
        assert_eq!(output.last_offset().unwrap(), 250);

        let mut expected = b"abcde".to_vec();
        expected.extend(trailer(250));
        assert_eq!(output.into_inner().into_inner(), expected);
    }

    #[test]
    fn test_commit_strips_trailer() {
        let mut output = OutputFile::new(Cursor::new(Vec::new()), LABEL).unwrap();
        output.append(b"payload", 7).unwrap();
        assert_eq!(output.commit().unwrap(), 7);
        assert_eq!(output.into_inner().into_inner(), b"payload");
    }

    #[test]
    fn test_committed_output_rejected() {
        let mut output = OutputFile::new(Cursor::new(b"plain gzip bytes".to_vec()), LABEL).unwrap();
        for err in [
            output.last_offset().unwrap_err(),
            output.append(b"x", 1).unwrap_err(),
            output.commit().unwrap_err(),
        ] {
            assert!(matches!(
                err,
                PgzError::OutputCorrupted {
                    kind: CorruptionKind::WrongFormatOrCommitted
                }
            ));
        }
    }

    #[test]
    fn test_short_output_rejected() {
        let mut output = OutputFile::new(Cursor::new(b"abc".to_vec()), LABEL).unwrap();
        assert!(matches!(
            output.commit(),
            Err(PgzError::OutputCorrupted {
                kind: CorruptionKind::WrongFormatOrCommitted
            })
        ));
    }

    #[test]
    fn test_resume_from_existing_trailer() {
        let mut existing = b"first".to_vec();
        existing.extend(trailer(42));
        let mut output = OutputFile::new(Cursor::new(existing), LABEL).unwrap();
        assert_eq!(output.last_offset().unwrap(), 42);

        output.append(b"second", 84).unwrap();
        output.commit().unwrap();
        assert_eq!(output.into_inner().into_inner(), b"firstsecond");
    }

    #[test]
    fn test_invalid_labels() {
        assert!(OutputFile::new(Cursor::new(Vec::new()), "  ").is_err());
        assert!(OutputFile::new(Cursor::new(Vec::new()), "знак").is_err());
    }
}
