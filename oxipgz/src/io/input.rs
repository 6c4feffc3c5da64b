//! Fixed-size block reading from a seekable input.

use bytes::Bytes;
use oxipgz_core::{Block, PgzError, Result};
use std::io::{self, Read, Seek, SeekFrom};

/// A seekable input read in fixed-size blocks.
#[derive(Debug)]
pub struct InputFile<R> {
    inner: R,
}

impl<R: Read + Seek> InputFile<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Total length of the input in bytes. Leaves the position unchanged.
    pub fn total_len(&mut self) -> Result<u64> {
        let position = self.inner.stream_position()?;
        let len = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(len)
    }

    /// Whether the current position is at or past the end of the input.
    pub fn is_at_end(&mut self) -> Result<bool> {
        let position = self.inner.stream_position()?;
        Ok(position >= self.total_len()?)
    }

    /// Read blocks of `buffer_size` bytes starting at `offset`.
    ///
    /// Every block except the last is exactly `buffer_size` bytes long, so
    /// two runs starting at the same offset produce the same blocks.
    pub fn read_blocks(&mut self, buffer_size: usize, offset: u64) -> Result<ReadBlocks<'_, R>> {
        if buffer_size == 0 {
            return Err(PgzError::invalid_argument("read buffer can't be empty"));
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(ReadBlocks {
            input: &mut self.inner,
            buffer_size,
            offset,
            done: false,
        })
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Iterator over the blocks of an [`InputFile`].
#[derive(Debug)]
pub struct ReadBlocks<'a, R> {
    input: &'a mut R,
    buffer_size: usize,
    offset: u64,
    done: bool,
}

impl<R: Read> ReadBlocks<'_, R> {
    fn fill(&mut self) -> io::Result<Vec<u8>> {
        let mut buffer = vec![0u8; self.buffer_size];
        let mut filled = 0;
        while filled < buffer.len() {
            match self.input.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        buffer.truncate(filled);
        Ok(buffer)
    }
}

impl<R: Read> Iterator for ReadBlocks<'_, R> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let bytes = match self.fill() {
            Ok(bytes) if bytes.is_empty() => {
                self.done = true;
                return None;
            }
            Ok(bytes) => bytes,
            Err(err) => {
                self.done = true;
                return Some(Err(err.into()));
            }
        };

        if bytes.len() < self.buffer_size {
            self.done = true;
        }
        self.offset += bytes.len() as u64;
        Some(Block::new(Bytes::from(bytes), self.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_blocks_carry_end_offsets() {
        let mut input = InputFile::new(Cursor::new((0u8..25).collect::<Vec<_>>()));
        let blocks: Vec<Block> = input
            .read_blocks(10, 0)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        let offsets: Vec<u64> = blocks.iter().map(Block::offset).collect();
        assert_eq!(offsets, vec![10, 20, 25]);
        assert_eq!(blocks[2].bytes().as_ref(), &[20, 21, 22, 23, 24]);
    }

    #[test]
    fn test_read_from_offset() {
        let mut input = InputFile::new(Cursor::new(vec![7u8; 30]));
        let blocks: Vec<Block> = input
            .read_blocks(16, 20)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].len(), 10);
        assert_eq!(blocks[0].offset(), 30);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let mut input = InputFile::new(Cursor::new(vec![1u8; 32]));
        let count = input.read_blocks(16, 0).unwrap().count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_length_and_end() {
        let mut input = InputFile::new(Cursor::new(vec![0u8; 5]));
        assert_eq!(input.total_len().unwrap(), 5);
        assert!(!input.is_at_end().unwrap());
        assert_eq!(input.read_blocks(8, 5).unwrap().count(), 0);
        assert!(input.is_at_end().unwrap());
    }
}
