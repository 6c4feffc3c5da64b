//! Splitting by scanning a fixed-size buffer for member headers.

use super::{BlockSplitter, SplitStatus};
use crate::buffer::ContainerBuffer;
use crate::header::HEADER_LEN;
use crate::stream::RewindableReader;
use bytes::Bytes;
use oxipgz_core::{PgzError, Result};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Finds members bounded by two headers inside one read buffer.
///
/// A member longer than the buffer cannot be proven complete, so the
/// strategy gives up on it and leaves the bytes in the stream.
#[derive(Debug, Clone)]
pub struct BufferBoundSplitter {
    buffer_size: usize,
    ready: VecDeque<Bytes>,
}

impl BufferBoundSplitter {
    /// Scan `buffer_size` bytes per attempt.
    pub fn new(buffer_size: usize) -> Result<Self> {
        if buffer_size <= HEADER_LEN {
            return Err(PgzError::invalid_argument(format!(
                "scan buffer must exceed {HEADER_LEN} bytes, got {buffer_size}"
            )));
        }
        Ok(Self {
            buffer_size,
            ready: VecDeque::new(),
        })
    }

    /// Bytes scanned per attempt.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl BlockSplitter for BufferBoundSplitter {
    fn name(&self) -> &'static str {
        "buffer-bound"
    }

    fn next_status(&mut self, reader: &mut RewindableReader<'_>) -> Result<SplitStatus> {
        if let Some(block) = self.ready.pop_front() {
            return Ok(SplitStatus::Block(block));
        }

        let chunk = reader.read_up_to(self.buffer_size)?;
        if chunk.is_empty() {
            return Ok(SplitStatus::StreamIsEnd);
        }

        let scanned = ContainerBuffer::scan(chunk.clone());
        if !scanned.starts_with_header() {
            reader.unread(&chunk)?;
            return Ok(SplitStatus::WrongFormat);
        }

        let headers = scanned.headers();
        let mut at_end = chunk.len() < self.buffer_size;
        if !at_end && headers.len() == 1 {
            at_end = reader.is_at_end()?;
        }
        if !at_end && !scanned.contains_whole_member() {
            reader.unread(&chunk)?;
            info!(
                buffer_size = self.buffer_size,
                position = reader.position(),
                "buffer too small to prove a member boundary"
            );
            return Ok(SplitStatus::CantReadBlock);
        }

        let complete = if at_end {
            headers.len()
        } else {
            headers.len() - 1
        };
        for (i, &start) in headers.iter().take(complete).enumerate() {
            let end = headers.get(i + 1).copied().unwrap_or(chunk.len());
            self.ready.push_back(chunk.slice(start..end));
        }
        if !at_end {
            let tail_start = headers[headers.len() - 1];
            reader.unread(&chunk[tail_start..])?;
        }
        debug!(members = complete, at_end, "buffer split");

        match self.ready.pop_front() {
            Some(block) => Ok(SplitStatus::Block(block)),
            None => Ok(SplitStatus::StreamIsEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: [u8; HEADER_LEN] = [0x1F, 0x8B, 8, 0, 0, 0, 0, 0, 0, 3];

    fn member(payload_len: usize) -> Vec<u8> {
        let mut bytes = HEADER.to_vec();
        bytes.resize(HEADER_LEN + payload_len, 0x5A);
        bytes
    }

    fn drain(splitter: &mut BufferBoundSplitter, reader: &mut RewindableReader<'_>) -> Vec<SplitStatus> {
        let mut statuses = Vec::new();
        loop {
            let status = splitter.next_status(reader).unwrap();
            let done = !matches!(status, SplitStatus::Block(_));
            statuses.push(status);
            if done {
                return statuses;
            }
        }
    }

    #[test]
    fn test_buffer_too_small_leaves_stream_untouched() {
        let mut stream = member(40);
        stream.extend(member(5));
        let mut reader = RewindableReader::new(Cursor::new(stream));
        let mut splitter = BufferBoundSplitter::new(20).unwrap();

        assert_eq!(
            splitter.next_status(&mut reader).unwrap(),
            SplitStatus::CantReadBlock
        );
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_splits_members_across_buffers() {
        let parts = [member(12), member(3), member(20), member(7)];
        let stream: Vec<u8> = parts.concat();
        let mut reader = RewindableReader::new(Cursor::new(stream));
        let mut splitter = BufferBoundSplitter::new(40).unwrap();

        let statuses = drain(&mut splitter, &mut reader);
        let mut expected: Vec<_> = parts
            .iter()
            .map(|p| SplitStatus::Block(Bytes::from(p.clone())))
            .collect();
        expected.push(SplitStatus::StreamIsEnd);
        assert_eq!(statuses, expected);
    }

    #[test]
    fn test_single_member_in_exact_buffer() {
        let stream = member(22);
        let mut reader = RewindableReader::new(Cursor::new(stream.clone()));
        let mut splitter = BufferBoundSplitter::new(stream.len()).unwrap();

        assert_eq!(
            drain(&mut splitter, &mut reader),
            vec![SplitStatus::Block(stream.into()), SplitStatus::StreamIsEnd]
        );
    }

    #[test]
    fn test_garbage_is_wrong_format() {
        let mut stream = b"junk".to_vec();
        stream.extend(member(10));
        let mut reader = RewindableReader::new(Cursor::new(stream));
        let mut splitter = BufferBoundSplitter::new(64).unwrap();
        assert_eq!(
            splitter.next_status(&mut reader).unwrap(),
            SplitStatus::WrongFormat
        );
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_small_buffer_rejected() {
        assert!(BufferBoundSplitter::new(HEADER_LEN).is_err());
    }
}
