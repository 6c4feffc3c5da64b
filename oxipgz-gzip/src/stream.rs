//! Readers used while splitting a compressed stream.

use crate::buffer::ContainerBuffer;
use crate::header::HEADER_LEN;
use bytes::{Bytes, BytesMut};
use oxipgz_core::{PgzError, Result};
use std::io::{self, Read};

/// Size of the chunk read by [`RewindableReader::is_at_end`].
const PEEK_CHUNK: usize = 8 * 1024;

/// A read-only stream that can take back bytes it already returned.
///
/// Pushed-back bytes are served again before anything else is read from the
/// underlying source. The reported position moves back accordingly.
pub struct RewindableReader<'a> {
    inner: Box<dyn Read + Send + 'a>,
    pending: Bytes,
    position: u64,
}

impl<'a> RewindableReader<'a> {
    /// Wrap `inner`, starting at position 0.
    pub fn new(inner: impl Read + Send + 'a) -> Self {
        Self::with_position(inner, 0)
    }

    /// Wrap `inner`, which is already at `position`.
    pub fn with_position(inner: impl Read + Send + 'a, position: u64) -> Self {
        Self {
            inner: Box::new(inner),
            pending: Bytes::new(),
            position,
        }
    }

    /// Bytes returned so far, minus bytes pushed back.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes pushed back and not read again yet.
    pub fn pending(&self) -> &Bytes {
        &self.pending
    }

    /// Read until `len` bytes are collected or the source ends.
    ///
    /// A shorter result means the source is exhausted.
    pub fn read_up_to(&mut self, len: usize) -> io::Result<Bytes> {
        if len <= self.pending.len() {
            self.position += len as u64;
            return Ok(self.pending.split_to(len));
        }

        let mut collected = BytesMut::with_capacity(len);
        let mut filled = self.pending.len();
        collected.extend_from_slice(&self.pending);
        self.pending = Bytes::new();

        collected.resize(len, 0);
        while filled < len {
            match self.inner.read(&mut collected[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        collected.truncate(filled);
        self.position += filled as u64;
        Ok(collected.freeze())
    }

    /// Push back the tail of what was just read.
    ///
    /// The bytes go in front of any bytes still pending, so they are read
    /// again in their original order.
    pub fn unread(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let len = bytes.len() as u64;
        if len > self.position {
            return Err(PgzError::invalid_argument(format!(
                "cannot push back {len} bytes at position {}",
                self.position
            )));
        }

        let mut joined = BytesMut::with_capacity(bytes.len() + self.pending.len());
        joined.extend_from_slice(bytes);
        joined.extend_from_slice(&self.pending);
        self.pending = joined.freeze();
        self.position -= len;
        Ok(())
    }

    /// Whether nothing is left to read.
    ///
    /// Peeked bytes are kept and returned by the next read.
    pub fn is_at_end(&mut self) -> io::Result<bool> {
        if !self.pending.is_empty() {
            return Ok(false);
        }
        let mut chunk = vec![0u8; PEEK_CHUNK];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => return Ok(true),
                Ok(n) => {
                    chunk.truncate(n);
                    self.pending = Bytes::from(chunk);
                    return Ok(false);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl Read for RewindableReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.pending.is_empty() {
            let n = buf.len().min(self.pending.len());
            buf[..n].copy_from_slice(&self.pending.split_to(n));
            self.position += n as u64;
            return Ok(n);
        }
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl std::fmt::Debug for RewindableReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewindableReader")
            .field("position", &self.position)
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// A reader that never returns, in a single `read`, bytes from both sides of
/// a member header.
///
/// A buffering decoder placed on top of it therefore never pulls bytes of the
/// next member into the current one's read.
#[derive(Debug)]
pub struct MemberAlignedReader<'a> {
    source: RewindableReader<'a>,
    pending: ContainerBuffer,
    source_ended: bool,
}

impl<'a> MemberAlignedReader<'a> {
    /// Wrap a rewindable reader.
    pub fn new(source: RewindableReader<'a>) -> Self {
        Self {
            source,
            pending: ContainerBuffer::empty(),
            source_ended: false,
        }
    }

    /// Whether the source and the pending bytes are exhausted.
    pub fn is_at_end(&self) -> bool {
        self.source_ended && self.pending.is_empty()
    }

    /// Return the wrapped reader. Pending bytes are pushed back into it.
    pub fn into_inner(mut self) -> Result<RewindableReader<'a>> {
        let pending = std::mem::take(&mut self.pending);
        self.source.unread(pending.bytes())?;
        Ok(self.source)
    }
}

impl Read for MemberAlignedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.pending.is_empty() {
            if self.source_ended {
                return Ok(0);
            }
            let wanted = buf.len().max(HEADER_LEN);
            let chunk = self.source.read_up_to(wanted)?;
            if chunk.len() < wanted {
                self.source_ended = true;
            }
            if chunk.is_empty() {
                return Ok(0);
            }

            let scanned = ContainerBuffer::scan(chunk);
            self.pending = if scanned.no_headers_or_parts() {
                scanned
            } else {
                // Cut positions outlive this read; detach from the source's storage.
                scanned.to_owned_copy()
            };
        }

        let (mut block, mut rest) = self.pending.cut_first_block();
        if block.is_empty() {
            // Only a possible partial header is left.
            block = rest.possible_part();
            rest = ContainerBuffer::empty();
        }
        if block.len() > buf.len() {
            let extra = block.split_off(buf.len());
            rest = rest.reattach_prefix(&extra);
        }

        buf[..block.len()].copy_from_slice(&block);
        self.pending = rest;
        Ok(block.len())
    }
}
