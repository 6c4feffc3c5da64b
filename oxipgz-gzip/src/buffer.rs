//! Scanned view of a byte range holding gzip members.

use crate::header::{HEADER_LEN, MEMBER_SIGNATURE};
use bytes::{Bytes, BytesMut};

/// A byte range together with the member headers found in it.
///
/// Positions are relative to the start of the view. Every transformation
/// returns a new buffer; the underlying bytes are shared, not copied, unless
/// [`to_owned_copy`](Self::to_owned_copy) is asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerBuffer {
    bytes: Bytes,
    headers: Vec<usize>,
    partial_header: Option<usize>,
}

impl ContainerBuffer {
    /// Scan `bytes` for member headers and a trailing partial header.
    pub fn scan(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let headers = MEMBER_SIGNATURE.find_all(&bytes);

        let tail_start = headers.last().map_or(0, |&last| last + HEADER_LEN);
        let partial_header = MEMBER_SIGNATURE
            .partial_suffix_offset(&bytes[tail_start..])
            .map(|offset| tail_start + offset);

        Self {
            bytes,
            headers,
            partial_header,
        }
    }

    /// An empty buffer.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The viewed bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Offsets of the confirmed headers.
    pub fn headers(&self) -> &[usize] {
        &self.headers
    }

    /// Offset of a trailing run of bytes that may be the start of a header.
    pub fn partial_header(&self) -> Option<usize> {
        self.partial_header
    }

    /// Number of bytes in the view.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether a confirmed header sits at offset 0.
    pub fn starts_with_header(&self) -> bool {
        self.headers.first() == Some(&0)
    }

    /// Whether at least one member is bounded by two headers.
    pub fn contains_whole_member(&self) -> bool {
        self.headers.len() > 1
    }

    /// Whether nothing header-like was found.
    pub fn no_headers_or_parts(&self) -> bool {
        self.headers.is_empty() && self.partial_header.is_none()
    }

    /// Whether the whole view is a possible partial header.
    pub fn contains_only_part(&self) -> bool {
        !self.is_empty() && self.partial_header == Some(0)
    }

    /// The trailing possible partial header, or an empty slice.
    pub fn possible_part(&self) -> Bytes {
        self.partial_header
            .map(|offset| self.bytes.slice(offset..))
            .unwrap_or_default()
    }

    /// Split off the first block.
    ///
    /// A header at offset 0 means the view starts at a member, so the block
    /// runs to the second header. Otherwise it runs to the first header. With
    /// no header to stop at, the block runs to the partial header or to the
    /// end of the view.
    pub fn cut_first_block(&self) -> (Bytes, ContainerBuffer) {
        let end = match self.headers.as_slice() {
            [0, second, ..] => Some(*second),
            [0] | [] => None,
            [first, ..] => Some(*first),
        };

        let Some(end) = end else {
            let end = self.partial_header.unwrap_or(self.bytes.len());
            let rest = ContainerBuffer {
                bytes: self.bytes.slice(end..),
                headers: Vec::new(),
                partial_header: self.partial_header.map(|_| 0),
            };
            return (self.bytes.slice(..end), rest);
        };

        let rest = ContainerBuffer {
            bytes: self.bytes.slice(end..),
            headers: self
                .headers
                .iter()
                .filter(|&&offset| offset >= end)
                .map(|offset| offset - end)
                .collect(),
            partial_header: self.partial_header.map(|offset| offset - end),
        };
        (self.bytes.slice(..end), rest)
    }

    /// Copy the bytes out of any shared storage, keeping the positions.
    pub fn to_owned_copy(&self) -> ContainerBuffer {
        ContainerBuffer {
            bytes: Bytes::copy_from_slice(&self.bytes),
            headers: self.headers.clone(),
            partial_header: self.partial_header,
        }
    }

    /// Put previously cut bytes back in front of this view and rescan.
    pub fn reattach_prefix(&self, prefix: &[u8]) -> ContainerBuffer {
        if prefix.is_empty() {
            return self.clone();
        }
        let mut joined = BytesMut::with_capacity(prefix.len() + self.bytes.len());
        joined.extend_from_slice(prefix);
        joined.extend_from_slice(&self.bytes);
        ContainerBuffer::scan(joined.freeze())
    }
}
