//! Splitting by the member length stored in each header.

use super::{BlockSplitter, SplitStatus};
use crate::header::{self, HEADER_LEN};
use crate::stream::RewindableReader;
use oxipgz_core::{PgzError, Result};
use tracing::info;

/// Smallest possible member: header, empty deflate block and trailer.
const MIN_MEMBER_LEN: usize = HEADER_LEN + 2 + 8;

/// Reads members whose header carries their total length.
///
/// Each member is read together with the following header, which must be a
/// valid member header for the length to be trusted.
#[derive(Debug, Clone)]
pub struct SizeHintSplitter {
    limit: usize,
}

impl SizeHintSplitter {
    /// Trust hints up to `limit` bytes.
    pub fn new(limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(PgzError::invalid_argument(
                "block size limit must be positive",
            ));
        }
        Ok(Self { limit })
    }

    /// Hints above this are not trusted.
    pub fn limit(&self) -> usize {
        self.limit
    }

    fn usable_hint(&self, header_bytes: &[u8], position: u64) -> Option<usize> {
        let hint = header::read_size_hint(header_bytes)? as usize;
        if hint > self.limit {
            info!(
                hint,
                limit = self.limit,
                position,
                "member size hint above limit"
            );
            return None;
        }
        (hint >= MIN_MEMBER_LEN).then_some(hint)
    }
}

impl BlockSplitter for SizeHintSplitter {
    fn name(&self) -> &'static str {
        "size-hint"
    }

    fn next_status(&mut self, reader: &mut RewindableReader<'_>) -> Result<SplitStatus> {
        let position = reader.position();
        let header_bytes = reader.read_up_to(HEADER_LEN)?;
        if header_bytes.is_empty() {
            return Ok(SplitStatus::StreamIsEnd);
        }
        reader.unread(&header_bytes)?;

        if !header::is_header(&header_bytes) {
            return Ok(SplitStatus::WrongFormat);
        }
        let Some(hint) = self.usable_hint(&header_bytes, position) else {
            return Ok(SplitStatus::CantReadBlock);
        };

        let wanted = hint + HEADER_LEN;
        let mut buffer = reader.read_up_to(wanted)?;
        if buffer.len() == hint {
            // Last member of the stream.
            return Ok(SplitStatus::Block(buffer));
        }
        if buffer.len() == wanted && header::is_header(&buffer[hint..]) {
            let next_header = buffer.split_off(hint);
            reader.unread(&next_header)?;
            return Ok(SplitStatus::Block(buffer));
        }

        reader.unread(&buffer)?;
        info!(hint, position, "size hint does not end at a member boundary");
        Ok(SplitStatus::CantReadBlock)
    }
}
