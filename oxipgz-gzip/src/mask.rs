//! Fixed-length byte pattern matching.
//!
//! A [`ByteSignature`] is a sequence of per-byte [`ByteMask`]s. Besides full
//! matches it answers "does this short tail look like the start of the
//! pattern", which is how a header cut in half by a read buffer is detected.

/// Accepted values for a single byte position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteMask {
    /// Exactly this value.
    Exact(u8),
    /// Any of the listed values.
    OneOf(&'static [u8]),
    /// Any value in `min..=max`.
    Range {
        /// Smallest accepted value.
        min: u8,
        /// Largest accepted value.
        max: u8,
    },
    /// Any value.
    Any,
}

impl ByteMask {
    /// Whether `byte` is accepted.
    #[inline]
    pub fn matches(&self, byte: u8) -> bool {
        match *self {
            Self::Exact(value) => byte == value,
            Self::OneOf(values) => values.contains(&byte),
            Self::Range { min, max } => (min..=max).contains(&byte),
            Self::Any => true,
        }
    }
}

impl From<u8> for ByteMask {
    fn from(value: u8) -> Self {
        Self::Exact(value)
    }
}

/// A fixed-length pattern of `N` byte masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSignature<const N: usize> {
    masks: [ByteMask; N],
}

impl<const N: usize> ByteSignature<N> {
    /// Create a signature from its masks.
    pub const fn new(masks: [ByteMask; N]) -> Self {
        Self { masks }
    }

    /// Pattern length.
    pub const fn len(&self) -> usize {
        N
    }

    /// Whether the pattern has no positions.
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Whether `bytes` starts with a full match.
    pub fn is_match(&self, bytes: &[u8]) -> bool {
        bytes.len() >= N && self.matches_from(bytes, 0)
    }

    /// Whether `bytes` is consistent with the start of the pattern.
    ///
    /// Inputs shorter than the pattern are compared position by position;
    /// longer inputs must contain a full match at the start.
    pub fn is_prefix(&self, bytes: &[u8]) -> bool {
        bytes
            .iter()
            .zip(self.masks.iter())
            .all(|(byte, mask)| mask.matches(*byte))
    }

    /// Offset of the first full match.
    pub fn find_first(&self, bytes: &[u8]) -> Option<usize> {
        if bytes.len() < N {
            return None;
        }
        (0..=bytes.len() - N).find(|&offset| self.matches_from(bytes, offset))
    }

    /// Offsets of every non-overlapping full match, left to right.
    pub fn find_all(&self, bytes: &[u8]) -> Vec<usize> {
        let mut found = Vec::new();
        if N == 0 {
            return found;
        }
        let mut start = 0;
        while let Some(offset) = self.find_first(&bytes[start..]) {
            found.push(start + offset);
            start += offset + N;
        }
        found
    }

    /// Offset of the longest proper tail of `bytes` that matches the start of
    /// the pattern.
    ///
    /// Only tails of 1 to `N - 1` bytes are considered: a full pattern is a
    /// match, not a partial one.
    pub fn partial_suffix_offset(&self, bytes: &[u8]) -> Option<usize> {
        let longest = bytes.len().min(N.saturating_sub(1));
        (1..=longest)
            .rev()
            .map(|size| bytes.len() - size)
            .find(|&offset| self.is_prefix(&bytes[offset..]))
    }

    fn matches_from(&self, bytes: &[u8], offset: usize) -> bool {
        bytes[offset..offset + N]
            .iter()
            .zip(self.masks.iter())
            .all(|(byte, mask)| mask.matches(*byte))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC: ByteSignature<3> = ByteSignature::new([
        ByteMask::Exact(b'a'),
        ByteMask::Range { min: b'b', max: b'c' },
        ByteMask::OneOf(b"xyz"),
    ]);

    #[test]
    fn test_byte_mask() {
        assert!(ByteMask::Exact(7).matches(7));
        assert!(!ByteMask::Exact(7).matches(8));
        assert!(ByteMask::OneOf(&[1, 3]).matches(3));
        assert!(!ByteMask::OneOf(&[1, 3]).matches(2));
        assert!(ByteMask::Range { min: 2, max: 4 }.matches(4));
        assert!(!ByteMask::Range { min: 2, max: 4 }.matches(5));
        assert!(ByteMask::Any.matches(0xFF));
        assert_eq!(ByteMask::from(9), ByteMask::Exact(9));
    }

    #[test]
    fn test_full_match() {
        assert!(ABC.is_match(b"abx"));
        assert!(ABC.is_match(b"acz..."));
        assert!(!ABC.is_match(b"ab"));
        assert!(!ABC.is_match(b"adx"));
    }

    #[test]
    fn test_prefix() {
        assert!(ABC.is_prefix(b"a"));
        assert!(ABC.is_prefix(b"ac"));
        assert!(!ABC.is_prefix(b"b"));
        assert!(ABC.is_prefix(b""));
    }

    #[test]
    fn test_find() {
        assert_eq!(ABC.find_first(b"..abx"), Some(2));
        assert_eq!(ABC.find_first(b"ab"), None);
        assert_eq!(ABC.find_all(b"abxabyqqacz"), vec![0, 3, 8]);
        assert!(ABC.find_all(b"").is_empty());
    }

    #[test]
    fn test_partial_suffix() {
        assert_eq!(ABC.partial_suffix_offset(b"qqqab"), Some(3));
        assert_eq!(ABC.partial_suffix_offset(b"qqqa"), Some(3));
        assert_eq!(ABC.partial_suffix_offset(b"qqqabx"), None);
        assert_eq!(ABC.partial_suffix_offset(b"q"), None);
        assert_eq!(ABC.partial_suffix_offset(b""), None);
    }
}
