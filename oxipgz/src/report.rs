//! Outcome of a compression or decompression run.

/// Sizes and ratio of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionReport {
    /// Length of the input stream.
    pub input_len: u64,
    /// Length of the finished output.
    pub output_len: u64,
    /// `output_len` as a rounded percentage of `input_len`.
    pub ratio: u64,
}

impl CompressionReport {
    /// Build a report, computing the ratio.
    pub fn new(input_len: u64, output_len: u64) -> Self {
        let ratio = if input_len == 0 {
            0
        } else {
            ((output_len as u128 * 100 + input_len as u128 / 2) / input_len as u128) as u64
        };
        Self {
            input_len,
            output_len,
            ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_rounds() {
        assert_eq!(CompressionReport::new(200, 100).ratio, 50);
        assert_eq!(CompressionReport::new(3, 1).ratio, 33);
        assert_eq!(CompressionReport::new(3, 2).ratio, 67);
        assert_eq!(CompressionReport::new(100, 250).ratio, 250);
        assert_eq!(CompressionReport::new(0, 10).ratio, 0);
    }
}
