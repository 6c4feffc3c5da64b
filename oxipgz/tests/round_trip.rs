//! Compress-then-decompress across settings.

use flate2::Compression;
use flate2::GzBuilder;
use oxipgz::{
    CompressionLevel, CompressorSettings, PgzError, SizeHintMode, StreamCompressor,
    StreamDecompressor,
};
use std::io::{Cursor, Write};

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.next() as u8).collect()
    }
}

fn text(len: usize) -> Vec<u8> {
    let words = ["block", "member", "header", "offset", "parallel", "gzip", "stream"];
    let mut rng = XorShift(0x5EED);
    let mut out = Vec::with_capacity(len + 16);
    while out.len() < len {
        out.extend_from_slice(words[(rng.next() % words.len() as u64) as usize].as_bytes());
        out.push(if rng.next() % 9 == 0 { b'\n' } else { b' ' });
    }
    out.truncate(len);
    out
}

fn settings(buffer: usize, threads: usize, queue: usize, mode: SizeHintMode) -> CompressorSettings {
    CompressorSettings::new(buffer, threads, queue, "========")
        .unwrap()
        .with_size_hint_mode(mode)
}

fn round_trip(data: &[u8], settings: &CompressorSettings) -> Vec<u8> {
    let mut packed = Cursor::new(Vec::new());
    StreamCompressor::new(settings.clone())
        .compress(Cursor::new(data.to_vec()), &mut packed)
        .unwrap();

    let mut unpacked = Vec::new();
    StreamDecompressor::new(settings.clone())
        .decompress(Cursor::new(packed.into_inner()), &mut unpacked)
        .unwrap();
    unpacked
}

#[test]
fn test_round_trip_text() {
    let data = text(60_000);
    for mode in [SizeHintMode::BlockLengthInHeader, SizeHintMode::None] {
        for buffer in [11, 700, 4096, 100_000] {
            for (threads, queue) in [(1, 1), (4, 3)] {
                let settings = settings(buffer, threads, queue, mode);
                assert!(
                    round_trip(&data, &settings) == data,
                    "mode {mode:?}, buffer {buffer}, threads {threads}"
                );
            }
        }
    }
}

#[test]
fn test_round_trip_noise() {
    let data = XorShift(0xC0FFEE).bytes(12_000);
    for mode in [SizeHintMode::BlockLengthInHeader, SizeHintMode::None] {
        for buffer in [64, 5_000] {
            let settings = settings(buffer, 3, 2, mode);
            assert!(
                round_trip(&data, &settings) == data,
                "mode {mode:?}, buffer {buffer}"
            );
        }
    }
}

#[test]
fn test_round_trip_small_inputs() {
    for len in [1, 10, 11, 12, 255] {
        let data = text(len);
        let settings = settings(11, 2, 2, SizeHintMode::BlockLengthInHeader);
        assert_eq!(round_trip(&data, &settings), data, "len {len}");
    }
}

#[test]
fn test_round_trip_levels() {
    let data = text(20_000);
    for level in [0, 1, 9] {
        let settings = settings(3_000, 2, 2, SizeHintMode::BlockLengthInHeader)
            .with_compression_level(CompressionLevel::new(level));
        assert_eq!(round_trip(&data, &settings), data, "level {level}");
    }
}

#[test]
fn test_hinted_members_are_one_per_block() {
    let data = text(10_000);
    let settings = settings(1_000, 2, 2, SizeHintMode::BlockLengthInHeader);
    let mut packed = Cursor::new(Vec::new());
    StreamCompressor::new(settings)
        .compress(Cursor::new(data), &mut packed)
        .unwrap();

    let packed = packed.into_inner();
    let mut members = 0;
    let mut at = 0;
    while at < packed.len() {
        let hint = u32::from_le_bytes([
            packed[at + 4],
            packed[at + 5],
            packed[at + 6],
            packed[at + 7],
        ]) as usize;
        assert_eq!(&packed[at..at + 3], &[0x1F, 0x8B, 8]);
        assert!(hint > 0);
        at += hint;
        members += 1;
    }
    assert_eq!(at, packed.len());
    assert_eq!(members, 10);
}

#[test]
fn test_foreign_multi_member_stream() {
    let parts = [text(3_000), text(17), text(9_000)];
    let mut packed = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let mut encoder = GzBuilder::new()
            .mtime(1_700_000_000 + i as u32)
            .write(Vec::new(), Compression::default());
        encoder.write_all(part).unwrap();
        packed.extend(encoder.finish().unwrap());
    }

    for buffer in [32, 1 << 16] {
        let mut unpacked = Vec::new();
        StreamDecompressor::new(settings(buffer, 2, 2, SizeHintMode::None))
            .decompress(Cursor::new(packed.clone()), &mut unpacked)
            .unwrap();
        assert_eq!(unpacked, parts.concat(), "buffer {buffer}");
    }
}

#[test]
fn test_empty_inputs() {
    let settings = settings(64, 2, 2, SizeHintMode::BlockLengthInHeader);
    assert!(matches!(
        StreamCompressor::new(settings.clone())
            .compress(Cursor::new(Vec::new()), Cursor::new(Vec::new())),
        Err(PgzError::NothingToCompress)
    ));
    assert!(matches!(
        StreamDecompressor::new(settings).decompress(Cursor::new(Vec::new()), Vec::new()),
        Err(PgzError::NothingToDecompress)
    ));
}
