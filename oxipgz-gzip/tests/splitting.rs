//! Member boundary detection on real gzip streams.

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use oxipgz_core::{Block, BlockCodec, CompressorSettings, SizeHintMode};
use oxipgz_gzip::{
    BlockSplitter, BufferBoundSplitter, ContainerBuffer, GzipBlock, GzipBlockCodec,
    GzipBlockSplitter, HEADER_LEN, RewindableReader, SplitStatus,
};
use std::io::{Cursor, Write};

fn payload(member: usize, lines: usize) -> Vec<u8> {
    (0..lines)
        .map(|line| format!("member {member} line {line}: the quick brown fox\n"))
        .collect::<String>()
        .into_bytes()
}

fn compress(data: &[u8], hint: SizeHintMode) -> Vec<u8> {
    let block = Block::new(data.to_vec(), data.len().max(1) as u64).unwrap();
    GzipBlockCodec::default()
        .compress(&block, hint)
        .unwrap()
        .into_bytes()
        .to_vec()
}

fn decode_all(splitter: GzipBlockSplitter<'_>) -> (Vec<u8>, usize, bool) {
    let codec = GzipBlockCodec::default();
    let mut out = Vec::new();
    let mut independent = 0;
    let mut streamed = false;
    for item in splitter {
        match item.unwrap() {
            GzipBlock::Independent(bytes) => {
                independent += 1;
                let block = Block::new(bytes, 1).unwrap();
                out.extend_from_slice(codec.decompress(&block).unwrap().bytes());
            }
            GzipBlock::Streaming(tail) => {
                streamed = true;
                tail.decode(&codec, &mut out).unwrap();
            }
        }
    }
    (out, independent, streamed)
}

#[test]
fn test_headers_found_at_exact_offsets() {
    for lead in [0usize, 3, 17] {
        let mut bytes = vec![0x42; lead];
        let mut expected = Vec::new();
        for member in 0..4 {
            expected.push(bytes.len());
            bytes.extend(compress(&payload(member, 20), SizeHintMode::None));
        }

        let buffer = ContainerBuffer::scan(bytes);
        assert_eq!(buffer.headers(), expected.as_slice(), "lead {lead}");
        assert_eq!(buffer.starts_with_header(), lead == 0);
    }
}

#[test]
fn test_partial_header_at_buffer_end() {
    let member = compress(&payload(0, 10), SizeHintMode::BlockLengthInHeader);
    let next_header = compress(&payload(1, 10), SizeHintMode::BlockLengthInHeader);

    for p in 1..HEADER_LEN {
        let mut bytes = member.clone();
        bytes.extend_from_slice(&next_header[..p]);

        let buffer = ContainerBuffer::scan(bytes);
        assert_eq!(buffer.headers(), &[0], "p = {p}");
        assert_eq!(buffer.partial_header(), Some(member.len()), "p = {p}");
        assert_eq!(buffer.possible_part().as_ref(), &next_header[..p]);
    }
}

#[test]
fn test_five_members_split_by_buffer_scan() {
    let payloads: Vec<Vec<u8>> = (0..5).map(|m| payload(m, 40 + m * 7)).collect();
    let members: Vec<Vec<u8>> = payloads
        .iter()
        .map(|p| compress(p, SizeHintMode::None))
        .collect();
    let largest = members.iter().map(Vec::len).max().unwrap();

    // One extra header's worth so the following header proves the boundary.
    let settings = CompressorSettings::new(largest + HEADER_LEN, 2, 2, "========").unwrap();
    let reader = RewindableReader::new(Cursor::new(members.concat()));
    let splitter = GzipBlockSplitter::new(reader, &settings).unwrap();

    let (out, independent, streamed) = decode_all(splitter);
    assert_eq!(independent, 5);
    assert!(!streamed);
    assert_eq!(out, payloads.concat());
}

#[test]
fn test_hinted_members_split_without_scanning() {
    let payloads: Vec<Vec<u8>> = (0..6).map(|m| payload(m, 500)).collect();
    let stream: Vec<u8> = payloads
        .iter()
        .flat_map(|p| compress(p, SizeHintMode::BlockLengthInHeader))
        .collect();

    // A scan buffer far smaller than any member: only the hints can split.
    let settings = CompressorSettings::new(64, 2, 2, "========").unwrap();
    let reader = RewindableReader::new(Cursor::new(stream));
    let (out, independent, streamed) =
        decode_all(GzipBlockSplitter::new(reader, &settings).unwrap());

    assert_eq!(independent, 6);
    assert!(!streamed);
    assert_eq!(out, payloads.concat());
}

#[test]
fn test_single_member_exact_and_smaller_than_buffer() {
    let member = Bytes::from(compress(&payload(0, 30), SizeHintMode::None));

    for buffer_size in [member.len(), member.len() + 100] {
        let mut reader = RewindableReader::new(Cursor::new(member.to_vec()));
        let mut splitter = BufferBoundSplitter::new(buffer_size).unwrap();

        assert_eq!(
            splitter.next_status(&mut reader).unwrap(),
            SplitStatus::Block(member.clone())
        );
        assert_eq!(
            splitter.next_status(&mut reader).unwrap(),
            SplitStatus::StreamIsEnd
        );
    }
}

#[test]
fn test_foreign_gzip_falls_back_to_streaming() {
    let payloads: Vec<Vec<u8>> = (0..3).map(|m| payload(m, 300)).collect();
    let mut stream = Vec::new();
    for p in &payloads {
        let mut encoder = flate2::GzBuilder::new()
            .mtime(0x7FFF_FFF0)
            .write(Vec::new(), Compression::default());
        encoder.write_all(p).unwrap();
        stream.extend(encoder.finish().unwrap());
    }

    let settings = CompressorSettings::new(32, 2, 2, "========").unwrap();
    let reader = RewindableReader::new(Cursor::new(stream));
    let (out, independent, streamed) =
        decode_all(GzipBlockSplitter::new(reader, &settings).unwrap());

    assert_eq!(independent, 0);
    assert!(streamed);
    assert_eq!(out, payloads.concat());
}

#[test]
fn test_single_standard_member_decodes() {
    let data = payload(9, 50);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&data).unwrap();
    let stream = encoder.finish().unwrap();

    let settings = CompressorSettings::new(4096, 1, 1, "========").unwrap();
    let reader = RewindableReader::new(Cursor::new(stream));
    let (out, _, _) = decode_all(GzipBlockSplitter::new(reader, &settings).unwrap());
    assert_eq!(out, data);
}

#[test]
fn test_non_gzip_is_format_error() {
    let settings = CompressorSettings::new(64, 1, 1, "========").unwrap();
    let reader = RewindableReader::new(Cursor::new(b"this is not a gzip stream".to_vec()));
    let mut splitter = GzipBlockSplitter::new(reader, &settings).unwrap();

    assert!(matches!(
        splitter.next(),
        Some(Err(oxipgz_core::PgzError::Format { .. }))
    ));
    assert!(splitter.next().is_none());
}
