//! End-to-end round-trip scenarios over the public API.

use odz::{
    BlockKind, HEADER_SIZE, compress, compress_with_level, decompress, read_block_header,
    read_stream_header,
};

/// Deterministic pseudo-random bytes (xorshift; no external PRNG needed).
fn random_bytes(len: usize, mut seed: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(len);
    while data.len() < len {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        data.extend_from_slice(&seed.to_le_bytes());
    }
    data.truncate(len);
    data
}

/// Walk the container and return (raw_size, last) per block.
fn block_map(stream: &[u8]) -> Vec<(u32, bool)> {
    let mut cursor = &stream[..];
    read_stream_header(&mut cursor).unwrap();
    let mut blocks = Vec::new();
    loop {
        let (kind, last) = read_block_header(&mut cursor).unwrap();
        blocks.push((kind.raw_size(), last));
        cursor = &cursor[kind.payload_size() as usize..];
        if last {
            break;
        }
    }
    blocks
}

#[test]
fn test_empty_input() {
    let packed = compress(b"").unwrap();
    // Header plus one empty stored last block.
    assert_eq!(packed.len(), HEADER_SIZE + 5);
    assert_eq!(decompress(&packed).unwrap(), b"");
}

#[test]
fn test_short_literal() {
    let packed = compress(b"Hello").unwrap();
    assert!(packed.len() < 32, "got {} bytes", packed.len());
    assert_eq!(decompress(&packed).unwrap(), b"Hello");
}

#[test]
fn test_long_run() {
    let data = vec![0x41u8; 10000];
    let packed = compress(&data).unwrap();
    assert!(packed.len() <= 100, "got {} bytes", packed.len());
    assert_eq!(decompress(&packed).unwrap(), data);
}

#[test]
fn test_periodic_pattern() {
    let data: Vec<u8> = b"abc".iter().copied().cycle().take(4096).collect();
    let packed = compress(&data).unwrap();
    assert!(packed.len() < data.len() / 8, "got {} bytes", packed.len());
    assert_eq!(decompress(&packed).unwrap(), data);
}

#[test]
fn test_multi_block() {
    // 3 MiB of pseudo-random data repeating with a 16 KiB period, so every
    // block is compressible within the 32 KiB match window.
    let period = random_bytes(16 * 1024, 0xD1CE);
    let mut data = Vec::with_capacity(3 << 20);
    while data.len() < 3 << 20 {
        data.extend_from_slice(&period);
    }
    data.truncate(3 << 20);

    let packed = compress_with_level(&data, 2).unwrap();
    assert!(packed.len() < data.len() / 4);

    let blocks = block_map(&packed);
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0], (1 << 20, false));
    assert_eq!(blocks[1], (1 << 20, false));
    assert_eq!(blocks[2], (1 << 20, true));
    let total: u64 = blocks.iter().map(|&(raw, _)| u64::from(raw)).sum();
    assert_eq!(total, 3 << 20);

    assert_eq!(decompress(&packed).unwrap(), data);
}

#[test]
fn test_incompressible_input() {
    let data = random_bytes(100 * 1024, 0xBADC0FFE);
    let packed = compress(&data).unwrap();
    // At worst a stored rendition: tiny framing overhead, under 8.01
    // bits per input byte.
    let budget = data.len() + data.len() / 100 + HEADER_SIZE;
    assert!(packed.len() <= budget, "got {} bytes", packed.len());
    assert_eq!(decompress(&packed).unwrap(), data);
}

#[test]
fn test_block_boundary_sizes() {
    for len in [(1 << 20) - 1, 1 << 20, (1 << 20) + 1] {
        let data = vec![7u8; len];
        let packed = compress(&data).unwrap();
        let blocks = block_map(&packed);
        let expected_blocks = if len <= 1 << 20 { 1 } else { 2 };
        assert_eq!(blocks.len(), expected_blocks, "len {len}");
        assert_eq!(decompress(&packed).unwrap(), data, "len {len}");
    }
}

#[test]
fn test_all_levels() {
    let mut corpus: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"x".to_vec(),
        b"The quick brown fox jumps over the lazy dog".to_vec(),
        vec![0u8; 5000],
        (0u8..=255).cycle().take(9000).collect(),
        random_bytes(20000, 1),
    ];
    // Text with mixed repetition.
    let mut text = Vec::new();
    while text.len() < 30000 {
        text.extend_from_slice(b"compression ");
        text.extend_from_slice(&random_bytes(13, text.len() as u64));
    }
    corpus.push(text);

    for (i, data) in corpus.iter().enumerate() {
        for level in 0..=9 {
            let packed = compress_with_level(data, level).unwrap();
            assert_eq!(
                &decompress(&packed).unwrap(),
                data,
                "corpus {i} at level {level}"
            );
        }
    }
}

#[test]
fn test_stored_blocks_at_level_zero() {
    let data: Vec<u8> = b"abc".iter().copied().cycle().take(4096).collect();
    let packed = compress_with_level(&data, 0).unwrap();
    // Level 0 never compresses.
    assert_eq!(packed.len(), HEADER_SIZE + 5 + data.len());
    assert_eq!(decompress(&packed).unwrap(), data);
}

#[test]
fn test_decoded_output_is_not_a_stream() {
    let packed = compress(b"plain text, not a container").unwrap();
    let plain = decompress(&packed).unwrap();
    // Feeding decompressed output back in fails instead of decoding.
    assert!(decompress(&plain).is_err());
}

#[test]
fn test_progress_observes_every_block() {
    let data = vec![5u8; (2 << 20) + 300];
    let mut seen = Vec::new();
    let mut callback = |processed: u64, total: u64| {
        seen.push((processed, total));
        true
    };
    let mut packed = Vec::new();
    odz::Compressor::new(3)
        .compress(&data[..], data.len() as u64, &mut packed, Some(&mut callback))
        .unwrap();

    let total = data.len() as u64;
    assert_eq!(
        seen,
        vec![
            (1 << 20, total),
            (2 << 20, total),
            (total, total),
        ]
    );

    // Aborting on the first block stops compression with an I/O-class error.
    let mut callback = |_: u64, _: u64| false;
    let mut out = Vec::new();
    let err = odz::Compressor::new(3)
        .compress(&data[..], data.len() as u64, &mut out, Some(&mut callback))
        .unwrap_err();
    assert_eq!(err.kind(), odz::ErrorKind::Io);
}

#[test]
fn test_block_kinds_match_content() {
    // Compressible input yields a Huffman block, random input a stored one.
    let compressible: Vec<u8> = b"ha".iter().copied().cycle().take(8000).collect();
    let packed = compress(&compressible).unwrap();
    let mut cursor = &packed[..];
    read_stream_header(&mut cursor).unwrap();
    let (kind, _) = read_block_header(&mut cursor).unwrap();
    assert!(matches!(kind, BlockKind::Huffman { .. }));

    let noise = random_bytes(8000, 99);
    let packed = compress(&noise).unwrap();
    let mut cursor = &packed[..];
    read_stream_header(&mut cursor).unwrap();
    let (kind, _) = read_block_header(&mut cursor).unwrap();
    assert!(matches!(kind, BlockKind::Stored { .. }));
}
