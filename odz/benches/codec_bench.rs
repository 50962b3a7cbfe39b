//! Performance benchmarks for the odz codec.
//!
//! Measures compression and decompression throughput across data patterns
//! (repeated, text-like, random) and sizes, plus the per-level cost of the
//! match finder.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use odz::{compress_with_level, decompress};
use std::hint::black_box;

/// Test data generators.
mod test_data {
    /// Uniform data: one repeated byte.
    pub fn uniform(size: usize) -> Vec<u8> {
        vec![0xAA; size]
    }

    /// Pseudo-random data from a simple xorshift generator.
    pub fn random(size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);
        let mut seed: u64 = 0x1234_5678_9ABC_DEF0;
        while data.len() < size {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            data.extend_from_slice(&seed.to_le_bytes());
        }
        data.truncate(size);
        data
    }

    /// Text-like data: a word pool cycled with mild variation.
    pub fn text_like(size: usize) -> Vec<u8> {
        const WORDS: &[&str] = &[
            "the", "of", "stream", "block", "match", "entropy", "window", "code",
        ];
        let mut data = Vec::with_capacity(size);
        let mut i = 0usize;
        while data.len() < size {
            data.extend_from_slice(WORDS[i % WORDS.len()].as_bytes());
            data.push(b' ');
            if i % 11 == 0 {
                data.push(b'0' + (i % 10) as u8);
            }
            i += 1;
        }
        data.truncate(size);
        data
    }
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    for size in [16 * 1024, 256 * 1024] {
        for (name, data) in [
            ("uniform", test_data::uniform(size)),
            ("text", test_data::text_like(size)),
            ("random", test_data::random(size)),
        ] {
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(
                BenchmarkId::new(name, size),
                &data,
                |b, data| b.iter(|| compress_with_level(black_box(data), 6).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");
    for size in [16 * 1024, 256 * 1024] {
        for (name, data) in [
            ("uniform", test_data::uniform(size)),
            ("text", test_data::text_like(size)),
            ("random", test_data::random(size)),
        ] {
            let packed = compress_with_level(&data, 6).unwrap();
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(
                BenchmarkId::new(name, size),
                &packed,
                |b, packed| b.iter(|| decompress(black_box(packed)).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_levels(c: &mut Criterion) {
    let data = test_data::text_like(128 * 1024);
    let mut group = c.benchmark_group("levels");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for level in [1, 4, 6, 9] {
        group.bench_with_input(BenchmarkId::from_parameter(level), &level, |b, &level| {
            b.iter(|| compress_with_level(black_box(&data), level).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress, bench_levels);
criterion_main!(benches);
