//! Decoder benchmarks over synthetic month-sized archives.
//!
//! Run with: `cargo bench --package mqhist-bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use mqhist_bench::{expected_bars, month_archive, month_stream};
use mqhist_codec::{
    DecodeContext, DecodeOptions, KEY_LEN, decode_archive, decode_archive_file, decode_bars,
    derive_keystream,
};
use mqhist_types::ArchiveMonth;
use std::hint::black_box;

/// Archive sizes in hours of minute bars; 744 hours is a 31-day month.
const SIZES: [(&str, usize); 3] = [("1-day", 24), ("1-week", 168), ("1-month", 744)];

fn block_decode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_bars");
    let month = ArchiveMonth::new(2020, 10).expect("valid month");

    for (name, hours) in SIZES {
        let stream = month_stream(2020, 10, hours);
        group.throughput(Throughput::Elements(expected_bars(hours) as u64));

        group.bench_with_input(BenchmarkId::new("no_window", name), &stream, |b, stream| {
            b.iter(|| decode_bars(black_box(stream), None, DecodeContext::default()));
        });
        group.bench_with_input(BenchmarkId::new("window", name), &stream, |b, stream| {
            b.iter(|| decode_bars(black_box(stream), Some(&month), DecodeContext::default()));
        });
    }

    group.finish();
}

fn keystream_benchmark(c: &mut Criterion) {
    let mut material = [0u8; KEY_LEN];
    for (i, byte) in material.iter_mut().enumerate() {
        *byte = (i as u8).wrapping_mul(91).wrapping_add(3);
    }

    c.bench_function("derive_keystream", |b| {
        b.iter(|| derive_keystream(black_box(&material)));
    });
}

fn archive_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_archive");
    let options = DecodeOptions::new().with_month(ArchiveMonth::new(2020, 10).expect("valid month"));

    for (name, hours) in SIZES {
        let archive = month_archive(2020, 10, hours);
        group.throughput(Throughput::Bytes(archive.bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("memory", name), &archive, |b, archive| {
            b.iter(|| decode_archive(black_box(&archive.bytes), &archive.digest, &options));
        });

        let dir = tempfile::tempdir().expect("temp dir");
        let path = archive.write_to(dir.path()).expect("write archive");
        group.bench_with_input(BenchmarkId::new("file", name), &path, |b, path| {
            b.iter(|| decode_archive_file(black_box(path), &options));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    block_decode_benchmark,
    keystream_benchmark,
    archive_benchmark
);
criterion_main!(benches);
