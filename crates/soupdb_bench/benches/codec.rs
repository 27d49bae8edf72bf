//! JSON codec and path benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use soupdb_bench::random_person;
use soupdb_codec::{decode, encode, value_at, DocPath, Value};

/// Create a nested value `depth` levels deep with `width` members per level.
fn nested_value(depth: usize, width: usize) -> Value {
    if depth == 0 {
        Value::Text("leaf".into())
    } else {
        Value::map((0..width).map(|i| (format!("key_{i}"), nested_value(depth - 1, width))))
    }
}

/// Benchmark encoding documents.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    group.bench_function("person", |b| {
        let value = random_person(64);
        b.iter(|| black_box(encode(black_box(&value)).unwrap()));
    });

    for depth in [2, 4].iter() {
        group.bench_with_input(BenchmarkId::new("nested", depth), depth, |b, &depth| {
            let value = nested_value(depth, 4);
            b.iter(|| black_box(encode(black_box(&value)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark decoding documents.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for size in [64, 1024, 16384].iter() {
        let text = encode(&random_person(*size)).unwrap();
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| black_box(decode(black_box(text)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark path extraction.
fn bench_value_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_at");
    let value = nested_value(4, 4);

    group.bench_function("parsed_path", |b| {
        let path = DocPath::parse("key_3.key_2.key_1.key_0").unwrap();
        b.iter(|| black_box(black_box(&value).at(black_box(&path))));
    });

    group.bench_function("raw_path", |b| {
        b.iter(|| black_box(value_at(black_box(&value), "key_3/key_2/key_1/key_0").unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_value_at);
criterion_main!(benches);
