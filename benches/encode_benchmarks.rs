//! Encoding benchmarks: write-request encoding and query-reply decoding.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use marketstore_client::{encode_write, QueryReply, RecordBatch, WireDataSet, WireValue};
use std::hint::black_box;
use std::time::Duration;

fn ohlcv(rows: usize) -> RecordBatch {
    let epoch: Vec<i64> = (0..rows as i64).map(|i| 1_500_000_000 + i * 60).collect();
    let price: Vec<f32> = (0..rows).map(|i| 100.0 + (i % 50) as f32 * 0.25).collect();
    let volume: Vec<i32> = (0..rows).map(|i| (i % 1000) as i32).collect();
    RecordBatch::builder()
        .column("Epoch", epoch)
        .column("Open", price.clone())
        .column("High", price.clone())
        .column("Low", price.clone())
        .column("Close", price)
        .column("Volume", volume)
        .build()
        .expect("batch")
}

fn bench_encode_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_write");
    for &rows in &[100usize, 10_000, 1_000_000] {
        let batch = ohlcv(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &batch, |b, batch| {
            b.iter(|| {
                let req = encode_write(black_box(batch), "AAPL/1Min/OHLCV", false).expect("encode");
                black_box(req.to_params())
            });
        });
    }
    group.finish();
}

fn bench_decode_reply(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_reply");
    for &rows in &[100usize, 10_000, 1_000_000] {
        let dataset = WireDataSet::from_batch(&ohlcv(rows), "AAPL/1Min/OHLCV").expect("dataset");
        let reply = WireValue::map([(
            "responses",
            WireValue::Array(vec![WireValue::map([("result", dataset.to_wire())])]),
        )]);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &reply, |b, reply| {
            b.iter(|| QueryReply::from_response(black_box(reply)).expect("decode"));
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3));
    targets = bench_encode_write, bench_decode_reply
}
criterion_main!(benches);
