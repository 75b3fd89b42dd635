use bdc_decoder::{CapsuleDecoder, FrameDecoder, StreamingDecoder};
use bdc_encoder::CapsuleEncoder;
use bdc_tests::{body_curve, field_recording};
use bdc_types::Record;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

fn capsule(records: &[Record], capacity: usize, checksum: bool) -> Vec<u8> {
    let mut enc = CapsuleEncoder::new();
    enc.period(60)
        .frame_capacity(capacity)
        .checksum(checksum)
        .add_records(records.iter().copied());
    enc.encode().unwrap()
}

fn bench_decode_frame(c: &mut Criterion) {
    let mut enc = CapsuleEncoder::new();
    enc.period(60).frame_capacity(244).add_records(body_curve(2_000, 60));
    let frames = enc.encode_frames().unwrap();
    let frame = &frames[0];

    let mut group = c.benchmark_group("decode_frame");
    group.throughput(Throughput::Bytes(frame.len() as u64));
    group.bench_function("ble_payload", |b| {
        b.iter(|| FrameDecoder::new().decode(frame).unwrap());
    });
    group.finish();
}

fn bench_decode_capacity(c: &mut Criterion) {
    let records = body_curve(4_320, 60);
    let mut group = c.benchmark_group("decode_capacity");
    group.throughput(Throughput::Elements(records.len() as u64));

    for capacity in [20, 244, 8191] {
        let bytes = capsule(&records, capacity, true);
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &bytes, |b, bytes| {
            b.iter(|| CapsuleDecoder::decode(bytes).unwrap());
        });
    }

    group.finish();
}

fn bench_decode_checksum(c: &mut Criterion) {
    let records = field_recording(4_320, 60);
    let with = capsule(&records, 244, true);
    let without = capsule(&records, 244, false);

    let mut group = c.benchmark_group("decode_checksum");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("verified", |b| {
        b.iter(|| CapsuleDecoder::decode(&with).unwrap());
    });
    group.bench_function("none", |b| {
        b.iter(|| CapsuleDecoder::decode(&without).unwrap());
    });
    group.finish();
}

fn bench_decode_streaming(c: &mut Criterion) {
    let records = body_curve(4_320, 60);
    let bytes = capsule(&records, 244, true);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("decode_streaming");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("day", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let mut stream = StreamingDecoder::new(bytes.as_slice());
                while let Some(event) = stream.next().await {
                    event.unwrap();
                }
            });
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_decode_frame,
    bench_decode_capacity,
    bench_decode_checksum,
    bench_decode_streaming,
);
criterion_main!(benches);
