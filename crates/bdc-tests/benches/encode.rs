use bdc_encoder::CapsuleEncoder;
use bdc_tests::{body_curve, field_recording};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

fn bench_encode_capacity(c: &mut Criterion) {
    let records = body_curve(4_320, 60);
    let mut group = c.benchmark_group("encode_capacity");
    group.throughput(Throughput::Elements(records.len() as u64));

    for capacity in [20, 244, 8191] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                let mut enc = CapsuleEncoder::new();
                enc.period(60)
                    .frame_capacity(capacity)
                    .add_records(records.iter().copied());
                enc.encode().unwrap()
            });
        });
    }

    group.finish();
}

fn bench_encode_damaged(c: &mut Criterion) {
    let smooth = body_curve(4_320, 60);
    let damaged = field_recording(4_320, 60);

    let mut group = c.benchmark_group("encode_recording");
    group.throughput(Throughput::Elements(smooth.len() as u64));
    for (name, records) in [("smooth", &smooth), ("field", &damaged)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), records, |b, records| {
            b.iter(|| {
                let mut enc = CapsuleEncoder::new();
                enc.period(60).add_records(records.iter().copied());
                enc.encode().unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode_capacity, bench_encode_damaged);
criterion_main!(benches);
