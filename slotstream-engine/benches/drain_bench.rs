use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use slotstream_engine::{drain_inlet, DrainParams, SlotOutput};
use slotstream_transport::{
    Chunk, ConnectionId, Inlet, LoopbackTransport, Outlet, OutletSpec, Transport, TransportResult,
};
use std::time::Duration;

/// Inlet that always has `max_samples` ready
struct SaturatedInlet {
    id: ConnectionId,
    channels: usize,
}

impl Inlet for SaturatedInlet {
    fn connection_id(&self) -> ConnectionId {
        self.id
    }

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn pull_chunk(&mut self, max_samples: usize, _timeout: Duration) -> TransportResult<Chunk> {
        let mut chunk = Chunk::with_capacity(max_samples);
        for i in 0..max_samples {
            chunk.push(vec![i as f64; self.channels], i as f64);
        }
        Ok(chunk)
    }
}

fn bench_drain_saturated(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain_saturated");

    for chunk_size in [8usize, 32, 128] {
        let params = DrainParams::new(512, chunk_size, Duration::ZERO).unwrap();
        group.throughput(Throughput::Elements(512));
        group.bench_with_input(BenchmarkId::from_parameter(chunk_size), &params, |b, params| {
            let mut inlet = SaturatedInlet {
                id: ConnectionId::next(),
                channels: 8,
            };
            b.iter(|| {
                let buffer = drain_inlet(&mut inlet, black_box(params)).unwrap();
                black_box(buffer);
            });
        });
    }

    group.finish();
}

fn bench_drain_and_commit(c: &mut Criterion) {
    let params = DrainParams::default();
    let mut inlet = SaturatedInlet {
        id: ConnectionId::next(),
        channels: 8,
    };
    let mut output = SlotOutput::for_stream(8, 250.0);

    c.bench_function("drain_and_commit_8ch", |b| {
        b.iter(|| {
            let buffer = drain_inlet(&mut inlet, &params).unwrap();
            output.commit(buffer);
            black_box(output.sample_count());
        });
    });
}

fn bench_loopback_cycle(c: &mut Criterion) {
    let bus = LoopbackTransport::new();
    let mut outlet = bus
        .open_outlet(&OutletSpec::new("EEG_0", "EEG", 8).with_rate(250.0))
        .unwrap();
    let found = bus.resolve("EEG", 1, Duration::ZERO).unwrap();
    let mut inlet = bus.open_inlet(&found[0], Duration::from_secs(1)).unwrap();
    let params = DrainParams::default();
    let sample = [0.5f64; 8];

    c.bench_function("loopback_push_100_drain", |b| {
        b.iter(|| {
            for _ in 0..100 {
                outlet.push_sample(black_box(&sample)).unwrap();
            }
            let buffer = drain_inlet(&mut inlet, &params).unwrap();
            black_box(buffer.len());
        });
    });
}

criterion_group!(
    benches,
    bench_drain_saturated,
    bench_drain_and_commit,
    bench_loopback_cycle
);
criterion_main!(benches);
