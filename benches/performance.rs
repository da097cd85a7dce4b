//! Benchmarks for the CPU-side work of a run: phase derivation, report
//! rendering, registry parsing and ranking

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pingcloud::{
    output::{phase_diagram, Palette, Presenter, TableWriter},
    stats::{rank, RegionSamples},
    Checkpoint, CheckpointRecorder, Endpoint, EndpointRegistry, PhaseTrace, ProbeResult, Provider,
};
use std::{
    hint::black_box,
    time::{Duration, Instant},
};

/// Offsets in milliseconds for every checkpoint of a TLS exchange
const TLS_OFFSETS: [u64; Checkpoint::COUNT] = [0, 12, 12, 40, 40, 95, 96, 180, 186];

fn recorded_trace(base: Instant) -> PhaseTrace {
    let mut recorder = CheckpointRecorder::new();
    for (kind, offset) in Checkpoint::ALL.iter().zip(TLS_OFFSETS) {
        recorder.record(*kind, base + Duration::from_millis(offset));
    }
    recorder.finish().unwrap()
}

fn region_table(count: usize) -> String {
    let mut table = String::from("region,name,address\n");
    for i in 0..count {
        table.push_str(&format!(
            "region-{i:03},\"Region {i}, Somewhere\",https://service.region-{i:03}.example.com/ping\n"
        ));
    }
    table
}

fn region_samples(count: usize, samples: usize) -> Vec<RegionSamples> {
    (0..count)
        .map(|i| {
            let mut region = RegionSamples::new(format!("region-{i:03}"));
            for s in 0..samples {
                if (i + s) % 7 == 0 {
                    region.add_error();
                } else {
                    region.add_sample(Duration::from_micros(((i * 7919 + s * 104_729) % 900_000) as u64));
                }
            }
            region
        })
        .collect()
}

fn benchmark_phase_derivation(c: &mut Criterion) {
    let base = Instant::now();

    c.bench_function("checkpoint_recording", |b| b.iter(|| recorded_trace(black_box(base))));

    c.bench_function("checkpoint_backfill", |b| {
        b.iter(|| {
            // Plain HTTP to an IP literal: no DNS, no TLS
            let mut recorder = CheckpointRecorder::new();
            recorder.record(Checkpoint::ConnectStart, black_box(base));
            recorder.record(Checkpoint::ConnectDone, base + Duration::from_millis(3));
            recorder.record(Checkpoint::FirstByte, base + Duration::from_millis(40));
            recorder.record(Checkpoint::ResponseComplete, base + Duration::from_millis(41));
            recorder.finish().unwrap()
        })
    });
}

fn benchmark_rendering(c: &mut Criterion) {
    let trace = recorded_trace(Instant::now());
    let endpoint = Endpoint::new("us-east-1", "US East (N. Virginia)", "https://dynamodb.us-east-1.amazonaws.com/ping");
    let result = ProbeResult::success(endpoint, Duration::from_micros(123_456));

    for color in [false, true] {
        let palette = Palette::new(color);
        let presenter = Presenter::new(Provider::Aws, color);

        c.bench_with_input(BenchmarkId::new("phase_diagram", color), &palette, |b, palette| {
            b.iter(|| phase_diagram(black_box(&trace), palette).unwrap())
        });

        c.bench_with_input(BenchmarkId::new("probe_row", color), &presenter, |b, presenter| {
            b.iter(|| presenter.probe_row(black_box(&result)))
        });
    }

    let registry = EndpointRegistry::builtin(Provider::Aws).unwrap();
    let presenter = Presenter::new(Provider::Aws, false);
    c.bench_function("region_listing", |b| b.iter(|| presenter.region_listing(black_box(&registry))));

    c.bench_function("table_writer", |b| {
        b.iter(|| {
            let mut table = TableWriter::standard();
            for endpoint in registry.iter() {
                table.push_row([format!("[{}]", endpoint.code), format!("[{}]", endpoint.name)]);
            }
            table.render()
        })
    });
}

fn benchmark_registry_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_parsing");
    for count in [30, 300] {
        let table = region_table(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &table, |b, table| {
            b.iter(|| EndpointRegistry::from_csv_str(black_box(table)).unwrap())
        });
    }
    group.finish();
}

fn benchmark_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");
    for (regions, samples) in [(30, 5), (30, 100), (300, 20)] {
        let input = region_samples(regions, samples);
        group.bench_with_input(
            BenchmarkId::new(format!("{regions}_regions"), samples),
            &input,
            |b, input| b.iter(|| rank(black_box(input.clone()))),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_phase_derivation,
    benchmark_rendering,
    benchmark_registry_parsing,
    benchmark_ranking
);

criterion_main!(benches);
