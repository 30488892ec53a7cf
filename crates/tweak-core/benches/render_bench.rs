//! Criterion benchmarks for graph execution and offline rendering.
//!
//! Three axes:
//!
//! - **Block** - `CompiledGraph::process_block()` for a reverb graph at varying
//!   block sizes (the live callback cost)
//! - **Render** - a full offline render of one second of stereo audio
//! - **Impulse** - synthesizing a 2 s impulse
//!
//! Run with: `cargo bench -p tweak-core`
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tweak_core::{AudioBuffer, EffectParameters, build, render, synthesize};

const SAMPLE_RATE: u32 = 48000;
const BLOCK_SIZES: &[usize] = &[128, 256, 512, 1024];

fn stereo_second() -> Arc<AudioBuffer> {
    let ch: Vec<f32> = (0..SAMPLE_RATE as usize)
        .map(|n| (n as f32 * 0.01).sin() * 0.5)
        .collect();
    Arc::new(AudioBuffer::new(vec![ch.clone(), ch], SAMPLE_RATE).unwrap())
}

fn full_params() -> EffectParameters {
    EffectParameters::default()
        .with_pitch(-3.0)
        .with_reverb(0.4)
        .with_volume(1.2)
}

// ---------------------------------------------------------------------------
// Block execution
// ---------------------------------------------------------------------------

fn bench_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/block");
    let buffer = stereo_second();

    for &block_size in BLOCK_SIZES {
        let mut graph = build(&buffer, &full_params().seeded_stages(1), 0.0)
            .unwrap()
            .into_compiled(block_size)
            .unwrap();
        group.bench_with_input(
            BenchmarkId::new("reverb_stereo", block_size),
            &block_size,
            |b, _| {
                b.iter(|| {
                    black_box(graph.process_block());
                    black_box(graph.output());
                });
            },
        );
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Offline render
// ---------------------------------------------------------------------------

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(10);
    let buffer = stereo_second();

    group.bench_function("dry_1s_stereo", |b| {
        b.iter(|| render(black_box(&buffer), &[]).unwrap());
    });

    let stages = full_params().seeded_stages(1);
    group.bench_function("full_1s_stereo", |b| {
        b.iter(|| render(black_box(&buffer), &stages).unwrap());
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Impulse synthesis
// ---------------------------------------------------------------------------

fn bench_impulse(c: &mut Criterion) {
    c.bench_function("impulse/synthesize_48k", |b| {
        b.iter(|| synthesize(black_box(SAMPLE_RATE), black_box(0.5)));
    });
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_block, bench_render, bench_impulse);
criterion_main!(benches);
