//! Compositor throughput: blending, blits, fills, and frame diffing.
//!
//! Run with: cargo bench -p termgrid-render --bench compositor_bench

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::rc::Rc;
use termgrid_render::blend::blend_colors;
use termgrid_render::diff::GridDiff;
use termgrid_render::engine::HeapEngine;
use termgrid_render::{BufferOptions, OptimizedBuffer, Rgba, TextAttributes};

const SIZES: [(u32, u32); 3] = [(80, 24), (120, 40), (200, 60)];

fn buffer(engine: &Rc<HeapEngine>, w: u32, h: u32, respect_alpha: bool) -> OptimizedBuffer {
    OptimizedBuffer::create(
        engine.clone(),
        w,
        h,
        BufferOptions::default().with_respect_alpha(respect_alpha),
    )
    .expect("allocate bench buffer")
}

// =============================================================================
// Blend kernel
// =============================================================================

fn bench_blend(c: &mut Criterion) {
    let mut group = c.benchmark_group("blend");
    let bg = Rgba::rgb(0.1, 0.2, 0.3);
    for alpha in [0.25f32, 0.85, 1.0] {
        let overlay = Rgba::new(0.9, 0.4, 0.1, alpha);
        group.bench_with_input(
            BenchmarkId::new("blend_colors", format!("a={alpha}")),
            &overlay,
            |b, overlay| b.iter(|| black_box(blend_colors(black_box(*overlay), black_box(bg)))),
        );
    }
    group.finish();
}

// =============================================================================
// Blits
// =============================================================================

fn bench_blit(c: &mut Criterion) {
    let mut group = c.benchmark_group("blit");
    let engine = Rc::new(HeapEngine::new());

    for (w, h) in SIZES {
        group.throughput(Throughput::Elements(u64::from(w) * u64::from(h)));

        let mut dst = buffer(&engine, w, h, false);
        dst.clear(Rgba::BLACK).expect("clear");

        let mut opaque = buffer(&engine, w, h, false);
        opaque.clear(Rgba::BLUE).expect("clear");
        group.bench_with_input(BenchmarkId::new("copy", format!("{w}x{h}")), &(), |b, _| {
            b.iter(|| {
                dst.draw_frame_buffer(0, 0, &opaque, None).expect("blit");
                black_box(&dst);
            })
        });

        let mut overlay = buffer(&engine, w, h, true);
        overlay
            .clear(Rgba::new(0.0, 0.0, 0.0, 0.5))
            .expect("clear");
        group.bench_with_input(BenchmarkId::new("blend", format!("{w}x{h}")), &(), |b, _| {
            b.iter(|| {
                dst.draw_frame_buffer(0, 0, &overlay, None).expect("blit");
                black_box(&dst);
            })
        });
    }
    group.finish();
}

// =============================================================================
// Fills and text
// =============================================================================

fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill");
    let engine = Rc::new(HeapEngine::new());

    for (w, h) in SIZES {
        group.throughput(Throughput::Elements(u64::from(w) * u64::from(h)));
        let mut buf = buffer(&engine, w, h, false);

        group.bench_with_input(BenchmarkId::new("opaque", format!("{w}x{h}")), &(), |b, _| {
            b.iter(|| {
                buf.fill_rect(0, 0, w, h, Rgba::RED).expect("fill");
                black_box(&buf);
            })
        });
        group.bench_with_input(
            BenchmarkId::new("translucent", format!("{w}x{h}")),
            &(),
            |b, _| {
                b.iter(|| {
                    buf.fill_rect(0, 0, w, h, Rgba::new(1.0, 0.0, 0.0, 0.3))
                        .expect("fill");
                    black_box(&buf);
                })
            },
        );
    }

    let mut buf = buffer(&engine, 120, 40, false);
    let line = "The quick brown fox jumps over the lazy dog. ".repeat(3);
    group.bench_function("draw_text/120x40", |b| {
        b.iter(|| {
            for y in 0..40 {
                buf.draw_text(
                    &line,
                    0,
                    y,
                    Rgba::WHITE,
                    None,
                    TextAttributes::empty(),
                    None,
                )
                .expect("text");
            }
            black_box(&buf);
        })
    });
    group.finish();
}

// =============================================================================
// Diff
// =============================================================================

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");
    let engine = Rc::new(HeapEngine::new());

    for (w, h) in SIZES {
        group.throughput(Throughput::Elements(u64::from(w) * u64::from(h)));
        let old = buffer(&engine, w, h, false);
        let mut new = buffer(&engine, w, h, false);
        for y in (0..h as i32).step_by(4) {
            new.fill_rect(0, y, w / 2, 1, Rgba::GREEN).expect("fill");
        }
        let (old, new) = (old.grid().expect("grid"), new.grid().expect("grid"));
        group.bench_with_input(
            BenchmarkId::new("compute_runs", format!("{w}x{h}")),
            &(),
            |b, _| b.iter(|| black_box(GridDiff::compute(old, new).runs())),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_blend, bench_blit, bench_fill, bench_diff);
criterion_main!(benches);
