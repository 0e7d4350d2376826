#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use vp8_mvpred::{
    MacroblockInfo,
    MbOffset,
    ModeInfoGrid,
    MotionVector,
    MvPredictor,
    MvRefContext,
    PixelContext,
    Plane,
    PredictionMode,
    PredictionOptions,
    RefMvSearch,
    RefType,
    SignBias,
    SplitMvPartitioning,
    find_near_mvs,
};

// CIF in macroblocks
const COLS: usize = 22;
const ROWS: usize = 18;

/// Deterministic mix of intra, single-vector and split macroblocks.
fn synthetic_grid() -> ModeInfoGrid {
    let mbs = (0..COLS * ROWS)
        .map(|i| {
            let v = (i * 37 % 29) as i16 - 14;
            match i % 7 {
                0 => MacroblockInfo::intra(PredictionMode::TM_PRED),
                1 => MacroblockInfo::split(
                    RefType::LAST_FRAME,
                    SplitMvPartitioning::SPLIT_16X8,
                    &[MotionVector::new(v, -v), MotionVector::new(-v, v)],
                ),
                2 => MacroblockInfo::inter(
                    PredictionMode::NEARMV,
                    RefType::GOLDEN_FRAME,
                    MotionVector::new(v * 2, v),
                ),
                _ => MacroblockInfo::inter(
                    PredictionMode::NEWMV,
                    RefType::LAST_FRAME,
                    MotionVector::new(v, v * 3),
                ),
            }
        })
        .collect();
    ModeInfoGrid::from_raster(COLS, ROWS, mbs).unwrap()
}

fn find_near_mvs_benchmark(c: &mut Criterion) {
    let grid = synthetic_grid();
    let bias = SignBias::new(true, false);
    c.bench_function("find_near_mvs frame", |b| {
        b.iter(|| {
            for row in 0..ROWS {
                for col in 0..COLS {
                    let ctx = MvRefContext::new(
                        &grid,
                        MbOffset { row, col },
                        RefType::LAST_FRAME,
                        &bias,
                    );
                    black_box(find_near_mvs(&grid, black_box(&ctx)));
                }
            }
        })
    });
}

fn analyze_frame_benchmark(c: &mut Criterion) {
    let grid = synthetic_grid();
    let bias = SignBias::new(true, false);
    let mut group = c.benchmark_group("analyze frame");

    let positional = MvPredictor::<u8>::new(PredictionOptions::default());
    group.bench_function("positional", |b| {
        b.iter(|| black_box(positional.analyze_frame(&grid, &bias, None)))
    });

    let recon: Plane<u8> = Plane::new(COLS * 16, ROWS * 16, 0, 0, 32, 32);
    let reference: Plane<u8> = Plane::new(COLS * 16, ROWS * 16, 0, 0, 32, 32);
    let pixels = PixelContext {
        recon: &recon,
        reference: &reference,
    };
    let scored = MvPredictor::<u8>::new(PredictionOptions {
        ref_mv_search: RefMvSearch::PixelScored,
    });
    group.bench_function("pixel scored", |b| {
        b.iter(|| black_box(scored.analyze_frame(&grid, &bias, Some(&pixels))))
    });
    group.finish();
}

criterion_group!(benches, find_near_mvs_benchmark, analyze_frame_benchmark);
criterion_main!(benches);
