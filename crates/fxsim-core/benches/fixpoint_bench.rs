//! Benchmarks for Fixed-Point Quantization, Codecs and DF1 Filtering
//!
//! Run with: cargo bench -p fxsim-core --bench fixpoint_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fxsim_core::prelude::*;
use std::f64::consts::PI;

const BLOCK: usize = 4096;

fn test_signal(len: usize) -> Vec<f64> {
    (0..len)
        .map(|n| 1.3 * (2.0 * PI * 0.01 * n as f64).sin() + 0.2 * (2.0 * PI * 0.17 * n as f64).cos())
        .collect()
}

// ============================================================================
// Quantizer Benchmarks
// ============================================================================

fn bench_quantize_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantize_slice");
    let signal = test_signal(BLOCK);
    group.throughput(Throughput::Elements(BLOCK as u64));

    for quant in [QuantMode::Floor, QuantMode::Round, QuantMode::Fix, QuantMode::Rint, QuantMode::DeltaSigma] {
        for ovfl in [OverflowMode::Wrap, OverflowMode::Saturate] {
            let cfg = QuantizationConfig::new(0, 15).with_quant(quant).with_ovfl(ovfl);
            let mut q = FixedPointQuantizer::new(cfg).expect("valid config");

            group.bench_with_input(BenchmarkId::new(quant.to_string(), ovfl), &signal, |b, s| {
                b.iter(|| {
                    q.reset_counters();
                    q.quantize_slice(black_box(s), Scaling::None)
                })
            });
        }
    }

    group.finish();
}

fn bench_quantize_text_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantize_values");
    let text: Vec<String> = test_signal(1024).iter().map(|v| format!("{:.6}", v)).collect();
    let mut q = FixedPointQuantizer::new(QuantizationConfig::new(1, 15)).expect("valid config");

    group.throughput(Throughput::Elements(text.len() as u64));
    group.bench_function("from_strings", |b| {
        b.iter(|| q.quantize_values(black_box(&text), Scaling::None))
    });

    group.finish();
}

// ============================================================================
// Codec Benchmarks
// ============================================================================

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let signal = test_signal(1024);
    group.throughput(Throughput::Elements(signal.len() as u64));

    for base in [NumberBase::Dec, NumberBase::Bin, NumberBase::Hex, NumberBase::Csd] {
        let cfg = QuantizationConfig::new(1, 14).with_base(base);
        let mut codec = NumberBaseCodec::new(cfg).expect("valid config");
        let text = codec.to_text_slice(&signal);

        group.bench_with_input(BenchmarkId::new("to_text", base), &signal, |b, s| {
            b.iter(|| codec.to_text_slice(black_box(s)))
        });
        group.bench_with_input(BenchmarkId::new("from_text", base), &text, |b, t| {
            b.iter(|| codec.from_text_slice(black_box(t)))
        });
    }

    group.finish();
}

// ============================================================================
// Filter Benchmarks
// ============================================================================

fn bench_df1_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("df1_filter");
    let signal: Vec<f64> = test_signal(BLOCK).iter().map(|v| v * 0.5).collect();
    group.throughput(Throughput::Elements(BLOCK as u64));

    let params = FilterQuantParams {
        qcb: QuantizationConfig::new(0, 15),
        qca: QuantizationConfig::new(1, 14),
        qi: QuantizationConfig::new(0, 15),
        qacc: QuantizationConfig::new(4, 30)
            .with_quant(QuantMode::Fix)
            .with_ovfl(OverflowMode::Wrap),
        qo: QuantizationConfig::new(0, 15),
    };

    // Lowpass sections of increasing order
    let designs = [
        Coefficients::new(vec![0.0675, 0.1349, 0.0675], vec![1.0, -1.1430, 0.4128]),
        Coefficients::new(
            vec![0.0048, 0.0193, 0.0289, 0.0193, 0.0048],
            vec![1.0, -2.3695, 2.3140, -1.0547, 0.1874],
        ),
        Coefficients::fir(vec![1.0 / 16.0; 16]),
    ];

    for coeffs in &designs {
        let mut filter = QuantizedIirFilter::new(coeffs, params.clone()).expect("valid filter");
        group.bench_with_input(BenchmarkId::new("process", coeffs.num_taps()), &signal, |b, s| {
            b.iter(|| filter.filter(black_box(s)))
        });
    }

    group.finish();
}

criterion_group!(quantizer_benches, bench_quantize_modes, bench_quantize_text_values);
criterion_group!(codec_benches, bench_codec);
criterion_group!(filter_benches, bench_df1_filter);

criterion_main!(quantizer_benches, codec_benches, filter_benches);
