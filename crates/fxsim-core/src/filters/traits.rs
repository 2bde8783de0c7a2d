//! Core Fixed-Point Filter Traits
//!
//! ```text
//! FixpFilter (block processing on quantized arithmetic)
//! FrequencyResponse (response of the quantized coefficients)
//! ```

use crate::quantizer::OverflowStats;
use num_complex::Complex64;
use serde::Serialize;
use std::f64::consts::PI;

/// Overflow counters of every quantizer role inside a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterOverflowReport {
    /// Transversal coefficient quantization
    pub coeff_b: OverflowStats,
    /// Recursive coefficient quantization
    pub coeff_a: OverflowStats,
    /// Partial products, folded into `accumulator` after every block
    pub product: OverflowStats,
    /// Accumulator
    pub accumulator: OverflowStats,
    /// Output
    pub output: OverflowStats,
}

impl FilterOverflowReport {
    /// Overflows in the data path.
    pub fn datapath_overflows(&self) -> u64 {
        self.product.total + self.accumulator.total + self.output.total
    }

    /// Overflows while quantizing coefficients.
    pub fn coefficient_overflows(&self) -> u64 {
        self.coeff_b.total + self.coeff_a.total
    }
}

/// A filter that runs on fixed-point arithmetic.
///
/// Filter state persists between calls to [`process_block`](Self::process_block)
/// so a long signal can be streamed in chunks.
pub trait FixpFilter: Send + Sync {
    /// Filter a block of samples.
    fn process_block(&mut self, input: &[f64]) -> Vec<f64>;

    /// Clear registers and per-run overflow counters.
    fn reset(&mut self);

    /// Filter order (number of delay elements per register chain).
    fn order(&self) -> usize;

    /// Current overflow counters.
    fn overflow_report(&self) -> FilterOverflowReport;
}

/// Frequency response analysis.
pub trait FrequencyResponse {
    /// Complex response `H(e^jω)` at normalized angular frequency `omega`.
    fn transfer_function(&self, omega: f64) -> Complex64;

    /// Complex response at a frequency in Hz.
    fn response_at(&self, freq_hz: f64, sample_rate: f64) -> Complex64 {
        self.transfer_function(2.0 * PI * freq_hz / sample_rate)
    }

    /// Magnitude response (linear scale, not dB).
    fn magnitude_response(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        self.response_at(freq_hz, sample_rate).norm()
    }

    /// Magnitude response in decibels.
    fn magnitude_response_db(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        20.0 * self.magnitude_response(freq_hz, sample_rate).log10()
    }

    /// Phase response in radians.
    fn phase_response(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        self.response_at(freq_hz, sample_rate).arg()
    }

    /// `(magnitude, phase)` at multiple frequencies.
    fn frequency_response(&self, freqs_hz: &[f64], sample_rate: f64) -> Vec<(f64, f64)> {
        freqs_hz
            .iter()
            .map(|&f| {
                let h = self.response_at(f, sample_rate);
                (h.norm(), h.arg())
            })
            .collect()
    }
}

/// Evaluate `Σ c[n]·e^(-jωn)`.
pub fn polynomial_response(coeffs: &[f64], omega: f64) -> Complex64 {
    coeffs
        .iter()
        .enumerate()
        .map(|(n, &c)| Complex64::from_polar(c, -omega * n as f64))
        .sum()
}
