//! Bit-exact fixed-point quantization.
//!
//! [`FixedPointQuantizer`] maps real values onto the grid of a signed
//! Q-format word and applies overflow handling, while keeping cumulative
//! overflow statistics. Each element goes through the same steps:
//!
//! 1. coercion to `f64` ([`RealValue`](crate::sample::RealValue))
//! 2. optional input scaling by `scale` ([`Scaling::Multiply`])
//! 3. requantization on the LSB grid according to [`QuantMode`]
//! 4. overflow detection, counting and saturation or wrap-around
//! 5. optional output scaling by `1/scale` ([`Scaling::Divide`])
//!
//! # Example
//!
//! ```
//! use fxsim_core::format::{OverflowMode, QuantMode, Scaling};
//! use fxsim_core::qconfig::QuantizationConfig;
//! use fxsim_core::quantizer::FixedPointQuantizer;
//!
//! let cfg = QuantizationConfig::new(1, 6).with_ovfl(OverflowMode::Wrap);
//! let mut q = FixedPointQuantizer::new(cfg).unwrap();
//!
//! // MAX + LSB wraps to MIN
//! assert_eq!(q.quantize(q.max() + q.lsb(), Scaling::Multiply), q.min());
//! assert_eq!(q.stats().pos, 1);
//!
//! let y = q.quantize_slice(&[0.1, -0.7, 3.0], Scaling::Multiply);
//! assert_eq!(y.len(), 3);
//! ```

use crate::error::FxResult;
use crate::format::{OverflowMode, QuantMode, Scaling};
use crate::qconfig::{ConfigUpdate, QuantRange, QuantizationConfig};
use crate::sample::RealValue;
use serde::{Deserialize, Serialize};

/// Cumulative overflow counters of one quantizer.
///
/// `total == pos + neg` always holds; counters only grow until reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverflowStats {
    /// Values above MAX
    pub pos: u64,
    /// Values below MIN
    pub neg: u64,
    /// All overflows
    pub total: u64,
    /// Elements quantized
    pub samples: u64,
}

impl OverflowStats {
    pub fn has_overflow(&self) -> bool {
        self.total > 0
    }

    /// Fraction of processed elements that overflowed.
    pub fn overflow_ratio(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.total as f64 / self.samples as f64
        }
    }
}

/// Overflow classification of a single element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OverflowFlag {
    #[default]
    None,
    /// Above MAX
    Positive,
    /// Below MIN
    Negative,
}

impl OverflowFlag {
    /// `+1`, `-1` or `0`.
    pub fn as_i8(&self) -> i8 {
        match self {
            OverflowFlag::None => 0,
            OverflowFlag::Positive => 1,
            OverflowFlag::Negative => -1,
        }
    }
}

/// Fixed-point quantizer with overflow accounting.
#[derive(Debug, Clone)]
pub struct FixedPointQuantizer {
    config: QuantizationConfig,
    range: QuantRange,
    stats: OverflowStats,
    flags: Vec<OverflowFlag>,
    /// Delta-sigma residue in LSB units
    dsm_residue: f64,
}

impl Default for FixedPointQuantizer {
    fn default() -> Self {
        let config = QuantizationConfig::default();
        Self {
            range: config.range(),
            config,
            stats: OverflowStats::default(),
            flags: Vec::new(),
            dsm_residue: 0.0,
        }
    }
}

impl FixedPointQuantizer {
    /// Create a quantizer, validating `config`.
    pub fn new(config: QuantizationConfig) -> FxResult<Self> {
        config.validate()?;
        Ok(Self {
            range: config.range(),
            config,
            ..Default::default()
        })
    }

    // ------------------------------------------------------------------ settings

    pub fn config(&self) -> &QuantizationConfig {
        &self.config
    }

    pub fn range(&self) -> QuantRange {
        self.range
    }

    pub fn lsb(&self) -> f64 {
        self.range.lsb
    }

    pub fn msb(&self) -> f64 {
        self.range.msb
    }

    pub fn min(&self) -> f64 {
        self.range.min
    }

    pub fn max(&self) -> f64 {
        self.range.max
    }

    pub fn scale(&self) -> f64 {
        self.range.scale
    }

    /// Apply a partial update; derived values are recomputed, counters kept.
    pub fn apply(&mut self, update: &ConfigUpdate) -> FxResult<()> {
        let mut config = self.config.clone();
        config.apply(update)?;
        self.install(config);
        Ok(())
    }

    /// Replace the whole configuration; counters are kept.
    pub fn set_config(&mut self, config: QuantizationConfig) -> FxResult<()> {
        config.validate()?;
        self.install(config);
        Ok(())
    }

    fn install(&mut self, config: QuantizationConfig) {
        tracing::debug!(q = %config.q_string(), quant = %config.quant, ovfl = %config.ovfl,
            format = %config.numeric_format, "Quantizer reconfigured");
        self.range = config.range();
        self.config = config;
        self.dsm_residue = 0.0;
    }

    // ------------------------------------------------------------------ counters

    pub fn stats(&self) -> &OverflowStats {
        &self.stats
    }

    /// Per-element overflow flags of the most recent call.
    pub fn overflow_flags(&self) -> &[OverflowFlag] {
        &self.flags
    }

    /// Zero all counters and flags; settings are kept.
    pub fn reset_counters(&mut self) {
        self.stats = OverflowStats::default();
        self.flags.clear();
    }

    /// Clear the delta-sigma residue.
    pub fn reset_state(&mut self) {
        self.dsm_residue = 0.0;
    }

    /// Add the overflow counts (not the sample count) of `other`.
    pub fn merge_overflows(&mut self, other: &OverflowStats) {
        self.stats.pos += other.pos;
        self.stats.neg += other.neg;
        self.stats.total += other.total;
    }

    // ------------------------------------------------------------------ quantization

    /// Quantize one value.
    pub fn quantize(&mut self, y: f64, scaling: Scaling) -> f64 {
        self.flags.clear();
        self.quantize_element(y, scaling)
    }

    /// Quantize a slice; the output has the same length.
    pub fn quantize_slice(&mut self, ys: &[f64], scaling: Scaling) -> Vec<f64> {
        self.flags.clear();
        self.flags.reserve(ys.len());
        ys.iter().map(|&y| self.quantize_element(y, scaling)).collect()
    }

    /// Quantize a slice in place.
    pub fn quantize_in_place(&mut self, ys: &mut [f64], scaling: Scaling) {
        self.flags.clear();
        for y in ys.iter_mut() {
            *y = self.quantize_element(*y, scaling);
        }
    }

    /// Quantize any coercible value (number, complex, text, option).
    pub fn quantize_value<T: RealValue + ?Sized>(&mut self, value: &T, scaling: Scaling) -> f64 {
        self.quantize(value.real_value(), scaling)
    }

    /// Quantize a slice of coercible values.
    pub fn quantize_values<T: RealValue>(&mut self, values: &[T], scaling: Scaling) -> Vec<f64> {
        self.flags.clear();
        values
            .iter()
            .map(|v| self.quantize_element(v.real_value(), scaling))
            .collect()
    }

    /// Quantize filter coefficients with [`Scaling::Multiply`].
    ///
    /// Counters are reset first so they reflect coefficient overflows only.
    /// With `recursive` the leading coefficient is fixed to unity and is
    /// neither quantized nor counted.
    pub fn quantize_coefficients(&mut self, coeffs: &[f64], recursive: bool) -> Vec<f64> {
        self.reset_counters();
        self.reset_state();
        match coeffs.split_first() {
            Some((_, rest)) if recursive => {
                let mut out = Vec::with_capacity(coeffs.len());
                out.push(self.range.scale);
                out.extend(self.quantize_slice(rest, Scaling::Multiply));
                out
            }
            _ => self.quantize_slice(coeffs, Scaling::Multiply),
        }
    }

    fn quantize_element(&mut self, y: f64, scaling: Scaling) -> f64 {
        self.stats.samples += 1;
        let mut y = if scaling.multiplies() { y * self.range.scale } else { y };
        y = self.requantize(y);
        let flag = self.handle_overflow(&mut y);
        self.flags.push(flag);
        if scaling.divides() {
            y / self.range.scale
        } else {
            y
        }
    }

    fn requantize(&mut self, y: f64) -> f64 {
        let lsb = self.range.lsb;
        let steps = y / lsb;
        let rounded = match self.config.quant {
            QuantMode::Floor => steps.floor(),
            QuantMode::Round | QuantMode::Rint => steps.round_ties_even(),
            QuantMode::Fix => steps.trunc(),
            QuantMode::Ceil => steps.ceil(),
            QuantMode::None => return y,
            QuantMode::DeltaSigma => {
                let shaped = steps + self.dsm_residue;
                let q = shaped.round_ties_even();
                self.dsm_residue = if q.is_finite() { shaped - q } else { 0.0 };
                q
            }
        };
        rounded * lsb
    }

    fn handle_overflow(&mut self, y: &mut f64) -> OverflowFlag {
        let QuantRange { min, max, msb, .. } = self.range;
        let flag = match self.config.ovfl {
            OverflowMode::None => return OverflowFlag::None,
            _ if *y < min => OverflowFlag::Negative,
            _ if *y > max => OverflowFlag::Positive,
            _ => return OverflowFlag::None,
        };

        match flag {
            OverflowFlag::Negative => self.stats.neg += 1,
            _ => self.stats.pos += 1,
        }
        self.stats.total += 1;

        *y = match self.config.ovfl {
            OverflowMode::Saturate => y.clamp(min, max),
            // Two's complement modulo 4·MSB, mapped into [MIN, 2·MSB)
            _ => (*y + 2.0 * msb).rem_euclid(4.0 * msb) - 2.0 * msb,
        };
        flag
    }
}

/// Signal-to-quantization-noise ratio in dB of `quantized` against `reference`.
///
/// Returns `f64::INFINITY` for a noiseless result.
pub fn measure_sqnr(reference: &[f64], quantized: &[f64]) -> f64 {
    let (signal, noise) = reference
        .iter()
        .zip(quantized)
        .fold((0.0, 0.0), |(s, n), (&x, &q)| (s + x * x, n + (x - q) * (x - q)));
    if noise == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (signal / noise).log10()
    }
}
