//! Quantized IIR Filter, Direct Form 1
//!
//! Simulates a direct-form-1 IIR filter on fixed-point hardware. Every
//! arithmetic step goes through its own [`FixedPointQuantizer`]:
//!
//! ```text
//!  x[n] ──┬── b_q[0] ─┐                 ┌──────────────── y[n]
//!         z⁻¹         │                 │
//!         ├── b_q[1] ─┤   Q_mul   Q_acc │   Q_O
//!         z⁻¹         ├──> Σ ─────> ───┼──> ──┬──>
//!         └── b_q[2] ─┤                 │      z⁻¹
//!                     └── -a_q[1..] ────┴──────┘
//! ```
//!
//! - `QCB` / `QCA` quantize the coefficients once per configuration
//! - `Q_mul` quantizes every partial product; its word is the accumulator
//!   format widened to `QI.WI + QCB.WI + ceil(log2(taps))` integer and
//!   `QI.WF + QCB.WF` fractional bits
//! - `QACC` quantizes the sum of products
//! - `QO` quantizes the output, which also feeds the recursive register
//!
//! The transversal register `zi_b` holds the most recent inputs (oldest
//! first), the recursive register `zi_a` the most recent outputs (newest
//! first). Both survive between calls, so a signal may be streamed in blocks.
//!
//! ## Example
//!
//! ```rust
//! use fxsim_core::filters::{Coefficients, FilterQuantParams, QuantizedIirFilter};
//! use fxsim_core::qconfig::QuantizationConfig;
//!
//! let params = FilterQuantParams {
//!     qcb: QuantizationConfig::new(1, 5),
//!     qca: QuantizationConfig::new(1, 5),
//!     qi: QuantizationConfig::new(2, 3),
//!     qacc: QuantizationConfig::new(4, 3),
//!     qo: QuantizationConfig::new(5, 3),
//! };
//! let coeffs = Coefficients::new(vec![0.5, 0.25], vec![1.0, -0.75]);
//! let mut filter = QuantizedIirFilter::new(&coeffs, params).unwrap();
//!
//! let first = filter.filter(&[1.0, 0.0, 0.0]);
//! let rest = filter.filter(&[0.0, 0.0]);
//! assert_eq!(first, vec![0.5, 0.625, 0.5]);
//! assert_eq!(rest, vec![0.375, 0.25]);
//! ```

use super::traits::{polynomial_response, FilterOverflowReport, FixpFilter, FrequencyResponse};
use crate::error::{FxError, FxResult};
use crate::format::Scaling;
use crate::qconfig::QuantizationConfig;
use crate::quantizer::FixedPointQuantizer;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Quantizer settings for every role of a DF1 filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterQuantParams {
    /// Transversal coefficients
    #[serde(rename = "QCB")]
    pub qcb: QuantizationConfig,
    /// Recursive coefficients
    #[serde(rename = "QCA")]
    pub qca: QuantizationConfig,
    /// Accumulator; also the template of the product quantizer
    #[serde(rename = "QACC")]
    pub qacc: QuantizationConfig,
    /// Input word, used for product word growth
    #[serde(rename = "QI")]
    pub qi: QuantizationConfig,
    /// Output
    #[serde(rename = "QO")]
    pub qo: QuantizationConfig,
}

/// Floating-point transfer function coefficients `B(z) / A(z)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coefficients {
    /// Numerator
    pub b: Vec<f64>,
    /// Denominator, `a[0]` is treated as 1
    pub a: Vec<f64>,
}

impl Coefficients {
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> Self {
        Self { b, a }
    }

    /// Pure transversal filter with `a = [1, 0, ...]`.
    pub fn fir(b: Vec<f64>) -> Self {
        let mut a = vec![0.0; b.len()];
        if let Some(a0) = a.first_mut() {
            *a0 = 1.0;
        }
        Self { b, a }
    }

    pub fn num_taps(&self) -> usize {
        self.b.len().max(self.a.len())
    }

    pub fn validate(&self) -> FxResult<()> {
        if self.b.len() != self.a.len() {
            return Err(FxError::CoefficientLengthMismatch {
                b: self.b.len(),
                a: self.a.len(),
            });
        }
        if self.b.is_empty() {
            return Err(FxError::EmptyCoefficients);
        }
        Ok(())
    }
}

/// Input of one [`QuantizedIirFilter::process`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stimulus<'a> {
    /// A block of samples
    Samples(&'a [f64]),
    /// An impulse of the given amplitude, one filter length long
    Impulse(f64),
}

impl<'a> From<&'a [f64]> for Stimulus<'a> {
    fn from(samples: &'a [f64]) -> Self {
        Stimulus::Samples(samples)
    }
}

impl<'a> From<&'a Vec<f64>> for Stimulus<'a> {
    fn from(samples: &'a Vec<f64>) -> Self {
        Stimulus::Samples(samples)
    }
}

impl<'a, const N: usize> From<&'a [f64; N]> for Stimulus<'a> {
    fn from(samples: &'a [f64; N]) -> Self {
        Stimulus::Samples(samples)
    }
}

impl From<f64> for Stimulus<'_> {
    fn from(amplitude: f64) -> Self {
        Stimulus::Impulse(amplitude)
    }
}

impl<'a> From<Option<&'a [f64]>> for Stimulus<'a> {
    fn from(samples: Option<&'a [f64]>) -> Self {
        samples.map_or(Stimulus::Impulse(1.0), Stimulus::Samples)
    }
}

/// Result of one [`QuantizedIirFilter::process`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct DfResponse {
    /// Quantized output samples
    pub output: Vec<f64>,
    /// Transversal register after the block
    pub zi_b: Vec<f64>,
    /// Recursive register after the block
    pub zi_a: Vec<f64>,
}

/// Streaming direct-form-1 IIR filter on quantized arithmetic.
#[derive(Debug, Clone)]
pub struct QuantizedIirFilter {
    params: FilterQuantParams,
    q_b: FixedPointQuantizer,
    q_a: FixedPointQuantizer,
    q_mul: FixedPointQuantizer,
    q_acc: FixedPointQuantizer,
    q_out: FixedPointQuantizer,
    b_q: Vec<f64>,
    a_q: Vec<f64>,
    zi_b: Vec<f64>,
    zi_a: Vec<f64>,
    /// Scratch buffer for partial products
    products: Vec<f64>,
}

impl QuantizedIirFilter {
    /// Create a filter from floating-point coefficients.
    pub fn new(coeffs: &Coefficients, params: FilterQuantParams) -> FxResult<Self> {
        coeffs.validate()?;
        let mut filter = Self {
            q_b: FixedPointQuantizer::new(params.qcb.clone())?,
            q_a: FixedPointQuantizer::new(params.qca.clone())?,
            q_mul: FixedPointQuantizer::new(product_config(&params, coeffs.num_taps()))?,
            q_acc: FixedPointQuantizer::new(params.qacc.clone())?,
            q_out: FixedPointQuantizer::new(params.qo.clone())?,
            params,
            b_q: Vec::new(),
            a_q: Vec::new(),
            zi_b: Vec::new(),
            zi_a: Vec::new(),
            products: Vec::new(),
        };
        filter.load_coefficients(coeffs);
        Ok(filter)
    }

    /// Replace coefficients and quantizer settings.
    ///
    /// Registers are cleared and per-run counters reset. On error the filter
    /// is left unchanged.
    pub fn configure(&mut self, coeffs: &Coefficients, params: FilterQuantParams) -> FxResult<()> {
        *self = Self::new(coeffs, params)?;
        Ok(())
    }

    /// Replace the coefficients, keeping the quantizer settings.
    pub fn set_coefficients(&mut self, coeffs: &Coefficients) -> FxResult<()> {
        self.configure(coeffs, self.params.clone())
    }

    fn load_coefficients(&mut self, coeffs: &Coefficients) {
        self.b_q = self.q_b.quantize_coefficients(&coeffs.b, false);
        self.a_q = self.q_a.quantize_coefficients(&coeffs.a, true);

        let coeff_overflows = self.q_b.stats().total + self.q_a.stats().total;
        if coeff_overflows > 0 {
            tracing::warn!(
                b = self.q_b.stats().total,
                a = self.q_a.stats().total,
                "Coefficient quantization overflowed"
            );
        }
        tracing::debug!(
            taps = self.num_taps(),
            product = %self.q_mul.config().q_string(),
            accumulator = %self.q_acc.config().q_string(),
            "DF1 filter configured"
        );
        self.reset();
    }

    // ------------------------------------------------------------------ accessors

    pub fn params(&self) -> &FilterQuantParams {
        &self.params
    }

    /// Settings of the product quantizer after word growth.
    pub fn product_config(&self) -> &QuantizationConfig {
        self.q_mul.config()
    }

    /// Quantized transversal coefficients.
    pub fn coefficients_b(&self) -> &[f64] {
        &self.b_q
    }

    /// Quantized recursive coefficients, `a_q[0]` is unity.
    pub fn coefficients_a(&self) -> &[f64] {
        &self.a_q
    }

    /// Filter length `L = max(len(b), len(a))`.
    pub fn num_taps(&self) -> usize {
        self.b_q.len().max(self.a_q.len())
    }

    /// `(zi_b, zi_a)`.
    pub fn registers(&self) -> (&[f64], &[f64]) {
        (&self.zi_b, &self.zi_a)
    }

    // ------------------------------------------------------------------ processing

    /// Clear both registers and the product, accumulator and output counters.
    ///
    /// Coefficient counters are kept; they describe the configured coefficients.
    pub fn reset(&mut self) {
        for q in [&mut self.q_mul, &mut self.q_acc, &mut self.q_out] {
            q.reset_counters();
            q.reset_state();
        }
        let order = self.num_taps().saturating_sub(1);
        self.zi_b = vec![0.0; order];
        self.zi_a = vec![0.0; order];
    }

    /// Filter a block.
    ///
    /// `zi_b` / `zi_a` replace the current registers when given; vectors of
    /// the wrong length are truncated (the first `L-1` entries are kept) or
    /// zero-padded at the end.
    pub fn process<'a>(
        &mut self,
        stimulus: impl Into<Stimulus<'a>>,
        zi_b: Option<&[f64]>,
        zi_a: Option<&[f64]>,
    ) -> DfResponse {
        let taps = self.num_taps();
        let order = taps - 1;

        if let Some(zi) = zi_b {
            self.zi_b = fit_register("zi_b", zi, order);
        }
        if let Some(zi) = zi_a {
            self.zi_a = fit_register("zi_a", zi, order);
        }

        let impulse;
        let samples: &[f64] = match stimulus.into() {
            Stimulus::Samples(s) => s,
            Stimulus::Impulse(amplitude) => {
                let mut x = vec![0.0; taps];
                x[0] = amplitude;
                impulse = x;
                &impulse
            }
        };

        let acc_before = self.q_acc.stats().total;
        let out_before = self.q_out.stats().total;

        let mut history = Vec::with_capacity(order + samples.len());
        history.extend_from_slice(&self.zi_b);
        history.extend_from_slice(samples);

        let mut output = Vec::with_capacity(samples.len());
        for k in 0..samples.len() {
            // newest sample pairs with b_q[0]
            let window = &history[k..k + taps];
            self.products.clear();
            self.products
                .extend(self.b_q.iter().zip(window.iter().rev()).map(|(&b, &x)| b * x));
            self.q_mul.quantize_in_place(&mut self.products, Scaling::None);
            let xb: f64 = self.products.iter().sum();

            self.products.clear();
            self.products
                .extend(self.zi_a.iter().zip(&self.a_q[1..]).map(|(&y, &a)| y * a));
            self.q_mul.quantize_in_place(&mut self.products, Scaling::None);
            let xa: f64 = self.products.iter().sum();

            let acc = self.q_acc.quantize(xb - xa, Scaling::None);
            let y = self.q_out.quantize(acc, Scaling::None);
            if !self.zi_a.is_empty() {
                self.zi_a.rotate_right(1);
                self.zi_a[0] = y;
            }
            output.push(y);
        }

        let products = *self.q_mul.stats();
        self.q_acc.merge_overflows(&products);
        self.q_mul.reset_counters();

        let acc_overflows = self.q_acc.stats().total - acc_before;
        let out_overflows = self.q_out.stats().total - out_before;
        if acc_overflows > 0 || out_overflows > 0 {
            tracing::warn!(
                samples = samples.len(),
                products = products.total,
                accumulator = acc_overflows,
                output = out_overflows,
                "Overflow in DF1 data path"
            );
        }

        self.zi_b = history[history.len() - order..].to_vec();

        DfResponse {
            output,
            zi_b: self.zi_b.clone(),
            zi_a: self.zi_a.clone(),
        }
    }

    /// Filter a block, continuing from the current registers.
    pub fn filter(&mut self, samples: &[f64]) -> Vec<f64> {
        self.process(samples, None, None).output
    }

    /// Response to an impulse of `amplitude` (unit if `None`), one filter length long.
    pub fn impulse_response(&mut self, amplitude: Option<f64>) -> Vec<f64> {
        self.process(Stimulus::Impulse(amplitude.unwrap_or(1.0)), None, None)
            .output
    }

    /// Overflow counters per quantizer role.
    ///
    /// `Q_O` runs once per sample and its result is both the output and the
    /// recursive register input, so `output` counts each output overflow
    /// once. A model that requantizes the returned block again would count
    /// it twice. `product` is zero after every block; its overflows are
    /// included in `accumulator`.
    pub fn overflow_report(&self) -> FilterOverflowReport {
        FilterOverflowReport {
            coeff_b: *self.q_b.stats(),
            coeff_a: *self.q_a.stats(),
            product: *self.q_mul.stats(),
            accumulator: *self.q_acc.stats(),
            output: *self.q_out.stats(),
        }
    }
}

fn product_config(params: &FilterQuantParams, taps: usize) -> QuantizationConfig {
    let mut cfg = params.qacc.clone();
    cfg.wi = params.qi.wi + params.qcb.wi + ceil_log2(taps);
    cfg.wf = params.qi.wf + params.qcb.wf;
    cfg
}

fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

fn fit_register(name: &str, values: &[f64], len: usize) -> Vec<f64> {
    if values.len() != len {
        tracing::warn!(register = name, expected = len, got = values.len(), "Register length mismatch, resizing");
    }
    let mut reg: Vec<f64> = values.iter().copied().take(len).collect();
    reg.resize(len, 0.0);
    reg
}

impl FixpFilter for QuantizedIirFilter {
    fn process_block(&mut self, input: &[f64]) -> Vec<f64> {
        self.filter(input)
    }

    fn reset(&mut self) {
        QuantizedIirFilter::reset(self);
    }

    fn order(&self) -> usize {
        self.num_taps() - 1
    }

    fn overflow_report(&self) -> FilterOverflowReport {
        QuantizedIirFilter::overflow_report(self)
    }
}

impl FrequencyResponse for QuantizedIirFilter {
    /// Response of the quantized coefficients, converted back to real values.
    fn transfer_function(&self, omega: f64) -> Complex64 {
        let b: Vec<f64> = self.b_q.iter().map(|&c| c / self.q_b.scale()).collect();
        let a: Vec<f64> = self.a_q.iter().map(|&c| c / self.q_a.scale()).collect();
        polynomial_response(&b, omega) / polynomial_response(&a, omega)
    }
}
