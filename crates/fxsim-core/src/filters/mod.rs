//! Quantized Digital Filters
//!
//! Filters in this module run on simulated fixed-point arithmetic: every
//! coefficient, product, sum and output passes through a
//! [`FixedPointQuantizer`](crate::quantizer::FixedPointQuantizer).
//!
//! - **Direct Form 1 IIR**: separate transversal and recursive registers,
//!   one accumulator
//!
//! ```text
//! x ──> [zi_b] ──> Σ b_q·x ──┐
//!                            ├──> Q_acc ──> Q_O ──> y
//! y ──> [zi_a] ──> Σ a_q·y ──┘                      │
//!        ^──────────────────────────────────────────┘
//! ```

pub mod iir_df1;
pub mod traits;

pub use iir_df1::{Coefficients, DfResponse, FilterQuantParams, QuantizedIirFilter, Stimulus};
pub use traits::{polynomial_response, FilterOverflowReport, FixpFilter, FrequencyResponse};
