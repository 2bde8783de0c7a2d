//! # Fixed-Point Simulation Core
//!
//! Bit-exact simulation of fixed-point arithmetic for DSP hardware design.
//!
//! ## Overview
//!
//! A signed Q-format word has `WI` integer bits, `WF` fractional bits,
//! optional `WG` guard bits and a sign bit. This crate reproduces how a
//! real-valued signal behaves when it is stored and processed in such words:
//!
//! - **Quantization**: floor, round, fix, ceil, rint, pass-through and a
//!   first-order delta-sigma mode
//! - **Overflow**: two's complement wrap, saturation or none, with cumulative
//!   positive/negative overflow counters
//! - **Text codecs**: scaled decimal, two's complement binary and hex, and
//!   canonical signed digit (CSD) rendering with exact radix-point placement
//! - **Filtering**: a streaming direct-form-1 IIR filter whose coefficients,
//!   products, accumulator and output are each quantized
//!
//! ## Signal Flow
//!
//! ```text
//! b, a ──> Q_CB / Q_CA ──> b_q, a_q
//!                            │
//! x ──> window · b_q ──> Q_mul ──> Σ ──> Q_acc ──> Q_O ──> y
//!        zi_a · a_q ──> Q_mul ──┘                    │
//!          ^─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use fxsim_core::prelude::*;
//!
//! // Q1.6 with wrap-around: MAX + LSB wraps to MIN
//! let cfg = QuantizationConfig::new(1, 6).with_ovfl(OverflowMode::Wrap);
//! let mut q = FixedPointQuantizer::new(cfg).unwrap();
//! let y = q.quantize(q.max() + q.lsb(), Scaling::None);
//! assert_eq!(y, q.min());
//! assert_eq!(q.stats().pos, 1);
//!
//! // Render the same word as two's complement binary
//! let mut codec = NumberBaseCodec::new(q.config().clone().with_base(NumberBase::Bin)).unwrap();
//! assert_eq!(codec.to_text(-2.0), "10.000000");
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod filters;
pub mod format;
pub mod observe;
pub mod qconfig;
pub mod quantizer;
pub mod sample;

pub use codec::NumberBaseCodec;
pub use config::FxsimConfig;
pub use error::{FxError, FxResult};
pub use filters::{Coefficients, FilterQuantParams, QuantizedIirFilter};
pub use format::{NumberBase, NumericFormat, OverflowMode, QuantMode, Scaling, WordAdaptMode};
pub use qconfig::{ConfigUpdate, QuantRange, QuantizationConfig};
pub use quantizer::{FixedPointQuantizer, OverflowFlag, OverflowStats};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::codec::NumberBaseCodec;
    pub use crate::error::{FxError, FxResult};
    pub use crate::filters::{
        Coefficients, FilterQuantParams, FixpFilter, FrequencyResponse, QuantizedIirFilter, Stimulus,
    };
    pub use crate::format::{NumberBase, NumericFormat, OverflowMode, QuantMode, Scaling};
    pub use crate::qconfig::{ConfigUpdate, QuantizationConfig};
    pub use crate::quantizer::{FixedPointQuantizer, OverflowStats};
    pub use crate::sample::RealValue;
}
