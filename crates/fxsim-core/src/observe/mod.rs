//! # Observability
//!
//! The simulation reports through `tracing` events; overflow is also
//! counted in [`OverflowStats`](crate::quantizer::OverflowStats) so callers
//! do not depend on a subscriber to see it.
//!
//! ```text
//! FixedPointQuantizer ─┐   debug: reconfigured
//! QuantizedIirFilter ──┼── warn:  overflow, resized registers   ──> LogConfig ──> stdout / file
//! RealValue coercion ──┘   warn:  non-numeric or complex input
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
