//! Closed sets of quantizer settings.
//!
//! Every setting that used to travel as a free-form string is an enum here.
//! The textual names (`"round"`, `"sat"`, `"qfrac"`, ...) are accepted by
//! [`std::str::FromStr`] and by serde, so YAML files and key/value updates
//! keep their familiar spelling while invalid names fail at parse time.
//!
//! # Example
//!
//! ```rust
//! use fxsim_core::format::{OverflowMode, QuantMode};
//!
//! let quant: QuantMode = "fix".parse().unwrap();
//! assert_eq!(quant, QuantMode::Fix);
//! assert_eq!("sat".parse::<OverflowMode>().unwrap(), OverflowMode::Saturate);
//! assert!("nearest".parse::<QuantMode>().is_err());
//! ```

use crate::error::FxError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn normalize(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

/// Requantization (rounding) mode applied on the LSB grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuantMode {
    /// Round toward negative infinity
    #[serde(rename = "floor")]
    Floor,
    /// Round to nearest, ties to even
    #[default]
    #[serde(rename = "round")]
    Round,
    /// Truncate toward zero
    #[serde(rename = "fix")]
    Fix,
    /// Round toward positive infinity
    #[serde(rename = "ceil")]
    Ceil,
    /// Round to nearest integer (same grid behavior as `Round`)
    #[serde(rename = "rint")]
    Rint,
    /// No requantization
    #[serde(rename = "none")]
    None,
    /// First-order error-feedback (delta-sigma) rounding
    #[serde(rename = "dsm")]
    DeltaSigma,
}

impl QuantMode {
    /// Whether the result lies on the LSB grid.
    pub fn is_grid_quantizing(&self) -> bool {
        !matches!(self, QuantMode::None)
    }

    /// Whether the result depends on previously quantized samples.
    pub fn is_stateful(&self) -> bool {
        matches!(self, QuantMode::DeltaSigma)
    }
}

impl fmt::Display for QuantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuantMode::Floor => "floor",
            QuantMode::Round => "round",
            QuantMode::Fix => "fix",
            QuantMode::Ceil => "ceil",
            QuantMode::Rint => "rint",
            QuantMode::None => "none",
            QuantMode::DeltaSigma => "dsm",
        };
        f.write_str(name)
    }
}

impl FromStr for QuantMode {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "floor" => Ok(QuantMode::Floor),
            "round" => Ok(QuantMode::Round),
            "fix" | "trunc" => Ok(QuantMode::Fix),
            "ceil" => Ok(QuantMode::Ceil),
            "rint" => Ok(QuantMode::Rint),
            "none" => Ok(QuantMode::None),
            "dsm" => Ok(QuantMode::DeltaSigma),
            _ => Err(FxError::UnknownQuantMode(s.to_string())),
        }
    }
}

/// Handling of values outside `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OverflowMode {
    /// Two's complement wrap-around
    #[serde(rename = "wrap")]
    Wrap,
    /// Clamp to MIN / MAX
    #[default]
    #[serde(rename = "sat", alias = "saturate")]
    Saturate,
    /// No overflow handling, values pass unchanged and are not counted
    #[serde(rename = "none")]
    None,
}

impl fmt::Display for OverflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverflowMode::Wrap => "wrap",
            OverflowMode::Saturate => "sat",
            OverflowMode::None => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for OverflowMode {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "wrap" => Ok(OverflowMode::Wrap),
            "sat" | "saturate" => Ok(OverflowMode::Saturate),
            "none" => Ok(OverflowMode::None),
            _ => Err(FxError::UnknownOverflowMode(s.to_string())),
        }
    }
}

/// Interpretation of a fixed-point word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NumericFormat {
    /// Unquantized display; quantizes like `Fractional`
    #[serde(rename = "float")]
    Float,
    /// Integer counts of LSB units (LSB = 1, scale = 2^WF)
    #[serde(rename = "qint", alias = "integer")]
    Integer,
    /// Fractional values (LSB = 2^-WF)
    #[default]
    #[serde(rename = "qfrac", alias = "fractional")]
    Fractional,
}

impl fmt::Display for NumericFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumericFormat::Float => "float",
            NumericFormat::Integer => "qint",
            NumericFormat::Fractional => "qfrac",
        };
        f.write_str(name)
    }
}

impl FromStr for NumericFormat {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "float" => Ok(NumericFormat::Float),
            "qint" | "int" | "integer" => Ok(NumericFormat::Integer),
            "qfrac" | "frac" | "fractional" => Ok(NumericFormat::Fractional),
            _ => Err(FxError::UnknownNumericFormat(s.to_string())),
        }
    }
}

/// Text representation used by the number-base codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberBase {
    /// Scaled decimal
    #[default]
    Dec,
    /// Two's complement binary
    Bin,
    /// Two's complement hexadecimal
    Hex,
    /// Canonical signed digit
    Csd,
}

impl NumberBase {
    /// Whether `c` may appear in text of this base; everything else is stripped.
    pub fn is_legal_char(&self, c: char) -> bool {
        match self {
            NumberBase::Dec => c.is_ascii_digit() || matches!(c, 'E' | 'e' | '.' | ',' | '-'),
            NumberBase::Bin => matches!(c, '0' | '1' | '.' | ',' | '-'),
            NumberBase::Hex => c.is_ascii_hexdigit() || matches!(c, '.' | ',' | '-'),
            NumberBase::Csd => matches!(c, '0' | '+' | '-' | '.' | ','),
        }
    }
}

impl fmt::Display for NumberBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumberBase::Dec => "dec",
            NumberBase::Bin => "bin",
            NumberBase::Hex => "hex",
            NumberBase::Csd => "csd",
        };
        f.write_str(name)
    }
}

impl FromStr for NumberBase {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "dec" => Ok(NumberBase::Dec),
            "bin" => Ok(NumberBase::Bin),
            "hex" => Ok(NumberBase::Hex),
            "csd" => Ok(NumberBase::Csd),
            _ => Err(FxError::UnknownBase(s.to_string())),
        }
    }
}

/// Word-growth adaptation of a quantizer inside a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WordAdaptMode {
    /// Word length derived from the other quantizers
    #[serde(rename = "a", alias = "auto")]
    Auto,
    /// Word length set by the user
    #[default]
    #[serde(rename = "m", alias = "manual")]
    Manual,
    /// Word length fixed by the implementation
    #[serde(rename = "f", alias = "fixed")]
    Fixed,
}

impl fmt::Display for WordAdaptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WordAdaptMode::Auto => "a",
            WordAdaptMode::Manual => "m",
            WordAdaptMode::Fixed => "f",
        };
        f.write_str(name)
    }
}

impl FromStr for WordAdaptMode {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "a" | "auto" => Ok(WordAdaptMode::Auto),
            "m" | "manual" => Ok(WordAdaptMode::Manual),
            "f" | "fixed" => Ok(WordAdaptMode::Fixed),
            _ => Err(FxError::UnknownWordAdaptMode(s.to_string())),
        }
    }
}

/// Scaling applied around requantization.
///
/// `Multiply` converts a real value into the quantizer's native domain before
/// rounding (integer counts for [`NumericFormat::Integer`]), `Divide` converts
/// the result back afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scaling {
    /// Neither multiply nor divide
    None,
    /// Multiply by `scale` before requantizing
    #[default]
    Multiply,
    /// Divide by `scale` after requantizing
    Divide,
    /// Both
    MultiplyDivide,
}

impl Scaling {
    #[inline]
    pub fn multiplies(&self) -> bool {
        matches!(self, Scaling::Multiply | Scaling::MultiplyDivide)
    }

    #[inline]
    pub fn divides(&self) -> bool {
        matches!(self, Scaling::Divide | Scaling::MultiplyDivide)
    }
}
