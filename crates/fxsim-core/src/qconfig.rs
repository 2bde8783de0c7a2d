//! # Quantizer Configuration
//!
//! [`QuantizationConfig`] is the explicit, owned description of one signed
//! Q-format word: integer bits `WI`, fractional bits `WF`, guard bits `WG`
//! and the rounding, overflow, format and display settings. Derived values
//! (LSB, MSB, MIN, MAX, scale) live in [`QuantRange`].
//!
//! Partial updates go through [`ConfigUpdate`], which is built from typed
//! setters, from string key/value pairs or from a YAML mapping. Applying an
//! update validates a candidate first and only then replaces the config, so
//! a rejected update leaves the previous settings intact.
//!
//! ## Example
//!
//! ```rust
//! use fxsim_core::qconfig::{ConfigUpdate, QuantizationConfig};
//!
//! let mut cfg = QuantizationConfig::default();
//! let update = ConfigUpdate::from_pairs([("WI", "1"), ("WF", "6"), ("ovfl", "wrap")]).unwrap();
//! cfg.apply(&update).unwrap();
//! assert_eq!(cfg.q_string(), "1.6");
//! assert_eq!(cfg.range().max, 2.0 - 1.0 / 64.0);
//! ```

use crate::error::{FxError, FxResult};
use crate::format::{NumberBase, NumericFormat, OverflowMode, QuantMode, WordAdaptMode};
use serde::{Deserialize, Serialize};

/// Maximum word length `WG + WI + WF + 1` in bits.
pub const MAX_WORD_LENGTH: u32 = 64;

/// Recognized configuration keys.
pub const CONFIG_KEYS: [&str; 8] = ["WI", "WF", "WG", "quant", "ovfl", "numeric_format", "base", "w_a_m"];

/// Settings of one fixed-point quantizer.
///
/// Deserialization goes through [`ConfigUpdate`]: missing keys keep their
/// defaults, unknown keys are logged and ignored, negative bit counts are
/// taken by absolute value and the word length is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "serde_yaml::Mapping")]
pub struct QuantizationConfig {
    /// Integer bits, sign bit excluded
    #[serde(rename = "WI")]
    pub wi: u32,
    /// Fractional bits
    #[serde(rename = "WF")]
    pub wf: u32,
    /// Guard bits above WI
    #[serde(rename = "WG")]
    pub wg: u32,
    /// Requantization mode
    pub quant: QuantMode,
    /// Overflow mode
    pub ovfl: OverflowMode,
    /// Integer or fractional interpretation
    pub numeric_format: NumericFormat,
    /// Text base used by the codec
    pub base: NumberBase,
    /// Word-growth adaptation
    pub w_a_m: WordAdaptMode,
}

impl Default for QuantizationConfig {
    fn default() -> Self {
        Self {
            wi: 0,
            wf: 15,
            wg: 0,
            quant: QuantMode::Round,
            ovfl: OverflowMode::Saturate,
            numeric_format: NumericFormat::Fractional,
            base: NumberBase::Dec,
            w_a_m: WordAdaptMode::Manual,
        }
    }
}

/// Values derived from a [`QuantizationConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantRange {
    /// Weight of the least significant bit
    pub lsb: f64,
    /// Weight of the most significant bit below the sign
    pub msb: f64,
    /// Most negative representable value, `-2·MSB`
    pub min: f64,
    /// Most positive representable value, `2·MSB - LSB`
    pub max: f64,
    /// Input/output scaling factor, `2^WF` for integer format, else 1
    pub scale: f64,
}

impl QuantizationConfig {
    /// Config with the given integer and fractional bits, other settings default.
    pub fn new(wi: u32, wf: u32) -> Self {
        Self {
            wi,
            wf,
            ..Default::default()
        }
    }

    pub fn with_quant(mut self, quant: QuantMode) -> Self {
        self.quant = quant;
        self
    }

    pub fn with_ovfl(mut self, ovfl: OverflowMode) -> Self {
        self.ovfl = ovfl;
        self
    }

    pub fn with_format(mut self, numeric_format: NumericFormat) -> Self {
        self.numeric_format = numeric_format;
        self
    }

    pub fn with_base(mut self, base: NumberBase) -> Self {
        self.base = base;
        self
    }

    pub fn with_guard_bits(mut self, wg: u32) -> Self {
        self.wg = wg;
        self
    }

    /// Default config with `pairs` applied.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> FxResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut cfg = Self::default();
        cfg.apply(&ConfigUpdate::from_pairs(pairs)?)?;
        Ok(cfg)
    }

    /// Total word length `WG + WI + WF + 1`.
    pub fn word_length(&self) -> u32 {
        self.wg
            .saturating_add(self.wi)
            .saturating_add(self.wf)
            .saturating_add(1)
    }

    /// Sign and integer bits, the width checked when parsing two's complement text.
    pub fn integer_word_length(&self) -> u32 {
        match self.numeric_format {
            NumericFormat::Integer => self.word_length(),
            _ => self.wg + self.wi + 1,
        }
    }

    /// The `"WI.WF"` label.
    pub fn q_string(&self) -> String {
        format!("{}.{}", self.wi, self.wf)
    }

    pub fn is_integer(&self) -> bool {
        self.numeric_format == NumericFormat::Integer
    }

    /// Derived LSB, MSB, MIN, MAX and scale.
    pub fn range(&self) -> QuantRange {
        let (lsb, int_bits, scale) = match self.numeric_format {
            NumericFormat::Integer => (1.0, self.wg + self.wi + self.wf, pow2(self.wf as i32)),
            _ => (pow2(-(self.wf as i32)), self.wg + self.wi, 1.0),
        };
        let msb = pow2(int_bits as i32 - 1);
        QuantRange {
            lsb,
            msb,
            min: -2.0 * msb,
            max: 2.0 * msb - lsb,
            scale,
        }
    }

    /// Display width of a rendered value in the configured base.
    pub fn places(&self) -> usize {
        if self.numeric_format == NumericFormat::Float {
            return 4;
        }
        let w = self.word_length() as f64;
        let places = match self.base {
            NumberBase::Dec => (w * std::f64::consts::LOG10_2).ceil() + 1.0,
            NumberBase::Bin => w + 1.0,
            NumberBase::Hex => (w / 4.0).ceil() + 1.0,
            NumberBase::Csd => (w / 1.5).ceil() + 1.0,
        };
        places as usize
    }

    /// Check invariants.
    pub fn validate(&self) -> FxResult<()> {
        let bits = self.word_length();
        if bits > MAX_WORD_LENGTH {
            return Err(FxError::WordLength {
                bits,
                max: MAX_WORD_LENGTH,
            });
        }
        Ok(())
    }

    /// Apply a partial update. The config is left untouched on error.
    pub fn apply(&mut self, update: &ConfigUpdate) -> FxResult<()> {
        let mut candidate = self.clone();
        if let Some(wi) = update.wi {
            candidate.wi = wi;
        }
        if let Some(wf) = update.wf {
            candidate.wf = wf;
        }
        if let Some(wg) = update.wg {
            candidate.wg = wg;
        }
        if let Some(quant) = update.quant {
            candidate.quant = quant;
        }
        if let Some(ovfl) = update.ovfl {
            candidate.ovfl = ovfl;
        }
        if let Some(fmt) = update.numeric_format {
            candidate.numeric_format = fmt;
        }
        if let Some(base) = update.base {
            candidate.base = base;
        }
        if let Some(w_a_m) = update.w_a_m {
            candidate.w_a_m = w_a_m;
        }
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }
}

/// Exact power of two for the exponent ranges used here.
#[inline]
pub(crate) fn pow2(exp: i32) -> f64 {
    2f64.powi(exp)
}

/// A partial [`QuantizationConfig`]; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub wi: Option<u32>,
    pub wf: Option<u32>,
    pub wg: Option<u32>,
    pub quant: Option<QuantMode>,
    pub ovfl: Option<OverflowMode>,
    pub numeric_format: Option<NumericFormat>,
    pub base: Option<NumberBase>,
    pub w_a_m: Option<WordAdaptMode>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wi(mut self, wi: u32) -> Self {
        self.wi = Some(wi);
        self
    }

    pub fn wf(mut self, wf: u32) -> Self {
        self.wf = Some(wf);
        self
    }

    pub fn wg(mut self, wg: u32) -> Self {
        self.wg = Some(wg);
        self
    }

    pub fn quant(mut self, quant: QuantMode) -> Self {
        self.quant = Some(quant);
        self
    }

    pub fn ovfl(mut self, ovfl: OverflowMode) -> Self {
        self.ovfl = Some(ovfl);
        self
    }

    pub fn numeric_format(mut self, fmt: NumericFormat) -> Self {
        self.numeric_format = Some(fmt);
        self
    }

    pub fn base(mut self, base: NumberBase) -> Self {
        self.base = Some(base);
        self
    }

    pub fn w_a_m(mut self, w_a_m: WordAdaptMode) -> Self {
        self.w_a_m = Some(w_a_m);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build an update from string key/value pairs.
    ///
    /// Bit counts accept signed integers; the absolute value is used.
    /// Unknown keys are logged and ignored, invalid values are errors.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> FxResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut update = Self::default();
        for (key, value) in pairs {
            update.set(key.as_ref(), value.as_ref())?;
        }
        Ok(update)
    }

    /// Build an update from a YAML mapping such as `{WI: 3, quant: floor}`.
    pub fn from_yaml(yaml: &str) -> FxResult<Self> {
        let mapping: serde_yaml::Mapping =
            serde_yaml::from_str(yaml).map_err(|e| FxError::ConfigParse(e.to_string()))?;
        Self::from_mapping(&mapping)
    }

    /// Build an update from a parsed YAML mapping.
    ///
    /// Unknown keys may carry any value, known keys need a scalar.
    pub fn from_mapping(mapping: &serde_yaml::Mapping) -> FxResult<Self> {
        let mut update = Self::default();
        for (key, value) in mapping {
            let key = yaml_scalar(key).ok_or_else(|| FxError::invalid_value("<key>", format!("{:?}", key)))?;
            if !CONFIG_KEYS.contains(&key.as_str()) {
                tracing::warn!(key, "Unknown quantizer config key, ignored");
                continue;
            }
            let value = yaml_scalar(value).ok_or_else(|| FxError::invalid_value(&key, format!("{:?}", value)))?;
            update.set(&key, &value)?;
        }
        Ok(update)
    }

    fn set(&mut self, key: &str, value: &str) -> FxResult<()> {
        match key {
            "WI" => self.wi = Some(parse_bits(key, value)?),
            "WF" => self.wf = Some(parse_bits(key, value)?),
            "WG" => self.wg = Some(parse_bits(key, value)?),
            "quant" => self.quant = Some(value.parse()?),
            "ovfl" => self.ovfl = Some(value.parse()?),
            "numeric_format" => self.numeric_format = Some(value.parse()?),
            "base" => self.base = Some(value.parse()?),
            "w_a_m" => self.w_a_m = Some(value.parse()?),
            _ => tracing::warn!(key, value, "Unknown quantizer config key, ignored"),
        }
        Ok(())
    }
}

impl TryFrom<serde_yaml::Mapping> for QuantizationConfig {
    type Error = FxError;

    fn try_from(mapping: serde_yaml::Mapping) -> FxResult<Self> {
        let mut config = Self::default();
        config.apply(&ConfigUpdate::from_mapping(&mapping)?)?;
        Ok(config)
    }
}

fn parse_bits(key: &str, value: &str) -> FxResult<u32> {
    let bits: i64 = value
        .trim()
        .parse()
        .map_err(|_| FxError::invalid_value(key, value))?;
    u32::try_from(bits.unsigned_abs()).map_err(|_| FxError::invalid_value(key, value))
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
