//! # Number-Base Codec
//!
//! Renders quantized values as fixed-point text and parses such text back.
//! All rounding and overflow handling is delegated to the owned
//! [`FixedPointQuantizer`], so text produced here is always a grid value of
//! the configured Q-format.
//!
//! | Base  | Fractional `Q1.3`, value `-0.625` | Integer `Q1.3`, value `-0.625` |
//! |-------|-----------------------------------|--------------------------------|
//! | `dec` | `-0.625`                          | `-5`                           |
//! | `bin` | `11.011`                          | `11011`                        |
//! | `hex` | `3.6`                             | `1B`                           |
//! | `csd` | `0.-0-`                           | `-0-`                          |
//!
//! Text is parsed leniently: characters that cannot occur in the base are
//! dropped, `,` is accepted as radix point and leading zeros are ignored.
//! Two's complement text wider than the configured word loses its excess
//! most significant bits.
//!
//! ## Example
//!
//! ```rust
//! use fxsim_core::codec::NumberBaseCodec;
//! use fxsim_core::format::NumberBase;
//! use fxsim_core::qconfig::QuantizationConfig;
//!
//! let cfg = QuantizationConfig::new(0, 3).with_base(NumberBase::Bin);
//! let mut codec = NumberBaseCodec::new(cfg).unwrap();
//! assert_eq!(codec.to_text(-0.5), "1.100");
//! assert_eq!(codec.from_text("1.100"), -0.5);
//! ```

use crate::error::FxResult;
use crate::format::{NumberBase, NumericFormat, Scaling};
use crate::qconfig::{pow2, QuantizationConfig, MAX_WORD_LENGTH};
use crate::quantizer::FixedPointQuantizer;
use crate::sample::parse_real;

/// Converts between real values and fixed-point text.
#[derive(Debug, Clone, Default)]
pub struct NumberBaseCodec {
    quantizer: FixedPointQuantizer,
}

impl NumberBaseCodec {
    pub fn new(config: QuantizationConfig) -> FxResult<Self> {
        Ok(Self::from_quantizer(FixedPointQuantizer::new(config)?))
    }

    pub fn from_quantizer(quantizer: FixedPointQuantizer) -> Self {
        Self { quantizer }
    }

    pub fn quantizer(&self) -> &FixedPointQuantizer {
        &self.quantizer
    }

    pub fn quantizer_mut(&mut self) -> &mut FixedPointQuantizer {
        &mut self.quantizer
    }

    pub fn into_quantizer(self) -> FixedPointQuantizer {
        self.quantizer
    }

    pub fn config(&self) -> &QuantizationConfig {
        self.quantizer.config()
    }

    /// Render `value` in the configured base and format.
    pub fn to_text(&mut self, value: f64) -> String {
        let cfg = self.quantizer.config().clone();
        if cfg.numeric_format == NumericFormat::Float {
            return value.to_string();
        }

        let y_fix = self.quantizer.quantize(value, Scaling::Multiply);
        match cfg.base {
            NumberBase::Dec => {
                if cfg.wf == 0 || cfg.is_integer() {
                    (y_fix as i64).to_string()
                } else {
                    y_fix.to_string()
                }
            }
            NumberBase::Bin => {
                let bits = self.word_bits(y_fix, &cfg);
                if cfg.is_integer() {
                    bits
                } else {
                    let split = ((cfg.wg + cfg.wi + 1) as usize).min(bits.len());
                    format!("{}.{}", &bits[..split], &bits[split..])
                }
            }
            NumberBase::Hex => {
                let bits = self.word_bits(y_fix, &cfg);
                let int_bits = if cfg.is_integer() {
                    cfg.word_length()
                } else {
                    cfg.wg + cfg.wi
                };
                bin_to_hex(&bits, int_bits as usize)
            }
            NumberBase::Csd => {
                let wf = if cfg.is_integer() { 0 } else { cfg.wf };
                dec_to_csd(y_fix, wf)
            }
        }
    }

    /// Render every value; the output has the same length.
    pub fn to_text_slice(&mut self, values: &[f64]) -> Vec<String> {
        values.iter().map(|&v| self.to_text(v)).collect()
    }

    /// Parse fixed-point text in the configured base and format.
    ///
    /// Malformed text yields `0.0` and a warning.
    pub fn from_text(&mut self, text: &str) -> f64 {
        let cfg = self.quantizer.config().clone();
        if cfg.numeric_format == NumericFormat::Float {
            return parse_real(text);
        }

        let base = cfg.base;
        let legal: String = text.chars().filter(|c| base.is_legal_char(*c)).collect();
        let mut cleaned = legal.trim_start_matches('0').replace(',', ".");
        if cleaned.is_empty() {
            return 0.0;
        }
        if cleaned.starts_with('.') {
            cleaned.insert(0, '0');
        }

        let frac_places = match cleaned.split('.').collect::<Vec<_>>().as_slice() {
            [_, frac] => frac.len(),
            _ => 0,
        };
        let raw = cleaned.replace('.', "");

        match base {
            NumberBase::Dec => {
                let value = parse_real(&cleaned);
                self.quantizer.quantize(value, Scaling::Divide)
            }
            NumberBase::Bin | NumberBase::Hex => self.parse_twos_complement(&raw, frac_places, &cfg),
            NumberBase::Csd => {
                let value = csd_to_dec(&raw) / pow2(frac_places as i32);
                self.quantizer.quantize(value, Scaling::Divide)
            }
        }
    }

    /// Parse every text; the output has the same length.
    pub fn from_text_slice<S: AsRef<str>>(&mut self, texts: &[S]) -> Vec<f64> {
        texts.iter().map(|t| self.from_text(t.as_ref())).collect()
    }

    fn word_bits(&self, y_fix: f64, cfg: &QuantizationConfig) -> String {
        let count = (y_fix / self.quantizer.lsb()).round_ties_even() as i64;
        binary_repr(count, cfg.word_length() as usize)
    }

    fn parse_twos_complement(&mut self, raw: &str, frac_places: usize, cfg: &QuantizationConfig) -> f64 {
        let (radix, bits_per_digit) = match cfg.base {
            NumberBase::Hex => (16, 4),
            _ => (2, 1),
        };
        let width = cfg.integer_word_length() as usize;
        let negative = raw.starts_with('-');
        let digits = raw.trim_start_matches('-');

        // digits above the word are discarded before parsing
        let frac_bits = frac_places * bits_per_digit;
        let keep = (width + frac_bits).div_ceil(bits_per_digit);
        let digits = &digits[digits.len().saturating_sub(keep)..];

        let mut magnitude = match u128::from_str_radix(digits, radix) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(text = raw, base = %cfg.base, error = %e, "Cannot parse fixed-point text, using 0");
                return 0.0;
            }
        };
        if magnitude == 0 {
            return 0.0;
        }

        let mut int_bits = bit_length(magnitude).saturating_sub(frac_bits);
        if int_bits > width {
            // discard MSBs beyond the word
            magnitude &= 1u128
                .checked_shl((width + frac_bits) as u32)
                .map_or(u128::MAX, |bit| bit - 1);
            if magnitude == 0 {
                return 0.0;
            }
            int_bits = bit_length(magnitude).saturating_sub(frac_bits);
        }

        let mut value = magnitude as f64 / pow2(frac_bits as i32);
        if int_bits == width {
            value -= pow2(width as i32);
        }
        if negative {
            value = -value;
        }
        self.quantizer.quantize(value, Scaling::Divide)
    }
}

fn bit_length(value: u128) -> usize {
    (u128::BITS - value.leading_zeros()) as usize
}

/// Two's complement binary string of `value`, `width` bits wide.
///
/// Values that do not fit are reduced modulo `2^width`.
pub fn binary_repr(value: i64, width: usize) -> String {
    let width = width.min(MAX_WORD_LENGTH as usize);
    if width == 0 {
        return String::new();
    }
    let wrapped = i128::from(value).rem_euclid(1i128 << width);
    format!("{:0width$b}", wrapped, width = width)
}

fn nibble_char(bits: &str) -> char {
    let v = bits.bytes().fold(0u32, |acc, b| (acc << 1) | u32::from(b == b'1'));
    char::from_digit(v, 16).map_or('0', |c| c.to_ascii_uppercase())
}

fn nibbles_to_hex(bits: &str, out: &mut String) {
    for chunk in bits.as_bytes().chunks(4) {
        // chunks of an ASCII string are valid UTF-8
        out.push(nibble_char(std::str::from_utf8(chunk).unwrap_or("0")));
    }
}

/// Convert a two's complement binary string with `int_bits` integer bits
/// below the sign bit into hexadecimal.
///
/// The integer part (sign included) is zero-padded on the left, the
/// fractional part on the right, to whole nibbles. Without integer bits
/// the sign bit itself is the integer digit.
pub fn bin_to_hex(bits: &str, int_bits: usize) -> String {
    let split = (int_bits + 1).min(bits.len());
    let mut hex = String::with_capacity(bits.len() / 4 + 3);

    if int_bits > 0 {
        let int_part = &bits[..split];
        let pad = (4 - int_part.len() % 4) % 4;
        nibbles_to_hex(&format!("{}{}", "0".repeat(pad), int_part), &mut hex);
    } else {
        hex.push(bits.chars().next().unwrap_or('0'));
    }

    let frac_part = &bits[split..];
    if !frac_part.is_empty() {
        let pad = (4 - frac_part.len() % 4) % 4;
        hex.push('.');
        nibbles_to_hex(&format!("{}{}", frac_part, "0".repeat(pad)), &mut hex);
    }
    hex
}

/// Two's complement hexadecimal of `value` in an `nbits` wide word.
pub fn dec_to_hex(value: i64, nbits: u32) -> String {
    let nbits = nbits.clamp(1, MAX_WORD_LENGTH);
    let wrapped = i128::from(value).rem_euclid(1i128 << nbits);
    format!("{:X}", wrapped)
}

/// Canonical signed digit representation of `value` with `wf` fractional digits.
///
/// The digit string is the non-adjacent form of `value·2^wf` (rounded to an
/// integer): digits are `+`, `-` or `0`, no two neighbours are non-zero and
/// the number of non-zero digits is minimal. At least one integer digit is
/// printed; a radix point separates the `wf` fractional digits. Zero is `"0"`.
///
/// Non-finite values and magnitudes beyond `2^126` LSBs yield `"0"` with a
/// warning.
pub fn dec_to_csd(value: f64, wf: u32) -> String {
    let scaled = (value * pow2(wf as i32)).round();
    if !scaled.is_finite() || scaled.abs() >= pow2(126) {
        tracing::warn!(value, wf, "Value out of CSD range, using 0");
        return "0".to_string();
    }
    let mut n = scaled as i128;
    if n == 0 {
        return "0".to_string();
    }

    // least significant digit first
    let mut digits: Vec<i8> = Vec::new();
    while n != 0 {
        if n & 1 == 1 {
            let d = 2 - n.rem_euclid(4);
            digits.push(d as i8);
            n -= d;
        } else {
            digits.push(0);
        }
        n /= 2;
    }

    let wf = wf as usize;
    let top = digits.len().max(wf + 1);
    let mut csd = String::with_capacity(top + 1);
    for pos in (0..top).rev() {
        csd.push(match digits.get(pos) {
            Some(1) => '+',
            Some(-1) => '-',
            _ => '0',
        });
        if pos == wf && wf > 0 {
            csd.push('.');
        }
    }
    csd
}

/// Integer value of a CSD digit string without radix point.
///
/// Every character occupies one position; `+` and `-` contribute
/// `±2^position` counted from the least significant (rightmost) place.
pub fn csd_to_dec(csd: &str) -> f64 {
    let len = csd.chars().count();
    csd.chars().enumerate().fold(0.0, |acc, (i, c)| {
        let weight = pow2((len - 1 - i) as i32);
        match c {
            '+' => acc + weight,
            '-' => acc - weight,
            _ => acc,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{OverflowMode, QuantMode};
    use proptest::prelude::*;

    fn codec(wi: u32, wf: u32, base: NumberBase, fmt: NumericFormat) -> NumberBaseCodec {
        let cfg = QuantizationConfig::new(wi, wf).with_base(base).with_format(fmt);
        NumberBaseCodec::new(cfg).unwrap()
    }

    #[test]
    fn test_binary_repr() {
        assert_eq!(binary_repr(-3, 4), "1101");
        assert_eq!(binary_repr(5, 4), "0101");
        assert_eq!(binary_repr(-64, 7), "1000000");
        assert_eq!(binary_repr(17, 4), "0001");
        assert_eq!(binary_repr(3, 0), "");
    }

    #[test]
    fn test_bin_to_hex() {
        assert_eq!(bin_to_hex("1111111", 6), "7F");
        assert_eq!(bin_to_hex("0111", 3), "7");
        assert_eq!(bin_to_hex("1111111", 0), "1.FC");
        assert_eq!(bin_to_hex("1000000", 0), "1.00");
        assert_eq!(bin_to_hex("1001", 2), "4.8");
        assert_eq!(bin_to_hex("11011", 5), "1B");
    }

    #[test]
    fn test_dec_to_hex() {
        assert_eq!(dec_to_hex(-1, 8), "FF");
        assert_eq!(dec_to_hex(5, 8), "5");
        assert_eq!(dec_to_hex(-128, 8), "80");
        assert_eq!(dec_to_hex(256, 8), "0");
    }

    #[test]
    fn test_dec_to_csd() {
        assert_eq!(dec_to_csd(0.0, 4), "0");
        assert_eq!(dec_to_csd(7.0, 0), "+00-");
        assert_eq!(dec_to_csd(63.0, 0), "+00000-");
        assert_eq!(dec_to_csd(-64.0, 0), "-000000");
        assert_eq!(dec_to_csd(1.0, 0), "+");
        assert_eq!(dec_to_csd(-1.0, 6), "-.000000");
        assert_eq!(dec_to_csd(1.0 / 64.0, 6), "0.00000+");
        assert_eq!(dec_to_csd(0.5, 3), "0.+00");
        assert_eq!(dec_to_csd(0.75, 3), "+.0-0");
        assert_eq!(dec_to_csd(-0.625, 3), "0.-0-");
    }

    #[test]
    fn test_csd_out_of_range_is_zero() {
        assert_eq!(dec_to_csd(f64::INFINITY, 2), "0");
        assert_eq!(dec_to_csd(f64::NAN, 2), "0");
        assert_eq!(dec_to_csd(-1e40, 0), "0");

        let cfg = QuantizationConfig::new(3, 2)
            .with_base(NumberBase::Csd)
            .with_ovfl(OverflowMode::None);
        let mut c = NumberBaseCodec::new(cfg).unwrap();
        assert_eq!(c.to_text(1e40), "0");
        assert_eq!(c.to_text(-2.25), "-0.0-");
    }

    #[test]
    fn test_csd_has_no_adjacent_nonzero_digits() {
        for n in -300i32..300 {
            let csd = dec_to_csd(f64::from(n), 0);
            let bytes = csd.as_bytes();
            assert!(
                bytes.windows(2).all(|w| w[0] == b'0' || w[1] == b'0'),
                "{n}: {csd}"
            );
            assert_eq!(csd_to_dec(&csd), f64::from(n));
        }
    }

    #[test]
    fn test_csd_to_dec() {
        assert_eq!(csd_to_dec("+00-"), 7.0);
        assert_eq!(csd_to_dec("-0+"), -3.0);
        assert_eq!(csd_to_dec("0"), 0.0);
        assert_eq!(csd_to_dec(""), 0.0);
    }

    #[test]
    fn test_to_text_fractional() {
        let mut c = codec(1, 3, NumberBase::Dec, NumericFormat::Fractional);
        assert_eq!(c.to_text(-0.625), "-0.625");
        assert_eq!(c.to_text(1.0), "1");
        let mut c = codec(1, 3, NumberBase::Bin, NumericFormat::Fractional);
        assert_eq!(c.to_text(-0.625), "11.011");
        assert_eq!(c.to_text(0.5), "00.100");
        let mut c = codec(1, 3, NumberBase::Hex, NumericFormat::Fractional);
        assert_eq!(c.to_text(-0.625), "3.6");
        let mut c = codec(1, 3, NumberBase::Csd, NumericFormat::Fractional);
        assert_eq!(c.to_text(-0.625), "0.-0-");
        assert_eq!(c.from_text("0.-0-"), -0.625);
    }

    #[test]
    fn test_to_text_integer() {
        let mut c = codec(1, 3, NumberBase::Dec, NumericFormat::Integer);
        assert_eq!(c.to_text(-0.625), "-5");
        let mut c = codec(1, 3, NumberBase::Bin, NumericFormat::Integer);
        assert_eq!(c.to_text(-0.625), "11011");
        let mut c = codec(1, 3, NumberBase::Hex, NumericFormat::Integer);
        assert_eq!(c.to_text(-0.625), "1B");
        let mut c = codec(1, 3, NumberBase::Csd, NumericFormat::Integer);
        assert_eq!(c.to_text(-0.625), "-0-");
    }

    #[test]
    fn test_to_text_hex_saturates_first() {
        let mut c = codec(6, 0, NumberBase::Hex, NumericFormat::Fractional);
        assert_eq!(c.to_text(-1.0), "7F");
        assert_eq!(c.to_text(1000.0), "3F");
        assert_eq!(c.quantizer().stats().pos, 1);
        let mut c = codec(0, 6, NumberBase::Hex, NumericFormat::Fractional);
        assert_eq!(c.to_text(-1.0 / 64.0), "1.FC");
        assert_eq!(c.to_text(-1.0), "1.00");
    }

    #[test]
    fn test_float_format_passthrough() {
        let mut c = codec(0, 3, NumberBase::Bin, NumericFormat::Float);
        assert_eq!(c.to_text(0.1), "0.1");
        assert_eq!(c.from_text("0.1"), 0.1);
        assert_eq!(c.from_text("2.5+1j"), 2.5);
        assert_eq!(c.from_text("garbage"), 0.0);
    }

    #[test]
    fn test_parse_binary_truncates_msbs() {
        let mut c = codec(0, 3, NumberBase::Bin, NumericFormat::Fractional);
        assert_eq!(c.from_text("1.100"), -0.5);
        assert_eq!(c.from_text("11.000"), -1.0);
        assert_eq!(c.from_text("100.000"), 0.0);
        assert_eq!(c.from_text("0.100"), 0.5);
        assert_eq!(c.from_text(" 0.1x00 "), 0.5);
        assert_eq!(c.from_text("-0.100"), -0.5);
    }

    #[test]
    fn test_parse_text_wider_than_u128() {
        let mut c = codec(0, 3, NumberBase::Bin, NumericFormat::Fractional);
        let wide = format!("1{}1.100", "0".repeat(130));
        assert_eq!(c.from_text(&wide), -0.5);
        let wide = format!("1{}0.100", "0".repeat(130));
        assert_eq!(c.from_text(&wide), 0.5);

        let mut c = codec(3, 4, NumberBase::Hex, NumericFormat::Fractional);
        let wide = format!("F{}C.8", "0".repeat(40));
        assert_eq!(c.from_text(&wide), -3.5);
    }

    #[test]
    fn test_parse_integer_formats() {
        let mut c = codec(3, 0, NumberBase::Bin, NumericFormat::Integer);
        assert_eq!(c.from_text("0111"), 7.0);
        assert_eq!(c.from_text("1001"), -7.0);
        assert_eq!(c.from_text("-0111"), -7.0);
        let mut c = codec(6, 0, NumberBase::Hex, NumericFormat::Integer);
        assert_eq!(c.from_text("7F"), -1.0);
        assert_eq!(c.from_text("3F"), 63.0);
        assert_eq!(c.from_text("1C0"), -64.0);
    }

    #[test]
    fn test_parse_csd_rounds() {
        let cfg = QuantizationConfig::new(4, 0)
            .with_base(NumberBase::Csd)
            .with_format(NumericFormat::Integer)
            .with_quant(QuantMode::Round);
        let mut c = NumberBaseCodec::new(cfg).unwrap();
        assert_eq!(c.from_text("+0+0.0-"), 10.0);
        assert_eq!(c.from_text("+00-"), 7.0);
    }

    #[test]
    fn test_parse_decimal() {
        let mut c = codec(0, 3, NumberBase::Dec, NumericFormat::Fractional);
        assert_eq!(c.from_text("0,5"), 0.5);
        assert_eq!(c.from_text("-0.3"), -0.25);
        assert_eq!(c.from_text("0"), 0.0);
        assert_eq!(c.from_text("1.1.1"), 0.0);
        assert_eq!(c.from_text("12"), 0.875);
        let mut c = codec(3, 2, NumberBase::Dec, NumericFormat::Integer);
        assert_eq!(c.from_text("-5"), -1.25);
    }

    #[test]
    fn test_malformed_text_is_zero() {
        let mut c = codec(2, 2, NumberBase::Bin, NumericFormat::Fractional);
        assert_eq!(c.from_text(""), 0.0);
        assert_eq!(c.from_text("-"), 0.0);
        assert_eq!(c.from_text("1-1"), 0.0);
        assert_eq!(c.from_text_slice(&["01.10", "xyz"]), vec![1.5, 0.0]);
    }

    fn base() -> impl Strategy<Value = NumberBase> {
        prop_oneof![
            Just(NumberBase::Dec),
            Just(NumberBase::Bin),
            Just(NumberBase::Hex),
            Just(NumberBase::Csd),
        ]
    }

    fn format() -> impl Strategy<Value = NumericFormat> {
        prop_oneof![Just(NumericFormat::Fractional), Just(NumericFormat::Integer)]
    }

    proptest! {
        #[test]
        fn prop_text_roundtrip(
            x in -40.0f64..40.0,
            wi in 0u32..6,
            wf in 0u32..10,
            wg in 0u32..2,
            base in base(),
            fmt in format()
        ) {
            let cfg = QuantizationConfig::new(wi, wf)
                .with_guard_bits(wg)
                .with_base(base)
                .with_format(fmt)
                .with_ovfl(OverflowMode::Saturate);
            let mut q = FixedPointQuantizer::new(cfg.clone()).unwrap();
            let grid = q.quantize(x, Scaling::MultiplyDivide);

            let mut c = NumberBaseCodec::new(cfg).unwrap();
            let text = c.to_text(grid);
            let parsed = c.from_text(&text);
            prop_assert_eq!(parsed, grid, "text {:?}", text);
        }
    }
}
