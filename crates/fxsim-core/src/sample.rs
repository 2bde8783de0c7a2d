//! Coercion of loosely typed input values to real samples.
//!
//! Quantizers accept anything implementing [`RealValue`]: plain numbers,
//! complex numbers (reduced to the real part), text and optional values.
//! Coercion never fails; malformed input becomes `0.0` and is logged so a
//! single bad element does not abort a batch.

use num_complex::Complex64;

/// A value that can be coerced to a real `f64` sample.
pub trait RealValue {
    fn real_value(&self) -> f64;
}

macro_rules! impl_real_value_lossless {
    ($($t:ty),*) => {
        $(
            impl RealValue for $t {
                #[inline]
                fn real_value(&self) -> f64 {
                    f64::from(*self)
                }
            }
        )*
    };
}

impl_real_value_lossless!(f64, f32, i8, i16, i32, u8, u16, u32);

impl RealValue for i64 {
    #[inline]
    fn real_value(&self) -> f64 {
        *self as f64
    }
}

impl RealValue for Complex64 {
    fn real_value(&self) -> f64 {
        if self.im != 0.0 {
            tracing::warn!(re = self.re, im = self.im, "Casting complex value to real before quantization");
        }
        self.re
    }
}

impl RealValue for str {
    fn real_value(&self) -> f64 {
        parse_real(self)
    }
}

impl RealValue for String {
    fn real_value(&self) -> f64 {
        parse_real(self)
    }
}

impl<T: RealValue + ?Sized> RealValue for &T {
    #[inline]
    fn real_value(&self) -> f64 {
        (**self).real_value()
    }
}

impl<T: RealValue> RealValue for Option<T> {
    fn real_value(&self) -> f64 {
        self.as_ref().map_or(0.0, |v| v.real_value())
    }
}

/// Parse text as a real number.
///
/// All whitespace is removed first. Text that is not a float is tried as a
/// complex number (`3.2+1.5j`, `(3.2+1.5i)`) and reduced to its real part.
/// Empty text yields `0.0`; anything else unparsable yields `0.0` with a
/// warning.
pub fn parse_real(text: &str) -> f64 {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    if let Ok(value) = cleaned.parse::<f64>() {
        return value;
    }
    let complex_text = cleaned
        .trim_start_matches('(')
        .trim_end_matches(')')
        .replace(['j', 'J'], "i");
    match complex_text.parse::<Complex64>() {
        Ok(c) => c.real_value(),
        Err(_) => {
            tracing::warn!(text, "Cannot convert to a number, using 0");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(3i32.real_value(), 3.0);
        assert_eq!((-1.5f32).real_value(), -1.5);
        assert_eq!(0.25f64.real_value(), 0.25);
        assert_eq!(Some(2u8).real_value(), 2.0);
        assert_eq!(None::<f64>.real_value(), 0.0);
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(parse_real("123"), 123.0);
        assert_relative_eq!(parse_real(" 1.23 "), 1.23);
        assert_eq!(parse_real(""), 0.0);
        assert_eq!(parse_real("1.1.1"), 0.0);
        assert_eq!(parse_real("xxx"), 0.0);
    }

    #[test]
    fn test_complex_text_keeps_real_part() {
        assert_relative_eq!(parse_real("3.21 + 1.23 j"), 3.21);
        assert_relative_eq!(parse_real("(3.21+1.23j)"), 3.21);
        assert_relative_eq!(parse_real("-0.5-2i"), -0.5);
    }

    #[test]
    fn test_complex_value() {
        assert_relative_eq!(Complex64::new(3.21, 1.23).real_value(), 3.21);
        assert_eq!(Complex64::new(-1.0, 0.0).real_value(), -1.0);
    }
}
