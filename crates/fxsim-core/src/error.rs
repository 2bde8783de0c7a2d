//! Fixed-point simulation error types

use thiserror::Error;

/// Result type for fixed-point operations
pub type FxResult<T> = Result<T, FxError>;

/// Errors that can occur while configuring quantizers, codecs and filters.
///
/// Overflow is never an error: it is counted by the quantizer. Malformed
/// sample values and mis-sized register vectors are logged and repaired.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FxError {
    /// Requantization mode name not recognized
    #[error("Unknown requantization mode '{0}'")]
    UnknownQuantMode(String),

    /// Overflow mode name not recognized
    #[error("Unknown overflow mode '{0}'")]
    UnknownOverflowMode(String),

    /// Numeric format name not recognized
    #[error("Unknown numeric format '{0}'")]
    UnknownNumericFormat(String),

    /// Number base name not recognized
    #[error("Unknown number base '{0}'")]
    UnknownBase(String),

    /// Word adaptation mode name not recognized
    #[error("Unknown word adaptation mode '{0}'")]
    UnknownWordAdaptMode(String),

    /// A recognized key carried a value of the wrong kind
    #[error("Invalid value '{value}' for key '{key}'")]
    InvalidValue { key: String, value: String },

    /// Total word length WG + WI + WF + 1 is too large
    #[error("Word length of {bits} bits exceeds the maximum of {max} bits")]
    WordLength { bits: u32, max: u32 },

    /// Numerator and denominator differ in length
    #[error("Coefficient length mismatch: len(b) = {b}, len(a) = {a}")]
    CoefficientLengthMismatch { b: usize, a: usize },

    /// No coefficients supplied
    #[error("Coefficient vectors must not be empty")]
    EmptyCoefficients,

    /// Configuration file not found
    #[error("Config not found: {0}")]
    ConfigNotFound(String),

    /// Failed to read or write a configuration file
    #[error("Failed to access config: {0}")]
    ConfigIo(String),

    /// Failed to parse YAML
    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    /// Parsed configuration is inconsistent
    #[error("Invalid config: {0}")]
    Validation(String),
}

impl FxError {
    /// Check if this error stems from a bad setting rather than file access
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            FxError::ConfigNotFound(_) | FxError::ConfigIo(_) | FxError::ConfigParse(_)
        )
    }

    pub(crate) fn invalid_value(key: &str, value: impl ToString) -> Self {
        FxError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FxError::CoefficientLengthMismatch { b: 3, a: 2 };
        assert_eq!(
            err.to_string(),
            "Coefficient length mismatch: len(b) = 3, len(a) = 2"
        );
        let err = FxError::UnknownQuantMode("nearest".into());
        assert_eq!(err.to_string(), "Unknown requantization mode 'nearest'");
    }

    #[test]
    fn test_is_configuration_error() {
        assert!(FxError::UnknownBase("oct".into()).is_configuration_error());
        assert!(FxError::WordLength { bits: 80, max: 64 }.is_configuration_error());
        assert!(!FxError::ConfigIo("denied".into()).is_configuration_error());
        assert!(!FxError::ConfigParse("bad yaml".into()).is_configuration_error());
    }
}
