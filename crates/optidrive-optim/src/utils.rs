//! Utility functions for optimizers.
//!
//! Keyword-style configuration passes every value as an `f64`; these
//! helpers convert such values to the integer and boolean settings of the
//! backends and reject anything that does not fit.

use optidrive_core::error::{OptimizerError, OptimizerResult};

/// Converts a keyword value to a non-negative count.
pub(crate) fn count_value(key: &str, value: f64) -> OptimizerResult<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Ok(value as usize)
    } else {
        Err(OptimizerError::invalid_argument(format!(
            "invalid value {value} for keyword `{key}`"
        )))
    }
}

/// Converts a keyword value to a flag word.
pub(crate) fn flags_value(key: &str, value: f64) -> OptimizerResult<u32> {
    count_value(key, value).and_then(|v| {
        u32::try_from(v).map_err(|_| {
            OptimizerError::invalid_argument(format!("invalid value {value} for keyword `{key}`"))
        })
    })
}

/// Converts a keyword value to a boolean (any non-zero value is true).
pub(crate) fn bool_value(key: &str, value: f64) -> OptimizerResult<bool> {
    if value.is_nan() {
        return Err(OptimizerError::invalid_argument(format!(
            "invalid value {value} for keyword `{key}`"
        )));
    }
    Ok(value != 0.0)
}

/// Converts a keyword value to a non-negative finite tolerance.
pub(crate) fn tolerance_value(key: &str, value: f64) -> OptimizerResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(OptimizerError::invalid_argument(format!(
            "invalid value {value} for keyword `{key}`"
        )))
    }
}

/// Error for a keyword no configuration knows about.
pub(crate) fn unknown_keyword(key: &str) -> OptimizerError {
    OptimizerError::invalid_argument(format!("unknown keyword `{key}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_value() {
        assert_eq!(count_value("mem", 5.0).unwrap(), 5);
        assert!(count_value("mem", -1.0).is_err());
        assert!(count_value("mem", 2.5).is_err());
        assert!(count_value("mem", f64::INFINITY).is_err());
    }

    #[test]
    fn test_bool_and_tolerance() {
        assert!(bool_value("single", 1.0).unwrap());
        assert!(!bool_value("single", 0.0).unwrap());
        assert!(bool_value("single", f64::NAN).is_err());
        assert_eq!(tolerance_value("gatol", 1e-8).unwrap(), 1e-8);
        assert!(tolerance_value("gatol", -1.0).is_err());
    }

    #[test]
    fn test_unknown_keyword_message() {
        let err = unknown_keyword("foo");
        assert_eq!(err.to_string(), "Invalid argument: unknown keyword `foo`");
    }
}
