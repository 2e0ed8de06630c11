//! Validators — turn raw user input into typed config values.
//!
//! All validators are pure. A rejection is a `ValidationError`, which the
//! engine answers by re-prompting; nothing here is fatal.

use crate::error::ValidationError;
use crate::params::{Bounds, ParamKind, Parameter, INTEGER_BOUNDS};
use crate::types::action::Action;
use crate::types::value::Value;

/// Map the Enable/Disable buttons to a boolean. Any other action is not a
/// boolean answer.
pub fn boolean(action: Action) -> Option<bool> {
    match action {
        Action::Enable => Some(true),
        Action::Disable => Some(false),
        _ => None,
    }
}

/// Parse free text as an integer inside `bounds` (inclusive).
pub fn bounded_integer(raw: &str, bounds: Bounds) -> Result<u8, ValidationError> {
    let trimmed = raw.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ValidationError::NotAnInteger(trimmed.to_string()))?;
    let out_of_range = ValidationError::OutOfRange {
        value,
        min: bounds.min,
        max: bounds.max,
    };
    if !bounds.contains(value) {
        return Err(out_of_range);
    }
    u8::try_from(value).map_err(|_| out_of_range)
}

/// Parse free text as a finite decimal number. No range restriction.
pub fn float(raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(x),
        _ => Err(ValidationError::NotAFloat(trimmed.to_string())),
    }
}

/// Validate free text for a text-input parameter.
///
/// Boolean parameters are answered with buttons, never text; text sent for
/// one is rejected as a non-integer.
pub fn text_for(param: &Parameter, raw: &str) -> Result<Value, ValidationError> {
    match param.kind {
        ParamKind::Integer => {
            bounded_integer(raw, param.bounds.unwrap_or(INTEGER_BOUNDS)).map(Value::Int)
        }
        ParamKind::Float => float(raw).map(Value::Float),
        ParamKind::Boolean => Err(ValidationError::NotAnInteger(raw.trim().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamName;

    #[test]
    fn boolean_mapping() {
        assert_eq!(boolean(Action::Enable), Some(true));
        assert_eq!(boolean(Action::Disable), Some(false));
        assert_eq!(boolean(Action::Back), None);
    }

    #[test]
    fn integer_edges() {
        assert_eq!(bounded_integer("0", INTEGER_BOUNDS), Ok(0));
        assert_eq!(bounded_integer("255", INTEGER_BOUNDS), Ok(255));
        assert_eq!(bounded_integer(" 42\n", INTEGER_BOUNDS), Ok(42));
        assert_eq!(
            bounded_integer("-1", INTEGER_BOUNDS),
            Err(ValidationError::OutOfRange { value: -1, min: 0, max: 255 })
        );
        assert_eq!(
            bounded_integer("256", INTEGER_BOUNDS),
            Err(ValidationError::OutOfRange { value: 256, min: 0, max: 255 })
        );
    }

    #[test]
    fn integer_rejects_non_numeric() {
        assert!(matches!(
            bounded_integer("abc", INTEGER_BOUNDS),
            Err(ValidationError::NotAnInteger(_))
        ));
        assert!(bounded_integer("5.5", INTEGER_BOUNDS).is_err());
        assert!(bounded_integer("", INTEGER_BOUNDS).is_err());
    }

    #[test]
    fn integer_respects_narrower_bounds() {
        let bounds = Bounds::new(1, 10);
        assert_eq!(bounded_integer("10", bounds), Ok(10));
        assert!(bounded_integer("0", bounds).is_err());
    }

    #[test]
    fn float_accepts_decimal_forms() {
        assert_eq!(float("0.1"), Ok(0.1));
        assert_eq!(float("5"), Ok(5.0));
        assert_eq!(float("-2.5"), Ok(-2.5));
        assert_eq!(float(" 1e-3 "), Ok(0.001));
    }

    #[test]
    fn float_rejects_garbage_and_non_finite() {
        assert_eq!(float("abc"), Err(ValidationError::NotAFloat("abc".into())));
        assert!(float("inf").is_err());
        assert!(float("NaN").is_err());
        assert!(float("").is_err());
    }

    #[test]
    fn text_for_dispatches_on_kind() {
        let interval = ParamName::SrvPictureInterval.descriptor();
        assert_eq!(text_for(interval, "7"), Ok(Value::Int(7)));
        assert!(text_for(interval, "300").is_err());

        let threshold = ParamName::SrvAudioThreshold.descriptor();
        assert_eq!(text_for(threshold, "0.2"), Ok(Value::Float(0.2)));

        let timestamp = ParamName::Timestamp.descriptor();
        assert!(text_for(timestamp, "true").is_err());
    }
}
