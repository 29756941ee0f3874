/// Input validation for forecast records
///
/// Probabilities, confidences and market prices all live on the unit
/// interval. Values outside it are rejected when a record is created so the
/// store only ever holds well-formed rows.
use crate::error::{MaverickError, Result};
use rust_decimal::Decimal;

/// Validate a value on the unit interval (probability, confidence, price)
///
/// # Arguments
/// * `value` - Value to validate
/// * `field_name` - Name of the field for error messages
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err` if NaN, infinite, or outside [0, 1]
pub fn validate_unit_interval(value: f64, field_name: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(MaverickError::Validation(format!(
            "{} must be a finite number: {}",
            field_name, value
        )));
    }

    if value < 0.0 {
        return Err(MaverickError::Validation(format!(
            "{} cannot be negative: {}",
            field_name, value
        )));
    }

    if value > 1.0 {
        return Err(MaverickError::Validation(format!(
            "{} cannot be greater than 1.0: {}",
            field_name, value
        )));
    }

    Ok(())
}

/// Validate a binary outcome (1 = YES, 0 = NO)
pub fn validate_binary_outcome(actual_outcome: i64) -> Result<()> {
    match actual_outcome {
        0 | 1 => Ok(()),
        other => Err(MaverickError::Validation(format!(
            "actual_outcome must be 0 or 1: {}",
            other
        ))),
    }
}

/// Validate a non-empty identifier-like field (ticker, agent name)
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MaverickError::Validation(format!(
            "{} cannot be empty",
            field_name
        )));
    }

    Ok(())
}

/// Validate a bet amount (must be strictly positive)
pub fn validate_bet_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(MaverickError::Validation(format!(
            "Bet amount must be positive: {}",
            amount
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_unit_interval() {
        // Valid values
        assert!(validate_unit_interval(0.5, "probability").is_ok());
        assert!(validate_unit_interval(0.0, "probability").is_ok());
        assert!(validate_unit_interval(1.0, "probability").is_ok());

        // Invalid values
        assert!(validate_unit_interval(-0.1, "probability").is_err());
        assert!(validate_unit_interval(1.1, "probability").is_err());
        assert!(validate_unit_interval(f64::NAN, "probability").is_err());
        assert!(validate_unit_interval(f64::INFINITY, "probability").is_err());
    }

    #[test]
    fn test_error_names_the_field() {
        let err = validate_unit_interval(1.5, "market_price").unwrap_err();
        assert!(err.to_string().contains("market_price"));
    }

    #[test]
    fn test_validate_binary_outcome() {
        assert!(validate_binary_outcome(0).is_ok());
        assert!(validate_binary_outcome(1).is_ok());
        assert!(validate_binary_outcome(2).is_err());
        assert!(validate_binary_outcome(-1).is_err());
    }

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("KXFED-25DEC", "ticker").is_ok());
        assert!(validate_non_empty("", "ticker").is_err());
        assert!(validate_non_empty("   ", "agent_name").is_err());
    }

    #[test]
    fn test_validate_bet_amount() {
        assert!(validate_bet_amount(dec!(100)).is_ok());
        assert!(validate_bet_amount(dec!(0)).is_err());
        assert!(validate_bet_amount(dec!(-5)).is_err());
    }
}
