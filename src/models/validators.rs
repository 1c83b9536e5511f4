use std::borrow::Cow;

use validator::ValidationError;

/// Validate a currency amount: finite and non-negative.
pub fn validate_amount(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        let mut err = ValidationError::new("non_finite_amount");
        err.message = Some(Cow::Borrowed("Amount must be a finite number"));
        return Err(err);
    }
    if value < 0.0 {
        let mut err = ValidationError::new("negative_amount");
        err.message = Some(Cow::Owned(format!(
            "Amount cannot be negative (got {value})"
        )));
        return Err(err);
    }
    Ok(())
}

/// Validate a fraction in the closed interval [0, 1].
pub fn validate_fraction(value: f64) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&value) {
        let mut err = ValidationError::new("fraction_out_of_range");
        err.message = Some(Cow::Owned(format!(
            "Value must be between 0 and 1 (got {value})"
        )));
        return Err(err);
    }
    Ok(())
}
