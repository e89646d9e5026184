// src/common/validation.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

// Custom validators for `#[validate(custom(function = ...))]`. The error code
// doubles as the i18n message key.

/// Largest value a `NUMERIC(14, 2)` money column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);
/// Largest value the `NUMERIC(7, 3)` rate column holds.
pub const MAX_RATE: Decimal = Decimal::from_parts(9_999_999, 0, 0, false, 3);

const AMOUNT_SCALE: u32 = 2;
const RATE_SCALE: u32 = 3;

fn check_scale(value: &Decimal, max_scale: u32) -> Result<(), ValidationError> {
    if value.normalize().scale() > max_scale {
        Err(ValidationError::new("too_many_decimals"))
    } else {
        Ok(())
    }
}

fn check_amount_cap(value: &Decimal) -> Result<(), ValidationError> {
    if *value > MAX_AMOUNT {
        Err(ValidationError::new("amount_too_large"))
    } else {
        Ok(())
    }
}

/// Money that must be above zero: principals, expenses.
pub fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("must_be_positive"));
    }
    check_amount_cap(value)?;
    check_scale(value, AMOUNT_SCALE)
}

/// Money where zero is allowed, e.g. an unpaid trainee's salary.
pub fn validate_amount_not_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("must_not_be_negative"));
    }
    check_amount_cap(value)?;
    check_scale(value, AMOUNT_SCALE)
}

/// Only the precision of a payment line is checked; non-positive lines are
/// dropped by the payment recorder.
pub fn validate_amount_scale(value: &Decimal) -> Result<(), ValidationError> {
    check_amount_cap(value)?;
    check_scale(value, AMOUNT_SCALE)
}

pub fn validate_rate(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("must_not_be_negative"));
    }
    if *value > MAX_RATE {
        return Err(ValidationError::new("rate_too_large"));
    }
    check_scale(value, RATE_SCALE)
}

/// The first EMI cannot fall before the money was handed out.
pub fn ensure_start_not_before_loan(
    loan_date: NaiveDate,
    emi_start_date: Option<NaiveDate>,
) -> Result<(), ValidationErrors> {
    match emi_start_date {
        Some(start) if start < loan_date => {
            let mut errors = ValidationErrors::new();
            errors.add("emi_start_date", ValidationError::new("start_before_loan_date"));
            Err(errors)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn caps_match_the_column_types() {
        assert_eq!(MAX_AMOUNT, dec!(999999999999.99));
        assert_eq!(MAX_RATE, dec!(9999.999));
    }

    #[test]
    fn amount_rejects_zero_and_negatives() {
        assert!(validate_amount(&dec!(0.01)).is_ok());
        assert_eq!(validate_amount(&dec!(0)).unwrap_err().code, "must_be_positive");
        assert!(validate_amount(&dec!(-5)).is_err());
    }

    #[test]
    fn amount_above_column_range_is_rejected() {
        assert!(validate_amount(&dec!(999999999999.99)).is_ok());
        assert_eq!(
            validate_amount(&dec!(1000000000000000)).unwrap_err().code,
            "amount_too_large"
        );
        assert_eq!(
            validate_amount_scale(&dec!(1000000000000)).unwrap_err().code,
            "amount_too_large"
        );
    }

    #[test]
    fn amount_with_sub_paisa_precision_is_rejected() {
        assert_eq!(validate_amount(&dec!(100.005)).unwrap_err().code, "too_many_decimals");
        assert_eq!(validate_amount_scale(&dec!(100.005)).unwrap_err().code, "too_many_decimals");
        // trailing zeros are not precision
        assert!(validate_amount(&dec!(100.5000)).is_ok());
    }

    #[test]
    fn not_negative_accepts_zero() {
        assert!(validate_amount_not_negative(&dec!(0)).is_ok());
        assert!(validate_amount_not_negative(&dec!(12.5)).is_ok());
        assert_eq!(
            validate_amount_not_negative(&dec!(-0.5)).unwrap_err().code,
            "must_not_be_negative"
        );
    }

    #[test]
    fn rate_bounds_and_precision() {
        assert!(validate_rate(&dec!(0)).is_ok());
        assert!(validate_rate(&dec!(2.125)).is_ok());
        assert_eq!(validate_rate(&dec!(2.0005)).unwrap_err().code, "too_many_decimals");
        assert_eq!(validate_rate(&dec!(10000)).unwrap_err().code, "rate_too_large");
        assert_eq!(validate_rate(&dec!(-1)).unwrap_err().code, "must_not_be_negative");
    }

    #[test]
    fn start_date_before_loan_date_is_reported_on_the_field() {
        let loan_date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        assert!(ensure_start_not_before_loan(loan_date, None).is_ok());
        assert!(ensure_start_not_before_loan(loan_date, Some(loan_date)).is_ok());

        let errors = ensure_start_not_before_loan(loan_date, NaiveDate::from_ymd_opt(2024, 3, 9)).unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields["emi_start_date"][0].code, "start_before_loan_date");
    }
}
