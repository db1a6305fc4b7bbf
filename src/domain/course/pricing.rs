//! Course pricing rules.
//!
//! FULL charges the course price. INSTALLMENT charges one third of the
//! price plus a 10% surcharge, rounded to the cent with midpoint away
//! from zero. Amounts are computed in `Decimal` and then converted once to
//! provider minor units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::enrollment::EnrollmentType;
use crate::domain::foundation::ValidationError;

/// Number of payments in an installment plan.
pub const INSTALLMENT_COUNT: u32 = 3;

/// Surcharge applied to installment plans, in percent.
pub const INSTALLMENT_SURCHARGE_PERCENT: i64 = 10;

/// Amount to charge for a single checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    /// Amount in major currency units, 2 decimal places.
    pub amount: Decimal,

    /// Same amount in minor units (cents), as sent to the provider.
    pub amount_minor: i64,
}

/// Computes the checkout amount for a course price and enrollment type.
pub fn quote(
    price: Decimal,
    enrollment_type: EnrollmentType,
) -> Result<PriceQuote, ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::negative("price"));
    }

    let raw = match enrollment_type {
        EnrollmentType::Full => price,
        EnrollmentType::Installment => {
            let surcharge =
                Decimal::from(100 + INSTALLMENT_SURCHARGE_PERCENT) / Decimal::from(100);
            price * surcharge / Decimal::from(INSTALLMENT_COUNT)
        }
    };

    let amount = raw.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let amount_minor = to_minor_units(amount)?;

    Ok(PriceQuote {
        amount,
        amount_minor,
    })
}

/// Converts a 2dp major-unit amount to minor units.
pub fn to_minor_units(amount: Decimal) -> Result<i64, ValidationError> {
    (amount * Decimal::from(100))
        .trunc()
        .to_i64()
        .ok_or_else(|| ValidationError::invalid_format("price", "amount out of range"))
}

/// Converts provider minor units back to major units.
pub fn from_minor_units(amount_minor: i64) -> Decimal {
    Decimal::new(amount_minor, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn full_price_is_charged_exactly() {
        let q = quote(dec("49.99"), EnrollmentType::Full).unwrap();
        assert_eq!(q.amount, dec("49.99"));
        assert_eq!(q.amount_minor, 4999);
    }

    #[test]
    fn installment_adds_surcharge_over_three_payments() {
        let q = quote(dec("300.00"), EnrollmentType::Installment).unwrap();
        assert_eq!(q.amount, dec("110.00"));
        assert_eq!(q.amount_minor, 11000);
    }

    #[test]
    fn installment_rounds_to_nearest_cent() {
        // 100 * 1.10 / 3 = 36.6666...
        let q = quote(dec("100.00"), EnrollmentType::Installment).unwrap();
        assert_eq!(q.amount, dec("36.67"));
        assert_eq!(q.amount_minor, 3667);

        // 10 * 1.10 / 3 = 3.6666...
        let q = quote(dec("10"), EnrollmentType::Installment).unwrap();
        assert_eq!(q.amount_minor, 367);
    }

    #[test]
    fn installment_midpoint_rounds_away_from_zero() {
        // 0.15 * 1.10 / 3 = 0.055 exactly
        let q = quote(dec("0.15"), EnrollmentType::Installment).unwrap();
        assert_eq!(q.amount, dec("0.06"));
    }

    #[test]
    fn full_price_with_extra_precision_is_rounded() {
        let q = quote(dec("19.995"), EnrollmentType::Full).unwrap();
        assert_eq!(q.amount_minor, 2000);
    }

    #[test]
    fn zero_price_is_allowed() {
        let q = quote(Decimal::ZERO, EnrollmentType::Full).unwrap();
        assert_eq!(q.amount_minor, 0);
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = quote(dec("-1.00"), EnrollmentType::Full).unwrap_err();
        assert_eq!(err, ValidationError::negative("price"));
    }

    #[test]
    fn minor_units_convert_back_to_major() {
        assert_eq!(from_minor_units(11000), dec("110.00"));
        assert_eq!(from_minor_units(4999), dec("49.99"));
    }

    proptest! {
        #[test]
        fn full_quote_equals_price(cents in 0i64..100_000_000) {
            let price = Decimal::new(cents, 2);
            let q = quote(price, EnrollmentType::Full).unwrap();
            prop_assert_eq!(q.amount_minor, cents);
            prop_assert_eq!(q.amount, price);
        }

        #[test]
        fn installment_quote_matches_integer_rounding(cents in 0i64..100_000_000) {
            let price = Decimal::new(cents, 2);
            let q = quote(price, EnrollmentType::Installment).unwrap();
            // round_half_up(cents * 110 / 300) in pure integer arithmetic
            let expected = (cents * 110 * 2 + 300) / 600;
            prop_assert_eq!(q.amount_minor, expected);
        }

        #[test]
        fn installment_is_within_half_cent_of_exact_share(cents in 0i64..100_000_000) {
            let price = Decimal::new(cents, 2);
            let q = quote(price, EnrollmentType::Installment).unwrap();
            // Scaled by 300 so the exact share cents * 1.10 / 3 is an integer.
            let exact = cents * 110;
            let charged = q.amount_minor * 300;
            prop_assert!((charged - exact).abs() <= 150);
        }
    }
}
