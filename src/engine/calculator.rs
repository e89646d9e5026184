// src/engine/calculator.rs

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::loan::InterestPolicy;

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);
const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// The three inputs every derived loan amount depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanTerms {
    pub principal: Decimal,
    /// Percent, e.g. `2` for 2%.
    pub rate: Decimal,
    pub tenure: i32,
    pub policy: InterestPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmiQuote {
    pub policy: InterestPolicy,
    #[schema(example = "8884.88")]
    pub installment: Decimal,
    #[schema(example = "6618.56")]
    pub total_interest: Decimal,
    #[schema(example = "106618.56")]
    pub total_payable: Decimal,
}

/// Currency precision: 2dp, half away from zero.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn has_valid_base(terms: &LoanTerms) -> bool {
    terms.principal > Decimal::ZERO && terms.tenure > 0 && !terms.rate.is_sign_negative()
}

/// Periodic installment for the terms.
///
/// Non-positive principal or tenure (or a negative rate) yields zero instead
/// of an error; request validation keeps such terms out of the store. Terms
/// large enough to overflow `Decimal` also yield zero.
pub fn installment_amount(terms: &LoanTerms) -> Decimal {
    if !has_valid_base(terms) {
        return Decimal::ZERO;
    }

    let raw = match terms.policy {
        InterestPolicy::Flat => flat_installment(terms.principal, terms.rate, terms.tenure),
        InterestPolicy::Amortizing => {
            amortizing_installment(terms.principal, terms.rate, terms.tenure)
        }
    };

    match raw {
        Some(amount) => round_currency(amount),
        None => {
            tracing::warn!(
                principal = %terms.principal,
                rate = %terms.rate,
                tenure = terms.tenure,
                "installment overflowed"
            );
            Decimal::ZERO
        }
    }
}

fn flat_installment(principal: Decimal, rate: Decimal, tenure: i32) -> Option<Decimal> {
    let base = principal.checked_div(Decimal::from(tenure))?;
    let interest = principal.checked_mul(rate.checked_div(HUNDRED)?)?;
    base.checked_add(interest)
}

fn amortizing_installment(principal: Decimal, rate: Decimal, tenure: i32) -> Option<Decimal> {
    let periodic = rate.checked_div(MONTHS_PER_YEAR)?.checked_div(HUNDRED)?;
    let n = Decimal::from(tenure);

    if periodic.is_zero() {
        return principal.checked_div(n);
    }

    let growth = (Decimal::ONE + periodic).checked_powu(u64::try_from(tenure).ok()?)?;
    let denominator = growth.checked_sub(Decimal::ONE)?;
    if denominator.is_zero() {
        return principal.checked_div(n);
    }

    // growth / denominator first keeps the intermediate near 1
    principal
        .checked_mul(periodic)?
        .checked_mul(growth.checked_div(denominator)?)
}

/// Interest over the life of the loan.
///
/// Flat loans charge `principal * rate%` every month, amortizing loans pay
/// whatever the installments add up to beyond the principal.
pub fn total_interest(terms: &LoanTerms) -> Decimal {
    if !has_valid_base(terms) {
        return Decimal::ZERO;
    }

    let tenure = Decimal::from(terms.tenure);
    let interest = match terms.policy {
        InterestPolicy::Flat => terms
            .principal
            .checked_mul(terms.rate)
            .and_then(|v| v.checked_div(HUNDRED))
            .and_then(|v| v.checked_mul(tenure)),
        InterestPolicy::Amortizing => {
            let installment = installment_amount(terms);
            if installment.is_zero() {
                return Decimal::ZERO;
            }
            installment
                .checked_mul(tenure)
                .and_then(|v| v.checked_sub(terms.principal))
        }
    };

    match interest {
        Some(value) => round_currency(value.max(Decimal::ZERO)),
        None => {
            tracing::warn!(principal = %terms.principal, rate = %terms.rate, "total interest overflowed");
            Decimal::ZERO
        }
    }
}

pub fn quote(terms: &LoanTerms) -> EmiQuote {
    let installment = installment_amount(terms);
    let total_interest = total_interest(terms);
    let total_payable = if installment.is_zero() {
        Decimal::ZERO
    } else {
        terms
            .principal
            .checked_add(total_interest)
            .map_or(Decimal::ZERO, round_currency)
    };

    EmiQuote {
        policy: terms.policy,
        installment,
        total_interest,
        total_payable,
    }
}
