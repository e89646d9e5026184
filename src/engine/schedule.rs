// src/engine/schedule.rs

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    engine::calculator::{self, LoanTerms},
    models::installment::{InstallmentStatus, NewInstallment},
    models::loan::Loan,
};

/// Loan fields copied onto each installment row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleOwner {
    pub loan_id: Uuid,
    pub loan_number: String,
    pub customer_name: String,
}

impl From<&Loan> for ScheduleOwner {
    fn from(loan: &Loan) -> Self {
        Self {
            loan_id: loan.id,
            loan_number: loan.loan_number.clone(),
            customer_name: loan.customer_name.clone(),
        }
    }
}

/// Due date of installment `installment_number` (1-based) anchored on `anchor`.
///
/// Always computed from the anchor, never chained from the previous due date,
/// so Jan 31 gives Feb 28/29 then Mar 31.
pub fn due_date(anchor: NaiveDate, installment_number: i32) -> Result<NaiveDate, AppError> {
    let offset = u32::try_from(installment_number.saturating_sub(1)).unwrap_or(0);

    anchor
        .checked_add_months(Months::new(offset))
        .ok_or_else(|| {
            AppError::InvalidSchedule(format!(
                "due date for installment {installment_number} from {anchor} is out of range"
            ))
        })
}

pub fn new_installment(
    owner: &ScheduleOwner,
    installment_number: i32,
    anchor: NaiveDate,
    amount: Decimal,
) -> Result<NewInstallment, AppError> {
    Ok(NewInstallment {
        loan_id: owner.loan_id,
        loan_number: owner.loan_number.clone(),
        customer_name: owner.customer_name.clone(),
        installment_number,
        due_date: due_date(anchor, installment_number)?,
        installment_amount: amount,
        amount_paid: Decimal::ZERO,
        status: InstallmentStatus::Pending,
    })
}

/// One Pending installment per tenure month, numbered `1..=tenure`.
pub fn generate(
    owner: &ScheduleOwner,
    terms: &LoanTerms,
    anchor: NaiveDate,
) -> Result<Vec<NewInstallment>, AppError> {
    let amount = calculator::installment_amount(terms);

    (1..=terms.tenure.max(0))
        .map(|seq| new_installment(owner, seq, anchor, amount))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::loan::InterestPolicy;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn owner() -> ScheduleOwner {
        ScheduleOwner {
            loan_id: Uuid::new_v4(),
            loan_number: "LN-7".to_string(),
            customer_name: "Meena Devi".to_string(),
        }
    }

    #[test]
    fn generates_one_pending_row_per_month() {
        let owner = owner();
        let terms = LoanTerms {
            principal: dec!(60000),
            rate: dec!(2),
            tenure: 6,
            policy: InterestPolicy::Flat,
        };
        let start = date(2024, 3, 15);

        let rows = generate(&owner, &terms, start).unwrap();

        assert_eq!(rows.len(), 6);
        let numbers: Vec<i32> = rows.iter().map(|r| r.installment_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);

        let dues: Vec<NaiveDate> = rows.iter().map(|r| r.due_date).collect();
        assert_eq!(
            dues,
            vec![
                date(2024, 3, 15),
                date(2024, 4, 15),
                date(2024, 5, 15),
                date(2024, 6, 15),
                date(2024, 7, 15),
                date(2024, 8, 15),
            ]
        );

        for row in &rows {
            assert_eq!(row.status, InstallmentStatus::Pending);
            assert_eq!(row.amount_paid, Decimal::ZERO);
            assert_eq!(row.installment_amount, dec!(11200));
            assert_eq!(row.loan_id, owner.loan_id);
            assert_eq!(row.loan_number, "LN-7");
            assert_eq!(row.customer_name, "Meena Devi");
        }
    }

    #[test]
    fn month_end_clamps_without_drifting() {
        let jan31 = date(2023, 1, 31);
        assert_eq!(due_date(jan31, 2).unwrap(), date(2023, 2, 28));
        assert_eq!(due_date(jan31, 3).unwrap(), date(2023, 3, 31));

        let leap = date(2024, 1, 31);
        assert_eq!(due_date(leap, 2).unwrap(), date(2024, 2, 29));
        assert_eq!(due_date(leap, 3).unwrap(), date(2024, 3, 31));
        assert_eq!(due_date(leap, 4).unwrap(), date(2024, 4, 30));
    }

    #[test]
    fn first_installment_falls_on_anchor() {
        let anchor = date(2024, 12, 5);
        assert_eq!(due_date(anchor, 1).unwrap(), anchor);
        assert_eq!(due_date(anchor, 2).unwrap(), date(2025, 1, 5));
    }

    #[test]
    fn zero_tenure_generates_nothing() {
        let terms = LoanTerms {
            principal: dec!(1000),
            rate: dec!(1),
            tenure: 0,
            policy: InterestPolicy::Flat,
        };
        assert!(generate(&owner(), &terms, date(2024, 1, 1)).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_due_date_is_an_error() {
        let err = due_date(NaiveDate::MAX, 2).unwrap_err();
        assert!(matches!(err, AppError::InvalidSchedule(_)));
    }
}
