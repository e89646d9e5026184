// src/models/loan.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::models::installment::Installment;

// --- Enums (Postgres types) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "loan_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Active,
    Closed,
    Seized, // vehicle repossessed
}

/// How the periodic installment is derived from principal, rate and tenure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "interest_policy", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum InterestPolicy {
    /// Flat per-period interest on the original principal.
    #[default]
    Flat,
    /// Reducing-balance amortization.
    Amortizing,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "LN-2024-0042")]
    pub loan_number: String,

    pub customer_id: Uuid,

    #[schema(example = "Ramesh Kumar")]
    pub customer_name: String,

    // Terms
    #[schema(example = "100000.00")]
    pub principal: Decimal,
    #[schema(example = "2.00")]
    pub interest_rate: Decimal,
    #[schema(example = 12)]
    pub tenure_months: i32,
    pub interest_policy: InterestPolicy,

    // Dates
    #[schema(value_type = String, format = Date, example = "2024-01-10")]
    pub loan_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2024-02-10")]
    pub emi_start_date: NaiveDate,

    // Derived from the terms, never written by clients
    #[schema(example = "10333.33")]
    pub monthly_emi: Decimal,
    #[schema(example = "24000.00")]
    pub total_interest_amount: Decimal,

    pub status: LoanStatus,

    #[schema(example = "MH12AB1234")]
    pub vehicle_number: Option<String>,
    pub remarks: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregates over a loan's installments, shown next to the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanSummary {
    pub installment_count: usize,
    pub paid_count: usize,
    pub overdue_count: usize,
    pub amount_collected: Decimal,
    pub amount_outstanding: Decimal,
}

impl LoanSummary {
    pub fn from_installments(installments: &[Installment]) -> Self {
        use crate::models::installment::InstallmentStatus;

        let mut summary = LoanSummary {
            installment_count: installments.len(),
            paid_count: 0,
            overdue_count: 0,
            amount_collected: Decimal::ZERO,
            amount_outstanding: Decimal::ZERO,
        };

        for inst in installments {
            match inst.status {
                InstallmentStatus::Paid => summary.paid_count += 1,
                InstallmentStatus::Overdue => summary.overdue_count += 1,
                _ => {}
            }
            summary.amount_collected += inst.amount_paid;
            let remaining = inst.installment_amount - inst.amount_paid;
            if remaining > Decimal::ZERO {
                summary.amount_outstanding += remaining;
            }
        }

        summary
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetail {
    #[serde(flatten)]
    pub loan: Loan,
    pub installments: Vec<Installment>,
    pub summary: LoanSummary,
}

/// Result of an edit: the stored loan plus what the reconciliation touched.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanUpdateResult {
    pub loan: Loan,
    pub installments_updated: usize,
    pub installments_added: usize,
    pub installments_removed: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
    pub loans_scanned: usize,
    pub loans_backfilled: usize,
    pub installments_created: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::installment::{InstallmentStatus, PaymentEntry};
    use rust_decimal_macros::dec;
    use sqlx::types::Json;

    fn installment(seq: i32, amount: Decimal, paid: Decimal, status: InstallmentStatus) -> Installment {
        Installment {
            id: Uuid::new_v4(),
            loan_id: Uuid::nil(),
            loan_number: "LN-1".to_string(),
            customer_name: "Asha".to_string(),
            installment_number: seq,
            due_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            installment_amount: amount,
            amount_paid: paid,
            payment_mode: None,
            payment_date: None,
            is_overdue: status == InstallmentStatus::Overdue,
            status,
            remarks: None,
            payment_history: Json(Vec::<PaymentEntry>::new()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn summary_counts_and_totals() {
        let rows = vec![
            installment(1, dec!(1000), dec!(1000), InstallmentStatus::Paid),
            installment(2, dec!(1000), dec!(400), InstallmentStatus::PartiallyPaid),
            installment(3, dec!(1000), dec!(0), InstallmentStatus::Overdue),
            installment(4, dec!(1000), dec!(0), InstallmentStatus::Pending),
        ];

        let summary = LoanSummary::from_installments(&rows);

        assert_eq!(summary.installment_count, 4);
        assert_eq!(summary.paid_count, 1);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.amount_collected, dec!(1400));
        assert_eq!(summary.amount_outstanding, dec!(2600));
    }

    #[test]
    fn overpayment_does_not_reduce_outstanding() {
        let rows = vec![
            installment(1, dec!(500), dec!(700), InstallmentStatus::Paid),
            installment(2, dec!(500), dec!(0), InstallmentStatus::Pending),
        ];

        let summary = LoanSummary::from_installments(&rows);
        assert_eq!(summary.amount_outstanding, dec!(500));
        assert_eq!(summary.amount_collected, dec!(700));
    }

    #[test]
    fn policy_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&InterestPolicy::Flat).unwrap(), "\"flat\"");
        let parsed: InterestPolicy = serde_json::from_str("\"amortizing\"").unwrap();
        assert_eq!(parsed, InterestPolicy::Amortizing);
    }
}
