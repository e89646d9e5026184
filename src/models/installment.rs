// src/models/installment.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "installment_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Pending,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    Paid,
    Overdue,
}

impl InstallmentStatus {
    /// Status is a pure function of what was paid against what is due.
    /// The overdue flag only shows through while nothing has been paid.
    pub fn derive(amount_paid: Decimal, installment_amount: Decimal, is_overdue: bool) -> Self {
        if amount_paid >= installment_amount {
            InstallmentStatus::Paid
        } else if amount_paid > Decimal::ZERO {
            InstallmentStatus::PartiallyPaid
        } else if is_overdue {
            InstallmentStatus::Overdue
        } else {
            InstallmentStatus::Pending
        }
    }
}

/// One line of an installment's payment ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEntry {
    #[schema(example = "500.00")]
    pub amount: Decimal,
    #[schema(example = "Cash")]
    pub mode: String,
    #[schema(value_type = String, format = Date, example = "2024-03-10")]
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub id: Uuid,
    pub loan_id: Uuid,

    // Copied from the loan for listing screens
    #[schema(example = "LN-2024-0042")]
    pub loan_number: String,
    #[schema(example = "Ramesh Kumar")]
    pub customer_name: String,

    #[schema(example = 1)]
    pub installment_number: i32,
    #[schema(value_type = String, format = Date, example = "2024-02-10")]
    pub due_date: NaiveDate,

    #[schema(example = "10333.33")]
    pub installment_amount: Decimal,
    #[schema(example = "0.00")]
    pub amount_paid: Decimal,

    #[schema(example = "Cash, Online")]
    pub payment_mode: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub payment_date: Option<NaiveDate>,

    pub is_overdue: bool,
    pub status: InstallmentStatus,
    pub remarks: Option<String>,

    #[schema(value_type = Vec<PaymentEntry>)]
    pub payment_history: Json<Vec<PaymentEntry>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Installment {
    /// Rows with money against them are never deleted by a schedule change.
    pub fn carries_payment(&self) -> bool {
        self.amount_paid > Decimal::ZERO || !self.payment_history.0.is_empty()
    }
}

/// An installment row ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInstallment {
    pub loan_id: Uuid,
    pub loan_number: String,
    pub customer_name: String,
    pub installment_number: i32,
    pub due_date: NaiveDate,
    pub installment_amount: Decimal,
    pub amount_paid: Decimal,
    pub status: InstallmentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn derive_status_from_amounts() {
        assert_eq!(InstallmentStatus::derive(dec!(800), dec!(800), false), InstallmentStatus::Paid);
        assert_eq!(InstallmentStatus::derive(dec!(900), dec!(800), false), InstallmentStatus::Paid);
        assert_eq!(
            InstallmentStatus::derive(dec!(0.01), dec!(800), false),
            InstallmentStatus::PartiallyPaid
        );
        assert_eq!(InstallmentStatus::derive(dec!(0), dec!(800), false), InstallmentStatus::Pending);
    }

    #[test]
    fn overdue_flag_only_applies_when_unpaid() {
        assert_eq!(InstallmentStatus::derive(dec!(0), dec!(800), true), InstallmentStatus::Overdue);
        assert_eq!(
            InstallmentStatus::derive(dec!(100), dec!(800), true),
            InstallmentStatus::PartiallyPaid
        );
        assert_eq!(InstallmentStatus::derive(dec!(800), dec!(800), true), InstallmentStatus::Paid);
    }

    #[test]
    fn status_labels_match_stored_records() {
        assert_eq!(
            serde_json::to_string(&InstallmentStatus::PartiallyPaid).unwrap(),
            "\"Partially Paid\""
        );
        assert_eq!(serde_json::to_string(&InstallmentStatus::Pending).unwrap(), "\"Pending\"");
    }
}
