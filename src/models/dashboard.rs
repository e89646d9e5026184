// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// Top cards of the back-office dashboard
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub active_loans: i64,
    pub closed_loans: i64,
    pub seized_loans: i64,
    pub total_principal_disbursed: Decimal,
    pub total_collected: Decimal,
    pub total_outstanding: Decimal,
    pub overdue_installments: i64,
    pub total_expenses: Decimal,
}

#[derive(Debug, FromRow)]
pub struct LoanCounts {
    pub active_loans: Option<i64>,
    pub closed_loans: Option<i64>,
    pub seized_loans: Option<i64>,
    pub total_principal_disbursed: Option<Decimal>,
}

#[derive(Debug, FromRow)]
pub struct CollectionTotals {
    pub total_collected: Option<Decimal>,
    pub total_outstanding: Option<Decimal>,
    pub overdue_installments: Option<i64>,
}
