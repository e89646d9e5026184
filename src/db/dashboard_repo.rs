// src/db/dashboard_repo.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::error::AppError,
    models::dashboard::{CollectionTotals, DashboardSummary, LoanCounts},
};

#[derive(Clone, Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_summary<'e, E>(&self, executor: E) -> Result<DashboardSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // One snapshot for every card.
        let mut tx = executor.begin().await?;

        // A. Loan book
        let loans = sqlx::query_as::<_, LoanCounts>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'ACTIVE') AS active_loans,
                COUNT(*) FILTER (WHERE status = 'CLOSED') AS closed_loans,
                COUNT(*) FILTER (WHERE status = 'SEIZED') AS seized_loans,
                SUM(principal) AS total_principal_disbursed
            FROM loans
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        // B. Collections. Outstanding only counts what is still owed on each row.
        let collections = sqlx::query_as::<_, CollectionTotals>(
            r#"
            SELECT
                SUM(amount_paid) AS total_collected,
                SUM(GREATEST(installment_amount - amount_paid, 0)) AS total_outstanding,
                COUNT(*) FILTER (WHERE is_overdue AND amount_paid < installment_amount) AS overdue_installments
            FROM installments
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        // C. Expenses
        let total_expenses: Option<Decimal> = sqlx::query_scalar("SELECT SUM(amount) FROM expenses")
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            active_loans: loans.active_loans.unwrap_or(0),
            closed_loans: loans.closed_loans.unwrap_or(0),
            seized_loans: loans.seized_loans.unwrap_or(0),
            total_principal_disbursed: loans.total_principal_disbursed.unwrap_or(Decimal::ZERO),
            total_collected: collections.total_collected.unwrap_or(Decimal::ZERO),
            total_outstanding: collections.total_outstanding.unwrap_or(Decimal::ZERO),
            overdue_installments: collections.overdue_installments.unwrap_or(0),
            total_expenses: total_expenses.unwrap_or(Decimal::ZERO),
        })
    }
}
