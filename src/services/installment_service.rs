// src/services/installment_service.rs

use chrono::NaiveDate;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InstallmentRepository, LoanRepository},
    engine::{payments, PaymentGroup},
    models::installment::{Installment, InstallmentStatus},
};

#[derive(Clone)]
pub struct InstallmentService {
    repo: InstallmentRepository,
    loan_repo: LoanRepository,
}

/// Remarks are cleared by sending an empty string.
fn normalize_remarks(remarks: &str) -> Option<&str> {
    let trimmed = remarks.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

impl InstallmentService {
    pub fn new(repo: InstallmentRepository, loan_repo: LoanRepository) -> Self {
        Self { repo, loan_repo }
    }

    pub async fn list_by_loan<'e, E>(&self, executor: E, loan_id: Uuid) -> Result<Vec<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        if self.loan_repo.find_by_id(&mut *tx, loan_id).await?.is_none() {
            return Err(AppError::LoanNotFound);
        }
        let installments = self.repo.list_by_loan(&mut *tx, loan_id).await?;

        tx.commit().await?;
        Ok(installments)
    }

    pub async fn list_installments<'e, E>(
        &self,
        executor: E,
        status: Option<InstallmentStatus>,
        due_before: Option<NaiveDate>,
    ) -> Result<Vec<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_installments(executor, status, due_before).await
    }

    pub async fn get_installment<'e, E>(&self, executor: E, id: Uuid) -> Result<Installment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, id)
            .await?
            .ok_or(AppError::InstallmentNotFound)
    }

    /// Replaces the whole payment ledger of an installment.
    pub async fn record_payments<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        groups: &[PaymentGroup],
        payment_date: Option<NaiveDate>,
    ) -> Result<Installment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::InstallmentNotFound)?;

        let recomputed = payments::recompute(groups, current.installment_amount, current.is_overdue, payment_date);
        let saved = self.repo.save_payments(&mut *tx, id, &recomputed).await?;

        tx.commit().await?;

        tracing::info!(
            installment_id = %saved.id,
            amount_paid = %saved.amount_paid,
            status = ?saved.status,
            "💵 Payments recorded"
        );

        Ok(saved)
    }

    /// Partial edit; fields left as `None` keep their stored value.
    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        remarks: Option<&str>,
        is_overdue: Option<bool>,
    ) -> Result<Installment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::InstallmentNotFound)?;

        let is_overdue = is_overdue.unwrap_or(current.is_overdue);
        let remarks = match remarks {
            Some(text) => normalize_remarks(text),
            None => current.remarks.as_deref(),
        };
        let status = InstallmentStatus::derive(current.amount_paid, current.installment_amount, is_overdue);

        let saved = self.repo.update_details(&mut *tx, id, remarks, is_overdue, status).await?;

        tx.commit().await?;
        Ok(saved)
    }

    pub async fn flag_overdue<'e, E>(&self, executor: E, as_of: NaiveDate) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let flagged = self.repo.flag_overdue(executor, as_of).await?;
        tracing::info!(%as_of, flagged, "⏰ Overdue sweep finished");
        Ok(flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_remarks_clear_the_field() {
        assert_eq!(normalize_remarks("   "), None);
        assert_eq!(normalize_remarks(" called twice "), Some("called twice"));
    }
}
