// src/db/installment_repo.rs

use chrono::NaiveDate;
use sqlx::{types::Json, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    engine::{InstallmentUpdate, RecomputedPayments},
    models::installment::{Installment, InstallmentStatus, NewInstallment},
};

const INSTALLMENT_COLUMNS: &str = r#"
    id, loan_id, loan_number, customer_name, installment_number, due_date,
    installment_amount, amount_paid, payment_mode, payment_date,
    is_overdue, status, remarks, payment_history, created_at, updated_at
"#;

#[derive(Clone, Default)]
pub struct InstallmentRepository;

impl InstallmentRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  SCHEDULE WRITES
    // =========================================================================

    /// Bulk insert in a single statement.
    pub async fn insert_many<'e, E>(
        &self,
        executor: E,
        rows: &[NewInstallment],
    ) -> Result<Vec<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut loan_ids = Vec::with_capacity(rows.len());
        let mut loan_numbers = Vec::with_capacity(rows.len());
        let mut customer_names = Vec::with_capacity(rows.len());
        let mut numbers = Vec::with_capacity(rows.len());
        let mut due_dates = Vec::with_capacity(rows.len());
        let mut amounts = Vec::with_capacity(rows.len());
        let mut paid = Vec::with_capacity(rows.len());
        let mut statuses = Vec::with_capacity(rows.len());
        for row in rows {
            loan_ids.push(row.loan_id);
            loan_numbers.push(row.loan_number.clone());
            customer_names.push(row.customer_name.clone());
            numbers.push(row.installment_number);
            due_dates.push(row.due_date);
            amounts.push(row.installment_amount);
            paid.push(row.amount_paid);
            statuses.push(row.status);
        }

        // One statement for the whole schedule, arrays zipped by UNNEST.
        let mut inserted = sqlx::query_as::<_, Installment>(&format!(
            r#"
            INSERT INTO installments (
                loan_id, loan_number, customer_name, installment_number,
                due_date, installment_amount, amount_paid, status
            )
            SELECT * FROM UNNEST(
                $1::uuid[], $2::text[], $3::text[], $4::int4[],
                $5::date[], $6::numeric[], $7::numeric[], $8::installment_status[]
            )
            RETURNING {INSTALLMENT_COLUMNS}
            "#
        ))
        .bind(&loan_ids)
        .bind(&loan_numbers)
        .bind(&customer_names)
        .bind(&numbers)
        .bind(&due_dates)
        .bind(&amounts)
        .bind(&paid)
        .bind(&statuses)
        .fetch_all(executor)
        .await?;

        inserted.sort_by_key(|row| row.installment_number);

        Ok(inserted)
    }

    pub async fn apply_update<'e, E>(&self, executor: E, update: &InstallmentUpdate) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE installments
            SET due_date = $2, installment_amount = $3, status = $4,
                loan_number = $5, customer_name = $6, updated_at = NOW()
            WHERE id = $1 AND installment_number = $7
            "#,
        )
        .bind(update.id)
        .bind(update.due_date)
        .bind(update.installment_amount)
        .bind(update.status)
        .bind(&update.loan_number)
        .bind(&update.customer_name)
        .bind(update.installment_number)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InstallmentNotFound);
        }

        Ok(())
    }

    pub async fn delete_many<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if ids.is_empty() {
            return Ok(0);
        }

        // Rows that picked up money are never removed, whatever the caller planned.
        let result = sqlx::query(
            r#"
            DELETE FROM installments
            WHERE id = ANY($1)
              AND amount_paid = 0
              AND payment_history = '[]'::jsonb
            "#,
        )
        .bind(ids)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Stores the recomputed ledger state of one installment.
    pub async fn save_payments<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payments: &RecomputedPayments,
    ) -> Result<Installment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Installment>(&format!(
            r#"
            UPDATE installments
            SET payment_history = $2, amount_paid = $3, payment_mode = $4,
                payment_date = $5, status = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {INSTALLMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(Json(&payments.payment_history))
        .bind(payments.amount_paid)
        .bind(payments.payment_mode.as_deref())
        .bind(payments.payment_date)
        .bind(payments.status)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::InstallmentNotFound)
    }

    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        remarks: Option<&str>,
        is_overdue: bool,
        status: InstallmentStatus,
    ) -> Result<Installment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Installment>(&format!(
            r#"
            UPDATE installments
            SET remarks = $2, is_overdue = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {INSTALLMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(remarks)
        .bind(is_overdue)
        .bind(status)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::InstallmentNotFound)
    }

    /// Flags every unsettled installment due before `as_of`. Only rows with
    /// nothing paid switch their status to Overdue.
    pub async fn flag_overdue<'e, E>(&self, executor: E, as_of: NaiveDate) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE installments
            SET is_overdue = TRUE,
                status = CASE WHEN amount_paid <= 0 THEN 'OVERDUE'::installment_status ELSE status END,
                updated_at = NOW()
            WHERE status <> 'PAID'
              AND due_date < $1
              AND is_overdue = FALSE
            "#,
        )
        .bind(as_of)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn rename_customer<'e, E>(&self, executor: E, customer_id: Uuid, customer_name: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE installments
            SET customer_name = $2, updated_at = NOW()
            WHERE loan_id IN (SELECT id FROM loans WHERE customer_id = $1)
              AND customer_name <> $2
            "#,
        )
        .bind(customer_id)
        .bind(customer_name)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    //  READS
    // =========================================================================

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let installment = sqlx::query_as::<_, Installment>(&format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(installment)
    }

    pub async fn find_by_id_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let installment = sqlx::query_as::<_, Installment>(&format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(installment)
    }

    pub async fn list_by_loan<'e, E>(&self, executor: E, loan_id: Uuid) -> Result<Vec<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let installments = sqlx::query_as::<_, Installment>(&format!(
            r#"
            SELECT {INSTALLMENT_COLUMNS}
            FROM installments
            WHERE loan_id = $1
            ORDER BY installment_number ASC
            "#
        ))
        .bind(loan_id)
        .fetch_all(executor)
        .await?;

        Ok(installments)
    }

    /// Same as `list_by_loan`, holding row locks until the transaction ends so
    /// payments cannot land on rows that are being rewritten.
    pub async fn list_by_loan_for_update<'e, E>(&self, executor: E, loan_id: Uuid) -> Result<Vec<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let installments = sqlx::query_as::<_, Installment>(&format!(
            r#"
            SELECT {INSTALLMENT_COLUMNS}
            FROM installments
            WHERE loan_id = $1
            ORDER BY installment_number ASC
            FOR UPDATE
            "#
        ))
        .bind(loan_id)
        .fetch_all(executor)
        .await?;

        Ok(installments)
    }

    /// Collection list across loans.
    pub async fn list_installments<'e, E>(
        &self,
        executor: E,
        status: Option<InstallmentStatus>,
        due_before: Option<NaiveDate>,
    ) -> Result<Vec<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let installments = sqlx::query_as::<_, Installment>(&format!(
            r#"
            SELECT {INSTALLMENT_COLUMNS}
            FROM installments
            WHERE ($1::installment_status IS NULL OR status = $1)
              AND ($2::date IS NULL OR due_date < $2)
            ORDER BY due_date ASC, loan_number ASC, installment_number ASC
            "#
        ))
        .bind(status)
        .bind(due_before)
        .fetch_all(executor)
        .await?;

        Ok(installments)
    }
}
