// src/db/loan_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::loan::{InterestPolicy, Loan, LoanStatus},
};

const LOAN_COLUMNS: &str = r#"
    id, loan_number, customer_id, customer_name,
    principal, interest_rate, tenure_months, interest_policy,
    loan_date, emi_start_date, monthly_emi, total_interest_amount,
    status, vehicle_number, remarks, created_at, updated_at
"#;

/// Everything a loan row stores apart from identity, status and timestamps.
#[derive(Debug, Clone)]
pub struct LoanFields<'a> {
    pub loan_number: &'a str,
    pub customer_id: Uuid,
    pub customer_name: &'a str,
    pub principal: Decimal,
    pub interest_rate: Decimal,
    pub tenure_months: i32,
    pub interest_policy: InterestPolicy,
    pub loan_date: NaiveDate,
    pub emi_start_date: NaiveDate,
    pub monthly_emi: Decimal,
    pub total_interest_amount: Decimal,
    pub vehicle_number: Option<&'a str>,
    pub remarks: Option<&'a str>,
}

fn map_unique_violation(e: sqlx::Error, loan_number: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::LoanNumberAlreadyExists(loan_number.to_string());
        }
    }
    e.into()
}

#[derive(Clone, Default)]
pub struct LoanRepository;

impl LoanRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_loan<'e, E>(&self, executor: E, fields: &LoanFields<'_>) -> Result<Loan, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Loan>(&format!(
            r#"
            INSERT INTO loans (
                loan_number, customer_id, customer_name,
                principal, interest_rate, tenure_months, interest_policy,
                loan_date, emi_start_date, monthly_emi, total_interest_amount,
                vehicle_number, remarks
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {LOAN_COLUMNS}
            "#
        ))
        .bind(fields.loan_number)
        .bind(fields.customer_id)
        .bind(fields.customer_name)
        .bind(fields.principal)
        .bind(fields.interest_rate)
        .bind(fields.tenure_months)
        .bind(fields.interest_policy)
        .bind(fields.loan_date)
        .bind(fields.emi_start_date)
        .bind(fields.monthly_emi)
        .bind(fields.total_interest_amount)
        .bind(fields.vehicle_number)
        .bind(fields.remarks)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, fields.loan_number))
    }

    /// Writes new terms; `customer_id` and `status` are not touched here.
    pub async fn update_loan<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: &LoanFields<'_>,
    ) -> Result<Loan, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Loan>(&format!(
            r#"
            UPDATE loans
            SET loan_number = $2, customer_name = $3,
                principal = $4, interest_rate = $5, tenure_months = $6, interest_policy = $7,
                loan_date = $8, emi_start_date = $9,
                monthly_emi = $10, total_interest_amount = $11,
                vehicle_number = $12, remarks = $13, updated_at = NOW()
            WHERE id = $1
            RETURNING {LOAN_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(fields.loan_number)
        .bind(fields.customer_name)
        .bind(fields.principal)
        .bind(fields.interest_rate)
        .bind(fields.tenure_months)
        .bind(fields.interest_policy)
        .bind(fields.loan_date)
        .bind(fields.emi_start_date)
        .bind(fields.monthly_emi)
        .bind(fields.total_interest_amount)
        .bind(fields.vehicle_number)
        .bind(fields.remarks)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, fields.loan_number))?
        .ok_or(AppError::LoanNotFound)
    }

    pub async fn update_status<'e, E>(&self, executor: E, id: Uuid, status: LoanStatus) -> Result<Loan, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Loan>(&format!(
            "UPDATE loans SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {LOAN_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::LoanNotFound)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Loan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let loan = sqlx::query_as::<_, Loan>(&format!("SELECT {LOAN_COLUMNS} FROM loans WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(loan)
    }

    /// Same as `find_by_id` but locks the row until the transaction ends.
    pub async fn find_by_id_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Loan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let loan = sqlx::query_as::<_, Loan>(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(loan)
    }

    pub async fn list_loans<'e, E>(
        &self,
        executor: E,
        status: Option<LoanStatus>,
        customer_id: Option<Uuid>,
    ) -> Result<Vec<Loan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            r#"
            SELECT {LOAN_COLUMNS}
            FROM loans
            WHERE ($1::loan_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR customer_id = $2)
            ORDER BY loan_date DESC, loan_number ASC
            "#
        ))
        .bind(status)
        .bind(customer_id)
        .fetch_all(executor)
        .await?;

        Ok(loans)
    }

    /// Loans with no installment rows at all, candidates for backfill.
    pub async fn list_without_installments<'e, E>(&self, executor: E) -> Result<Vec<Loan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let loans = sqlx::query_as::<_, Loan>(&format!(
            r#"
            SELECT {LOAN_COLUMNS}
            FROM loans l
            WHERE NOT EXISTS (SELECT 1 FROM installments i WHERE i.loan_id = l.id)
            ORDER BY created_at ASC
            "#
        ))
        .fetch_all(executor)
        .await?;

        Ok(loans)
    }

    /// Refreshes the customer name copied onto the customer's loans.
    pub async fn rename_customer<'e, E>(&self, executor: E, customer_id: Uuid, customer_name: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE loans SET customer_name = $2, updated_at = NOW() WHERE customer_id = $1 AND customer_name <> $2",
        )
        .bind(customer_id)
        .bind(customer_name)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
