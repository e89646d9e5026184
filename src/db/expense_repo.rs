// src/db/expense_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::expense::Expense};

const EXPENSE_COLUMNS: &str =
    "id, title, amount, category, expense_date, notes, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct ExpenseFields<'a> {
    pub title: &'a str,
    pub amount: Decimal,
    pub category: Option<&'a str>,
    pub expense_date: NaiveDate,
    pub notes: Option<&'a str>,
}

#[derive(Clone, Default)]
pub struct ExpenseRepository;

impl ExpenseRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_expense<'e, E>(&self, executor: E, fields: &ExpenseFields<'_>) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            r#"
            INSERT INTO expenses (title, amount, category, expense_date, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(fields.title)
        .bind(fields.amount)
        .bind(fields.category)
        .bind(fields.expense_date)
        .bind(fields.notes)
        .fetch_one(executor)
        .await?;

        Ok(expense)
    }

    pub async fn update_expense<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: &ExpenseFields<'_>,
    ) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Expense>(&format!(
            r#"
            UPDATE expenses
            SET title = $2, amount = $3, category = $4, expense_date = $5, notes = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(fields.title)
        .bind(fields.amount)
        .bind(fields.category)
        .bind(fields.expense_date)
        .bind(fields.notes)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::ExpenseNotFound)
    }

    pub async fn delete_expense<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ExpenseNotFound);
        }
        Ok(())
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Expense>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(expense)
    }

    /// Inclusive date range, either end optional.
    pub async fn list_expenses<'e, E>(
        &self,
        executor: E,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Expense>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            r#"
            SELECT {EXPENSE_COLUMNS}
            FROM expenses
            WHERE ($1::date IS NULL OR expense_date >= $1)
              AND ($2::date IS NULL OR expense_date <= $2)
            ORDER BY expense_date DESC, created_at DESC
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;

        Ok(expenses)
    }
}
