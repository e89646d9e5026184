// src/services/expense_service.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{expense_repo::ExpenseFields, ExpenseRepository},
    models::expense::Expense,
};

#[derive(Clone)]
pub struct ExpenseService {
    repo: ExpenseRepository,
}

impl ExpenseService {
    pub fn new(repo: ExpenseRepository) -> Self {
        Self { repo }
    }

    pub async fn create_expense<'e, E>(&self, executor: E, fields: &ExpenseFields<'_>) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_expense(executor, fields).await
    }

    pub async fn list_expenses<'e, E>(
        &self,
        executor: E,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Expense>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_expenses(executor, from, to).await
    }

    pub async fn get_expense<'e, E>(&self, executor: E, id: Uuid) -> Result<Expense, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, id)
            .await?
            .ok_or(AppError::ExpenseNotFound)
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
        self.repo.update_expense(executor, id, fields).await
    }

    pub async fn delete_expense<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.delete_expense(executor, id).await?;
        tracing::info!(expense_id = %id, "Expense deleted");
        Ok(())
    }
}
