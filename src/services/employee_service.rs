// src/services/employee_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{employee_repo::EmployeeFields, EmployeeRepository},
    models::employee::Employee,
};

#[derive(Clone)]
pub struct EmployeeService {
    repo: EmployeeRepository,
}

impl EmployeeService {
    pub fn new(repo: EmployeeRepository) -> Self {
        Self { repo }
    }

    pub async fn create_employee<'e, E>(&self, executor: E, fields: &EmployeeFields<'_>) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_employee(executor, fields).await
    }

    pub async fn list_employees<'e, E>(&self, executor: E, include_inactive: bool) -> Result<Vec<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_employees(executor, include_inactive).await
    }

    pub async fn get_employee<'e, E>(&self, executor: E, id: Uuid) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, id)
            .await?
            .ok_or(AppError::EmployeeNotFound)
    }

    pub async fn update_employee<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: &EmployeeFields<'_>,
        is_active: bool,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.update_employee(executor, id, fields, is_active).await
    }

    // Soft delete: the row stays for salary history
    pub async fn deactivate_employee<'e, E>(&self, executor: E, id: Uuid) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = self.repo.deactivate(executor, id).await?;
        tracing::info!(employee_id = %id, "Employee deactivated");
        Ok(employee)
    }
}
