// src/db/employee_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::employee::Employee};

const EMPLOYEE_COLUMNS: &str = r#"
    id, full_name, phone, designation, monthly_salary, joining_date,
    is_active, created_at, updated_at
"#;

#[derive(Debug, Clone)]
pub struct EmployeeFields<'a> {
    pub full_name: &'a str,
    pub phone: Option<&'a str>,
    pub designation: Option<&'a str>,
    pub monthly_salary: Decimal,
    pub joining_date: NaiveDate,
}

#[derive(Clone, Default)]
pub struct EmployeeRepository;

impl EmployeeRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_employee<'e, E>(&self, executor: E, fields: &EmployeeFields<'_>) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            INSERT INTO employees (full_name, phone, designation, monthly_salary, joining_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(fields.full_name)
        .bind(fields.phone)
        .bind(fields.designation)
        .bind(fields.monthly_salary)
        .bind(fields.joining_date)
        .fetch_one(executor)
        .await?;

        Ok(employee)
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
        sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees
            SET full_name = $2, phone = $3, designation = $4, monthly_salary = $5,
                joining_date = $6, is_active = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(fields.full_name)
        .bind(fields.phone)
        .bind(fields.designation)
        .bind(fields.monthly_salary)
        .bind(fields.joining_date)
        .bind(is_active)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::EmployeeNotFound)
    }

    pub async fn deactivate<'e, E>(&self, executor: E, id: Uuid) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Employee>(&format!(
            "UPDATE employees SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING {EMPLOYEE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::EmployeeNotFound)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(employee)
    }

    pub async fn list_employees<'e, E>(&self, executor: E, include_inactive: bool) -> Result<Vec<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employees = sqlx::query_as::<_, Employee>(&format!(
            r#"
            SELECT {EMPLOYEE_COLUMNS}
            FROM employees
            WHERE $1 OR is_active
            ORDER BY full_name ASC
            "#
        ))
        .bind(include_inactive)
        .fetch_all(executor)
        .await?;

        Ok(employees)
    }
}
