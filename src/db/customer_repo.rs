// src/db/customer_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::customer::Customer};

const CUSTOMER_COLUMNS: &str = r#"
    id, full_name, phone, address, id_proof,
    guarantor_name, guarantor_phone, created_at, updated_at
"#;

/// Fields written on create and on full update.
#[derive(Debug, Clone)]
pub struct CustomerFields<'a> {
    pub full_name: &'a str,
    pub phone: &'a str,
    pub address: Option<&'a str>,
    pub id_proof: Option<&'a str>,
    pub guarantor_name: Option<&'a str>,
    pub guarantor_phone: Option<&'a str>,
}

#[derive(Clone, Default)]
pub struct CustomerRepository;

impl CustomerRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        fields: &CustomerFields<'_>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (
                full_name, phone, address, id_proof, guarantor_name, guarantor_phone
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(fields.full_name)
        .bind(fields.phone)
        .bind(fields.address)
        .bind(fields.id_proof)
        .bind(fields.guarantor_name)
        .bind(fields.guarantor_phone)
        .fetch_one(executor)
        .await?;

        Ok(customer)
    }

    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: &CustomerFields<'_>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET full_name = $2, phone = $3, address = $4, id_proof = $5,
                guarantor_name = $6, guarantor_phone = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(fields.full_name)
        .bind(fields.phone)
        .bind(fields.address)
        .bind(fields.id_proof)
        .bind(fields.guarantor_name)
        .bind(fields.guarantor_phone)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::CustomerNotFound)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(customer)
    }

    /// Lists customers, optionally filtered by name or phone fragment.
    pub async fn list_customers<'e, E>(
        &self,
        executor: E,
        search: Option<&str>,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE $1::text IS NULL OR full_name ILIKE $1 OR phone ILIKE $1
            ORDER BY full_name ASC
            "#
        ))
        .bind(pattern)
        .fetch_all(executor)
        .await?;

        Ok(customers)
    }
}
