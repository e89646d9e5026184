// src/models/employee.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,

    #[schema(example = "Priya Sharma")]
    pub full_name: String,

    #[schema(example = "9123456780")]
    pub phone: Option<String>,

    #[schema(example = "Collection Agent")]
    pub designation: Option<String>,

    #[schema(example = "18000.00")]
    pub monthly_salary: Decimal,

    #[schema(value_type = String, format = Date, example = "2023-06-01")]
    pub joining_date: NaiveDate,

    // Employees are deactivated, not deleted
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
