// src/models/expense.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,

    #[schema(example = "Office rent")]
    pub title: String,

    #[schema(example = "15000.00")]
    pub amount: Decimal,

    #[schema(example = "Rent")]
    pub category: Option<String>,

    #[schema(value_type = String, format = Date, example = "2024-03-01")]
    pub expense_date: NaiveDate,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
