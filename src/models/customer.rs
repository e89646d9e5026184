// src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,

    #[schema(example = "Ramesh Kumar")]
    pub full_name: String,

    #[schema(example = "9876543210")]
    pub phone: String,

    #[schema(example = "12, MG Road, Pune")]
    pub address: Option<String>,

    // Aadhaar / PAN / voter id, free text
    #[schema(example = "XXXX-XXXX-1234")]
    pub id_proof: Option<String>,

    #[schema(example = "Suresh Kumar")]
    pub guarantor_name: Option<String>,
    pub guarantor_phone: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Customer plus the loan opened with it, when the request carried one.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerWithLoan {
    pub customer: Customer,
    pub loan: Option<crate::models::loan::Loan>,
}
