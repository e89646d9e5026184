// src/handlers/customers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        validation::{ensure_start_not_before_loan, validate_amount, validate_rate},
    },
    config::AppState,
    db::customer_repo::CustomerFields,
    middleware::i18n::Locale,
    models::{
        customer::{Customer, CustomerWithLoan},
        loan::InterestPolicy,
    },
    services::loan_service::LoanDraft,
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Ramesh Kumar")]
    pub full_name: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "9876543210")]
    pub phone: String,

    pub address: Option<String>,
    pub id_proof: Option<String>,
    pub guarantor_name: Option<String>,
    pub guarantor_phone: Option<String>,
}

impl CustomerPayload {
    fn fields(&self) -> CustomerFields<'_> {
        CustomerFields {
            full_name: self.full_name.trim(),
            phone: self.phone.trim(),
            address: self.address.as_deref(),
            id_proof: self.id_proof.as_deref(),
            guarantor_name: self.guarantor_name.as_deref(),
            guarantor_phone: self.guarantor_phone.as_deref(),
        }
    }
}

/// Loan opened together with a new customer. Always on flat interest.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLoanPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "LN-2024-0042")]
    pub loan_number: String,

    #[validate(custom(function = "validate_amount"))]
    #[schema(example = "100000.00")]
    pub principal: Decimal,

    #[validate(custom(function = "validate_rate"))]
    #[schema(example = "2.00")]
    pub interest_rate: Decimal,

    #[validate(range(min = 1, max = 600, message = "tenure_out_of_range"))]
    #[schema(example = 12)]
    pub tenure_months: i32,

    #[schema(value_type = String, format = Date, example = "2024-01-10")]
    pub loan_date: NaiveDate,

    #[schema(value_type = Option<String>, format = Date, example = "2024-02-10")]
    pub emi_start_date: Option<NaiveDate>,

    pub vehicle_number: Option<String>,
    pub remarks: Option<String>,
}

impl CustomerLoanPayload {
    fn draft(&self) -> LoanDraft<'_> {
        LoanDraft {
            loan_number: &self.loan_number,
            principal: self.principal,
            interest_rate: self.interest_rate,
            tenure_months: self.tenure_months,
            interest_policy: Some(InterestPolicy::Flat),
            loan_date: self.loan_date,
            emi_start_date: self.emi_start_date,
            vehicle_number: self.vehicle_number.as_deref(),
            remarks: self.remarks.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[serde(flatten)]
    #[validate(nested)]
    pub customer: CustomerPayload,

    #[validate(nested)]
    pub loan: Option<CustomerLoanPayload>,
}

#[derive(Debug, Deserialize)]
pub struct ListCustomersQuery {
    pub search: Option<String>,
}

// =============================================================================
//  HANDLERS
// =============================================================================

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Customer created (with its loan when one was sent)", body = CustomerWithLoan),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Loan number already exists")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    if let Some(loan) = &payload.loan {
        ensure_start_not_before_loan(loan.loan_date, loan.emi_start_date)
            .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;
    }

    let draft = payload.loan.as_ref().map(CustomerLoanPayload::draft);

    let created = app_state
        .customer_service
        .create_customer(&app_state.db_pool, &payload.customer.fields(), draft.as_ref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    params(
        ("search" = Option<String>, Query, description = "Name or phone fragment")
    ),
    responses(
        (status = 200, description = "Customers ordered by name", body = Vec<Customer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListCustomersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state
        .customer_service
        .list_customers(&app_state.db_pool, query.search.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customers)))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer", body = Customer),
        (status = 404, description = "Customer not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .customer_service
        .get_customer(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customer)))
}

// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "Customer id")),
    request_body = CustomerPayload,
    responses(
        (status = 200, description = "Customer updated", body = Customer),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Customer not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .customer_service
        .update_customer(&app_state.db_pool, id, &payload.fields())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_loan_is_validated() {
        let payload: CreateCustomerPayload = serde_json::from_value(json!({
            "fullName": "Ramesh Kumar",
            "phone": "9876543210",
            "loan": {
                "loanNumber": "LN-1",
                "principal": 0,
                "interestRate": 2,
                "tenureMonths": 12,
                "loanDate": "2024-01-10"
            }
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("loan"));
    }

    #[test]
    fn customer_without_loan_is_valid() {
        let payload: CreateCustomerPayload = serde_json::from_value(json!({
            "fullName": "Ramesh Kumar",
            "phone": "9876543210",
            "address": "12, MG Road, Pune"
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
        assert!(payload.loan.is_none());
        assert_eq!(payload.customer.fields().address, Some("12, MG Road, Pune"));
    }

    #[test]
    fn nested_loan_is_always_flat() {
        let payload: CustomerLoanPayload = serde_json::from_value(json!({
            "loanNumber": "LN-1",
            "principal": 50000,
            "interestRate": 1.5,
            "tenureMonths": 10,
            "loanDate": "2024-01-10"
        }))
        .unwrap();

        assert_eq!(payload.draft().interest_policy, Some(InterestPolicy::Flat));
    }
}
