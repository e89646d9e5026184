// src/handlers/loans.rs

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
    middleware::i18n::Locale,
    models::{
        installment::Installment,
        loan::{BackfillReport, InterestPolicy, Loan, LoanDetail, LoanStatus, LoanUpdateResult},
    },
    services::loan_service::LoanDraft,
};

// =============================================================================
//  PAYLOADS
// =============================================================================

/// Loan terms shared by create and edit.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanTermsPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "LN-2024-0042")]
    pub loan_number: String,

    #[validate(custom(function = "validate_amount"))]
    #[schema(example = "100000.00")]
    pub principal: Decimal,

    /// Percent per month for flat loans, per year for reducing balance.
    #[validate(custom(function = "validate_rate"))]
    #[schema(example = "2.00")]
    pub interest_rate: Decimal,

    #[validate(range(min = 1, max = 600, message = "tenure_out_of_range"))]
    #[schema(example = 12)]
    pub tenure_months: i32,

    pub interest_policy: Option<InterestPolicy>,

    #[schema(value_type = String, format = Date, example = "2024-01-10")]
    pub loan_date: NaiveDate,

    #[schema(value_type = Option<String>, format = Date, example = "2024-02-10")]
    pub emi_start_date: Option<NaiveDate>,

    #[schema(example = "MH12AB1234")]
    pub vehicle_number: Option<String>,
    pub remarks: Option<String>,
}

impl LoanTermsPayload {
    fn draft(&self) -> LoanDraft<'_> {
        LoanDraft {
            loan_number: &self.loan_number,
            principal: self.principal,
            interest_rate: self.interest_rate,
            tenure_months: self.tenure_months,
            interest_policy: self.interest_policy,
            loan_date: self.loan_date,
            emi_start_date: self.emi_start_date,
            vehicle_number: self.vehicle_number.as_deref(),
            remarks: self.remarks.as_deref(),
        }
    }

    fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        ensure_start_not_before_loan(self.loan_date, self.emi_start_date)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanPayload {
    pub customer_id: Uuid,

    #[serde(flatten)]
    #[validate(nested)]
    pub terms: LoanTermsPayload,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLoanStatusPayload {
    pub status: LoanStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLoansQuery {
    pub status: Option<LoanStatus>,
    pub customer_id: Option<Uuid>,
}

// =============================================================================
//  HANDLERS
// =============================================================================

// POST /api/loans
#[utoipa::path(
    post,
    path = "/api/loans",
    tag = "Loans",
    request_body = CreateLoanPayload,
    responses(
        (status = 201, description = "Loan created with its installment schedule", body = LoanDetail),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Loan number already exists")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_loan(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateLoanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .terms
        .check()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .loan_service
        .create_loan(&app_state.db_pool, payload.customer_id, &payload.terms.draft())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// GET /api/loans
#[utoipa::path(
    get,
    path = "/api/loans",
    tag = "Loans",
    params(
        ("status" = Option<LoanStatus>, Query, description = "Active, Closed or Seized"),
        ("customerId" = Option<Uuid>, Query, description = "Only loans of this customer")
    ),
    responses(
        (status = 200, description = "Loans, newest first", body = Vec<Loan>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_loans(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListLoansQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let loans = app_state
        .loan_service
        .list_loans(&app_state.db_pool, query.status, query.customer_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(loans)))
}

// GET /api/loans/{id}
#[utoipa::path(
    get,
    path = "/api/loans/{id}",
    tag = "Loans",
    params(("id" = Uuid, Path, description = "Loan id")),
    responses(
        (status = 200, description = "Loan with schedule and totals", body = LoanDetail),
        (status = 404, description = "Loan not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_loan(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .loan_service
        .get_loan_detail(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// PUT /api/loans/{id}
#[utoipa::path(
    put,
    path = "/api/loans/{id}",
    tag = "Loans",
    params(("id" = Uuid, Path, description = "Loan id")),
    request_body = LoanTermsPayload,
    responses(
        (status = 200, description = "Loan updated and schedule reconciled", body = LoanUpdateResult),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan number already exists")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_loan(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<LoanTermsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .check()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .loan_service
        .update_loan(&app_state.db_pool, id, &payload.draft())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}

// PATCH /api/loans/{id}/status
#[utoipa::path(
    patch,
    path = "/api/loans/{id}/status",
    tag = "Loans",
    params(("id" = Uuid, Path, description = "Loan id")),
    request_body = UpdateLoanStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = Loan),
        (status = 404, description = "Loan not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_loan_status(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLoanStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let loan = app_state
        .loan_service
        .set_status(&app_state.db_pool, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(loan)))
}

// GET /api/loans/{id}/installments
#[utoipa::path(
    get,
    path = "/api/loans/{id}/installments",
    tag = "Installments",
    params(("id" = Uuid, Path, description = "Loan id")),
    responses(
        (status = 200, description = "Schedule ordered by installment number", body = Vec<Installment>),
        (status = 404, description = "Loan not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_loan_installments(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let installments = app_state
        .installment_service
        .list_by_loan(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(installments)))
}

// POST /api/loans/backfill-installments
#[utoipa::path(
    post,
    path = "/api/loans/backfill-installments",
    tag = "Loans",
    responses(
        (status = 200, description = "Schedules generated for loans that had none", body = BackfillReport)
    ),
    security(("api_jwt" = []))
)]
pub async fn backfill_installments(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .loan_service
        .backfill_installments(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn terms(overrides: serde_json::Value) -> LoanTermsPayload {
        let mut body = json!({
            "loanNumber": "LN-2024-0042",
            "principal": 100000,
            "interestRate": 2,
            "tenureMonths": 12,
            "loanDate": "2024-01-10"
        });
        if let (Some(base), Some(extra)) = (body.as_object_mut(), overrides.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(body).unwrap()
    }

    fn failing_fields(payload: &LoanTermsPayload) -> Vec<String> {
        match payload.check() {
            Err(AppError::ValidationError(errors)) => {
                let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
                fields.sort();
                fields
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(()) => Vec::new(),
        }
    }

    #[test]
    fn valid_terms_pass() {
        assert!(failing_fields(&terms(json!({}))).is_empty());
    }

    #[test]
    fn zero_principal_and_tenure_are_rejected() {
        let payload = terms(json!({ "principal": 0, "tenureMonths": 0 }));
        assert_eq!(failing_fields(&payload), vec!["principal", "tenure_months"]);
    }

    #[test]
    fn negative_rate_is_rejected() {
        let payload = terms(json!({ "interestRate": -1 }));
        assert_eq!(failing_fields(&payload), vec!["interest_rate"]);
    }

    #[test]
    fn terms_beyond_column_range_or_precision_are_rejected() {
        let payload = terms(json!({ "principal": 1000000000000000u64, "interestRate": 10000 }));
        assert_eq!(failing_fields(&payload), vec!["interest_rate", "principal"]);

        let payload = terms(json!({ "principal": "100000.005", "interestRate": "2.0005" }));
        assert_eq!(failing_fields(&payload), vec!["interest_rate", "principal"]);
    }

    #[test]
    fn start_before_loan_date_is_rejected() {
        let payload = terms(json!({ "emiStartDate": "2024-01-09" }));
        assert_eq!(failing_fields(&payload), vec!["emi_start_date"]);
    }

    #[test]
    fn policy_is_optional_and_lowercase() {
        assert_eq!(terms(json!({})).interest_policy, None);
        assert_eq!(
            terms(json!({ "interestPolicy": "amortizing" })).draft().interest_policy,
            Some(InterestPolicy::Amortizing)
        );
    }
}
