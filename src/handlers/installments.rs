// src/handlers/installments.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    engine::PaymentGroup,
    middleware::i18n::Locale,
    models::installment::{Installment, InstallmentStatus},
};

// =============================================================================
//  PAYLOADS
// =============================================================================

/// The complete payment ledger. Whatever is left out is removed.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentsPayload {
    #[validate(nested)]
    pub payments: Vec<PaymentGroup>,

    /// Overrides the latest payment date.
    #[schema(value_type = Option<String>, format = Date, example = "2024-03-10")]
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInstallmentPayload {
    /// Empty string clears the remarks.
    #[validate(length(max = 1000))]
    pub remarks: Option<String>,
    pub is_overdue: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInstallmentsQuery {
    pub status: Option<InstallmentStatus>,
    pub due_before: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagOverdueQuery {
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlagOverdueResponse {
    #[schema(value_type = String, format = Date)]
    pub as_of: NaiveDate,
    pub flagged: u64,
}

// =============================================================================
//  HANDLERS
// =============================================================================

// GET /api/installments
#[utoipa::path(
    get,
    path = "/api/installments",
    tag = "Installments",
    params(
        ("status" = Option<InstallmentStatus>, Query, description = "Pending, Partially Paid, Paid or Overdue"),
        ("dueBefore" = Option<String>, Query, description = "Only installments due before this date (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Installments across loans, earliest due first", body = Vec<Installment>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_installments(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ListInstallmentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let installments = app_state
        .installment_service
        .list_installments(&app_state.db_pool, query.status, query.due_before)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(installments)))
}

// GET /api/installments/{id}
#[utoipa::path(
    get,
    path = "/api/installments/{id}",
    tag = "Installments",
    params(("id" = Uuid, Path, description = "Installment id")),
    responses(
        (status = 200, description = "Installment", body = Installment),
        (status = 404, description = "Installment not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_installment(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let installment = app_state
        .installment_service
        .get_installment(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(installment)))
}

// PUT /api/installments/{id}/payments
#[utoipa::path(
    put,
    path = "/api/installments/{id}/payments",
    tag = "Installments",
    params(("id" = Uuid, Path, description = "Installment id")),
    request_body = RecordPaymentsPayload,
    responses(
        (status = 200, description = "Ledger replaced, totals and status recomputed", body = Installment),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Installment not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_payments(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordPaymentsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let installment = app_state
        .installment_service
        .record_payments(&app_state.db_pool, id, &payload.payments, payload.payment_date)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(installment)))
}

// PATCH /api/installments/{id}
#[utoipa::path(
    patch,
    path = "/api/installments/{id}",
    tag = "Installments",
    params(("id" = Uuid, Path, description = "Installment id")),
    request_body = UpdateInstallmentPayload,
    responses(
        (status = 200, description = "Installment updated", body = Installment),
        (status = 404, description = "Installment not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_installment(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInstallmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let installment = app_state
        .installment_service
        .update_details(&app_state.db_pool, id, payload.remarks.as_deref(), payload.is_overdue)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(installment)))
}

// POST /api/installments/flag-overdue
#[utoipa::path(
    post,
    path = "/api/installments/flag-overdue",
    tag = "Installments",
    params(
        ("asOf" = Option<String>, Query, description = "Cut-off date (YYYY-MM-DD), today when omitted")
    ),
    responses(
        (status = 200, description = "Unpaid installments due before the cut-off flagged", body = FlagOverdueResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn flag_overdue(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<FlagOverdueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let flagged = app_state
        .installment_service
        .flag_overdue(&app_state.db_pool, as_of)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(FlagOverdueResponse { as_of, flagged })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn group_without_entries_is_accepted() {
        let payload: RecordPaymentsPayload = serde_json::from_value(json!({
            "payments": [
                { "date": "2024-03-01", "entries": [{ "amount": 500, "mode": "Cash" }] },
                { "date": "2024-03-09", "entries": [] },
                { "date": "2024-03-10" }
            ]
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
    }

    #[test]
    fn payment_amount_beyond_two_decimals_is_rejected() {
        let payload: RecordPaymentsPayload = serde_json::from_value(json!({
            "payments": [
                { "date": "2024-03-01", "entries": [{ "amount": "100.005", "mode": "Cash" }] }
            ]
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }

    #[test]
    fn empty_ledger_is_accepted() {
        let payload: RecordPaymentsPayload = serde_json::from_value(json!({ "payments": [] })).unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn status_filter_uses_display_labels() {
        let query: ListInstallmentsQuery = serde_json::from_value(json!({
            "status": "Partially Paid",
            "dueBefore": "2024-04-01"
        }))
        .unwrap();

        assert_eq!(query.status, Some(InstallmentStatus::PartiallyPaid));
        assert_eq!(query.due_before, NaiveDate::from_ymd_opt(2024, 4, 1));
    }
}
