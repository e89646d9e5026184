// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{common::error::ApiError, config::AppState, middleware::i18n::Locale};

// GET /api/loans/{id}/statement
#[utoipa::path(
    get,
    path = "/api/loans/{id}/statement",
    tag = "Loans",
    params(("id" = Uuid, Path, description = "Loan id")),
    responses(
        (status = 200, description = "PDF statement (application/pdf) with the installment schedule"),
        (status = 404, description = "Loan not found"),
        (status = 500, description = "Statement could not be rendered")
    ),
    security(("api_jwt" = []))
)]
pub async fn loan_statement(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(loan_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let pdf_bytes = app_state
        .document_service
        .generate_loan_statement(&app_state.db_pool, loan_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"loan_statement_{}.pdf\"", loan_id),
        ),
    ];

    Ok((headers, pdf_bytes).into_response())
}
