// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::common::i18n::{I18nStore, DEFAULT_LANG};
use crate::middleware::i18n::Locale;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail already exists")]
    EmailAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Customer not found")]
    CustomerNotFound,

    #[error("Loan not found")]
    LoanNotFound,

    #[error("Installment not found")]
    InstallmentNotFound,

    #[error("Expense not found")]
    ExpenseNotFound,

    #[error("Employee not found")]
    EmployeeNotFound,

    #[error("Loan number already exists: {0}")]
    LoanNumberAlreadyExists(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("PDF rendering failed: {0}")]
    PdfRenderError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Error as it leaves the API: status plus a message already in the
/// caller's language.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<HashMap<String, Vec<String>>>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidSchedule(_) => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists | AppError::LoanNumberAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound
            | AppError::CustomerNotFound
            | AppError::LoanNotFound
            | AppError::InstallmentNotFound
            | AppError::ExpenseNotFound
            | AppError::EmployeeNotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Catalog key of the user-facing message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::UserNotFound => "user_not_found",
            AppError::CustomerNotFound => "customer_not_found",
            AppError::LoanNotFound => "loan_not_found",
            AppError::InstallmentNotFound => "installment_not_found",
            AppError::ExpenseNotFound => "expense_not_found",
            AppError::EmployeeNotFound => "employee_not_found",
            AppError::LoanNumberAlreadyExists(_) => "loan_number_exists",
            AppError::InvalidSchedule(_) => "invalid_schedule",
            AppError::FontNotFound(_) | AppError::PdfRenderError(_) => "statement_unavailable",
            _ => "internal_error",
        }
    }

    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal server error: {}", self);
        }

        match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_deref().unwrap_or(&e.code);
                            store.translate(lang, code)
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ApiError {
                    status,
                    message: store.translate(lang, "validation_failed"),
                    details: Some(details),
                }
            }
            AppError::LoanNumberAlreadyExists(number) => ApiError {
                status,
                message: store.translate_with(lang, "loan_number_exists", &number),
                details: None,
            },
            AppError::InvalidSchedule(reason) => ApiError {
                status,
                message: store.translate_with(lang, "invalid_schedule", &reason),
                details: None,
            },
            other => ApiError {
                status,
                message: store.translate(lang, other.code()),
                details: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Used where no locale is at hand (middleware rejections).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale(DEFAULT_LANG.to_string()), &I18nStore::new())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "required"))]
        name: String,
    }

    fn en() -> Locale {
        Locale("en".to_string())
    }

    #[test]
    fn not_found_maps_to_404_with_translated_message() {
        let store = I18nStore::new();
        let api = AppError::LoanNotFound.to_api_error(&Locale("hi".to_string()), &store);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.message, "ऋण नहीं मिला।");
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let store = I18nStore::new();
        let errors = Probe { name: String::new() }.validate().unwrap_err();

        let api = AppError::ValidationError(errors).to_api_error(&en(), &store);

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.unwrap();
        assert_eq!(details["name"], vec!["This field is required.".to_string()]);
    }

    #[test]
    fn duplicate_loan_number_is_a_conflict() {
        let store = I18nStore::new();
        let api = AppError::LoanNumberAlreadyExists("LN-1".to_string()).to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.message, "Loan number 'LN-1' already exists.");
    }

    #[test]
    fn database_errors_hide_details() {
        let store = I18nStore::new();
        let api = AppError::DatabaseError(sqlx::Error::RowNotFound).to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "An unexpected error occurred.");
    }
}
