// src/handlers/emi.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        validation::{validate_amount, validate_rate},
    },
    config::AppState,
    engine::{calculator, EmiQuote, LoanTerms},
    middleware::i18n::Locale,
    models::loan::InterestPolicy,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateEmiPayload {
    #[validate(custom(function = "validate_amount"))]
    #[schema(example = "100000.00")]
    pub principal: Decimal,

    #[validate(custom(function = "validate_rate"))]
    #[schema(example = "12.00")]
    pub rate: Decimal,

    #[validate(range(min = 1, max = 600, message = "tenure_out_of_range"))]
    #[schema(example = 12)]
    pub tenure: i32,

    /// Reducing balance unless stated otherwise.
    pub policy: Option<InterestPolicy>,
}

impl CalculateEmiPayload {
    fn terms(&self) -> LoanTerms {
        LoanTerms {
            principal: self.principal,
            rate: self.rate,
            tenure: self.tenure,
            policy: self.policy.unwrap_or(InterestPolicy::Amortizing),
        }
    }
}

// POST /api/emi/calculate
#[utoipa::path(
    post,
    path = "/api/emi/calculate",
    tag = "EMI",
    request_body = CalculateEmiPayload,
    responses(
        (status = 200, description = "Installment and totals for the terms", body = EmiQuote),
        (status = 400, description = "Invalid payload")
    ),
    security(("api_jwt" = []))
)]
pub async fn calculate_emi(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CalculateEmiPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(calculator::quote(&payload.terms()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn policy_defaults_to_reducing_balance() {
        let payload: CalculateEmiPayload =
            serde_json::from_value(json!({ "principal": 100000, "rate": 12, "tenure": 12 })).unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.terms().policy, InterestPolicy::Amortizing);
        assert_eq!(calculator::quote(&payload.terms()).installment, dec!(8884.88));
    }

    #[test]
    fn oversized_principal_and_rate_are_rejected() {
        let payload: CalculateEmiPayload = serde_json::from_value(json!({
            "principal": 1000000000000000u64,
            "rate": 100000,
            "tenure": 600
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields["principal"][0].code, "amount_too_large");
        assert_eq!(fields["rate"][0].code, "rate_too_large");
    }
}
