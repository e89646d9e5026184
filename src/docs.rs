// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::engine;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Customers ---
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::update_customer,

        // --- Loans ---
        handlers::loans::create_loan,
        handlers::loans::list_loans,
        handlers::loans::get_loan,
        handlers::loans::update_loan,
        handlers::loans::update_loan_status,
        handlers::loans::backfill_installments,
        handlers::documents::loan_statement,

        // --- Installments ---
        handlers::loans::list_loan_installments,
        handlers::installments::list_installments,
        handlers::installments::get_installment,
        handlers::installments::record_payments,
        handlers::installments::update_installment,
        handlers::installments::flag_overdue,

        // --- EMI ---
        handlers::emi::calculate_emi,

        // --- Expenses ---
        handlers::expenses::create_expense,
        handlers::expenses::list_expenses,
        handlers::expenses::get_expense,
        handlers::expenses::update_expense,
        handlers::expenses::delete_expense,

        // --- Employees ---
        handlers::employees::create_employee,
        handlers::employees::list_employees,
        handlers::employees::get_employee,
        handlers::employees::update_employee,
        handlers::employees::deactivate_employee,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Customers ---
            models::customer::Customer,
            models::customer::CustomerWithLoan,
            handlers::customers::CustomerPayload,
            handlers::customers::CustomerLoanPayload,
            handlers::customers::CreateCustomerPayload,

            // --- Loans ---
            models::loan::LoanStatus,
            models::loan::InterestPolicy,
            models::loan::Loan,
            models::loan::LoanSummary,
            models::loan::LoanDetail,
            models::loan::LoanUpdateResult,
            models::loan::BackfillReport,
            handlers::loans::LoanTermsPayload,
            handlers::loans::CreateLoanPayload,
            handlers::loans::UpdateLoanStatusPayload,

            // --- Installments ---
            models::installment::InstallmentStatus,
            models::installment::PaymentEntry,
            models::installment::Installment,
            engine::PaymentLine,
            engine::PaymentGroup,
            handlers::installments::RecordPaymentsPayload,
            handlers::installments::UpdateInstallmentPayload,
            handlers::installments::FlagOverdueResponse,

            // --- EMI ---
            engine::EmiQuote,
            handlers::emi::CalculateEmiPayload,

            // --- Expenses / Employees ---
            models::expense::Expense,
            handlers::expenses::ExpensePayload,
            models::employee::Employee,
            handlers::employees::EmployeePayload,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
        )
    ),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "Logged-in user"),
        (name = "Customers", description = "Borrowers and guarantors"),
        (name = "Loans", description = "Loan origination, edits and statements"),
        (name = "Installments", description = "EMI schedule and payment collection"),
        (name = "EMI", description = "Installment calculator"),
        (name = "Expenses", description = "Business expenses"),
        (name = "Employees", description = "Staff records"),
        (name = "Dashboard", description = "Back-office totals")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
