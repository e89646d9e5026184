pub mod auth;
pub mod customer_service;
pub mod dashboard_service;
pub mod document_service;
pub mod employee_service;
pub mod expense_service;
pub mod installment_service;
pub mod loan_service;
