pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod documents;
pub mod emi;
pub mod employees;
pub mod expenses;
pub mod installments;
pub mod loans;
