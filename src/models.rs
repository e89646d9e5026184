pub mod auth;
pub mod customer;
pub mod dashboard;
pub mod employee;
pub mod expense;
pub mod installment;
pub mod loan;
