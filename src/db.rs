pub mod user_repo;
pub use user_repo::UserRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod loan_repo;
pub use loan_repo::LoanRepository;
pub mod installment_repo;
pub use installment_repo::InstallmentRepository;
pub mod expense_repo;
pub use expense_repo::ExpenseRepository;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
