// src/services/customer_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{customer_repo::CustomerFields, CustomerRepository, InstallmentRepository, LoanRepository},
    models::customer::{Customer, CustomerWithLoan},
    services::loan_service::{LoanDraft, LoanService},
};

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    loan_repo: LoanRepository,
    installment_repo: InstallmentRepository,
    loan_service: LoanService,
}

impl CustomerService {
    pub fn new(
        repo: CustomerRepository,
        loan_repo: LoanRepository,
        installment_repo: InstallmentRepository,
        loan_service: LoanService,
    ) -> Self {
        Self { repo, loan_repo, installment_repo, loan_service }
    }

    /// Registers a customer and, when `loan` is given, opens the loan with its
    /// schedule in the same transaction.
    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        fields: &CustomerFields<'_>,
        loan: Option<&LoanDraft<'_>>,
    ) -> Result<CustomerWithLoan, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let customer = self.repo.create_customer(&mut *tx, fields).await?;

        let loan = match loan {
            Some(draft) => {
                let (loan, _) = self.loan_service.open_loan(&mut *tx, &customer, draft).await?;
                Some(loan)
            }
            None => None,
        };

        tx.commit().await?;

        Ok(CustomerWithLoan { customer, loan })
    }

    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: &CustomerFields<'_>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let customer = self.repo.update_customer(&mut *tx, id, fields).await?;

        // Loans and installments keep a copy of the name for listings
        let loans = self.loan_repo.rename_customer(&mut *tx, id, &customer.full_name).await?;
        let installments = self
            .installment_repo
            .rename_customer(&mut *tx, id, &customer.full_name)
            .await?;

        tx.commit().await?;

        if loans > 0 || installments > 0 {
            tracing::info!(customer_id = %id, loans, installments, "Customer name refreshed on loans");
        }

        Ok(customer)
    }

    pub async fn get_customer<'e, E>(&self, executor: E, id: Uuid) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, id)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    pub async fn list_customers<'e, E>(&self, executor: E, search: Option<&str>) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_customers(executor, search).await
    }
}
