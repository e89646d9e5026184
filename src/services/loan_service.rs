// src/services/loan_service.rs

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{loan_repo::LoanFields, CustomerRepository, InstallmentRepository, LoanRepository},
    engine::{
        calculator::{self, LoanTerms},
        reconciler, schedule, ScheduleChange, ScheduleOwner,
    },
    models::{
        customer::Customer,
        installment::Installment,
        loan::{BackfillReport, InterestPolicy, Loan, LoanDetail, LoanStatus, LoanSummary, LoanUpdateResult},
    },
};

/// Client-supplied loan terms, as written on create and on edit.
#[derive(Debug, Clone)]
pub struct LoanDraft<'a> {
    pub loan_number: &'a str,
    pub principal: Decimal,
    pub interest_rate: Decimal,
    pub tenure_months: i32,
    /// `None` keeps the stored policy on edit, and means flat on create.
    pub interest_policy: Option<InterestPolicy>,
    pub loan_date: NaiveDate,
    /// `None` keeps the stored start date on edit, and means one month after
    /// `loan_date` on create.
    pub emi_start_date: Option<NaiveDate>,
    pub vehicle_number: Option<&'a str>,
    pub remarks: Option<&'a str>,
}

const RATE_SCALE: u32 = 3;

impl LoanDraft<'_> {
    /// Terms at the precision the loan columns store, so the EMI derived here
    /// is the one a reload of the row would derive.
    fn terms(&self, policy: InterestPolicy) -> LoanTerms {
        LoanTerms {
            principal: calculator::round_currency(self.principal),
            rate: self
                .interest_rate
                .round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero),
            tenure: self.tenure_months,
            policy,
        }
    }

    fn fields<'f>(
        &'f self,
        customer_id: Uuid,
        customer_name: &'f str,
        policy: InterestPolicy,
        emi_start_date: NaiveDate,
    ) -> LoanFields<'f> {
        let terms = self.terms(policy);
        LoanFields {
            loan_number: self.loan_number.trim(),
            customer_id,
            customer_name,
            principal: terms.principal,
            interest_rate: terms.rate,
            tenure_months: self.tenure_months,
            interest_policy: policy,
            loan_date: self.loan_date,
            emi_start_date,
            monthly_emi: calculator::installment_amount(&terms),
            total_interest_amount: calculator::total_interest(&terms),
            vehicle_number: self.vehicle_number,
            remarks: self.remarks,
        }
    }
}

/// First EMI falls one month after disbursement unless told otherwise.
pub fn default_emi_start(loan_date: NaiveDate) -> Result<NaiveDate, AppError> {
    loan_date
        .checked_add_months(Months::new(1))
        .ok_or_else(|| AppError::InvalidSchedule(format!("no EMI start date after {loan_date}")))
}

fn terms_of(loan: &Loan) -> LoanTerms {
    LoanTerms {
        principal: loan.principal,
        rate: loan.interest_rate,
        tenure: loan.tenure_months,
        policy: loan.interest_policy,
    }
}

#[derive(Clone)]
pub struct LoanService {
    loan_repo: LoanRepository,
    installment_repo: InstallmentRepository,
    customer_repo: CustomerRepository,
}

impl LoanService {
    pub fn new(
        loan_repo: LoanRepository,
        installment_repo: InstallmentRepository,
        customer_repo: CustomerRepository,
    ) -> Self {
        Self { loan_repo, installment_repo, customer_repo }
    }

    // =========================================================================
    //  ORIGINATION
    // =========================================================================

    pub async fn create_loan<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        draft: &LoanDraft<'_>,
    ) -> Result<LoanDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let customer = self
            .customer_repo
            .find_by_id(&mut *tx, customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        let (loan, installments) = self.open_loan(&mut *tx, &customer, draft).await?;

        tx.commit().await?;

        let summary = LoanSummary::from_installments(&installments);
        Ok(LoanDetail { loan, installments, summary })
    }

    /// Inserts the loan and its full schedule on an open connection, so
    /// callers can fold it into a wider transaction.
    pub async fn open_loan(
        &self,
        conn: &mut PgConnection,
        customer: &Customer,
        draft: &LoanDraft<'_>,
    ) -> Result<(Loan, Vec<Installment>), AppError> {
        let emi_start_date = match draft.emi_start_date {
            Some(date) => date,
            None => default_emi_start(draft.loan_date)?,
        };

        let policy = draft.interest_policy.unwrap_or_default();
        let fields = draft.fields(customer.id, &customer.full_name, policy, emi_start_date);
        let loan = self.loan_repo.create_loan(&mut *conn, &fields).await?;

        let rows = schedule::generate(&ScheduleOwner::from(&loan), &terms_of(&loan), loan.emi_start_date)?;
        let installments = self.installment_repo.insert_many(&mut *conn, &rows).await?;

        tracing::info!(
            loan_id = %loan.id,
            loan_number = %loan.loan_number,
            monthly_emi = %loan.monthly_emi,
            installments = installments.len(),
            "💰 Loan created"
        );

        Ok((loan, installments))
    }

    // =========================================================================
    //  EDIT + RECONCILIATION
    // =========================================================================

    /// Rewrites the loan terms and brings the schedule in line, all or nothing.
    pub async fn update_loan<'e, E>(
        &self,
        executor: E,
        loan_id: Uuid,
        draft: &LoanDraft<'_>,
    ) -> Result<LoanUpdateResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .loan_repo
            .find_by_id_for_update(&mut *tx, loan_id)
            .await?
            .ok_or(AppError::LoanNotFound)?;

        let emi_start_date = draft.emi_start_date.unwrap_or(current.emi_start_date);
        let policy = draft.interest_policy.unwrap_or(current.interest_policy);
        let fields = draft.fields(current.customer_id, &current.customer_name, policy, emi_start_date);
        let loan = self.loan_repo.update_loan(&mut *tx, loan_id, &fields).await?;

        let existing = self.installment_repo.list_by_loan_for_update(&mut *tx, loan_id).await?;
        let change = ScheduleChange {
            owner: ScheduleOwner::from(&loan),
            installment_amount: loan.monthly_emi,
            tenure: loan.tenure_months,
            emi_start_date: loan.emi_start_date,
        };
        let plan = reconciler::reconcile(&existing, &change)?;

        for update in &plan.updates {
            self.installment_repo.apply_update(&mut *tx, update).await?;
        }
        let removed = self.installment_repo.delete_many(&mut *tx, &plan.deletes).await?;
        let added = self.installment_repo.insert_many(&mut *tx, &plan.inserts).await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = %loan.id,
            updated = plan.updates.len(),
            added = added.len(),
            removed,
            "🔁 Loan schedule reconciled"
        );

        Ok(LoanUpdateResult {
            loan,
            installments_updated: plan.updates.len(),
            installments_added: added.len(),
            installments_removed: removed as usize,
        })
    }

    pub async fn set_status<'e, E>(&self, executor: E, loan_id: Uuid, status: LoanStatus) -> Result<Loan, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let loan = self.loan_repo.update_status(executor, loan_id, status).await?;
        tracing::info!(loan_id = %loan.id, status = ?loan.status, "Loan status changed");
        Ok(loan)
    }

    // =========================================================================
    //  READS
    // =========================================================================

    pub async fn list_loans<'e, E>(
        &self,
        executor: E,
        status: Option<LoanStatus>,
        customer_id: Option<Uuid>,
    ) -> Result<Vec<Loan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.loan_repo.list_loans(executor, status, customer_id).await
    }

    pub async fn get_loan_detail<'e, E>(&self, executor: E, loan_id: Uuid) -> Result<LoanDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let loan = self
            .loan_repo
            .find_by_id(&mut *tx, loan_id)
            .await?
            .ok_or(AppError::LoanNotFound)?;
        let installments = self.installment_repo.list_by_loan(&mut *tx, loan_id).await?;

        tx.commit().await?;

        let summary = LoanSummary::from_installments(&installments);
        Ok(LoanDetail { loan, installments, summary })
    }

    // =========================================================================
    //  MAINTENANCE
    // =========================================================================

    /// Generates schedules for loans that have none. Loans with at least one
    /// installment are left alone, so running it twice is harmless.
    pub async fn backfill_installments<'e, E>(&self, executor: E) -> Result<BackfillReport, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let loans = self.loan_repo.list_without_installments(&mut *tx).await?;

        let mut report = BackfillReport {
            loans_scanned: loans.len(),
            loans_backfilled: 0,
            installments_created: 0,
        };

        for loan in &loans {
            let rows = schedule::generate(&ScheduleOwner::from(loan), &terms_of(loan), loan.emi_start_date)?;
            if rows.is_empty() {
                tracing::warn!(loan_id = %loan.id, "Loan has no tenure, nothing to backfill");
                continue;
            }

            let inserted = self.installment_repo.insert_many(&mut *tx, &rows).await?;
            report.loans_backfilled += 1;
            report.installments_created += inserted.len();
        }

        tx.commit().await?;

        tracing::info!(
            scanned = report.loans_scanned,
            backfilled = report.loans_backfilled,
            created = report.installments_created,
            "🧾 Installment backfill finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::customer_repo::CustomerFields,
        engine::{PaymentGroup, PaymentLine},
        models::installment::InstallmentStatus,
        services::installment_service::InstallmentService,
    };
    use rust_decimal_macros::dec;
    use sqlx::{postgres::PgPoolOptions, PgPool};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft() -> LoanDraft<'static> {
        LoanDraft {
            loan_number: "  LN-2024-0042 ",
            principal: dec!(100000),
            interest_rate: dec!(2),
            tenure_months: 12,
            interest_policy: None,
            loan_date: date(2024, 1, 10),
            emi_start_date: None,
            vehicle_number: Some("MH12AB1234"),
            remarks: None,
        }
    }

    #[test]
    fn fields_carry_derived_amounts() {
        let draft = draft();
        let customer_id = Uuid::new_v4();

        let fields = draft.fields(customer_id, "Ramesh Kumar", InterestPolicy::Flat, date(2024, 2, 10));

        assert_eq!(fields.loan_number, "LN-2024-0042");
        assert_eq!(fields.customer_id, customer_id);
        assert_eq!(fields.monthly_emi, dec!(10333.33));
        assert_eq!(fields.total_interest_amount, dec!(24000.00));
        assert_eq!(fields.emi_start_date, date(2024, 2, 10));
    }

    #[test]
    fn amortizing_draft_uses_reducing_balance() {
        let draft = LoanDraft { interest_rate: dec!(12), ..draft() };
        let fields = draft.fields(Uuid::new_v4(), "Ramesh Kumar", InterestPolicy::Amortizing, date(2024, 2, 10));
        assert_eq!(fields.monthly_emi, dec!(8884.88));
    }

    #[test]
    fn derived_amounts_match_the_stored_precision() {
        let draft = LoanDraft { interest_rate: dec!(2.0005), principal: dec!(100000.004), ..draft() };
        let fields = draft.fields(Uuid::new_v4(), "Ramesh Kumar", InterestPolicy::Flat, date(2024, 2, 10));

        assert_eq!(fields.interest_rate, dec!(2.001));
        assert_eq!(fields.principal, dec!(100000.00));

        // what the schedule generator sees after the row comes back
        let reloaded = LoanTerms {
            principal: fields.principal,
            rate: fields.interest_rate,
            tenure: fields.tenure_months,
            policy: fields.interest_policy,
        };
        assert_eq!(fields.monthly_emi, calculator::installment_amount(&reloaded));
        assert_eq!(fields.monthly_emi, dec!(10334.33));
    }

    #[test]
    fn default_start_is_one_month_after_disbursement() {
        assert_eq!(default_emi_start(date(2024, 1, 10)).unwrap(), date(2024, 2, 10));
        assert_eq!(default_emi_start(date(2024, 1, 31)).unwrap(), date(2024, 2, 29));
    }

    // =========================================================================
    //  AGAINST POSTGRES (skipped unless DATABASE_URL is set)
    // =========================================================================

    async fn test_pool() -> Option<PgPool> {
        let database_url = std::env::var("DATABASE_URL").ok()?;

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&database_url)
            .await
            .expect("Failed to create test pool");
        sqlx::migrate!().run(&pool).await.expect("Failed to run migrations");

        Some(pool)
    }

    #[tokio::test]
    async fn edit_round_trip_keeps_paid_rows_and_refills_the_schedule() {
        let Some(pool) = test_pool().await else {
            eprintln!("DATABASE_URL not set, skipping");
            return;
        };

        let loans = LoanService::new(LoanRepository::new(), InstallmentRepository::new(), CustomerRepository::new());
        let installments = InstallmentService::new(InstallmentRepository::new(), LoanRepository::new());

        let customer = CustomerRepository::new()
            .create_customer(
                &pool,
                &CustomerFields {
                    full_name: "Sunita Patil",
                    phone: "9800000000",
                    address: None,
                    id_proof: None,
                    guarantor_name: None,
                    guarantor_phone: None,
                },
            )
            .await
            .unwrap();

        let number = format!("LN-RT-{}", Uuid::new_v4());
        let terms = LoanDraft {
            loan_number: &number,
            principal: dec!(12000),
            interest_rate: dec!(1),
            ..draft()
        };

        // create: 12 rows from one month after disbursement, written by one bulk insert
        let created = loans.create_loan(&pool, customer.id, &terms).await.unwrap();
        assert_eq!(created.loan.monthly_emi, dec!(1120));
        let numbers: Vec<i32> = created.installments.iter().map(|i| i.installment_number).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<i32>>());
        assert_eq!(created.installments[0].due_date, date(2024, 2, 10));

        // pay month 10 in full
        let tenth_id = created.installments[9].id;
        let paid = installments
            .record_payments(
                &pool,
                tenth_id,
                &[PaymentGroup {
                    date: date(2024, 11, 5),
                    entries: vec![PaymentLine { amount: dec!(1120), mode: "Cash".to_string() }],
                }],
                None,
            )
            .await
            .unwrap();
        assert_eq!(paid.status, InstallmentStatus::Paid);
        assert_eq!(paid.amount_paid, dec!(1120));

        // shrink to 8: 9, 11 and 12 go, the paid 10 stays
        let shrunk = loans
            .update_loan(&pool, created.loan.id, &LoanDraft { tenure_months: 8, ..terms.clone() })
            .await
            .unwrap();
        assert_eq!(shrunk.installments_removed, 3);
        assert_eq!(shrunk.installments_added, 0);

        // the delete itself refuses rows that carry money
        let removed = InstallmentRepository::new().delete_many(&pool, &[tenth_id]).await.unwrap();
        assert_eq!(removed, 0);

        // grow back to 12: every missing month comes back
        let grown = loans.update_loan(&pool, created.loan.id, &terms).await.unwrap();
        assert_eq!(grown.installments_added, 3);
        assert_eq!(grown.installments_removed, 0);

        let detail = loans.get_loan_detail(&pool, created.loan.id).await.unwrap();
        let numbers: Vec<i32> = detail.installments.iter().map(|i| i.installment_number).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<i32>>());

        let tenth = detail.installments.iter().find(|i| i.installment_number == 10).unwrap();
        assert_eq!(tenth.id, tenth_id);
        assert_eq!(tenth.status, InstallmentStatus::Paid);
        assert_eq!(tenth.payment_history.0.len(), 1);
        let collected: Decimal = detail.installments.iter().map(|i| i.amount_paid).sum();
        assert_eq!(collected, dec!(1120));

        // the sweep flags the first month, which was due on 2024-02-10
        installments.flag_overdue(&pool, date(2024, 3, 1)).await.unwrap();
        let first = installments.get_installment(&pool, detail.installments[0].id).await.unwrap();
        assert!(first.is_overdue);
        assert_eq!(first.status, InstallmentStatus::Overdue);
    }
}
