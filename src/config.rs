// src/config.rs

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        CustomerRepository, DashboardRepository, EmployeeRepository, ExpenseRepository,
        InstallmentRepository, LoanRepository, UserRepository,
    },
    services::{
        auth::AuthService, customer_service::CustomerService, dashboard_service::DashboardService,
        document_service::DocumentService, employee_service::EmployeeService,
        expense_service::ExpenseService, installment_service::InstallmentService,
        loan_service::LoanService,
    },
};

/// Settings read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub jwt_ttl_days: i64,
    pub fonts_dir: String,
    pub company_name: String,
    pub upi_id: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes `env::var`.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} must be set"))
        };

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR is not a valid socket address")?;

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse().context("DB_MAX_CONNECTIONS must be a positive integer")?,
            None => 5,
        };

        let jwt_ttl_days = match lookup("JWT_TTL_DAYS") {
            Some(v) => v.parse().context("JWT_TTL_DAYS must be an integer")?,
            None => 7,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr,
            db_max_connections,
            jwt_ttl_days,
            fonts_dir: lookup("FONTS_DIR").unwrap_or_else(|| "./fonts".to_string()),
            company_name: lookup("COMPANY_NAME").unwrap_or_else(|| "EMI Tracker".to_string()),
            upi_id: lookup("UPI_ID").filter(|v| !v.trim().is_empty()),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,

    pub auth_service: AuthService,
    pub customer_service: CustomerService,
    pub loan_service: LoanService,
    pub installment_service: InstallmentService,
    pub expense_service: ExpenseService,
    pub employee_service: EmployeeService,
    pub dashboard_service: DashboardService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("failed to connect to the database")?;

        tracing::info!("✅ Database connection established");

        Ok(Self::with_pool(db_pool, config))
    }

    /// Wires repositories and services around an existing pool.
    pub fn with_pool(db_pool: PgPool, config: Config) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new();
        let loan_repo = LoanRepository::new();
        let installment_repo = InstallmentRepository::new();
        let expense_repo = ExpenseRepository::new();
        let employee_repo = EmployeeRepository::new();
        let dashboard_repo = DashboardRepository::new();

        let auth_service = AuthService::new(user_repo, config.jwt_secret.clone(), config.jwt_ttl_days);
        let loan_service = LoanService::new(loan_repo.clone(), installment_repo.clone(), customer_repo.clone());
        let customer_service = CustomerService::new(
            customer_repo,
            loan_repo.clone(),
            installment_repo.clone(),
            loan_service.clone(),
        );
        let installment_service = InstallmentService::new(installment_repo.clone(), loan_repo.clone());
        let document_service = DocumentService::new(
            loan_repo,
            installment_repo,
            config.fonts_dir.clone(),
            config.company_name.clone(),
            config.upi_id.clone(),
        );

        Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: Arc::new(I18nStore::new()),
            auth_service,
            customer_service,
            loan_service,
            installment_service,
            expense_service: ExpenseService::new(expense_repo),
            employee_service: EmployeeService::new(employee_repo),
            dashboard_service: DashboardService::new(dashboard_repo),
            document_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_keys_are_missing() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/emi"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.jwt_ttl_days, 7);
        assert_eq!(config.fonts_dir, "./fonts");
        assert_eq!(config.upi_id, None);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/emi")]))
            .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn blank_upi_id_is_ignored() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/emi"),
            ("JWT_SECRET", "secret"),
            ("UPI_ID", "  "),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ]))
        .unwrap();

        assert_eq!(config.upi_id, None);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn bad_pool_size_is_reported() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/emi"),
            ("JWT_SECRET", "secret"),
            ("DB_MAX_CONNECTIONS", "many"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
    }
}
