// src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod engine;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

fn build_router(app_state: AppState) -> Router {
    // Public
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new().route("/me", get(handlers::auth::get_me));

    let customer_routes = Router::new()
        .route(
            "/",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route(
            "/{id}",
            get(handlers::customers::get_customer).put(handlers::customers::update_customer),
        );

    let loan_routes = Router::new()
        .route(
            "/",
            post(handlers::loans::create_loan).get(handlers::loans::list_loans),
        )
        .route("/backfill-installments", post(handlers::loans::backfill_installments))
        .route(
            "/{id}",
            get(handlers::loans::get_loan).put(handlers::loans::update_loan),
        )
        .route("/{id}/status", patch(handlers::loans::update_loan_status))
        .route("/{id}/installments", get(handlers::loans::list_loan_installments))
        .route("/{id}/statement", get(handlers::documents::loan_statement));

    let installment_routes = Router::new()
        .route("/", get(handlers::installments::list_installments))
        .route("/flag-overdue", post(handlers::installments::flag_overdue))
        .route(
            "/{id}",
            get(handlers::installments::get_installment).patch(handlers::installments::update_installment),
        )
        .route("/{id}/payments", put(handlers::installments::record_payments));

    let expense_routes = Router::new()
        .route(
            "/",
            post(handlers::expenses::create_expense).get(handlers::expenses::list_expenses),
        )
        .route(
            "/{id}",
            get(handlers::expenses::get_expense)
                .put(handlers::expenses::update_expense)
                .delete(handlers::expenses::delete_expense),
        );

    let employee_routes = Router::new()
        .route(
            "/",
            post(handlers::employees::create_employee).get(handlers::employees::list_employees),
        )
        .route(
            "/{id}",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::deactivate_employee),
        );

    // Everything below needs a valid Bearer token
    let protected_routes = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/customers", customer_routes)
        .nest("/api/loans", loan_routes)
        .nest("/api/installments", installment_routes)
        .route("/api/emi/calculate", post(handlers::emi::calculate_emi))
        .nest("/api/expenses", expense_routes)
        .nest("/api/employees", employee_routes)
        .route("/api/dashboard/summary", get(handlers::dashboard::get_summary))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .merge(protected_routes)
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(config).await?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("failed to run database migrations")?;

    tracing::info!("✅ Database migrations applied");

    let bind_addr = app_state.config.bind_addr;
    let app = build_router(app_state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("🚀 Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
